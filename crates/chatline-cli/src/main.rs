//! Chatline - a terminal client for the chat service.
//!
//! Each invocation runs one command against the server, then prints the
//! notifications the core produced and any navigation it asked for.

mod format;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chatline_core::models::{ChatMessage, ChatSession};
use chatline_core::{ChannelNavigator, ClientContext, Config, Route};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use format::{format_notification, format_timestamp, truncate_string};

/// Width of the title column in session listings
const TITLE_WIDTH: usize = 32;

/// Width of message previews
const PREVIEW_WIDTH: usize = 60;

const USAGE: &str = "\
Usage: chatline <command> [args]

Commands:
  login [username]          Sign in and store the credential
  logout                    Forget the stored credential
  status                    Show whether a credential is stored
  verify                    Check the stored credential with the server
  whoami                    Show the signed-in user's profile
  sessions                  List chat sessions
  new                       Create a chat session
  show <id>...              Show one or more sessions with their messages
  delete <id>               Delete a chat session
  messages <session-id>     List the messages of a session
  send <session-id> <text>  Send a message
  message <id>              Show a single message

Environment:
  CHATLINE_BASE_URL, CHATLINE_USERNAME, CHATLINE_PASSWORD, RUST_LOG";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };
    if command == "-h" || command == "--help" || command == "help" {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(&command, &args[1..]).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Build the client, run one command, and report its side effects.
/// Returns whether the command succeeded.
async fn run(command: &str, args: &[String]) -> Result<bool> {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
    .with_env_overrides();

    let storage = config.open_storage()?;
    let (navigator, mut routes) = ChannelNavigator::channel();
    let ctx = ClientContext::new(&config, storage, navigator)?;

    let outcome = dispatch(&ctx, &mut config, command, args).await;

    report(&ctx, &mut routes);

    match outcome {
        Ok(()) => Ok(true),
        // Core failures were already shown as notifications
        Err(e) if e.downcast_ref::<chatline_core::ApiError>().is_some() => Ok(false),
        Err(e) => Err(e),
    }
}

async fn dispatch(ctx: &ClientContext, config: &mut Config, command: &str, args: &[String]) -> Result<()> {
    match command {
        "login" => login(ctx, config, args.first().map(String::as_str)).await,
        "logout" => {
            ctx.auth.logout();
            println!("Logged out.");
            Ok(())
        }
        "status" => {
            if ctx.auth.is_authenticated() {
                println!("Credential stored for {}", config.base_url);
            } else {
                println!("Not logged in.");
            }
            Ok(())
        }
        "verify" => {
            if ctx.auth.verify_with_server().await {
                println!("Credential accepted by {}", config.base_url);
                Ok(())
            } else {
                println!("Not authenticated.");
                Err(chatline_core::ApiError::Unauthenticated.into())
            }
        }
        "whoami" => {
            let user = ctx.auth.current_user().await?;
            println!("{} <{}> (id {})", user.display_name(), user.email, user.id);
            Ok(())
        }
        "sessions" => {
            let sessions = ctx.chat.list_sessions().await?;
            if sessions.is_empty() {
                println!("No chat sessions.");
            }
            for session in &sessions {
                print_session_line(session);
            }
            Ok(())
        }
        "new" => {
            let session = ctx.chat.create_session().await?;
            println!("Created session {} ({})", session.unique_key, session.title);
            Ok(())
        }
        "show" => {
            anyhow::ensure!(!args.is_empty(), "show needs at least one session id");
            show_sessions(ctx, args).await
        }
        "delete" => {
            let id = required(args, 0, "session id")?;
            ctx.chat.delete_session(id).await?;
            Ok(())
        }
        "messages" => {
            let id = required(args, 0, "session id")?;
            for message in ctx.chat.list_messages(id).await? {
                print_message(&message);
            }
            Ok(())
        }
        "send" => {
            let id = required(args, 0, "session id")?;
            let content = args[1..].join(" ");
            let message = ctx.chat.send_message(id, &content).await?;
            print_message(&message);
            Ok(())
        }
        "message" => {
            let id = required(args, 0, "message id")?;
            let message = ctx.chat.get_message(id).await?;
            print_message(&message);
            Ok(())
        }
        other => anyhow::bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn required<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing {}", what))
}

async fn login(ctx: &ClientContext, config: &mut Config, username: Option<&str>) -> Result<()> {
    let username = match username {
        Some(u) => u.to_string(),
        None => match std::env::var("CHATLINE_USERNAME").ok().filter(|u| !u.is_empty()) {
            Some(u) => u,
            None => prompt_username(config.last_username.as_deref())?,
        },
    };

    let password = match std::env::var("CHATLINE_PASSWORD").ok().filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let response = ctx.auth.login(&username, &password).await?;

    // Save from the on-disk copy so environment overrides are not persisted
    let mut saved = Config::load().unwrap_or_default();
    saved.last_username = Some(username.clone());
    if let Err(e) = saved.save() {
        warn!(error = %e, "Failed to save config");
    }
    config.last_username = saved.last_username;

    let name = response
        .user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or(username);
    info!("Login successful");
    println!("Logged in as {}.", name);
    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

/// Fetch several sessions concurrently and print them in argument order
async fn show_sessions(ctx: &ClientContext, ids: &[String]) -> Result<()> {
    let fetches = ids.iter().map(|id| ctx.chat.get_session(id));
    let results = futures::future::join_all(fetches).await;

    let mut first_error = None;
    for result in results {
        match result {
            Ok(session) => {
                print_session_line(&session);
                for message in &session.messages {
                    print!("    ");
                    print_message(message);
                }
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_session_line(session: &ChatSession) {
    println!(
        "{}  {:<width$}  {}  {} messages",
        session.unique_key,
        truncate_string(&session.title, TITLE_WIDTH),
        format_timestamp(&session.created_at),
        session.message_count(),
        width = TITLE_WIDTH,
    );
}

fn print_message(message: &ChatMessage) {
    println!(
        "{} {:>7}: {}",
        format_timestamp(&message.created_at),
        message.sender,
        truncate_string(&message.content, PREVIEW_WIDTH),
    );
}

/// Act as the display surface: show notifications and requested navigation
fn report(ctx: &ClientContext, routes: &mut mpsc::UnboundedReceiver<Route>) {
    for notification in ctx.notifications.active() {
        eprintln!("{}", format_notification(&notification));
        ctx.notifications.dismiss(notification.id);
    }

    while let Ok(route) = routes.try_recv() {
        match route {
            Route::Login => eprintln!("Please log in again: chatline login"),
            Route::SessionList => eprintln!("Run `chatline sessions` to see your remaining sessions."),
            Route::Session(id) => eprintln!("Run `chatline show {}` to open it.", id),
        }
    }
}
