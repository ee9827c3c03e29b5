//! Client-side session and authentication layer for the chat service.
//!
//! The crate is organized leaves first:
//!
//! - `auth`: credential storage and the authentication status façade
//! - `api`: authenticated transport and typed chat operations
//! - `coordinator`: failure dispatch (notifications, forced logout)
//! - `notify`: self-dismissing user notifications
//! - `navigation`: navigation requests handed to the front end
//! - `context`: the composition root building all of the above
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatline_core::{ChannelNavigator, ClientContext, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?.with_env_overrides();
//! let (navigator, _routes) = ChannelNavigator::channel();
//! let ctx = ClientContext::new(&config, config.open_storage()?, navigator)?;
//! for session in ctx.chat.list_sessions().await? {
//!     println!("{} {}", session.unique_key, session.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod models;
pub mod navigation;
pub mod notify;

pub use api::{ApiClient, ApiError, ChatClient, ErrorKind};
pub use auth::{AuthStatus, CredentialStore, TokenStorage};
pub use config::{Config, TokenBackend};
pub use context::ClientContext;
pub use coordinator::FailureCoordinator;
pub use navigation::{ChannelNavigator, Navigator, RecordingNavigator, Route};
pub use notify::{Notification, NotificationCenter, Severity};
