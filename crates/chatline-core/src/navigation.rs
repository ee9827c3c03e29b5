//! Navigation side effects requested by the core.
//!
//! The core never renders anything; it only asks the front end to move to a
//! different surface (for example back to the login prompt after the server
//! rejects the credential).

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    SessionList,
    Session(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::SessionList => "/chat".to_string(),
            Route::Session(id) => format!("/chat/{}", id),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Forwards routes over an unbounded channel for the front end to drain.
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigation requested");
        if self.tx.send(route).is_err() {
            warn!("Navigation receiver dropped");
        }
    }
}

/// Keeps every requested route; handy for headless use and tests.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, route: &Route) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| *r == route)
            .count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigation requested");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
