use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long a notification stays visible unless dismissed
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// Creation time in milliseconds, bumped to stay unique
pub type NotificationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
    Info,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Success => write!(f, "success"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

#[derive(Default)]
struct Inner {
    active: Vec<Notification>,
    timers: HashMap<NotificationId, JoinHandle<()>>,
    last_id: NotificationId,
}

/// Shared set of active notifications.
/// Clone is cheap - all clones see the same set.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Inner>>,
    dismiss_after: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl NotificationCenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            dismiss_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a notification and schedule its removal.
    ///
    /// Must be called from within a tokio runtime for auto-dismissal; outside
    /// one the notification stays until dismissed explicitly.
    pub fn push(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let message = message.into();
        let mut inner = self.lock();

        let id = Utc::now().timestamp_millis().max(inner.last_id + 1);
        inner.last_id = id;
        debug!(id, %severity, message = %message, "Notification added");
        inner.active.push(Notification { id, message, severity });

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let center = self.clone();
                let delay = self.dismiss_after;
                let timer = handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    center.expire(id);
                });
                inner.timers.insert(id, timer);
            }
            Err(_) => warn!(id, "No async runtime, notification will not auto-dismiss"),
        }

        id
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.push(message, Severity::Error)
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.push(message, Severity::Success)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.push(message, Severity::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.push(message, Severity::Warning)
    }

    /// Remove a notification now and cancel its pending removal.
    /// Returns false if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut inner = self.lock();
        if let Some(timer) = inner.timers.remove(&id) {
            timer.abort();
        }
        Self::remove_active(&mut inner, id)
    }

    /// Called by the timer task once the display window has elapsed
    fn expire(&self, id: NotificationId) {
        let mut inner = self.lock();
        inner.timers.remove(&id);
        if Self::remove_active(&mut inner, id) {
            debug!(id, "Notification expired");
        }
    }

    fn remove_active(inner: &mut Inner, id: NotificationId) -> bool {
        let before = inner.active.len();
        inner.active.retain(|n| n.id != id);
        inner.active.len() != before
    }

    /// Snapshot of the active notifications, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.lock().active.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().active.is_empty()
    }

    /// Number of removals still scheduled
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("active", &self.len())
            .field("dismiss_after", &self.dismiss_after)
            .finish()
    }
}
