//! User-facing notifications.
//!
//! Components report outcomes by pushing a `Notification` into the shared
//! `NotificationCenter`; a display surface reads the active set. Every
//! notification removes itself after a fixed window unless dismissed first.

pub mod center;

pub use center::{Notification, NotificationCenter, NotificationId, Severity, DEFAULT_DISMISS_AFTER};
