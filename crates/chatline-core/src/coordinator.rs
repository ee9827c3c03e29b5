//! Routes classified failures to their user-visible side effects.

use std::sync::Arc;

use tracing::warn;

use crate::api::ApiError;
use crate::auth::CredentialStore;
use crate::navigation::{Navigator, Route};
use crate::notify::NotificationCenter;

/// Turns a failure into an error notification and, for authentication
/// failures, a forced logout. Holds no state of its own.
#[derive(Clone)]
pub struct FailureCoordinator {
    credentials: CredentialStore,
    notifications: NotificationCenter,
    navigator: Arc<dyn Navigator>,
}

impl FailureCoordinator {
    pub fn new(
        credentials: CredentialStore,
        notifications: NotificationCenter,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            credentials,
            notifications,
            navigator,
        }
    }

    /// Dispatch side effects using the error's own message, then hand the
    /// error back so the caller can still fail.
    pub fn handle(&self, error: ApiError) -> ApiError {
        let message = error.to_string();
        self.handle_with_message(error, message)
    }

    pub fn handle_with_message(&self, error: ApiError, message: impl Into<String>) -> ApiError {
        let message = message.into();
        warn!(kind = ?error.kind(), error = %message, "Request failed");

        self.notifications.error(message);

        if error.is_auth() {
            self.credentials.clear_token();
            self.navigator.navigate(Route::Login);
        }

        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::notify::Severity;
    use reqwest::StatusCode;

    fn setup() -> (FailureCoordinator, CredentialStore, NotificationCenter, Arc<RecordingNavigator>) {
        let credentials = CredentialStore::in_memory();
        credentials.set_token("t").unwrap();
        let notifications = NotificationCenter::default();
        let navigator = Arc::new(RecordingNavigator::new());
        let coordinator =
            FailureCoordinator::new(credentials.clone(), notifications.clone(), navigator.clone());
        (coordinator, credentials, notifications, navigator)
    }

    #[tokio::test]
    async fn test_http_failure_notifies_only() {
        let (coordinator, credentials, notifications, navigator) = setup();
        let err = coordinator.handle(ApiError::from_status(StatusCode::NOT_FOUND, "missing"));

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(credentials.is_authenticated());
        assert!(navigator.routes().is_empty());
        let active = notifications.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Error);
        assert_eq!(active[0].message, "HTTP error! status: 404 Not Found: missing");
    }

    #[tokio::test]
    async fn test_auth_rejected_clears_and_navigates_once() {
        let (coordinator, credentials, notifications, navigator) = setup();
        let err = coordinator.handle(ApiError::AuthRejected("Token expired".into()));

        assert!(matches!(err, ApiError::AuthRejected(_)));
        assert!(!credentials.is_authenticated());
        assert_eq!(navigator.routes(), vec![Route::Login]);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications.active()[0].message, "Token expired");
    }

    #[tokio::test]
    async fn test_unauthenticated_treated_like_rejection() {
        let (coordinator, credentials, notifications, navigator) = setup();
        coordinator.handle(ApiError::Unauthenticated);
        assert!(!credentials.is_authenticated());
        assert_eq!(navigator.count(&Route::Login), 1);
        assert_eq!(notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_message() {
        let (coordinator, _, notifications, navigator) = setup();
        coordinator.handle_with_message(
            ApiError::ValidationFailure("empty".into()),
            "Message cannot be empty",
        );
        assert_eq!(notifications.active()[0].message, "Message cannot be empty");
        assert!(navigator.routes().is_empty());
    }
}
