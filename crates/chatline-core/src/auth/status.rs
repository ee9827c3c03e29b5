use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::coordinator::FailureCoordinator;
use crate::models::{LoginCredentials, LoginResponse, UserProfile};

use super::CredentialStore;

const LOGIN_PATH: [&str; 2] = ["dj-rest-auth", "login"];
const CURRENT_USER_PATH: [&str; 2] = ["auth", "user"];

/// Authentication state as seen by the front end.
#[derive(Clone)]
pub struct AuthStatus {
    api: ApiClient,
    credentials: CredentialStore,
    failures: FailureCoordinator,
}

impl AuthStatus {
    pub fn new(api: ApiClient, credentials: CredentialStore, failures: FailureCoordinator) -> Self {
        Self {
            api,
            credentials,
            failures,
        }
    }

    /// Whether a credential is stored right now. Read fresh on every call.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Exchange username and password for a credential and store it
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.failures.handle(ApiError::ValidationFailure(
                "Username and password required".to_string(),
            )));
        }

        let body = LoginCredentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .api
            .post_anonymous(&LOGIN_PATH, &body)
            .await
            .map_err(|e| self.failures.handle(e))?;

        let Some(token) = response.credential() else {
            return Err(self.failures.handle(ApiError::InvalidResponse(
                "Login response did not include a token".to_string(),
            )));
        };
        self.credentials
            .set_token(token)
            .map_err(|e| self.failures.handle(e.into()))?;

        info!(username = %body.username, "Login successful");
        Ok(response)
    }

    /// Forget the credential. Navigation after a voluntary logout is up to
    /// the caller.
    pub fn logout(&self) {
        self.credentials.clear_token();
        info!("Logged out");
    }

    /// Ask the server whether the stored credential is still accepted.
    ///
    /// Without a token this returns false and makes no request. Any failure
    /// goes through the failure coordinator and leaves the store empty.
    pub async fn verify_with_server(&self) -> bool {
        if !self.credentials.is_authenticated() {
            debug!("No token, skipping server verification");
            return false;
        }

        match self.api.probe(&CURRENT_USER_PATH).await {
            Ok(()) => true,
            Err(e) => {
                self.failures.handle(e);
                self.credentials.clear_token();
                false
            }
        }
    }

    /// Profile of the user the credential belongs to
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.api
            .get(&CURRENT_USER_PATH)
            .await
            .map_err(|e| self.failures.handle(e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ErrorKind;
    use crate::navigation::{RecordingNavigator, Route};
    use crate::notify::NotificationCenter;

    struct Harness {
        auth: AuthStatus,
        credentials: CredentialStore,
        notifications: NotificationCenter,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(server: &MockServer, token: Option<&str>) -> Harness {
        let credentials = CredentialStore::in_memory();
        if let Some(token) = token {
            credentials.set_token(token).unwrap();
        }
        let notifications = NotificationCenter::default();
        let navigator = Arc::new(RecordingNavigator::new());
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5), credentials.clone()).unwrap();
        let failures =
            FailureCoordinator::new(credentials.clone(), notifications.clone(), navigator.clone());
        Harness {
            auth: AuthStatus::new(api, credentials.clone(), failures),
            credentials,
            notifications,
            navigator,
        }
    }

    #[tokio::test]
    async fn test_login_stores_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dj-rest-auth/login/"))
            .and(body_json(json!({"username": "ada", "password": "hunter2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "jwt-access",
                "refresh": "jwt-refresh",
                "user": {"id": 3, "username": "ada", "email": "ada@example.com"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, None);
        assert!(!h.auth.is_authenticated());
        let response = h.auth.login("ada", "hunter2").await.unwrap();
        assert_eq!(response.user.map(|u| u.id), Some(3));
        assert_eq!(h.credentials.get_token().as_deref(), Some("jwt-access"));
        assert!(h.auth.is_authenticated());
        assert!(h.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_login_with_dj_rest_auth_user_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dj-rest-auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "jwt",
                "refresh": "r",
                "user": {"pk": 1, "username": "ada", "email": "a@b.c", "first_name": "", "last_name": ""}
            })))
            .mount(&server)
            .await;

        let h = harness(&server, None);
        let response = h.auth.login("ada", "pw").await.unwrap();
        assert_eq!(response.user.map(|u| u.id), Some(1));
        assert_eq!(h.credentials.get_token().as_deref(), Some("jwt"));
        assert!(h.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_login_bad_credentials_notifies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "non_field_errors": ["Unable to log in with provided credentials."]
            })))
            .mount(&server)
            .await;

        let h = harness(&server, None);
        let err = h.auth.login("ada", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpFailure);
        assert!(!h.auth.is_authenticated());
        assert_eq!(h.notifications.len(), 1);
        assert!(h.notifications.active()[0]
            .message
            .contains("Unable to log in with provided credentials."));
        assert!(h.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let server = MockServer::start().await;
        let h = harness(&server, None);
        let err = h.auth.login("  ", "pw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        let err = h.auth.login("ada", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_without_token_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": null})))
            .mount(&server)
            .await;

        let h = harness(&server, None);
        let err = h.auth.login("ada", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(!h.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_without_navigating() {
        let server = MockServer::start().await;
        let h = harness(&server, Some("tok"));
        h.auth.logout();
        h.auth.logout();
        assert!(!h.auth.is_authenticated());
        assert!(h.navigator.routes().is_empty());
        assert!(h.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_is_authenticated_sees_external_clear() {
        let server = MockServer::start().await;
        let h = harness(&server, Some("tok"));
        assert!(h.auth.is_authenticated());
        h.credentials.clear_token();
        assert!(!h.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_verify_without_token_makes_no_request() {
        let server = MockServer::start().await;
        let h = harness(&server, None);
        assert!(!h.auth.verify_with_server().await);
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(h.notifications.is_empty());
        assert!(h.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_verify_accepts_clean_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/user/"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server, Some("tok"));
        assert!(h.auth.verify_with_server().await);
        assert!(h.auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_verify_rejected_forces_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let h = harness(&server, Some("tok"));
        assert!(!h.auth.verify_with_server().await);
        assert!(!h.auth.is_authenticated());
        assert_eq!(h.navigator.routes(), vec![Route::Login]);
        assert_eq!(h.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_server_error_still_invalidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let h = harness(&server, Some("tok"));
        assert!(!h.auth.verify_with_server().await);
        assert!(!h.auth.is_authenticated());
        assert!(h.navigator.routes().is_empty());
        assert_eq!(h.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/user/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3, "username": "ada", "email": "ada@example.com", "first_name": "Ada"
            })))
            .mount(&server)
            .await;

        let h = harness(&server, Some("tok"));
        let user = h.auth.current_user().await.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.display_name(), "Ada");
    }
}
