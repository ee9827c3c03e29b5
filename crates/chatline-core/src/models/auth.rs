use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    // dj-rest-auth's user serializer names the primary key "pk"
    #[serde(alias = "pk")]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_joined: Option<String>,
    pub last_login: Option<String>,
}

impl UserProfile {
    /// Full name when the server knows one, otherwise the username
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        match (first.is_empty(), last.is_empty()) {
            (true, true) => self.username.clone(),
            (false, true) => first.to_string(),
            (true, false) => last.to_string(),
            (false, false) => format!("{} {}", first, last),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub key: Option<String>,
    pub access: Option<String>,
    /// Absent when the server sends a user shape we don't recognize
    #[serde(default, deserialize_with = "lenient_user")]
    pub user: Option<UserProfile>,
}

/// An unreadable user object reads as `None` instead of failing the response
fn lenient_user<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!(error = %e, "Ignoring unrecognized user in login response");
            None
        }
    }))
}

impl LoginResponse {
    /// The credential to store: JWT `access` when issued, else the token `key`
    pub fn credential(&self) -> Option<&str> {
        self.access
            .as_deref()
            .or(self.key.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_prefers_access() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"key": "k", "access": "a"}"#).unwrap();
        assert_eq!(resp.credential(), Some("a"));
    }

    #[test]
    fn test_credential_falls_back_to_key() {
        let resp: LoginResponse = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert_eq!(resp.credential(), Some("k"));
    }

    #[test]
    fn test_credential_missing() {
        let resp: LoginResponse = serde_json::from_str(r#"{"access": ""}"#).unwrap();
        assert_eq!(resp.credential(), None);
    }

    #[test]
    fn test_user_with_pk_field() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"access": "jwt", "user": {"pk": 1, "username": "ada", "email": "a@b.c"}}"#,
        )
        .unwrap();
        assert_eq!(resp.credential(), Some("jwt"));
        assert_eq!(resp.user.map(|u| u.id), Some(1));
    }

    #[test]
    fn test_unrecognized_user_is_dropped() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"key": "k", "user": {"name": "ada"}}"#).unwrap();
        assert_eq!(resp.credential(), Some("k"));
        assert!(resp.user.is_none());

        let resp: LoginResponse = serde_json::from_str(r#"{"key": "k", "user": null}"#).unwrap();
        assert!(resp.user.is_none());
    }

    #[test]
    fn test_display_name() {
        let mut user: UserProfile =
            serde_json::from_str(r#"{"id": 1, "username": "ada", "email": "ada@example.com"}"#)
                .unwrap();
        assert_eq!(user.display_name(), "ada");
        user.first_name = Some("Ada".to_string());
        user.last_name = Some("Lovelace".to_string());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
