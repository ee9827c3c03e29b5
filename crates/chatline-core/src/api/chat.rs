//! Chat session and message operations.
//!
//! Every operation requires a stored credential. Failures of any kind are
//! routed through the `FailureCoordinator` (notification, plus forced logout
//! for authentication failures) and then returned to the caller.

use std::sync::Arc;

use tracing::{debug, info};

use crate::coordinator::FailureCoordinator;
use crate::models::{ChatMessage, ChatSession, NewMessage};
use crate::navigation::{Navigator, Route};
use crate::notify::NotificationCenter;

use super::{ApiClient, ApiError};

const API: &str = "api";
const SESSIONS: &str = "chat-session";
const MESSAGES: &str = "chat-message";

/// Shown after a session is deleted
const SESSION_DELETED_MESSAGE: &str = "Chat session deleted";

#[derive(Clone)]
pub struct ChatClient {
    api: ApiClient,
    failures: FailureCoordinator,
    notifications: NotificationCenter,
    navigator: Arc<dyn Navigator>,
}

impl ChatClient {
    pub fn new(
        api: ApiClient,
        failures: FailureCoordinator,
        notifications: NotificationCenter,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            failures,
            notifications,
            navigator,
        }
    }

    /// Route a failed result through the coordinator before returning it
    fn reported<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        result.map_err(|e| self.failures.handle(e))
    }

    /// Fail as `Unauthenticated` before any input is looked at
    fn require_credential(&self) -> Result<(), ApiError> {
        if self.api.credentials().is_authenticated() {
            Ok(())
        } else {
            Err(self.failures.handle(ApiError::Unauthenticated))
        }
    }

    fn require_id<'a>(&self, what: &str, id: &'a str) -> Result<&'a str, ApiError> {
        if id.trim().is_empty() {
            return Err(self.failures.handle(ApiError::ValidationFailure(format!(
                "{} id must not be empty",
                what
            ))));
        }
        Ok(id)
    }

    /// All sessions of the current user, in the order the server returns them
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        let sessions: Vec<ChatSession> = self.reported(self.api.get(&[API, SESSIONS]).await)?;
        debug!(count = sessions.len(), "Fetched chat sessions");
        Ok(sessions)
    }

    /// Create a session; the server assigns key, title and timestamp
    pub async fn create_session(&self) -> Result<ChatSession, ApiError> {
        let session: ChatSession = self.reported(self.api.post_empty(&[API, SESSIONS]).await)?;
        info!(session = %session.unique_key, title = %session.title, "Created chat session");
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<ChatSession, ApiError> {
        self.require_credential()?;
        let id = self.require_id("Session", id)?;
        self.reported(self.api.get(&[API, SESSIONS, id]).await)
    }

    /// Delete a session, then announce it and return to the session list
    pub async fn delete_session(&self, id: &str) -> Result<(), ApiError> {
        self.require_credential()?;
        let id = self.require_id("Session", id)?;
        self.reported(self.api.delete(&[API, SESSIONS, id]).await)?;

        info!(session = %id, "Deleted chat session");
        self.navigator.navigate(Route::SessionList);
        self.notifications.success(SESSION_DELETED_MESSAGE);
        Ok(())
    }

    /// Messages of a session, oldest first
    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let mut messages = self.get_session(session_id).await?.messages;
        // Stable, so equal timestamps keep server order
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    /// Post a message and return it as stored by the server
    pub async fn send_message(&self, session_id: &str, content: &str) -> Result<ChatMessage, ApiError> {
        self.require_credential()?;
        let session_id = self.require_id("Session", session_id)?;
        if content.trim().is_empty() {
            return Err(self
                .failures
                .handle(ApiError::ValidationFailure("Message cannot be empty".to_string())));
        }

        let body = NewMessage {
            chat_session_id: session_id,
            content,
        };
        let message: ChatMessage = self.reported(self.api.post(&[API, MESSAGES], &body).await)?;
        debug!(session = %session_id, message = %message.id, "Message sent");
        Ok(message)
    }

    pub async fn get_message(&self, id: &str) -> Result<ChatMessage, ApiError> {
        self.require_credential()?;
        let id = self.require_id("Message", id)?;
        self.reported(self.api.get(&[API, MESSAGES, id]).await)
    }
}
