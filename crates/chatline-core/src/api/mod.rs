//! REST API client module for the chat service.
//!
//! This module provides:
//! - `ApiClient`: the authenticated transport and failure classifier
//! - `ChatClient`: typed session and message operations on top of it
//! - `ApiError` / `ErrorKind`: the failure taxonomy
//!
//! Resource calls authenticate with `Authorization: Bearer <token>`.

pub mod chat;
pub mod client;
pub mod error;

pub use chat::ChatClient;
pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, ErrorKind};
