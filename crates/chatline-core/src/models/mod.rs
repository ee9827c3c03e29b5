//! Data models for the chat service.
//!
//! This module contains the wire types exchanged with the server:
//!
//! - `ChatSession`, `ChatMessage`, `Sender`: conversations and their messages
//! - `LoginCredentials`, `LoginResponse`, `UserProfile`: authentication payloads

pub mod auth;
pub mod chat;

pub use auth::{LoginCredentials, LoginResponse, UserProfile};
pub use chat::{ChatMessage, ChatSession, NewMessage, Sender};
