//! Authentication module for managing the bearer credential.
//!
//! This module provides:
//! - `CredentialStore`: the single source of truth for the token, over any
//!   `TokenStorage` backend (keychain, JSON file, or memory)
//! - `AuthStatus`: login, logout, and server-side verification of the token
//!
//! Presence of a stored token is what "authenticated" means locally; no
//! separate flag is kept.

pub mod credentials;
pub mod status;

pub use credentials::{
    CredentialStore, FileStorage, KeyringStorage, MemoryStorage, StorageError, TokenStorage,
    SERVICE_NAME, TOKEN_KEY,
};
pub use status::AuthStatus;
