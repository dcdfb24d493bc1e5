//! SSH layer for the report uploader
//!
//! Credential resolution and the russh client handler.

pub mod auth;
pub mod handler;

pub use auth::{AuthHandle, CredentialKind, CredentialResolver, ResolvedAuth};
pub use handler::ClientHandler;
