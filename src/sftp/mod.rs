//! SFTP transport for report uploads
//!
//! Connection setup, the established session, and per-file upload.

pub mod client;
pub mod session;
pub mod upload;

pub use client::SftpClient;
pub use session::{ProtocolSession, SftpConnection, Transport};
pub use upload::{RemoteFileSystem, upload_and_close, upload_datasets};
