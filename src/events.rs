//! Progress and failure events emitted by the uploader
//!
//! The uploader reports through an [`EventSink`] handed to it at construction,
//! so hosts and tests can observe a run without a process-wide logger.

use tokio::sync::mpsc;

/// Events emitted during credential resolution and upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// A credential was resolved into an auth method
    CredentialSelected { source: &'static str },
    /// A configured credential could not be loaded
    CredentialRejected { source: &'static str, reason: String },
    /// An upload run is about to dial the server
    SessionStarting { addr: String },
    /// Transport and SFTP session are both established
    Connected { addr: String },
    /// One remote file was written and closed
    FileWritten { path: String, bytes: usize },
    /// Every dataset of the batch was written
    Completed { files: usize },
    /// The run ended with an error
    Failed { error: String },
    /// SFTP session and transport were released. `clean` is false when the
    /// release ran from a dropped connection or a layer failed to close.
    Disconnected { addr: String, clean: bool },
}

/// Receiver of transfer events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &TransferEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &TransferEvent) {
        match event {
            TransferEvent::CredentialSelected { source } => {
                crate::transfer_log::log_credential_selected(source);
            }
            TransferEvent::CredentialRejected { source, reason } => {
                crate::transfer_log::log_credential_rejected(source, reason);
            }
            TransferEvent::SessionStarting { addr } => {
                tracing::info!(
                    "Starting upload of CSVs. Initiating SSH connection to {}",
                    addr
                );
            }
            TransferEvent::Connected { addr } => {
                tracing::info!("Connection established to {}. Writing CSVs", addr);
            }
            TransferEvent::FileWritten { path, bytes } => {
                tracing::debug!("Wrote {} bytes to {}", bytes, path);
            }
            TransferEvent::Completed { files } => {
                tracing::info!("Uploaded {} CSV file(s)", files);
            }
            TransferEvent::Failed { error } => {
                tracing::error!("Upload failed: {}", error);
            }
            TransferEvent::Disconnected { addr, clean } => {
                tracing::debug!("Released connection to {} (clean: {})", addr, clean);
            }
        }
    }
}

impl EventSink for mpsc::UnboundedSender<TransferEvent> {
    fn emit(&self, event: &TransferEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(event.clone());
    }
}
