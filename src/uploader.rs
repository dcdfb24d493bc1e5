//! Report uploader
//!
//! [`ReportUploader`] is built once from [`Settings`]; construction resolves
//! the credential and fails fast when none is usable. Each call to
//! [`ReportUploader::upload`] opens its own SSH/SFTP session, writes the
//! batch and releases the session before returning.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::Settings;
use crate::dataset::NamedDataset;
use crate::error::TransferError;
use crate::events::{EventSink, TracingSink, TransferEvent};
use crate::sftp::{SftpClient, upload_and_close};
use crate::ssh::{AuthHandle, CredentialKind, CredentialResolver};

pub struct ReportUploader {
    addr: String,
    remote_path: String,
    auth: AuthHandle,
    client: SftpClient,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for ReportUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportUploader")
            .field("addr", &self.addr)
            .field("remote_path", &self.remote_path)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl ReportUploader {
    /// Build an uploader that reports through `tracing`
    pub fn new(settings: &Settings) -> Result<Self, TransferError> {
        Self::with_event_sink(settings, Arc::new(TracingSink))
    }

    pub fn with_event_sink(
        settings: &Settings,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, TransferError> {
        let auth =
            CredentialResolver::from_settings(settings).resolve(&settings.username, events.as_ref())?;

        Ok(Self {
            addr: settings.address(),
            remote_path: settings.remote_path.clone(),
            auth,
            client: SftpClient::new(settings.keepalive_interval_secs, settings.host_key.clone()),
            events,
        })
    }

    /// `host:port` the uploader dials
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Which credential was bound at construction
    pub fn auth_kind(&self) -> CredentialKind {
        self.auth.kind()
    }

    /// Upload every dataset as one CSV file under the remote base path.
    ///
    /// The first failure aborts the batch. Files written before it are left
    /// in place and are not reported individually.
    pub async fn upload(&self, datasets: &[NamedDataset]) -> Result<(), TransferError> {
        self.run(datasets, None).await
    }

    /// Like [`upload`](Self::upload), bounded by `limit`.
    ///
    /// Running out of time while dialing is a
    /// [`TransferError::ConnectionFailed`]; running out during the batch is a
    /// [`TransferError::RemoteWriteFailed`]. Either way the connection is
    /// released before this returns.
    pub async fn upload_within(
        &self,
        datasets: &[NamedDataset],
        limit: Duration,
    ) -> Result<(), TransferError> {
        self.run(datasets, Some(Instant::now() + limit)).await
    }

    async fn run(
        &self,
        datasets: &[NamedDataset],
        deadline: Option<Instant>,
    ) -> Result<(), TransferError> {
        self.events.emit(&TransferEvent::SessionStarting {
            addr: self.addr.clone(),
        });

        let connect = self.client.connect(&self.addr, &self.auth, self.events.clone());
        let connected = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, connect)
                .await
                .unwrap_or_else(|_| {
                    Err(TransferError::ConnectionFailed {
                        addr: self.addr.clone(),
                        reason: "connection timed out".to_string(),
                    })
                }),
            None => connect.await,
        };
        let connection = match connected {
            Ok(connection) => connection,
            Err(e) => return Err(self.fail(e)),
        };

        self.events.emit(&TransferEvent::Connected {
            addr: self.addr.clone(),
        });

        let result = upload_and_close(
            connection,
            &self.remote_path,
            datasets,
            deadline,
            self.events.as_ref(),
        )
        .await;

        match result {
            Ok(files) => {
                self.events.emit(&TransferEvent::Completed { files });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, error: TransferError) -> TransferError {
        self.events.emit(&TransferEvent::Failed {
            error: error.to_string(),
        });
        error
    }
}
