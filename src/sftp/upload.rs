//! Per-dataset upload over an open SFTP session

use std::future::Future;

use russh_sftp::client::SftpSession as RusshSftpSession;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::dataset::{NamedDataset, remote_file_path};
use crate::error::TransferError;
use crate::events::{EventSink, TransferEvent};

use super::session::{ProtocolSession, SftpConnection, Transport};

/// Remote side of an upload: creates (or truncates) files for writing
pub trait RemoteFileSystem {
    type File: AsyncWrite + Unpin + Send;
    type Error: std::fmt::Display;

    fn create(&self, path: &str) -> impl Future<Output = Result<Self::File, Self::Error>>;
}

impl RemoteFileSystem for RusshSftpSession {
    type File = russh_sftp::client::fs::File;
    type Error = russh_sftp::client::error::Error;

    fn create(&self, path: &str) -> impl Future<Output = Result<Self::File, Self::Error>> {
        RusshSftpSession::create(self, path.to_string())
    }
}

/// Write each dataset to `<base_path>/<name>`, in order.
///
/// Every file is fully written and closed before the next one is created.
/// The first failure ends the batch; files already written stay on the
/// server. Returns the number of files written.
pub async fn upload_datasets<R>(
    remote: &R,
    base_path: &str,
    datasets: &[NamedDataset],
    events: &dyn EventSink,
) -> Result<usize, TransferError>
where
    R: RemoteFileSystem,
{
    let mut written = 0;

    for dataset in datasets {
        let path = remote_file_path(base_path, &dataset.name)?;
        let bytes = dataset.to_csv_bytes()?;

        let mut file = remote
            .create(&path)
            .await
            .map_err(|e| TransferError::RemoteFileCreateFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let write_failed = |e: std::io::Error| TransferError::RemoteWriteFailed {
            path: path.clone(),
            reason: e.to_string(),
        };
        file.write_all(&bytes).await.map_err(write_failed)?;
        // Shutdown flushes and closes the remote handle
        file.shutdown().await.map_err(write_failed)?;

        events.emit(&TransferEvent::FileWritten {
            path: path.clone(),
            bytes: bytes.len(),
        });
        written += 1;
    }

    Ok(written)
}

/// Run [`upload_datasets`] on `connection`, then release it.
///
/// The connection is closed on every path, including when `deadline` passes
/// before the batch is done; that case is a [`TransferError::RemoteWriteFailed`]
/// against the base path.
pub async fn upload_and_close<S, T>(
    connection: SftpConnection<S, T>,
    base_path: &str,
    datasets: &[NamedDataset],
    deadline: Option<Instant>,
    events: &dyn EventSink,
) -> Result<usize, TransferError>
where
    S: ProtocolSession,
    T: Transport,
{
    let result = match connection.sftp() {
        Some(sftp) => {
            let batch = upload_datasets(sftp, base_path, datasets, events);
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, batch)
                    .await
                    .unwrap_or_else(|_| {
                        Err(TransferError::RemoteWriteFailed {
                            path: base_path.to_string(),
                            reason: "deadline passed before the batch finished".to_string(),
                        })
                    }),
                None => batch.await,
            }
        }
        None => Err(TransferError::ProtocolSessionFailed(
            "SFTP session already closed".to_string(),
        )),
    };

    connection.close().await;
    result
}
