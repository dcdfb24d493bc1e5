//! Established SFTP connection

use std::future::Future;
use std::sync::Arc;

use russh::Disconnect;
use russh::client;
use russh_sftp::client::SftpSession as RusshSftpSession;

use crate::events::{EventSink, TransferEvent};
use crate::ssh::handler::ClientHandler;
use crate::transfer_log;

use super::upload::RemoteFileSystem;

/// File-transfer layer of a connection
pub trait ProtocolSession: RemoteFileSystem + Send + 'static {
    fn close_session(self) -> impl Future<Output = Result<(), String>> + Send;
}

/// Secure transport the protocol session runs on
pub trait Transport: Send + 'static {
    fn disconnect_transport(
        self,
        description: &'static str,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

impl ProtocolSession for RusshSftpSession {
    async fn close_session(self) -> Result<(), String> {
        RusshSftpSession::close(&self).await.map_err(|e| e.to_string())
    }
}

impl Transport for client::Handle<ClientHandler> {
    async fn disconnect_transport(self, description: &'static str) -> Result<(), String> {
        client::Handle::disconnect(&self, Disconnect::ByApplication, description, "en")
            .await
            .map_err(|e| e.to_string())
    }
}

/// Protocol session plus the transport under it.
///
/// [`SftpConnection::close`] releases the protocol session first and the
/// transport second, then emits [`TransferEvent::Disconnected`]. Dropping an
/// unclosed connection performs the same release on the current Tokio
/// runtime.
pub struct SftpConnection<S = RusshSftpSession, T = client::Handle<ClientHandler>>
where
    S: ProtocolSession,
    T: Transport,
{
    addr: String,
    sftp: Option<S>,
    transport: Option<T>,
    events: Arc<dyn EventSink>,
}

impl<S: ProtocolSession, T: Transport> std::fmt::Debug for SftpConnection<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpConnection")
            .field("addr", &self.addr)
            .field("open", &self.sftp.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: ProtocolSession, T: Transport> SftpConnection<S, T> {
    pub(crate) fn new(addr: String, transport: T, sftp: S, events: Arc<dyn EventSink>) -> Self {
        Self {
            addr,
            sftp: Some(sftp),
            transport: Some(transport),
            events,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The live protocol session, `None` once released
    pub fn sftp(&self) -> Option<&S> {
        self.sftp.as_ref()
    }

    /// Release the protocol session, then the transport
    pub async fn close(mut self) {
        let sftp = self.sftp.take();
        let transport = self.transport.take();
        release(self.addr.clone(), sftp, transport, self.events.clone(), true).await;
    }
}

async fn release<S: ProtocolSession, T: Transport>(
    addr: String,
    sftp: Option<S>,
    transport: Option<T>,
    events: Arc<dyn EventSink>,
    orderly: bool,
) {
    let mut clean = orderly;

    if let Some(sftp) = sftp {
        if let Err(e) = sftp.close_session().await {
            transfer_log::log_release_failure(&addr, "sftp", &e);
            clean = false;
        }
    }

    if let Some(transport) = transport {
        if let Err(e) = transport.disconnect_transport("upload finished").await {
            transfer_log::log_release_failure(&addr, "transport", &e);
            clean = false;
        }
    }

    transfer_log::log_ssh_disconnect(&addr, clean);
    events.emit(&TransferEvent::Disconnected { addr, clean });
}

impl<S: ProtocolSession, T: Transport> Drop for SftpConnection<S, T> {
    fn drop(&mut self) {
        if self.sftp.is_none() && self.transport.is_none() {
            return;
        }

        let sftp = self.sftp.take();
        let transport = self.transport.take();
        let addr = self.addr.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn(release(addr, sftp, transport, self.events.clone(), false));
            }
            Err(_) => {
                transfer_log::log_release_failure(
                    &addr,
                    "transport",
                    "connection dropped without a Tokio runtime",
                );
            }
        }
    }
}
