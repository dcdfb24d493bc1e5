//! SFTP client for establishing connections

use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Config};
use russh_sftp::client::SftpSession as RusshSftpSession;
use secrecy::ExposeSecret;
use tokio::net::TcpStream;

use crate::config::HostKeyPolicy;
use crate::error::TransferError;
use crate::events::EventSink;
use crate::ssh::auth::{AuthHandle, ResolvedAuth};
use crate::ssh::handler::ClientHandler;
use crate::transfer_log;

use super::session::{SftpConnection, Transport};

/// SFTP client for establishing connections
pub struct SftpClient {
    config: Arc<Config>,
    host_key: HostKeyPolicy,
}

impl Default for SftpClient {
    fn default() -> Self {
        Self::new(60, HostKeyPolicy::AcceptAny)
    }
}

impl SftpClient {
    pub fn new(keepalive_interval: u64, host_key: HostKeyPolicy) -> Self {
        let config = Config {
            inactivity_timeout: Some(Duration::from_secs(3600)),
            keepalive_interval: Some(Duration::from_secs(keepalive_interval)),
            keepalive_max: 3,
            ..Default::default()
        };

        Self {
            config: Arc::new(config),
            host_key,
        }
    }

    /// Dial `addr`, authenticate and open an SFTP session.
    ///
    /// Anything up to and including authentication fails with
    /// [`TransferError::ConnectionFailed`]. Failures opening the channel or
    /// starting the SFTP subsystem disconnect the transport and return
    /// [`TransferError::ProtocolSessionFailed`].
    pub async fn connect(
        &self,
        addr: &str,
        auth: &AuthHandle,
        events: Arc<dyn EventSink>,
    ) -> Result<SftpConnection, TransferError> {
        let connection_failed = |reason: String| TransferError::ConnectionFailed {
            addr: addr.to_string(),
            reason,
        };

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| connection_failed(e.to_string()))?;

        let handler = ClientHandler::new(addr.to_string(), self.host_key.clone());
        let mut handle = client::connect_stream(self.config.clone(), stream, handler)
            .await
            .map_err(|e| connection_failed(format!("SSH handshake failed: {}", e)))?;

        if let Err(reason) = self.authenticate(&mut handle, addr, auth).await {
            abandon(handle, addr, "authentication failed").await;
            return Err(connection_failed(reason));
        }

        let sftp = match open_sftp(&handle).await {
            Ok(sftp) => sftp,
            Err(reason) => {
                abandon(handle, addr, "sftp session failed").await;
                return Err(TransferError::ProtocolSessionFailed(reason));
            }
        };

        transfer_log::log_sftp_connect(addr, auth.username());

        Ok(SftpConnection::new(addr.to_string(), handle, sftp, events))
    }

    async fn authenticate(
        &self,
        handle: &mut client::Handle<ClientHandler>,
        addr: &str,
        auth: &AuthHandle,
    ) -> Result<(), String> {
        let username = auth.username();
        let method_name = auth.auth().method_name();

        transfer_log::log_auth_attempt(addr, username, method_name);

        let result = match auth.auth() {
            // Use expose_secret() only at the point of authentication
            ResolvedAuth::Password(password) => {
                handle
                    .authenticate_password(username, password.expose_secret())
                    .await
            }
            ResolvedAuth::PublicKey(key) => {
                handle.authenticate_publickey(username, key.clone()).await
            }
        };

        let reason = match result {
            Ok(result) if result.success() => {
                transfer_log::log_auth_success(addr, username, method_name);
                return Ok(());
            }
            Ok(_) => "Authentication rejected by server".to_string(),
            Err(e) => format!("{} auth failed: {}", auth.kind(), e),
        };

        transfer_log::log_auth_failure(addr, username, method_name, &reason);
        Err(reason)
    }
}

/// Disconnect a transport that never carried a usable SFTP session
async fn abandon(handle: client::Handle<ClientHandler>, addr: &str, description: &'static str) {
    let clean = match handle.disconnect_transport(description).await {
        Ok(()) => true,
        Err(e) => {
            transfer_log::log_release_failure(addr, "transport", &e);
            false
        }
    };
    transfer_log::log_ssh_disconnect(addr, clean);
}

/// Open a session channel and start the SFTP subsystem on it
async fn open_sftp(handle: &client::Handle<ClientHandler>) -> Result<RusshSftpSession, String> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| format!("Failed to request SFTP subsystem: {}", e))?;

    RusshSftpSession::new(channel.into_stream())
        .await
        .map_err(|e| format!("Failed to initialize SFTP session: {}", e))
}
