use std::future::Future;

use russh::client::Handler;
use russh::keys::{HashAlg, PublicKey};

use crate::config::HostKeyPolicy;
use crate::error::SshError;
use crate::transfer_log;

/// SSH client handler applying the configured host key policy
pub struct ClientHandler {
    addr: String,
    policy: HostKeyPolicy,
}

impl ClientHandler {
    pub fn new(addr: String, policy: HostKeyPolicy) -> Self {
        Self { addr, policy }
    }

    fn verify(&self, server_public_key: &PublicKey) -> Result<bool, SshError> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();

        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                transfer_log::log_host_key_unverified(&self.addr, &fingerprint);
                Ok(true)
            }
            HostKeyPolicy::Fingerprint(expected) => {
                if expected.trim() == fingerprint {
                    tracing::debug!("Host key verified for {}", self.addr);
                    Ok(true)
                } else {
                    transfer_log::log_host_key_mismatch(&self.addr, expected.trim(), &fingerprint);
                    Err(SshError::HostKeyVerification(format!(
                        "{} presented {}, expected {}",
                        self.addr,
                        fingerprint,
                        expected.trim()
                    )))
                }
            }
        }
    }
}

impl Handler for ClientHandler {
    type Error = SshError;

    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let result = self.verify(server_public_key);
        async move { result }
    }
}
