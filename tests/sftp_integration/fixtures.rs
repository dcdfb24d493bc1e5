//! Live SFTP server fixtures
//!
//! The server is described through environment variables; tests skip when
//! `REPORT_SFTP_TEST_HOST` is unset.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::io::AsyncReadExt;

use report_sftp::config::Settings;
use report_sftp::sftp::SftpClient;
use report_sftp::ssh::CredentialResolver;
use report_sftp::events::TracingSink;

pub const HOST_ENV: &str = "REPORT_SFTP_TEST_HOST";

/// Configuration for the test SFTP server
#[derive(Debug, Clone)]
pub struct TestSftpServer {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub private_key_path: Option<PathBuf>,
    pub remote_dir: String,
}

impl TestSftpServer {
    pub fn from_env() -> Option<Self> {
        let host = std::env::var(HOST_ENV).ok().filter(|h| !h.trim().is_empty())?;
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        Some(Self {
            host,
            port: var("REPORT_SFTP_TEST_PORT", "22").parse().unwrap_or(22),
            username: var("REPORT_SFTP_TEST_USER", "testuser"),
            password: var("REPORT_SFTP_TEST_PASSWORD", "testpass123"),
            private_key_path: std::env::var("REPORT_SFTP_TEST_KEY").ok().map(PathBuf::from),
            remote_dir: var("REPORT_SFTP_TEST_DIR", "upload"),
        })
    }

    /// Settings using password authentication
    pub fn password_settings(&self) -> Settings {
        Settings {
            host: self.host.clone(),
            port: self.port.to_string(),
            username: self.username.clone(),
            remote_path: self.remote_dir.clone(),
            password: SecretString::from(self.password.clone()),
            ..Settings::default()
        }
    }

    /// Read a remote file back over a fresh connection
    pub async fn read_remote(&self, path: &str) -> Vec<u8> {
        let settings = self.password_settings();
        let auth = CredentialResolver::from_settings(&settings)
            .resolve(&settings.username, &TracingSink)
            .expect("Failed to resolve credential");
        let connection = SftpClient::default()
            .connect(&settings.address(), &auth, Arc::new(TracingSink))
            .await
            .expect("Failed to connect for read-back");

        let mut content = Vec::new();
        {
            let sftp = connection.sftp().expect("open session");
            let mut file = sftp.open(path).await.expect("Failed to open remote file");
            file.read_to_end(&mut content)
                .await
                .expect("Failed to read remote file");
        }
        connection.close().await;
        content
    }
}

/// Skip the test when no live server is configured
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match super::fixtures::TestSftpServer::from_env() {
            Some(server) => server,
            None => {
                eprintln!(
                    "Skipping test: {} not set",
                    super::fixtures::HOST_ENV
                );
                return;
            }
        }
    };
}
