//! Common test utilities

#![allow(dead_code)]

use std::path::PathBuf;

use report_sftp::config::Settings;

/// Directory holding the throwaway test keys
pub fn keys_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keys")
}

/// Unencrypted ed25519 private key in OpenSSH PEM form
pub fn valid_key_pem() -> String {
    std::fs::read_to_string(keys_dir().join("id_ed25519")).expect("Failed to read test key")
}

/// Settings pointing at `host:port` with no credential configured
pub fn bare_settings(host: &str, port: u16) -> Settings {
    Settings {
        host: host.to_string(),
        port: port.to_string(),
        username: "recon".to_string(),
        remote_path: "/upload".to_string(),
        ..Settings::default()
    }
}

/// A local port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
