//! Security event logging for audit trails.
//!
//! Provides structured logging functions for security-relevant events such as
//! credential selection, authentication attempts, SFTP session establishment
//! and host key decisions.
//!
//! All security events are logged with `target: "security"` to allow filtering
//! in production environments.
//!
//! # Example
//!
//! Filter security events only:
//! ```bash
//! RUST_LOG=security=info report-sftp reports/*.csv
//! ```

use tracing::{info, warn};

/// Log which credential the resolver settled on.
pub fn log_credential_selected(source: &str) {
    info!(
        target: "security",
        event = "credential_selected",
        source = %source,
        "Using {} authentication",
        source
    );
}

/// Log a configured credential that could not be loaded.
pub fn log_credential_rejected(source: &str, reason: &str) {
    warn!(
        target: "security",
        event = "credential_rejected",
        source = %source,
        reason = %reason,
        "Configured credential could not be used"
    );
}

/// Log an SSH authentication attempt.
///
/// Called before attempting to authenticate with a remote host.
pub fn log_auth_attempt(addr: &str, username: &str, method: &str) {
    info!(
        target: "security",
        event = "auth_attempt",
        addr = %addr,
        username = %username,
        method = %method,
        "SSH authentication attempt"
    );
}

/// Log a successful SSH authentication.
pub fn log_auth_success(addr: &str, username: &str, method: &str) {
    info!(
        target: "security",
        event = "auth_success",
        addr = %addr,
        username = %username,
        method = %method,
        "SSH authentication succeeded"
    );
}

/// Log a failed SSH authentication attempt.
pub fn log_auth_failure(addr: &str, username: &str, method: &str, reason: &str) {
    warn!(
        target: "security",
        event = "auth_failure",
        addr = %addr,
        username = %username,
        method = %method,
        reason = %reason,
        "SSH authentication failed"
    );
}

/// Log an SFTP session establishment.
pub fn log_sftp_connect(addr: &str, username: &str) {
    info!(
        target: "security",
        event = "sftp_connect",
        addr = %addr,
        username = %username,
        "SFTP session established"
    );
}

/// Log a host key accepted without verification.
pub fn log_host_key_unverified(addr: &str, fingerprint: &str) {
    warn!(
        target: "security",
        event = "host_key_unverified",
        addr = %addr,
        fingerprint = %fingerprint,
        "Accepting host key without verification"
    );
}

/// Log a host key that does not match the pinned fingerprint.
pub fn log_host_key_mismatch(addr: &str, expected: &str, actual: &str) {
    warn!(
        target: "security",
        event = "host_key_mismatch",
        addr = %addr,
        expected = %expected,
        actual = %actual,
        "Host key does not match pinned fingerprint"
    );
}

/// Log the end of an SSH connection.
pub fn log_ssh_disconnect(addr: &str, clean: bool) {
    info!(
        target: "security",
        event = "ssh_disconnect",
        addr = %addr,
        clean = clean,
        "SSH connection closed"
    );
}

/// Log a failure while releasing one layer of a connection.
///
/// `layer` is `"sftp"` for the protocol session or `"transport"` for SSH.
pub fn log_release_failure(addr: &str, layer: &str, reason: &str) {
    warn!(
        target: "security",
        event = "release_failure",
        addr = %addr,
        layer = %layer,
        reason = %reason,
        "Failed to release connection layer"
    );
}
