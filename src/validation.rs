//! Validation for transfer settings.
//!
//! Checks the server hostname, port, username and remote base path before the
//! settings are handed to the uploader.

use std::net::IpAddr;

use regex::Regex;
use std::sync::LazyLock;

/// Validation error with field context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

static DNS_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap());

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.-]{0,31}$").unwrap());

/// Server host: an IP literal or an RFC 1123 DNS name of at most 253 bytes.
pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    let host = hostname.trim();

    if host.is_empty() {
        return Err(ValidationError::new("host", "Server host is required"));
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if host.len() > 253 {
        return Err(ValidationError::new("host", "Server host is longer than 253 characters"));
    }

    match host.split('.').find(|label| !DNS_LABEL_REGEX.is_match(label)) {
        Some(label) => Err(ValidationError::new(
            "host",
            format!("'{}' is not a valid DNS label in '{}'", label, host),
        )),
        None => Ok(()),
    }
}

/// Port as text, parsed into 1-65535.
pub fn validate_port(port: &str) -> Result<u16, ValidationError> {
    match port.trim().parse::<u16>() {
        Ok(0) => Err(ValidationError::new("port", "Port must be between 1 and 65535")),
        Ok(port) => Ok(port),
        Err(_) => Err(ValidationError::new(
            "port",
            format!("'{}' is not a port number", port.trim()),
        )),
    }
}

/// SFTP login name: POSIX style, at most 32 characters.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::new(
            "username",
            "Username must start with a letter or underscore, contain only letters, digits, '_', '-' or '.', and be at most 32 characters",
        ));
    }

    Ok(())
}

/// Validate the remote base directory.
///
/// An empty path is accepted and means the login directory of the SFTP user.
pub fn validate_remote_path(path: &str) -> Result<(), ValidationError> {
    if path.contains('\0') {
        return Err(ValidationError::new(
            "remote_path",
            "Remote path must not contain NUL characters",
        ));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(ValidationError::new(
            "remote_path",
            "Remote path must not contain '..' segments",
        ));
    }

    Ok(())
}
