//! Credential resolution
//!
//! Settings may carry a key file path, inline key material and a password at
//! the same time. The resolver walks an ordered list of [`CredentialSource`]s
//! (key file, inline key, password) and binds the first usable one into an
//! [`AuthHandle`]. Whether a load failure falls through to the next candidate
//! is decided by [`CredentialPolicy`].

use std::sync::Arc;

use russh::keys::{HashAlg, PrivateKeyWithHashAlg};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{CredentialPolicy, Settings, paths};
use crate::error::{CredentialError, TransferError};
use crate::events::{EventSink, TransferEvent};

/// Which configured credential produced an auth method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    KeyFile,
    InlineKey,
    Password,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::KeyFile => "private key file",
            CredentialKind::InlineKey => "inline private key",
            CredentialKind::Password => "password",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved authentication for an SSH connection
pub enum ResolvedAuth {
    /// Password authentication with zeroized secret string
    Password(SecretString),
    /// Public key authentication with loaded key
    PublicKey(PrivateKeyWithHashAlg),
}

impl std::fmt::Debug for ResolvedAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedAuth::Password(_) => f.debug_tuple("Password").field(&"[REDACTED]").finish(),
            ResolvedAuth::PublicKey(_) => f.debug_tuple("PublicKey").field(&"[KEY]").finish(),
        }
    }
}

impl ResolvedAuth {
    /// SSH userauth method name
    pub fn method_name(&self) -> &'static str {
        match self {
            ResolvedAuth::Password(_) => "password",
            ResolvedAuth::PublicKey(_) => "publickey",
        }
    }
}

/// One candidate credential in the precedence list
pub trait CredentialSource: Send + Sync {
    fn kind(&self) -> CredentialKind;

    /// Whether the underlying settings field is populated
    fn is_configured(&self) -> bool;

    fn produce_auth_method(&self) -> Result<ResolvedAuth, CredentialError>;
}

/// Private key read from a file on the local disk
pub struct KeyFileSource {
    path: String,
    passphrase: Option<SecretString>,
}

impl KeyFileSource {
    pub fn new(path: impl Into<String>, passphrase: Option<SecretString>) -> Self {
        Self {
            path: path.into(),
            passphrase,
        }
    }
}

impl CredentialSource for KeyFileSource {
    fn kind(&self) -> CredentialKind {
        CredentialKind::KeyFile
    }

    fn is_configured(&self) -> bool {
        !self.path.trim().is_empty()
    }

    fn produce_auth_method(&self) -> Result<ResolvedAuth, CredentialError> {
        let path = paths::expand_tilde(self.path.trim());
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CredentialError::ReadKeyFile { path: path.clone(), source: e })?;

        decode_private_key(
            &content,
            &format!("File {}", path.display()),
            passphrase_of(&self.passphrase),
        )
    }
}

/// Private key material supplied directly, e.g. from an environment variable
pub struct InlineKeySource {
    material: SecretString,
    passphrase: Option<SecretString>,
}

impl InlineKeySource {
    pub fn new(material: SecretString, passphrase: Option<SecretString>) -> Self {
        Self {
            material,
            passphrase,
        }
    }
}

impl CredentialSource for InlineKeySource {
    fn kind(&self) -> CredentialKind {
        CredentialKind::InlineKey
    }

    fn is_configured(&self) -> bool {
        !self.material.expose_secret().trim().is_empty()
    }

    fn produce_auth_method(&self) -> Result<ResolvedAuth, CredentialError> {
        let material = normalize_inline_key(self.material.expose_secret());
        decode_private_key(
            &material,
            "Inline key material",
            passphrase_of(&self.passphrase),
        )
    }
}

/// Plain password
pub struct PasswordSource {
    password: SecretString,
}

impl PasswordSource {
    pub fn new(password: SecretString) -> Self {
        Self { password }
    }
}

impl CredentialSource for PasswordSource {
    fn kind(&self) -> CredentialKind {
        CredentialKind::Password
    }

    fn is_configured(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    fn produce_auth_method(&self) -> Result<ResolvedAuth, CredentialError> {
        Ok(ResolvedAuth::Password(self.password.clone()))
    }
}

fn passphrase_of(passphrase: &Option<SecretString>) -> Option<&str> {
    passphrase
        .as_ref()
        .map(|p| p.expose_secret())
        .filter(|p| !p.is_empty())
}

/// Single-line environment values often carry `\n` escapes instead of newlines.
fn normalize_inline_key(material: &str) -> String {
    let trimmed = material.trim();
    if !trimmed.contains('\n') && trimmed.contains("\\n") {
        trimmed.replace("\\n", "\n")
    } else {
        trimmed.to_string()
    }
}

/// Decode PEM/OpenSSH private key text into a public key auth method
fn decode_private_key(
    content: &str,
    origin: &str,
    passphrase: Option<&str>,
) -> Result<ResolvedAuth, CredentialError> {
    // Check if this is actually a public key (common mistake)
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.starts_with("ssh-") || first_line.starts_with("ecdsa-") {
        return Err(CredentialError::PublicKeySupplied(origin.to_string()));
    }

    if !first_line.starts_with("-----BEGIN") {
        return Err(CredentialError::NotPem(origin.to_string()));
    }

    let key = russh::keys::decode_secret_key(content, passphrase).map_err(|e| {
        let msg = e.to_string();
        let normalized = msg.to_lowercase();
        // Detect passphrase-related errors from various russh error messages
        let is_passphrase_error = normalized.contains("encrypted")
            || normalized.contains("passphrase")
            || normalized.contains("cryptographic");
        if is_passphrase_error {
            if passphrase.is_some() {
                CredentialError::PassphraseInvalid(origin.to_string())
            } else {
                CredentialError::PassphraseRequired(origin.to_string())
            }
        } else {
            CredentialError::Decode {
                origin: origin.to_string(),
                reason: msg,
            }
        }
    })?;

    // Only use SHA-512 hash algorithm for RSA keys
    // ED25519 and other keys use their native signing algorithms
    let hash_alg = if key.algorithm().is_rsa() {
        Some(HashAlg::Sha512)
    } else {
        None
    };

    Ok(ResolvedAuth::PublicKey(PrivateKeyWithHashAlg::new(
        Arc::new(key),
        hash_alg,
    )))
}

/// Authentication method bound at construction, shared read-only by every
/// connection attempt.
#[derive(Clone)]
pub struct AuthHandle {
    username: Arc<str>,
    kind: CredentialKind,
    auth: Arc<ResolvedAuth>,
}

impl std::fmt::Debug for AuthHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHandle")
            .field("username", &self.username)
            .field("kind", &self.kind)
            .field("auth", &self.auth)
            .finish()
    }
}

impl AuthHandle {
    pub fn new(username: &str, kind: CredentialKind, auth: ResolvedAuth) -> Self {
        Self {
            username: Arc::from(username),
            kind,
            auth: Arc::new(auth),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn auth(&self) -> &ResolvedAuth {
        &self.auth
    }
}

/// Ordered credential candidates plus the fallthrough policy
pub struct CredentialResolver {
    candidates: Vec<Box<dyn CredentialSource>>,
    policy: CredentialPolicy,
}

impl CredentialResolver {
    pub fn new(candidates: Vec<Box<dyn CredentialSource>>, policy: CredentialPolicy) -> Self {
        Self { candidates, policy }
    }

    /// Key file, then inline key, then password
    pub fn from_settings(settings: &Settings) -> Self {
        let passphrase = settings.private_key_passphrase.clone();
        let candidates: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(KeyFileSource::new(
                settings.private_key_path.clone(),
                passphrase.clone(),
            )),
            Box::new(InlineKeySource::new(
                settings.private_key.clone(),
                passphrase,
            )),
            Box::new(PasswordSource::new(settings.password.clone())),
        ];

        Self::new(candidates, settings.credential_policy)
    }

    /// Candidate order, highest precedence first
    pub fn order(&self) -> Vec<CredentialKind> {
        self.candidates.iter().map(|c| c.kind()).collect()
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    /// Pick the first usable credential.
    ///
    /// Unconfigured candidates are skipped. Under [`CredentialPolicy::Strict`]
    /// the first configured candidate is final; under
    /// [`CredentialPolicy::Lenient`] a load failure moves on to the next one.
    pub fn resolve(
        &self,
        username: &str,
        events: &dyn EventSink,
    ) -> Result<AuthHandle, TransferError> {
        let mut failures = Vec::new();

        for candidate in &self.candidates {
            if !candidate.is_configured() {
                continue;
            }

            let kind = candidate.kind();
            match candidate.produce_auth_method() {
                Ok(auth) => {
                    events.emit(&TransferEvent::CredentialSelected {
                        source: kind.as_str(),
                    });
                    return Ok(AuthHandle::new(username, kind, auth));
                }
                Err(e) => {
                    tracing::debug!("Credential {} unusable: {}", kind, e);
                    events.emit(&TransferEvent::CredentialRejected {
                        source: kind.as_str(),
                        reason: e.to_string(),
                    });
                    failures.push(format!("{}: {}", kind, e));

                    if self.policy == CredentialPolicy::Strict {
                        break;
                    }
                }
            }
        }

        if failures.is_empty() {
            Err(TransferError::NoUsableCredential(
                "no private key path, inline private key or password configured".to_string(),
            ))
        } else {
            Err(TransferError::NoUsableCredential(failures.join("; ")))
        }
    }
}
