//! Admin authentication.
//!
//! The admin area is guarded by a single shared credential sent as HTTP
//! Basic auth. Callers hand the raw `Authorization` header to an
//! [`AdminAuthenticator`] and either get an [`AdminIdentity`] back or an
//! [`AuthError`]. The HTTP layer maps every error to the same response so
//! a caller cannot tell which part was wrong.
//!
//! # Security model
//!
//! - The configured password is kept only as a SHA-256 digest.
//! - Comparisons use `subtle::ConstantTimeEq` on digests of equal length.
//! - Username and password are both always compared, so timing does not
//!   reveal which one failed.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;

const BASIC_SCHEME: &str = "basic";

/// Username and password as sent by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64(user:pass)>` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] for any other scheme, bad base64,
    /// non-UTF-8 content, or a missing `:` separator.
    pub fn from_authorization_header(value: &str) -> Result<Self, AuthError> {
        let (scheme, encoded) = value.trim().split_once(' ').ok_or(AuthError::Malformed {
            reason: "expected '<scheme> <credentials>'".to_owned(),
        })?;

        if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
            return Err(AuthError::Malformed {
                reason: format!("unsupported scheme '{scheme}'"),
            });
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::Malformed {
                reason: format!("invalid base64: {e}"),
            })?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Malformed {
            reason: "credentials are not valid UTF-8".to_owned(),
        })?;

        let (username, password) = decoded.split_once(':').ok_or(AuthError::Malformed {
            reason: "missing ':' between username and password".to_owned(),
        })?;

        Ok(Self::new(username, password))
    }

    /// Encode as an `Authorization` header value.
    #[must_use]
    pub fn to_authorization_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An authenticated admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub username: String,
}

/// Decides whether a request may use the admin area.
#[async_trait]
pub trait AdminAuthenticator: Send + Sync + 'static {
    /// Check the raw `Authorization` header value, if one was sent.
    async fn authenticate(&self, authorization: Option<&str>) -> Result<AdminIdentity, AuthError>;
}

/// Authenticates against one configured username and password.
pub struct SharedSecretAuthenticator {
    username: String,
    username_digest: Vec<u8>,
    password_digest: Vec<u8>,
}

impl SharedSecretAuthenticator {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            username_digest: digest(username),
            password_digest: digest(password),
        }
    }

    fn verify(&self, credentials: &Credentials) -> bool {
        let user_ok = self
            .username_digest
            .as_slice()
            .ct_eq(digest(&credentials.username).as_slice());
        let pass_ok = self
            .password_digest
            .as_slice()
            .ct_eq(digest(&credentials.password).as_slice());
        (user_ok & pass_ok).into()
    }
}

#[async_trait]
impl AdminAuthenticator for SharedSecretAuthenticator {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<AdminIdentity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredentials)?;
        let credentials = Credentials::from_authorization_header(header)?;

        if !self.verify(&credentials) {
            debug!("admin credentials rejected");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AdminIdentity {
            username: self.username.clone(),
        })
    }
}

impl std::fmt::Debug for SharedSecretAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Rejects everyone. Installed when no admin password is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllAuthenticator;

#[async_trait]
impl AdminAuthenticator for DenyAllAuthenticator {
    async fn authenticate(&self, _authorization: Option<&str>) -> Result<AdminIdentity, AuthError> {
        Err(AuthError::Disabled)
    }
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn authenticator() -> SharedSecretAuthenticator {
        SharedSecretAuthenticator::new("admin", "s3cret:with-colon")
    }

    #[test]
    fn header_round_trips() {
        let credentials = Credentials::new("admin", "s3cret:with-colon");
        let header = credentials.to_authorization_header();
        assert!(header.starts_with("Basic "));
        assert_eq!(
            Credentials::from_authorization_header(&header).unwrap(),
            credentials
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let header = format!("bAsIc {}", STANDARD.encode("admin:pw"));
        let credentials = Credentials::from_authorization_header(&header).unwrap();
        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.password, "pw");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let no_colon = format!("Basic {}", STANDARD.encode("no-colon"));
        for header in ["Basic", "Bearer abc", "Basic !!!not-base64", no_colon.as_str()] {
            let err = Credentials::from_authorization_header(header).unwrap_err();
            assert!(matches!(err, AuthError::Malformed { .. }), "{header}");
        }
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }

    #[tokio::test]
    async fn correct_credentials_authenticate() {
        let header = Credentials::new("admin", "s3cret:with-colon").to_authorization_header();
        let identity = authenticator()
            .authenticate(Some(&header))
            .await
            .unwrap();
        assert_eq!(identity.username, "admin");
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let auth = authenticator();
        for (user, pass) in [("admin", "wrong"), ("root", "s3cret:with-colon"), ("", "")] {
            let header = Credentials::new(user, pass).to_authorization_header();
            assert_eq!(
                auth.authenticate(Some(&header)).await,
                Err(AuthError::InvalidCredentials)
            );
        }
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        assert_eq!(
            authenticator().authenticate(None).await,
            Err(AuthError::MissingCredentials)
        );
    }

    #[tokio::test]
    async fn deny_all_rejects_valid_looking_credentials() {
        let header = Credentials::new("admin", "anything").to_authorization_header();
        assert_eq!(
            DenyAllAuthenticator.authenticate(Some(&header)).await,
            Err(AuthError::Disabled)
        );
    }
}
