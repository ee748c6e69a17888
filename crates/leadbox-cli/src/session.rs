//! Admin session persistence.
//!
//! An [`AdminSession`] holds the admin credential between CLI invocations.
//! It is set by `admin login`, removed by `admin logout`, and read before
//! every protected call. [`SessionStore`] loads and saves it as JSON; on
//! Unix the file is created with mode `0600`.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use leadbox_core::auth::Credentials;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Cached admin credential.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization: Option<String>,
}

impl AdminSession {
    /// A session already logged in with `credentials`.
    #[must_use]
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let mut session = Self::default();
        session.login(credentials);
        session
    }

    pub fn login(&mut self, credentials: &Credentials) {
        self.username = Some(credentials.username.clone());
        self.authorization = Some(credentials.to_authorization_header());
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.authorization.is_some()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// `Authorization` header value for protected calls.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoggedIn`] after logout or before login.
    pub fn authorization(&self) -> Result<&str, ClientError> {
        self.authorization
            .as_deref()
            .ok_or(ClientError::NotLoggedIn)
    }
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("username", &self.username)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

/// File-backed storage for the [`AdminSession`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.leadbox/session.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the home directory is unknown.
    pub fn default_path() -> Result<PathBuf, ClientError> {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".leadbox").join("session.json"))
            .map_err(|_| {
                ClientError::Session(
                    "cannot determine home directory (HOME / USERPROFILE not set)".to_owned(),
                )
            })
    }

    /// Load the saved session. A missing file is a logged-out session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(&self) -> Result<AdminSession, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ClientError::Session(format!("{} is corrupt: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AdminSession::default()),
            Err(e) => Err(ClientError::Session(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] on any I/O failure.
    pub fn save(&self, session: &AdminSession) -> Result<(), ClientError> {
        let io_err = |e: std::io::Error| {
            ClientError::Session(format!("failed to write {}: {e}", self.path.display()))
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::Session(e.to_string()))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt as _;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        Ok(())
    }

    /// Remove the saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the file exists but cannot be
    /// removed.
    pub fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Session(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
