//! Credential resolution for the Confluence server.
//!
//! Explicit `username`/`password` in `[confluence]` take precedence. Otherwise
//! a credentials store is consulted, keyed by the host of `base_url`:
//!
//! ```toml
//! [servers."wiki.example.com"]
//! username = "publisher"
//! password = "api-token"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::expand::expand_home;
use crate::{ConfigError, ConfluenceConfig};

/// Default location of the credentials store.
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.config/wikipub/credentials.toml";

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Account name (e-mail address on Confluence Cloud).
    pub username: String,
    /// Password or API token.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Credentials store: server entries keyed by host name.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    servers: HashMap<String, Credentials>,
}

impl CredentialStore {
    /// Parse a store from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid store.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a store from disk.
    ///
    /// A missing file yields an empty store unless `required` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing required file, or an
    /// I/O or parse error.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            debug!(path = %path.display(), "No credentials store");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Credentials registered for `host`.
    #[must_use]
    pub fn lookup(&self, host: &str) -> Option<&Credentials> {
        self.servers.get(host)
    }
}

impl ConfluenceConfig {
    /// Host part of `base_url`, used as the credentials store key.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }

    /// Path of the credentials store (configured or default, `~` expanded).
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        let raw = self
            .credentials_file
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIALS_FILE);
        PathBuf::from(expand_home(raw))
    }

    /// Resolve credentials: explicit values first, then the store by host.
    ///
    /// Returns `None` when no credentials are available.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly configured store cannot be read.
    pub fn resolve_credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return Ok(Some(Credentials {
                username: username.to_owned(),
                password: self.password.clone().unwrap_or_default(),
            }));
        }

        let Some(host) = self.host() else {
            return Ok(None);
        };
        let store = CredentialStore::load(&self.credentials_path(), self.credentials_file.is_some())?;
        let found = store.lookup(&host).cloned();
        if found.is_some() {
            debug!(host = %host, "Using credentials from store");
        }
        Ok(found)
    }
}
