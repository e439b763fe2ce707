use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::Clock;

/// Lifetime of a freshly issued login token.
pub const CREDENTIAL_TTL_DAYS: i64 = 30;

/// Site-wide scope, the same every credential is written with.
pub const CREDENTIAL_SCOPE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

impl Credential {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Bearer token handed to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Persistence behind the credential store.
///
/// Expiry lives here, not in the store: like a browser cookie jar, a storage
/// answers `None` once the credential is past its expiry.
pub trait TokenStorage: Send {
    fn load(&self, now: DateTime<Utc>) -> Result<Option<Credential>>;
    fn save(&mut self, credential: &Credential) -> Result<()>;
    fn remove(&mut self) -> Result<()>;
}

/// JSON file in the user's data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileStorage {
    fn load(&self, now: DateTime<Utc>) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials: {}", self.path.display()))?;
        let credential: Credential = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed credentials file: {}", self.path.display()))?;

        if credential.is_live_at(now) {
            Ok(Some(credential))
        } else {
            tracing::debug!(expired_at = %credential.expires_at, "stored credential has expired");
            Ok(None)
        }
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write credentials: {}", self.path.display()))
    }

    fn remove(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove credentials: {}", self.path.display())
            }),
        }
    }
}

/// The single credential token of this client.
///
/// Written once per successful login, read on every protected view and every
/// authenticated request, cleared only by an explicit logout.
pub struct CredentialStore {
    storage: Box<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(storage: Box<dyn TokenStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn set(&mut self, token: &str, ttl_days: i64) -> Result<Credential> {
        let credential = Credential {
            value: token.to_string(),
            expires_at: self.clock.now() + Duration::days(ttl_days),
            scope: CREDENTIAL_SCOPE.to_string(),
        };
        self.storage.save(&credential)?;
        tracing::info!(expires_at = %credential.expires_at, "credential stored");
        Ok(credential)
    }

    pub fn get(&self) -> Option<String> {
        self.credential().map(|c| c.value)
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    pub fn credential(&self) -> Option<Credential> {
        match self.storage.load(self.clock.now()) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("ignoring unreadable credential: {e:#}");
                None
            }
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.get().map(Session::new)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove()?;
        tracing::info!("credential cleared");
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStorage;
