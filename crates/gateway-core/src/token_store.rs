//! Durable, atomic persistence of the OAuth [`Credential`].
//!
//! Writes go through a sibling temp file followed by a rename so a
//! concurrent `load` never observes a half-written file, and the file and
//! its parent directory are restricted to owner-only access.

use std::io;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::security::Credential;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("credential file not found")]
    NotFound,
    #[error("credential file is corrupt: {0}")]
    Corrupt(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Serialize, Deserialize)]
struct OnDiskCredential {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

impl From<&Credential> for OnDiskCredential {
    fn from(c: &Credential) -> Self {
        Self {
            access_token: c.access_token.expose_secret().to_string(),
            refresh_token: c.refresh_token.expose_secret().to_string(),
            expires_at: c.expires_at,
        }
    }
}

impl From<OnDiskCredential> for Credential {
    fn from(d: OnDiskCredential) -> Self {
        Self {
            access_token: SecretString::from(d.access_token),
            refresh_token: SecretString::from(d.refresh_token),
            expires_at: d.expires_at,
        }
    }
}

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: expand_tilde(path.into()) }
    }

    pub fn load(&self) -> Result<Credential, TokenStoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TokenStoreError::NotFound
            } else {
                TokenStoreError::Io(e)
            }
        })?;
        let on_disk: OnDiskCredential =
            serde_json::from_str(&content).map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;
        Ok(on_disk.into())
    }

    pub fn save(&self, credential: &Credential) -> Result<(), TokenStoreError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| TokenStoreError::Corrupt("token path has no parent directory".into()))?;
        std::fs::create_dir_all(parent)?;
        set_owner_only(parent)?;

        let on_disk = OnDiskCredential::from(credential);
        let json = serde_json::to_string_pretty(&on_disk)
            .map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;

        let tmp_path = parent.join(format!(
            ".{}.tmp-{}",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("tokens.json"),
            std::process::id()
        ));
        std::fs::write(&tmp_path, json)?;
        set_owner_only(&tmp_path)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::Io(e)),
        }
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if path.is_dir() { 0o700 } else { 0o600 };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path;
    };
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(stripped)
}
