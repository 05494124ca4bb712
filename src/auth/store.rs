use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use crate::error::{ConsoleError, Result};

/// Storage abstraction for the persisted console credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self, profile: &str) -> Result<Option<Credentials>>;
    fn save(&self, profile: &str, credentials: &Credentials) -> Result<()>;
    fn clear(&self, profile: &str) -> Result<()>;
}

/// File-backed credential store using TOML files, one per profile.
///
/// # Example
/// ```no_run
/// use xianyu_admin::auth::{CredentialStore, Credentials, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// store.save("default", &Credentials::bearer("token"))?;
/// # Ok::<(), xianyu_admin::error::ConsoleError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_home_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn credential_path(&self, profile: &str) -> PathBuf {
        let profile = normalize_label(profile);
        let name = if profile == "default" {
            "credentials.toml".to_string()
        } else {
            format!("credentials.{profile}.toml")
        };
        self.base_dir.join(name)
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, profile: &str) -> Result<Option<Credentials>> {
        let path = self.credential_path(profile);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ConsoleError::Io(err)),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        Ok(Some(file.credentials))
    }

    fn save(&self, profile: &str, credentials: &Credentials) -> Result<()> {
        let path = self.credential_path(profile);
        Self::ensure_parent(&path)?;
        let file = CredentialFile {
            version: 1,
            profile: profile.to_string(),
            credentials: credentials.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %path.display(), "credential saved");
        Ok(())
    }

    fn clear(&self, profile: &str) -> Result<()> {
        let path = self.credential_path(profile);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ConsoleError::Io(err)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    profile: String,
    credentials: Credentials,
    saved_at: DateTime<Utc>,
}

/// Default credential directory (`~/.xianyu-admin`).
pub fn default_home_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".xianyu-admin"))
        .unwrap_or_else(|| PathBuf::from(".xianyu-admin"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
