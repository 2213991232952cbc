use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::CredentialPair;

/// Storage key for the access token.
pub const ACCESS_KEY: &str = "bb_access";
/// Storage key for the refresh token.
pub const REFRESH_KEY: &str = "bb_refresh";

const CREDENTIAL_FILE_NAME: &str = "credentials.toml";

/// Durable holder of the session's two bearer strings.
///
/// Pure accessor: no validation of token contents. Reads never fail; an
/// unreadable backing store reads as "absent".
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    /// Persist both tokens, replacing any prior pair.
    fn set(&self, pair: &CredentialPair) -> Result<(), AuthError>;
    /// Remove both tokens.
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed credential store (`credentials.toml`, mode 0600).
///
/// # Example
/// ```no_run
/// use bellbook::auth::{CredentialPair, CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new("/tmp/bellbook");
/// store.set(&CredentialPair::new("access", "refresh"))?;
/// assert_eq!(store.access_token().as_deref(), Some("access"));
/// # Ok::<(), bellbook::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(CREDENTIAL_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Option<CredentialFile> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "credential read failed");
                return None;
            }
        };
        match toml::from_str(&raw) {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "credential file unreadable");
                None
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.read_file()?.access
    }

    fn refresh_token(&self) -> Option<String> {
        self.read_file()?.refresh
    }

    fn set(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        let file = CredentialFile {
            access: Some(pair.access_token.clone()),
            refresh: Some(pair.refresh_token.clone()),
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Process-local credential store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }

    fn snapshot(&self) -> Option<CredentialPair> {
        self.pair.lock().ok()?.clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.snapshot().map(|p| p.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.snapshot().map(|p| p.refresh_token)
    }

    fn set(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        let mut guard = self
            .pair
            .lock()
            .map_err(|_| AuthError::Io("credential lock poisoned".to_string()))?;
        *guard = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self
            .pair
            .lock()
            .map_err(|_| AuthError::Io("credential lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(rename = "bb_access", default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(rename = "bb_refresh", default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| AuthError::Io(format!("{} has no file name", path.display())))?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_name = format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}
