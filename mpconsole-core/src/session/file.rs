//! File-backed session storage.
//!
//! The credential lives in a small JSON document with a single `token` slot:
//!
//! ```json
//! { "token": "eyJhbGciOi...", "saved_at": "2024-05-01T12:00:00Z" }
//! ```
//!
//! The file is read once when the store is opened and rewritten on every
//! `set`. `clear` removes the file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{Credential, SessionStore};

/// On-disk format of the session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

/// Persistent session store keeping the credential in a JSON file.
///
/// Reads are served from an in-memory copy so `get` never touches the disk.
/// I/O failures are logged and otherwise ignored: a store whose file cannot be
/// written still holds the credential for the lifetime of the process.
pub struct FileSessionStore {
    path: PathBuf,
    slot: RwLock<Option<Credential>>,
}

impl FileSessionStore {
    /// Default location: `<data_dir>/mpconsole/session.json`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "mpconsole", "mpconsole")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    /// Open the store at `path`, loading any credential already saved there.
    ///
    /// A missing file means "no session". An unreadable or corrupt file is
    /// logged and also treated as "no session".
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slot = load(&path);
        Self {
            path,
            slot: RwLock::new(slot),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, credential: &Credential) {
        if let Err(e) = write_file(&self.path, credential) {
            tracing::warn!("Failed to persist session to {:?}: {}", self.path, e);
        }
    }
}

fn load(path: &Path) -> Option<Credential> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Failed to read session file {:?}: {}", path, e);
            return None;
        }
    };

    match serde_json::from_str::<SessionFile>(&contents) {
        Ok(file) => file
            .token
            .filter(|t| !t.is_empty())
            .map(Credential::new),
        Err(e) => {
            tracing::warn!("Ignoring corrupt session file {:?}: {}", path, e);
            None
        }
    }
}

fn write_file(path: &Path, credential: &Credential) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let document = SessionFile {
        token: Some(credential.expose().to_string()),
        saved_at: Some(Utc::now()),
    };
    let contents = serde_json::to_vec_pretty(&document)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(&contents)?;
    file.flush()
}

impl std::fmt::Debug for FileSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSessionStore")
            .field("path", &self.path)
            .field("authenticated", &self.slot.read().is_some())
            .finish()
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Credential> {
        self.slot.read().clone()
    }

    fn set(&self, credential: Credential) {
        let mut slot = self.slot.write();
        self.persist(&credential);
        *slot = Some(credential);
    }

    fn clear(&self) {
        let mut slot = self.slot.write();
        slot.take();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove session file {:?}: {}", self.path, e),
        }
    }
}
