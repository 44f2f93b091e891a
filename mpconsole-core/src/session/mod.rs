//! Session credential storage.
//!
//! This module provides:
//! - [`Credential`] - The bearer token of the current session, redacted in logs
//! - [`SessionStore`] - Trait for the single-slot credential store
//! - [`MemorySessionStore`] - In-memory implementation for tests and ephemeral sessions
//! - [`FileSessionStore`] - Persistent slot in the user's data directory
//! - [`KeyringSessionStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_session_store`] - Helper to select a backend from configuration
//!
//! # Slot Convention
//!
//! Every backend stores exactly one value under the slot name [`TOKEN_SLOT`]
//! (`"token"`). A store either holds a credential or it does not; there is no
//! other state.
//!
//! # Example
//!
//! ```rust
//! use mpconsole_core::session::{Credential, MemorySessionStore, SessionStore};
//!
//! let store = MemorySessionStore::new();
//! assert!(store.get().is_none());
//!
//! store.set(Credential::new("T"));
//! assert_eq!(store.get().unwrap().expose(), "T");
//!
//! store.clear();
//! assert!(store.get().is_none());
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

mod file;
#[cfg(feature = "keyring-store")]
mod keyring;
mod memory;

pub use file::FileSessionStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringSessionStore;
pub use memory::MemorySessionStore;

/// Name of the single persisted slot holding the bearer token.
pub const TOKEN_SLOT: &str = "token";

/// An opaque bearer token identifying an authenticated session.
///
/// The inner value is only accessible via [`expose()`](Credential::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is zeroed when the last copy is dropped.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Create a credential from a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Expose the token value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Value for the `Authorization` request header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

/// Single-slot store for the current session credential.
///
/// All operations are synchronous and total. Backends that can fail (disk,
/// keyring) log the failure and behave as if the slot were empty.
///
/// Read access is unrestricted. Writes belong to the login flow, the logout
/// action, the envelope interpreter on session expiry, and the navigation
/// guard's failure path.
pub trait SessionStore: Send + Sync {
    /// Current credential, if any.
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential.
    fn set(&self, credential: Credential);

    /// Remove the stored credential. A no-op when the slot is empty.
    fn clear(&self);

    /// Whether a credential is currently held.
    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// Shared handle passed to the transport, interpreter and guard.
pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Which backend keeps the session credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Process memory only; the session ends with the process.
    Memory,
    /// JSON file in the platform data directory.
    #[default]
    File,
    /// OS keyring (requires the `keyring-store` feature).
    Keyring,
}

/// Create a session store for the configured backend.
///
/// # Backend Selection Logic
///
/// - [`SessionBackend::File`]: uses `file_path` when given, otherwise
///   [`FileSessionStore::default_path`]. Falls back to memory if no data
///   directory can be determined.
/// - [`SessionBackend::Keyring`]: uses the OS keyring when the
///   `keyring-store` feature is enabled and the keyring is reachable,
///   otherwise falls back to memory with a warning.
/// - [`SessionBackend::Memory`]: always memory.
pub fn create_session_store(
    backend: SessionBackend,
    file_path: Option<PathBuf>,
) -> SharedSessionStore {
    match backend {
        SessionBackend::Memory => {}
        SessionBackend::File => {
            match file_path.or_else(FileSessionStore::default_path) {
                Some(path) => {
                    tracing::debug!("Using session file {:?}", path);
                    return Arc::new(FileSessionStore::open(path));
                }
                None => {
                    tracing::warn!(
                        "No data directory available, falling back to memory session. \
                         The session will not persist across restarts."
                    );
                }
            }
        }
        SessionBackend::Keyring => {
            #[cfg(feature = "keyring-store")]
            match KeyringSessionStore::try_new("mpconsole") {
                Ok(store) => {
                    tracing::info!("Using OS keyring for session storage");
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!(
                        "Keyring unavailable ({}), falling back to memory session. \
                         The session will not persist across restarts.",
                        e
                    );
                }
            }

            #[cfg(not(feature = "keyring-store"))]
            tracing::warn!(
                "Keyring session requested but keyring-store feature not enabled. \
                 Using memory session."
            );
        }
    }

    tracing::debug!("Using in-memory session storage");
    Arc::new(MemorySessionStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacted() {
        let credential = Credential::new("super-secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_credential_display_redacted() {
        let credential = Credential::new("super-secret");
        let display = format!("{}", credential);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_credential_bearer_header() {
        assert_eq!(Credential::new("abc").bearer_header(), "Bearer abc");
    }

    #[test]
    fn test_create_memory_store() {
        let store = create_session_store(SessionBackend::Memory, None);
        assert!(!store.is_authenticated());
        store.set(Credential::new("T"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_create_file_store_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = create_session_store(SessionBackend::File, Some(path.clone()));
        store.set(Credential::new("persisted"));

        let reopened = create_session_store(SessionBackend::File, Some(path));
        assert_eq!(reopened.get().unwrap().expose(), "persisted");
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: SessionBackend = serde_json::from_str("\"keyring\"").unwrap();
        assert_eq!(backend, SessionBackend::Keyring);
    }
}
