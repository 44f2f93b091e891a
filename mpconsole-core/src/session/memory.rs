//! In-memory session storage implementation.

use parking_lot::RwLock;

use super::{Credential, SessionStore};

/// In-memory session store for tests and ephemeral sessions.
///
/// This store is not persistent; the credential is lost when the process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Credential>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("authenticated", &self.slot.read().is_some())
            .finish()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Credential> {
        self.slot.read().clone()
    }

    fn set(&self, credential: Credential) {
        *self.slot.write() = Some(credential);
    }

    fn clear(&self) {
        self.slot.write().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemorySessionStore::new();
        assert!(store.get().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_memory_store_set_get() {
        let store = MemorySessionStore::new();
        store.set(Credential::new("T"));
        assert_eq!(store.get(), Some(Credential::new("T")));
    }

    #[test]
    fn test_memory_store_set_overwrites() {
        let store = MemorySessionStore::with_credential(Credential::new("old"));
        store.set(Credential::new("new"));
        assert_eq!(store.get().unwrap().expose(), "new");
    }

    #[test]
    fn test_memory_store_clear_is_idempotent() {
        let store = MemorySessionStore::with_credential(Credential::new("T"));
        store.clear();
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_memory_store_debug_hides_token() {
        let store = MemorySessionStore::with_credential(Credential::new("secret-token"));
        let debug = format!("{:?}", store);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("authenticated: true"));
    }
}
