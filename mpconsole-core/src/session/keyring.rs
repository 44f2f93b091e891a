//! OS keyring-backed session storage.

use keyring::Entry;

use super::{Credential, SessionStore, TOKEN_SLOT};

/// Session store keeping the credential in the platform keyring.
///
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// The entry is addressed as service `{service_name}`, user [`TOKEN_SLOT`].
pub struct KeyringSessionStore {
    service_name: String,
}

impl KeyringSessionStore {
    /// Try to create a keyring-backed store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str) -> Result<Self, keyring::Error> {
        Entry::new(service_name, TOKEN_SLOT)?;
        Ok(Self {
            service_name: service_name.to_string(),
        })
    }

    fn entry(&self) -> Option<Entry> {
        match Entry::new(&self.service_name, TOKEN_SLOT) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to open keyring entry: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for KeyringSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringSessionStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self) -> Option<Credential> {
        match self.entry()?.get_password() {
            Ok(token) if !token.is_empty() => Some(Credential::new(token)),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Keyring read failed: {}", e);
                None
            }
        }
    }

    fn set(&self, credential: Credential) {
        if let Some(entry) = self.entry() {
            if let Err(e) = entry.set_password(credential.expose()) {
                tracing::warn!("Keyring write failed: {}", e);
            }
        }
    }

    fn clear(&self) {
        if let Some(entry) = self.entry() {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => tracing::warn!("Keyring delete failed: {}", e),
            }
        }
    }
}
