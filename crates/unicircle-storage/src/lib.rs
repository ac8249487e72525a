use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use unicircle_core::error::UniCircleError;

/// Keychain entry holding the Collection Service API key.
pub const API_KEY_ENTRY: &str = "collection-api-key";

/// Synchronous string key-value storage.
///
/// This is the persistence port of the local collection backend: tables
/// are stored as whole JSON documents under fixed keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, UniCircleError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), UniCircleError>;

    /// Delete the value under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<(), UniCircleError>;

    /// Store several values at once. Backends that support transactions
    /// override this so either every entry lands or none does.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), UniCircleError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, UniCircleError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), UniCircleError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), UniCircleError> {
        (**self).remove(key)
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), UniCircleError> {
        (**self).set_many(entries)
    }
}

/// OS keychain-backed store using the `keyring` crate. Used for secrets
/// such as the API key, never for collection tables.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: "unicircle".to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, UniCircleError> {
        keyring::Entry::new(&self.service, key).map_err(|e| UniCircleError::CredentialError {
            message: e.to_string(),
        })
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, UniCircleError> {
        match self.entry(key)?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(UniCircleError::CredentialError {
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), UniCircleError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| UniCircleError::CredentialError {
                message: e.to_string(),
            })
    }

    fn remove(&self, key: &str) -> Result<(), UniCircleError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(UniCircleError::CredentialError {
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, UniCircleError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), UniCircleError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), UniCircleError> {
        self.lock().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), UniCircleError> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

/// Resolve the API key: the environment wins over the keychain.
pub fn resolve_api_key(
    secrets: &dyn KeyValueStore,
    env_value: Option<String>,
) -> Result<Option<String>, UniCircleError> {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        tracing::debug!("using API key from environment");
        return Ok(Some(key));
    }
    secrets.get(API_KEY_ENTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryStore::new();
        assert_eq!(store.get("unicircle_collections").unwrap(), None);
        store.set("unicircle_collections", "[]").unwrap();
        assert_eq!(
            store.get("unicircle_collections").unwrap(),
            Some("[]".to_string())
        );
        store.remove("unicircle_collections").unwrap();
        assert_eq!(store.get("unicircle_collections").unwrap(), None);
    }

    #[test]
    fn test_memory_store_remove_nonexistent() {
        let store = MemoryStore::new();
        store.remove("no-such-key").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_many_writes_every_entry() {
        let store = MemoryStore::new();
        store
            .set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_resolve_api_key_prefers_env() {
        let secrets = MemoryStore::new();
        secrets.set(API_KEY_ENTRY, "from-keychain").unwrap();

        let key = resolve_api_key(&secrets, Some("from-env".to_string())).unwrap();
        assert_eq!(key.as_deref(), Some("from-env"));

        let key = resolve_api_key(&secrets, Some(" ".to_string())).unwrap();
        assert_eq!(key.as_deref(), Some("from-keychain"));

        let empty = MemoryStore::new();
        assert_eq!(resolve_api_key(&empty, None).unwrap(), None);
    }
}
