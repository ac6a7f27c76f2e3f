//! Key storage keyed by an opaque application tag.
//!
//! [`KeyringStore`] persists PEM text in the platform keychain;
//! [`MemoryStore`] backs tests and headless environments. Upserting an
//! existing tag overwrites it.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Key storage capability consumed by applications holding SEM identities.
pub trait KeyStore {
    /// Store `pem` under `tag`, replacing any existing entry.
    fn upsert(&self, tag: &str, pem: &str) -> Result<()>;

    /// Fetch the PEM stored under `tag`.
    fn get(&self, tag: &str) -> Result<String>;

    /// Remove the entry under `tag`. Missing tags are an error.
    fn delete(&self, tag: &str) -> Result<()>;
}

/// Platform keychain store backed by the `keyring` crate. One keychain
/// service name scopes all tags of an application.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, tag: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, tag).map_err(map_keyring_error)
    }
}

fn map_keyring_error(err: keyring::Error) -> Error {
    match err {
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_) => {
            Error::NotAvailable("platform keychain")
        }
        other => Error::Unknown(other.to_string()),
    }
}

impl KeyStore for KeyringStore {
    fn upsert(&self, tag: &str, pem: &str) -> Result<()> {
        tracing::debug!(service = %self.service, tag, "keystore upsert");
        self.entry(tag)?.set_password(pem).map_err(map_keyring_error)
    }

    fn get(&self, tag: &str) -> Result<String> {
        self.entry(tag)?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => Error::KeyNotFound(tag.to_string()),
            other => map_keyring_error(other),
        })
    }

    fn delete(&self, tag: &str) -> Result<()> {
        tracing::debug!(service = %self.service, tag, "keystore delete");
        self.entry(tag)?.delete_password().map_err(|e| match e {
            keyring::Error::NoEntry => Error::KeyNotFound(tag.to_string()),
            other => map_keyring_error(other),
        })
    }
}

/// In-memory store for tests and environments without a keychain.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryStore {
    fn upsert(&self, tag: &str, pem: &str) -> Result<()> {
        self.entries
            .write()
            .expect("keystore lock poisoned")
            .insert(tag.to_string(), pem.to_string());
        Ok(())
    }

    fn get(&self, tag: &str) -> Result<String> {
        self.entries
            .read()
            .expect("keystore lock poisoned")
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::KeyNotFound(tag.to_string()))
    }

    fn delete(&self, tag: &str) -> Result<()> {
        self.entries
            .write()
            .expect("keystore lock poisoned")
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| Error::KeyNotFound(tag.to_string()))
    }
}
