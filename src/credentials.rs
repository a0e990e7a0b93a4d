//! Credential resolution
//!
//! The verifier never owns secrets. It asks a [`CredentialStore`] for the
//! secret behind an access key once per request.

mod cached;
mod remote;

pub use self::cached::CachedCredentialStore;
pub use self::remote::{RemoteCredentialStore, RemoteStoreConfig};

use crate::error::CredentialStoreError;
use crate::utils::Also;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

/// A secret access key
///
/// The buffer is wiped on drop and `Debug` never prints it.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    /// the secret itself
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for SecretKey {
    fn from(s: String) -> Self {
        Self(Zeroizing::new(s))
    }
}

impl From<&str> for SecretKey {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Whether an access key may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// usable
    Active,
    /// revoked, disabled or any status this gateway does not know
    #[serde(other)]
    Inactive,
}

/// What a credential store knows about an access key
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedCredential {
    /// the owner the key belongs to
    pub owner_id: String,
    /// the shared secret
    pub secret_key: SecretKey,
    /// key status
    pub status: KeyStatus,
}

impl ResolvedCredential {
    /// Constructs an active credential
    #[must_use]
    pub fn active(owner_id: impl Into<String>, secret_key: impl Into<SecretKey>) -> Self {
        Self {
            owner_id: owner_id.into(),
            secret_key: secret_key.into(),
            status: KeyStatus::Active,
        }
    }
}

/// Maps access keys to secrets
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Looks up `access_key`
    ///
    /// `Ok(None)` means the key does not exist.
    ///
    /// # Errors
    /// Returns an `Err` if the store can not answer
    async fn resolve(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn resolve(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError> {
        (**self).resolve(access_key).await
    }
}

/// An in-memory credential store
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    /// key map
    map: RwLock<HashMap<String, ResolvedCredential>>,
}

impl StaticCredentialStore {
    /// Constructs an empty `StaticCredentialStore`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a store holding one active key
    #[must_use]
    pub fn from_single(
        access_key: impl Into<String>,
        secret_key: impl Into<SecretKey>,
        owner_id: impl Into<String>,
    ) -> Self {
        let credential = ResolvedCredential::active(owner_id, secret_key);
        Self::new().also(|store| store.register(access_key, credential))
    }

    /// register a credential, replacing any previous one
    pub fn register(&self, access_key: impl Into<String>, credential: ResolvedCredential) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        drop(map.insert(access_key.into(), credential));
    }

    /// change the status of a key. Returns false if the key is unknown.
    pub fn set_status(&self, access_key: &str, status: KeyStatus) -> bool {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        match map.get_mut(access_key) {
            Some(credential) => {
                credential.status = status;
                true
            }
            None => false,
        }
    }

    /// remove a key. Returns false if the key is unknown.
    pub fn revoke(&self, access_key: &str) -> bool {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(access_key).is_some()
    }

    /// lookup a credential
    #[must_use]
    pub fn lookup(&self, access_key: &str) -> Option<ResolvedCredential> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(access_key).cloned()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn resolve(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError> {
        Ok(self.lookup(access_key))
    }
}
