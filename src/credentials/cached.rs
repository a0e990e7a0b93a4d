//! TTL cache in front of a credential store

use super::{CredentialStore, ResolvedCredential};
use crate::error::CredentialStoreError;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

/// Caches positive resolutions of another store for a fixed TTL
///
/// Unknown keys and store errors are never cached, so a newly created key
/// works at once. Call [`invalidate`](Self::invalidate) when a key is revoked.
#[derive(Debug)]
pub struct CachedCredentialStore<S> {
    /// inner store
    inner: S,
    /// time to live
    ttl: Duration,
    /// access key -> (expiry, credential)
    entries: Mutex<HashMap<String, (Instant, ResolvedCredential)>>,
}

impl<S> CachedCredentialStore<S> {
    /// Constructs a `CachedCredentialStore`
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drops the cached entry of `access_key`
    pub fn invalidate(&self, access_key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        drop(entries.remove(access_key));
    }

    /// Drops every cached entry
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// a fresh cached entry
    fn get_fresh(&self, access_key: &str) -> Option<ResolvedCredential> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(access_key) {
            Some(&(expiry, ref credential)) if Instant::now() < expiry => Some(credential.clone()),
            Some(_) => {
                drop(entries.remove(access_key));
                None
            }
            None => None,
        }
    }
}

impl<S> AsRef<S> for CachedCredentialStore<S> {
    fn as_ref(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for CachedCredentialStore<S> {
    async fn resolve(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError> {
        if let Some(credential) = self.get_fresh(access_key) {
            debug!("credential cache hit");
            return Ok(Some(credential));
        }

        let resolved = self.inner.resolve(access_key).await?;

        if let Some(ref credential) = resolved {
            // a ttl past the end of the clock is not cached at all
            match Instant::now().checked_add(self.ttl) {
                Some(expiry) => {
                    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
                    drop(entries.insert(access_key.to_owned(), (expiry, credential.clone())));
                }
                None => debug!(ttl = ?self.ttl, "ttl overflows the clock, not caching"),
            }
        }

        Ok(resolved)
    }
}
