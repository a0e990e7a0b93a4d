//! Credential store backed by the control plane over HTTP

use super::{CredentialStore, ResolvedCredential, SecretKey};
use crate::error::CredentialStoreError;
use crate::headers::X_SERVICE_SECRET;
use crate::signature_v4::percent_encode_query_component;

use std::time::Duration;

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::{HeaderValue, ACCEPT};
use hyper::{Body, Client, Method, Request, StatusCode};
use tracing::debug;

/// Configuration of a [`RemoteCredentialStore`]
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    /// control plane base url, such as `http://127.0.0.1:8000`
    pub base_url: String,
    /// shared secret sent in `x-service-secret`
    pub service_secret: SecretKey,
    /// deadline for one lookup, including the body
    pub timeout: Duration,
}

impl RemoteStoreConfig {
    /// Constructs a config with a 5 second timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>, service_secret: impl Into<SecretKey>) -> Self {
        Self {
            base_url: base_url.into(),
            service_secret: service_secret.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Resolves credentials with `GET {base}/internal/credentials/{access_key}`
///
/// `200` carries a JSON credential, `404` means unknown. Everything else is
/// an error, which the verifier turns into a denial.
#[derive(Debug)]
pub struct RemoteCredentialStore {
    /// http client
    client: Client<HttpConnector>,
    /// config
    config: RemoteStoreConfig,
}

impl RemoteCredentialStore {
    /// Constructs a `RemoteCredentialStore`
    #[must_use]
    pub fn new(config: RemoteStoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// lookup url of `access_key`
    fn lookup_url(&self, access_key: &str) -> String {
        format!(
            "{}/internal/credentials/{}",
            self.config.base_url.trim_end_matches('/'),
            percent_encode_query_component(access_key)
        )
    }

    /// one lookup, without the deadline
    async fn fetch(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError> {
        let secret = HeaderValue::from_str(self.config.service_secret.expose())
            .map_err(|e| CredentialStoreError::Other(e.into()))?;

        let req = Request::builder()
            .method(Method::GET)
            .uri(self.lookup_url(access_key))
            .header(X_SERVICE_SECRET.clone(), secret)
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref())
            .body(Body::empty())?;

        let res = self.client.request(req).await?;
        let status = res.status();
        debug!(%status, "credential store answered");

        match status {
            StatusCode::OK => {
                let body = hyper::body::to_bytes(res.into_body()).await?;
                let credential: ResolvedCredential = serde_json::from_slice(&body)?;
                Ok(Some(credential))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(CredentialStoreError::Status(status)),
        }
    }
}

#[async_trait]
impl CredentialStore for RemoteCredentialStore {
    #[tracing::instrument(skip(self))]
    async fn resolve(
        &self,
        access_key: &str,
    ) -> Result<Option<ResolvedCredential>, CredentialStoreError> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.fetch(access_key)).await {
            Ok(result) => result,
            Err(_) => Err(CredentialStoreError::Timeout(timeout)),
        }
    }
}
