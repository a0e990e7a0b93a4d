//! Gateway service which verifies requests in front of a data plane

use crate::credentials::CredentialStore;
use crate::error::AuthError;
use crate::headers::X_GATEWAY_OWNER_ID;
use crate::output::XmlErrorResponse;
use crate::utils::{read_body_limited, take_body};
use crate::verifier::{requires_body, SignatureVerifier, SignedRequest, Verdict};
use crate::{Body, BoxStdError, Request, Response};

use std::{
    ops::Deref,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::future::BoxFuture;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH};
use hyper::StatusCode;
use tracing::{debug, error, info};
use uuid::Uuid;

/// The storage backend accepted requests are handed to
#[async_trait]
pub trait DataPlane: Send + Sync + 'static {
    /// Serves an accepted or passed-through request
    ///
    /// # Errors
    /// Returns an `Err` if the backend failed
    async fn call(&self, req: Request) -> Result<Response, BoxStdError>;
}

#[async_trait]
impl<D: DataPlane + ?Sized> DataPlane for Arc<D> {
    async fn call(&self, req: Request) -> Result<Response, BoxStdError> {
        (**self).call(req).await
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Copy)]
pub struct GatewayConfig {
    /// the largest body buffered for hashing
    pub max_buffered_body: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_buffered_body: 16 * 1024 * 1024,
        }
    }
}

/// Gateway service which verifies requests in front of a data plane
#[derive(Debug)]
pub struct GatewayService<S, D> {
    /// verifier
    verifier: SignatureVerifier<S>,
    /// data plane
    data_plane: D,
    /// config
    config: GatewayConfig,
}

/// Shared gateway service
#[derive(Debug)]
pub struct SharedGatewayService<S, D> {
    /// inner service
    inner: Arc<GatewayService<S, D>>,
}

impl<S, D> GatewayService<S, D> {
    /// Constructs a gateway service
    pub const fn new(verifier: SignatureVerifier<S>, data_plane: D, config: GatewayConfig) -> Self {
        Self {
            verifier,
            data_plane,
            config,
        }
    }

    /// convert `GatewayService<S, D>` to `SharedGatewayService<S, D>`
    pub fn into_shared(self) -> SharedGatewayService<S, D> {
        SharedGatewayService {
            inner: Arc::new(self),
        }
    }

    /// the verifier
    pub const fn verifier(&self) -> &SignatureVerifier<S> {
        &self.verifier
    }
}

impl<S, D> Deref for SharedGatewayService<S, D> {
    type Target = GatewayService<S, D>;
    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl<S, D> Clone for SharedGatewayService<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, D> hyper::service::Service<Request> for SharedGatewayService<S, D>
where
    S: CredentialStore,
    D: DataPlane,
{
    type Response = Response;

    type Error = BoxStdError;

    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(())) // FIXME: back pressue
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.hyper_call(req).await })
    }
}

/// Content-Length, if it is declared and valid
fn declared_length(req: &Request) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

impl<S, D> GatewayService<S, D>
where
    S: CredentialStore,
    D: DataPlane,
{
    /// Call the gateway with `hyper::Request<hyper::Body>`
    /// # Errors
    /// Returns an `Err` if the request body can not be read
    #[tracing::instrument(skip(self, req), fields(method = %req.method(), uri = %req.uri()))]
    pub async fn hyper_call(&self, req: Request) -> Result<Response, BoxStdError> {
        let result = self.handle(req).await;
        match result {
            Ok(ref res) => debug!(status = %res.status(), "response"),
            Err(ref err) => error!(%err, "failed to handle request"),
        }
        result
    }

    /// handle request
    async fn handle(&self, mut req: Request) -> Result<Response, BoxStdError> {
        let body = if requires_body(&req) {
            match self.buffer_body(&mut req).await? {
                Ok(bytes) => Some(bytes),
                Err(err) => return Ok(deny(&err)),
            }
        } else {
            None
        };

        let verdict = match SignedRequest::from_req(&req, body.as_deref()) {
            Ok(signed) => self.verifier.verify(&signed).await,
            Err(err) => Verdict::Denied(err),
        };

        // the owner header is ours alone
        drop(req.headers_mut().remove(&*X_GATEWAY_OWNER_ID));

        if let Some(bytes) = body {
            *req.body_mut() = Body::from(bytes);
        }

        match verdict {
            Verdict::Accepted(identity) => {
                info!(owner_id = %identity.owner_id, "request accepted");
                let owner = match HeaderValue::from_str(&identity.owner_id) {
                    Ok(owner) => owner,
                    Err(err) => {
                        let owner_id = &identity.owner_id;
                        error!(%err, ?owner_id, "owner id is not a valid header value");
                        let mut res = Response::new(Body::empty());
                        *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                        return Ok(res);
                    }
                };
                drop(req.headers_mut().insert(X_GATEWAY_OWNER_ID.clone(), owner));
                drop(req.extensions_mut().insert(identity));
                self.forward(req).await
            }
            Verdict::PassThrough => self.forward(req).await,
            Verdict::Denied(err) => {
                info!(reason = err.reason_code(), "request denied");
                Ok(deny(&err))
            }
        }
    }

    /// buffers the body, or reports it is too large
    async fn buffer_body(&self, req: &mut Request) -> Result<Result<Bytes, AuthError>, BoxStdError> {
        let limit = self.config.max_buffered_body;
        let too_large = AuthError::PayloadTooLarge { limit };

        let declared_too_large = declared_length(req)
            .map_or(false, |n| u64::try_from(limit).map_or(false, |limit| n > limit));
        if declared_too_large {
            return Ok(Err(too_large));
        }

        let mut body = take_body(req);
        match read_body_limited(&mut body, limit).await? {
            Some(bytes) => Ok(Ok(bytes)),
            None => Ok(Err(too_large)),
        }
    }

    /// hands the request to the data plane
    async fn forward(&self, req: Request) -> Result<Response, BoxStdError> {
        match self.data_plane.call(req).await {
            Ok(res) => Ok(res),
            Err(err) => {
                error!(%err, "data plane failed");
                let mut res = Response::new(Body::empty());
                *res.status_mut() = StatusCode::BAD_GATEWAY;
                Ok(res)
            }
        }
    }
}

/// the rejection response of `err`
fn deny(err: &AuthError) -> Response {
    let request_id = Uuid::new_v4().to_string();
    debug!(%request_id, reason = err.reason_code(), "rendering rejection");
    XmlErrorResponse::from_auth_error(err, request_id).into_response()
}
