//! Signature verification
//!
//! A request moves through `parse -> resolve -> sign -> compare` exactly once.
//! Checks that need no secret run before the credential store is called.

use crate::credentials::{CredentialStore, KeyStatus};
use crate::data_structures::{OrderedHeaders, OrderedQs};
use crate::error::AuthError;
use crate::headers::{
    AmzContentSha256, AmzDate, AuthorizationV4, ParseAuthorizationError, AUTHORIZATION,
    X_AMZ_CONTENT_SHA256,
};
use crate::signature_v4::{
    self, AuthContext, PresignedUrl, SigningKey, AWS4_HMAC_SHA256, X_AMZ_SIGNATURE,
};
use crate::utils::{crypto, RequestExt};

use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::{Method, Request};
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Verifier configuration
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// deny requests that carry no authentication material
    pub enforce: bool,
    /// accepted distance between the request timestamp and now, `None` disables the check
    pub clock_skew: Option<Duration>,
    /// the only region credential scopes may name, `None` accepts any
    pub region: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            enforce: true,
            clock_skew: Some(Duration::from_secs(15 * 60)),
            region: None,
        }
    }
}

/// The authenticated principal of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// the owner of the access key
    pub owner_id: String,
    /// the access key the request was signed with
    pub access_key: String,
}

/// Outcome of verifying one request
#[derive(Debug)]
pub enum Verdict {
    /// the signature matches
    Accepted(Identity),
    /// no authentication material and enforcement is off
    PassThrough,
    /// the request must not reach the data plane
    Denied(AuthError),
}

impl Verdict {
    /// Returns true for `Accepted`
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(*self, Self::Accepted(_))
    }

    /// the identity of an accepted request
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match *self {
            Self::Accepted(ref id) => Some(id),
            Self::PassThrough | Self::Denied(_) => None,
        }
    }

    /// the error of a denied request
    #[must_use]
    pub const fn error(&self) -> Option<&AuthError> {
        match *self {
            Self::Denied(ref e) => Some(e),
            Self::Accepted(_) | Self::PassThrough => None,
        }
    }
}

/// The parts of a request that take part in signing
#[derive(Debug)]
pub struct SignedRequest<'a> {
    /// method
    method: &'a Method,
    /// path, still percent-encoded
    raw_path: &'a str,
    /// query, still percent-encoded
    raw_query: &'a str,
    /// decoded query strings
    qs: OrderedQs,
    /// headers
    headers: OrderedHeaders<'a>,
    /// body, when it was buffered
    body: Option<&'a [u8]>,
}

impl<'a> SignedRequest<'a> {
    /// Constructs a `SignedRequest` from its parts
    ///
    /// # Errors
    /// Returns an `Err` if the query string is not valid form encoding
    pub fn new(
        method: &'a Method,
        raw_path: &'a str,
        query: Option<&'a str>,
        headers: OrderedHeaders<'a>,
        body: Option<&'a [u8]>,
    ) -> Result<Self, AuthError> {
        let qs = match query {
            Some(query) => OrderedQs::from_query(query)
                .map_err(|e| AuthError::MalformedAuthHeader(format!("invalid query: {}", e)))?,
            None => OrderedQs::default(),
        };
        Ok(Self {
            method,
            raw_path,
            raw_query: query.unwrap_or_default(),
            qs,
            headers,
            body,
        })
    }

    /// Borrows a `SignedRequest` from a request
    ///
    /// # Errors
    /// Returns an `Err` if the query string is not valid form encoding
    pub fn from_req<B>(req: &'a Request<B>, body: Option<&'a [u8]>) -> Result<Self, AuthError> {
        Self::new(
            req.method(),
            req.uri().path(),
            req.uri().query(),
            OrderedHeaders::from_req(req),
            body,
        )
    }

    /// Classifies the auth style and parses its material
    ///
    /// An `Authorization` header wins over a presigned query.
    fn auth_context(&self) -> Result<Option<AuthContext<'_>>, AuthError> {
        if let Some(authorization) = self.headers.get("authorization") {
            let auth = AuthorizationV4::from_header_str(authorization).map_err(|e| match e {
                ParseAuthorizationError::UnsupportedScheme => AuthError::MalformedAuthHeader(
                    format!("unsupported authorization scheme, expected {}", AWS4_HMAC_SHA256),
                ),
                ParseAuthorizationError::Malformed(_) => AuthError::MalformedAuthHeader(e.to_string()),
            })?;

            let timestamp = match self.headers.get("x-amz-date") {
                Some(timestamp) => timestamp,
                None if auth
                    .signed_headers
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case("x-amz-date")) =>
                {
                    return Err(AuthError::MissingSignedHeader("x-amz-date".into()))
                }
                None => {
                    return Err(AuthError::MalformedAuthHeader(
                        "missing header: x-amz-date".into(),
                    ))
                }
            };
            let amz_date = AmzDate::from_header_str(timestamp)
                .map_err(|_| AuthError::MalformedAuthHeader("invalid header: x-amz-date".into()))?;

            let content_sha256 = match self.headers.get("x-amz-content-sha256") {
                Some(s) => Some(AmzContentSha256::from_header_str(s).map_err(|_| {
                    AuthError::MalformedAuthHeader("invalid header: x-amz-content-sha256".into())
                })?),
                None => None,
            };

            return Ok(Some(AuthContext::Header {
                auth,
                amz_date,
                timestamp,
                content_sha256,
            }));
        }

        if PresignedUrl::is_presigned(&self.qs) {
            let url = PresignedUrl::from_query(&self.qs)
                .map_err(|e| AuthError::MalformedAuthHeader(e.to_string()))?;
            return Ok(Some(AuthContext::Presigned(url)));
        }

        Ok(None)
    }

    /// the `<HashedPayload>` line
    fn payload_hash(&self, ctx: &AuthContext<'_>) -> String {
        match *ctx {
            AuthContext::Header {
                content_sha256: Some(ref content_sha256),
                ..
            } => content_sha256.as_payload_hash().to_owned(),
            AuthContext::Header {
                content_sha256: None,
                ..
            } => signature_v4::sha256_hex(self.body.unwrap_or_default()),
            AuthContext::Presigned(ref url) => url.payload_hash().to_owned(),
        }
    }

    /// recomputes the string to sign
    fn string_to_sign(
        &self,
        ctx: &AuthContext<'_>,
        signed_names: &[String],
    ) -> Result<String, AuthError> {
        // the raw query keeps bytes that are not valid UTF-8
        let is_presigned = matches!(*ctx, AuthContext::Presigned(_));
        let query_strings = signature_v4::decode_query(self.raw_query)
            .into_iter()
            .filter(|&(ref n, _)| !(is_presigned && n.as_slice() == X_AMZ_SIGNATURE.as_bytes()));

        let canonical_request = signature_v4::create_canonical_request(
            self.method,
            self.raw_path,
            query_strings,
            &self.headers,
            signed_names,
            &self.payload_hash(ctx),
        )
        .map_err(|e| AuthError::MissingSignedHeader(e.name))?;

        Ok(signature_v4::create_string_to_sign(
            &canonical_request,
            ctx.timestamp(),
            &ctx.scope(),
        ))
    }
}

/// Returns true if verifying `req` needs its body
///
/// Only header-signed requests without `x-amz-content-sha256` sign the body hash.
pub fn requires_body<B>(req: &Request<B>) -> bool {
    match req.get_header_str(AUTHORIZATION) {
        Ok(Some(auth)) => {
            AuthorizationV4::is_sigv4(auth) && !req.headers().contains_key(&*X_AMZ_CONTENT_SHA256)
        }
        Ok(None) | Err(_) => false,
    }
}

/// Verifies AWS Signature Version 4 requests against a credential store
#[derive(Debug)]
pub struct SignatureVerifier<S> {
    /// credential store
    store: S,
    /// config
    config: VerifierConfig,
}

impl<S> SignatureVerifier<S> {
    /// Constructs a `SignatureVerifier`
    pub const fn new(store: S, config: VerifierConfig) -> Self {
        Self { store, config }
    }

    /// the configuration
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// the credential store
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: CredentialStore> SignatureVerifier<S> {
    /// Verifies `req` at the current time
    pub async fn verify(&self, req: &SignedRequest<'_>) -> Verdict {
        self.verify_at(req, Utc::now()).await
    }

    /// Verifies `req` as if the current time were `now`
    #[tracing::instrument(skip(self, req, now), fields(method = %req.method, path = req.raw_path))]
    pub async fn verify_at(&self, req: &SignedRequest<'_>, now: DateTime<Utc>) -> Verdict {
        match self.check(req, now).await {
            Ok(Some(identity)) => {
                debug!(access_key = %identity.access_key, "signature accepted");
                Verdict::Accepted(identity)
            }
            Ok(None) => {
                debug!("no authentication material, passing through");
                Verdict::PassThrough
            }
            Err(err) => {
                debug!(reason = err.reason_code(), %err, "request denied");
                Verdict::Denied(err)
            }
        }
    }

    /// the state machine
    async fn check(
        &self,
        req: &SignedRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AuthError> {
        // parse
        let ctx = match req.auth_context()? {
            Some(ctx) => ctx,
            None if self.config.enforce => return Err(AuthError::MissingAuthentication),
            None => return Ok(None),
        };

        let scope = ctx.scope();
        if let Some(ref region) = self.config.region {
            if scope.region != region {
                return Err(AuthError::MalformedAuthHeader(format!(
                    "credential scope region `{}` is not `{}`",
                    scope.region, region
                )));
            }
        }

        let signed_names: SmallVec<[String; 8]> = ctx
            .signed_headers()
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();

        if let Some(missing) = signed_names
            .iter()
            .find(|name| req.headers.get(name).is_none())
        {
            return Err(AuthError::MissingSignedHeader(missing.clone()));
        }

        if let Some(skew) = self.config.clock_skew {
            if !ctx.is_within_window(now, skew) {
                return Err(AuthError::Expired);
            }
        }

        // resolve
        let access_key = ctx.access_key();
        let credential = match self.store.resolve(access_key).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(AuthError::UnknownAccessKey(access_key.to_owned())),
            Err(err) => {
                warn!(%err, "credential store unavailable");
                return Err(AuthError::CredentialStoreUnavailable(err));
            }
        };
        if credential.status != KeyStatus::Active {
            return Err(AuthError::InactiveKey(access_key.to_owned()));
        }

        // sign
        let string_to_sign = req.string_to_sign(&ctx, &signed_names)?;
        let signing_key = SigningKey::derive(credential.secret_key.expose(), &scope);
        let expected = signing_key.sign(&string_to_sign);

        // compare
        if !crypto::constant_time_eq(expected.as_bytes(), ctx.signature().as_bytes()) {
            return Err(AuthError::SignatureMismatch);
        }

        Ok(Some(Identity {
            owner_id: credential.owner_id,
            access_key: access_key.to_owned(),
        }))
    }
}
