//! Authentication errors

use crate::error_code::S3ErrorCode;
use crate::BoxStdError;

use std::time::Duration;

use hyper::StatusCode;

/// Why a request was denied
///
/// Every variant is terminal. [`reason_code`](AuthError::reason_code) is the
/// stable machine string sent to clients in `x-gateway-deny-reason`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The signing material is structurally invalid
    #[error("malformed authorization: {0}")]
    MalformedAuthHeader(String),

    /// A header listed in `SignedHeaders` is absent
    #[error("signed header `{0}` is missing")]
    MissingSignedHeader(String),

    /// The credential store does not know the access key
    #[error("unknown access key `{0}`")]
    UnknownAccessKey(String),

    /// The access key exists but is not active
    #[error("access key `{0}` is inactive")]
    InactiveKey(String),

    /// The recomputed signature differs from the provided one
    #[error("signature does not match")]
    SignatureMismatch,

    /// The credential store failed or timed out
    #[error("credential store unavailable")]
    CredentialStoreUnavailable(#[source] CredentialStoreError),

    /// The request timestamp is outside the accepted window
    #[error("request has expired or is not yet valid")]
    Expired,

    /// The request carries no authentication material
    #[error("request is not signed")]
    MissingAuthentication,

    /// The body is larger than the gateway is willing to hash
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// the configured cap
        limit: usize,
    },
}

impl AuthError {
    /// stable machine reason code, equal to the variant name
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match *self {
            Self::MalformedAuthHeader(_) => "MalformedAuthHeader",
            Self::MissingSignedHeader(_) => "MissingSignedHeader",
            Self::UnknownAccessKey(_) => "UnknownAccessKey",
            Self::InactiveKey(_) => "InactiveKey",
            Self::SignatureMismatch => "SignatureMismatch",
            Self::CredentialStoreUnavailable(_) => "CredentialStoreUnavailable",
            Self::Expired => "Expired",
            Self::MissingAuthentication => "MissingAuthentication",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
        }
    }

    /// the S3 error code sent in the rejection body
    #[must_use]
    pub const fn s3_error_code(&self) -> S3ErrorCode {
        match *self {
            Self::MalformedAuthHeader(_) | Self::MissingSignedHeader(_) => {
                S3ErrorCode::AuthorizationHeaderMalformed
            }
            Self::UnknownAccessKey(_) => S3ErrorCode::InvalidAccessKeyId,
            Self::SignatureMismatch => S3ErrorCode::SignatureDoesNotMatch,
            Self::Expired => S3ErrorCode::RequestTimeTooSkewed,
            Self::PayloadTooLarge { .. } => S3ErrorCode::EntityTooLarge,
            Self::InactiveKey(_)
            | Self::CredentialStoreUnavailable(_)
            | Self::MissingAuthentication => S3ErrorCode::AccessDenied,
        }
    }

    /// 400 for structural problems, 403 for authentication failures
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match *self {
            Self::MalformedAuthHeader(_)
            | Self::MissingSignedHeader(_)
            | Self::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownAccessKey(_)
            | Self::InactiveKey(_)
            | Self::SignatureMismatch
            | Self::CredentialStoreUnavailable(_)
            | Self::Expired
            | Self::MissingAuthentication => StatusCode::FORBIDDEN,
        }
    }
}

/// A credential store could not answer
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialStoreError {
    /// building the lookup request failed
    #[error("invalid credential lookup request: {0}")]
    Request(#[from] hyper::http::Error),

    /// the transport failed
    #[error("credential store transport error: {0}")]
    Transport(#[from] hyper::Error),

    /// the store answered with an unexpected status
    #[error("credential store answered {0}")]
    Status(StatusCode),

    /// the store answered with an undecodable body
    #[error("invalid credential store response: {0}")]
    Decode(#[from] serde_json::Error),

    /// the store did not answer in time
    #[error("credential store timed out after {0:?}")]
    Timeout(Duration),

    /// any other failure
    #[error(transparent)]
    Other(BoxStdError),
}
