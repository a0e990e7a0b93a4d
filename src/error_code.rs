//! S3 error codes used in rejections

use hyper::StatusCode;

use std::fmt::{self, Display};

/// S3 error code enum
///
/// See [`ErrorResponses`](https://docs.aws.amazon.com/AmazonS3/latest/API/ErrorResponses.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// Access Denied
    AccessDenied,

    /// The authorization header you provided is invalid.
    AuthorizationHeaderMalformed,

    /// Your proposed upload exceeds the maximum allowed object size.
    EntityTooLarge,

    /// We encountered an internal error. Please try again.
    InternalError,

    /// The AWS access key ID you provided does not exist in our records.
    InvalidAccessKeyId,

    /// The difference between the request time and the server's time is too large.
    RequestTimeTooSkewed,

    /// The request signature we calculated does not match the signature you provided.
    SignatureDoesNotMatch,
}

impl Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_static_str())
    }
}

impl S3ErrorCode {
    /// Returns a corresponding status code of the error code
    #[must_use]
    pub const fn as_status_code(self) -> StatusCode {
        match self {
            Self::AuthorizationHeaderMalformed | Self::EntityTooLarge => StatusCode::BAD_REQUEST,
            Self::AccessDenied
            | Self::InvalidAccessKeyId
            | Self::RequestTimeTooSkewed
            | Self::SignatureDoesNotMatch => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a corresponding string of the error code
    #[must_use]
    pub const fn as_static_str(self) -> &'static str {
        macro_rules! map_variant_to_str{
            [$($v:tt,)+]=>{
                match self {
                    $(
                        Self::$v => stringify!($v),
                    )+
                }
            }
        }

        map_variant_to_str![
            AccessDenied,
            AuthorizationHeaderMalformed,
            EntityTooLarge,
            InternalError,
            InvalidAccessKeyId,
            RequestTimeTooSkewed,
            SignatureDoesNotMatch,
        ]
    }
}
