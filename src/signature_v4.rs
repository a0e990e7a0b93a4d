//! AWS Signature Version 4
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html>
//!

mod canonical;
mod presigned;
mod signing_key;
mod string_to_sign;

pub use self::canonical::{
    canonical_headers, canonical_query_string, canonical_uri, decode_query, percent_decode,
    percent_encode_path, percent_encode_query_component, sha256_hex, MissingSignedHeader,
};
pub use self::presigned::{ParsePresignedUrlError, PresignedUrl, MAX_EXPIRES, X_AMZ_SIGNATURE};
pub use self::signing_key::SigningKey;
pub use self::string_to_sign::{create_canonical_request, create_string_to_sign};

use crate::headers::{AmzContentSha256, AmzDate, AuthorizationV4, CredentialV4};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// `AWS4-HMAC-SHA256`
pub const AWS4_HMAC_SHA256: &str = "AWS4-HMAC-SHA256";

/// `aws4_request`
pub const AWS4_REQUEST: &str = "aws4_request";

/// `<date>/<region>/<service>`, rendered with the `aws4_request` terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialScope<'a> {
    /// `YYYYMMDD`
    pub date: &'a str,
    /// region
    pub region: &'a str,
    /// service
    pub service: &'a str,
}

impl fmt::Display for CredentialScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.region, self.service, AWS4_REQUEST
        )
    }
}

/// The signing material of a request, in either style
#[derive(Debug)]
pub enum AuthContext<'a> {
    /// `Authorization: AWS4-HMAC-SHA256 ...`
    Header {
        /// the parsed authorization header
        auth: AuthorizationV4<'a>,
        /// `x-amz-date`
        amz_date: AmzDate,
        /// `x-amz-date` as sent
        timestamp: &'a str,
        /// `x-amz-content-sha256`
        content_sha256: Option<AmzContentSha256<'a>>,
    },
    /// `?X-Amz-Signature=...`
    Presigned(PresignedUrl<'a>),
}

impl<'a> AuthContext<'a> {
    /// the credential
    #[must_use]
    pub const fn credential(&self) -> &CredentialV4<'a> {
        match *self {
            Self::Header { ref auth, .. } => &auth.credential,
            Self::Presigned(ref url) => &url.credential,
        }
    }

    /// the access key id
    #[must_use]
    pub const fn access_key(&self) -> &'a str {
        self.credential().access_key_id
    }

    /// the credential scope taken from the request
    #[must_use]
    pub const fn scope(&self) -> CredentialScope<'a> {
        self.credential().scope()
    }

    /// the signed header names, in the order the client listed them
    #[must_use]
    pub fn signed_headers(&self) -> &[&'a str] {
        match *self {
            Self::Header { ref auth, .. } => &auth.signed_headers,
            Self::Presigned(ref url) => &url.signed_headers,
        }
    }

    /// the signature supplied by the client
    #[must_use]
    pub const fn signature(&self) -> &'a str {
        match *self {
            Self::Header { ref auth, .. } => auth.signature,
            Self::Presigned(ref url) => url.signature,
        }
    }

    /// the request timestamp as sent
    #[must_use]
    pub const fn timestamp(&self) -> &'a str {
        match *self {
            Self::Header { timestamp, .. } => timestamp,
            Self::Presigned(ref url) => url.timestamp,
        }
    }

    /// the request timestamp
    #[must_use]
    pub const fn amz_date(&self) -> AmzDate {
        match *self {
            Self::Header { amz_date, .. } => amz_date,
            Self::Presigned(ref url) => url.amz_date,
        }
    }

    /// Returns true if `now` lies in the window the request is valid for
    ///
    /// Header style: `|now - timestamp| <= skew`.
    /// Presigned: `timestamp - skew <= now <= timestamp + expires`, where
    /// `expires` defaults to `skew`.
    #[must_use]
    pub fn is_within_window(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        let skew = match chrono::Duration::from_std(skew) {
            Ok(d) => d,
            Err(_) => return true,
        };
        let ts = self.amz_date().to_datetime();

        let not_before = ts.checked_sub_signed(skew);
        let not_after = match *self {
            Self::Header { .. } => ts.checked_add_signed(skew),
            Self::Presigned(ref url) => match url.expires {
                Some(secs) => ts.checked_add_signed(chrono::Duration::seconds(i64::from(secs))),
                None => ts.checked_add_signed(skew),
            },
        };

        not_before.map_or(true, |t| t <= now) && not_after.map_or(true, |t| now <= t)
    }
}
