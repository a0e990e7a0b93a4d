//! presigned request

use super::AWS4_HMAC_SHA256;
use crate::data_structures::OrderedQs;
use crate::headers::{parse_signed_headers, AmzDate, CredentialV4};
use crate::utils::Apply;

/// `X-Amz-Signature`
pub const X_AMZ_SIGNATURE: &str = "X-Amz-Signature";

/// Longest `X-Amz-Expires` accepted, seven days
pub const MAX_EXPIRES: u32 = 604_800;

/// query strings of a presigned url
#[derive(Debug)]
struct PresignedQs<'a> {
    /// X-Amz-Algorithm
    x_amz_algorithm: Option<&'a str>,
    /// X-Amz-Credential
    x_amz_credential: &'a str,
    /// X-Amz-Date
    x_amz_date: &'a str,
    /// X-Amz-Expires
    x_amz_expires: Option<&'a str>,
    /// X-Amz-SignedHeaders
    x_amz_signed_headers: &'a str,
    /// X-Amz-Signature
    x_amz_signature: &'a str,
    /// X-Amz-Content-Sha256
    x_amz_content_sha256: Option<&'a str>,
}

/// presigned url information
#[derive(Debug)]
pub struct PresignedUrl<'a> {
    /// credential
    pub credential: CredentialV4<'a>,
    /// amz date
    pub amz_date: AmzDate,
    /// `X-Amz-Date` as sent
    pub timestamp: &'a str,
    /// validity in seconds from `amz_date`
    pub expires: Option<u32>,
    /// signed headers
    pub signed_headers: Vec<&'a str>,
    /// signature
    pub signature: &'a str,
    /// payload hash named by the signer, if any
    pub content_sha256: Option<&'a str>,
}

/// `ParsePresignedUrlError`
#[derive(Debug, thiserror::Error)]
pub enum ParsePresignedUrlError {
    /// a required parameter is absent
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),
    /// a parameter has an invalid value
    #[error("invalid query parameter `{0}`")]
    Invalid(&'static str),
}

impl<'a> PresignedUrl<'a> {
    /// Returns true if the query carries a presigned signature
    #[must_use]
    pub fn is_presigned(qs: &OrderedQs) -> bool {
        qs.contains(X_AMZ_SIGNATURE)
    }

    /// parse `PresignedUrl` from query
    ///
    /// # Errors
    /// Returns an `Err` if a parameter is missing or invalid
    pub fn from_query(qs: &'a OrderedQs) -> Result<Self, ParsePresignedUrlError> {
        use ParsePresignedUrlError::{Invalid, Missing};

        let required = |name: &'static str| qs.get(name).ok_or(Missing(name));

        let info = PresignedQs {
            x_amz_algorithm: qs.get("X-Amz-Algorithm"),
            x_amz_credential: required("X-Amz-Credential")?,
            x_amz_date: required("X-Amz-Date")?,
            x_amz_expires: qs.get("X-Amz-Expires"),
            x_amz_signed_headers: required("X-Amz-SignedHeaders")?,
            x_amz_signature: required(X_AMZ_SIGNATURE)?,
            x_amz_content_sha256: qs.get("X-Amz-Content-Sha256"),
        };

        if let Some(algorithm) = info.x_amz_algorithm {
            if algorithm != AWS4_HMAC_SHA256 {
                return Err(Invalid("X-Amz-Algorithm"));
            }
        }

        let credential = CredentialV4::parse(info.x_amz_credential, false)
            .map_err(|_| Invalid("X-Amz-Credential"))?;

        let amz_date =
            AmzDate::from_header_str(info.x_amz_date).map_err(|_| Invalid("X-Amz-Date"))?;

        let expires = match info.x_amz_expires {
            None => None,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n <= MAX_EXPIRES => Some(n),
                _ => return Err(Invalid("X-Amz-Expires")),
            },
        };

        let signed_headers = parse_signed_headers(info.x_amz_signed_headers)
            .ok_or(Invalid("X-Amz-SignedHeaders"))?;

        if info.x_amz_signature.is_empty() {
            return Err(Invalid(X_AMZ_SIGNATURE));
        }

        Self {
            credential,
            amz_date,
            timestamp: info.x_amz_date,
            expires,
            signed_headers,
            signature: info.x_amz_signature,
            content_sha256: info.x_amz_content_sha256,
        }
        .apply(Ok)
    }

    /// the payload hash line of the canonical request
    #[must_use]
    pub fn payload_hash(&self) -> &'a str {
        self.content_sha256
            .unwrap_or(crate::headers::AmzContentSha256::UNSIGNED_PAYLOAD)
    }
}
