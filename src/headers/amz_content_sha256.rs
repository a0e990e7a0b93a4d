//! x-amz-content-sha256

use crate::utils::crypto;

/// `x-amz-content-sha256`
///
/// See [Common Request Headers](https://docs.aws.amazon.com/AmazonS3/latest/API/RESTCommonRequestHeaders.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmzContentSha256<'a> {
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    MultipleChunks,
    /// single chunk
    SingleChunk {
        /// the checksum of single chunk payload
        payload_checksum: &'a str,
    },
    /// `UNSIGNED-PAYLOAD`
    UnsignedPayload,
}

/// `ParseAmzContentSha256Error`
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("ParseAmzContentSha256Error")]
pub struct ParseAmzContentSha256Error {
    /// priv place holder
    _priv: (),
}

impl<'a> AmzContentSha256<'a> {
    /// `UNSIGNED-PAYLOAD`
    pub const UNSIGNED_PAYLOAD: &'static str = "UNSIGNED-PAYLOAD";

    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
    pub const STREAMING_PAYLOAD: &'static str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

    /// parse `ContentSha256` from `x-amz-content-sha256` header
    /// # Errors
    /// Returns an `Err` if the header is invalid
    pub fn from_header_str(header: &'a str) -> Result<Self, ParseAmzContentSha256Error> {
        match header {
            Self::UNSIGNED_PAYLOAD => Ok(Self::UnsignedPayload),
            Self::STREAMING_PAYLOAD => Ok(Self::MultipleChunks),
            payload_checksum if crypto::is_sha256_checksum(payload_checksum) => {
                Ok(Self::SingleChunk { payload_checksum })
            }
            _ => Err(ParseAmzContentSha256Error { _priv: () }),
        }
    }

    /// the hashed payload line of a canonical request
    #[must_use]
    pub const fn as_payload_hash(&self) -> &'a str {
        match *self {
            Self::MultipleChunks => Self::STREAMING_PAYLOAD,
            Self::SingleChunk { payload_checksum } => payload_checksum,
            Self::UnsignedPayload => Self::UNSIGNED_PAYLOAD,
        }
    }
}
