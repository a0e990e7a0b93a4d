//! signing key derivation

use super::{CredentialScope, AWS4_REQUEST};
use crate::utils::{crypto, Also};

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// `kSigning`, derived from a secret key and a credential scope
///
/// The key material is wiped when dropped.
pub struct SigningKey {
    /// raw key bytes
    key: [u8; 32],
}

impl SigningKey {
    /// Derives the signing key
    ///
    /// ```text
    /// kDate    = HMAC-SHA256("AWS4" + secret, date)
    /// kRegion  = HMAC-SHA256(kDate, region)
    /// kService = HMAC-SHA256(kRegion, service)
    /// kSigning = HMAC-SHA256(kService, "aws4_request")
    /// ```
    #[must_use]
    pub fn derive(secret_key: &str, scope: &CredentialScope<'_>) -> Self {
        let secret = Zeroizing::new(
            Vec::with_capacity(secret_key.len().saturating_add(4))
                .also(|v| v.extend_from_slice(b"AWS4"))
                .also(|v| v.extend_from_slice(secret_key.as_bytes())),
        );

        // DateKey
        let date_key = Zeroizing::new(crypto::hmac_sha256(secret.as_slice(), scope.date.as_bytes()));

        // DateRegionKey
        let date_region_key = Zeroizing::new(crypto::hmac_sha256(
            date_key.as_slice(),
            scope.region.as_bytes(),
        ));

        // DateRegionServiceKey
        let date_region_service_key = Zeroizing::new(crypto::hmac_sha256(
            date_region_key.as_slice(),
            scope.service.as_bytes(),
        ));

        // SigningKey
        let key = crypto::hmac_sha256(date_region_service_key.as_slice(), AWS4_REQUEST.as_bytes());

        Self { key }
    }

    /// lowercase hex `HMAC-SHA256(kSigning, string_to_sign)`
    #[must_use]
    pub fn sign(&self, string_to_sign: &str) -> String {
        crypto::hex_hmac_sha256(&self.key, string_to_sign.as_bytes())
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}
