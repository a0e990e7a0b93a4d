//! Common Request Headers

mod amz_content_sha256;
mod amz_date;
mod authorization_v4;

pub use self::amz_content_sha256::AmzContentSha256;
pub use self::amz_date::AmzDate;
pub use self::authorization_v4::{AuthorizationV4, CredentialV4, ParseAuthorizationError};

pub(crate) use self::amz_date::is_valid_scope_date;
pub(crate) use self::authorization_v4::parse_signed_headers;

pub use hyper::header::{HeaderName, AUTHORIZATION, HOST};

// FIXME: declare const headers, see <https://github.com/hyperium/http/issues/264>

use once_cell::sync::Lazy;

macro_rules! declare_header_name{
    {$($(#[$docs:meta])* $n:ident: $s:expr;)+} => {
        $(
            $(#[$docs])*
            pub static $n: Lazy<HeaderName> = Lazy::new(||HeaderName::from_static($s));
        )+

        #[test]
        fn check_headers(){
            $(
                assert_eq!($n.as_str(), $s);
            )+
        }
    }
}

declare_header_name! {
    /// x-amz-date
    X_AMZ_DATE: "x-amz-date";

    /// x-amz-content-sha256
    X_AMZ_CONTENT_SHA256: "x-amz-content-sha256";

    /// x-amz-request-id
    X_AMZ_REQUEST_ID: "x-amz-request-id";

    /// the owner id forwarded to the data plane on accepted requests
    X_GATEWAY_OWNER_ID: "x-gateway-owner-id";

    /// the reason code attached to denied responses
    X_GATEWAY_DENY_REASON: "x-gateway-deny-reason";

    /// the shared secret presented to the credential service
    X_SERVICE_SECRET: "x-service-secret";
}
