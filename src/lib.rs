//! S3 authentication gateway
//!
//! Verifies AWS Signature Version 4 requests, header-signed or presigned,
//! before they reach an S3-compatible data plane.

#![forbid(unsafe_code)]
#![deny(
    // The following are allowed by default lints according to
    // https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
)]
#![warn(
    // https://rust-lang.github.io/rust-clippy/master/
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
)]
#![allow(
    // Some explicitly allowed Clippy lints, must have clear reason to allow
    clippy::module_name_repetitions, // Allowed by default
    clippy::missing_errors_doc, // `# Errors` is written where it is not obvious
)]
#![cfg_attr(test, allow(
    clippy::panic, // Panic when fatal failures occur
    clippy::unwrap_used, // Tests need `unwrap`
    clippy::indexing_slicing, // Fail fast
))]
#![allow(
    // FIXME: Deny lints below
    clippy::multiple_crate_versions
)]

pub(crate) mod utils;

mod error;
mod error_code;
mod output;
mod service;
mod upstream;
mod verifier;

pub mod credentials;
pub mod data_structures;
pub mod headers;
pub mod signature_v4;

pub use self::credentials::{
    CachedCredentialStore, CredentialStore, KeyStatus, RemoteCredentialStore, RemoteStoreConfig,
    ResolvedCredential, SecretKey, StaticCredentialStore,
};
pub use self::error::{AuthError, CredentialStoreError};
pub use self::error_code::S3ErrorCode;
pub use self::service::{DataPlane, GatewayConfig, GatewayService, SharedGatewayService};
pub use self::upstream::HttpUpstream;
pub use self::verifier::{
    requires_body, Identity, SignatureVerifier, SignedRequest, Verdict, VerifierConfig,
};

pub(crate) use hyper::Body;

/// Request type
pub(crate) type Request = hyper::Request<Body>;

/// Response type
pub(crate) type Response = hyper::Response<Body>;

/// `Box<dyn std::error::Error + Send + Sync + 'static>`
pub(crate) type BoxStdError = Box<dyn std::error::Error + Send + Sync + 'static>;
