//! request util

use crate::Body;

use std::mem;

use hyper::body::{Bytes, HttpBody};
use hyper::header::{AsHeaderName, HeaderValue, ToStrError};
use hyper::Request;

/// `RequestExt`
pub trait RequestExt {
    /// get header value as `&str`
    fn get_header_str(&self, name: impl AsHeaderName) -> Result<Option<&str>, ToStrError>;
}

impl<B> RequestExt for Request<B> {
    fn get_header_str(&self, name: impl AsHeaderName) -> Result<Option<&str>, ToStrError> {
        self.headers()
            .get(name)
            .map(HeaderValue::to_str)
            .transpose()
    }
}

/// take request body
pub fn take_body(req: &mut Request<Body>) -> Body {
    mem::replace(req.body_mut(), Body::empty())
}

/// Collects a body of at most `limit` bytes
///
/// Returns `Ok(None)` as soon as the body grows past `limit`.
///
/// # Errors
/// Returns an `Err` if the body stream fails
pub async fn read_body_limited(body: &mut Body, limit: usize) -> Result<Option<Bytes>, hyper::Error> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if buf.len().saturating_add(chunk.len()) > limit {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Some(Bytes::from(buf)))
}
