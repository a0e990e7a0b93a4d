//! Ordered headers

use hyper::header::HOST;
use hyper::Request;
use smallvec::SmallVec;
use tracing::debug;

/// Immutable, multi-valued http header container
#[derive(Debug)]
pub struct OrderedHeaders<'a> {
    /// headers, ascending by name (header names are lowercase)
    ///
    /// The sort is stable: repeated headers keep their arrival order.
    headers: SmallVec<[(&'a str, &'a str); 16]>,
}

impl<'a> OrderedHeaders<'a> {
    /// Constructs `OrderedHeaders` from slice
    ///
    /// + header names must be lowercase
    /// + header values must be valid
    #[cfg(test)]
    pub fn from_slice_unchecked(slice: &[(&'a str, &'a str)]) -> Self {
        let mut headers: SmallVec<[(&'a str, &'a str); 16]> = SmallVec::new();
        headers.extend_from_slice(slice);
        headers.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));
        Self { headers }
    }

    /// Constructs `OrderedHeaders<'a>` from `&'a Request<B>`
    ///
    /// Values that are not visible ASCII are skipped, so a signed header
    /// carrying one is reported as missing. When the request has no `Host`
    /// header (HTTP/2), the URI authority stands in for it.
    pub fn from_req<B>(req: &'a Request<B>) -> Self {
        let mut headers: SmallVec<[(&'a str, &'a str); 16]> =
            SmallVec::with_capacity(req.headers().len().saturating_add(1));

        for (name, value) in req.headers() {
            match value.to_str() {
                Ok(value) => headers.push((name.as_str(), value)),
                Err(_) => debug!(header = %name, "skipping non-ascii header value"),
            }
        }

        if !req.headers().contains_key(HOST) {
            if let Some(authority) = req.uri().authority() {
                headers.push(("host", authority.as_str()));
            }
        }

        headers.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));

        Self { headers }
    }

    /// Gets every value of `name` in arrival order. Time `O(logn)`
    ///
    /// `name` must be lowercase.
    #[must_use]
    pub fn get_all(&self, name: &str) -> SmallVec<[&'a str; 2]> {
        let headers = self.headers.as_slice();
        let start = headers.partition_point(|&(n, _)| n < name);
        headers
            .get(start..)
            .unwrap_or_default()
            .iter()
            .take_while(|&&(n, _)| n == name)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Gets the first value of `name`. Time `O(logn)`
    ///
    /// `name` must be lowercase.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let headers = self.headers.as_slice();
        let idx = headers.partition_point(|&(n, _)| n < name);
        match headers.get(idx) {
            Some(&(n, v)) if n == name => Some(v),
            _ => None,
        }
    }
}

impl<'a> AsRef<[(&'a str, &'a str)]> for OrderedHeaders<'a> {
    fn as_ref(&self) -> &[(&'a str, &'a str)] {
        self.headers.as_ref()
    }
}
