//! HTTP forwarding data plane

use crate::service::DataPlane;
use crate::{BoxStdError, Request, Response};

use std::convert::TryFrom;

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::HOST;
use hyper::http::uri::{PathAndQuery, Uri};
use hyper::Client;
use tracing::debug;

/// Forwards accepted requests to an upstream HTTP server
#[derive(Debug)]
pub struct HttpUpstream {
    /// http client
    client: Client<HttpConnector>,
    /// upstream base url
    base: Uri,
}

impl HttpUpstream {
    /// Constructs an `HttpUpstream` forwarding to `base`
    #[must_use]
    pub fn new(base: Uri) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    /// `base` joined with the path and query of `uri`
    fn target_uri(&self, uri: &Uri) -> Result<Uri, BoxStdError> {
        let prefix = self.base.path().trim_end_matches('/');
        let path_and_query = uri.path_and_query().map_or("/", PathAndQuery::as_str);

        let mut parts = self.base.clone().into_parts();
        parts.path_and_query = Some(PathAndQuery::try_from(format!(
            "{}{}",
            prefix, path_and_query
        ))?);
        Ok(Uri::from_parts(parts)?)
    }
}

#[async_trait]
impl DataPlane for HttpUpstream {
    async fn call(&self, mut req: Request) -> Result<Response, BoxStdError> {
        let target = self.target_uri(req.uri())?;
        debug!(%target, "forwarding");
        *req.uri_mut() = target;
        drop(req.headers_mut().remove(HOST));
        Ok(self.client.request(req).await?)
    }
}
