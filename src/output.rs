//! Rejection responses

use crate::error::AuthError;
use crate::error_code::S3ErrorCode;
use crate::headers::{X_AMZ_REQUEST_ID, X_GATEWAY_DENY_REASON};
use crate::utils::XmlWriterExt;
use crate::{Body, BoxStdError, Response};

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use xml::{
    common::XmlVersion,
    writer::{EventWriter, XmlEvent},
};

/// Type representing an error response
#[derive(Debug)]
pub(crate) struct XmlErrorResponse {
    /// status
    status: StatusCode,
    /// code
    code: S3ErrorCode,
    /// message
    message: Option<String>,
    /// machine reason code
    reason: &'static str,
    /// request id
    request_id: String,
}

impl XmlErrorResponse {
    /// Constructs a `XmlErrorResponse` describing a denial
    pub(crate) fn from_auth_error(err: &AuthError, request_id: String) -> Self {
        Self {
            status: err.status_code(),
            code: err.s3_error_code(),
            message: Some(err.to_string()),
            reason: err.reason_code(),
            request_id,
        }
    }

    /// Converts into a response
    ///
    /// # Errors
    /// Returns an `Err` if the xml body or a header can not be written
    pub(crate) fn try_into_response(self) -> Result<Response, BoxStdError> {
        wrap_output(|res| {
            *res.status_mut() = self.status;

            set_xml_body(res, 128, |w| {
                w.stack("Error", |w| {
                    w.element("Code", self.code.as_static_str())?;
                    w.opt_element("Message", self.message.as_deref())?;
                    w.element("RequestId", &self.request_id)?;
                    Ok(())
                })
            })?;

            let headers = res.headers_mut();
            drop(headers.insert(
                X_GATEWAY_DENY_REASON.clone(),
                HeaderValue::from_static(self.reason),
            ));
            drop(headers.insert(
                X_AMZ_REQUEST_ID.clone(),
                HeaderValue::from_str(&self.request_id)?,
            ));
            Ok(())
        })
    }

    /// Converts into a response, degrading to a bare status on failure
    pub(crate) fn into_response(self) -> Response {
        let status = self.status;
        self.try_into_response().unwrap_or_else(|err| {
            tracing::error!(%err, "failed to render error response");
            let mut res = Response::new(Body::empty());
            *res.status_mut() = status;
            res
        })
    }
}

/// helper function for error converting
fn wrap_output(
    f: impl FnOnce(&mut Response) -> Result<(), BoxStdError>,
) -> Result<Response, BoxStdError> {
    let mut res = Response::new(Body::empty());
    f(&mut res)?;
    Ok(res)
}

/// set xml body
fn set_xml_body<F>(res: &mut Response, cap: usize, f: F) -> Result<(), BoxStdError>
where
    F: FnOnce(&mut EventWriter<&mut Vec<u8>>) -> Result<(), xml::writer::Error>,
{
    let mut body = Vec::with_capacity(cap);
    {
        let mut w = EventWriter::new(&mut body);
        w.write(XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("UTF-8"),
            standalone: None,
        })?;

        f(&mut w)?;
    }

    *res.body_mut() = Body::from(body);
    drop(
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_str(mime::TEXT_XML.as_ref())?),
    );
    Ok(())
}
