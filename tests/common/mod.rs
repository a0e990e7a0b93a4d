#![allow(dead_code)]

use hmac::{Hmac, Mac};
use hyper::Body;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! enter {
    ($span:expr) => {
        let __span = $span;
        let __enter = __span.enter();
    };
}

pub type Request = hyper::Request<Body>;
pub type Response = hyper::Response<Body>;

pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("s3_auth_gateway=debug")),
        )
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_test_writer()
        .try_init();
}

pub async fn recv_body_string(res: &mut Response) -> anyhow::Result<String> {
    let body = std::mem::take(res.body_mut());
    let bytes = hyper::body::to_bytes(body).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hmac(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// RFC 3986 unreserved characters stay, everything else is `%XX`
pub fn encode(s: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b))
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// A client-side signer written straight from the AWS documentation
#[derive(Debug, Clone)]
pub struct Signer {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub service: String,
}

/// What a client signs
#[derive(Debug, Clone)]
pub struct Signable<'a> {
    pub method: &'a str,
    /// decoded path
    pub path: &'a str,
    /// decoded query pairs
    pub query: Vec<(&'a str, &'a str)>,
    /// signed headers, lowercase names
    pub headers: Vec<(&'a str, &'a str)>,
    pub payload_hash: &'a str,
}

impl Signer {
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: "us-east-1".into(),
            service: "s3".into(),
        }
    }

    fn scope(&self, timestamp: &str) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            &timestamp[..8],
            self.region,
            self.service
        )
    }

    fn signed_header_names(s: &Signable<'_>) -> String {
        let mut names: Vec<&str> = s.headers.iter().map(|&(n, _)| n).collect();
        names.sort_unstable();
        names.dedup();
        names.join(";")
    }

    pub fn canonical_request(s: &Signable<'_>) -> String {
        let uri = if s.path.is_empty() {
            "/".to_owned()
        } else {
            encode(s.path, true)
        };

        let mut query: Vec<(String, String)> = s
            .query
            .iter()
            .map(|&(k, v)| (encode(k, false), encode(v, false)))
            .collect();
        query.sort();
        let query = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut headers = s.headers.clone();
        headers.sort_by(|a, b| a.0.cmp(b.0));
        let mut canonical_headers = String::new();
        let mut i = 0;
        while i < headers.len() {
            let name = headers[i].0;
            let mut values = Vec::new();
            while i < headers.len() && headers[i].0 == name {
                values.push(headers[i].1.split_whitespace().collect::<Vec<_>>().join(" "));
                i += 1;
            }
            canonical_headers.push_str(&format!("{}:{}\n", name, values.join(",")));
        }

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            s.method,
            uri,
            query,
            canonical_headers,
            Self::signed_header_names(s),
            s.payload_hash
        )
    }

    pub fn signature(&self, s: &Signable<'_>, timestamp: &str) -> String {
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            timestamp,
            self.scope(timestamp),
            sha256_hex(Self::canonical_request(s).as_bytes())
        );

        let k_date = hmac(format!("AWS4{}", self.secret_key).as_bytes(), &timestamp[..8]);
        let k_region = hmac(&k_date, &self.region);
        let k_service = hmac(&k_region, &self.service);
        let k_signing = hmac(&k_service, "aws4_request");
        hex(&hmac(&k_signing, &string_to_sign))
    }

    /// `Authorization` header value
    pub fn authorization(&self, s: &Signable<'_>, timestamp: &str) -> String {
        format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key,
            self.scope(timestamp),
            Self::signed_header_names(s),
            self.signature(s, timestamp)
        )
    }

    /// presigned query string, `s.query` plus the `X-Amz-*` parameters
    pub fn presign(&self, s: &Signable<'_>, timestamp: &str, expires: u32) -> String {
        let credential = format!("{}/{}", self.access_key, self.scope(timestamp));
        let expires = expires.to_string();
        let signed_headers = Self::signed_header_names(s);

        let mut query = s.query.clone();
        query.extend([
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256"),
            ("X-Amz-Credential", credential.as_str()),
            ("X-Amz-Date", timestamp),
            ("X-Amz-Expires", expires.as_str()),
            ("X-Amz-SignedHeaders", signed_headers.as_str()),
        ]);

        let signature = self.signature(
            &Signable {
                query: query.clone(),
                payload_hash: "UNSIGNED-PAYLOAD",
                ..s.clone()
            },
            timestamp,
        );

        query
            .iter()
            .map(|&(k, v)| format!("{}={}", encode(k, false), encode(v, false)))
            .chain(std::iter::once(format!("X-Amz-Signature={}", signature)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
