#[macro_use]
mod common;

use common::{recv_body_string, Request, Response, Signable, Signer, EMPTY_SHA256};

use s3_auth_gateway::{
    DataPlane, GatewayConfig, GatewayService, Identity, SharedGatewayService, SignatureVerifier,
    StaticCredentialStore, VerifierConfig,
};

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use hyper::{Body, Method, StatusCode};
use tracing::debug_span;

const ACCESS_KEY: &str = "AKIDEXAMPLE";
const SECRET_KEY: &str = "s3cr3t";
const OWNER_ID: &str = "owner-42";

type BoxStdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What the data plane saw
#[derive(Debug)]
struct Seen {
    method: Method,
    path: String,
    owner: Option<String>,
    identity: Option<Identity>,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct RecordingDataPlane {
    seen: Mutex<Vec<Seen>>,
    fail: bool,
}

#[async_trait]
impl DataPlane for RecordingDataPlane {
    async fn call(&self, req: Request) -> Result<Response, BoxStdError> {
        if self.fail {
            return Err("backend down".into());
        }
        let (parts, body) = req.into_parts();
        let body = hyper::body::to_bytes(body).await?;
        self.seen.lock().unwrap().push(Seen {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            owner: parts
                .headers
                .get("x-gateway-owner-id")
                .map(|v| v.to_str().unwrap().to_owned()),
            identity: parts.extensions.get::<Identity>().cloned(),
            body: body.to_vec(),
        });
        Ok(Response::new(Body::from("ok")))
    }
}

type Service = SharedGatewayService<StaticCredentialStore, Arc<RecordingDataPlane>>;

fn setup_service(
    verifier_config: VerifierConfig,
    config: GatewayConfig,
    data_plane: RecordingDataPlane,
) -> (Service, Arc<RecordingDataPlane>) {
    common::setup_tracing();

    let store = StaticCredentialStore::from_single(ACCESS_KEY, SECRET_KEY, OWNER_ID);
    let verifier = SignatureVerifier::new(store, verifier_config);
    let data_plane = Arc::new(data_plane);
    let service = GatewayService::new(verifier, Arc::clone(&data_plane), config).into_shared();
    (service, data_plane)
}

fn service_with_store(store: StaticCredentialStore) -> (Service, Arc<RecordingDataPlane>) {
    common::setup_tracing();

    let verifier = SignatureVerifier::new(store, VerifierConfig::default());
    let data_plane = Arc::new(RecordingDataPlane::default());
    let config = GatewayConfig::default();
    let service = GatewayService::new(verifier, Arc::clone(&data_plane), config).into_shared();
    (service, data_plane)
}

fn default_service() -> (Service, Arc<RecordingDataPlane>) {
    setup_service(
        VerifierConfig::default(),
        GatewayConfig::default(),
        RecordingDataPlane::default(),
    )
}

fn timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// a header-signed request; `content_sha256: None` signs the body hash itself
fn signed_request(
    method: &str,
    path: &str,
    body: &'static [u8],
    content_sha256: Option<&str>,
) -> Request {
    let timestamp = timestamp();
    let payload_hash = content_sha256.map_or_else(|| common::sha256_hex(body), str::to_owned);

    let mut headers = vec![("host", "localhost:9000"), ("x-amz-date", timestamp.as_str())];
    if let Some(content_sha256) = content_sha256 {
        headers.push(("x-amz-content-sha256", content_sha256));
    }
    let signable = Signable {
        method,
        path,
        query: vec![],
        headers,
        payload_hash: &payload_hash,
    };
    let authorization = Signer::new(ACCESS_KEY, SECRET_KEY).authorization(&signable, &timestamp);

    let mut builder = hyper::Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost:9000")
        .header("x-amz-date", timestamp.as_str())
        .header("authorization", authorization);
    if let Some(content_sha256) = content_sha256 {
        builder = builder.header("x-amz-content-sha256", content_sha256);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn accepted_request_carries_identity() -> Result<()> {
    let (service, data_plane) = default_service();
    enter!(debug_span!("accepted request"));

    let mut req = signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256));
    drop(req.headers_mut().insert("x-gateway-owner-id", "spoofed".parse()?));

    let mut res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(recv_body_string(&mut res).await?, "ok");

    let seen = data_plane.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].path, "/mybucket/mykey");
    assert_eq!(seen[0].owner.as_deref(), Some(OWNER_ID));
    assert_eq!(
        seen[0].identity,
        Some(Identity {
            owner_id: OWNER_ID.into(),
            access_key: ACCESS_KEY.into(),
        })
    );
    Ok(())
}

#[tokio::test]
async fn body_is_hashed_and_forwarded() -> Result<()> {
    let (service, data_plane) = default_service();

    let req = signed_request("PUT", "/mybucket/hello.txt", b"Welcome to Amazon S3.", None);
    let res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::OK);

    let seen = data_plane.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].body, b"Welcome to Amazon S3.");
    Ok(())
}

#[tokio::test]
async fn denied_request_gets_xml_error() -> Result<()> {
    let (service, data_plane) = default_service();

    let mut req = signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256));
    *req.uri_mut() = "/mybucket/otherkey".parse()?;

    let mut res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        res.headers().get("x-gateway-deny-reason").map(|v| v.to_str()).transpose()?,
        Some("SignatureMismatch")
    );
    assert!(res.headers().contains_key("x-amz-request-id"));

    let mime: mime::Mime = res.headers()["content-type"].to_str()?.parse()?;
    assert_eq!(mime.subtype(), mime::XML);

    let body = recv_body_string(&mut res).await?;
    assert!(body.contains("<Code>SignatureDoesNotMatch</Code>"), "{}", body);
    assert!(!body.contains(SECRET_KEY));

    assert!(data_plane.seen.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn anonymous_requests() -> Result<()> {
    let anonymous = || {
        let mut req = hyper::Request::new(Body::empty());
        *req.uri_mut() = "/mybucket/mykey".parse().unwrap();
        drop(req.headers_mut().insert("x-gateway-owner-id", "spoofed".parse().unwrap()));
        req
    };

    let (service, data_plane) = default_service();
    let res = service.hyper_call(anonymous()).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(data_plane.seen.lock().unwrap().is_empty());

    let open = VerifierConfig {
        enforce: false,
        ..VerifierConfig::default()
    };
    let (service, data_plane) = setup_service(
        open,
        GatewayConfig::default(),
        RecordingDataPlane::default(),
    );
    let res = service.hyper_call(anonymous()).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::OK);

    let seen = data_plane.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].owner, None);
    assert_eq!(seen[0].identity, None);
    Ok(())
}

#[tokio::test]
async fn oversized_body() -> Result<()> {
    let config = GatewayConfig {
        max_buffered_body: 8,
    };
    let (service, data_plane) =
        setup_service(VerifierConfig::default(), config, RecordingDataPlane::default());

    let req = signed_request("PUT", "/mybucket/hello.txt", b"Welcome to Amazon S3.", None);
    let mut res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers().get("x-gateway-deny-reason").map(|v| v.to_str()).transpose()?,
        Some("PayloadTooLarge")
    );
    let body = recv_body_string(&mut res).await?;
    assert!(body.contains("<Code>EntityTooLarge</Code>"), "{}", body);

    // declared bodies are hashed by the client, so the cap does not apply
    let req = signed_request(
        "PUT",
        "/mybucket/hello.txt",
        b"Welcome to Amazon S3.",
        Some(&common::sha256_hex(b"Welcome to Amazon S3.")),
    );
    let res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(data_plane.seen.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn data_plane_failure() -> Result<()> {
    let failing = RecordingDataPlane {
        fail: true,
        ..RecordingDataPlane::default()
    };
    let (service, _) = setup_service(VerifierConfig::default(), GatewayConfig::default(), failing);

    let req = signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256));
    let res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    Ok(())
}

#[tokio::test]
async fn serves_over_hyper() -> Result<()> {
    use hyper::service::{make_service_fn, Service as _};

    let (service, data_plane) = default_service();

    let mut svc = service.clone();
    let res = svc
        .call(signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256)))
        .await
        .map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::OK);

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let make_service = make_service_fn(move |_| {
        let service = service.clone();
        async move { Ok::<_, std::convert::Infallible>(service) }
    });
    let server = hyper::Server::from_tcp(listener)?.serve(make_service);
    let handle = tokio::spawn(server);

    let mut req = signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256));
    *req.uri_mut() = format!("http://{}/mybucket/mykey", addr).parse()?;
    let res = hyper::Client::new().request(req).await?;
    assert_eq!(res.status(), StatusCode::OK);

    handle.abort();
    assert_eq!(data_plane.seen.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn owner_id_unfit_for_a_header() -> Result<()> {
    let store = StaticCredentialStore::from_single(ACCESS_KEY, SECRET_KEY, "owner\nwith-newline");
    let (service, data_plane) = service_with_store(store);

    let req = signed_request("GET", "/mybucket/mykey", b"", Some(EMPTY_SHA256));
    let res = service.hyper_call(req).await.map_err(anyhow::Error::msg)?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(data_plane.seen.lock().unwrap().is_empty());
    Ok(())
}
