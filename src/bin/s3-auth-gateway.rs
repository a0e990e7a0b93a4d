//! ```shell
//! s3-auth-gateway 0.1.0-dev
//!
//! USAGE:
//!     s3-auth-gateway [FLAGS] [OPTIONS] --upstream <upstream>
//!
//! FLAGS:
//!         --allow-anonymous    Forward requests without authentication material
//!         --disable-expiry     Accept signed requests regardless of their timestamp
//!     -h, --help               Prints help information
//!     -V, --version            Prints version information
//!
//! OPTIONS:
//!         --host <host>                                      [default: localhost]
//!         --port <port>                                      [default: 8014]
//!         --upstream <upstream>
//!         --region <region>
//!         --clock-skew-secs <clock-skew-secs>                [default: 900]
//!         --max-buffered-body <max-buffered-body>            [default: 16777216]
//!         --credential-store-url <credential-store-url>
//!         --service-secret <service-secret>                  [env: S3_GATEWAY_SERVICE_SECRET]
//!         --credential-store-timeout-secs <secs>             [default: 5]
//!         --cache-ttl-secs <cache-ttl-secs>                  [default: 0]
//!         --access-key <access-key>
//!         --secret-key <secret-key>                          [env: S3_GATEWAY_SECRET_KEY]
//!         --owner-id <owner-id>
//! ```

use s3_auth_gateway::{
    CachedCredentialStore, CredentialStore, GatewayConfig, GatewayService, HttpUpstream,
    RemoteCredentialStore, RemoteStoreConfig, SignatureVerifier, StaticCredentialStore,
    VerifierConfig,
};

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use futures::future;
use hyper::server::Server;
use hyper::service::make_service_fn;
use hyper::Uri;
use structopt::StructOpt;
use tracing::{debug, info, warn};

#[derive(StructOpt)]
struct Args {
    #[structopt(long, default_value = "localhost")]
    host: String,

    #[structopt(long, default_value = "8014")]
    port: u16,

    /// Data plane base url
    #[structopt(long)]
    upstream: Uri,

    /// Forward requests without authentication material
    #[structopt(long)]
    allow_anonymous: bool,

    /// Only accept credential scopes naming this region
    #[structopt(long)]
    region: Option<String>,

    #[structopt(long, default_value = "900")]
    clock_skew_secs: u64,

    /// Accept signed requests regardless of their timestamp
    #[structopt(long)]
    disable_expiry: bool,

    #[structopt(long, default_value = "16777216")]
    max_buffered_body: usize,

    #[structopt(long, requires("service-secret"), display_order = 1000)]
    credential_store_url: Option<String>,

    #[structopt(long, env = "S3_GATEWAY_SERVICE_SECRET", hide_env_values = true, display_order = 1000)]
    service_secret: Option<String>,

    #[structopt(long = "credential-store-timeout-secs", default_value = "5", display_order = 1000)]
    store_timeout_secs: u64,

    #[structopt(long, default_value = "0", display_order = 1000)]
    cache_ttl_secs: u64,

    #[structopt(long, requires("secret-key"), display_order = 1001)]
    access_key: Option<String>,

    #[structopt(long, env = "S3_GATEWAY_SECRET_KEY", hide_env_values = true, display_order = 1001)]
    secret_key: Option<String>,

    #[structopt(long, display_order = 1001)]
    owner_id: Option<String>,
}

pub fn setup_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    tracing_subscriber::fmt()
        .event_format(fmt::format::Format::default().pretty())
        .with_env_filter(EnvFilter::from_default_env())
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .finish()
        .with(ErrorLayer::default())
        .init();
}

/// the credential store named by the arguments
fn credential_store(args: &Args) -> Result<Arc<dyn CredentialStore>> {
    let store: Arc<dyn CredentialStore> = match (&args.credential_store_url, &args.access_key) {
        (Some(url), None) => {
            let secret = args.service_secret.clone().unwrap_or_default();
            let mut config = RemoteStoreConfig::new(url.clone(), secret);
            config.timeout = Duration::from_secs(args.store_timeout_secs);
            info!(%url, timeout = ?config.timeout, "using remote credential store");
            Arc::new(RemoteCredentialStore::new(config))
        }
        (None, Some(access_key)) => {
            let secret_key = args.secret_key.clone().unwrap_or_default();
            let owner_id = args.owner_id.clone().unwrap_or_else(|| access_key.clone());
            info!(%access_key, %owner_id, "using static credential store");
            Arc::new(StaticCredentialStore::from_single(
                access_key.clone(),
                secret_key,
                owner_id,
            ))
        }
        (Some(_), Some(_)) => bail!("--credential-store-url and --access-key are exclusive"),
        (None, None) => bail!("either --credential-store-url or --access-key is required"),
    };

    if args.cache_ttl_secs == 0 {
        return Ok(store);
    }

    let ttl = Duration::from_secs(args.cache_ttl_secs);
    debug!(?ttl, "caching credentials");
    Ok(Arc::new(CachedCredentialStore::new(store, ttl)))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args: Args = Args::from_args();

    let store = credential_store(&args)?;

    let verifier_config = VerifierConfig {
        enforce: !args.allow_anonymous,
        clock_skew: (!args.disable_expiry).then(|| Duration::from_secs(args.clock_skew_secs)),
        region: args.region.clone(),
    };
    if args.allow_anonymous {
        warn!("requests without authentication material will be forwarded");
    }
    debug!(?verifier_config);

    let gateway_config = GatewayConfig {
        max_buffered_body: args.max_buffered_body,
    };

    // setup the service
    let service = GatewayService::new(
        SignatureVerifier::new(store, verifier_config),
        HttpUpstream::new(args.upstream.clone()),
        gateway_config,
    );

    let server = {
        let service = service.into_shared();
        let listener = TcpListener::bind((args.host.as_str(), args.port))?;
        let make_service: _ =
            make_service_fn(move |_| future::ready(Ok::<_, anyhow::Error>(service.clone())));
        Server::from_tcp(listener)?.serve(make_service)
    };

    info!(upstream = %args.upstream, "gateway is running at http://{}:{}/", args.host, args.port);
    server.await?;

    Ok(())
}
