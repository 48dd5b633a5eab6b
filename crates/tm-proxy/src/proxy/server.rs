//! ProxyServer struct and main run loop.

use super::client::{create_http_client, HyperFetcher, UpstreamFetch};
use super::handler::{handle_request, RequestHandlerContext};
use super::target::InboundSettings;
use crate::config::Config;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The main proxy server struct.
pub struct ProxyServer {
    config: Arc<Config>,
    fetcher: Arc<dyn UpstreamFetch>,
}

/// State shared by every connection once the listener address is known.
struct ServerState {
    fetcher: Arc<dyn UpstreamFetch>,
    inbound: InboundSettings,
}

impl ProxyServer {
    /// Create a new ProxyServer from configuration, fetching over a pooled hyper client.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let http_client = create_http_client(&config.connection_pool);
        let timeout = Duration::from_secs(config.upstream.request_timeout_secs);
        let fetcher = Arc::new(HyperFetcher::new(http_client, timeout));
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Create a ProxyServer around an existing fetch collaborator.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn UpstreamFetch>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.config.listen.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let local_addr = listener.local_addr()?;

        info!("Listening on http://{}", local_addr);
        info!("Default target: {}", self.config.upstream.default_target);
        if let Some(ref base) = self.config.rewrite.public_base_uri {
            info!("Rewriting links against {}", base);
        }

        let state = Arc::new(ServerState {
            fetcher: self.fetcher,
            inbound: InboundSettings::new(&self.config, local_addr),
        });

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let state = Arc::clone(&state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move {
                        let ctx = RequestHandlerContext {
                            fetcher: state.fetcher.as_ref(),
                            inbound: &state.inbound,
                        };
                        handle_request(&ctx, req).await
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
