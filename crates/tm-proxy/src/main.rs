use clap::Parser;
use tm_proxy::{Config, ProxyServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tm-proxy", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "TM_PROXY_CONFIG")]
    config: Option<String>,

    /// Listen port (overrides listen.port)
    #[arg(short, long, env = "TM_PROXY_PORT")]
    port: Option<u16>,

    /// Site proxied when a request has no target parameter
    #[arg(long, env = "TM_PROXY_DEFAULT_TARGET")]
    default_target: Option<String>,

    /// Externally visible proxy root used in rewritten links
    #[arg(long, env = "TM_PROXY_PUBLIC_BASE_URI")]
    public_base_uri: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading configuration from {}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(target) = args.default_target {
        config.upstream.default_target = target;
    }
    if let Some(base) = args.public_base_uri {
        config.rewrite.public_base_uri = Some(base);
    }

    ProxyServer::new(config)?.run().await
}
