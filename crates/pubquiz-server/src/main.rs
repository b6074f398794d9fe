use std::net::{Ipv4Addr, SocketAddr};

use pubquiz_server::{config, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pubquiz_server=debug,pubquiz_common=debug".into()),
        )
        .init();

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config::port()));
    tracing::info!("Starting pubquiz server on {}", addr);
    server::run(addr).await
}
