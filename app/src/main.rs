use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use dotenvy::dotenv;
use postreview::{config::config::Config, core::server::create_server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    let config = Config::load_envs()?;

    let server_ip: IpAddr = config
        .server_ip
        .parse()
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::new(server_ip, config.port);
    let (server, db_conn) = create_server(config).await?;

    let server = axum_server::bind(addr).serve(server.into_make_service());
    info!("Server starting on {}", addr);

    if let Err(e) = server.await {
        error!("Server failed: {}", e);
    }

    if let Err(e) = db_conn.close().await {
        error!("Failed to close database connection: {}", e);
    }

    Ok(())
}
