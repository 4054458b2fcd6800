use std::net::{IpAddr, SocketAddr};

use tracing_subscriber::EnvFilter;

// This main function is the entry point when running `cargo run -p web-server`.
// It loads the configuration and dataset, then hands off to the library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = configuration::load_config()?;
    let state = web_server::AppState::from_settings(&settings)?;

    let host: IpAddr = settings.dashboard.host.parse()?;
    let addr = SocketAddr::new(host, settings.dashboard.port);
    web_server::run_server(addr, state).await
}
