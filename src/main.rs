//! `hemmer-provider-hetznerrobot` binary, spawned by the Hemmer host.

use hemmer_provider_hetznerrobot::{init_logging, serve, HetznerRobotProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Hetzner Robot provider");
    serve(HetznerRobotProvider::new()).await
}
