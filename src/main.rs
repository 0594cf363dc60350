//! Command-line runner for the bridge.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loopbridge::LoopBridge;

#[derive(Parser, Debug)]
#[command(
    name = "loopbridge",
    about = "Routes a virtual loopback capture device into a physical output and keeps the route alive"
)]
struct Args {
    /// Name fragment of the virtual loopback capture device
    #[arg(long, default_value = "BlackHole")]
    capture: String,

    /// Name fragment of the physical output device
    #[arg(long)]
    output: String,

    /// Playback gain in 0.0..=1.0
    #[arg(long, default_value_t = 0.5)]
    volume: f32,

    /// Heartbeat period in seconds
    #[arg(long, default_value_t = 5)]
    heartbeat: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let session = LoopBridge::builder()
        .capture_device(&args.capture)
        .output_device(&args.output)
        .volume(args.volume)
        .heartbeat_period(Duration::from_secs(args.heartbeat))
        .start()
        .await?;

    tracing::info!("bridge running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    session.stop().await?;
    Ok(())
}
