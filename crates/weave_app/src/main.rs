//! Demo driver: load config, run one overlay flood, report traversal time.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use weave_network::{NetError, Overlay, OverlayConfig};

mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    let logs_dir = std::env::var("WEAVE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"));
    let _guard = logging::init_logging(&logs_dir)?;

    let config_path = std::env::var("WEAVE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("weave.json"));
    let config = OverlayConfig::load_or_default(&config_path);
    info!(
        "starting overlay: {} peers from {}:{}",
        config.node_count, config.address_prefix, config.start_port
    );

    let delivery_timeout = config.delivery_timeout;
    let mut overlay = Overlay::new(config);
    let report = overlay.launch().await?;
    overlay.shutdown();

    if report.timed_out {
        warn!(
            "delivery incomplete: {}/{} peers observed the flood",
            report.delivered, report.expected
        );
        return Err(NetError::Timeout(delivery_timeout).into());
    }

    println!(
        "message traversed {} peers in {:?}",
        report.delivered, report.elapsed
    );
    Ok(())
}
