use anyhow::{Context, Result};
use claire_core::protocol::{MessageSender, Request};
use tracing::info;

use super::Host;

pub async fn ping(host: &Host) -> Result<()> {
    let response = host
        .coordinator
        .handle(Request::Ping, &MessageSender::extension_page())
        .await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

pub async fn monitor(host: &Host) -> Result<()> {
    host.coordinator.on_startup().await?;
    info!("[CLI] Coordinator running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    host.coordinator.stop_monitoring().await;
    info!("[CLI] Coordinator stopped");
    Ok(())
}
