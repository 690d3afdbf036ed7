use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::http::server::FileServer;
use crate::identity::DeviceIdentity;
use crate::mdns::advertise::Advertiser;
use crate::net;

/// Run the mock device until interrupted: bind the file server, advertise it
/// over mDNS, idle, then tear down in reverse order.
pub async fn run() -> Result<()> {
    let ip = net::local_ip_or_loopback();
    let identity = DeviceIdentity::new(ip);
    tracing::info!(
        "Device identity: {} at {}:{}",
        identity.device_name,
        identity.ip_address,
        identity.port
    );

    let root = std::env::current_dir().context("Failed to determine working directory")?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, identity.port));
    let server = FileServer::bind(addr, root).await?;
    tracing::info!("Starting HTTP server on port {}", identity.port);

    let cancel = CancellationToken::new();
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(server_cancel).await {
            tracing::error!("HTTP server error: {:#}", e);
        }
    });

    // An advertising failure is fatal, but the server task must still be
    // stopped before the error propagates.
    let mut advertiser = match start_advertising(&identity) {
        Ok(advertiser) => advertiser,
        Err(e) => {
            cancel.cancel();
            let _ = server_handle.await;
            return Err(e);
        }
    };

    tracing::info!("Mock IoT device running. Press Ctrl+C to stop...");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    cancel.cancel();
    let _ = server_handle.await;

    // Teardown is best-effort: a failed step must not block the rest.
    if let Err(e) = advertiser.unadvertise() {
        tracing::error!("Failed to unregister mDNS service: {:#}", e);
    }
    if let Err(e) = advertiser.shutdown() {
        tracing::error!("Failed to shut down mDNS daemon: {:#}", e);
    }

    tracing::info!("Service stopped");
    Ok(())
}

fn start_advertising(identity: &DeviceIdentity) -> Result<Advertiser> {
    let mut advertiser = Advertiser::new()?;
    advertiser.advertise(identity)?;
    Ok(advertiser)
}
