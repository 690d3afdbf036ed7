use std::collections::HashMap;

use anyhow::{Context, Result};
use mdns_sd::{ServiceDaemon, ServiceInfo};

use crate::identity::{DeviceIdentity, HTTP_SERVICE_TYPE, TXT_NAME};

/// Owns the mDNS responder and the single registered service record.
pub struct Advertiser {
    daemon: ServiceDaemon,
    registered: Option<ServiceInfo>,
}

impl Advertiser {
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new().context("Failed to create mDNS daemon")?;
        Ok(Self {
            daemon,
            registered: None,
        })
    }

    /// Register the device's service record. At most one record may be
    /// registered per advertiser.
    pub fn advertise(&mut self, identity: &DeviceIdentity) -> Result<()> {
        if self.registered.is_some() {
            anyhow::bail!("Service is already advertised");
        }

        let service_info = build_service_info(identity)?;

        self.daemon
            .register(service_info.clone())
            .context("Failed to register mDNS service")?;

        tracing::info!(
            "Advertising service {} at {}:{}",
            service_info.get_fullname(),
            identity.ip_address,
            identity.port
        );

        self.registered = Some(service_info);
        Ok(())
    }

    /// Unregister the service record. Idempotent: a no-op when nothing is
    /// registered.
    pub fn unadvertise(&mut self) -> Result<()> {
        let Some(service_info) = self.registered.take() else {
            return Ok(());
        };

        self.daemon
            .unregister(service_info.get_fullname())
            .context("Failed to unregister mDNS service")?;

        tracing::info!("Unregistered {}", service_info.get_fullname());
        Ok(())
    }

    /// Shut down the responder daemon itself.
    pub fn shutdown(&self) -> Result<()> {
        self.daemon
            .shutdown()
            .context("Failed to shut down mDNS daemon")?;
        Ok(())
    }
}

/// Build the service record advertised for the given identity: instance name
/// under `_http._tcp.local.`, the resolved address and port, and a single
/// `name` TXT property.
pub fn build_service_info(identity: &DeviceIdentity) -> Result<ServiceInfo> {
    let hostname = hostname::get()
        .context("Failed to get system hostname")?
        .to_string_lossy()
        .to_string();

    let txt_records = HashMap::from([(TXT_NAME.to_string(), identity.device_name.clone())]);

    ServiceInfo::new(
        HTTP_SERVICE_TYPE,
        &identity.device_name,
        &format!("{}.local.", hostname),
        std::net::IpAddr::V4(identity.ip_address),
        identity.port,
        txt_records,
    )
    .context("Failed to create ServiceInfo")
}
