use std::net::Ipv4Addr;

/// Instance name the device registers under.
pub const DEVICE_NAME: &str = "MockIoTDevice";

/// Port the HTTP file server listens on.
pub const HTTP_PORT: u16 = 8080;

/// mDNS service type for the advertised HTTP endpoint.
pub const HTTP_SERVICE_TYPE: &str = "_http._tcp.local.";

/// TXT record key carrying the device name.
pub const TXT_NAME: &str = "name";

/// Identity of the simulated device. Built once at startup and immutable for
/// the process lifetime; the advertised service record is derived from it.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_name: String,
    pub ip_address: Ipv4Addr,
    pub port: u16,
}

impl DeviceIdentity {
    pub fn new(ip_address: Ipv4Addr) -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            ip_address,
            port: HTTP_PORT,
        }
    }

    /// Full DNS-SD instance name, e.g. "MockIoTDevice._http._tcp.local."
    pub fn full_service_name(&self) -> String {
        format!("{}.{}", self.device_name, HTTP_SERVICE_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_service_name_includes_type_suffix() {
        let identity = DeviceIdentity::new(Ipv4Addr::new(192, 168, 1, 23));
        assert_eq!(
            identity.full_service_name(),
            "MockIoTDevice._http._tcp.local."
        );
        assert_eq!(identity.port, 8080);
    }
}
