use anyhow::{anyhow, Result};
use mdns_sd::{ServiceDaemon, ServiceInfo};
use std::collections::HashMap;
use std::net::IpAddr;

pub const SERVICE_TYPE: &str = "_http._tcp.local.";
pub const HOST_NAME: &str = "onboard.local.";

pub fn instance_name(id: &str) -> String {
    format!("Onboard {id}").trim().to_string()
}

/// Advertises the onboarding UI over mDNS until shut down.
pub struct Advertiser {
    daemon: ServiceDaemon,
    fullname: String,
}

impl Advertiser {
    pub fn start(id: &str, ip: IpAddr, port: u16) -> Result<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| anyhow!("failed to start mDNS daemon: {e}"))?;
        let properties: HashMap<String, String> = [("id".to_string(), id.to_string())].into();
        let info = ServiceInfo::new(
            SERVICE_TYPE,
            &instance_name(id),
            HOST_NAME,
            ip.to_string().as_str(),
            port,
            properties,
        )
        .map_err(|e| anyhow!("failed to build mDNS service: {e}"))?;
        let fullname = info.get_fullname().to_string();
        daemon
            .register(info)
            .map_err(|e| anyhow!("failed to register mDNS service: {e}"))?;
        tracing::info!(service = %fullname, %ip, port, "advertising over mDNS");
        Ok(Self { daemon, fullname })
    }

    pub fn shutdown(self) {
        if let Err(e) = self.daemon.unregister(&self.fullname) {
            tracing::warn!(error = %e, "failed to unregister mDNS service");
        }
        if let Err(e) = self.daemon.shutdown() {
            tracing::warn!(error = %e, "failed to shut down mDNS daemon");
        }
    }
}
