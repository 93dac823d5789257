use axum::extract::{Query, State};
use axum::Json;
use onboard_core::systemd::UnitStatus;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// systemd
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UnitQuery {
    #[serde(default)]
    unit: String,
}

/// GET /api/v1/status/systemd?unit=<unit>
pub async fn systemd(
    State(app): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> Result<Json<UnitStatus>, AppError> {
    if query.unit.is_empty() {
        tracing::warn!("received empty unit");
        return Err(AppError::bad_request("received empty unit"));
    }
    let units = app.units.clone();
    let status = tokio::task::spawn_blocking(move || units.show(&query.unit))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(|e| {
            tracing::error!(error = %e, "failed to get show unit status");
            AppError::bad_request("failed to get show unit status")
        })?;
    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// link
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LinkStatus {
    pub addresses: Vec<String>,
    pub state: String,
}

#[derive(Deserialize)]
struct IpLink {
    #[serde(default)]
    operstate: String,
    #[serde(default)]
    addr_info: Vec<IpAddrInfo>,
}

#[derive(Deserialize)]
struct IpAddrInfo {
    local: String,
    prefixlen: u8,
}

/// Parse the output of `ip -json addr show dev <iface>`.
pub fn parse_link(output: &[u8]) -> Result<LinkStatus, serde_json::Error> {
    let links: Vec<IpLink> = serde_json::from_slice(output)?;
    let Some(link) = links.into_iter().next() else {
        return Ok(LinkStatus {
            addresses: Vec::new(),
            state: "unknown".to_string(),
        });
    };
    Ok(LinkStatus {
        addresses: link
            .addr_info
            .iter()
            .map(|a| format!("{}/{}", a.local, a.prefixlen))
            .collect(),
        state: link.operstate.to_lowercase(),
    })
}

/// GET /api/v1/status/link: addresses and operational state of the WLAN
/// interface.
pub async fn link(State(app): State<AppState>) -> Result<Json<LinkStatus>, AppError> {
    let output = Command::new("ip")
        .args(["-json", "addr", "show", "dev", app.wlan_interface.as_str()])
        .output()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to list addresses");
            AppError::internal("failed to list addresses")
        })?;
    if !output.status.success() {
        tracing::error!(
            interface = %app.wlan_interface,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "failed to find interface"
        );
        return Err(AppError::internal("failed to find interface"));
    }
    let status = parse_link(&output.stdout).map_err(|e| {
        tracing::error!(error = %e, "failed to parse addresses");
        AppError::internal("failed to list addresses")
    })?;
    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// dns
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EndpointQuery {
    #[serde(default)]
    endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct DnsStatus {
    pub addresses: Vec<String>,
}

/// Split `host:port`, accepting bracketed IPv6 hosts.
pub fn split_host_port(endpoint: &str) -> Option<(&str, &str)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')?,
        None if host.contains(':') || host.contains(']') => return None,
        None => host,
    };
    Some((host, port))
}

/// GET /api/v1/status/dns?endpoint=<host:port>
pub async fn dns(Query(query): Query<EndpointQuery>) -> Result<Json<DnsStatus>, AppError> {
    let Some((host, _)) = split_host_port(&query.endpoint) else {
        tracing::error!(endpoint = %query.endpoint, "failed to parse endpoint");
        return Err(AppError::bad_request("failed to parse endpoint"));
    };
    let addrs = tokio::net::lookup_host((host, 0)).await.map_err(|e| {
        tracing::error!(host = %host, error = %e, "failed to lookup hostname");
        AppError::internal("failed to lookup hostname")
    })?;
    let addresses: Vec<String> = addrs.map(|a| a.ip().to_string()).collect();
    if addresses.is_empty() {
        tracing::error!(host = %host, "found no addresses for host");
        return Err(AppError::internal("found no addresses for host"));
    }
    Ok(Json(DnsStatus { addresses }))
}
