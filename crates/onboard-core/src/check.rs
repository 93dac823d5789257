use crate::names;
use crate::value::ValueRegistry;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// A post-condition to verify once every action has run.
///
/// Checks are validated with the rest of the configuration and handed to the
/// frontend; this crate never executes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCheck", into = "RawCheck")]
pub struct Check {
    pub name: String,
    pub description: String,
    pub kind: CheckKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    Systemd(SystemdCheck),
    Grpc(GrpcCheck),
    Dns(DnsCheck),
}

#[derive(Serialize, Deserialize)]
struct RawCheck {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    systemd: Option<SystemdCheck>,
    #[serde(default, rename = "gRPC", skip_serializing_if = "Option::is_none")]
    grpc: Option<GrpcCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dns: Option<DnsCheck>,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawCheck> for Check {
    type Error = String;

    fn try_from(raw: RawCheck) -> Result<Self, Self::Error> {
        let kind = match (raw.systemd, raw.grpc, raw.dns) {
            (Some(s), None, None) => CheckKind::Systemd(s),
            (None, Some(g), None) => CheckKind::Grpc(g),
            (None, None, Some(d)) => CheckKind::Dns(d),
            _ => {
                return Err(format!(
                    "check {:?}: exactly one of 'dns', 'gRPC', or 'systemd' must be specified",
                    raw.name
                ))
            }
        };
        Ok(Check {
            name: raw.name,
            description: raw.description,
            kind,
        })
    }
}

impl From<Check> for RawCheck {
    fn from(c: Check) -> Self {
        let mut raw = RawCheck {
            name: c.name,
            systemd: None,
            grpc: None,
            dns: None,
            description: c.description,
        };
        match c.kind {
            CheckKind::Systemd(s) => raw.systemd = Some(s),
            CheckKind::Grpc(g) => raw.grpc = Some(g),
            CheckKind::Dns(d) => raw.dns = Some(d),
        }
        raw
    }
}

impl Check {
    pub fn new(name: impl Into<String>, kind: CheckKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn validate(&self, values: ValueRegistry<'_>) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("check name cannot be empty".to_string());
        }
        let mut errs = Vec::new();
        if !names::is_valid_name(&self.name) {
            errs.push(names::name_mismatch("check", &self.name));
        }
        let res = match &self.kind {
            CheckKind::Systemd(s) => s.validate(),
            CheckKind::Grpc(g) => g.validate(),
            CheckKind::Dns(d) => d.validate(values),
        };
        if let Err(e) = res {
            errs.push(format!("check {:?}: {e}", self.name));
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs.join("; "))
        }
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Asserts that a systemd unit is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemdCheck {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

impl SystemdCheck {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            description: String::new(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.unit.is_empty() {
            return Err("unit name cannot be empty".to_string());
        }
        if names::unit_name_too_long(&self.unit) {
            return Err(names::unit_too_long());
        }
        if !names::is_valid_unit_name(&self.unit) {
            return Err(names::unit_mismatch(&self.unit));
        }
        Ok(())
    }
}

/// Resolves the host held in a runtime value with the system resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsCheck {
    /// Name of the value holding the host.
    #[serde(default)]
    pub value: String,
}

impl DnsCheck {
    fn validate(&self, values: ValueRegistry<'_>) -> Result<(), String> {
        if self.value.is_empty() {
            return Err("DNS value must point at a defined value".to_string());
        }
        if !values.contains(&self.value) {
            return Err(format!("DNS value {:?} was not found", self.value));
        }
        Ok(())
    }
}

/// Verifies that a gRPC service answers on a socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrpcCheck {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub socket: String,
}

impl GrpcCheck {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("gRPC name cannot be empty".to_string());
        }
        if !names::is_valid_name(&self.name) {
            return Err(names::name_mismatch("gRPC", &self.name));
        }
        Ok(())
    }
}
