//! Process-level access to systemd.

use crate::error::{OnboardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemdCommand {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl SystemdCommand {
    pub fn all() -> &'static [SystemdCommand] {
        &[
            SystemdCommand::Start,
            SystemdCommand::Stop,
            SystemdCommand::Restart,
            SystemdCommand::Enable,
            SystemdCommand::Disable,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemdCommand::Start => "start",
            SystemdCommand::Stop => "stop",
            SystemdCommand::Restart => "restart",
            SystemdCommand::Enable => "enable",
            SystemdCommand::Disable => "disable",
        }
    }

    /// Comma separated list of every command, for error messages.
    pub fn valid_list() -> String {
        Self::all()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for SystemdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemdCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("systemd command must be one of: {}", Self::valid_list()))
    }
}

/// The `Result` and `SubState` properties of a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatus {
    pub result: String,
    pub sub_state: String,
}

impl UnitStatus {
    /// Parse `systemctl show` output. Lines that are not `key=value` are skipped.
    pub fn parse(output: &str) -> Self {
        let mut status = UnitStatus::default();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('=').collect();
            if parts.len() != 2 {
                continue;
            }
            match parts[0] {
                "Result" => status.result = parts[1].to_string(),
                "SubState" => status.sub_state = parts[1].to_string(),
                _ => {}
            }
        }
        status
    }
}

/// Operations on systemd units.
pub trait UnitManager: Send + Sync {
    fn run(&self, command: SystemdCommand, unit: &str) -> Result<()>;

    fn show(&self, unit: &str) -> Result<UnitStatus>;
}

/// [`UnitManager`] backed by the `systemctl` binary.
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: PathBuf,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new("systemctl")
    }
}

impl Systemctl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn output(&self, args: &[&str]) -> Result<String> {
        let program = self.program.display().to_string();
        tracing::debug!(program = %program, args = ?args, "running command");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| OnboardError::CommandSpawn {
                program: program.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(OnboardError::CommandFailed {
                program,
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl UnitManager for Systemctl {
    fn run(&self, command: SystemdCommand, unit: &str) -> Result<()> {
        self.output(&[command.as_str(), unit]).map(|_| ())
    }

    fn show(&self, unit: &str) -> Result<UnitStatus> {
        let out = self.output(&[
            "show",
            unit,
            "--property",
            "Result",
            "--property",
            "SubState",
        ])?;
        Ok(UnitStatus::parse(&out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_from_str() {
        for c in SystemdCommand::all() {
            assert_eq!(c.as_str().parse::<SystemdCommand>().unwrap(), *c);
        }
        let err = "reload".parse::<SystemdCommand>().unwrap_err();
        assert_eq!(
            err,
            "systemd command must be one of: start,stop,restart,enable,disable"
        );
    }

    #[test]
    fn parse_show_output() {
        let out = "Result=success\nSubState=dead\n";
        let s = UnitStatus::parse(out);
        assert_eq!(s.result, "success");
        assert_eq!(s.sub_state, "dead");
    }

    #[test]
    fn parse_show_skips_noise() {
        let out = "\n  Result=failed  \nbogus\nA=b=c\nId=x.service\nSubState=start\n";
        let s = UnitStatus::parse(out);
        assert_eq!(s.result, "failed");
        assert_eq!(s.sub_state, "start");
    }

    #[test]
    fn unit_status_json_shape() {
        let s = UnitStatus {
            result: "success".into(),
            sub_state: "start".into(),
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["result"], "success");
        assert_eq!(json["subState"], "start");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let m = Systemctl::new("/nonexistent/systemctl-for-tests");
        let err = m.run(SystemdCommand::Start, "sshd.service").unwrap_err();
        assert!(matches!(err, OnboardError::CommandSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let m = Systemctl::new("false");
        let err = m.run(SystemdCommand::Restart, "sshd.service").unwrap_err();
        assert!(matches!(err, OnboardError::CommandFailed { .. }));
    }
}
