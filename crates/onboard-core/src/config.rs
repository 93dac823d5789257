use crate::action::Action;
use crate::check::Check;
use crate::error::{OnboardError, Result};
use crate::value::{Value, ValueRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Configuration (top-level)
// ---------------------------------------------------------------------------

/// Every action, check and value known to the process, merged from one or
/// more documents. Order is declaration order and is the order in which
/// actions execute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Configuration {
    /// Parse one document. An empty document yields an empty configuration.
    pub fn parse(yaml: &str) -> Result<Self> {
        let cfg: Option<Configuration> = serde_yaml::from_str(yaml)?;
        Ok(cfg.unwrap_or_default())
    }

    /// Append `other` after the entries already present.
    pub fn merge(&mut self, other: Configuration) {
        self.actions.extend(other.actions);
        self.checks.extend(other.checks);
        self.values.extend(other.values);
    }

    /// Expand each glob pattern, order all matches by file name and
    /// concatenate the documents. The result is not validated.
    pub fn load<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut cfg = Configuration::default();
        for path in expand(patterns)? {
            let data = std::fs::read_to_string(&path).map_err(|source| OnboardError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
            let doc: Option<Configuration> =
                serde_yaml::from_str(&data).map_err(|source| OnboardError::ParseFile {
                    path: path.display().to_string(),
                    source,
                })?;
            if let Some(doc) = doc {
                tracing::debug!(
                    path = %path.display(),
                    actions = doc.actions.len(),
                    checks = doc.checks.len(),
                    values = doc.values.len(),
                    "loaded configuration document"
                );
                cfg.merge(doc);
            }
        }
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Validate actions, then checks, then values, collecting every problem.
    ///
    /// Successful validation also caches compiled file templates on their
    /// actions.
    pub fn validate(&mut self) -> Result<()> {
        let mut errs = Vec::new();
        let values = ValueRegistry::new(&self.values);

        let mut seen = HashSet::new();
        for action in &mut self.actions {
            if let Err(e) = action.validate(values) {
                errs.push(e);
            }
            if !seen.insert(action.name.clone()) {
                errs.push(format!("action {:?} appears more than once", action.name));
            }
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            if let Err(e) = check.validate(values) {
                errs.push(e);
            }
            if !seen.insert(check.name.as_str()) {
                errs.push(format!("check {:?} appears more than once", check.name));
            }
        }

        let mut seen = HashSet::new();
        for value in &self.values {
            if let Err(e) = value.validate() {
                errs.push(e);
            }
            if !seen.insert(value.name.as_str()) {
                errs.push(format!("value {:?} appears more than once", value.name));
            }
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(OnboardError::Validation(errs))
        }
    }
}

fn expand<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let matches = glob::glob(pattern).map_err(|e| OnboardError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        for entry in matches {
            let path = entry.map_err(|e| OnboardError::ReadFile {
                path: e.path().display().to_string(),
                source: std::io::Error::new(e.error().kind(), e.error().to_string()),
            })?;
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| base_name(a).cmp(base_name(b)));
    Ok(paths)
}

fn base_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, FileAction, SystemdAction};
    use crate::check::{CheckKind, DnsCheck};
    use crate::systemd::SystemdCommand;
    use tempfile::TempDir;

    fn messages(err: OnboardError) -> Vec<String> {
        match err {
            OnboardError::Validation(msgs) => msgs,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_full_document() {
        let yaml = r#"
values:
  - name: wifi_password
    description: WPA passphrase
    secret: true
actions:
  - name: write-psk
    file:
      path: /etc/wpa.conf
      value: wifi_password
  - name: restart-wpa
    systemd:
      unit: wpa_supplicant@wlan0.service
      command: restart
checks:
  - name: wpa
    systemd:
      unit: wpa_supplicant@wlan0.service
"#;
        let mut cfg = Configuration::parse(yaml).unwrap();
        assert_eq!(cfg.actions.len(), 2);
        assert_eq!(cfg.checks.len(), 1);
        assert!(cfg.values[0].secret);
        cfg.validate().unwrap();
    }

    #[test]
    fn parse_empty_and_partial_documents() {
        let cfg = Configuration::parse("").unwrap();
        assert!(cfg.actions.is_empty() && cfg.checks.is_empty() && cfg.values.is_empty());

        let cfg = Configuration::parse("# only a comment\n").unwrap();
        assert!(cfg.values.is_empty());

        let cfg = Configuration::parse("values:\n  - name: a\n").unwrap();
        assert_eq!(cfg.values.len(), 1);
        assert!(cfg.actions.is_empty());
    }

    #[test]
    fn empty_configuration_is_valid() {
        Configuration::default().validate().unwrap();
    }

    #[test]
    fn duplicates_reported_per_kind() {
        let mut cfg = Configuration::default();
        cfg.values = vec![Value::new("a"), Value::new("a")];
        cfg.actions = vec![
            Action::file("w", FileAction::from_value("/x", "a")),
            Action::file("w", FileAction::from_value("/y", "a")),
        ];
        let msgs = messages(cfg.validate().unwrap_err());
        assert!(msgs.contains(&"action \"w\" appears more than once".to_string()));
        assert!(msgs.contains(&"value \"a\" appears more than once".to_string()));
    }

    #[test]
    fn validation_accumulates_unrelated_errors() {
        let mut cfg = Configuration::default();
        cfg.values = vec![Value::new("a"), Value::new("a"), Value::new("1bad")];
        cfg.actions = vec![
            Action::file("missing-ref", FileAction::from_value("/x", "nope")),
            Action::systemd(
                "bad-unit",
                SystemdAction {
                    unit: "bogus".into(),
                    command: "explode".into(),
                },
            ),
        ];
        cfg.checks = vec![Check::new(
            "dns",
            CheckKind::Dns(DnsCheck {
                value: "ghost".into(),
            }),
        )];
        let err = cfg.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("configuration contains validation errors: "));
        let msgs = messages(err);
        assert!(msgs.iter().any(|m| m.contains("file value \"nope\" was not found")));
        assert!(msgs.iter().any(|m| m.contains("unit name \"bogus\"")));
        assert!(msgs.iter().any(|m| m.contains("systemd command must be one of")));
        assert!(msgs.iter().any(|m| m.contains("DNS value \"ghost\" was not found")));
        assert!(msgs.iter().any(|m| m.contains("value name \"1bad\"")));
        assert!(msgs.iter().any(|m| m == "value \"a\" appears more than once"));
    }

    #[test]
    fn errors_follow_actions_checks_values_order() {
        let mut cfg = Configuration::default();
        cfg.values = vec![Value::new("-v")];
        cfg.checks = vec![Check::new(
            "-c",
            CheckKind::Dns(DnsCheck { value: "-v".into() }),
        )];
        cfg.actions = vec![Action::file("-a", FileAction::from_value("/x", "-v"))];
        let msgs = messages(cfg.validate().unwrap_err());
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].starts_with("action name"));
        assert!(msgs[1].starts_with("check name"));
        assert!(msgs[2].starts_with("value name"));
    }

    #[test]
    fn adding_the_value_fixes_the_reference() {
        let mut cfg = Configuration::default();
        cfg.actions = vec![Action::file("w", FileAction::from_value("/x", "psk"))];
        assert!(cfg.validate().is_err());
        cfg.values.push(Value::new("psk"));
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_caches_templates() {
        let mut cfg = Configuration::default();
        cfg.actions = vec![Action::file("t", FileAction::from_template("/x", "user={{.username}}"))];
        cfg.validate().unwrap();
        match &cfg.actions[0].kind {
            ActionKind::File(f) => assert!(f.is_compiled()),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn template_parse_error_is_reported() {
        let mut cfg = Configuration::default();
        cfg.actions = vec![Action::file("t", FileAction::from_template("/x", "{{.a"))];
        let msgs = messages(cfg.validate().unwrap_err());
        assert!(msgs[0].contains("failed to parse template"));
    }

    #[test]
    fn systemd_commands_all_valid() {
        for c in SystemdCommand::all() {
            let mut cfg = Configuration::default();
            cfg.actions = vec![Action::systemd("s", SystemdAction::new("sshd.service", *c))];
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn load_orders_by_file_name() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(b.join("10-first.yaml"), "values:\n  - name: first\n").unwrap();
        std::fs::write(a.join("20-second.yaml"), "values:\n  - name: second\n").unwrap();

        // Pattern order and directory order must not matter.
        let patterns = vec![
            format!("{}/*.yaml", a.display()),
            format!("{}/*.yaml", b.display()),
        ];
        let cfg = Configuration::load(&patterns).unwrap();
        let names: Vec<_> = cfg.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn load_duplicate_across_files_any_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.yaml"), "values:\n  - name: a\n").unwrap();
        std::fs::write(dir.path().join("y.yaml"), "values:\n  - name: a\n").unwrap();

        for patterns in [
            vec![dir.path().join("x.yaml"), dir.path().join("y.yaml")],
            vec![dir.path().join("y.yaml"), dir.path().join("x.yaml")],
        ] {
            let patterns: Vec<String> = patterns.iter().map(|p| p.display().to_string()).collect();
            let mut cfg = Configuration::load(&patterns).unwrap();
            let msgs = messages(cfg.validate().unwrap_err());
            assert_eq!(msgs, vec!["value \"a\" appears more than once".to_string()]);
        }
    }

    #[test]
    fn load_cross_file_references() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("01-actions.yaml"),
            "actions:\n  - name: w\n    file:\n      path: /x\n      value: psk\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("02-values.yaml"), "values:\n  - name: psk\n").unwrap();
        let mut cfg = Configuration::load(&[format!("{}/*.yaml", dir.path().display())]).unwrap();
        cfg.validate().unwrap();
    }

    #[test]
    fn load_names_broken_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "actions: [").unwrap();
        let err = Configuration::load(&[path.display().to_string()]).unwrap_err();
        assert!(matches!(err, OnboardError::ParseFile { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn load_rejects_bad_pattern() {
        let err = Configuration::load(&["[unterminated"]).unwrap_err();
        assert!(matches!(err, OnboardError::InvalidPattern { .. }));
    }

    #[test]
    fn load_without_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        let cfg = Configuration::load(&[format!("{}/*.yaml", dir.path().display())]).unwrap();
        assert!(cfg.actions.is_empty());
    }

    #[test]
    fn serializes_for_frontend() {
        let cfg = Configuration::parse(
            "values:\n  - name: psk\n    secret: true\nactions:\n  - name: w\n    file:\n      path: /x\n      value: psk\n",
        )
        .unwrap();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["values"][0]["secret"], true);
        assert_eq!(json["actions"][0]["file"]["value"], "psk");
        assert!(json["checks"].as_array().unwrap().is_empty());
    }
}
