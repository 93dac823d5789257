use crate::names;
use serde::{Deserialize, Serialize};

/// An input the operator supplies at onboarding time.
///
/// Values are made available to file templates and may be copied verbatim
/// into files by value-mode file actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Sensitive inputs are masked by the frontend. They are never logged.
    #[serde(default)]
    pub secret: bool,
}

impl Value {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            secret: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("value name cannot be empty".to_string());
        }
        if !names::is_valid_name(&self.name) {
            return Err(names::name_mismatch("value", &self.name));
        }
        Ok(())
    }
}

/// Read-only view over the values declared in a configuration, used to
/// resolve references from file actions and DNS checks.
#[derive(Debug, Clone, Copy)]
pub struct ValueRegistry<'a> {
    values: &'a [Value],
}

impl<'a> ValueRegistry<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_defaults_from_yaml() {
        let v: Value = serde_yaml::from_str("name: ssid\n").unwrap();
        assert_eq!(v.name, "ssid");
        assert!(v.description.is_empty());
        assert!(!v.secret);
    }

    #[test]
    fn validate_rejects_empty_and_malformed_names() {
        assert!(Value::new("").validate().unwrap_err().contains("cannot be empty"));
        let err = Value::new("9lives").validate().unwrap_err();
        assert!(err.contains("does not match format"));
        assert!(Value::new("wifi_password").validate().is_ok());
    }

    #[test]
    fn registry_lookup() {
        let values = vec![Value::new("ssid"), Value::new("psk")];
        let reg = ValueRegistry::new(&values);
        assert!(reg.contains("psk"));
        assert!(!reg.contains("username"));
    }
}
