use onboard_core::systemd::UnitManager;
use onboard_core::{Configuration, Pipeline};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub units: Arc<dyn UnitManager>,
    pub wlan_interface: String,
    /// The configuration as JSON, injected into the frontend shell.
    pub configuration: Arc<String>,
    /// Paths answered with the frontend shell.
    pub frontend_routes: Arc<HashSet<String>>,
    /// Held for the duration of an onboarding run.
    pub onboarding: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: &Configuration,
        pipeline: Pipeline,
        units: Arc<dyn UnitManager>,
        wlan_interface: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let mut routes: HashSet<String> = ["/", "/submit"].iter().map(|s| s.to_string()).collect();
        routes.extend(config.values.iter().map(|v| format!("/{}", v.name)));
        Ok(Self {
            pipeline: Arc::new(pipeline),
            units,
            wlan_interface: wlan_interface.into(),
            configuration: Arc::new(serde_json::to_string(config)?),
            frontend_routes: Arc::new(routes),
            onboarding: Arc::new(Mutex::new(())),
        })
    }

    pub fn is_frontend_route(&self, path: &str) -> bool {
        self.frontend_routes.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_core::systemd::Systemctl;
    use onboard_core::value::Value;

    #[test]
    fn frontend_routes_include_values() {
        let mut cfg = Configuration::default();
        cfg.values = vec![Value::new("ssid"), Value::new("psk")];
        let state =
            AppState::new(&cfg, Pipeline::default(), Arc::new(Systemctl::default()), "wlan0").unwrap();
        assert!(state.is_frontend_route("/"));
        assert!(state.is_frontend_route("/submit"));
        assert!(state.is_frontend_route("/ssid"));
        assert!(state.is_frontend_route("/psk"));
        assert!(!state.is_frontend_route("/main.js"));
        assert!(state.configuration.contains("\"ssid\""));
    }
}
