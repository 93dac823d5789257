mod mdns;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use onboard_core::systemd::{Systemctl, UnitManager};
use onboard_core::{Configuration, Pipeline};
use onboard_server::AppState;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Parser)]
#[command(
    name = "onboard",
    about = "Serve a web UI that collects device settings and applies configured actions",
    version
)]
struct Cli {
    /// Configuration documents to load; each is a glob pattern
    #[arg(short = 'c', long = "config", env = "ONBOARD_CONFIG")]
    config: Vec<String>,

    /// Address for the HTTP server; `:PORT` listens on all interfaces
    #[arg(long, env = "ONBOARD_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Device identifier advertised over mDNS
    #[arg(long, env = "ONBOARD_ID", default_value = "")]
    id: String,

    /// IP address advertised over mDNS
    #[arg(long, env = "ONBOARD_IP_ADDRESS", default_value = "10.0.0.1")]
    ip_address: IpAddr,

    /// Interface reported by link status and followed by the log streams
    #[arg(long, env = "ONBOARD_WLAN_INTERFACE", default_value = "wlan0")]
    wlan_interface: String,

    /// Don't advertise the service over mDNS
    #[arg(long, env = "ONBOARD_NO_MDNS")]
    no_mdns: bool,

    #[arg(long, env = "ONBOARD_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[arg(long, env = "ONBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Logfmt)]
    log_format: LogFormat,

    /// Name recorded on every log line
    #[arg(long, env = "ONBOARD_NAME", default_value = "onboard")]
    name: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Logfmt,
    Json,
}

fn init_tracing(level: LogLevel, format: LogFormat) {
    let level: tracing::Level = level.into();
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    match format {
        LogFormat::Logfmt => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.log_format);

    let span = tracing::info_span!("onboard", name = %cli.name);
    if let Err(e) = run(cli, span) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, span: tracing::Span) -> Result<()> {
    let mut config = span.in_scope(|| Configuration::load(cli.config.as_slice()))?;
    config.validate()?;
    tracing::debug!(
        parent: &span,
        actions = config.actions.len(),
        checks = config.checks.len(),
        values = config.values.len(),
        "configuration is valid"
    );

    let units: Arc<dyn UnitManager> = Arc::new(Systemctl::default());
    let pipeline = Pipeline::compile(&config, units.clone())?;
    let state = AppState::new(&config, pipeline, units, cli.wlan_interface.clone())?;
    let listen = normalize_listen(&cli.listen);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(
        async move {
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("failed to listen on {listen}"))?;
            let port = listener.local_addr()?.port();

            let advertiser = if cli.no_mdns {
                None
            } else {
                Some(mdns::Advertiser::start(&cli.id, cli.ip_address, port)?)
            };

            let result = onboard_server::serve_on(listener, state, shutdown_signal()).await;

            if let Some(advertiser) = advertiser {
                advertiser.shutdown();
            }
            tracing::info!("exiting");
            result
        }
        .instrument(span),
    )
}

/// `:PORT` means every interface.
fn normalize_listen(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("caught interrupt");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_port_listens_everywhere() {
        assert_eq!(normalize_listen(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_listen("127.0.0.1:80"), "127.0.0.1:80");
        assert_eq!(normalize_listen("[::1]:80"), "[::1]:80");
    }

    #[test]
    fn flags_default() {
        let cli = Cli::try_parse_from(["onboard"]).unwrap();
        assert!(cli.config.is_empty());
        assert_eq!(cli.listen, "0.0.0.0:8080");
        assert_eq!(cli.ip_address, "10.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(cli.wlan_interface, "wlan0");
        assert_eq!(cli.name, "onboard");
        assert!(!cli.no_mdns);
    }

    #[test]
    fn config_is_repeatable() {
        let cli = Cli::try_parse_from(["onboard", "-c", "a/*.yaml", "--config", "b.yaml"]).unwrap();
        assert_eq!(cli.config, vec!["a/*.yaml", "b.yaml"]);
    }

    #[test]
    fn config_path_with_comma_is_kept_whole() {
        let cli = Cli::try_parse_from(["onboard", "-c", "/etc/onboard/wifi,eth.yaml"]).unwrap();
        assert_eq!(cli.config, vec!["/etc/onboard/wifi,eth.yaml"]);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["onboard", "--log-level", "trace"]).is_err());
    }
}
