use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::AppError;
use crate::state::AppState;

const JOURNALCTL: &str = "journalctl";

/// Arguments for following the journal, restricted by `matchers`.
pub fn journal_args(matchers: &[String]) -> Vec<String> {
    let mut args = vec![
        "--follow".to_string(),
        "--output-fields=MESSAGE".to_string(),
        "--output=json".to_string(),
    ];
    args.extend(matchers.iter().cloned());
    args
}

/// Stream every stdout line of `program` as one SSE `data:` event. The child
/// is killed when the client goes away.
fn follow(
    program: &str,
    args: Vec<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            tracing::error!(program, error = %e, "failed to follow log stream");
            AppError::internal("failed to follow log stream")
        })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::internal("failed to follow log stream"))?;
    let lines = BufReader::new(stdout).lines();

    let stream = futures::stream::unfold((child, lines), |(child, mut lines)| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(Event::default().data(line)), (child, lines))),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "failed to read log stream");
                None
            }
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/log/systemd-networkd: networkd messages for the WLAN interface.
pub async fn systemd_networkd(
    State(app): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    follow(
        JOURNALCTL,
        journal_args(&[
            "SYSLOG_IDENTIFIER=systemd-networkd".to_string(),
            format!("INTERFACE={}", app.wlan_interface),
        ]),
    )
}

/// GET /api/v1/log/wpa_supplicant
pub async fn wpa_supplicant(
    State(app): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    follow(
        JOURNALCTL,
        journal_args(&[format!("SYSLOG_IDENTIFIER=wpa_supplicant@{}", app.wlan_interface)]),
    )
}
