use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use onboard_core::RuntimeValues;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/v1/onboard: run every configured action against the submitted
/// values. The body is a JSON object of value name to string.
pub async fn onboard(State(app): State<AppState>, body: Bytes) -> Result<StatusCode, AppError> {
    let Ok(guard) = app.onboarding.clone().try_lock_owned() else {
        tracing::warn!("rejected concurrent onboarding request");
        return Err(AppError::conflict("onboarding already in progress"));
    };

    let values: RuntimeValues = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "failed to unmarshal request");
        AppError::internal(format!("failed to unmarshal request: {e}"))
    })?;

    // The guard moves into the blocking task so the run stays exclusive even
    // if the client goes away and this future is dropped.
    let pipeline = app.pipeline.clone();
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        pipeline.execute(&values)
    })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(|e| {
            tracing::error!(error = %e, "failed to execute action");
            AppError::internal(e.to_string())
        })?;

    Ok(StatusCode::OK)
}
