use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/static/"]
struct FrontendAssets;

const CONFIG_PLACEHOLDER: &str = "configuration={}";

/// Serve the frontend shell on known routes and embedded assets elsewhere.
pub async fn static_handler(State(app): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    if app.is_frontend_route(path) {
        return index(&app);
    }

    let path = path.trim_start_matches('/');
    match <FrontendAssets as Embed>::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => AppError::not_found(format!("{} not found", uri.path())).into_response(),
    }
}

fn index(app: &AppState) -> Response {
    let Some(content) = <FrontendAssets as Embed>::get("index.html") else {
        return AppError::not_found("frontend not built").into_response();
    };
    let html = String::from_utf8_lossy(&content.data);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        inject_configuration(&html, &app.configuration),
    )
        .into_response()
}

/// Replace the first configuration placeholder with `json`.
pub fn inject_configuration(html: &str, json: &str) -> String {
    // `</` would close the surrounding script element.
    let json = json.replace("</", "<\\/");
    html.replacen(CONFIG_PLACEHOLDER, &format!("configuration={json}"), 1)
}
