use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::services::outputs::{list_session_outputs, read_bulk_file, read_single_file, OutputListing};
use crate::session::cookie::BrowserSession;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/files", get(list_files))
        .route("/api/files/single/{name}", get(get_single_file))
        .route("/api/files/bulk/{group}/{name}", get(get_bulk_file))
}

async fn list_files(BrowserSession(mut session): BrowserSession) -> Result<Json<OutputListing>, AppError> {
    Ok(Json(list_session_outputs(&mut session).await?))
}

fn audio_response(name: &str, bytes: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        bytes,
    )
        .into_response()
}

async fn get_single_file(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let bytes = read_single_file(&mut session, &name, state.config.max_filename_length).await?;
    Ok(audio_response(&name, bytes))
}

async fn get_bulk_file(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Path((group, name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let bytes = read_bulk_file(&mut session, &group, &name, state.config.max_filename_length).await?;
    Ok(audio_response(&name, bytes))
}
