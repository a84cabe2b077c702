pub mod bulk;
pub mod files;
pub mod health;
pub mod script;
pub mod settings;
pub mod speech;
pub mod template;
pub mod voices;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::services::bulk::upload_too_large;
use crate::session::cookie::ensure_session;
use crate::AppState;

/// Headroom over the CSV limit for multipart framing and form fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let is_wildcard = origins.len() == 1 && origins[0] == "*";
    if is_wildcard {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any())
    } else {
        let origins: Vec<axum::http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        // Credentials cannot be combined with wildcard methods or headers.
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

/// Replace the body-limit layer's plain-text 413 with the upload size error.
async fn oversized_upload_as_json(
    State(max_upload): State<usize>,
    req: Request,
    next: Next,
) -> Response {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    let response = next.run(req).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }
    upload_too_large(declared, max_upload).into_response()
}

pub fn create_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_size;
    let body_limit = max_upload.saturating_add(MULTIPART_OVERHEAD);
    let cors = cors_layer(&state.config.cors_origins());

    Router::new()
        .merge(health::router())
        .merge(template::router())
        .merge(speech::router())
        .merge(bulk::router())
        .merge(files::router())
        .merge(script::router())
        .merge(voices::router())
        .merge(settings::router())
        .layer(middleware::from_fn_with_state(state.clone(), ensure_session))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::from_fn_with_state(max_upload, oversized_upload_as_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
