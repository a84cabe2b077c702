use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::session::{SessionContext, SessionId};
use crate::AppState;

pub const SESSION_COOKIE: &str = "eleventools_session";

/// Paths served without a session, such as load-balancer probes.
const SESSIONLESS_PATHS: [&str; 1] = ["/health"];

/// Attach a [`SessionContext`] to every request except [`SESSIONLESS_PATHS`].
///
/// A valid id in the cookie resumes that session; otherwise a new id is
/// minted and sent back with `Set-Cookie`.
pub async fn ensure_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if SESSIONLESS_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let jar = CookieJar::from_headers(req.headers());
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()));

    let mut context = match existing {
        Some(id) => SessionContext::resume(state.outputs.clone(), id),
        None => SessionContext::new(state.outputs.clone()),
    };
    let session_id = context.session_id();
    state.sessions.touch(session_id);
    req.extensions_mut().insert(context);

    let mut response = next.run(req).await;

    if existing.is_none() {
        let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Could not encode session cookie: {}", e),
        }
    }

    response
}

/// The current request's session, placed there by [`ensure_session`].
pub struct BrowserSession(pub SessionContext);

impl<S> FromRequestParts<S> for BrowserSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(BrowserSession)
            .ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "Session middleware not installed"})),
                )
            })
    }
}
