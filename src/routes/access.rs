//! Guard routes — page access middleware and the guard check endpoint.

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::guard::GuardError;
use crate::navigation::{NavigationRequest, RedirectSlot, RouterStateSnapshot, join_segments};
use crate::registry::normalize_path;
use crate::state::AppState;

/// Result of running the guard table against one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// No guarded route matches the path.
    Unguarded,
    Allowed,
    Denied { redirect: String },
}

/// Serialize the request's cookies back into a `Cookie` header value.
pub(crate) fn cookie_header(jar: &CookieJar) -> Option<String> {
    let pairs: Vec<String> = jar
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect();
    if pairs.is_empty() { None } else { Some(pairs.join("; ")) }
}

/// Match `path` against the guard table and run the matching guard.
///
/// `path` must already be normalized (see [`normalize_path`]).
///
/// # Errors
///
/// Returns the guard's error when the identity fetch fails under
/// [`crate::guard::FailurePolicy::Propagate`].
pub async fn run_guard(
    state: &AppState,
    path: &str,
    url: &str,
    cookie: Option<String>,
) -> Result<GuardOutcome, GuardError> {
    let Some((route, snapshot)) = state.table.match_path(path) else {
        return Ok(GuardOutcome::Unguarded);
    };

    let slot = RedirectSlot::new();
    let guard = state.table.guard_for(
        route,
        state.identity.for_request(cookie),
        Arc::new(slot.clone()),
        state.on_failure,
    );

    let request = NavigationRequest { route: snapshot, state: RouterStateSnapshot::new(url) };
    if guard.can_activate_request(&request).await? {
        return Ok(GuardOutcome::Allowed);
    }

    let redirect = slot
        .target()
        .unwrap_or_else(|| join_segments(guard.redirect_segments()));
    Ok(GuardOutcome::Denied { redirect })
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Page middleware: redirect denied navigations, pass everything else on.
pub async fn require_access(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let Some(path) = normalize_path(request.uri().path()) else {
        tracing::warn!(uri = %request.uri(), "rejecting malformed page path");
        return (StatusCode::BAD_REQUEST, "malformed path").into_response();
    };
    let url = request.uri().to_string();

    match run_guard(&state, &path, &url, cookie_header(&jar)).await {
        Ok(GuardOutcome::Unguarded | GuardOutcome::Allowed) => next.run(request).await,
        Ok(GuardOutcome::Denied { redirect }) => Redirect::temporary(&redirect).into_response(),
        Err(e) => {
            tracing::error!(%path, error = %e, "page guard failed");
            (StatusCode::BAD_GATEWAY, "identity service unavailable").into_response()
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct CheckQuery {
    path: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResponse {
    pub path: String,
    pub allowed: bool,
    pub redirect: Option<String>,
}

/// `GET /api/guard/check?path=/x` — run the guard for `path` without navigating.
pub async fn check(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CheckQuery>,
) -> Response {
    if !params.path.starts_with('/') {
        return (StatusCode::BAD_REQUEST, "path must be absolute").into_response();
    }
    let Some(path) = normalize_path(&params.path) else {
        return (StatusCode::BAD_REQUEST, "malformed path").into_response();
    };

    match run_guard(&state, &path, &params.path, cookie_header(&jar)).await {
        Ok(GuardOutcome::Unguarded | GuardOutcome::Allowed) => {
            Json(CheckResponse { path: params.path, allowed: true, redirect: None }).into_response()
        }
        Ok(GuardOutcome::Denied { redirect }) => {
            Json(CheckResponse { path: params.path, allowed: false, redirect: Some(redirect) }).into_response()
        }
        Err(e) => {
            tracing::error!(path = %params.path, error = %e, "guard check failed");
            (StatusCode::BAD_GATEWAY, "identity service unavailable").into_response()
        }
    }
}
