//! Minimal error pages that guard redirects land on.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// `GET /error/{code}` — plain page carrying the given status.
pub async fn error_page(Path(code): Path<u16>) -> Response {
    let Some(status) = StatusCode::from_u16(code)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let reason = status.canonical_reason().unwrap_or("Error");
    let page = format!("<!doctype html><title>{code} {reason}</title><h1>{code}</h1><p>{reason}</p>");
    (status, Html(page)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unauthorized_page_has_401_status() {
        let resp = error_page(Path(401)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn non_error_code_is_not_found() {
        assert_eq!(error_page(Path(200)).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_page(Path(302)).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_code_is_not_found() {
        assert_eq!(error_page(Path(1000)).await.status(), StatusCode::NOT_FOUND);
    }
}
