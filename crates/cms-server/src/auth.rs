//! Bearer-token guard for admin routes.
//!
//! When no admin token is configured the guard lets every request through
//! and access is left to the deployment (a private network or a proxy in
//! front of the CMS).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct AdminGuard {
    token: Option<Arc<str>>,
}

impl AdminGuard {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }

    pub fn is_enforced(&self) -> bool {
        self.token.is_some()
    }

    fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.token, presented) {
            (None, _) => true,
            (Some(expected), Some(token)) => constant_time_eq(expected.as_bytes(), token.as_bytes()),
            (Some(_), None) => false,
        }
    }
}

/// Reject requests without the configured bearer token.
pub async fn require_admin(
    State(guard): State<AdminGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = extract_bearer(&request);

    if !guard.accepts(presented) {
        tracing::warn!(
            path = %request.uri().path(),
            token_present = presented.is_some(),
            "Rejected admin request"
        );
        return Err(AppError::Auth("missing or invalid admin token".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(guard: AdminGuard) -> Router {
        Router::new()
            .route("/api/leads", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(guard, require_admin))
    }

    fn request(auth: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/api/leads");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_open_when_no_token_configured() {
        let guard = AdminGuard::new(None);
        assert!(!guard.is_enforced());
        let response = app(guard).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_requires_matching_bearer() {
        let guard = AdminGuard::new(Some("s3cret"));

        let missing = app(guard.clone()).oneshot(request(None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app(guard.clone())
            .oneshot(request(Some("Bearer nope")))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let ok = app(guard).oneshot(request(Some("Bearer s3cret"))).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
