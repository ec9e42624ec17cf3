use crate::core::error::AppError;
use crate::features::auth::AuthService;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Legacy header some clients still send the token in
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(encoded) = auth_header.and_then(|h| h.strip_prefix("Basic ")) {
                let decoded = BASE64_STANDARD
                    .decode(encoded)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok());
                if decoded.as_deref() == Some(credentials.as_str()) {
                    return Ok(next.run(req).await);
                }
            }

            Err((
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
                "Unauthorized",
            )
                .into_response())
        })
    }
}

/// Pull the raw token out of `Authorization: Bearer` or the legacy header
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    if let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        return auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Invalid authorization header format".to_string())
            });
    }

    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))
}

/// Resolves the bearer token to the account's current identity.
/// Blocked accounts get 403 and deleted ones 401, whatever the token says.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;
    let user = auth.authenticate(token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_token_falls_back_to_legacy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(extract_token(&headers).unwrap(), "legacy");
    }

    #[test]
    fn test_extract_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic Zm9vOmJhcg=="),
        );
        assert!(matches!(
            extract_token(&headers),
            Err(AppError::Unauthorized(_))
        ));
        assert!(extract_token(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_basic_auth_guards_swagger() {
        use axum::{body::Body, middleware::from_fn, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/swagger-ui", get(|| async { "docs" }))
            .layer(from_fn(basic_auth_middleware(Arc::new(
                "admin:secret".to_string(),
            ))));

        let denied = app
            .clone()
            .oneshot(Request::builder().uri("/swagger-ui").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert!(denied.headers().contains_key(header::WWW_AUTHENTICATE));

        let encoded = BASE64_STANDARD.encode("admin:secret");
        let allowed = app
            .oneshot(
                Request::builder()
                    .uri("/swagger-ui")
                    .header(header::AUTHORIZATION, format!("Basic {}", encoded))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
    }
}
