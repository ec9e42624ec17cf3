use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Request details recorded alongside history entries
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub screen_resolution: String,
    pub session_id: Option<String>,
}

impl ClientContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let ip_address = text("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .or_else(|| text("x-real-ip"));

        let screen_resolution = match (
            text("sec-ch-viewport-width"),
            text("sec-ch-viewport-height"),
        ) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            (Some(w), None) => w,
            _ => "Unknown".to_string(),
        };

        Self {
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            ip_address,
            screen_resolution,
            session_id: text("x-session-id"),
        }
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientContext::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_context_reads_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("sec-ch-viewport-width", HeaderValue::from_static("1440"));
        headers.insert("sec-ch-viewport-height", HeaderValue::from_static("900"));

        let ctx = ClientContext::from_headers(&headers);
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(ctx.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(ctx.screen_resolution, "1440x900");
        assert!(ctx.session_id.is_none());
    }

    #[test]
    fn test_client_context_defaults() {
        let ctx = ClientContext::from_headers(&HeaderMap::new());
        assert!(ctx.user_agent.is_none());
        assert!(ctx.ip_address.is_none());
        assert_eq!(ctx.screen_resolution, "Unknown");
    }
}
