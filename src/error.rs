use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::error;

/// HTTP-mapped error categories surfaced to the client. Nothing is retried
/// or recovered internally; every variant goes straight out as JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not Found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!(error = %err, "internal error");
        ApiError::Internal("Internal server error".into())
    }
}

/// Wire format of every error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: &'static str,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            status_code: status.as_u16(),
            error: self.kind(),
            message: self.to_string(),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            path: None,
        };
        let mut res = (status, Json(body.clone())).into_response();
        // Stashed so the middleware below can stamp the request path in.
        res.extensions_mut().insert(body);
        res
    }
}

/// Response-mapping middleware: errors are built without request context, so
/// the path is filled in here before the body leaves the server.
pub async fn stamp_error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;
    if let Some(body) = res.extensions_mut().remove::<ErrorBody>() {
        let status = res.status();
        let body = ErrorBody {
            path: Some(path),
            ..body
        };
        return (status, Json(body)).into_response();
    }
    res
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            // 23505 = postgres unique_violation; the only constraint we rely
            // on is the unique email index.
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Conflict("Email already registered".into());
            }
        }
        ApiError::internal(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_status_message_and_timestamp() {
        let err = ApiError::Conflict("Email already registered".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let body = ErrorBody {
            status_code: 409,
            error: "Conflict",
            message: err.to_string(),
            timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap(),
            path: Some("/api/v1/auth/signup".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["statusCode"], 409);
        assert_eq!(json["error"], "Conflict");
        assert_eq!(json["message"], "Email already registered");
        assert_eq!(json["path"], "/api/v1/auth/signup");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn path_is_omitted_until_stamped() {
        let body = ErrorBody {
            status_code: 401,
            error: "Unauthorized",
            message: "Invalid credentials".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            path: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("path"));
    }

    #[test]
    fn internal_hides_the_underlying_cause() {
        let err = ApiError::internal("connection refused (db password: hunter2)");
        assert_eq!(err.to_string(), "Internal server error");
    }
}
