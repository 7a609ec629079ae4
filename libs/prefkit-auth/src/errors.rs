use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing or invalid token")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let status = match &self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Rejected bearer token");
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Authentication pipeline failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Token details stay in the logs; clients only learn the category.
        let message = match &self {
            AuthError::InvalidToken(_) => AuthError::Unauthenticated.to_string(),
            AuthError::Internal(_) => "Internal error".to_owned(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
