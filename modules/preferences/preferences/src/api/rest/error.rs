use axum::http::StatusCode;
use prefkit_errors::{ErrDef, Problem};

use crate::domain::error::DomainError;

pub const VALIDATION: ErrDef =
    ErrDef::new(StatusCode::BAD_REQUEST, "Bad Request", "PREFERENCES_VALIDATION");
pub const MALFORMED: ErrDef =
    ErrDef::new(StatusCode::BAD_REQUEST, "Bad Request", "PREFERENCES_MALFORMED_DOCUMENT");
pub const UNAUTHENTICATED: ErrDef =
    ErrDef::new(StatusCode::UNAUTHORIZED, "Unauthorized", "PREFERENCES_UNAUTHENTICATED");
pub const FORBIDDEN: ErrDef =
    ErrDef::new(StatusCode::FORBIDDEN, "Forbidden", "PREFERENCES_FORBIDDEN");
pub const NOT_FOUND: ErrDef =
    ErrDef::new(StatusCode::NOT_FOUND, "Not Found", "PREFERENCES_NOT_FOUND");
pub const STORE_UNAVAILABLE: ErrDef = ErrDef::new(
    StatusCode::SERVICE_UNAVAILABLE,
    "Service Unavailable",
    "PREFERENCES_STORE_UNAVAILABLE",
);
pub const INTERNAL: ErrDef = ErrDef::new(
    StatusCode::INTERNAL_SERVER_ERROR,
    "Internal Server Error",
    "PREFERENCES_INTERNAL",
);

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let trace_id = tracing::Span::current()
            .id()
            .map(|id| id.into_u64().to_string());

        let problem = match e {
            DomainError::Validation { field, message } => VALIDATION
                .as_problem(format!("Validation error on '{field}': {message}"))
                .with_violation(field, message),
            DomainError::Deserialization(message) => MALFORMED.as_problem(message),
            DomainError::NotFound { entity, key } => {
                NOT_FOUND.as_problem(format!("{entity} '{key}' not found"))
            }
            DomainError::Unauthenticated => UNAUTHENTICATED.as_problem("Authentication required"),
            DomainError::Forbidden(reason) => {
                tracing::debug!(reason = %reason, "Request forbidden");
                FORBIDDEN.as_problem("Access denied")
            }
            DomainError::StoreUnavailable(message) => {
                tracing::error!(error = %message, "Preference store unavailable");
                STORE_UNAVAILABLE.as_problem("The preference store is temporarily unavailable")
            }
            DomainError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                INTERNAL.as_problem("An internal error occurred")
            }
        };

        match trace_id {
            Some(id) => problem.with_trace_id(id),
            None => problem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_names_the_field() {
        let p = Problem::from(DomainError::validation("prefName", "must not be blank"));
        assert_eq!(p.status, StatusCode::BAD_REQUEST);
        assert_eq!(p.code, "PREFERENCES_VALIDATION");
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].field, "prefName");
        assert_eq!(
            p.type_url,
            "https://preference-service.dev/errors/PREFERENCES_VALIDATION"
        );
    }

    #[test]
    fn store_details_are_not_returned() {
        let p = Problem::from(DomainError::StoreUnavailable(
            "connection refused at 10.0.0.7:5432".to_owned(),
        ));
        assert_eq!(p.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!p.detail.contains("10.0.0.7"));

        let p = Problem::from(DomainError::Internal("bad udf json".to_owned()));
        assert_eq!(p.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!p.detail.contains("udf"));
    }

    #[test]
    fn forbidden_reason_is_not_returned() {
        let p = Problem::from(DomainError::forbidden("missing scope cartera.read"));
        assert_eq!(p.status, StatusCode::FORBIDDEN);
        assert!(!p.detail.contains("cartera"));
    }

    #[test]
    fn not_found_and_unauthenticated() {
        let p = Problem::from(DomainError::not_found("grid", "TESTGrid"));
        assert_eq!(p.status, StatusCode::NOT_FOUND);
        assert_eq!(p.detail, "grid 'TESTGrid' not found");

        let p = Problem::from(DomainError::Unauthenticated);
        assert_eq!(p.status, StatusCode::UNAUTHORIZED);
    }
}
