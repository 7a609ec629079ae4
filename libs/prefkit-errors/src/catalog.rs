//! Static error catalog entries

use http::StatusCode;

use crate::problem::Problem;

/// Base of the `type` URI for catalogued problems.
pub const ERROR_TYPE_BASE: &str = "https://preference-service.dev/errors/";

/// One entry of a module's error catalog: a stable code bound to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: StatusCode,
    pub title: &'static str,
    pub code: &'static str,
}

impl ErrDef {
    #[must_use]
    pub const fn new(status: StatusCode, title: &'static str, code: &'static str) -> Self {
        Self {
            status,
            title,
            code,
        }
    }

    /// Build a Problem for this entry with the given detail
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(self.status, self.title, detail)
            .with_code(self.code)
            .with_type(format!("{ERROR_TYPE_BASE}{}", self.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID_NOT_FOUND: ErrDef =
        ErrDef::new(StatusCode::NOT_FOUND, "Not Found", "PREFERENCES_NOT_FOUND");

    #[test]
    fn catalog_entry_builds_problem() {
        let problem = GRID_NOT_FOUND.as_problem("grid 'TESTGrid' not found");
        assert_eq!(problem.status, StatusCode::NOT_FOUND);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.code, "PREFERENCES_NOT_FOUND");
        assert_eq!(
            problem.type_url,
            "https://preference-service.dev/errors/PREFERENCES_NOT_FOUND"
        );
        assert_eq!(problem.detail, "grid 'TESTGrid' not found");
    }
}
