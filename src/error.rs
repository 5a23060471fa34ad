use std::fmt;

use anyhow::anyhow;

use crate::builder::TreeBuildViolation;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Database,
    EmptyInput,
    InvalidInput,
    NotFound,
    OrderingViolation,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub violation: Option<TreeBuildViolation>,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn database(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Database,
            code: "database_error",
            public,
            violation: None,
            source,
        }
    }

    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            violation: None,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            violation: None,
            source,
        }
    }

    /// Wraps a builder rejection, keeping the structured violation for callers
    /// that want the offending row.
    pub fn tree_violation(violation: TreeBuildViolation) -> Self {
        let kind = match violation {
            TreeBuildViolation::EmptyInput => ErrorKind::EmptyInput,
            TreeBuildViolation::OrderingViolation { .. } => ErrorKind::OrderingViolation,
        };
        Self {
            kind,
            code: violation.error_code(),
            public: violation.public_message(),
            source: anyhow!("category tree build failed: {:?}", violation),
            violation: Some(violation),
        }
    }
}

impl fmt::Display for LibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.public, self.code, self.source)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl From<TreeBuildViolation> for LibError {
    fn from(value: TreeBuildViolation) -> Self {
        Self::tree_violation(value)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for LibError {
    fn from(value: sqlx::Error) -> Self {
        Self::database("Database request failed", anyhow!(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryId;

    #[test]
    fn tree_violation_maps_kind_and_code() {
        let err = LibError::from(TreeBuildViolation::OrderingViolation {
            row_index: 1,
            category_id: CategoryId(2),
            parent_id: Some(CategoryId(7)),
        });
        assert_eq!(err.kind, ErrorKind::OrderingViolation);
        assert_eq!(err.code, "category_tree_ordering_violation");
        assert!(err.violation.is_some());

        let err = LibError::from(TreeBuildViolation::EmptyInput);
        assert_eq!(err.kind, ErrorKind::EmptyInput);
        assert_eq!(err.code, "category_tree_empty");
    }

    #[test]
    fn constructors_cover_every_kind() {
        let errors = [
            LibError::database("db", anyhow!("db")),
            LibError::invalid("invalid", anyhow!("invalid")),
            LibError::not_found("missing", anyhow!("missing")),
            LibError::from(TreeBuildViolation::EmptyInput),
            LibError::from(TreeBuildViolation::OrderingViolation {
                row_index: 1,
                category_id: CategoryId(2),
                parent_id: None,
            }),
        ];
        for err in &errors {
            let expected = match err.kind {
                ErrorKind::Database => "database_error",
                ErrorKind::InvalidInput => "invalid_input",
                ErrorKind::NotFound => "not_found",
                ErrorKind::EmptyInput => "category_tree_empty",
                ErrorKind::OrderingViolation => "category_tree_ordering_violation",
            };
            assert_eq!(err.code, expected);
        }
    }

    #[test]
    fn display_includes_public_message_and_code() {
        let err = LibError::invalid("Depth must be non-negative", anyhow!("depth -1"));
        let rendered = err.to_string();
        assert!(rendered.contains("Depth must be non-negative"));
        assert!(rendered.contains("invalid_input"));
    }
}
