//! Input validation for declared identity fields.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Full path of an LTM object: `/Partition/Name`.
static F5_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[A-Za-z0-9_\-.]+/[A-Za-z0-9_\-.:]+$").expect("F5 name pattern is valid")
});

/// Validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error(
        "{field} {value:?} must match /Partition/Name and contain letters, numbers or [._-:]. e.g. /Common/my-pool"
    )]
    InvalidName { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Validate a partition-qualified object name.
pub fn validate_f5_name(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if !F5_NAME.is_match(value) {
        return Err(ValidationError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Reject empty values for required fields.
pub fn validate_required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_f5_name() {
        assert!(validate_f5_name("name", "/Common/node1").is_ok());
        assert!(validate_f5_name("name", "/Tenant_A/web-01.example").is_ok());
        assert!(validate_f5_name("name", "/Common/10.0.0.5:80").is_ok());

        assert_eq!(
            validate_f5_name("name", ""),
            Err(ValidationError::Required { field: "name" })
        );
        assert!(validate_f5_name("name", "node1").is_err());
        assert!(validate_f5_name("name", "/Common/").is_err());
        assert!(validate_f5_name("name", "/Common/a/b").is_err());
        assert!(validate_f5_name("name", "/Common/has space").is_err());
        // Word characters are ASCII only.
        assert!(validate_f5_name("name", "/Common/nöde").is_err());
        assert!(validate_f5_name("name", "/Cömmon/node").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("address", "10.0.0.1").is_ok());
        assert_eq!(
            validate_required("address", "  "),
            Err(ValidationError::Required { field: "address" })
        );
    }
}
