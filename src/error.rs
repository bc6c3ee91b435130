//! Error type shared by every shopfloor layer
//!
//! Services return `ShopResult`; the binary turns errors into a message on
//! stderr and a non-zero exit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    /// Input rejected before anything was written
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A bundle name or single-per-source document that already exists
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// A lifecycle transition that the state machine does not allow
    #[error("{entity_type} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity_type: &'static str,
        from: String,
        to: String,
    },

    /// Document frozen by conversion or by its status
    #[error("Locked: {0}")]
    Locked(String),

    #[error("Public link has expired")]
    LinkExpired,

    /// Public link was revoked by staff or superseded by a newer link
    #[error("Public link has been revoked")]
    LinkRevoked,

    /// Overpayment, or a payment against a paid or void invoice
    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ShopError {
    pub fn estimate_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Estimate",
            identifier: identifier.into(),
        }
    }

    pub fn job_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Job",
            identifier: identifier.into(),
        }
    }

    pub fn item_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Item",
            identifier: identifier.into(),
        }
    }

    pub fn bundle_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bundle",
            identifier: identifier.into(),
        }
    }

    pub fn workorder_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Workorder",
            identifier: identifier.into(),
        }
    }

    pub fn invoice_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Invoice",
            identifier: identifier.into(),
        }
    }

    pub fn link_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Public link",
            identifier: identifier.into(),
        }
    }

    pub fn transition(
        entity_type: &'static str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity_type,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

impl From<std::io::Error> for ShopError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShopError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = ShopError::estimate_not_found("EST-000007");
        assert_eq!(err.to_string(), "Estimate not found: EST-000007");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transition_error() {
        let err = ShopError::transition("Workorder", "completed", "in_progress");
        assert_eq!(
            err.to_string(),
            "Workorder cannot move from 'completed' to 'in_progress'"
        );
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let shop_err: ShopError = io_err.into();
        assert!(matches!(shop_err, ShopError::Io(_)));
    }
}
