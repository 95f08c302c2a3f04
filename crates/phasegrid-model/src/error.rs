//! Error types for the phase graph compiler.

use std::fmt;

use thiserror::Error;

/// Result type alias for compiler operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Entity a missing reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Service,
    InfrastructureDefinition,
    Phase,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Service => "Service",
            ReferenceKind::InfrastructureDefinition => "Infrastructure Definition",
            ReferenceKind::Phase => "Workflow Phase",
        })
    }
}

/// Failure reported by a catalog or feature-flag collaborator.
#[derive(Debug, Error)]
#[error("catalog lookup failed: {0}")]
pub struct CatalogError(pub String);

/// Errors that abort a compile or update call. Nothing is partially applied.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A phase step or step name breaks the naming rules.
    #[error("{0}")]
    Naming(String),

    /// Service, infrastructure or strategy do not fit together.
    #[error("{0}")]
    Compatibility(String),

    /// Template parameters are inconsistent, including timeout-only
    /// failure strategies that name no eligible steps.
    #[error("{0}")]
    Templatization(String),

    #[error("{kind} [{id}] does not exist")]
    MissingReference { kind: ReferenceKind, id: String },

    /// The requested deployment type and strategy cannot be compiled.
    #[error("{0}")]
    Unsupported(String),

    /// Forward/rollback flags on an incoming phase are inconsistent.
    #[error("{0}")]
    RollbackFlag(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl GraphError {
    pub fn missing(kind: ReferenceKind, id: impl Into<String>) -> Self {
        GraphError::MissingReference {
            kind,
            id: id.into(),
        }
    }

    /// True when the caller can recover by re-selecting a deleted entity.
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, GraphError::MissingReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reference_message() {
        let err = GraphError::missing(ReferenceKind::Service, "svc-1");
        assert_eq!(err.to_string(), "Service [svc-1] does not exist");
        assert!(err.is_missing_reference());
    }

    #[test]
    fn catalog_errors_convert() {
        let err: GraphError = CatalogError("timeout".into()).into();
        assert_eq!(err.to_string(), "catalog lookup failed: timeout");
        assert!(!err.is_missing_reference());
    }
}
