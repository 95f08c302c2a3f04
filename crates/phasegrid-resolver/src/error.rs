//! Errors raised while resolving required entities.

use thiserror::Error;

use phasegrid_model::CatalogError;

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A collaborator lookup failed; the pass is abandoned.
    #[error("required entity resolution failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid expression pattern: {0}")]
    Pattern(#[from] regex::Error),
}
