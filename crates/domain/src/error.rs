//! Domain error types.

use common::{OrderId, ProductId, VariantId};
use sequence::SequenceError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::order::{RepositoryError, SanitizeError, ValidationErrors};

/// Errors returned by the order service.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// The caller lacks the role or profile the operation requires.
    #[error("Forbidden")]
    Forbidden,

    /// The draft failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The draft could not be normalized.
    #[error("Sanitization failed: {0}")]
    Sanitization(#[from] SanitizeError),

    /// An item references a product variant the catalog does not list.
    #[error("Catalog entry not found: product {product_id}, variant {variant_id}")]
    CatalogNotFound {
        product_id: ProductId,
        variant_id: VariantId,
    },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The order number could not be allocated.
    #[error("Sequence counter error: {0}")]
    Counter(#[from] SequenceError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Repository error: {0}")]
    Repository(String),

    /// A collaborator did not answer within its configured timeout.
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },
}

impl OrderServiceError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OrderServiceError::Timeout { .. }
                | OrderServiceError::Counter(_)
                | OrderServiceError::CatalogUnavailable(_)
                | OrderServiceError::Repository(_)
        )
    }
}

impl From<CatalogError> for OrderServiceError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound {
                product_id,
                variant_id,
            } => OrderServiceError::CatalogNotFound {
                product_id,
                variant_id,
            },
            CatalogError::Unavailable(msg) => OrderServiceError::CatalogUnavailable(msg),
        }
    }
}

impl From<RepositoryError> for OrderServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => OrderServiceError::NotFound(id),
            RepositoryError::Conflict(msg) => OrderServiceError::Conflict(msg),
            RepositoryError::Backend(msg) => OrderServiceError::Repository(msg),
        }
    }
}
