/// Error type shared by repositories, services and the HTTP layer.
///
/// Each variant is a distinct failure class so callers can pick a response
/// without inspecting the message text.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The requested quantity exceeds the stock available for a product.
    #[error(
        "insufficient stock for product {product_id} ({product_name}): requested {requested}, available: {available}"
    )]
    InsufficientStock {
        product_id: i64,
        product_name: String,
        requested: i32,
        available: i32,
    },

    /// The caller is authenticated but not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The caller presented no credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("unit of work session is already closed")]
    SessionClosed,

    #[error("transaction commit failed: {0}")]
    CommitFailed(String),

    #[error("transaction rollback failed: {0}")]
    RollbackFailed(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// True for failures whose detail must not reach API clients.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed
                | Self::CommitFailed(_)
                | Self::RollbackFailed(_)
                | Self::Database(_)
                | Self::Internal(_)
        )
    }
}

/// Result type used throughout the crate.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_reports_available_quantity() {
        let err = StoreError::InsufficientStock {
            product_id: 7,
            product_name: "Mug".to_string(),
            requested: 3,
            available: 1,
        };
        let message = err.to_string();
        assert!(message.contains("product 7"));
        assert!(message.contains("Mug"));
        assert!(message.ends_with("available: 1"));
    }

    #[test]
    fn not_found_names_entity_and_id() {
        assert_eq!(
            StoreError::not_found("product", 9999).to_string(),
            "product 9999 not found"
        );
    }

    #[test]
    fn internal_classification() {
        assert!(StoreError::SessionClosed.is_internal());
        assert!(StoreError::Database(sqlx::Error::PoolClosed).is_internal());
        assert!(!StoreError::validation("bad").is_internal());
        assert!(!StoreError::forbidden("no").is_internal());
    }
}
