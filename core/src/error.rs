use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Admin '{admin_id}' has no top-admin mapping")]
    UnmappedAdmin { admin_id: String },

    #[error("No operator registered for external id {external_id}")]
    OperatorNotFound { external_id: i64 },

    #[error("Operator {operator_id} has no balance entries")]
    NoEntries { operator_id: i64 },

    #[error(transparent)]
    Delivery(#[from] crate::delivery::DeliveryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
