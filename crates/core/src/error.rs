use thiserror::Error;

use crate::types::BillStatus;

pub type WifinetResult<T> = Result<T, WifinetError>;

#[derive(Error, Debug)]
pub enum WifinetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{table} record '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("Invalid bill transition from {from:?} to {to:?}")]
    InvalidTransition { from: BillStatus, to: BillStatus },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Router provisioning error: {0}")]
    Provisioning(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WifinetError {
    pub fn not_found(table: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            table,
            id: id.into(),
        }
    }
}
