use spendbook_domain::ExpenseId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Please enter an item name")]
    InvalidItem,
    #[error("Please enter a valid cost: {0}")]
    InvalidCost(String),
    #[error("Expense not found: {0}")]
    NotFound(ExpenseId),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl CoreError {
    /// Validation failures are reported to the user and never reach storage.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::InvalidItem | CoreError::InvalidCost(_))
    }

    /// Read or write failures of the persistence adapter.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(_) | CoreError::Io(_) | CoreError::Serde(_)
        )
    }
}
