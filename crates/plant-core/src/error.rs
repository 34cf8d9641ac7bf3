//! Error Types

use thiserror::Error;

/// Result type alias for shop operations
pub type Result<T> = std::result::Result<T, ShopError>;

/// Shop backend error types
#[derive(Error, Debug)]
pub enum ShopError {
    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Plant does not exist
    #[error("Plant not found: {0}")]
    PlantNotFound(String),

    /// Requested more units than are in stock
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShopError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ShopError::Unavailable(_) | ShopError::Network(_) => true,
            ShopError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ShopError::PlantNotFound(_) => "This plant is no longer available.".into(),
            ShopError::InsufficientStock { available, .. } => {
                format!("Only {available} left in stock.")
            }
            ShopError::InvalidQuantity(_) => "Please choose at least one plant.".into(),
            ShopError::Unavailable(_) | ShopError::Network(_) => {
                "The shop is currently unavailable. Please try again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}
