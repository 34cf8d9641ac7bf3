//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Card details rejected before or during tokenization
    #[error("Card rejected ({code}): {message}")]
    CardValidation { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PaymentError {
    pub fn card(code: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::CardValidation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Stripe(_) | PaymentError::RateLimited | PaymentError::Network(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Stripe(_) | PaymentError::Network(_) => {
                "Payment processing failed. Please try again."
            }
            PaymentError::CardValidation { message, .. } => message,
            PaymentError::RateLimited => "Too many payment attempts. Please wait a moment.",
            PaymentError::Config(_) => "Service configuration error.",
        }
    }
}
