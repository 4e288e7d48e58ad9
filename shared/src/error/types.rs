//! Error types and response envelope

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type of the ledger, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (offending ids, amounts)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Client lookup failed
    pub fn client_not_found(id: &str) -> Self {
        Self::with_message(ErrorCode::ClientNotFound, format!("Client {} not found", id))
            .with_detail("client_id", id)
    }

    /// Credit entry lookup failed
    pub fn credit_transaction_not_found(id: &str) -> Self {
        Self::with_message(
            ErrorCode::CreditTransactionNotFound,
            format!("Credit transaction {} not found", id),
        )
        .with_detail("credit_transaction_id", id)
    }

    /// Sale lookup failed
    pub fn sale_not_found(id: &str) -> Self {
        Self::with_message(ErrorCode::SaleNotFound, format!("Sale {} not found", id))
            .with_detail("sale_id", id)
    }

    /// Invoice lookup failed
    pub fn invoice_not_found(id: &str) -> Self {
        Self::with_message(
            ErrorCode::InvoiceNotFound,
            format!("Invoice {} not found", id),
        )
        .with_detail("invoice_id", id)
    }

    /// Payment lookup failed
    pub fn payment_not_found(id: &str) -> Self {
        Self::with_message(
            ErrorCode::PaymentNotFound,
            format!("Payment {} not found", id),
        )
        .with_detail("payment_id", id)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }

    /// Create a storage corruption error
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageCorrupted, msg)
    }
}

/// Unified response envelope
///
/// Handed to the presentation layer (desktop commands, report output):
/// - `code`: Error code (0 for success)
/// - `message`: Human-readable message
/// - `data`: Response payload (on success)
/// - `details`: Additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (0 for success, non-zero for errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Human-readable message
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Build from a result
    pub fn from_result(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => err.into(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
