//! Unified error codes for the ledger
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Client errors
//! - 2xxx: Sale errors
//! - 3xxx: Invoice errors
//! - 4xxx: Payment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the presentation layer
/// can match on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Client ====================
    /// Client not found
    ClientNotFound = 1001,
    /// Client still has sales
    ClientHasSales = 1002,
    /// Not enough available credit
    ClientInsufficientCredit = 1003,
    /// Credit transaction not found
    CreditTransactionNotFound = 1004,

    // ==================== 2xxx: Sale ====================
    /// Sale not found
    SaleNotFound = 2001,
    /// Sale has no line items
    SaleEmpty = 2002,
    /// Sale is already deleted
    SaleAlreadyDeleted = 2003,
    /// Sale is not deleted (restore requested)
    SaleNotDeleted = 2004,

    // ==================== 3xxx: Invoice ====================
    /// Invoice not found
    InvoiceNotFound = 3001,
    /// Sale belongs to a different client than the invoice
    InvoiceSaleMismatch = 3002,
    /// Invoice is already deleted
    InvoiceAlreadyDeleted = 3003,
    /// Invoice is not deleted (restore requested)
    InvoiceNotDeleted = 3004,
    /// Due date precedes the invoice date
    InvoiceInvalidDueDate = 3005,

    // ==================== 4xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 4001,
    /// Payment amount is not a positive finite number
    PaymentInvalidAmount = 4002,
    /// Payment is already deleted
    PaymentAlreadyDeleted = 4003,
    /// Payment is not deleted (restore requested)
    PaymentNotDeleted = 4004,
    /// Client has no sale a payment could be attached to
    PaymentNoTarget = 4005,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Storage read/write failed
    StorageError = 9401,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Client
            ErrorCode::ClientNotFound => "Client not found",
            ErrorCode::ClientHasSales => "Client still has sales",
            ErrorCode::ClientInsufficientCredit => "Insufficient credit balance",
            ErrorCode::CreditTransactionNotFound => "Credit transaction not found",

            // Sale
            ErrorCode::SaleNotFound => "Sale not found",
            ErrorCode::SaleEmpty => "Sale has no items",
            ErrorCode::SaleAlreadyDeleted => "Sale is already deleted",
            ErrorCode::SaleNotDeleted => "Sale is not deleted",

            // Invoice
            ErrorCode::InvoiceNotFound => "Invoice not found",
            ErrorCode::InvoiceSaleMismatch => "Sale does not belong to the invoice client",
            ErrorCode::InvoiceAlreadyDeleted => "Invoice is already deleted",
            ErrorCode::InvoiceNotDeleted => "Invoice is not deleted",
            ErrorCode::InvoiceInvalidDueDate => "Due date precedes the invoice date",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentInvalidAmount => "Payment amount must be a positive number",
            ErrorCode::PaymentAlreadyDeleted => "Payment is already deleted",
            ErrorCode::PaymentNotDeleted => "Payment is not deleted",
            ErrorCode::PaymentNoTarget => "Client has no sale to attach the payment to",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageError => "Storage read or write failed",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Client
            1001 => Ok(ErrorCode::ClientNotFound),
            1002 => Ok(ErrorCode::ClientHasSales),
            1003 => Ok(ErrorCode::ClientInsufficientCredit),
            1004 => Ok(ErrorCode::CreditTransactionNotFound),

            // Sale
            2001 => Ok(ErrorCode::SaleNotFound),
            2002 => Ok(ErrorCode::SaleEmpty),
            2003 => Ok(ErrorCode::SaleAlreadyDeleted),
            2004 => Ok(ErrorCode::SaleNotDeleted),

            // Invoice
            3001 => Ok(ErrorCode::InvoiceNotFound),
            3002 => Ok(ErrorCode::InvoiceSaleMismatch),
            3003 => Ok(ErrorCode::InvoiceAlreadyDeleted),
            3004 => Ok(ErrorCode::InvoiceNotDeleted),
            3005 => Ok(ErrorCode::InvoiceInvalidDueDate),

            // Payment
            4001 => Ok(ErrorCode::PaymentNotFound),
            4002 => Ok(ErrorCode::PaymentInvalidAmount),
            4003 => Ok(ErrorCode::PaymentAlreadyDeleted),
            4004 => Ok(ErrorCode::PaymentNotDeleted),
            4005 => Ok(ErrorCode::PaymentNoTarget),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageError),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
