//! Unified error system for the ledger
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Response envelope handed to the presentation layer
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Client errors
//! - 2xxx: Sale errors
//! - 3xxx: Invoice errors
//! - 4xxx: Payment errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::sale_not_found("sale-42");
//! assert_eq!(err.code, ErrorCode::SaleNotFound);
//!
//! let err = AppError::validation("Amount must be positive")
//!     .with_detail("field", "amount");
//!
//! let response: ApiResponse<()> = err.into();
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
