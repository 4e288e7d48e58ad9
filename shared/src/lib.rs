//! Shared types for the coil ledger
//!
//! Data model (clients, sales, invoices, payments, derived summaries),
//! the unified error system and small id/time utilities used by the
//! ledger core and its callers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
