//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Client errors
/// - 2xxx: Sale errors
/// - 3xxx: Invoice errors
/// - 4xxx: Payment errors
/// - 5xxx-9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Client errors (1xxx)
    Client,
    /// Sale errors (2xxx)
    Sale,
    /// Invoice errors (3xxx)
    Invoice,
    /// Payment errors (4xxx)
    Payment,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Client,
            2000..3000 => Self::Sale,
            3000..4000 => Self::Invoice,
            4000..5000 => Self::Payment,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Client => "client",
            Self::Sale => "sale",
            Self::Invoice => "invoice",
            Self::Payment => "payment",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
