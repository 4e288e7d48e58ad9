//! Data models
//!
//! Shared between the ledger core and its callers (desktop commands,
//! document rendering). Money fields are `f64` rounded to 2dp; business
//! dates are `NaiveDate`; timestamps are Unix millis.

pub mod client;
pub mod credit;
pub mod invoice;
pub mod payment;
pub mod sale;
pub mod summary;

// Re-exports
pub use client::*;
pub use credit::*;
pub use invoice::*;
pub use payment::*;
pub use sale::*;
pub use summary::*;
