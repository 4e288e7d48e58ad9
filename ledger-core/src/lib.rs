//! Coil Ledger Core - sales, invoicing and payment bookkeeping
//!
//! # Overview
//!
//! - **Calculator** (`calculator`): line, sale and invoice HT/tax/TTC totals
//! - **Reconciliation** (`reconciliation`): payment status, paid flags, client debt
//! - **Read model** (`read_model`): borrowed view answering queries by id
//! - **Ledger** (`ledger`): mutations with synchronous recomputation
//! - **Store** (`store`): JSON file / in-memory persistence
//!
//! # Layout
//!
//! ```text
//! ledger-core/src/
//! ├── money.rs          # Decimal conversions and rounding
//! ├── calculator/       # totals
//! ├── reconciliation/   # payment status and debt
//! ├── reports.rs        # sales summary, dashboard
//! ├── read_model.rs     # snapshot + queries
//! ├── ledger/           # orchestration
//! ├── store/            # persistence seam
//! ├── steel.rs          # coil/sheet weights, slitting
//! ├── config.rs
//! └── logger.rs
//! ```

pub mod calculator;
pub mod config;
pub mod ledger;
pub mod logger;
pub mod money;
pub mod read_model;
pub mod reconciliation;
pub mod reports;
pub mod steel;
pub mod store;

// Re-exports
pub use calculator::DocumentTotals;
pub use config::LedgerConfig;
pub use ledger::Ledger;
pub use read_model::{LedgerSnapshot, ReadModel};
pub use reports::LedgerReport;
pub use store::{JsonFileStore, LedgerStore, MemoryStore};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Load `.env`, read the configuration and start logging
///
/// File logs go under `<data_dir>/logs` outside development.
pub fn setup_environment() -> anyhow::Result<LedgerConfig> {
    dotenv::dotenv().ok();

    let config = LedgerConfig::from_env();
    let log_dir = config.log_dir();
    let log_dir = (!config.is_development()).then(|| log_dir.to_string_lossy().into_owned());
    logger::init_logger(&config.log_level, config.log_json, log_dir.as_deref())?;

    Ok(config)
}
