//! Store Module
//!
//! Persistence seam of the ledger. The core never performs I/O itself:
//! a [`LedgerStore`] loads the full [`LedgerSnapshot`] and saves it back
//! after mutations.

pub mod json_file;

pub use json_file::{JsonFileStore, LEDGER_FILE};

use std::sync::Mutex;

use shared::{AppError, AppResult};

use crate::read_model::LedgerSnapshot;

/// Load/save the whole ledger state
pub trait LedgerStore {
    /// Load the stored snapshot; an empty store yields an empty snapshot
    fn load(&self) -> AppResult<LedgerSnapshot>;
    fn save(&self, snapshot: &LedgerSnapshot) -> AppResult<()>;
}

/// In-process store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> AppResult<LedgerSnapshot> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| AppError::storage("Memory store lock poisoned"))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> AppResult<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| AppError::storage("Memory store lock poisoned"))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Client;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), LedgerSnapshot::default());

        let snapshot = LedgerSnapshot {
            clients: vec![Client {
                id: "c1".to_string(),
                name: "Acme Steel".to_string(),
                email: None,
                phone: None,
                address: None,
                tax_id: None,
                created_at: 1,
            }],
            ..Default::default()
        };
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);
    }
}
