//! JSON file store
//!
//! Keeps the snapshot as pretty JSON in `<data_dir>/ledger.json`. Writes go
//! to a sibling temp file first and are renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use shared::{AppError, AppResult};

use super::LedgerStore;
use crate::read_model::LedgerSnapshot;

/// Store file name inside the data directory
pub const LEDGER_FILE: &str = "ledger.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> AppResult<LedgerSnapshot> {
        let path = self.path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No ledger file yet, starting empty");
            return Ok(LedgerSnapshot::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::storage(format!("Failed to read {}: {}", path.display(), e))
                .with_detail("path", path.display().to_string())
        })?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&content).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Ledger file is not valid JSON");
            AppError::corrupted(format!("Invalid ledger file {}: {}", path.display(), e))
                .with_detail("path", path.display().to_string())
        })?;

        tracing::debug!(
            clients = snapshot.clients.len(),
            sales = snapshot.sales.len(),
            invoices = snapshot.invoices.len(),
            payments = snapshot.payments.len(),
            "Ledger loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> AppResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            AppError::storage(format!(
                "Failed to create data dir {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AppError::internal(format!("Failed to serialize ledger: {}", e)))?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| AppError::storage(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Ledger saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use shared::models::Client;

    fn snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            clients: vec![Client {
                id: "c1".to_string(),
                name: "Acme Steel".to_string(),
                email: Some("billing@acme.test".to_string()),
                phone: None,
                address: None,
                tax_id: Some("TX-1".to_string()),
                created_at: 1_700_000_000_000,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), LedgerSnapshot::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));

        store.save(&snapshot()).unwrap();

        assert!(store.exists());
        assert!(!store.path().with_extension("json.tmp").exists());
        assert_eq!(store.load().unwrap(), snapshot());
    }

    #[test]
    fn test_corrupted_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageCorrupted);
    }

    #[test]
    fn test_partial_file_defaults_missing_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(), r#"{ "clients": [] }"#).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.sales.is_empty());
        assert!(loaded.payments.is_empty());
    }
}
