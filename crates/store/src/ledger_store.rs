//! Ledger Store: the two persisted collections plus the backup codec.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use pointswap_ledger::{LedgerUpdate, Transaction, User};

use crate::backup::{BackupDocument, ImportError, LedgerSnapshot, parse_backup};
use crate::storage::{KeyValueStorage, StorageError};

/// Storage key of the user collection.
pub const USERS_KEY: &str = "pointswap_users";

/// Storage key of the transaction collection.
pub const TRANSACTIONS_KEY: &str = "pointswap_transactions";

/// Persisted user and transaction collections over any [`KeyValueStorage`].
///
/// Each collection is stored whole, as one JSON array under its own key.
#[derive(Debug, Clone)]
pub struct LedgerStore<S> {
    storage: S,
}

impl<S> LedgerStore<S>
where
    S: KeyValueStorage,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ─────────────────────────────────────────────────────────────────────
    // Load / save
    // ─────────────────────────────────────────────────────────────────────

    /// Load users, surfacing read and decode failures.
    pub fn try_load_users(&self) -> Result<Vec<User>, StorageError> {
        self.try_load(USERS_KEY)
    }

    /// Load transactions, surfacing read and decode failures.
    pub fn try_load_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.try_load(TRANSACTIONS_KEY)
    }

    /// Load users; missing or unreadable data yields an empty collection.
    pub fn load_users(&self) -> Vec<User> {
        self.load_or_empty(USERS_KEY)
    }

    /// Load transactions; missing or unreadable data yields an empty collection.
    pub fn load_transactions(&self) -> Vec<Transaction> {
        self.load_or_empty(TRANSACTIONS_KEY)
    }

    pub fn load(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            users: self.load_users(),
            transactions: self.load_transactions(),
        }
    }

    pub fn save_users(&self, users: &[User]) -> Result<(), StorageError> {
        self.save(USERS_KEY, users)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StorageError> {
        self.save(TRANSACTIONS_KEY, transactions)
    }

    /// Persist an engine result: the new user collection, and the transaction
    /// prepended to the history (newest first). Returns the new history.
    pub fn record(
        &self,
        update: &LedgerUpdate,
        transactions: &[Transaction],
    ) -> Result<Vec<Transaction>, StorageError> {
        let mut history = Vec::with_capacity(transactions.len() + 1);
        history.push(update.transaction.clone());
        history.extend_from_slice(transactions);

        self.commit(&update.users, &history)?;
        Ok(history)
    }

    /// Write both collections. If the second write fails the first is rolled
    /// back, so callers never see users and transactions from different states.
    fn commit(&self, users: &[User], transactions: &[Transaction]) -> Result<(), StorageError> {
        let previous_users = self.storage.get(USERS_KEY)?;

        self.save_users(users)?;

        if let Err(err) = self.save_transactions(transactions) {
            let rollback = match &previous_users {
                Some(raw) => self.storage.set(USERS_KEY, raw),
                None => self.storage.remove(USERS_KEY),
            };
            if let Err(rollback_err) = rollback {
                tracing::error!("failed to roll back user collection: {rollback_err}");
            }
            return Err(err);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Export / import
    // ─────────────────────────────────────────────────────────────────────

    /// Build a backup document from the persisted collections.
    pub fn export(&self, exported_at: DateTime<Utc>) -> BackupDocument {
        BackupDocument::new(self.load(), exported_at)
    }

    /// Write a backup file into `dir` and return its path.
    pub fn export_to_dir(&self, dir: &Path, exported_at: DateTime<Utc>) -> Result<PathBuf, StorageError> {
        let document = self.export(exported_at);
        let path = dir.join(document.file_name());
        let target = path.display().to_string();

        let json = document.to_json_pretty().map_err(|source| StorageError::Encode {
            target: target.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Write { target, source })?;

        tracing::info!(
            users = document.users.len(),
            transactions = document.transactions.len(),
            path = %path.display(),
            "backup exported"
        );
        Ok(path)
    }

    /// Replace both collections with the content of a backup document.
    ///
    /// The document is fully decoded before anything is written; a rejected
    /// document leaves the store untouched.
    pub fn import(&self, document: &str) -> Result<LedgerSnapshot, ImportError> {
        let snapshot = parse_backup(document)?;
        self.commit(&snapshot.users, &snapshot.transactions)?;

        tracing::info!(
            users = snapshot.users.len(),
            transactions = snapshot.transactions.len(),
            "backup imported"
        );
        Ok(snapshot)
    }

    pub fn import_file(&self, path: &Path) -> Result<LedgerSnapshot, ImportError> {
        let document = fs::read_to_string(path).map_err(|source| ImportError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.import(&document)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    fn try_load<T>(&self, key: &str) -> Result<Vec<T>, StorageError>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.storage.get(key)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            target: key.to_string(),
            source,
        })
    }

    fn load_or_empty<T>(&self, key: &str) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        match self.try_load(key) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!("treating '{key}' as empty: {err}");
                Vec::new()
            }
        }
    }

    fn save<T>(&self, key: &str, items: &[T]) -> Result<(), StorageError>
    where
        T: Serialize,
    {
        let payload = serde_json::to_string(items).map_err(|source| StorageError::Encode {
            target: key.to_string(),
            source,
        })?;
        self.storage.set(key, &payload)
    }
}
