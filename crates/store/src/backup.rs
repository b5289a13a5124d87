//! Backup document codec (export / import).
//!
//! The backup file is a pretty-printed JSON document:
//!
//! ```json
//! { "users": [...], "transactions": [...], "exportDate": "2024-05-29T16:26:40Z", "version": "1.1" }
//! ```
//!
//! Import is tolerant about everything except the user collection: any JSON
//! value with a `users` array is accepted, `transactions` defaults to empty and
//! `exportDate` / `version` are informational.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use pointswap_ledger::{Transaction, User};

use crate::storage::StorageError;

/// Format version written into every export.
pub const BACKUP_VERSION: &str = "1.1";

/// Both collections, as held in memory by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("backup has no `users` array")]
    MissingUsers,

    #[error("backup contains an invalid user record: {0}")]
    InvalidUsers(#[source] serde_json::Error),

    #[error("backup contains an invalid transaction record: {0}")]
    InvalidTransactions(#[source] serde_json::Error),

    #[error("failed to read backup file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Serialized export of the whole dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub users: Vec<User>,
    pub transactions: Vec<Transaction>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl BackupDocument {
    pub fn new(snapshot: LedgerSnapshot, exported_at: DateTime<Utc>) -> Self {
        Self {
            users: snapshot.users,
            transactions: snapshot.transactions,
            export_date: exported_at,
            version: BACKUP_VERSION.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// `pointswap_backup_<YYYY-MM-DD>.json`, dated by the export timestamp.
    pub fn file_name(&self) -> String {
        backup_file_name(self.export_date.date_naive())
    }

    pub fn into_snapshot(self) -> LedgerSnapshot {
        LedgerSnapshot {
            users: self.users,
            transactions: self.transactions,
        }
    }
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("pointswap_backup_{}.json", date.format("%Y-%m-%d"))
}

/// Decode a backup document without touching any storage.
pub fn parse_backup(input: &str) -> Result<LedgerSnapshot, ImportError> {
    let mut root: Value = serde_json::from_str(input).map_err(ImportError::Malformed)?;

    let users = match root.get_mut("users").map(Value::take) {
        Some(users @ Value::Array(_)) => {
            serde_json::from_value::<Vec<User>>(users).map_err(ImportError::InvalidUsers)?
        }
        _ => return Err(ImportError::MissingUsers),
    };

    let transactions = match root.get_mut("transactions").map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(txs) => serde_json::from_value::<Vec<Transaction>>(txs)
            .map_err(ImportError::InvalidTransactions)?,
    };

    if let Some(version) = root.get("version").and_then(Value::as_str) {
        if version != BACKUP_VERSION {
            tracing::debug!(version, "importing backup written by a different format version");
        }
    }

    Ok(LedgerSnapshot { users, transactions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_users() -> Value {
        json!([
            {"id": "1", "username": "admin", "password": "pw", "balance": 100, "isAdmin": true, "createdAt": "2024-05-01T08:00:00.000Z"},
            {"id": "2", "username": "bob", "password": "pw", "balance": 50, "createdAt": "2024-05-02T08:00:00.000Z"}
        ])
    }

    #[test]
    fn file_name_uses_export_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap();
        let doc = BackupDocument::new(LedgerSnapshot::default(), at);
        assert_eq!(doc.file_name(), "pointswap_backup_2024-03-07.json");
    }

    #[test]
    fn export_shape_matches_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let doc = BackupDocument::new(LedgerSnapshot::default(), at);
        let value: Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["version"], "1.1");
        assert_eq!(value["users"], json!([]));
        assert_eq!(value["transactions"], json!([]));
        assert!(value["exportDate"].as_str().unwrap().starts_with("2024-03-07T12:00:00"));
    }

    #[test]
    fn transactions_default_to_empty() {
        let input = json!({ "users": sample_users() }).to_string();
        let snapshot = parse_backup(&input).unwrap();
        assert_eq!(snapshot.users.len(), 2);
        assert!(snapshot.users[0].is_admin);
        assert!(snapshot.transactions.is_empty());

        let input = json!({ "users": [], "transactions": null }).to_string();
        assert_eq!(parse_backup(&input).unwrap(), LedgerSnapshot::default());
    }

    #[test]
    fn rejects_documents_without_users_array() {
        for input in [
            "not json".to_string(),
            json!({}).to_string(),
            json!({ "users": {} }).to_string(),
            json!({ "users": "[]" }).to_string(),
            json!([]).to_string(),
        ] {
            let err = parse_backup(&input).unwrap_err();
            assert!(
                matches!(err, ImportError::Malformed(_) | ImportError::MissingUsers),
                "{input}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_bad_records() {
        let input = json!({ "users": [{ "id": "1" }] }).to_string();
        assert!(matches!(parse_backup(&input), Err(ImportError::InvalidUsers(_))));

        let input = json!({ "users": [], "transactions": 5 }).to_string();
        assert!(matches!(parse_backup(&input), Err(ImportError::InvalidTransactions(_))));
    }

    #[test]
    fn accepts_system_adjustments_from_older_clients() {
        let input = json!({
            "users": sample_users(),
            "transactions": [{
                "id": "admin-adj-1717000000000",
                "senderId": "SYSTEM",
                "senderName": "🛠️ ADMINISTRATION",
                "receiverId": "2",
                "receiverName": "bob",
                "amount": -500,
                "timestamp": "2024-05-29T16:26:40.000Z"
            }],
            "exportDate": "2024-05-30T00:00:00.000Z",
            "version": "1.0"
        })
        .to_string();

        let snapshot = parse_backup(&input).unwrap();
        assert_eq!(snapshot.transactions.len(), 1);
        assert!(snapshot.transactions[0].is_system());
    }
}
