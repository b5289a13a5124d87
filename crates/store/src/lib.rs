//! Persistence layer: key/value storage backends, the Ledger Store and the
//! backup codec.

pub mod backup;
pub mod ledger_store;
pub mod storage;

pub use backup::{BACKUP_VERSION, BackupDocument, ImportError, LedgerSnapshot, backup_file_name, parse_backup};
pub use ledger_store::{LedgerStore, TRANSACTIONS_KEY, USERS_KEY};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage, StorageError, default_data_dir};
