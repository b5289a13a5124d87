pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::{FileStorage, default_data_dir};
pub use in_memory::InMemoryStorage;
pub use r#trait::{KeyValueStorage, StorageError};
