// Persistence: the key-value store capability and its backends.
//
// The engine never touches ambient storage. Every session receives a store
// explicitly; `MemoryStore` stands in for tests, `SqliteStore` backs the CLI.

pub mod memory;
pub mod records;
pub mod sqlite;

use std::future::Future;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Byte-oriented key-value persistence keyed by `doc_<id>` / `chat_<id>`.
///
/// All methods return `Send` futures so sessions can persist from tasks on a
/// multi-threaded tokio runtime.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, `None` if absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All keys starting with `prefix`, sorted ascending.
    fn keys_with_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}
