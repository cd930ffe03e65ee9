//! Persistence contract for metadata and review records.

mod memory;

use async_trait::async_trait;

pub use memory::MemoryRepository;

/// Error type for Repository operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("storage error: {0}")]
	Storage(String),
}

/// A record the store can assign an identifier to.
pub trait Record: Clone + Send + Sync + 'static {
	fn id(&self) -> Option<&str>;

	fn set_id(&mut self, id: String);

	/// Key used by [`Repository::find_by_secondary_key`], if the record has one.
	fn secondary_key(&self) -> Option<String>;
}

/// Async document store keyed by record id.
///
/// [`StoreError`] is reserved for backends that can fail.
/// [`MemoryRepository`] never returns an error.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
	/// Insert or replace a record.
	///
	/// A record without an id gets a fresh unique one; an existing id is kept.
	async fn save(&self, record: T) -> Result<T, StoreError>;

	/// Returns `Ok(None)` if no record has this id.
	async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError>;

	/// All records in insertion order.
	async fn find_all(&self) -> Result<Vec<T>, StoreError>;

	/// Returns `Ok(())` regardless of whether the record existed.
	async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

	async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<T>, StoreError>;
}
