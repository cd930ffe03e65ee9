//! In-memory implementation of Repository.

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::{Record, Repository, StoreError};

/// In-memory implementation of Repository.
///
/// Suitable for tests and single-instance deployments; contents are lost on
/// restart. Every operation succeeds.
pub struct MemoryRepository<T> {
	records: RwLock<IndexMap<String, T>>,
}

impl<T> Default for MemoryRepository<T> {
	fn default() -> Self {
		Self {
			records: RwLock::new(IndexMap::new()),
		}
	}
}

impl<T: Record> MemoryRepository<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Remove every record.
	pub fn clear(&self) {
		self.records.write().clear();
	}

	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
	async fn save(&self, mut record: T) -> Result<T, StoreError> {
		let id = match record.id() {
			Some(id) if !id.is_empty() => id.to_string(),
			_ => {
				let id = uuid::Uuid::new_v4().to_string();
				record.set_id(id.clone());
				id
			},
		};
		debug!(%id, "saving record");
		self.records.write().insert(id, record.clone());
		Ok(record)
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
		Ok(self.records.read().get(id).cloned())
	}

	async fn find_all(&self) -> Result<Vec<T>, StoreError> {
		Ok(self.records.read().values().cloned().collect())
	}

	async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
		self.records.write().shift_remove(id);
		Ok(())
	}

	async fn find_by_secondary_key(&self, key: &str) -> Result<Vec<T>, StoreError> {
		Ok(
			self
				.records
				.read()
				.values()
				.filter(|record| record.secondary_key().as_deref() == Some(key))
				.cloned()
				.collect(),
		)
	}
}
