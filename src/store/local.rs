//! Space store backed by the application's persisted space index.

use std::rc::Rc;

use log::warn;
use serde_json::Value;

use super::{ChangeHub, KeyValueStorage, SpaceEvent, SpaceListener, SpaceStore, Subscription, read_json};
use crate::components::station_overview::{SpaceGraphData, SpaceSummary};
use crate::config::StorageKeys;

/// Reads `sf_spaces_index` and per-space `sf_space_<id>` documents.
///
/// The store is read-only. Whoever writes the documents forwards the matching
/// change through [`LocalSpaceStore::notify`].
pub struct LocalSpaceStore {
	storage: Rc<dyn KeyValueStorage>,
	keys: StorageKeys,
	hub: ChangeHub,
}

impl LocalSpaceStore {
	pub fn new(storage: Rc<dyn KeyValueStorage>, keys: StorageKeys) -> Self {
		Self {
			storage,
			keys,
			hub: ChangeHub::new(),
		}
	}

	pub fn notify(&self, event: SpaceEvent) {
		self.hub.emit(&event);
	}
}

impl SpaceStore for LocalSpaceStore {
	fn list_spaces(&self, include_playground: bool) -> Vec<SpaceSummary> {
		let entries = match read_json::<Vec<Value>>(self.storage.as_ref(), &self.keys.spaces_index) {
			Ok(entries) => entries.unwrap_or_default(),
			Err(e) => {
				warn!("symbolfield-station: unreadable space index: {}", e);
				return Vec::new();
			}
		};
		entries
			.into_iter()
			.filter_map(|v| serde_json::from_value::<SpaceSummary>(v).ok())
			.filter(|s| !s.id.is_empty() && !s.trashed)
			.filter(|s| include_playground || !s.is_playground())
			.collect()
	}

	fn space_data(&self, id: &str) -> Option<SpaceGraphData> {
		let key = format!("{}{}", self.keys.space_prefix, id);
		match read_json::<SpaceGraphData>(self.storage.as_ref(), &key) {
			Ok(data) => data,
			Err(e) => {
				warn!("symbolfield-station: unreadable space {}: {}", id, e);
				None
			}
		}
	}

	fn subscribe(&self, listener: SpaceListener) -> Subscription {
		self.hub.subscribe(listener)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStorage;

	fn store_with(index: &str) -> (Rc<MemoryStorage>, LocalSpaceStore) {
		let storage = Rc::new(MemoryStorage::new());
		storage.set("sf_spaces_index", index).unwrap();
		let store = LocalSpaceStore::new(storage.clone(), StorageKeys::default());
		(storage, store)
	}

	#[test]
	fn test_index_filters_trashed_and_playground() {
		let (_, store) = store_with(
			r#"[
				{"id":"a","name":"A","createdAt":1,"updatedAt":1,"lastAccessedAt":1},
				{"id":"t","name":"T","createdAt":2,"trashed":true},
				{"id":"p","name":"P","createdAt":3,"kind":"sandbox"},
				"garbage"
			]"#,
		);
		let ids: Vec<String> = store.list_spaces(true).into_iter().map(|s| s.id).collect();
		assert_eq!(ids, vec!["a".to_string(), "p".to_string()]);
		assert_eq!(store.list_spaces(false).len(), 1);
	}

	#[test]
	fn test_corrupt_index_is_empty() {
		let (_, store) = store_with("{oops");
		assert!(store.list_spaces(true).is_empty());
	}

	#[test]
	fn test_space_data_parses_and_tolerates_corruption() {
		let (storage, store) = store_with("[]");
		storage
			.set(
				"sf_space_a",
				r#"{"spaceId":"a","nodes":[{"id":"n","type":"core","position":{"x":1,"y":2}}],"edges":[]}"#,
			)
			.unwrap();
		storage.set("sf_space_b", "nope").unwrap();
		let data = store.space_data("a").unwrap();
		assert_eq!(data.nodes.len(), 1);
		assert!(store.space_data("b").is_none());
		assert!(store.space_data("c").is_none());
	}

	#[test]
	fn test_one_bad_field_does_not_hide_a_space() {
		let (storage, store) = store_with(
			r#"[
				{"id":"a","name":"A","createdAt":1,"trashed":null},
				{"id":"b","name":7,"createdAt":2,"trashed":"no"}
			]"#,
		);
		let names: Vec<String> = store.list_spaces(true).into_iter().map(|s| s.name).collect();
		assert_eq!(names, vec!["A".to_string(), "7".to_string()]);

		storage
			.set(
				"sf_space_a",
				r#"{"nodes":[{"id":"n1"},{"id":"n2"}],"edges":[{"id":"e","source":"n1","target":7},{"id":"f","source":"n1","target":"n2"}]}"#,
			)
			.unwrap();
		let data = store.space_data("a").unwrap();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.edges.len(), 2);
		assert_eq!(data.edges[1].target, "n2");
	}
}
