//! Space store collaborators.
//!
//! The overview only reads spaces through [`SpaceStore`] and reacts to its
//! change notifications; it never writes space data.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;

use crate::components::station_overview::{RawArea, SpaceGraphData, SpaceSummary};

mod local;
mod memory;
mod storage;

pub use local::LocalSpaceStore;
pub use memory::MemorySpaceStore;
pub use storage::{
	BrowserStorage, KeyValueStorage, MemoryStorage, StorageError, read_json, write_json,
};

/// A change in the set of spaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpaceEvent {
	Created(String),
	Renamed(String),
	Deleted(String),
}

impl SpaceEvent {
	pub fn space_id(&self) -> &str {
		match self {
			SpaceEvent::Created(id) | SpaceEvent::Renamed(id) | SpaceEvent::Deleted(id) => id,
		}
	}
}

/// Listener invoked for every [`SpaceEvent`].
pub type SpaceListener = Rc<dyn Fn(&SpaceEvent)>;

/// Read-only view of the spaces the user has created.
pub trait SpaceStore {
	/// Non-trashed spaces, optionally including the playground.
	fn list_spaces(&self, include_playground: bool) -> Vec<SpaceSummary>;
	/// Graph contents of a space, or `None` if it is missing or unreadable.
	fn space_data(&self, id: &str) -> Option<SpaceGraphData>;
	/// Registers a listener; it stays attached while the subscription lives.
	fn subscribe(&self, listener: SpaceListener) -> Subscription;
}

#[derive(Default)]
struct HubInner {
	next_id: u64,
	listeners: Vec<(u64, SpaceListener)>,
}

/// Observer list shared by store implementations.
#[derive(Clone, Default)]
pub struct ChangeHub {
	inner: Rc<RefCell<HubInner>>,
}

impl ChangeHub {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&self, listener: SpaceListener) -> Subscription {
		let mut inner = self.inner.borrow_mut();
		let id = inner.next_id;
		inner.next_id += 1;
		inner.listeners.push((id, listener));
		Subscription {
			hub: Rc::downgrade(&self.inner),
			id,
		}
	}

	/// Calls every listener. Listeners may subscribe or unsubscribe re-entrantly.
	pub fn emit(&self, event: &SpaceEvent) {
		let listeners: Vec<SpaceListener> = self
			.inner
			.borrow()
			.listeners
			.iter()
			.map(|(_, l)| l.clone())
			.collect();
		for listener in listeners {
			listener(event);
		}
	}

	pub fn listener_count(&self) -> usize {
		self.inner.borrow().listeners.len()
	}
}

/// Detaches its listener when dropped.
#[must_use = "dropping a subscription detaches the listener"]
pub struct Subscription {
	hub: Weak<RefCell<HubInner>>,
	id: u64,
}

impl Subscription {
	pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(hub) = self.hub.upgrade() {
			hub.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
		}
	}
}

/// Loads the freeform areas of a space. Missing or corrupt data is empty.
pub fn load_raw_areas(storage: &dyn KeyValueStorage, prefix: &str, space_id: &str) -> Vec<RawArea> {
	match storage.get(&format!("{prefix}{space_id}")) {
		Ok(Some(raw)) => RawArea::parse_list(&raw),
		Ok(None) => Vec::new(),
		Err(e) => {
			warn!("symbolfield-station: failed to read areas for {}: {}", space_id, e);
			Vec::new()
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;

	#[test]
	fn test_subscription_detaches_on_drop() {
		let hub = ChangeHub::new();
		let hits = Rc::new(Cell::new(0));
		let counter = hits.clone();
		let sub = hub.subscribe(Rc::new(move |_: &SpaceEvent| counter.set(counter.get() + 1)));
		hub.emit(&SpaceEvent::Created("a".into()));
		assert_eq!(hits.get(), 1);
		sub.unsubscribe();
		hub.emit(&SpaceEvent::Deleted("a".into()));
		assert_eq!(hits.get(), 1);
		assert_eq!(hub.listener_count(), 0);
	}

	#[test]
	fn test_subscription_outliving_hub() {
		let hub = ChangeHub::new();
		let sub = hub.subscribe(Rc::new(|_: &SpaceEvent| {}));
		drop(hub);
		drop(sub);
	}

	#[test]
	fn test_load_raw_areas_tolerates_corruption() {
		let storage = MemoryStorage::new();
		storage.set("sf_areas_a", "not json").unwrap();
		storage
			.set("sf_areas_b", r#"[{"id":"x","shape":"circle","circle":{"cx":1,"cy":1,"r":2}}]"#)
			.unwrap();
		assert!(load_raw_areas(&storage, "sf_areas_", "a").is_empty());
		assert!(load_raw_areas(&storage, "sf_areas_", "missing").is_empty());
		assert_eq!(load_raw_areas(&storage, "sf_areas_", "b").len(), 1);
	}
}
