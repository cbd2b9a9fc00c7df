//! In-memory space store.

use std::cell::RefCell;

use super::{ChangeHub, SpaceEvent, SpaceListener, SpaceStore, Subscription};
use crate::components::station_overview::{SpaceGraphData, SpaceSummary};

/// Space store held entirely in memory. Mutations emit change events.
#[derive(Default)]
pub struct MemorySpaceStore {
	spaces: RefCell<Vec<(SpaceSummary, SpaceGraphData)>>,
	hub: ChangeHub,
}

impl MemorySpaceStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a space and emits `Created`.
	pub fn insert(&self, summary: SpaceSummary, data: SpaceGraphData) {
		let id = summary.id.clone();
		{
			let mut spaces = self.spaces.borrow_mut();
			spaces.retain(|(s, _)| s.id != id);
			spaces.push((summary, data));
		}
		self.hub.emit(&SpaceEvent::Created(id));
	}

	pub fn rename(&self, id: &str, name: &str) {
		let found = {
			let mut spaces = self.spaces.borrow_mut();
			match spaces.iter_mut().find(|(s, _)| s.id == id) {
				Some((summary, _)) => {
					summary.name = name.to_string();
					true
				}
				None => false,
			}
		};
		if found {
			self.hub.emit(&SpaceEvent::Renamed(id.to_string()));
		}
	}

	pub fn remove(&self, id: &str) {
		let removed = {
			let mut spaces = self.spaces.borrow_mut();
			let before = spaces.len();
			spaces.retain(|(s, _)| s.id != id);
			spaces.len() != before
		};
		if removed {
			self.hub.emit(&SpaceEvent::Deleted(id.to_string()));
		}
	}

	/// Replaces graph contents without emitting an event.
	pub fn set_data(&self, id: &str, data: SpaceGraphData) {
		if let Some((_, existing)) = self.spaces.borrow_mut().iter_mut().find(|(s, _)| s.id == id) {
			*existing = data;
		}
	}

	pub fn listener_count(&self) -> usize {
		self.hub.listener_count()
	}
}

impl SpaceStore for MemorySpaceStore {
	fn list_spaces(&self, include_playground: bool) -> Vec<SpaceSummary> {
		self.spaces
			.borrow()
			.iter()
			.map(|(s, _)| s)
			.filter(|s| !s.trashed)
			.filter(|s| include_playground || !s.is_playground())
			.cloned()
			.collect()
	}

	fn space_data(&self, id: &str) -> Option<SpaceGraphData> {
		self.spaces
			.borrow()
			.iter()
			.find(|(s, _)| s.id == id)
			.map(|(_, d)| d.clone())
	}

	fn subscribe(&self, listener: SpaceListener) -> Subscription {
		self.hub.subscribe(listener)
	}
}
