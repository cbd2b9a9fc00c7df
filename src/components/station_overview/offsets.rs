//! User drag offsets, persisted per space id.
//!
//! Offsets are cosmetic. Load and save never fail: storage errors are logged
//! and the in-memory map stays authoritative for the session.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};
use serde_json::{Map, Value};

use super::types::{Point, SpaceCluster};
use crate::store::{KeyValueStorage, write_json};

/// Space id to translation.
pub type LayoutOffsetMap = BTreeMap<String, Point>;

/// Reads and writes the [`LayoutOffsetMap`] as one JSON object under `key`.
pub struct LayoutOffsetStore {
	storage: Rc<dyn KeyValueStorage>,
	key: String,
}

impl LayoutOffsetStore {
	pub fn new(storage: Rc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
		Self {
			storage,
			key: key.into(),
		}
	}

	/// Reads the persisted map. Entries without two finite numbers are dropped.
	pub fn load(&self) -> LayoutOffsetMap {
		let raw = match self.storage.get(&self.key) {
			Ok(Some(raw)) => raw,
			Ok(None) => return LayoutOffsetMap::new(),
			Err(e) => {
				warn!("symbolfield-station: could not read layout offsets: {}", e);
				return LayoutOffsetMap::new();
			}
		};
		match serde_json::from_str::<Map<String, Value>>(&raw) {
			Ok(entries) => entries
				.into_iter()
				.filter_map(|(id, value)| Some((id, parse_offset(&value)?)))
				.collect(),
			Err(e) => {
				warn!("symbolfield-station: discarding corrupt layout offsets: {}", e);
				LayoutOffsetMap::new()
			}
		}
	}

	pub fn save(&self, offsets: &LayoutOffsetMap) {
		match write_json(self.storage.as_ref(), &self.key, offsets) {
			Ok(()) => debug!("symbolfield-station: saved {} layout offsets", offsets.len()),
			Err(e) => warn!("symbolfield-station: could not save layout offsets: {}", e),
		}
	}

	pub fn clear(&self) {
		if let Err(e) = self.storage.remove(&self.key) {
			warn!("symbolfield-station: could not clear layout offsets: {}", e);
		}
	}
}

fn parse_offset(value: &Value) -> Option<Point> {
	let x = value.get("x")?.as_f64()?;
	let y = value.get("y")?.as_f64()?;
	let p = Point::new(x, y);
	p.is_finite().then_some(p)
}

/// Offset for `id`, or zero.
pub fn offset_of(offsets: &LayoutOffsetMap, id: &str) -> Point {
	offsets.get(id).copied().unwrap_or(Point::ORIGIN)
}

/// Translates every cluster by its offset. Clusters without one are unchanged.
pub fn apply_offsets(clusters: &[SpaceCluster], offsets: &LayoutOffsetMap) -> Vec<SpaceCluster> {
	clusters
		.iter()
		.map(|cluster| {
			let mut moved = cluster.clone();
			if let Some(d) = offsets.get(&cluster.id) {
				moved.translate(*d);
			}
			moved
		})
		.collect()
}
