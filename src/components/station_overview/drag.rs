//! Dragging spaces around the station.
//!
//! A drag edits the space's layout offset, never its computed layout. The
//! view box is frozen when the drag starts so that a camera focused on the
//! dragged space does not chase the pointer.

use std::collections::BTreeSet;

use log::debug;

use super::camera::{ViewBox, Viewport, client_to_world};
use super::types::{Point, SpaceCluster};
use crate::config::{DragConfig, LayoutConfig};

#[derive(Clone, Debug, PartialEq)]
struct DragSession {
	space_id: String,
	pointer: i32,
	view_box: ViewBox,
	origin_world: Point,
	origin_client: Point,
	/// Offset when the drag started.
	base: Point,
	/// Layout centre without any offset.
	layout_center: Point,
	radius: f64,
	travel: f64,
}

/// Result of releasing a drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragRelease {
	pub space_id: String,
	pub offset: Point,
	/// Whether the pointer moved far enough to count as a drag, not a click.
	pub moved: bool,
}

/// Tracks at most one space drag at a time.
///
/// The dragged centre never enters the ArcheCore clearance circle. A drag
/// that travelled past the click threshold suppresses the click that
/// follows its release, so dropping a space does not also select it.
#[derive(Clone, Debug)]
pub struct DragController {
	session: Option<DragSession>,
	offset: Point,
	suppressed: BTreeSet<String>,
	click_threshold: f64,
	core_radius: f64,
	core_padding: f64,
}

impl DragController {
	pub fn new(drag: &DragConfig, layout: &LayoutConfig) -> Self {
		Self {
			session: None,
			offset: Point::ORIGIN,
			suppressed: BTreeSet::new(),
			click_threshold: drag.click_threshold_px,
			core_radius: layout.core_radius,
			core_padding: layout.core_padding,
		}
	}

	pub fn is_dragging(&self) -> bool {
		self.session.is_some()
	}

	pub fn dragged_space(&self) -> Option<&str> {
		self.session.as_ref().map(|s| s.space_id.as_str())
	}

	/// Starts dragging `space_id`. `layout_center` is the cluster centre
	/// before offsets; `base` is its current offset.
	#[allow(clippy::too_many_arguments)]
	pub fn start(
		&mut self,
		space_id: &str,
		pointer: i32,
		client: Point,
		view_box: ViewBox,
		viewport: &Viewport,
		layout_center: Point,
		radius: f64,
		base: Point,
	) {
		debug!("symbolfield-station: drag start {}", space_id);
		self.offset = base;
		self.session = Some(DragSession {
			space_id: space_id.to_string(),
			pointer,
			view_box,
			origin_world: client_to_world(&view_box, viewport, client),
			origin_client: client,
			base,
			layout_center,
			radius,
			travel: 0.0,
		});
	}

	/// Follows the pointer. Returns the dragged space and its new offset.
	pub fn update(&mut self, pointer: i32, client: Point, viewport: &Viewport) -> Option<(String, Point)> {
		let session = self.session.as_mut().filter(|s| s.pointer == pointer)?;
		session.travel = session.travel.max(client.distance(session.origin_client));
		let world = client_to_world(&session.view_box, viewport, client);
		let candidate = session.base + (world - session.origin_world);
		let min_distance = session.radius + self.core_radius + self.core_padding;
		let fallback = session.layout_center + session.base;
		let center = clamp_outside_core(session.layout_center + candidate, min_distance, fallback);
		self.offset = center - session.layout_center;
		Some((session.space_id.clone(), self.offset))
	}

	/// Ends the drag. A release after real movement suppresses the next click
	/// on that space.
	pub fn end(&mut self, pointer: i32, client: Point, viewport: &Viewport) -> Option<DragRelease> {
		if self.session.as_ref()?.pointer != pointer {
			return None;
		}
		self.update(pointer, client, viewport);
		let session = self.session.take()?;
		let moved = session.travel > self.click_threshold;
		if moved {
			self.suppressed.insert(session.space_id.clone());
		}
		debug!("symbolfield-station: drag end {} moved={}", session.space_id, moved);
		Some(DragRelease {
			space_id: session.space_id,
			offset: self.offset,
			moved,
		})
	}

	/// Abandons the drag, returning the space and the offset it started with.
	pub fn cancel(&mut self) -> Option<(String, Point)> {
		let session = self.session.take()?;
		self.offset = session.base;
		Some((session.space_id, session.base))
	}

	/// Returns whether a click on `space_id` should be ignored, clearing the flag.
	pub fn consume_click_suppression(&mut self, space_id: &str) -> bool {
		self.suppressed.remove(space_id)
	}

	/// Drops stale suppressions; a new press means the pending click never came.
	pub fn clear_click_suppression(&mut self) {
		self.suppressed.clear();
	}
}

/// Topmost cluster whose disk contains `world`.
pub fn space_at(clusters: &[SpaceCluster], world: Point) -> Option<&SpaceCluster> {
	clusters
		.iter()
		.rev()
		.find(|c| c.center.distance(world) <= c.radius)
}

/// Projects `center` radially onto the circle of `min_distance` when it lies
/// inside it. At the origin the direction of `fallback` is used, then +x.
pub fn clamp_outside_core(center: Point, min_distance: f64, fallback: Point) -> Point {
	let distance = center.length();
	if distance >= min_distance {
		return center;
	}
	let direction = if distance > f64::EPSILON {
		center * (1.0 / distance)
	} else if fallback.length() > f64::EPSILON {
		fallback * (1.0 / fallback.length())
	} else {
		Point::new(1.0, 0.0)
	};
	direction * min_distance
}
