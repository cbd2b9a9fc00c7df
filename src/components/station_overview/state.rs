//! Per-view state of the station overview.
//!
//! `OverviewState` owns everything one mounted overview needs: the computed
//! layout, user offsets, camera, gesture and drag controllers, and the
//! interpolated clusters actually on screen. It has no browser dependency;
//! the component feeds it normalised [`InputEvent`]s and draws its [`Scene`].

use std::collections::BTreeSet;

use log::{debug, info};

use super::camera::{Camera, Focus, Viewport};
use super::drag::{DragController, space_at};
use super::gesture::{GestureAction, GestureInterpreter, InputEvent, PointerTarget};
use super::hotkeys::ZoomCommand;
use super::interpolate::{FrameScheduler, Interpolator};
use super::layout::{StationSnapshot, build_clusters};
use super::offsets::{LayoutOffsetMap, LayoutOffsetStore, apply_offsets, offset_of};
use super::render::{ClusterScene, Scene, SceneInput, build_cluster_scene, build_scene};
use super::scale::{DetailLevel, ScaleConfig};
use super::theme::StationTheme;
use super::types::{Point, SpaceCluster};
use crate::config::StationConfig;

/// Notifications for the host of the overview.
#[derive(Clone, Debug, PartialEq)]
pub enum OverviewEvent {
	/// A space was clicked (not dragged) and is now selected.
	SpaceClicked(String),
	/// The selection was cleared by a background click or by deletion.
	SelectionCleared,
	HoverChanged(Option<String>),
	/// A drag finished and the offsets were persisted.
	OffsetsChanged,
}

/// What has to be redrawn since the scene was last taken.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SceneChange {
	#[default]
	None,
	/// Only these spaces changed.
	Spaces(BTreeSet<String>),
	/// The camera, the layout or a shared setting changed.
	Full,
}

impl SceneChange {
	fn touch(&mut self, id: &str) {
		match self {
			SceneChange::Full => {}
			SceneChange::Spaces(ids) => {
				ids.insert(id.to_string());
			}
			SceneChange::None => *self = SceneChange::Spaces(BTreeSet::from([id.to_string()])),
		}
	}
}

/// State of one mounted overview.
///
/// Input goes through [`OverviewState::handle`], which returns the events the
/// host should see. Every mutation records a [`SceneChange`]; the host takes
/// it after each update and redraws only what it names, so dragging a space
/// costs the size of that space rather than of the whole station.
pub struct OverviewState {
	config: StationConfig,
	offset_store: LayoutOffsetStore,
	/// Layout without offsets.
	layout: Vec<SpaceCluster>,
	offsets: LayoutOffsetMap,
	interpolator: Interpolator,
	camera: Camera,
	gestures: GestureInterpreter,
	drag: DragController,
	viewport: Viewport,
	detail: DetailLevel,
	hovered: Option<String>,
	selected: Option<String>,
	focused: Option<String>,
	highlighted: Option<String>,
	press: Option<(i32, Point)>,
	press_moved: bool,
	change: SceneChange,
}

impl OverviewState {
	pub fn new(config: StationConfig, offset_store: LayoutOffsetStore) -> Self {
		let offsets = offset_store.load();
		debug!("symbolfield-station: {} stored layout offsets", offsets.len());
		Self {
			interpolator: Interpolator::new(config.motion.clone()),
			camera: Camera::new(config.camera.clone()),
			gestures: GestureInterpreter::new(config.camera.clone()),
			drag: DragController::new(&config.drag, &config.layout),
			config,
			offset_store,
			layout: Vec::new(),
			offsets,
			viewport: Viewport::default(),
			detail: DetailLevel::default(),
			hovered: None,
			selected: None,
			focused: None,
			highlighted: None,
			press: None,
			press_moved: false,
			change: SceneChange::Full,
		}
	}

	pub fn config(&self) -> &StationConfig {
		&self.config
	}

	pub fn camera(&self) -> &Camera {
		&self.camera
	}

	/// Clusters as currently drawn.
	pub fn rendered(&self) -> &[SpaceCluster] {
		self.interpolator.rendered()
	}

	/// Clusters with offsets applied, as they will settle.
	pub fn target(&self) -> &[SpaceCluster] {
		self.interpolator.target()
	}

	pub fn offsets(&self) -> &LayoutOffsetMap {
		&self.offsets
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	pub fn detail(&self) -> DetailLevel {
		self.detail
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.is_dragging()
	}

	/// Returns what changed since the last call and starts tracking afresh.
	pub fn take_change(&mut self) -> SceneChange {
		std::mem::take(&mut self.change)
	}

	fn invalidate(&mut self) {
		self.change = SceneChange::Full;
	}

	fn touch(&mut self, id: Option<&str>) {
		if let Some(id) = id {
			self.change.touch(id);
		}
	}

	pub fn set_viewport(&mut self, viewport: Viewport) {
		if self.viewport != viewport {
			self.viewport = viewport;
			self.invalidate();
		}
	}

	pub fn set_detail(&mut self, detail: DetailLevel) {
		if self.detail != detail {
			self.detail = detail;
			self.invalidate();
		}
	}

	pub fn set_highlight(&mut self, space_id: Option<String>) {
		if self.highlighted != space_id {
			let previous = std::mem::replace(&mut self.highlighted, space_id.clone());
			self.touch(previous.as_deref());
			self.touch(space_id.as_deref());
		}
	}

	/// Centres the camera on a space, or releases it. The camera resets so the
	/// focused space starts centred.
	pub fn set_focus(&mut self, space_id: Option<String>) {
		if self.focused != space_id {
			self.focused = space_id;
			self.camera.reset();
			self.invalidate();
		}
	}

	fn focus(&self) -> Option<Focus> {
		let id = self.focused.as_deref()?;
		self.interpolator
			.target()
			.iter()
			.find(|c| c.id == id)
			.map(Focus::of)
	}

	/// Recomputes the layout from a fresh snapshot.
	pub fn rebuild(&mut self, snapshot: &StationSnapshot, scheduler: &dyn FrameScheduler) -> Vec<OverviewEvent> {
		self.layout = build_clusters(snapshot, &self.config.layout);
		info!("symbolfield-station: layout rebuilt for {} spaces", self.layout.len());
		if let Some(dragged) = self.drag.dragged_space() {
			if !self.layout.iter().any(|c| c.id == dragged) {
				self.drag.cancel();
				self.gestures.reset();
			}
		}
		self.retarget(scheduler);

		let mut events = Vec::new();
		let exists = |id: &Option<String>| {
			id.as_deref()
				.is_none_or(|id| self.layout.iter().any(|c| c.id == id))
		};
		if !exists(&self.selected) {
			self.selected = None;
			events.push(OverviewEvent::SelectionCleared);
		}
		if !exists(&self.hovered) {
			self.hovered = None;
			events.push(OverviewEvent::HoverChanged(None));
		}
		events
	}

	fn retarget(&mut self, scheduler: &dyn FrameScheduler) {
		let target = apply_offsets(&self.layout, &self.offsets);
		let immediate = self.drag.is_dragging();
		self.interpolator.retarget(target, immediate, scheduler);
		self.invalidate();
	}

	/// Moves a space to `offset` from its computed place without touching
	/// any other space.
	fn move_space(&mut self, space_id: String, offset: Point) {
		let delta = offset - offset_of(&self.offsets, &space_id);
		self.interpolator.translate(&space_id, delta);
		self.touch(Some(space_id.as_str()));
		self.offsets.insert(space_id, offset);
	}

	/// Runs one animation frame.
	pub fn tick(&mut self, scheduler: &dyn FrameScheduler) {
		if self.interpolator.is_animating() {
			self.invalidate();
		}
		if self.drag.is_dragging() {
			self.interpolator.snap();
			return;
		}
		self.interpolator.run_frame(scheduler);
	}

	/// Forgets stored offsets and returns every space to its computed place.
	pub fn reset_layout(&mut self, scheduler: &dyn FrameScheduler) -> Vec<OverviewEvent> {
		self.offsets.clear();
		self.offset_store.clear();
		self.retarget(scheduler);
		vec![OverviewEvent::OffsetsChanged]
	}

	/// Space under a client point.
	pub fn hit_target(&self, client: Point) -> PointerTarget {
		let world = self.camera.client_to_world(client, &self.viewport, self.focus());
		match space_at(self.interpolator.rendered(), world) {
			Some(cluster) => PointerTarget::Space(cluster.id.clone()),
			None => PointerTarget::Canvas,
		}
	}

	fn hover_at(&mut self, client: Point) -> Option<OverviewEvent> {
		let hovered = match self.hit_target(client) {
			PointerTarget::Space(id) => Some(id),
			PointerTarget::Canvas => None,
		};
		self.set_hover(hovered)
	}

	fn set_hover(&mut self, hovered: Option<String>) -> Option<OverviewEvent> {
		if self.hovered == hovered {
			return None;
		}
		let previous = std::mem::replace(&mut self.hovered, hovered.clone());
		self.touch(previous.as_deref());
		self.touch(hovered.as_deref());
		Some(OverviewEvent::HoverChanged(hovered))
	}

	pub fn run_command(&mut self, command: ZoomCommand) {
		let focus = self.focus();
		match command {
			ZoomCommand::ZoomIn => self.camera.step_in(&self.viewport, focus),
			ZoomCommand::ZoomOut => self.camera.step_out(&self.viewport, focus),
			ZoomCommand::ZoomReset => self.camera.reset(),
			ZoomCommand::ZoomFit => {
				self.camera.fit(
					self.interpolator.target(),
					self.config.layout.core_radius,
					&self.viewport,
					focus,
				)
			}
		}
		self.invalidate();
		debug!("symbolfield-station: {:?} -> zoom {:.2}", command, self.camera.zoom());
	}

	pub fn handle(&mut self, event: &InputEvent, scheduler: &dyn FrameScheduler) -> Vec<OverviewEvent> {
		let mut events = Vec::new();
		match event {
			InputEvent::PointerDown { id, client, .. } => {
				self.drag.clear_click_suppression();
				self.press = Some((*id, *client));
				self.press_moved = false;
			}
			InputEvent::PointerMove { id, client, .. } => {
				if let Some((pid, origin)) = self.press {
					if pid == *id && origin.distance(*client) > self.config.drag.click_threshold_px {
						self.press_moved = true;
					}
				}
				if !self.gestures.is_bound(*id) {
					events.extend(self.hover_at(*client));
				}
			}
			InputEvent::Click { client } => {
				match self.hit_target(*client) {
					PointerTarget::Space(id) => {
						if !self.drag.consume_click_suppression(&id) {
							let previous = self.selected.replace(id.clone());
							self.touch(previous.as_deref());
							self.touch(Some(id.as_str()));
							events.push(OverviewEvent::SpaceClicked(id));
						}
					}
					PointerTarget::Canvas => {
						if !self.press_moved {
							if let Some(previous) = self.selected.take() {
								self.touch(Some(previous.as_str()));
								events.push(OverviewEvent::SelectionCleared);
							}
						}
					}
				}
			}
			InputEvent::PointerLeave => events.extend(self.set_hover(None)),
			InputEvent::Hotkey(command) => {
				// The drag tracks the pointer in the view it started with.
				if self.drag.is_dragging() {
					debug!("symbolfield-station: {:?} ignored while dragging", command);
				} else {
					self.run_command(*command);
				}
			}
			_ => {}
		}

		if let Some(action) = self.gestures.handle(event, &self.viewport) {
			events.extend(self.apply(action, scheduler));
		}
		events
	}

	fn apply(&mut self, action: GestureAction, scheduler: &dyn FrameScheduler) -> Option<OverviewEvent> {
		let focus = self.focus();
		match action {
			GestureAction::Zoom { factor, anchor } => {
				self.camera.zoom_by(factor, anchor, &self.viewport, focus);
				self.invalidate();
				None
			}
			GestureAction::Pan { delta } => {
				self.camera.pan_by_client(delta, &self.viewport, focus);
				self.invalidate();
				None
			}
			GestureAction::DragStart {
				pointer,
				space_id,
				client,
			} => {
				let cluster = self.layout.iter().find(|c| c.id == space_id)?;
				let (center, radius) = (cluster.center, cluster.radius);
				self.drag.start(
					&space_id,
					pointer,
					client,
					self.camera.view_box(focus),
					&self.viewport,
					center,
					radius,
					offset_of(&self.offsets, &space_id),
				);
				if self.interpolator.is_animating() {
					self.interpolator.snap();
					self.invalidate();
				}
				scheduler.cancel_frame();
				None
			}
			GestureAction::DragMove { pointer, client } => {
				let (space_id, offset) = self.drag.update(pointer, client, &self.viewport)?;
				self.move_space(space_id, offset);
				None
			}
			GestureAction::DragEnd { pointer, client } => {
				let release = self.drag.end(pointer, client, &self.viewport)?;
				self.move_space(release.space_id, release.offset);
				self.offset_store.save(&self.offsets);
				Some(OverviewEvent::OffsetsChanged)
			}
			GestureAction::DragCancel { .. } => {
				let (space_id, base) = self.drag.cancel()?;
				if base == Point::ORIGIN {
					self.offsets.remove(&space_id);
				} else {
					self.offsets.insert(space_id, base);
				}
				self.retarget(scheduler);
				None
			}
		}
	}

	fn scene_input<'a>(&'a self, theme: &'a StationTheme, scale: &'a ScaleConfig) -> SceneInput<'a> {
		let view_box = self.camera.view_box(self.focus());
		SceneInput {
			clusters: self.interpolator.rendered(),
			view_box,
			pixels_per_unit: self.viewport.pixels_per_unit(&view_box),
			detail: self.detail,
			hovered: self.hovered.as_deref(),
			selected: self.selected.as_deref(),
			highlighted: self.highlighted.as_deref(),
			theme,
			scale,
		}
	}

	/// Drawable scene for the current frame.
	pub fn scene(&self, theme: &StationTheme, scale: &ScaleConfig) -> Scene {
		build_scene(&self.scene_input(theme, scale))
	}

	/// Drawable scene of one space, if it exists.
	pub fn cluster_scene(&self, space_id: &str, theme: &StationTheme, scale: &ScaleConfig) -> Option<ClusterScene> {
		let input = self.scene_input(theme, scale);
		let cluster = input.clusters.iter().find(|c| c.id == space_id)?;
		Some(build_cluster_scene(cluster, &input))
	}
}
