//! Camera state and view box math.
//!
//! The SVG uses `preserveAspectRatio="xMidYMid meet"`, so the view box is
//! scaled uniformly to fit the element and centred along the slack axis.
//! Every client/world conversion here follows that rule.

use super::types::{Bounds, Point, SpaceCluster};
use crate::config::CameraConfig;

/// SVG view box in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
	pub x: f64,
	pub y: f64,
	pub w: f64,
	pub h: f64,
}

impl ViewBox {
	pub fn centered(center: Point, side: f64) -> Self {
		Self {
			x: center.x - side / 2.0,
			y: center.y - side / 2.0,
			w: side,
			h: side,
		}
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
	}

	/// Value for the SVG `viewBox` attribute.
	pub fn to_attr(&self) -> String {
		format!("{} {} {} {}", self.x, self.y, self.w, self.h)
	}
}

/// Client rectangle of the rendered SVG element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			left: 0.0,
			top: 0.0,
			width: 1400.0,
			height: 1400.0,
		}
	}
}

impl Viewport {
	pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
		Self {
			left,
			top,
			width,
			height,
		}
	}

	pub fn center(&self) -> Point {
		Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
	}

	/// Screen pixels per world unit when showing `view_box`.
	pub fn pixels_per_unit(&self, view_box: &ViewBox) -> f64 {
		self.fit(view_box).0
	}

	fn is_degenerate(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}

	/// How far a square view box reaches past its side along each axis once
	/// letterboxed into this element.
	fn aspect_extent(&self) -> (f64, f64) {
		if self.is_degenerate() {
			return (1.0, 1.0);
		}
		(
			(self.width / self.height).max(1.0),
			(self.height / self.width).max(1.0),
		)
	}

	/// Pixels per world unit and the letterbox offsets for `view_box`.
	fn fit(&self, view_box: &ViewBox) -> (f64, f64, f64) {
		if self.is_degenerate() || view_box.w <= 0.0 || view_box.h <= 0.0 {
			return (1.0, 0.0, 0.0);
		}
		let scale = (self.width / view_box.w).min(self.height / view_box.h);
		(
			scale,
			(self.width - view_box.w * scale) / 2.0,
			(self.height - view_box.h * scale) / 2.0,
		)
	}
}

/// What the camera is centred on when it is not free-roaming.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Focus {
	/// Cluster centre, offset included.
	pub center: Point,
	pub radius: f64,
}

impl Focus {
	pub fn of(cluster: &SpaceCluster) -> Self {
		Self {
			center: cluster.center,
			radius: cluster.radius,
		}
	}
}

/// Zoom and pan, plus the limits they live within.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
	zoom: f64,
	pan: Point,
	config: CameraConfig,
}

impl Camera {
	pub fn new(config: CameraConfig) -> Self {
		Self {
			zoom: 1.0,
			pan: Point::ORIGIN,
			config,
		}
	}

	pub fn zoom(&self) -> f64 {
		self.zoom
	}

	pub fn pan(&self) -> Point {
		self.pan
	}

	pub fn config(&self) -> &CameraConfig {
		&self.config
	}

	pub fn clamp_zoom(&self, zoom: f64) -> f64 {
		if !zoom.is_finite() {
			return self.zoom;
		}
		zoom.clamp(self.config.min_zoom, self.config.max_zoom)
	}

	pub fn set(&mut self, zoom: f64, pan: Point) {
		self.zoom = self.clamp_zoom(zoom);
		if pan.is_finite() {
			self.pan = pan;
		}
	}

	/// Back to zoom 1 with no pan.
	pub fn reset(&mut self) {
		self.zoom = 1.0;
		self.pan = Point::ORIGIN;
	}

	/// Centre and side of the view box at zoom 1 with no pan.
	fn base(&self, focus: Option<Focus>) -> (Point, f64) {
		match focus {
			Some(f) => (
				f.center,
				self.config
					.focus_min_size
					.max(f.radius * self.config.focus_radius_factor),
			),
			None => (Point::ORIGIN, self.config.default_view_size),
		}
	}

	fn view_box_for(&self, zoom: f64, pan: Point, focus: Option<Focus>) -> ViewBox {
		let (center, side) = self.base(focus);
		ViewBox::centered(center + pan, side / zoom)
	}

	pub fn view_box(&self, focus: Option<Focus>) -> ViewBox {
		self.view_box_for(self.zoom, self.pan, focus)
	}

	pub fn client_to_world(&self, client: Point, viewport: &Viewport, focus: Option<Focus>) -> Point {
		client_to_world(&self.view_box(focus), viewport, client)
	}

	/// Sets the zoom while keeping the world point under `client` in place.
	pub fn zoom_around_point(
		&mut self,
		next_zoom: f64,
		client: Point,
		viewport: &Viewport,
		focus: Option<Focus>,
	) {
		let next_zoom = self.clamp_zoom(next_zoom);
		let anchor = self.client_to_world(client, viewport, focus);
		// World position is linear in pan with unit slope, so the pan that
		// keeps the anchor is the anchor minus its position at zero pan.
		let unpanned = client_to_world(&self.view_box_for(next_zoom, Point::ORIGIN, focus), viewport, client);
		self.zoom = next_zoom;
		self.pan = anchor - unpanned;
	}

	/// Multiplies the zoom by `factor` around `client`.
	pub fn zoom_by(&mut self, factor: f64, client: Point, viewport: &Viewport, focus: Option<Focus>) {
		if factor.is_finite() && factor > 0.0 {
			self.zoom_around_point(self.zoom * factor, client, viewport, focus);
		}
	}

	/// Next multiple of the zoom step above the current zoom, around the
	/// viewport centre.
	pub fn step_in(&mut self, viewport: &Viewport, focus: Option<Focus>) {
		let next = step_zoom(self.zoom, self.config.zoom_step, true);
		self.zoom_around_point(next, viewport.center(), viewport, focus);
	}

	pub fn step_out(&mut self, viewport: &Viewport, focus: Option<Focus>) {
		let next = step_zoom(self.zoom, self.config.zoom_step, false);
		self.zoom_around_point(next, viewport.center(), viewport, focus);
	}

	/// Moves the view opposite to a pointer movement of `delta` client pixels.
	pub fn pan_by_client(&mut self, delta: Point, viewport: &Viewport, focus: Option<Focus>) {
		let (scale, _, _) = viewport.fit(&self.view_box(focus));
		let world = delta * (1.0 / scale);
		if world.is_finite() {
			self.pan = self.pan - world;
		}
	}

	/// Frames every cluster and the ArcheCore disk in the visible area of
	/// `viewport`, including the letterbox slack of a non-square element.
	pub fn fit(
		&mut self,
		clusters: &[SpaceCluster],
		core_radius: f64,
		viewport: &Viewport,
		focus: Option<Focus>,
	) {
		let mut bounds = Bounds::empty();
		bounds.include_disk(Point::ORIGIN, core_radius);
		for cluster in clusters {
			bounds.include_disk(cluster.center, cluster.radius);
		}
		let bounds = bounds.padded(self.config.fit_padding);
		let (base_center, side) = self.base(focus);
		let (extent_x, extent_y) = viewport.aspect_extent();
		let zoom = (side * extent_x / bounds.width().max(1.0)).min(side * extent_y / bounds.height().max(1.0));
		self.zoom = self.clamp_zoom(zoom);
		self.pan = bounds.center() - base_center;
	}
}

/// Converts a client point to world coordinates under `view_box`.
pub fn client_to_world(view_box: &ViewBox, viewport: &Viewport, client: Point) -> Point {
	let (scale, offset_x, offset_y) = viewport.fit(view_box);
	Point::new(
		view_box.x + (client.x - viewport.left - offset_x) / scale,
		view_box.y + (client.y - viewport.top - offset_y) / scale,
	)
}

/// Next (or previous) multiple of `step` strictly beyond `zoom`.
pub fn step_zoom(zoom: f64, step: f64, zoom_in: bool) -> f64 {
	const EPSILON: f64 = 1e-6;
	let ratio = zoom / step;
	if zoom_in {
		((ratio + EPSILON).floor() + 1.0) * step
	} else {
		((ratio - EPSILON).ceil() - 1.0) * step
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn approx(a: Point, b: Point) -> bool {
		a.distance(b) < 1e-6
	}

	fn wide_viewport() -> Viewport {
		Viewport::new(20.0, 40.0, 1600.0, 900.0)
	}

	#[test]
	fn test_default_view_box() {
		let camera = Camera::new(CameraConfig::default());
		let vb = camera.view_box(None);
		assert_eq!(vb, ViewBox { x: -700.0, y: -700.0, w: 1400.0, h: 1400.0 });
		assert_eq!(vb.to_attr(), "-700 -700 1400 1400");
	}

	#[test]
	fn test_focused_view_box() {
		let mut camera = Camera::new(CameraConfig::default());
		let small = Focus { center: Point::new(300.0, 100.0), radius: 60.0 };
		assert_eq!(camera.view_box(Some(small)).w, 360.0);
		let big = Focus { center: Point::new(300.0, 100.0), radius: 200.0 };
		camera.set(2.0, Point::new(10.0, 0.0));
		let vb = camera.view_box(Some(big));
		assert!((vb.w - 320.0).abs() < 1e-9);
		assert!(approx(vb.center(), Point::new(310.0, 100.0)));
	}

	#[test]
	fn test_client_to_world_letterboxes() {
		let camera = Camera::new(CameraConfig::default());
		let viewport = wide_viewport();
		// Centre of the element is the centre of the world.
		assert!(approx(camera.client_to_world(viewport.center(), &viewport, None), Point::ORIGIN));
		// Scale is 900/1400; the top edge of the element is the top of the box.
		let top = camera.client_to_world(Point::new(820.0, 40.0), &viewport, None);
		assert!(approx(top, Point::new(0.0, -700.0)));
	}

	#[test]
	fn test_zoom_keeps_point_under_cursor() {
		let mut camera = Camera::new(CameraConfig::default());
		camera.set(0.8, Point::new(-120.0, 45.0));
		let viewport = wide_viewport();
		let cursor = Point::new(300.0, 700.0);
		let focus = Some(Focus { center: Point::new(250.0, -90.0), radius: 140.0 });
		for focus in [None, focus] {
			let before = camera.client_to_world(cursor, &viewport, focus);
			camera.zoom_around_point(1.7, cursor, &viewport, focus);
			assert_eq!(camera.zoom(), 1.7);
			assert!(approx(camera.client_to_world(cursor, &viewport, focus), before));
		}
	}

	#[test]
	fn test_repeated_zoom_pairs_do_not_drift() {
		let mut camera = Camera::new(CameraConfig::default());
		let viewport = wide_viewport();
		let cursor = Point::new(1200.0, 200.0);
		let start_pan = camera.pan();
		for _ in 0..50 {
			camera.zoom_around_point(1.5, cursor, &viewport, None);
			camera.zoom_around_point(1.0, cursor, &viewport, None);
		}
		assert_eq!(camera.zoom(), 1.0);
		assert!(approx(camera.pan(), start_pan));
	}

	#[test]
	fn test_zoom_is_clamped() {
		let mut camera = Camera::new(CameraConfig::default());
		let viewport = Viewport::default();
		camera.zoom_around_point(10.0, viewport.center(), &viewport, None);
		assert_eq!(camera.zoom(), 2.0);
		camera.zoom_by(0.01, viewport.center(), &viewport, None);
		assert_eq!(camera.zoom(), 0.25);
		camera.zoom_around_point(f64::NAN, viewport.center(), &viewport, None);
		assert_eq!(camera.zoom(), 0.25);
	}

	#[test]
	fn test_step_zoom_lands_on_multiples() {
		assert_eq!(step_zoom(1.0, 0.25, true), 1.25);
		assert_eq!(step_zoom(1.1, 0.25, true), 1.25);
		assert_eq!(step_zoom(1.0, 0.25, false), 0.75);
		assert_eq!(step_zoom(1.1, 0.25, false), 1.0);

		let mut camera = Camera::new(CameraConfig::default());
		let viewport = Viewport::default();
		for _ in 0..10 {
			camera.step_in(&viewport, None);
		}
		assert_eq!(camera.zoom(), 2.0);
		camera.step_out(&viewport, None);
		assert_eq!(camera.zoom(), 1.75);
	}

	#[test]
	fn test_pan_moves_opposite_to_pointer() {
		let mut camera = Camera::new(CameraConfig::default());
		let viewport = Viewport::default();
		camera.pan_by_client(Point::new(100.0, -50.0), &viewport, None);
		assert!(approx(camera.pan(), Point::new(-100.0, 50.0)));
	}

	#[test]
	fn test_fit_frames_all_clusters() {
		let mut camera = Camera::new(CameraConfig::default());
		let cluster = SpaceCluster {
			id: "s".into(),
			name: "s".into(),
			center: Point::new(1000.0, 0.0),
			core_point: None,
			radius: 100.0,
			has_core: false,
			clusters: vec![],
			nodes: vec![],
			links: vec![],
			areas: vec![],
		};
		camera.fit(std::slice::from_ref(&cluster), 90.0, &Viewport::default(), None);
		// Bounds x: -170..1180, y: -180..180.
		assert!((camera.zoom() - 1400.0 / 1350.0).abs() < 1e-9);
		assert!(approx(camera.pan(), Point::new(505.0, 0.0)));

		camera.reset();
		assert_eq!(camera.zoom(), 1.0);
		assert_eq!(camera.pan(), Point::ORIGIN);
	}

	#[test]
	fn test_fit_uses_letterbox_slack_of_wide_viewport() {
		let mut camera = Camera::new(CameraConfig::default());
		let cluster = |id: &str, x: f64| SpaceCluster {
			id: id.into(),
			name: id.into(),
			center: Point::new(x, 0.0),
			core_point: None,
			radius: 60.0,
			has_core: false,
			clusters: vec![],
			nodes: vec![],
			links: vec![],
			areas: vec![],
		};
		let clusters = [cluster("w", -1200.0), cluster("e", 1200.0)];
		let viewport = Viewport::new(0.0, 0.0, 1600.0, 900.0);
		camera.fit(&clusters, 90.0, &viewport, None);
		// Padded bounds are 2680 wide; the element is 16:9, so the wide
		// extent fills the full width.
		assert!((camera.zoom() - 1400.0 * (1600.0 / 900.0) / 2680.0).abs() < 1e-9);
		let left = camera.client_to_world(Point::new(0.0, 450.0), &viewport, None);
		let right = camera.client_to_world(Point::new(1600.0, 450.0), &viewport, None);
		assert!((left.x + 1340.0).abs() < 1e-6, "left edge at {}", left.x);
		assert!((right.x - 1340.0).abs() < 1e-6, "right edge at {}", right.x);
		let top = camera.client_to_world(Point::new(800.0, 0.0), &viewport, None);
		assert!(top.y <= -150.0);
	}
}
