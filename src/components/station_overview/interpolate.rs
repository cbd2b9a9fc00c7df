//! Eases rendered clusters toward their layout targets.

use std::cell::Cell;
use std::collections::HashMap;

use super::types::{AreaShape, Point, ProjectedArea, ProjectedLink, ProjectedPoint, SpaceCluster};
use crate::config::MotionConfig;

/// Source of animation frames. The owner runs [`Interpolator::run_frame`]
/// whenever a requested frame fires.
pub trait FrameScheduler {
	/// Requests one frame. Requests made before it fires coalesce.
	fn request_frame(&self);
	/// Drops a pending frame, if any.
	fn cancel_frame(&self);
}

/// Scheduler driven by hand, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct ManualScheduler {
	pending: Cell<bool>,
	requests: Cell<usize>,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_pending(&self) -> bool {
		self.pending.get()
	}

	/// Consumes the pending frame. Returns whether there was one.
	pub fn take_frame(&self) -> bool {
		self.pending.replace(false)
	}

	pub fn requests(&self) -> usize {
		self.requests.get()
	}
}

impl FrameScheduler for ManualScheduler {
	fn request_frame(&self) {
		self.pending.set(true);
		self.requests.set(self.requests.get() + 1);
	}

	fn cancel_frame(&self) {
		self.pending.set(false);
	}
}

trait Ease: Clone {
	fn key(&self) -> &str;
	fn ease(&self, target: &Self, t: f64) -> Self;
	/// Largest per-axis difference to `other`.
	fn delta(&self, other: &Self) -> f64;
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a + (b - a) * t
}

impl Ease for ProjectedPoint {
	fn key(&self) -> &str {
		&self.id
	}

	fn ease(&self, target: &Self, t: f64) -> Self {
		let p = self.position().lerp(target.position(), t);
		ProjectedPoint {
			x: p.x,
			y: p.y,
			..target.clone()
		}
	}

	fn delta(&self, other: &Self) -> f64 {
		self.position().max_axis_delta(other.position())
	}
}

impl Ease for ProjectedLink {
	fn key(&self) -> &str {
		&self.id
	}

	fn ease(&self, target: &Self, t: f64) -> Self {
		ProjectedLink {
			id: target.id.clone(),
			x1: lerp(self.x1, target.x1, t),
			y1: lerp(self.y1, target.y1, t),
			x2: lerp(self.x2, target.x2, t),
			y2: lerp(self.y2, target.y2, t),
		}
	}

	fn delta(&self, other: &Self) -> f64 {
		Point::new(self.x1, self.y1)
			.max_axis_delta(Point::new(other.x1, other.y1))
			.max(Point::new(self.x2, self.y2).max_axis_delta(Point::new(other.x2, other.y2)))
	}
}

impl Ease for ProjectedArea {
	fn key(&self) -> &str {
		&self.id
	}

	fn ease(&self, target: &Self, t: f64) -> Self {
		let shape = match (self.shape, target.shape) {
			(AreaShape::Rect { x, y, w, h }, AreaShape::Rect { x: tx, y: ty, w: tw, h: th }) => {
				AreaShape::Rect {
					x: lerp(x, tx, t),
					y: lerp(y, ty, t),
					w: lerp(w, tw, t),
					h: lerp(h, th, t),
				}
			}
			(AreaShape::Circle { cx, cy, r }, AreaShape::Circle { cx: tx, cy: ty, r: tr }) => {
				AreaShape::Circle {
					cx: lerp(cx, tx, t),
					cy: lerp(cy, ty, t),
					r: lerp(r, tr, t),
				}
			}
			// Shape changed kind; nothing to ease between.
			(_, shape) => shape,
		};
		ProjectedArea {
			shape,
			..target.clone()
		}
	}

	fn delta(&self, other: &Self) -> f64 {
		match (self.shape, other.shape) {
			(AreaShape::Rect { x, y, w, h }, AreaShape::Rect { x: ox, y: oy, w: ow, h: oh }) => {
				[x - ox, y - oy, w - ow, h - oh]
					.into_iter()
					.fold(0.0, |m, d| m.max(d.abs()))
			}
			(AreaShape::Circle { cx, cy, r }, AreaShape::Circle { cx: ox, cy: oy, r: or }) => {
				[cx - ox, cy - oy, r - or]
					.into_iter()
					.fold(0.0, |m, d| m.max(d.abs()))
			}
			_ => f64::INFINITY,
		}
	}
}

fn ease_list<T: Ease>(previous: &[T], target: &[T], t: f64) -> Vec<T> {
	let by_key: HashMap<&str, &T> = previous.iter().map(|p| (p.key(), p)).collect();
	target
		.iter()
		.map(|goal| match by_key.get(goal.key()) {
			Some(prev) => prev.ease(goal, t),
			None => goal.clone(),
		})
		.collect()
}

fn list_delta<T: Ease>(a: &[T], b: &[T]) -> f64 {
	a.iter().zip(b).fold(0.0, |m, (x, y)| m.max(x.delta(y)))
}

impl Ease for SpaceCluster {
	fn key(&self) -> &str {
		&self.id
	}

	fn ease(&self, target: &Self, t: f64) -> Self {
		SpaceCluster {
			id: target.id.clone(),
			name: target.name.clone(),
			center: self.center.lerp(target.center, t),
			core_point: match (self.core_point, target.core_point) {
				(Some(a), Some(b)) => Some(a.lerp(b, t)),
				(_, goal) => goal,
			},
			radius: lerp(self.radius, target.radius, t),
			has_core: target.has_core,
			clusters: ease_list(&self.clusters, &target.clusters, t),
			nodes: ease_list(&self.nodes, &target.nodes, t),
			links: ease_list(&self.links, &target.links, t),
			areas: ease_list(&self.areas, &target.areas, t),
		}
	}

	fn delta(&self, other: &Self) -> f64 {
		let core = match (self.core_point, other.core_point) {
			(Some(a), Some(b)) => a.max_axis_delta(b),
			_ => 0.0,
		};
		self.center
			.max_axis_delta(other.center)
			.max((self.radius - other.radius).abs())
			.max(core)
			.max(list_delta(&self.clusters, &other.clusters))
			.max(list_delta(&self.nodes, &other.nodes))
			.max(list_delta(&self.links, &other.links))
			.max(list_delta(&self.areas, &other.areas))
	}
}

/// Holds the rendered frame and the target it is easing toward.
#[derive(Clone, Debug)]
pub struct Interpolator {
	rendered: Vec<SpaceCluster>,
	target: Vec<SpaceCluster>,
	motion: MotionConfig,
	animating: bool,
}

impl Interpolator {
	pub fn new(motion: MotionConfig) -> Self {
		Self {
			rendered: Vec::new(),
			target: Vec::new(),
			motion,
			animating: false,
		}
	}

	pub fn rendered(&self) -> &[SpaceCluster] {
		&self.rendered
	}

	pub fn target(&self) -> &[SpaceCluster] {
		&self.target
	}

	pub fn is_animating(&self) -> bool {
		self.animating
	}

	/// Replaces the target. With `immediate` (or nothing rendered yet) the
	/// rendered frame jumps straight to it. Returns whether frames are needed.
	pub fn set_target(&mut self, target: Vec<SpaceCluster>, immediate: bool) -> bool {
		if immediate || self.rendered.is_empty() {
			self.rendered = target.clone();
			self.target = target;
			self.animating = false;
			return false;
		}
		self.target = target;
		self.animating = true;
		true
	}

	/// Advances one frame. Returns whether another frame is needed.
	pub fn step(&mut self) -> bool {
		if !self.animating {
			return false;
		}
		let next = ease_list(&self.rendered, &self.target, self.motion.factor);
		if list_delta(&next, &self.target) < self.motion.threshold {
			self.rendered = self.target.clone();
			self.animating = false;
		} else {
			self.rendered = next;
		}
		self.animating
	}

	/// Moves one cluster by `delta` in both the target and the rendered
	/// frame, leaving every other cluster alone. Returns whether it exists.
	pub fn translate(&mut self, id: &str, delta: Point) -> bool {
		let mut found = false;
		for list in [&mut self.target, &mut self.rendered] {
			if let Some(cluster) = list.iter_mut().find(|c| c.id == id) {
				cluster.translate(delta);
				found = true;
			}
		}
		found
	}

	/// Jumps to the target and stops.
	pub fn snap(&mut self) {
		self.rendered = self.target.clone();
		self.animating = false;
	}

	/// [`Self::set_target`], keeping `scheduler` in sync.
	pub fn retarget(
		&mut self,
		target: Vec<SpaceCluster>,
		immediate: bool,
		scheduler: &dyn FrameScheduler,
	) {
		if self.set_target(target, immediate) {
			scheduler.request_frame();
		} else {
			scheduler.cancel_frame();
		}
	}

	/// Runs one scheduled frame and requests the next while motion remains.
	pub fn run_frame(&mut self, scheduler: &dyn FrameScheduler) {
		if self.step() {
			scheduler.request_frame();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cluster(id: &str, x: f64, y: f64) -> SpaceCluster {
		SpaceCluster {
			id: id.into(),
			name: id.into(),
			center: Point::new(x, y),
			core_point: Some(Point::new(x, y)),
			radius: 60.0,
			has_core: true,
			clusters: vec![],
			nodes: vec![ProjectedPoint {
				id: "n".into(),
				x: x + 10.0,
				y,
				parent_cluster_id: None,
				color: None,
			}],
			links: vec![],
			areas: vec![],
		}
	}

	#[test]
	fn test_first_target_snaps() {
		let mut interp = Interpolator::new(MotionConfig::default());
		assert!(!interp.set_target(vec![cluster("a", 300.0, 0.0)], false));
		assert_eq!(interp.rendered(), interp.target());
	}

	#[test]
	fn test_converges_and_stops() {
		let motion = MotionConfig::default();
		let mut interp = Interpolator::new(motion.clone());
		interp.set_target(vec![cluster("a", 0.0, 0.0)], false);
		assert!(interp.set_target(vec![cluster("a", 1000.0, -500.0)], false));

		let scheduler = ManualScheduler::new();
		scheduler.request_frame();
		let mut frames = 0;
		while scheduler.take_frame() {
			interp.run_frame(&scheduler);
			frames += 1;
			assert!(frames < 100, "interpolation did not converge");
		}
		assert!(frames > 1);
		assert!(!interp.is_animating());
		assert_eq!(interp.rendered(), interp.target());
		assert!(!interp.step());
	}

	#[test]
	fn test_single_step_moves_by_factor() {
		let mut interp = Interpolator::new(MotionConfig::default());
		interp.set_target(vec![cluster("a", 0.0, 0.0)], false);
		interp.set_target(vec![cluster("a", 100.0, 0.0)], false);
		assert!(interp.step());
		let c = &interp.rendered()[0];
		assert!((c.center.x - 16.0).abs() < 1e-9);
		assert!((c.nodes[0].x - 26.0).abs() < 1e-9);
	}

	#[test]
	fn test_new_entities_snap() {
		let mut interp = Interpolator::new(MotionConfig::default());
		interp.set_target(vec![cluster("a", 0.0, 0.0)], false);
		interp.set_target(vec![cluster("a", 50.0, 0.0), cluster("b", 400.0, 400.0)], false);
		interp.step();
		assert_eq!(interp.rendered()[1], cluster("b", 400.0, 400.0));
		assert!(interp.rendered()[0].center.x < 50.0);
	}

	#[test]
	fn test_immediate_target_skips_easing() {
		let scheduler = ManualScheduler::new();
		let mut interp = Interpolator::new(MotionConfig::default());
		interp.retarget(vec![cluster("a", 0.0, 0.0)], false, &scheduler);
		interp.retarget(vec![cluster("a", 100.0, 0.0)], false, &scheduler);
		assert!(scheduler.is_pending());
		interp.retarget(vec![cluster("a", 120.0, 0.0)], true, &scheduler);
		assert!(!scheduler.is_pending());
		assert_eq!(interp.rendered()[0].center.x, 120.0);
	}

	#[test]
	fn test_small_change_snaps_on_first_frame() {
		let mut interp = Interpolator::new(MotionConfig::default());
		interp.set_target(vec![cluster("a", 0.0, 0.0)], false);
		interp.set_target(vec![cluster("a", 0.3, 0.0)], false);
		assert!(!interp.step());
		assert_eq!(interp.rendered()[0].center.x, 0.3);
	}

	#[test]
	fn test_translate_moves_one_cluster_without_easing() {
		let mut interp = Interpolator::new(MotionConfig::default());
		interp.set_target(vec![cluster("a", 0.0, 0.0), cluster("b", 300.0, 0.0)], false);
		assert!(interp.translate("b", Point::new(20.0, -5.0)));
		assert!(!interp.is_animating());
		assert_eq!(interp.rendered(), interp.target());
		assert_eq!(interp.rendered()[0], cluster("a", 0.0, 0.0));
		assert_eq!(interp.rendered()[1], cluster("b", 320.0, -5.0));
		assert!(!interp.translate("missing", Point::new(1.0, 1.0)));
	}
}
