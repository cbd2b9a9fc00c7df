//! Turns raw pointer, wheel and native gesture input into camera actions.
//!
//! Pointers are bound to one interaction when they go down and keep it until
//! they are released: a pointer that started dragging a space never pans, and
//! a touch that joined a pinch never drags.

use std::collections::BTreeMap;

use super::camera::Viewport;
use super::hotkeys::ZoomCommand;
use super::types::Point;
use crate::config::CameraConfig;

/// Unit of wheel deltas, as in `WheelEvent.deltaMode`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
	#[default]
	Pixel,
	Line,
	Page,
}

impl DeltaMode {
	pub fn from_dom(mode: u32) -> Self {
		match mode {
			1 => DeltaMode::Line,
			2 => DeltaMode::Page,
			_ => DeltaMode::Pixel,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
	Mouse,
	Pen,
	Touch,
}

impl PointerKind {
	pub fn from_dom(kind: &str) -> Self {
		match kind {
			"touch" => PointerKind::Touch,
			"pen" => PointerKind::Pen,
			_ => PointerKind::Mouse,
		}
	}
}

/// What a pointer went down on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerTarget {
	Canvas,
	Space(String),
}

/// Platform-independent input, in client pixels and milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
	PointerDown {
		id: i32,
		kind: PointerKind,
		target: PointerTarget,
		client: Point,
		time: f64,
	},
	PointerMove {
		id: i32,
		client: Point,
		time: f64,
	},
	PointerUp {
		id: i32,
		client: Point,
		time: f64,
	},
	PointerCancel {
		id: i32,
	},
	Wheel {
		delta: Point,
		mode: DeltaMode,
		/// Ctrl or meta held; also set by browsers for trackpad pinches.
		zoom_modifier: bool,
		client: Point,
		time: f64,
	},
	GestureStart {
		scale: f64,
		client: Point,
		time: f64,
	},
	GestureChange {
		scale: f64,
		client: Point,
		time: f64,
	},
	GestureEnd {
		time: f64,
	},
	Click {
		client: Point,
	},
	/// The pointer left the overview.
	PointerLeave,
	Hotkey(ZoomCommand),
}

/// Camera or drag intent derived from input.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureAction {
	/// Multiply the zoom by `factor`, keeping `anchor` (client) in place.
	Zoom { factor: f64, anchor: Point },
	/// Move the scene content by `delta` client pixels.
	Pan { delta: Point },
	DragStart { pointer: i32, space_id: String, client: Point },
	DragMove { pointer: i32, client: Point },
	DragEnd { pointer: i32, client: Point },
	DragCancel { pointer: i32 },
}

#[derive(Clone, Debug, PartialEq)]
enum Binding {
	Pan { last: Point },
	CanvasTouch { last: Point },
	SpaceDrag,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pinch {
	a: i32,
	b: i32,
	distance: f64,
}

/// Scales a wheel delta to pixels.
pub fn normalize_wheel(delta: Point, mode: DeltaMode, line_height: f64, page_height: f64) -> Point {
	match mode {
		DeltaMode::Pixel => delta,
		DeltaMode::Line => delta * line_height,
		DeltaMode::Page => delta * page_height,
	}
}

/// Binds each pointer to one interaction and turns input into
/// [`GestureAction`]s.
///
/// Zooming suppresses panning for `zoom_pan_cooldown_ms`, and a native
/// gesture suppresses wheel pans until `pinch_guard_ms` after it ends, so the
/// tail of a pinch never shifts the view. While a space is being dragged the
/// camera holds still, since the drag tracks the pointer in the view box it
/// started with.
#[derive(Clone, Debug)]
pub struct GestureInterpreter {
	config: CameraConfig,
	bindings: BTreeMap<i32, Binding>,
	pinch: Option<Pinch>,
	native_active: bool,
	native_scale: f64,
	native_ended_at: Option<f64>,
	last_zoom_at: Option<f64>,
}

impl GestureInterpreter {
	pub fn new(config: CameraConfig) -> Self {
		Self {
			config,
			bindings: BTreeMap::new(),
			pinch: None,
			native_active: false,
			native_scale: 1.0,
			native_ended_at: None,
			last_zoom_at: None,
		}
	}

	pub fn is_bound(&self, pointer: i32) -> bool {
		self.bindings.contains_key(&pointer)
	}

	pub fn is_pinching(&self) -> bool {
		self.pinch.is_some() || self.native_active
	}

	/// Forgets every binding and timer.
	pub fn reset(&mut self) {
		*self = Self::new(self.config.clone());
	}

	/// Whether some pointer is dragging a space.
	pub fn is_dragging(&self) -> bool {
		self.bindings.values().any(|b| matches!(b, Binding::SpaceDrag))
	}

	fn within(since: Option<f64>, now: f64, window: f64) -> bool {
		since.is_some_and(|t| now >= t && now - t < window)
	}

	fn cooling_down(&self, time: f64) -> bool {
		Self::within(self.last_zoom_at, time, self.config.zoom_pan_cooldown_ms)
	}

	fn zoom(&mut self, factor: f64, anchor: Point, time: f64) -> Option<GestureAction> {
		if self.is_dragging() {
			return None;
		}
		self.last_zoom_at = Some(time);
		(factor.is_finite() && factor > 0.0).then_some(GestureAction::Zoom { factor, anchor })
	}

	fn touch_positions(&self, pinch: &Pinch) -> Option<(Point, Point)> {
		match (self.bindings.get(&pinch.a), self.bindings.get(&pinch.b)) {
			(Some(Binding::CanvasTouch { last: a }), Some(Binding::CanvasTouch { last: b })) => {
				Some((*a, *b))
			}
			_ => None,
		}
	}

	pub fn handle(&mut self, event: &InputEvent, viewport: &Viewport) -> Option<GestureAction> {
		match event {
			InputEvent::PointerDown {
				id,
				kind,
				target,
				client,
				..
			} => self.pointer_down(*id, *kind, target, *client),
			InputEvent::PointerMove { id, client, time } => self.pointer_move(*id, *client, *time),
			InputEvent::PointerUp { id, client, .. } => self.pointer_up(*id, Some(*client)),
			InputEvent::PointerCancel { id } => self.pointer_up(*id, None),
			InputEvent::Wheel {
				delta,
				mode,
				zoom_modifier,
				client,
				time,
			} => {
				let delta = normalize_wheel(*delta, *mode, self.config.wheel_line_height, viewport.height);
				if *zoom_modifier {
					let factor = (-delta.y * self.config.wheel_zoom_sensitivity).exp();
					return self.zoom(factor, *client, *time);
				}
				if self.native_active
					|| Self::within(self.native_ended_at, *time, self.config.pinch_guard_ms)
					|| self.cooling_down(*time)
					|| self.is_dragging()
				{
					return None;
				}
				Some(GestureAction::Pan { delta: delta * -1.0 })
			}
			InputEvent::GestureStart { scale, .. } => {
				self.native_active = true;
				self.native_scale = if *scale > 0.0 { *scale } else { 1.0 };
				None
			}
			InputEvent::GestureChange { scale, client, time } => {
				if !self.native_active || !(*scale > 0.0) {
					return None;
				}
				let factor = scale / self.native_scale;
				self.native_scale = *scale;
				self.zoom(factor, *client, *time)
			}
			InputEvent::GestureEnd { time } => {
				self.native_active = false;
				self.native_ended_at = Some(*time);
				None
			}
			InputEvent::Click { .. } | InputEvent::PointerLeave | InputEvent::Hotkey(_) => None,
		}
	}

	fn pointer_down(
		&mut self,
		id: i32,
		kind: PointerKind,
		target: &PointerTarget,
		client: Point,
	) -> Option<GestureAction> {
		if self.bindings.contains_key(&id) {
			return None;
		}
		match (target, kind) {
			(PointerTarget::Space(space_id), _) => {
				self.bindings.insert(id, Binding::SpaceDrag);
				Some(GestureAction::DragStart {
					pointer: id,
					space_id: space_id.clone(),
					client,
				})
			}
			(PointerTarget::Canvas, PointerKind::Touch) => {
				self.bindings.insert(id, Binding::CanvasTouch { last: client });
				if self.pinch.is_none() {
					let other = self
						.bindings
						.iter()
						.find(|(k, b)| **k != id && matches!(b, Binding::CanvasTouch { .. }))
						.map(|(k, b)| (*k, b.clone()));
					if let Some((other, Binding::CanvasTouch { last })) = other {
						self.pinch = Some(Pinch {
							a: other,
							b: id,
							distance: last.distance(client),
						});
					}
				}
				None
			}
			(PointerTarget::Canvas, _) => {
				self.bindings.insert(id, Binding::Pan { last: client });
				None
			}
		}
	}

	fn pointer_move(&mut self, id: i32, client: Point, time: f64) -> Option<GestureAction> {
		let hold = self.cooling_down(time) || self.is_dragging();
		let binding = self.bindings.get_mut(&id)?;
		match binding {
			Binding::SpaceDrag => Some(GestureAction::DragMove { pointer: id, client }),
			Binding::Pan { last } => {
				let delta = client - *last;
				*last = client;
				(!hold).then_some(GestureAction::Pan { delta })
			}
			Binding::CanvasTouch { last } => {
				let delta = client - *last;
				*last = client;
				match self.pinch {
					Some(pinch) if pinch.a == id || pinch.b == id => {
						let (a, b) = self.touch_positions(&pinch)?;
						let distance = a.distance(b);
						let anchor = (a + b) * 0.5;
						let previous = pinch.distance;
						self.pinch = Some(Pinch { distance, ..pinch });
						if previous <= f64::EPSILON || distance <= f64::EPSILON {
							return None;
						}
						self.zoom(distance / previous, anchor, time)
					}
					Some(_) => None,
					None if hold => None,
					None => Some(GestureAction::Pan { delta }),
				}
			}
		}
	}

	fn pointer_up(&mut self, id: i32, client: Option<Point>) -> Option<GestureAction> {
		let binding = self.bindings.remove(&id)?;
		if self.pinch.is_some_and(|p| p.a == id || p.b == id) {
			self.pinch = None;
		}
		match (binding, client) {
			(Binding::SpaceDrag, Some(client)) => Some(GestureAction::DragEnd { pointer: id, client }),
			(Binding::SpaceDrag, None) => Some(GestureAction::DragCancel { pointer: id }),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn interpreter() -> GestureInterpreter {
		GestureInterpreter::new(CameraConfig::default())
	}

	fn wheel(dy: f64, zoom_modifier: bool, time: f64) -> InputEvent {
		InputEvent::Wheel {
			delta: Point::new(0.0, dy),
			mode: DeltaMode::Pixel,
			zoom_modifier,
			client: Point::new(100.0, 100.0),
			time,
		}
	}

	fn down(id: i32, kind: PointerKind, target: PointerTarget, x: f64, y: f64) -> InputEvent {
		InputEvent::PointerDown {
			id,
			kind,
			target,
			client: Point::new(x, y),
			time: 0.0,
		}
	}

	fn mv(id: i32, x: f64, y: f64) -> InputEvent {
		mv_at(id, x, y, 0.0)
	}

	fn mv_at(id: i32, x: f64, y: f64, time: f64) -> InputEvent {
		InputEvent::PointerMove {
			id,
			client: Point::new(x, y),
			time,
		}
	}

	#[test]
	fn test_plain_wheel_pans() {
		let mut g = interpreter();
		let action = g.handle(&wheel(30.0, false, 0.0), &Viewport::default());
		assert_eq!(action, Some(GestureAction::Pan { delta: Point::new(0.0, -30.0) }));
	}

	#[test]
	fn test_wheel_delta_mode_is_normalized() {
		let viewport = Viewport::new(0.0, 0.0, 800.0, 600.0);
		assert_eq!(normalize_wheel(Point::new(1.0, 2.0), DeltaMode::Line, 16.0, 600.0), Point::new(16.0, 32.0));
		assert_eq!(normalize_wheel(Point::new(0.0, 1.0), DeltaMode::Page, 16.0, 600.0), Point::new(0.0, 600.0));
		let mut g = interpreter();
		let action = g.handle(
			&InputEvent::Wheel {
				delta: Point::new(0.0, 3.0),
				mode: DeltaMode::from_dom(1),
				zoom_modifier: false,
				client: Point::ORIGIN,
				time: 0.0,
			},
			&viewport,
		);
		assert_eq!(action, Some(GestureAction::Pan { delta: Point::new(0.0, -48.0) }));
	}

	#[test]
	fn test_ctrl_wheel_zooms_then_suppresses_pan() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		match g.handle(&wheel(-100.0, true, 1000.0), &viewport) {
			Some(GestureAction::Zoom { factor, anchor }) => {
				assert!((factor - (0.22f64).exp()).abs() < 1e-12);
				assert_eq!(anchor, Point::new(100.0, 100.0));
			}
			other => panic!("expected zoom, got {other:?}"),
		}
		assert_eq!(g.handle(&wheel(10.0, false, 1100.0), &viewport), None);
		assert!(g.handle(&wheel(10.0, false, 1200.0), &viewport).is_some());
	}

	#[test]
	fn test_native_gesture_zooms_and_guards_wheel() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		let at = Point::new(50.0, 60.0);
		g.handle(&InputEvent::GestureStart { scale: 1.0, client: at, time: 0.0 }, &viewport);
		assert!(g.is_pinching());
		let first = g.handle(&InputEvent::GestureChange { scale: 1.5, client: at, time: 10.0 }, &viewport);
		assert_eq!(first, Some(GestureAction::Zoom { factor: 1.5, anchor: at }));
		let second = g.handle(&InputEvent::GestureChange { scale: 1.8, client: at, time: 20.0 }, &viewport);
		match second {
			Some(GestureAction::Zoom { factor, .. }) => assert!((factor - 1.2).abs() < 1e-12),
			other => panic!("expected zoom, got {other:?}"),
		}
		assert_eq!(g.handle(&wheel(5.0, false, 30.0), &viewport), None);
		g.handle(&InputEvent::GestureEnd { time: 400.0 }, &viewport);
		assert_eq!(g.handle(&wheel(5.0, false, 500.0), &viewport), None);
		assert!(g.handle(&wheel(5.0, false, 530.0), &viewport).is_some());
	}

	#[test]
	fn test_mouse_drag_on_canvas_pans() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		assert_eq!(g.handle(&down(1, PointerKind::Mouse, PointerTarget::Canvas, 10.0, 10.0), &viewport), None);
		assert_eq!(
			g.handle(&mv(1, 25.0, 5.0), &viewport),
			Some(GestureAction::Pan { delta: Point::new(15.0, -5.0) })
		);
		g.handle(&InputEvent::PointerUp { id: 1, client: Point::ORIGIN, time: 0.0 }, &viewport);
		assert_eq!(g.handle(&mv(1, 40.0, 40.0), &viewport), None);
	}

	#[test]
	fn test_space_pointer_is_never_reinterpreted() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		let start = g.handle(&down(7, PointerKind::Touch, PointerTarget::Space("s".into()), 0.0, 0.0), &viewport);
		assert!(matches!(start, Some(GestureAction::DragStart { pointer: 7, .. })));
		// A second touch on the canvas does not pair with the dragging pointer.
		g.handle(&down(8, PointerKind::Touch, PointerTarget::Canvas, 100.0, 0.0), &viewport);
		assert!(!g.is_pinching());
		assert_eq!(g.handle(&down(7, PointerKind::Touch, PointerTarget::Canvas, 0.0, 0.0), &viewport), None);
		assert!(matches!(g.handle(&mv(7, 5.0, 5.0), &viewport), Some(GestureAction::DragMove { .. })));
		assert_eq!(
			g.handle(&InputEvent::PointerCancel { id: 7 }, &viewport),
			Some(GestureAction::DragCancel { pointer: 7 })
		);
	}

	#[test]
	fn test_two_touches_pinch() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		g.handle(&down(1, PointerKind::Touch, PointerTarget::Canvas, 0.0, 0.0), &viewport);
		g.handle(&down(2, PointerKind::Touch, PointerTarget::Canvas, 100.0, 0.0), &viewport);
		assert!(g.is_pinching());
		match g.handle(&mv(2, 200.0, 0.0), &viewport) {
			Some(GestureAction::Zoom { factor, anchor }) => {
				assert!((factor - 2.0).abs() < 1e-12);
				assert_eq!(anchor, Point::new(100.0, 0.0));
			}
			other => panic!("expected zoom, got {other:?}"),
		}
		g.handle(&InputEvent::PointerUp { id: 2, client: Point::ORIGIN, time: 0.0 }, &viewport);
		assert!(!g.is_pinching());
		assert_eq!(
			g.handle(&mv_at(1, 10.0, 0.0, 500.0), &viewport),
			Some(GestureAction::Pan { delta: Point::new(10.0, 0.0) })
		);
	}

	#[test]
	fn test_lifting_a_pinch_finger_does_not_pan_during_cooldown() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		g.handle(&down(1, PointerKind::Touch, PointerTarget::Canvas, 100.0, 100.0), &viewport);
		g.handle(&down(2, PointerKind::Touch, PointerTarget::Canvas, 200.0, 100.0), &viewport);
		assert!(matches!(
			g.handle(&mv_at(2, 260.0, 100.0, 1000.0), &viewport),
			Some(GestureAction::Zoom { .. })
		));
		g.handle(&InputEvent::PointerUp { id: 2, client: Point::new(260.0, 100.0), time: 1010.0 }, &viewport);
		assert_eq!(g.handle(&mv_at(1, 70.0, 100.0, 1020.0), &viewport), None);
		// The position is still tracked, so the first pan after the cooldown
		// only carries its own movement.
		assert_eq!(
			g.handle(&mv_at(1, 60.0, 100.0, 1200.0), &viewport),
			Some(GestureAction::Pan { delta: Point::new(-10.0, 0.0) })
		);
	}

	#[test]
	fn test_mouse_pan_waits_for_wheel_zoom_cooldown() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		g.handle(&down(1, PointerKind::Mouse, PointerTarget::Canvas, 0.0, 0.0), &viewport);
		assert!(g.handle(&wheel(-50.0, true, 1000.0), &viewport).is_some());
		assert_eq!(g.handle(&mv_at(1, 20.0, 0.0, 1100.0), &viewport), None);
		assert_eq!(
			g.handle(&mv_at(1, 25.0, 0.0, 1160.0), &viewport),
			Some(GestureAction::Pan { delta: Point::new(5.0, 0.0) })
		);
	}

	#[test]
	fn test_camera_holds_while_a_space_is_dragged() {
		let mut g = interpreter();
		let viewport = Viewport::default();
		g.handle(&down(4, PointerKind::Mouse, PointerTarget::Space("s".into()), 0.0, 0.0), &viewport);
		assert!(g.is_dragging());
		assert_eq!(g.handle(&wheel(-100.0, true, 10.0), &viewport), None);
		assert_eq!(g.handle(&wheel(30.0, false, 12.0), &viewport), None);
		g.handle(&down(5, PointerKind::Touch, PointerTarget::Canvas, 50.0, 50.0), &viewport);
		assert_eq!(g.handle(&mv_at(5, 80.0, 50.0, 14.0), &viewport), None);
		g.handle(&InputEvent::GestureStart { scale: 1.0, client: Point::ORIGIN, time: 20.0 }, &viewport);
		assert_eq!(
			g.handle(&InputEvent::GestureChange { scale: 1.4, client: Point::ORIGIN, time: 30.0 }, &viewport),
			None
		);
		g.handle(&InputEvent::GestureEnd { time: 40.0 }, &viewport);
		assert!(matches!(
			g.handle(&InputEvent::PointerUp { id: 4, client: Point::ORIGIN, time: 50.0 }, &viewport),
			Some(GestureAction::DragEnd { pointer: 4, .. })
		));
		assert!(!g.is_dragging());
		assert!(matches!(g.handle(&wheel(-100.0, true, 60.0), &viewport), Some(GestureAction::Zoom { .. })));
	}
}
