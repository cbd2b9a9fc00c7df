//! Leptos component rendering the station overview as SVG.
//!
//! Browser events are normalised into [`InputEvent`]s and handed to
//! [`OverviewState`]; after each one the component republishes whatever part
//! of the [`Scene`] the state reports as changed. Each space has its own
//! signal, keyed by id, so a drag redraws only the dragged space. Animation
//! frames run through `requestAnimationFrame` and stop as soon as the
//! interpolator settles.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::reactive::owner::Owner;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, Element, Event, MouseEvent, PointerEvent, WheelEvent, Window};

use super::camera::Viewport;
use super::gesture::{DeltaMode, InputEvent, PointerKind};
use super::hotkeys::{HotkeySource, ZOOM_HOTKEY_EVENT, ZoomCommand, ZoomHotkeyDetail, dispatch_zoom_hotkey, read_zoom_hotkey};
use super::interpolate::FrameScheduler;
use super::layout::StationSnapshot;
use super::metrics::{SpaceMetrics, compute_metrics};
use super::offsets::LayoutOffsetStore;
use super::render::{AreaPrimitive, CirclePrimitive, ClusterScene, LabelPrimitive, LinePrimitive, Scene, SceneChrome};
use super::scale::{DetailLevel, ScaleConfig};
use super::state::{OverviewEvent, OverviewState, SceneChange};
use super::theme::StationTheme;
use super::types::{AreaShape, Point};
use crate::config::StationConfig;
use crate::store::{BrowserStorage, KeyValueStorage, SpaceEvent, SpaceStore, Subscription};

type Listener = Closure<dyn FnMut(Event)>;

/// Scene signal of every space, in draw order.
type ClusterSignals = Vec<(String, RwSignal<ClusterScene>)>;

/// Scene parts to republish after an update.
enum Redraw {
	Full(Scene),
	Spaces(Vec<ClusterScene>),
}

fn publish(signal: RwSignal<ClusterScene>, scene: ClusterScene) {
	if signal.with_untracked(|current| *current != scene) {
		signal.set(scene);
	}
}

/// Overview state with the visual configuration it is drawn with.
struct StationContext {
	state: OverviewState,
	theme: StationTheme,
	scale: ScaleConfig,
}

/// Keeps at most one animation frame in flight.
#[derive(Default)]
struct RafScheduler {
	handle: Cell<Option<i32>>,
	callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl RafScheduler {
	/// Drops the frame closure, breaking its reference back to the scheduler.
	fn dispose(&self) {
		self.cancel_frame();
		self.callback.borrow_mut().take();
	}
}

impl FrameScheduler for RafScheduler {
	fn request_frame(&self) {
		if self.handle.get().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let callback = self.callback.borrow();
		let Some(cb) = callback.as_ref() else {
			return;
		};
		match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(handle) => self.handle.set(Some(handle)),
			Err(e) => warn!("symbolfield-station: requestAnimationFrame failed: {:?}", e),
		}
	}

	fn cancel_frame(&self) {
		if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(handle);
		}
	}
}

/// Handle shared by every listener of one mounted overview.
#[derive(Clone)]
struct Overview {
	context: Rc<RefCell<Option<StationContext>>>,
	scheduler: Rc<RafScheduler>,
	chrome: RwSignal<Option<SceneChrome>>,
	clusters: RwSignal<ClusterSignals>,
	/// Owner of the per-space signals, so they live as long as the view.
	owner: Option<Owner>,
	store: Rc<dyn SpaceStore>,
	storage: Rc<dyn KeyValueStorage>,
	on_select: Option<Callback<Option<SpaceMetrics>>>,
	on_hover: Option<Callback<Option<String>>>,
}

impl Overview {
	/// Runs `f` against the state, republishes what changed and forwards the
	/// resulting events once the state is released.
	fn update(&self, f: impl FnOnce(&mut OverviewState, &dyn FrameScheduler) -> Vec<OverviewEvent>) {
		let (events, redraw, include_playground) = {
			let mut guard = self.context.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			let events = f(&mut c.state, self.scheduler.as_ref());
			let redraw = match c.state.take_change() {
				SceneChange::None => None,
				SceneChange::Full => Some(Redraw::Full(c.state.scene(&c.theme, &c.scale))),
				SceneChange::Spaces(ids) => Some(Redraw::Spaces(
					ids.iter()
						.filter_map(|id| c.state.cluster_scene(id, &c.theme, &c.scale))
						.collect(),
				)),
			};
			(events, redraw, c.state.config().include_playground)
		};
		if let Some(redraw) = redraw {
			self.redraw(redraw);
		}
		for event in events {
			match event {
				OverviewEvent::SpaceClicked(id) => {
					if let Some(ref cb) = self.on_select {
						cb.run(compute_metrics(self.store.as_ref(), &id, include_playground));
					}
				}
				OverviewEvent::SelectionCleared => {
					if let Some(ref cb) = self.on_select {
						cb.run(None);
					}
				}
				OverviewEvent::HoverChanged(id) => {
					if let Some(ref cb) = self.on_hover {
						cb.run(id);
					}
				}
				OverviewEvent::OffsetsChanged => debug!("symbolfield-station: layout offsets saved"),
			}
		}
	}

	fn redraw(&self, redraw: Redraw) {
		match redraw {
			Redraw::Spaces(scenes) => {
				for scene in scenes {
					let signal = self
						.clusters
						.with_untracked(|list| list.iter().find(|(id, _)| *id == scene.id).map(|(_, s)| *s));
					if let Some(signal) = signal {
						publish(signal, scene);
					}
				}
			}
			Redraw::Full(Scene { chrome, clusters }) => {
				if self.chrome.with_untracked(|current| current.as_ref() != Some(&chrome)) {
					self.chrome.set(Some(chrome));
				}
				let previous = self.clusters.get_untracked();
				let same_order = previous.len() == clusters.len()
					&& previous.iter().zip(&clusters).all(|((id, _), scene)| *id == scene.id);
				let mut signals: HashMap<String, RwSignal<ClusterScene>> = previous.into_iter().collect();
				let next: ClusterSignals = clusters
					.into_iter()
					.map(|scene| {
						let id = scene.id.clone();
						let signal = match signals.remove(&id) {
							Some(signal) => {
								publish(signal, scene);
								signal
							}
							None => match &self.owner {
								Some(owner) => owner.with(|| RwSignal::new(scene)),
								None => RwSignal::new(scene),
							},
						};
						(id, signal)
					})
					.collect();
				if !same_order {
					self.clusters.set(next);
				}
				for (_, stale) in signals {
					stale.dispose();
				}
			}
		}
	}

	fn input(&self, viewport: Option<Viewport>, event: InputEvent) {
		self.update(|state, scheduler| {
			if let Some(viewport) = viewport {
				state.set_viewport(viewport);
			}
			state.handle(&event, scheduler)
		});
	}

	fn rebuild(&self) {
		let Some(config) = self.context.borrow().as_ref().map(|c| c.state.config().clone()) else {
			return;
		};
		let snapshot = StationSnapshot::capture(
			self.store.as_ref(),
			self.storage.as_ref(),
			&config.storage,
			config.include_playground,
		);
		self.update(|state, scheduler| state.rebuild(&snapshot, scheduler));
	}

	fn frame(&self) {
		self.scheduler.handle.set(None);
		self.update(|state, scheduler| {
			state.tick(scheduler);
			Vec::new()
		});
	}
}

/// Listeners and subscriptions to release on unmount.
struct Teardown {
	window: Window,
	svg: Element,
	window_listeners: Vec<(&'static str, Listener)>,
	svg_listeners: Vec<(&'static str, Listener)>,
	subscription: Option<Subscription>,
	scheduler: Rc<RafScheduler>,
}

impl Drop for Teardown {
	fn drop(&mut self) {
		for (name, cb) in &self.window_listeners {
			let _ = self
				.window
				.remove_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
		}
		for (name, cb) in &self.svg_listeners {
			let _ = self
				.svg
				.remove_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
		}
		self.subscription.take();
		self.scheduler.dispose();
		debug!("symbolfield-station: overview detached");
	}
}

fn measure(svg: &Element) -> Viewport {
	let rect = svg.get_bounding_client_rect();
	Viewport::new(rect.left(), rect.top(), rect.width(), rect.height())
}

fn client_of(ev: &MouseEvent) -> Point {
	Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

/// Reads a numeric property of a non-standard event such as Safari's
/// `GestureEvent`.
fn event_number(ev: &Event, name: &str) -> Option<f64> {
	js_sys::Reflect::get(ev, &JsValue::from_str(name))
		.ok()
		.and_then(|v| v.as_f64())
}

fn gesture_input(name: &str, ev: &Event) -> InputEvent {
	let time = ev.time_stamp();
	let scale = event_number(ev, "scale").unwrap_or(1.0);
	let client = Point::new(
		event_number(ev, "clientX").unwrap_or(0.0),
		event_number(ev, "clientY").unwrap_or(0.0),
	);
	match name {
		"gesturestart" => InputEvent::GestureStart { scale, client, time },
		"gesturechange" => InputEvent::GestureChange { scale, client, time },
		_ => InputEvent::GestureEnd { time },
	}
}

/// Renders every space around the ArcheCore as an interactive SVG map.
///
/// Spaces are read from `store` and re-laid out whenever it reports a change.
/// Dragged positions persist through `storage` (browser `localStorage` by
/// default). `focused` centres the camera on one space; `highlighted` marks a
/// space chosen elsewhere in the app.
#[component]
pub fn StationOverview(
	store: Rc<dyn SpaceStore>,
	#[prop(optional)] storage: Option<Rc<dyn KeyValueStorage>>,
	#[prop(optional)] config: Option<StationConfig>,
	#[prop(into, optional)] focused: MaybeProp<String>,
	#[prop(into, optional)] highlighted: MaybeProp<String>,
	/// Called with the clicked space's metrics, or `None` when the selection clears.
	#[prop(optional, into)]
	on_select: Option<Callback<Option<SpaceMetrics>>>,
	#[prop(optional, into)] on_hover: Option<Callback<Option<String>>>,
) -> impl IntoView {
	let svg_ref = NodeRef::<leptos::svg::Svg>::new();
	let chrome = RwSignal::new(None::<SceneChrome>);
	let clusters = RwSignal::new(ClusterSignals::new());
	let detail = RwSignal::new(DetailLevel::default());
	let teardown = StoredValue::new_local(None::<Teardown>);

	let overview = Overview {
		context: Rc::new(RefCell::new(None)),
		scheduler: Rc::new(RafScheduler::default()),
		chrome,
		clusters,
		owner: Owner::current(),
		store,
		storage: storage.unwrap_or_else(|| Rc::new(BrowserStorage)),
		on_select,
		on_hover,
	};
	let config = config.unwrap_or_default();

	let overview_init = overview.clone();
	Effect::new(move |_| {
		let Some(svg) = svg_ref.get() else {
			return;
		};
		if overview_init.context.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let svg: Element = svg.into();

		let offset_store = LayoutOffsetStore::new(overview_init.storage.clone(), config.storage.layout_offsets.clone());
		let mut state = OverviewState::new(config.clone(), offset_store);
		state.set_viewport(measure(&svg));
		state.set_focus(focused.get_untracked());
		state.set_highlight(highlighted.get_untracked());
		*overview_init.context.borrow_mut() = Some(StationContext {
			state,
			theme: StationTheme::default(),
			scale: ScaleConfig::default(),
		});

		let overview_frame = overview_init.clone();
		*overview_init.scheduler.callback.borrow_mut() = Some(Closure::new(move || overview_frame.frame()));

		let overview_store = overview_init.clone();
		let subscription = overview_init.store.subscribe(Rc::new(move |event: &SpaceEvent| {
			debug!("symbolfield-station: store changed ({})", event.space_id());
			overview_store.rebuild();
		}));

		let mut window_listeners: Vec<(&'static str, Listener)> = Vec::new();
		let overview_resize = overview_init.clone();
		let svg_resize = svg.clone();
		window_listeners.push((
			"resize",
			Closure::new(move |_: Event| {
				let viewport = measure(&svg_resize);
				overview_resize.update(|state, _| {
					state.set_viewport(viewport);
					Vec::new()
				});
			}),
		));
		let overview_hotkey = overview_init.clone();
		window_listeners.push((
			ZOOM_HOTKEY_EVENT,
			Closure::new(move |ev: Event| {
				let Some(command) = ev.dyn_ref::<CustomEvent>().and_then(read_zoom_hotkey) else {
					return;
				};
				overview_hotkey.input(None, InputEvent::Hotkey(command));
			}),
		));

		let mut svg_listeners: Vec<(&'static str, Listener)> = Vec::new();
		for name in ["gesturestart", "gesturechange", "gestureend"] {
			let overview_gesture = overview_init.clone();
			let svg_gesture = svg.clone();
			svg_listeners.push((
				name,
				Closure::new(move |ev: Event| {
					ev.prevent_default();
					overview_gesture.input(Some(measure(&svg_gesture)), gesture_input(name, &ev));
				}),
			));
		}

		for (name, cb) in &window_listeners {
			let _ = window.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
		}
		for (name, cb) in &svg_listeners {
			let _ = svg.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
		}

		teardown.set_value(Some(Teardown {
			window,
			svg,
			window_listeners,
			svg_listeners,
			subscription: Some(subscription),
			scheduler: overview_init.scheduler.clone(),
		}));
		overview_init.rebuild();
		info!("symbolfield-station: overview mounted");
	});

	on_cleanup(move || {
		teardown.try_update_value(|t| t.take());
	});

	let overview_focus = overview.clone();
	Effect::new(move |_| {
		let focus = focused.get();
		overview_focus.update(|state, _| {
			state.set_focus(focus);
			Vec::new()
		});
	});

	let overview_highlight = overview.clone();
	Effect::new(move |_| {
		let space = highlighted.get();
		overview_highlight.update(|state, _| {
			state.set_highlight(space);
			Vec::new()
		});
	});

	let viewport_now = move || svg_ref.get_untracked().map(|svg| measure(&svg.into()));

	let overview_pd = overview.clone();
	let on_pointerdown = move |ev: PointerEvent| {
		if ev.pointer_type() == "mouse" && ev.button() != 0 {
			return;
		}
		let client = client_of(&ev);
		let viewport = viewport_now();
		overview_pd.update(|state, scheduler| {
			if let Some(viewport) = viewport {
				state.set_viewport(viewport);
			}
			let target = state.hit_target(client);
			state.handle(
				&InputEvent::PointerDown {
					id: ev.pointer_id(),
					kind: PointerKind::from_dom(&ev.pointer_type()),
					target,
					client,
					time: ev.time_stamp(),
				},
				scheduler,
			)
		});
		if let Some(svg) = svg_ref.get_untracked() {
			let _ = svg.set_pointer_capture(ev.pointer_id());
		}
	};

	let overview_pm = overview.clone();
	let on_pointermove = move |ev: PointerEvent| {
		overview_pm.input(
			None,
			InputEvent::PointerMove {
				id: ev.pointer_id(),
				client: client_of(&ev),
				time: ev.time_stamp(),
			},
		);
	};

	let overview_pu = overview.clone();
	let on_pointerup = move |ev: PointerEvent| {
		overview_pu.input(
			None,
			InputEvent::PointerUp {
				id: ev.pointer_id(),
				client: client_of(&ev),
				time: ev.time_stamp(),
			},
		);
	};

	let overview_pc = overview.clone();
	let on_pointercancel = move |ev: PointerEvent| {
		overview_pc.input(None, InputEvent::PointerCancel { id: ev.pointer_id() });
	};

	let overview_pl = overview.clone();
	let on_pointerleave = move |_: PointerEvent| {
		overview_pl.input(None, InputEvent::PointerLeave);
	};

	let overview_click = overview.clone();
	let on_click = move |ev: MouseEvent| {
		overview_click.input(viewport_now(), InputEvent::Click { client: client_of(&ev) });
	};

	let overview_wheel = overview.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		overview_wheel.input(
			viewport_now(),
			InputEvent::Wheel {
				delta: Point::new(ev.delta_x(), ev.delta_y()),
				mode: DeltaMode::from_dom(ev.delta_mode()),
				zoom_modifier: ev.ctrl_key() || ev.meta_key(),
				client: client_of(&ev),
				time: ev.time_stamp(),
			},
		);
	};

	let overview_detail = overview.clone();
	let on_detail = move |_: MouseEvent| {
		let next = detail.get_untracked().next();
		detail.set(next);
		overview_detail.update(|state, _| {
			state.set_detail(next);
			Vec::new()
		});
	};

	let overview_reset = overview.clone();
	let on_reset_layout = move |_: MouseEvent| {
		overview_reset.update(|state, scheduler| state.reset_layout(scheduler));
	};

	view! {
		<div class="station-overview" style="position: relative; width: 100%; height: 100%;">
			<svg
				node_ref=svg_ref
				class="station-overview-svg"
				viewBox=move || {
					chrome.with(|c| {
						c.as_ref()
							.map(|c| c.view_box.to_attr())
							.unwrap_or_else(|| "-700 -700 1400 1400".to_string())
					})
				}
				preserveAspectRatio="xMidYMid meet"
				on:pointerdown=on_pointerdown
				on:pointermove=on_pointermove
				on:pointerup=on_pointerup
				on:pointercancel=on_pointercancel
				on:pointerleave=on_pointerleave
				on:click=on_click
				on:wheel=on_wheel
				style="display: block; width: 100%; height: 100%; touch-action: none; cursor: grab;"
			>
				{move || chrome.get().map(chrome_view)}
				<For
					each=move || clusters.get()
					key=|(id, _): &(String, RwSignal<ClusterScene>)| id.clone()
					children=|(_, scene): (String, RwSignal<ClusterScene>)| move || cluster_view(scene.get())
				/>
			</svg>
			<div class="station-hud">
				<span class="station-hud-summary">
					{move || {
						chrome.with(|c| {
							c.as_ref()
								.map(|c| {
									format!(
										"{} spaces, {} nodes, {} links, {} clusters",
										c.summary.spaces,
										c.summary.nodes,
										c.summary.edges,
										c.summary.clusters,
									)
								})
								.unwrap_or_default()
						})
					}}
				</span>
				<button class="station-hud-detail" on:click=on_detail>
					{move || detail.get().label()}
				</button>
				<button on:click=move |_| zoom_button(ZoomCommand::ZoomOut)>"-"</button>
				<button on:click=move |_| zoom_button(ZoomCommand::ZoomIn)>"+"</button>
				<button on:click=move |_| zoom_button(ZoomCommand::ZoomFit)>"Fit"</button>
				<button on:click=move |_| zoom_button(ZoomCommand::ZoomReset)>"1:1"</button>
				<button on:click=on_reset_layout>"Reset layout"</button>
			</div>
		</div>
	}
}

/// HUD buttons go through the same global event as keyboard shortcuts.
fn zoom_button(command: ZoomCommand) {
	if let Some(window) = web_sys::window() {
		dispatch_zoom_hotkey(
			&window,
			ZoomHotkeyDetail {
				command,
				source: Some(HotkeySource::Ui),
			},
		);
	}
}

fn chrome_view(chrome: SceneChrome) -> impl IntoView {
	let vb = chrome.view_box;
	view! {
		<rect
			x=vb.x.to_string()
			y=vb.y.to_string()
			width=vb.w.to_string()
			height=vb.h.to_string()
			fill=chrome.background
		/>
		{circle_view(chrome.archecore_glow)}
		{circle_view(chrome.archecore)}
	}
}

fn cluster_view(cluster: ClusterScene) -> impl IntoView {
	let mut class = String::from("station-space");
	for (flag, name) in [
		(cluster.hovered, " is-hovered"),
		(cluster.selected, " is-selected"),
		(cluster.highlighted, " is-highlighted"),
	] {
		if flag {
			class.push_str(name);
		}
	}
	view! {
		<g class=class>
			{cluster.portal.map(line_view)}
			{cluster.selection_ring.map(circle_view)}
			{circle_view(cluster.outline)}
			{cluster.areas.into_iter().map(area_view).collect_view()}
			{cluster.links.into_iter().map(line_view).collect_view()}
			{cluster.spokes.into_iter().map(line_view).collect_view()}
			{cluster.sub_clusters.into_iter().map(circle_view).collect_view()}
			{cluster.nodes.into_iter().map(circle_view).collect_view()}
			{cluster.core.map(circle_view)}
			{label_view(cluster.label)}
		</g>
	}
}

fn line_view(line: LinePrimitive) -> impl IntoView {
	view! {
		<line
			x1=line.from.x.to_string()
			y1=line.from.y.to_string()
			x2=line.to.x.to_string()
			y2=line.to.y.to_string()
			stroke=line.stroke
			stroke-width=line.width.to_string()
			opacity=line.opacity.to_string()
			stroke-linecap="round"
		/>
	}
}

fn circle_view(circle: CirclePrimitive) -> impl IntoView {
	view! {
		<circle
			cx=circle.center.x.to_string()
			cy=circle.center.y.to_string()
			r=circle.r.to_string()
			fill=circle.fill
			stroke=circle.stroke.unwrap_or_else(|| "none".to_string())
			stroke-width=circle.stroke_width.to_string()
		/>
	}
}

fn area_view(area: AreaPrimitive) -> AnyView {
	match area.shape {
		AreaShape::Rect { x, y, w, h } => view! {
			<rect
				x=x.to_string()
				y=y.to_string()
				width=w.to_string()
				height=h.to_string()
				fill=area.fill
				stroke=area.stroke
				fill-opacity=area.opacity.to_string()
			/>
		}
		.into_any(),
		AreaShape::Circle { cx, cy, r } => view! {
			<circle
				cx=cx.to_string()
				cy=cy.to_string()
				r=r.to_string()
				fill=area.fill
				stroke=area.stroke
				fill-opacity=area.opacity.to_string()
			/>
		}
		.into_any(),
	}
}

fn label_view(label: LabelPrimitive) -> impl IntoView {
	view! {
		<text
			x=label.anchor.x.to_string()
			y=label.anchor.y.to_string()
			font-size=label.size.to_string()
			fill=label.color
			text-anchor="middle"
			style="pointer-events: none; user-select: none;"
		>
			{label.text}
		</text>
	}
}
