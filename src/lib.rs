//! symbolfield-station: the SymbolField station overview.
//!
//! Every user space orbits the central ArcheCore on one zoomable map. This
//! crate provides the layout, camera and drag engines behind that map and a
//! WASM/Leptos component that renders it as SVG.

use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, debug, info};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent};

pub mod components;
pub mod config;
pub mod store;

pub use components::station_overview::{SpaceMetrics, StationOverview};
pub use config::{StationConfig, load_config};

use components::station_overview::hotkeys::{
	HotkeySource, KeyChord, ZoomHotkeyDetail, dispatch_zoom_hotkey, parse_zoom_hotkey,
};
use store::{BrowserStorage, KeyValueStorage, LocalSpaceStore, SpaceStore};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("symbolfield-station: logging initialized");
}

/// Whether the key event comes from somewhere the user is typing.
fn is_editable_target(event: &KeyboardEvent) -> bool {
	let Some(element) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
		return false;
	};
	if matches!(element.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT") {
		return true;
	}
	element
		.dyn_into::<HtmlElement>()
		.map(|el| el.is_content_editable())
		.unwrap_or(false)
}

/// Turns zoom shortcuts into global `sf:zoom-hotkey` events.
fn on_keydown(event: KeyboardEvent) {
	if event.repeat() || is_editable_target(&event) {
		return;
	}
	let Some(command) = parse_zoom_hotkey(&KeyChord::from_event(&event)) else {
		return;
	};
	event.prevent_default();
	if let Some(window) = web_sys::window() {
		dispatch_zoom_hotkey(
			&window,
			ZoomHotkeyDetail {
				command,
				source: Some(HotkeySource::Keyboard),
			},
		);
	}
}

/// Main application component.
/// Reads spaces from browser storage and renders the station overview.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let storage: Rc<dyn KeyValueStorage> = Rc::new(BrowserStorage);
	let store: Rc<dyn SpaceStore> = Rc::new(LocalSpaceStore::new(storage.clone(), config.storage.clone()));
	let selected = RwSignal::new(None::<SpaceMetrics>);

	let keydown = window_event_listener(ev::keydown, on_keydown);
	on_cleanup(move || keydown.remove());

	let on_select = Callback::new(move |metrics: Option<SpaceMetrics>| {
		if let Some(ref m) = metrics {
			debug!("symbolfield-station: selected {} ({} nodes)", m.id, m.node_count);
		}
		selected.set(metrics);
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="SymbolField Station" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-station">
			<StationOverview store=store storage=storage config=config on_select=on_select />
			<div class="station-overlay">
				<h1>"Station"</h1>
				<p class="subtitle">
					"Drag spaces to rearrange. Scroll to pan, pinch or Ctrl+scroll to zoom."
				</p>
				{move || {
					selected
						.get()
						.map(|m| {
							view! {
								<div class="station-selection">
									<h2>{m.name.clone()}</h2>
									<p>
										{format!(
											"{} nodes, {} edges, {} clusters",
											m.node_count,
											m.edge_count,
											m.cluster_count,
										)}
									</p>
									<p>{format!("weight {:.0}%", m.weight_ratio() * 100.0)}</p>
								</div>
							}
						})
				}}
			</div>
		</div>
	}
}
