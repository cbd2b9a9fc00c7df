//! Station configuration.
//!
//! Every value has a default matching the shipped behaviour, so a page can
//! override only what it needs through a JSON `<script id="station-config">`
//! element.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

/// Placement and projection parameters for the cluster builder.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
	/// Radius of an empty space.
	pub base_radius: f64,
	/// Radius added per square root of the node count.
	pub radius_per_sqrt_node: f64,
	/// Radius added per sub-cluster node.
	pub radius_per_cluster: f64,
	/// Gap kept between two placed spaces.
	pub margin: f64,
	/// Radius of the reserved ArcheCore disk at the origin.
	pub core_radius: f64,
	/// Extra clearance kept around the core disk.
	pub core_padding: f64,
	pub max_attempts: usize,
	/// Up to this many spaces are laid out on a single ring.
	pub ring_max_spaces: usize,
	pub base_orbit: f64,
	/// Spiral orbit growth per `sqrt(index + 1)`.
	pub orbit_step: f64,
	/// Ring orbit growth per failed attempt.
	pub ring_retry_step: f64,
	/// Ring angle nudge per failed attempt, in radians.
	pub ring_retry_angle: f64,
	/// Maximum hash-seeded angular jitter, in radians.
	pub jitter_angle: f64,
	/// Maximum hash-seeded radial jitter.
	pub jitter_orbit: f64,
	/// Share of the cluster radius that projected contents may fill.
	pub fit_ratio: f64,
	/// Local half-size of a leaf node used for bounding boxes.
	pub leaf_node_radius: f64,
	pub cluster_node_radius: f64,
	pub core_node_radius: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			base_radius: 60.0,
			radius_per_sqrt_node: 10.0,
			radius_per_cluster: 8.0,
			margin: 60.0,
			core_radius: 90.0,
			core_padding: 60.0,
			max_attempts: 140,
			ring_max_spaces: 6,
			base_orbit: 210.0,
			orbit_step: 110.0,
			ring_retry_step: 40.0,
			ring_retry_angle: 0.12,
			jitter_angle: 0.12,
			jitter_orbit: 18.0,
			fit_ratio: 0.82,
			leaf_node_radius: 24.0,
			cluster_node_radius: 30.0,
			core_node_radius: 36.0,
		}
	}
}

impl LayoutConfig {
	/// Minimum distance from the origin for a cluster of `radius`.
	pub fn core_clearance(&self, radius: f64) -> f64 {
		radius + self.core_radius + self.core_padding
	}
}

/// Camera limits and gesture timing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Hotkey and button zoom snaps to multiples of this.
	pub zoom_step: f64,
	pub fit_padding: f64,
	/// Side of the unfocused view box at zoom 1.
	pub default_view_size: f64,
	/// Minimum side of the focused view box at zoom 1.
	pub focus_min_size: f64,
	/// Focused view box side as a multiple of the cluster radius.
	pub focus_radius_factor: f64,
	/// Wheel pans are ignored this long after a native pinch gesture.
	pub pinch_guard_ms: f64,
	/// Wheel pans are ignored this long after any zoom.
	pub zoom_pan_cooldown_ms: f64,
	/// Exponential wheel zoom sensitivity per normalised pixel.
	pub wheel_zoom_sensitivity: f64,
	/// Pixels per wheel line when `deltaMode` is lines.
	pub wheel_line_height: f64,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.25,
			max_zoom: 2.0,
			zoom_step: 0.25,
			fit_padding: 80.0,
			default_view_size: 1400.0,
			focus_min_size: 360.0,
			focus_radius_factor: 3.2,
			pinch_guard_ms: 120.0,
			zoom_pan_cooldown_ms: 160.0,
			wheel_zoom_sensitivity: 0.0022,
			wheel_line_height: 16.0,
		}
	}
}

/// Render interpolation parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
	/// Fraction of the remaining distance covered per frame.
	pub factor: f64,
	/// Below this per-axis delta the animation snaps and stops.
	pub threshold: f64,
}

impl Default for MotionConfig {
	fn default() -> Self {
		Self {
			factor: 0.16,
			threshold: 0.4,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DragConfig {
	/// Client-pixel movement after which a release no longer counts as a click.
	pub click_threshold_px: f64,
}

impl Default for DragConfig {
	fn default() -> Self {
		Self {
			click_threshold_px: 2.0,
		}
	}
}

/// Durable storage keys shared with the rest of the application.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageKeys {
	pub layout_offsets: String,
	pub area_prefix: String,
	pub spaces_index: String,
	pub space_prefix: String,
}

impl Default for StorageKeys {
	fn default() -> Self {
		Self {
			layout_offsets: "station_layout.v0.5".to_string(),
			area_prefix: "sf_areas_".to_string(),
			spaces_index: "sf_spaces_index".to_string(),
			space_prefix: "sf_space_".to_string(),
		}
	}
}

/// Complete station configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StationConfig {
	pub layout: LayoutConfig,
	pub camera: CameraConfig,
	pub motion: MotionConfig,
	pub drag: DragConfig,
	pub storage: StorageKeys,
	/// Whether the playground space orbits the core alongside user spaces.
	pub include_playground: bool,
}

impl Default for StationConfig {
	fn default() -> Self {
		Self {
			layout: LayoutConfig::default(),
			camera: CameraConfig::default(),
			motion: MotionConfig::default(),
			drag: DragConfig::default(),
			storage: StorageKeys::default(),
			include_playground: true,
		}
	}
}

impl StationConfig {
	/// Parses a JSON override, falling back to defaults on error.
	pub fn from_json(json: &str) -> Self {
		match serde_json::from_str::<StationConfig>(json) {
			Ok(config) => config,
			Err(e) => {
				warn!("symbolfield-station: ignoring malformed config: {}", e);
				StationConfig::default()
			}
		}
	}
}

/// Load configuration from a script element with id="station-config".
pub fn load_config() -> StationConfig {
	let Some(json_text) = read_config_script() else {
		return StationConfig::default();
	};
	let config = StationConfig::from_json(&json_text);
	info!(
		"symbolfield-station: config loaded (zoom {}..{})",
		config.camera.min_zoom, config.camera.max_zoom
	);
	config
}

fn read_config_script() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("station-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}
