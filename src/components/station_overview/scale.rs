//! Zoom-dependent sizes and the level-of-detail switch.
//!
//! The SVG is drawn in world units, so anything that should keep a readable
//! on-screen size has to be divided by the current pixels-per-unit ratio `k`.
//!
//! - [`ScaleBehavior::World`]: constant world size, grows when zoomed in.
//! - [`ScaleBehavior::Screen`]: constant pixel size.
//! - [`ScaleBehavior::Clamped`]: world size bounded to a pixel range.

/// How much of each space the overview draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetailLevel {
	/// Space outlines and labels only.
	Spaces,
	/// Adds sub-cluster markers and their spokes.
	Clusters,
	/// Adds leaf nodes, intra-space links and areas.
	#[default]
	Nodes,
}

impl DetailLevel {
	pub fn shows_clusters(self) -> bool {
		self != DetailLevel::Spaces
	}

	pub fn shows_nodes(self) -> bool {
		self == DetailLevel::Nodes
	}

	/// Cycles Spaces, Clusters, Nodes, Spaces.
	pub fn next(self) -> Self {
		match self {
			DetailLevel::Spaces => DetailLevel::Clusters,
			DetailLevel::Clusters => DetailLevel::Nodes,
			DetailLevel::Nodes => DetailLevel::Spaces,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			DetailLevel::Spaces => "Spaces",
			DetailLevel::Clusters => "Clusters",
			DetailLevel::Nodes => "Nodes",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	World,
	Screen,
	/// `(min_screen, max_screen)` pixel bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space size for `base` at `k` pixels per unit.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		let k = if k > 0.0 && k.is_finite() { k } else { 1.0 };
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Linear fade between two zoom ratios.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
	pub zero_at: f64,
	pub full_at: f64,
}

impl Fade {
	pub fn apply(&self, k: f64) -> f64 {
		if self.zero_at == self.full_at {
			return 1.0;
		}
		((k - self.zero_at) / (self.full_at - self.zero_at)).clamp(0.0, 1.0)
	}
}

/// Base sizes and how each reacts to zoom.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleConfig {
	pub outline_width: (f64, ScaleBehavior),
	pub link_width: (f64, ScaleBehavior),
	pub portal_width: (f64, ScaleBehavior),
	pub selection_ring_width: (f64, ScaleBehavior),
	pub label_size: (f64, ScaleBehavior),
	pub node_radius: (f64, ScaleBehavior),
	pub cluster_marker_radius: (f64, ScaleBehavior),
	pub core_marker_radius: (f64, ScaleBehavior),
	/// Intra-space links fade out when zoomed far out.
	pub link_fade: Fade,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			outline_width: (1.5, ScaleBehavior::Screen),
			link_width: (1.0, ScaleBehavior::Screen),
			portal_width: (1.0, ScaleBehavior::Screen),
			selection_ring_width: (2.0, ScaleBehavior::Screen),
			label_size: (
				14.0,
				ScaleBehavior::Clamped {
					min_screen: 10.0,
					max_screen: 22.0,
				},
			),
			node_radius: (
				3.5,
				ScaleBehavior::Clamped {
					min_screen: 1.5,
					max_screen: f64::INFINITY,
				},
			),
			cluster_marker_radius: (
				6.0,
				ScaleBehavior::Clamped {
					min_screen: 3.0,
					max_screen: f64::INFINITY,
				},
			),
			core_marker_radius: (8.0, ScaleBehavior::World),
			link_fade: Fade {
				zero_at: 0.2,
				full_at: 0.5,
			},
		}
	}
}

/// Sizes resolved for one zoom ratio, in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledValues {
	pub k: f64,
	pub outline_width: f64,
	pub link_width: f64,
	pub portal_width: f64,
	pub selection_ring_width: f64,
	pub label_size: f64,
	pub node_radius: f64,
	pub cluster_marker_radius: f64,
	pub core_marker_radius: f64,
	pub link_alpha: f64,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let resolve = |(base, behavior): &(f64, ScaleBehavior)| behavior.apply(*base, k);
		Self {
			k,
			outline_width: resolve(&config.outline_width),
			link_width: resolve(&config.link_width),
			portal_width: resolve(&config.portal_width),
			selection_ring_width: resolve(&config.selection_ring_width),
			label_size: resolve(&config.label_size),
			node_radius: resolve(&config.node_radius),
			cluster_marker_radius: resolve(&config.cluster_marker_radius),
			core_marker_radius: resolve(&config.core_marker_radius),
			link_alpha: config.link_fade.apply(k),
		}
	}
}
