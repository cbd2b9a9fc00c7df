//! Builds the drawable scene for the station overview.
//!
//! The scene is plain data in world coordinates; the component only maps it
//! onto SVG elements. Keeping it separate means every visual rule (what is
//! shown at which detail level, how links are trimmed, which colour wins)
//! is testable without a browser.

use super::camera::ViewBox;
use super::scale::{DetailLevel, ScaleConfig, ScaledValues};
use super::theme::{Color, StationTheme};
use super::types::{AreaShape, Point, ProjectedPoint, SpaceCluster};

/// Radius of the ArcheCore glyph at the station origin.
pub const ARCHECORE_RADIUS: f64 = 40.0;

#[derive(Clone, Debug, PartialEq)]
pub struct LinePrimitive {
	pub id: String,
	pub from: Point,
	pub to: Point,
	pub stroke: String,
	pub width: f64,
	pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CirclePrimitive {
	pub id: String,
	pub center: Point,
	pub r: f64,
	pub fill: String,
	pub stroke: Option<String>,
	pub stroke_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AreaPrimitive {
	pub id: String,
	pub shape: AreaShape,
	pub fill: String,
	pub stroke: String,
	pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelPrimitive {
	pub anchor: Point,
	pub text: String,
	pub size: f64,
	pub color: String,
}

/// Everything drawn for one space. Depends only on that space and the shared
/// view settings, so a space can be redrawn on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterScene {
	pub id: String,
	/// Line from the ArcheCore rim to the space outline.
	pub portal: Option<LinePrimitive>,
	pub outline: CirclePrimitive,
	/// Orbit drawn around the selected space.
	pub selection_ring: Option<CirclePrimitive>,
	pub hovered: bool,
	pub selected: bool,
	pub highlighted: bool,
	pub areas: Vec<AreaPrimitive>,
	pub links: Vec<LinePrimitive>,
	pub spokes: Vec<LinePrimitive>,
	pub core: Option<CirclePrimitive>,
	pub sub_clusters: Vec<CirclePrimitive>,
	pub nodes: Vec<CirclePrimitive>,
	pub label: LabelPrimitive,
}

/// Totals shown in the overview HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StationSummary {
	pub spaces: usize,
	pub nodes: usize,
	pub edges: usize,
	pub clusters: usize,
}

impl StationSummary {
	pub fn of(clusters: &[SpaceCluster]) -> Self {
		clusters.iter().fold(Self::default(), |acc, c| Self {
			spaces: acc.spaces + 1,
			nodes: acc.nodes + c.nodes.len() + c.clusters.len() + usize::from(c.has_core),
			edges: acc.edges + c.links.len(),
			clusters: acc.clusters + c.clusters.len(),
		})
	}
}

/// The part of the scene not owned by any one space.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneChrome {
	pub view_box: ViewBox,
	pub background: String,
	pub archecore: CirclePrimitive,
	pub archecore_glow: CirclePrimitive,
	pub summary: StationSummary,
	pub detail: DetailLevel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub chrome: SceneChrome,
	pub clusters: Vec<ClusterScene>,
}

/// Inputs for [`build_scene`].
#[derive(Clone, Copy, Debug)]
pub struct SceneInput<'a> {
	pub clusters: &'a [SpaceCluster],
	pub view_box: ViewBox,
	/// Screen pixels per world unit.
	pub pixels_per_unit: f64,
	pub detail: DetailLevel,
	pub hovered: Option<&'a str>,
	pub selected: Option<&'a str>,
	/// Space highlighted from outside the overview.
	pub highlighted: Option<&'a str>,
	pub theme: &'a StationTheme,
	pub scale: &'a ScaleConfig,
}

/// Shortens the segment `a`-`b` so it starts and ends on the circles of
/// radius `ra` and `rb`. `None` when the circles touch or overlap.
pub fn trim_link(a: Point, ra: f64, b: Point, rb: f64) -> Option<(Point, Point)> {
	let d = a.distance(b);
	if d <= ra + rb {
		return None;
	}
	let dir = (b - a) * (1.0 / d);
	Some((a + dir * ra, b - dir * rb))
}

fn line(id: String, ends: (Point, Point), color: Color, width: f64, opacity: f64) -> LinePrimitive {
	LinePrimitive {
		id,
		from: ends.0,
		to: ends.1,
		stroke: color.to_css(),
		width,
		opacity,
	}
}

fn marker(point: &ProjectedPoint, r: f64, fill: Color) -> CirclePrimitive {
	CirclePrimitive {
		id: point.id.clone(),
		center: point.position(),
		r,
		fill: fill.to_css(),
		stroke: None,
		stroke_width: 0.0,
	}
}

/// Scene of a single space under `input`.
pub fn build_cluster_scene(cluster: &SpaceCluster, input: &SceneInput) -> ClusterScene {
	cluster_scene(cluster, input, &ScaledValues::new(input.scale, input.pixels_per_unit))
}

fn cluster_scene(cluster: &SpaceCluster, input: &SceneInput, sv: &ScaledValues) -> ClusterScene {
	let theme = input.theme;
	let hovered = input.hovered == Some(cluster.id.as_str());
	let selected = input.selected == Some(cluster.id.as_str());
	let highlighted = input.highlighted == Some(cluster.id.as_str());

	let portal = trim_link(Point::ORIGIN, ARCHECORE_RADIUS, cluster.center, cluster.radius).map(|ends| {
		let color = if hovered || selected {
			theme.hover.with_alpha(0.5)
		} else {
			theme.portal
		};
		line(format!("{}-portal", cluster.id), ends, color, sv.portal_width, 1.0)
	});

	let stroke = if selected {
		theme.selected
	} else if hovered {
		theme.hover
	} else if highlighted {
		theme.highlight
	} else {
		theme.accent(&cluster.id).with_alpha(theme.outline.a)
	};
	let outline = CirclePrimitive {
		id: cluster.id.clone(),
		center: cluster.center,
		r: cluster.radius,
		fill: theme.outline_fill.to_css(),
		stroke: Some(stroke.to_css()),
		stroke_width: if hovered || selected {
			sv.outline_width * 1.6
		} else {
			sv.outline_width
		},
	};
	let selection_ring = selected.then(|| CirclePrimitive {
		id: format!("{}-orbit", cluster.id),
		center: cluster.center,
		r: cluster.radius + sv.selection_ring_width * 4.0,
		fill: "none".to_string(),
		stroke: Some(theme.selected.with_alpha(0.6).to_css()),
		stroke_width: sv.selection_ring_width,
	});

	let core = cluster.core_point.map(|p| CirclePrimitive {
		id: format!("{}-core", cluster.id),
		center: p,
		r: sv.core_marker_radius,
		fill: theme.core_marker.to_css(),
		stroke: None,
		stroke_width: 0.0,
	});
	let hub = cluster.core_point.unwrap_or(cluster.center);
	let hub_radius = if cluster.core_point.is_some() {
		sv.core_marker_radius
	} else {
		0.0
	};

	let mut spokes = Vec::new();
	let mut sub_clusters = Vec::new();
	if input.detail.shows_clusters() {
		for sub in &cluster.clusters {
			let fill = theme.resolve(sub.color.as_deref(), theme.cluster_marker);
			sub_clusters.push(CirclePrimitive {
				stroke: Some(fill.lighten(0.3).to_css()),
				stroke_width: sv.link_width,
				..marker(sub, sv.cluster_marker_radius, fill)
			});
			if let Some(ends) = trim_link(hub, hub_radius, sub.position(), sv.cluster_marker_radius) {
				spokes.push(line(format!("{}-spoke", sub.id), ends, theme.spoke, sv.link_width, sv.link_alpha));
			}
		}
	}

	let mut nodes = Vec::new();
	let mut links = Vec::new();
	let mut areas = Vec::new();
	if input.detail.shows_nodes() {
		for node in &cluster.nodes {
			nodes.push(marker(node, sv.node_radius, theme.resolve(node.color.as_deref(), theme.leaf)));
			let parent = node
				.parent_cluster_id
				.as_deref()
				.and_then(|pid| cluster.clusters.iter().find(|c| c.id == pid));
			if let Some(parent) = parent {
				if let Some(ends) = trim_link(parent.position(), sv.cluster_marker_radius, node.position(), sv.node_radius) {
					spokes.push(line(format!("{}-spoke", node.id), ends, theme.spoke, sv.link_width, sv.link_alpha));
				}
			}
		}
		links = cluster
			.links
			.iter()
			.map(|l| {
				line(
					l.id.clone(),
					(Point::new(l.x1, l.y1), Point::new(l.x2, l.y2)),
					theme.link,
					sv.link_width,
					sv.link_alpha,
				)
			})
			.collect();
		areas = cluster
			.areas
			.iter()
			.map(|a| {
				let fill = theme.resolve(a.color.as_deref(), theme.area_fill);
				AreaPrimitive {
					id: a.id.clone(),
					shape: a.shape,
					fill: fill.to_css(),
					stroke: theme.resolve(a.border_color.as_deref(), fill).to_css(),
					opacity: a.opacity,
				}
			})
			.collect();
	}

	ClusterScene {
		id: cluster.id.clone(),
		portal,
		outline,
		selection_ring,
		hovered,
		selected,
		highlighted,
		areas,
		links,
		spokes,
		core,
		sub_clusters,
		nodes,
		label: LabelPrimitive {
			anchor: Point::new(cluster.center.x, cluster.center.y + cluster.radius + sv.label_size * 1.2),
			text: cluster.name.clone(),
			size: sv.label_size,
			color: if hovered || selected {
				theme.hover.to_css()
			} else {
				theme.label.to_css()
			},
		},
	}
}

pub fn build_scene(input: &SceneInput) -> Scene {
	let sv = ScaledValues::new(input.scale, input.pixels_per_unit);
	let theme = input.theme;

	let chrome = SceneChrome {
		view_box: input.view_box,
		background: theme.background.to_css(),
		archecore: CirclePrimitive {
			id: "archecore".to_string(),
			center: Point::ORIGIN,
			r: ARCHECORE_RADIUS,
			fill: theme.background.to_css(),
			stroke: Some(theme.archecore.to_css()),
			stroke_width: sv.outline_width,
		},
		archecore_glow: CirclePrimitive {
			id: "archecore-glow".to_string(),
			center: Point::ORIGIN,
			r: ARCHECORE_RADIUS * 1.6,
			fill: theme.archecore_glow.to_css(),
			stroke: None,
			stroke_width: 0.0,
		},
		summary: StationSummary::of(input.clusters),
		detail: input.detail,
	};
	Scene {
		chrome,
		clusters: input
			.clusters
			.iter()
			.map(|c| cluster_scene(c, input, &sv))
			.collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::station_overview::{ProjectedArea, ProjectedLink};

	fn point(id: &str, x: f64, y: f64, parent: Option<&str>) -> ProjectedPoint {
		ProjectedPoint {
			id: id.into(),
			x,
			y,
			parent_cluster_id: parent.map(str::to_string),
			color: None,
		}
	}

	fn sample() -> SpaceCluster {
		SpaceCluster {
			id: "s".into(),
			name: "Research".into(),
			center: Point::new(300.0, 0.0),
			core_point: Some(Point::new(300.0, 0.0)),
			radius: 80.0,
			has_core: true,
			clusters: vec![point("hub", 330.0, 0.0, None)],
			nodes: vec![point("leaf", 360.0, 0.0, Some("hub")), point("loose", 300.0, 40.0, None)],
			links: vec![ProjectedLink {
				id: "e".into(),
				x1: 330.0,
				y1: 0.0,
				x2: 360.0,
				y2: 0.0,
			}],
			areas: vec![ProjectedArea {
				id: "a".into(),
				shape: AreaShape::Circle { cx: 300.0, cy: 0.0, r: 20.0 },
				color: Some("#ff0000".into()),
				border_color: None,
				opacity: 0.2,
			}],
		}
	}

	fn scene(clusters: &[SpaceCluster], detail: DetailLevel, selected: Option<&str>) -> Scene {
		let theme = StationTheme::default();
		let scale = ScaleConfig::default();
		build_scene(&SceneInput {
			clusters,
			view_box: ViewBox::centered(Point::ORIGIN, 1400.0),
			pixels_per_unit: 1.0,
			detail,
			hovered: None,
			selected,
			highlighted: None,
			theme: &theme,
			scale: &scale,
		})
	}

	#[test]
	fn test_trim_link() {
		let (a, b) = trim_link(Point::ORIGIN, 40.0, Point::new(300.0, 0.0), 80.0).unwrap();
		assert_eq!(a, Point::new(40.0, 0.0));
		assert_eq!(b, Point::new(220.0, 0.0));
		assert!(trim_link(Point::ORIGIN, 10.0, Point::new(15.0, 0.0), 5.0).is_none());
	}

	#[test]
	fn test_detail_levels_gate_contents() {
		let clusters = vec![sample()];
		let full = &scene(&clusters, DetailLevel::Nodes, None).clusters[0];
		assert_eq!(full.nodes.len(), 2);
		assert_eq!(full.links.len(), 1);
		assert_eq!(full.areas.len(), 1);
		// Core to hub, hub to its child.
		assert_eq!(full.spokes.len(), 2);
		assert_eq!(full.areas[0].fill, "#ff0000");

		let mid = &scene(&clusters, DetailLevel::Clusters, None).clusters[0];
		assert_eq!(mid.sub_clusters.len(), 1);
		assert!(mid.nodes.is_empty() && mid.links.is_empty() && mid.areas.is_empty());
		assert_eq!(mid.spokes.len(), 1);

		let top = &scene(&clusters, DetailLevel::Spaces, None).clusters[0];
		assert!(top.sub_clusters.is_empty() && top.spokes.is_empty());
		assert!(top.core.is_some());
	}

	#[test]
	fn test_portals_and_summary() {
		let clusters = vec![sample()];
		let scene = scene(&clusters, DetailLevel::Nodes, Some("s"));
		let portal = scene.clusters[0].portal.as_ref().unwrap();
		assert_eq!(portal.from, Point::new(ARCHECORE_RADIUS, 0.0));
		assert_eq!(portal.to, Point::new(220.0, 0.0));
		assert_eq!(
			scene.chrome.summary,
			StationSummary {
				spaces: 1,
				nodes: 4,
				edges: 1,
				clusters: 1
			}
		);
		let cluster = &scene.clusters[0];
		assert!(cluster.selected);
		assert!(cluster.selection_ring.is_some());
		assert_eq!(cluster.label.text, "Research");
	}

	#[test]
	fn test_single_space_matches_full_scene() {
		let mut other = sample();
		other.id = "t".into();
		other.translate(Point::new(-600.0, 0.0));
		let clusters = vec![sample(), other];
		let theme = StationTheme::default();
		let scale = ScaleConfig::default();
		let input = SceneInput {
			clusters: &clusters,
			view_box: ViewBox::centered(Point::ORIGIN, 1400.0),
			pixels_per_unit: 0.7,
			detail: DetailLevel::Nodes,
			hovered: Some("t"),
			selected: None,
			highlighted: None,
			theme: &theme,
			scale: &scale,
		};
		let full = build_scene(&input);
		assert_eq!(build_cluster_scene(&clusters[1], &input), full.clusters[1]);
		assert!(full.clusters[1].hovered);
		assert_eq!(full.clusters[1].portal.as_ref().unwrap().to, Point::new(-220.0, 0.0));
	}
}
