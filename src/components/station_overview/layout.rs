//! Cluster builder: places every space on the station plane and projects its
//! contents into the disk reserved for it.
//!
//! Placement is greedy and sequential. Spaces are taken in creation order and
//! each one takes the first candidate position that clears the ArcheCore disk
//! and every space placed before it, so earlier spaces keep their spot when
//! later ones are added. Up to `ring_max_spaces` spaces share a ring; beyond
//! that a golden-angle spiral spreads them out. Candidates carry a small
//! jitter seeded from the space id, which keeps the layout organic but
//! reproducible across reloads.
//!
//! Projection fits the bounding box of a space's nodes and areas into the
//! square inscribed in `fit_ratio * radius`, so every projected node lies
//! inside the cluster disk regardless of the box's aspect ratio.

use std::collections::HashMap;
use std::f64::consts::{SQRT_2, TAU};

use log::warn;

use super::metrics::Counts;
use super::types::{
	AreaAnchor, AreaShape, Bounds, NodeBase, NodeKind, Point, ProjectedArea, ProjectedLink,
	ProjectedPoint, RawArea, SpaceCluster, SpaceGraphData, SpaceSummary,
};
use crate::config::{LayoutConfig, StorageKeys};
use crate::store::{KeyValueStorage, SpaceStore, load_raw_areas};

/// `PI * (3 - sqrt(5))`.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Everything the builder reads about one space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpaceSnapshot {
	pub summary: SpaceSummary,
	/// `None` when the space's data could not be read.
	pub data: Option<SpaceGraphData>,
	pub areas: Vec<RawArea>,
}

/// Point-in-time copy of all visible spaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StationSnapshot {
	pub spaces: Vec<SpaceSnapshot>,
}

impl StationSnapshot {
	pub fn capture(
		store: &dyn SpaceStore,
		storage: &dyn KeyValueStorage,
		keys: &StorageKeys,
		include_playground: bool,
	) -> Self {
		let spaces = store
			.list_spaces(include_playground)
			.into_iter()
			.map(|summary| SpaceSnapshot {
				data: store.space_data(&summary.id),
				areas: load_raw_areas(storage, &keys.area_prefix, &summary.id),
				summary,
			})
			.collect();
		Self { spaces }
	}
}

/// Reserved disk radius; grows with node and sub-cluster counts.
pub fn cluster_radius(config: &LayoutConfig, node_count: usize, cluster_count: usize) -> f64 {
	config.base_radius
		+ config.radius_per_sqrt_node * (node_count as f64).sqrt()
		+ config.radius_per_cluster * cluster_count as f64
}

/// FNV-1a hash of a space id.
fn seed_hash(id: &str) -> u32 {
	id.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
		(hash ^ byte as u32).wrapping_mul(0x0100_0193)
	})
}

/// Two deterministic values in `[-1, 1]` derived from the id.
fn jitter(id: &str) -> (f64, f64) {
	let hash = seed_hash(id);
	let unit = |bits: u32| (bits & 0xffff) as f64 / 65_535.0 * 2.0 - 1.0;
	(unit(hash), unit(hash >> 16))
}

fn candidate(
	config: &LayoutConfig,
	index: usize,
	count: usize,
	attempt: usize,
	radius: f64,
	(jitter_a, jitter_r): (f64, f64),
) -> Point {
	let (angle, orbit) = if count <= config.ring_max_spaces {
		let ring = config
			.base_orbit
			.max(config.core_clearance(radius) + config.jitter_orbit);
		(
			index as f64 / count as f64 * TAU
				+ jitter_a * config.jitter_angle
				+ attempt as f64 * config.ring_retry_angle,
			ring + jitter_r * config.jitter_orbit + attempt as f64 * config.ring_retry_step,
		)
	} else {
		let t = (index + attempt) as f64;
		(
			t * GOLDEN_ANGLE + jitter_a * config.jitter_angle,
			config.base_orbit + config.orbit_step * (t + 1.0).sqrt() + jitter_r * config.jitter_orbit,
		)
	};
	Point::new(angle.cos() * orbit, angle.sin() * orbit)
}

#[derive(Clone, Copy, Debug)]
struct PlacedDisk {
	center: Point,
	radius: f64,
}

fn is_clear(config: &LayoutConfig, center: Point, radius: f64, placed: &[PlacedDisk]) -> bool {
	center.length() >= config.core_clearance(radius)
		&& placed
			.iter()
			.all(|other| center.distance(other.center) >= radius + other.radius + config.margin)
}

fn place(
	config: &LayoutConfig,
	index: usize,
	count: usize,
	id: &str,
	radius: f64,
	placed: &[PlacedDisk],
) -> Point {
	let seed = jitter(id);
	for attempt in 0..config.max_attempts {
		let center = candidate(config, index, count, attempt, radius, seed);
		if is_clear(config, center, radius, placed) {
			return center;
		}
	}
	warn!(
		"symbolfield-station: no clear spot for space {} after {} attempts",
		id, config.max_attempts
	);
	candidate(config, index, count, 0, radius, seed)
}

fn node_radius(config: &LayoutConfig, kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Core => config.core_node_radius,
		NodeKind::Cluster => config.cluster_node_radius,
		NodeKind::Leaf => config.leaf_node_radius,
	}
}

/// Uniform scale plus translation from space-local to station coordinates.
#[derive(Clone, Copy, Debug)]
struct Projection {
	origin: Point,
	center: Point,
	scale: f64,
}

impl Projection {
	fn fit(bounds: &Bounds, center: Point, radius: f64, fit_ratio: f64) -> Self {
		let side = radius * fit_ratio * SQRT_2;
		let (w, h) = (bounds.width().max(1.0), bounds.height().max(1.0));
		Self {
			origin: bounds.center(),
			center,
			scale: (side / w).min(side / h),
		}
	}

	fn map(&self, p: Point) -> Point {
		self.center + (p - self.origin) * self.scale
	}
}

fn anchor_of<'a>(area: &RawArea, positions: &'a HashMap<&str, Point>) -> Option<&'a Point> {
	match &area.anchor {
		AreaAnchor::Node(id) => positions.get(id.as_str()),
		AreaAnchor::Canvas => None,
	}
}

fn project_point(node: &NodeBase, p: Point) -> ProjectedPoint {
	ProjectedPoint {
		id: node.id.clone(),
		x: p.x,
		y: p.y,
		parent_cluster_id: node.meta.parent_cluster_id.clone(),
		color: node.color(),
	}
}

fn project_area(area: &RawArea, projection: &Projection, anchor: Option<Point>) -> ProjectedArea {
	let s = projection.scale;
	let shape = match (area.shape, anchor) {
		(AreaShape::Rect { w, h, .. }, Some(p)) => AreaShape::Rect {
			x: p.x - w * s / 2.0,
			y: p.y - h * s / 2.0,
			w: w * s,
			h: h * s,
		},
		(AreaShape::Rect { x, y, w, h }, None) => {
			let origin = projection.map(Point::new(x, y));
			AreaShape::Rect {
				x: origin.x,
				y: origin.y,
				w: w * s,
				h: h * s,
			}
		}
		(AreaShape::Circle { r, .. }, Some(p)) => AreaShape::Circle {
			cx: p.x,
			cy: p.y,
			r: r * s,
		},
		(AreaShape::Circle { cx, cy, r }, None) => {
			let c = projection.map(Point::new(cx, cy));
			AreaShape::Circle {
				cx: c.x,
				cy: c.y,
				r: r * s,
			}
		}
	};
	ProjectedArea {
		id: area.id.clone(),
		shape,
		color: area.color.clone(),
		border_color: area.border_color.clone(),
		opacity: area.opacity,
	}
}

/// Projects one space into a disk at `center`. Spaces without nodes produce an
/// empty cluster.
pub fn project_space(
	space: &SpaceSnapshot,
	center: Point,
	radius: f64,
	config: &LayoutConfig,
) -> SpaceCluster {
	let mut cluster = SpaceCluster {
		id: space.summary.id.clone(),
		name: space.summary.name.clone(),
		center,
		core_point: None,
		radius,
		has_core: false,
		clusters: Vec::new(),
		nodes: Vec::new(),
		links: Vec::new(),
		areas: Vec::new(),
	};
	let Some(data) = space.data.as_ref().filter(|d| !d.nodes.is_empty()) else {
		return cluster;
	};

	let local: HashMap<&str, Point> = data
		.nodes
		.iter()
		.map(|n| (n.id.as_str(), n.position))
		.collect();

	let mut bounds = Bounds::empty();
	for node in &data.nodes {
		bounds.include_disk(node.position, node_radius(config, node.kind()));
	}
	for area in &space.areas {
		bounds.include_bounds(&area.local_bounds(anchor_of(area, &local).copied()));
	}
	let projection = Projection::fit(&bounds, center, radius, config.fit_ratio);

	let mut projected: HashMap<&str, Point> = HashMap::with_capacity(data.nodes.len());
	for node in &data.nodes {
		let p = projection.map(node.position);
		projected.insert(node.id.as_str(), p);
		match node.kind() {
			NodeKind::Core if cluster.core_point.is_none() => {
				cluster.core_point = Some(p);
				cluster.has_core = true;
			}
			NodeKind::Core => {}
			NodeKind::Cluster => cluster.clusters.push(project_point(node, p)),
			NodeKind::Leaf => cluster.nodes.push(project_point(node, p)),
		}
	}

	cluster.links = data
		.edges
		.iter()
		.filter_map(|edge| {
			let a = projected.get(edge.source.as_str())?;
			let b = projected.get(edge.target.as_str())?;
			Some(ProjectedLink {
				id: edge.id.clone(),
				x1: a.x,
				y1: a.y,
				x2: b.x,
				y2: b.y,
			})
		})
		.collect();

	cluster.areas = space
		.areas
		.iter()
		.map(|area| project_area(area, &projection, anchor_of(area, &projected).copied()))
		.collect();

	cluster
}

/// Places and projects every space of the snapshot. Pure and deterministic.
pub fn build_clusters(snapshot: &StationSnapshot, config: &LayoutConfig) -> Vec<SpaceCluster> {
	let mut order: Vec<&SpaceSnapshot> = snapshot.spaces.iter().collect();
	order.sort_by(|a, b| {
		a.summary
			.created_at
			.total_cmp(&b.summary.created_at)
			.then_with(|| a.summary.id.cmp(&b.summary.id))
	});

	let count = order.len();
	let mut placed: Vec<PlacedDisk> = Vec::with_capacity(count);
	order
		.into_iter()
		.enumerate()
		.map(|(index, space)| {
			let counts = space.data.as_ref().map(Counts::of).unwrap_or_default();
			let radius = cluster_radius(config, counts.nodes, counts.clusters);
			let center = place(config, index, count, &space.summary.id, radius, &placed);
			placed.push(PlacedDisk { center, radius });
			project_space(space, center, radius, config)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::station_overview::{EdgeBase, NodeMeta};

	fn node(id: &str, kind: Option<&str>, x: f64, y: f64) -> NodeBase {
		NodeBase {
			id: id.into(),
			node_type: kind.map(str::to_string),
			position: Point::new(x, y),
			..Default::default()
		}
	}

	fn space(id: &str, created_at: f64, nodes: Vec<NodeBase>) -> SpaceSnapshot {
		SpaceSnapshot {
			summary: SpaceSummary {
				id: id.into(),
				name: id.into(),
				created_at,
				..Default::default()
			},
			data: Some(SpaceGraphData {
				nodes,
				edges: vec![],
			}),
			areas: vec![],
		}
	}

	fn empty_spaces(n: usize) -> StationSnapshot {
		StationSnapshot {
			spaces: (0..n)
				.map(|i| space(&format!("space-{i}"), i as f64, vec![]))
				.collect(),
		}
	}

	fn assert_no_overlap(clusters: &[SpaceCluster], config: &LayoutConfig) {
		for (i, a) in clusters.iter().enumerate() {
			assert!(
				a.center.length() >= config.core_clearance(a.radius) - 1e-9,
				"{} intrudes into the core disk",
				a.id
			);
			for b in &clusters[i + 1..] {
				assert!(
					a.center.distance(b.center) >= a.radius + b.radius + config.margin - 1e-9,
					"{} overlaps {}",
					a.id,
					b.id
				);
			}
		}
	}

	#[test]
	fn test_radius_grows_with_content() {
		let config = LayoutConfig::default();
		assert_eq!(cluster_radius(&config, 0, 0), 60.0);
		assert_eq!(cluster_radius(&config, 4, 1), 60.0 + 20.0 + 8.0);
		assert!(cluster_radius(&config, 10, 0) > cluster_radius(&config, 9, 0));
	}

	#[test]
	fn test_jitter_is_stable_and_bounded() {
		assert_eq!(jitter("alpha"), jitter("alpha"));
		assert_ne!(jitter("alpha"), jitter("beta"));
		let (a, r) = jitter("gamma");
		assert!((-1.0..=1.0).contains(&a) && (-1.0..=1.0).contains(&r));
	}

	#[test]
	fn test_small_station_uses_ring() {
		let config = LayoutConfig::default();
		let clusters = build_clusters(&empty_spaces(3), &config);
		for (i, cluster) in clusters.iter().enumerate() {
			let expected = i as f64 / 3.0 * TAU;
			let angle = cluster.center.y.atan2(cluster.center.x).rem_euclid(TAU);
			let diff = (angle - expected).rem_euclid(TAU);
			let diff = diff.min(TAU - diff);
			assert!(diff <= config.jitter_angle + 1e-9, "space {i} off ring by {diff}");
		}
		assert_no_overlap(&clusters, &config);
	}

	#[test]
	fn test_dense_station_has_no_overlaps() {
		let config = LayoutConfig::default();
		let snapshot = StationSnapshot {
			spaces: (0..12)
				.map(|i| {
					let nodes = (0..i * 3)
						.map(|n| node(&format!("n{n}"), None, n as f64 * 40.0, (n % 5) as f64 * 30.0))
						.collect();
					space(&format!("s{i}"), i as f64, nodes)
				})
				.collect(),
		};
		let clusters = build_clusters(&snapshot, &config);
		assert_eq!(clusters.len(), 12);
		assert_no_overlap(&clusters, &config);
	}

	#[test]
	fn test_build_is_deterministic() {
		let config = LayoutConfig::default();
		let snapshot = StationSnapshot {
			spaces: vec![
				space("b", 2.0, vec![node("x", None, 5.0, 5.0)]),
				space("a", 1.0, vec![node("c", Some("core"), 0.0, 0.0)]),
				space("c", 2.0, vec![]),
			],
		};
		let first = build_clusters(&snapshot, &config);
		let second = build_clusters(&snapshot, &config);
		assert_eq!(first, second);
		let ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
		assert_eq!(ids, vec!["a", "b", "c"]);
	}

	#[test]
	fn test_projection_stays_inside_disk() {
		let config = LayoutConfig::default();
		let nodes = vec![
			node("a", None, -5000.0, 0.0),
			node("b", None, 5000.0, 10.0),
			node("c", Some("cluster"), 0.0, 800.0),
			node("d", None, 4990.0, 790.0),
		];
		let snapshot = StationSnapshot {
			spaces: vec![space("wide", 0.0, nodes)],
		};
		let cluster = &build_clusters(&snapshot, &config)[0];
		for p in cluster.nodes.iter().chain(&cluster.clusters) {
			assert!(p.position().distance(cluster.center) <= cluster.radius * config.fit_ratio + 1e-9);
		}
	}

	#[test]
	fn test_two_node_space_fits_within_ratio() {
		let config = LayoutConfig::default();
		let snapshot = StationSnapshot {
			spaces: vec![space(
				"s",
				0.0,
				vec![node("a", None, 0.0, 0.0), node("b", None, 100.0, 100.0)],
			)],
		};
		let cluster = &build_clusters(&snapshot, &config)[0];
		assert!((cluster.radius - (60.0 + 10.0 * 2f64.sqrt())).abs() < 1e-9);
		for p in &cluster.nodes {
			assert!(p.position().distance(cluster.center) <= 0.82 * cluster.radius);
		}
		// Symmetric content stays centred.
		let mid = (cluster.nodes[0].position() + cluster.nodes[1].position()) * 0.5;
		assert!(mid.distance(cluster.center) < 1e-9);
	}

	#[test]
	fn test_core_and_subclusters_are_split() {
		let config = LayoutConfig::default();
		let mut child = node("leaf", None, 20.0, 20.0);
		child.meta = NodeMeta {
			parent_cluster_id: Some("hub".into()),
		};
		let snapshot = StationSnapshot {
			spaces: vec![space(
				"s",
				0.0,
				vec![node("core", Some("core"), 0.0, 0.0), node("hub", Some("cluster"), 10.0, 0.0), child],
			)],
		};
		let cluster = &build_clusters(&snapshot, &config)[0];
		assert!(cluster.has_core);
		assert!(cluster.core_point.is_some());
		assert_eq!(cluster.clusters.len(), 1);
		assert_eq!(cluster.nodes.len(), 1);
		assert_eq!(cluster.nodes[0].parent_cluster_id.as_deref(), Some("hub"));
		assert_eq!(cluster.radius, cluster_radius(&config, 3, 1));
	}

	#[test]
	fn test_edges_with_missing_endpoints_are_dropped() {
		let config = LayoutConfig::default();
		let mut s = space("s", 0.0, vec![node("a", None, 0.0, 0.0), node("b", None, 50.0, 0.0)]);
		if let Some(data) = s.data.as_mut() {
			data.edges = vec![
				EdgeBase {
					id: "ok".into(),
					source: "a".into(),
					target: "b".into(),
				},
				EdgeBase {
					id: "dangling".into(),
					source: "a".into(),
					target: "ghost".into(),
				},
			];
		}
		let cluster = project_space(&s, Point::new(300.0, 0.0), 80.0, &config);
		assert_eq!(cluster.links.len(), 1);
		let link = &cluster.links[0];
		assert_eq!((link.x1, link.y1), (cluster.nodes[0].x, cluster.nodes[0].y));
	}

	#[test]
	fn test_anchored_area_follows_projected_node() {
		let config = LayoutConfig::default();
		let mut s = space("s", 0.0, vec![node("a", None, 0.0, 0.0), node("b", None, 200.0, 0.0)]);
		s.areas = RawArea::parse_list(
			r#"[
				{"id":"anchored","shape":"circle","circle":{"cx":-999,"cy":-999,"r":40},"anchor":{"type":"node","nodeId":"b"}},
				{"id":"free","shape":"rect","rect":{"x":0,"y":0,"w":100,"h":20}},
				{"id":"lost","shape":"circle","circle":{"cx":0,"cy":0,"r":10},"anchor":{"type":"node","nodeId":"ghost"}}
			]"#,
		);
		let cluster = project_space(&s, Point::new(0.0, 400.0), 100.0, &config);
		let b = cluster.nodes.iter().find(|n| n.id == "b").unwrap();
		match cluster.areas[0].shape {
			AreaShape::Circle { cx, cy, r } => {
				assert_eq!((cx, cy), (b.x, b.y));
				assert!(r > 0.0 && r < 40.0);
			}
			other => panic!("unexpected shape {other:?}"),
		}
		let a = cluster.nodes.iter().find(|n| n.id == "a").unwrap();
		match cluster.areas[1].shape {
			AreaShape::Rect { x, y, .. } => assert_eq!((x, y), (a.x, a.y)),
			other => panic!("unexpected shape {other:?}"),
		}
		match cluster.areas[2].shape {
			AreaShape::Circle { cx, cy, .. } => assert_eq!((cx, cy), (a.x, a.y)),
			other => panic!("unexpected shape {other:?}"),
		}
	}

	#[test]
	fn test_empty_space_has_no_contents() {
		let config = LayoutConfig::default();
		let mut s = space("s", 0.0, vec![]);
		s.areas = RawArea::parse_list(r#"[{"rect":{"x":0,"y":0,"w":10,"h":10}}]"#);
		let cluster = project_space(&s, Point::new(250.0, 0.0), 60.0, &config);
		assert!(cluster.areas.is_empty() && cluster.nodes.is_empty() && cluster.links.is_empty());
		assert!(!cluster.has_core);

		let unreadable = SpaceSnapshot {
			data: None,
			..s
		};
		assert_eq!(project_space(&unreadable, Point::ORIGIN, 60.0, &config).radius, 60.0);
	}
}
