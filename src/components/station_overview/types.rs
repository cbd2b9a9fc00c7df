//! Data structures for the station overview.
//!
//! Inputs (spaces, graph data, areas) come from the space store and are
//! deserialized leniently: a corrupt field degrades to its default instead of
//! failing the whole document. Outputs (`SpaceCluster`) are derived and rebuilt
//! whenever the inputs change.

use std::ops::{Add, Mul, Sub};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A 2D point or vector in station (or space-local) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	#[serde(default, deserialize_with = "finite_f64")]
	pub x: f64,
	#[serde(default, deserialize_with = "finite_f64")]
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(self) -> f64 {
		self.x.hypot(self.y)
	}

	pub fn distance(self, other: Point) -> f64 {
		(self - other).length()
	}

	/// Moves `t` of the way towards `target`.
	pub fn lerp(self, target: Point, t: f64) -> Point {
		Point::new(
			self.x + (target.x - self.x) * t,
			self.y + (target.y - self.y) * t,
		)
	}

	/// Largest per-axis distance to `other`.
	pub fn max_axis_delta(self, other: Point) -> f64 {
		(self.x - other.x).abs().max((self.y - other.y).abs())
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// Reads a finite number out of an optional JSON value, defaulting to zero.
pub(crate) fn finite(value: Option<&Value>) -> f64 {
	value
		.and_then(Value::as_f64)
		.filter(|v| v.is_finite())
		.unwrap_or(0.0)
}

fn finite_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
	let value = Value::deserialize(deserializer)?;
	Ok(finite(Some(&value)))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	let value = Value::deserialize(deserializer)?;
	Ok(value.as_str().map(str::to_string))
}

/// Strings as-is, numbers in decimal form, anything else empty.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) => s,
		Value::Number(n) => n.to_string(),
		_ => String::new(),
	})
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
	let value = Value::deserialize(deserializer)?;
	Ok(value.as_bool().unwrap_or(false))
}

/// Falls back to the default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	let value = Value::deserialize(deserializer)?;
	Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keeps the entries of an array that parse and drops the rest.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::Array(items) => items
			.into_iter()
			.filter_map(|item| serde_json::from_value(item).ok())
			.collect(),
		_ => Vec::new(),
	})
}

/// Axis-aligned bounding box. Starts empty; grows as points are included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min: Point,
	pub max: Point,
}

impl Default for Bounds {
	fn default() -> Self {
		Self::empty()
	}
}

impl Bounds {
	pub const fn empty() -> Self {
		Self {
			min: Point::new(f64::INFINITY, f64::INFINITY),
			max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.min.x > self.max.x || self.min.y > self.max.y
	}

	/// Includes a disk of radius `r` around `p`.
	pub fn include_disk(&mut self, p: Point, r: f64) {
		if !p.is_finite() {
			return;
		}
		let r = if r.is_finite() { r.abs() } else { 0.0 };
		self.min.x = self.min.x.min(p.x - r);
		self.min.y = self.min.y.min(p.y - r);
		self.max.x = self.max.x.max(p.x + r);
		self.max.y = self.max.y.max(p.y + r);
	}

	pub fn include_point(&mut self, p: Point) {
		self.include_disk(p, 0.0);
	}

	pub fn include_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.include_point(Point::new(x, y));
		self.include_point(Point::new(x + w, y + h));
	}

	pub fn include_bounds(&mut self, other: &Bounds) {
		if other.is_empty() {
			return;
		}
		self.include_point(other.min);
		self.include_point(other.max);
	}

	pub fn width(&self) -> f64 {
		if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
	}

	pub fn height(&self) -> f64 {
		if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
	}

	pub fn center(&self) -> Point {
		if self.is_empty() {
			return Point::ORIGIN;
		}
		(self.min + self.max) * 0.5
	}

	pub fn padded(&self, pad: f64) -> Bounds {
		if self.is_empty() {
			return *self;
		}
		Bounds {
			min: self.min - Point::new(pad, pad),
			max: self.max + Point::new(pad, pad),
		}
	}
}

/// One user-created space, as listed by the space store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpaceSummary {
	#[serde(deserialize_with = "lenient_text")]
	pub id: String,
	#[serde(deserialize_with = "lenient_text")]
	pub name: String,
	#[serde(deserialize_with = "finite_f64")]
	pub created_at: f64,
	#[serde(deserialize_with = "finite_f64")]
	pub updated_at: f64,
	#[serde(deserialize_with = "finite_f64")]
	pub last_accessed_at: f64,
	#[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
	pub kind: Option<String>,
	#[serde(deserialize_with = "lenient_bool")]
	pub trashed: bool,
}

impl SpaceSummary {
	pub fn is_playground(&self) -> bool {
		matches!(self.kind.as_deref(), Some("playground") | Some("sandbox"))
	}
}

/// Role of a node inside its space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	/// The space's local origin marker.
	Core,
	/// A grouping node, rendered as a ringed sub-marker.
	Cluster,
	Leaf,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeData {
	#[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
	pub label: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
	pub color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
	pub color_body: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
	#[serde(
		rename = "parentClusterId",
		skip_serializing_if = "Option::is_none",
		deserialize_with = "lenient_string"
	)]
	pub parent_cluster_id: Option<String>,
}

/// A node as persisted by the space store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeBase {
	#[serde(deserialize_with = "lenient_text")]
	pub id: String,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
	pub node_type: Option<String>,
	#[serde(deserialize_with = "lenient")]
	pub position: Point,
	#[serde(deserialize_with = "lenient")]
	pub data: NodeData,
	#[serde(deserialize_with = "lenient")]
	pub meta: NodeMeta,
}

impl NodeBase {
	pub fn kind(&self) -> NodeKind {
		match self.node_type.as_deref() {
			Some("core") => NodeKind::Core,
			Some("cluster") => NodeKind::Cluster,
			_ => NodeKind::Leaf,
		}
	}

	/// Body colour first, then the generic colour.
	pub fn color(&self) -> Option<String> {
		self.data
			.color_body
			.clone()
			.or_else(|| self.data.color.clone())
	}
}

/// A directed edge between two nodes of the same space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeBase {
	#[serde(deserialize_with = "lenient_text")]
	pub id: String,
	#[serde(deserialize_with = "lenient_text")]
	pub source: String,
	#[serde(deserialize_with = "lenient_text")]
	pub target: String,
}

/// Graph contents of one space. Entries that are not objects are dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceGraphData {
	#[serde(deserialize_with = "lenient_list")]
	pub nodes: Vec<NodeBase>,
	#[serde(deserialize_with = "lenient_list")]
	pub edges: Vec<EdgeBase>,
}

/// Geometry of a freeform area, in whichever coordinate space it lives in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AreaShape {
	Rect { x: f64, y: f64, w: f64, h: f64 },
	Circle { cx: f64, cy: f64, r: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AreaAnchor {
	Canvas,
	Node(String),
}

/// Opacity used when a stored area has none.
pub const DEFAULT_AREA_OPACITY: f64 = 0.2;

/// A freeform area as stored per space.
#[derive(Clone, Debug, PartialEq)]
pub struct RawArea {
	pub id: String,
	pub shape: AreaShape,
	pub color: Option<String>,
	pub border_color: Option<String>,
	pub opacity: f64,
	pub anchor: AreaAnchor,
}

impl RawArea {
	/// Reads an area from loosely-typed JSON. Non-objects yield `None`; bad
	/// numbers become zero.
	pub fn from_value(index: usize, value: &Value) -> Option<RawArea> {
		let obj = value.as_object()?;
		let id = obj
			.get("id")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| format!("area-{index}"));

		let circle = obj.get("circle").filter(|c| c.is_object());
		let is_circle = match obj.get("shape").and_then(Value::as_str) {
			Some("circle") => true,
			Some(_) => false,
			None => circle.is_some(),
		};
		let shape = if is_circle {
			let c = circle.and_then(Value::as_object);
			AreaShape::Circle {
				cx: finite(c.and_then(|c| c.get("cx"))),
				cy: finite(c.and_then(|c| c.get("cy"))),
				r: finite(c.and_then(|c| c.get("r"))).abs(),
			}
		} else {
			let r = obj.get("rect").and_then(Value::as_object);
			AreaShape::Rect {
				x: finite(r.and_then(|r| r.get("x"))),
				y: finite(r.and_then(|r| r.get("y"))),
				w: finite(r.and_then(|r| r.get("w"))).abs(),
				h: finite(r.and_then(|r| r.get("h"))).abs(),
			}
		};

		let anchor = obj
			.get("anchor")
			.and_then(Value::as_object)
			.filter(|a| a.get("type").and_then(Value::as_str) == Some("node"))
			.and_then(|a| a.get("nodeId"))
			.and_then(Value::as_str)
			.map(|id| AreaAnchor::Node(id.to_string()))
			.unwrap_or(AreaAnchor::Canvas);

		let opacity = obj
			.get("opacity")
			.and_then(Value::as_f64)
			.filter(|v| v.is_finite())
			.unwrap_or(DEFAULT_AREA_OPACITY)
			.clamp(0.0, 1.0);

		Some(RawArea {
			id,
			shape,
			color: obj.get("color").and_then(Value::as_str).map(str::to_string),
			border_color: obj
				.get("borderColor")
				.and_then(Value::as_str)
				.map(str::to_string),
			opacity,
			anchor,
		})
	}

	/// Parses a stored JSON list, tolerating corruption.
	pub fn parse_list(json: &str) -> Vec<RawArea> {
		match serde_json::from_str::<Value>(json) {
			Ok(Value::Array(items)) => items
				.iter()
				.enumerate()
				.filter_map(|(i, v)| RawArea::from_value(i, v))
				.collect(),
			_ => Vec::new(),
		}
	}

	/// Local-space extent. Anchored areas are re-centred on their node.
	pub fn local_bounds(&self, anchor_pos: Option<Point>) -> Bounds {
		let mut bounds = Bounds::empty();
		match (self.shape, anchor_pos) {
			(AreaShape::Rect { w, h, .. }, Some(p)) => {
				bounds.include_rect(p.x - w / 2.0, p.y - h / 2.0, w, h)
			}
			(AreaShape::Rect { x, y, w, h }, None) => bounds.include_rect(x, y, w, h),
			(AreaShape::Circle { r, .. }, Some(p)) => bounds.include_disk(p, r),
			(AreaShape::Circle { cx, cy, r }, None) => bounds.include_disk(Point::new(cx, cy), r),
		}
		bounds
	}
}

/// A projected node or sub-cluster marker in station coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedPoint {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub parent_cluster_id: Option<String>,
	pub color: Option<String>,
}

impl ProjectedPoint {
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// A projected intra-space edge.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedLink {
	pub id: String,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
}

/// A projected freeform area.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedArea {
	pub id: String,
	pub shape: AreaShape,
	pub color: Option<String>,
	pub border_color: Option<String>,
	pub opacity: f64,
}

/// The placed, projected representation of one space on the station plane.
#[derive(Clone, Debug, PartialEq)]
pub struct SpaceCluster {
	pub id: String,
	pub name: String,
	pub center: Point,
	pub core_point: Option<Point>,
	pub radius: f64,
	pub has_core: bool,
	pub clusters: Vec<ProjectedPoint>,
	pub nodes: Vec<ProjectedPoint>,
	pub links: Vec<ProjectedLink>,
	pub areas: Vec<ProjectedArea>,
}

impl SpaceCluster {
	/// Shifts every coordinate of the cluster by `d`.
	pub fn translate(&mut self, d: Point) {
		self.center = self.center + d;
		if let Some(core) = self.core_point.as_mut() {
			*core = *core + d;
		}
		for p in self.clusters.iter_mut().chain(self.nodes.iter_mut()) {
			p.x += d.x;
			p.y += d.y;
		}
		for link in &mut self.links {
			link.x1 += d.x;
			link.y1 += d.y;
			link.x2 += d.x;
			link.y2 += d.y;
		}
		for area in &mut self.areas {
			area.shape = match area.shape {
				AreaShape::Rect { x, y, w, h } => AreaShape::Rect {
					x: x + d.x,
					y: y + d.y,
					w,
					h,
				},
				AreaShape::Circle { cx, cy, r } => AreaShape::Circle {
					cx: cx + d.x,
					cy: cy + d.y,
					r,
				},
			};
		}
	}
}
