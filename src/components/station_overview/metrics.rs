//! Per-space size metrics, normalised against the largest space.

use serde::Serialize;

use super::types::{NodeKind, SpaceGraphData};
use crate::store::SpaceStore;

/// Scalar size of a space: nodes, plus double-weighted clusters, plus half-weighted edges.
pub fn weight(node_count: usize, edge_count: usize, cluster_count: usize) -> f64 {
	node_count as f64 + 2.0 * cluster_count as f64 + 0.5 * edge_count as f64
}

/// Maxima across all visible spaces. Every field is at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxMetrics {
	pub max_node_count: usize,
	pub max_edge_count: usize,
	pub max_cluster_count: usize,
	pub max_weight: f64,
}

impl Default for MaxMetrics {
	fn default() -> Self {
		Self {
			max_node_count: 1,
			max_edge_count: 1,
			max_cluster_count: 1,
			max_weight: 1.0,
		}
	}
}

/// Metrics for one space, emitted when the space is selected.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMetrics {
	pub id: String,
	pub name: String,
	pub node_count: usize,
	pub edge_count: usize,
	pub cluster_count: usize,
	pub weight: f64,
	pub updated_at: f64,
	pub last_accessed_at: f64,
	pub max_node_count: usize,
	pub max_edge_count: usize,
	pub max_cluster_count: usize,
	pub max_weight: f64,
}

impl SpaceMetrics {
	/// Weight relative to the heaviest space, in `[0, 1]`.
	pub fn weight_ratio(&self) -> f64 {
		(self.weight / self.max_weight).clamp(0.0, 1.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Counts {
	pub nodes: usize,
	pub edges: usize,
	pub clusters: usize,
}

impl Counts {
	pub fn of(data: &SpaceGraphData) -> Self {
		Self {
			nodes: data.nodes.len(),
			edges: data.edges.len(),
			clusters: data
				.nodes
				.iter()
				.filter(|n| n.kind() == NodeKind::Cluster)
				.count(),
		}
	}

	pub fn weight(&self) -> f64 {
		weight(self.nodes, self.edges, self.clusters)
	}
}

/// Scans every visible space for the maxima used to normalise visualisations.
pub fn compute_max_metrics(store: &dyn SpaceStore, include_playground: bool) -> MaxMetrics {
	store
		.list_spaces(include_playground)
		.iter()
		.filter_map(|space| store.space_data(&space.id))
		.map(|data| Counts::of(&data))
		.fold(MaxMetrics::default(), |max, c| MaxMetrics {
			max_node_count: max.max_node_count.max(c.nodes),
			max_edge_count: max.max_edge_count.max(c.edges),
			max_cluster_count: max.max_cluster_count.max(c.clusters),
			max_weight: max.max_weight.max(c.weight()),
		})
}

/// Metrics for `space_id`, or `None` if the space or its data is gone.
pub fn compute_metrics(
	store: &dyn SpaceStore,
	space_id: &str,
	include_playground: bool,
) -> Option<SpaceMetrics> {
	let space = store
		.list_spaces(include_playground)
		.into_iter()
		.find(|s| s.id == space_id)?;
	let data = store.space_data(space_id)?;
	let counts = Counts::of(&data);
	let max = compute_max_metrics(store, include_playground);

	Some(SpaceMetrics {
		id: space.id,
		name: space.name,
		node_count: counts.nodes,
		edge_count: counts.edges,
		cluster_count: counts.clusters,
		weight: counts.weight(),
		updated_at: space.updated_at,
		last_accessed_at: space.last_accessed_at,
		max_node_count: max.max_node_count,
		max_edge_count: max.max_edge_count,
		max_cluster_count: max.max_cluster_count,
		max_weight: max.max_weight,
	})
}
