//! Identity-based merge of fetched elements into the session.

use indexmap::IndexMap;

use super::element::{Edge, GraphElement, Node};

/// Node-count change above which a data update recenters the camera.
pub const RECENTER_NODE_DELTA: usize = 5;

/// Uids appended by a merge, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
	/// Nodes that were not present before
	pub added_nodes: Vec<String>,
	/// Edges that were not present before
	pub added_edges: Vec<String>,
}

impl MergeReport {
	/// True when the merge changed nothing.
	pub fn is_empty(&self) -> bool {
		self.added_nodes.is_empty() && self.added_edges.is_empty()
	}
}

fn append_new<E: GraphElement>(
	existing: &mut IndexMap<String, E>,
	fetched: impl IntoIterator<Item = E>,
) -> Vec<String> {
	let mut added = Vec::new();
	for element in fetched {
		if existing.contains_key(element.uid()) {
			continue;
		}
		let uid = element.uid().to_string();
		added.push(uid.clone());
		existing.insert(uid, element);
	}
	added
}

/// Appends fetched nodes and edges whose uid is not already present.
///
/// Existing entries are never replaced, so anything keyed on them (render positions in
/// particular) survives the merge. Duplicates within the fetch itself keep the first copy.
pub fn merge_expansion(
	nodes: &mut IndexMap<String, Node>,
	edges: &mut IndexMap<String, Edge>,
	fetched_nodes: impl IntoIterator<Item = Node>,
	fetched_edges: impl IntoIterator<Item = Edge>,
) -> MergeReport {
	MergeReport {
		added_nodes: append_new(nodes, fetched_nodes),
		added_edges: append_new(edges, fetched_edges),
	}
}

/// Whether a data update moving from `previous` to `current` nodes should recenter.
///
/// Recenters on the first non-empty load, or when the node count moved by more than
/// [`RECENTER_NODE_DELTA`].
pub fn should_recenter(previous: usize, current: usize, loaded_before: bool) -> bool {
	if !loaded_before && current > 0 {
		return true;
	}
	previous.abs_diff(current) > RECENTER_NODE_DELTA
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::element::{EdgeParams, NodeParams};

	fn node(uid: &str, name: &str) -> Node {
		let mut properties = serde_json::Map::new();
		properties.insert("name".into(), name.into());
		Node::new(NodeParams {
			uid: uid.into(),
			labels: vec!["Person".into()],
			properties,
			..Default::default()
		})
		.unwrap()
	}

	fn edge(uid: &str, s: &str, d: &str) -> Edge {
		Edge::new(EdgeParams {
			uid: uid.into(),
			source_uid: s.into(),
			destination_uid: d.into(),
			..Default::default()
		})
		.unwrap()
	}

	fn keyed<E: GraphElement>(items: Vec<E>) -> IndexMap<String, E> {
		items.into_iter().map(|e| (e.uid().to_string(), e)).collect()
	}

	#[test]
	fn merge_skips_known_uids_and_keeps_existing_entries() {
		let mut nodes = keyed(vec![node("1", "Alice")]);
		let mut edges = IndexMap::new();
		let report = merge_expansion(
			&mut nodes,
			&mut edges,
			vec![node("1", "Changed"), node("2", "Bob"), node("2", "Bob again")],
			vec![edge("a", "1", "2")],
		);

		assert_eq!(report.added_nodes, vec!["2".to_string()]);
		assert_eq!(report.added_edges, vec!["a".to_string()]);
		assert_eq!(nodes.len(), 2);
		assert_eq!(nodes["1"].properties()["name"], "Alice");
		assert_eq!(nodes["2"].properties()["name"], "Bob");
	}

	#[test]
	fn merging_the_same_fetch_is_idempotent() {
		let mut nodes = keyed(vec![node("1", "Alice"), node("2", "Bob")]);
		let mut edges = keyed(vec![edge("a", "1", "2")]);
		let (before_nodes, before_edges) = (nodes.clone(), edges.clone());

		let report = merge_expansion(
			&mut nodes,
			&mut edges,
			before_nodes.values().cloned().collect::<Vec<_>>(),
			before_edges.values().cloned().collect::<Vec<_>>(),
		);
		assert!(report.is_empty());
		assert_eq!(nodes, before_nodes);
		assert_eq!(edges, before_edges);
	}

	#[test]
	fn recenter_policy() {
		assert!(should_recenter(0, 1, false));
		assert!(!should_recenter(0, 0, false));
		assert!(should_recenter(4, 10, true));
		assert!(!should_recenter(4, 7, true));
		assert!(should_recenter(12, 2, true));
	}
}
