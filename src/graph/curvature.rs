//! Curvature spread for parallel edges.

use indexmap::IndexMap;

use super::element::Edge;

/// Total curvature spread shared by a group of parallel edges.
pub const MAX_CURVATURE: f64 = 0.3;

/// Rendering offset of one edge within its node-pair group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curvature {
	/// Unordered pair key, `min-max` of the endpoint uids.
	pub node_pair_id: String,
	/// Signed offset; 0 draws a straight chord.
	pub amount: f64,
}

/// Unordered key for the endpoints of `edge`. Self-loops degenerate to `uid-uid`.
pub fn node_pair_id(edge: &Edge) -> String {
	let (a, b) = (edge.source_uid(), edge.destination_uid());
	if a <= b {
		format!("{a}-{b}")
	} else {
		format!("{b}-{a}")
	}
}

/// Amount for member `index` of a group of `size` parallel edges.
pub fn spread(index: usize, size: usize) -> f64 {
	if size <= 1 {
		return 0.0;
	}
	let step = MAX_CURVATURE / (size - 1) as f64;
	-MAX_CURVATURE / 2.0 + step * index as f64
}

/// Recomputes the curvature of every edge in `edges`.
///
/// Groups keep the enumeration order of `edges`, so the first parallel edge always takes the
/// most negative offset.
pub fn assign_curvature<'a>(edges: impl IntoIterator<Item = &'a mut Edge>) {
	let mut groups: IndexMap<String, Vec<&'a mut Edge>> = IndexMap::new();
	for edge in edges {
		groups.entry(node_pair_id(edge)).or_default().push(edge);
	}
	for (pair_id, members) in groups {
		let size = members.len();
		for (index, edge) in members.into_iter().enumerate() {
			edge.curvature = Curvature {
				node_pair_id: pair_id.clone(),
				amount: spread(index, size),
			};
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::element::EdgeParams;

	fn edge(uid: &str, source: &str, destination: &str) -> Edge {
		Edge::new(EdgeParams {
			uid: uid.into(),
			source_uid: source.into(),
			destination_uid: destination.into(),
			..Default::default()
		})
		.unwrap()
	}

	#[test]
	fn lone_edge_is_straight() {
		let mut edges = vec![edge("a", "1", "2")];
		assign_curvature(edges.iter_mut());
		assert_eq!(edges[0].curvature.amount, 0.0);
		assert_eq!(edges[0].curvature.node_pair_id, "1-2");
	}

	#[test]
	fn three_parallel_edges_spread_in_input_order() {
		let mut edges = vec![edge("a", "1", "2"), edge("b", "2", "1"), edge("c", "1", "2")];
		assign_curvature(edges.iter_mut());
		let amounts: Vec<f64> = edges.iter().map(|e| e.curvature.amount).collect();
		assert!((amounts[0] + 0.15).abs() < 1e-12);
		assert!(amounts[1].abs() < 1e-12);
		assert!((amounts[2] - 0.15).abs() < 1e-12);
		assert!(edges.iter().all(|e| e.curvature.node_pair_id == "1-2"));
	}

	#[test]
	fn parallel_amounts_are_distinct_and_groups_independent() {
		let mut edges = vec![
			edge("a", "1", "2"),
			edge("x", "3", "4"),
			edge("b", "1", "2"),
			edge("loop", "5", "5"),
		];
		assign_curvature(edges.iter_mut());
		assert_ne!(edges[0].curvature.amount, edges[2].curvature.amount);
		assert_eq!(edges[1].curvature.amount, 0.0);
		assert_eq!(edges[3].curvature.node_pair_id, "5-5");
		assert_eq!(edges[3].curvature.amount, 0.0);
	}
}
