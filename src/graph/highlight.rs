//! Selection/focus state and the per-frame styling it implies.
//!
//! Selection (click) and focus (hover) are independent axes. Each axis holds at most one
//! element, either a node or an edge, so "node XOR edge" holds by construction.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::color::{ColorAssigner, lighten};
use super::element::{Edge, GraphElement, Node};

/// Edge color when nothing is highlighted.
pub const DEFAULT_EDGE_COLOR: &str = "#DADCE0";
/// Edge width when nothing is highlighted.
pub const DEFAULT_EDGE_WIDTH: f64 = 2.0;
/// Color of the selected edge.
pub const SELECTED_EDGE_COLOR: &str = "#1A73E8";
/// Width of the selected edge.
pub const SELECTED_EDGE_WIDTH: f64 = 4.0;
/// Color of focused edges and edges touching the highlighted node.
pub const FOCUSED_EDGE_COLOR: &str = "#80868B";
/// Width of focused edges and edges touching the highlighted node.
pub const FOCUSED_EDGE_WIDTH: f64 = 3.0;

/// Lightening applied to nodes outside the highlighted neighbourhood.
pub const DIMMED_NODE_LIGHTEN: f64 = 0.6;
/// Lightening applied to edges outside the highlighted neighbourhood.
pub const DIMMED_EDGE_LIGHTEN: f64 = 0.48;
/// Zoom scale above which idle edge labels are drawn.
pub const EDGE_LABEL_ZOOM_THRESHOLD: f64 = 0.6;

/// Reference to one element of the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementRef {
	/// Node uid
	Node(String),
	/// Edge uid
	Edge(String),
}

/// Selection and focus, one element each at most.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
	/// Click-driven, persistent
	pub selected: Option<ElementRef>,
	/// Hover-driven, transient
	pub focused: Option<ElementRef>,
}

fn node_of(element: &Option<ElementRef>) -> Option<&str> {
	match element {
		Some(ElementRef::Node(uid)) => Some(uid.as_str()),
		_ => None,
	}
}

fn edge_of(element: &Option<ElementRef>) -> Option<&str> {
	match element {
		Some(ElementRef::Edge(uid)) => Some(uid.as_str()),
		_ => None,
	}
}

impl HighlightState {
	/// Selects a node, replacing any selected node or edge.
	pub fn select_node(&mut self, uid: impl Into<String>) {
		self.selected = Some(ElementRef::Node(uid.into()));
	}

	/// Selects an edge, replacing any selected node or edge.
	pub fn select_edge(&mut self, uid: impl Into<String>) {
		self.selected = Some(ElementRef::Edge(uid.into()));
	}

	/// Focuses a node, replacing any focused node or edge.
	pub fn focus_node(&mut self, uid: impl Into<String>) {
		self.focused = Some(ElementRef::Node(uid.into()));
	}

	/// Focuses an edge, replacing any focused node or edge.
	pub fn focus_edge(&mut self, uid: impl Into<String>) {
		self.focused = Some(ElementRef::Edge(uid.into()));
	}

	/// Drops both selection and focus.
	pub fn clear(&mut self) {
		self.selected = None;
		self.focused = None;
	}

	/// Uid of the selected node.
	pub fn selected_node(&self) -> Option<&str> {
		node_of(&self.selected)
	}

	/// Uid of the selected edge.
	pub fn selected_edge(&self) -> Option<&str> {
		edge_of(&self.selected)
	}

	/// Uid of the focused node.
	pub fn focused_node(&self) -> Option<&str> {
		node_of(&self.focused)
	}

	/// Uid of the focused edge.
	pub fn focused_edge(&self) -> Option<&str> {
		edge_of(&self.focused)
	}

	/// True when anything is selected or focused.
	pub fn is_active(&self) -> bool {
		self.selected.is_some() || self.focused.is_some()
	}

	/// Drops references to elements no longer in the session.
	pub fn retain_known(&mut self, nodes: &IndexMap<String, Node>, edges: &IndexMap<String, Edge>) {
		let known = |element: &ElementRef| match element {
			ElementRef::Node(uid) => nodes.contains_key(uid),
			ElementRef::Edge(uid) => edges.contains_key(uid),
		};
		if !self.selected.as_ref().is_some_and(&known) {
			self.selected = None;
		}
		if !self.focused.as_ref().is_some_and(&known) {
			self.focused = None;
		}
	}
}

/// Visual category of a node for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeCategory {
	/// Nothing highlighted
	Default,
	/// The selected node
	Selected,
	/// The focused node
	Focused,
	/// Neighbour of the highlighted node or endpoint of the highlighted edge
	Connected,
	/// Outside the highlighted neighbourhood
	Dimmed,
}

/// Visual category of an edge for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeCategory {
	/// Nothing highlighted
	Default,
	/// The selected edge
	Selected,
	/// The focused edge
	Focused,
	/// Touches the selected or focused node
	Connected,
	/// Unrelated to anything highlighted
	Dimmed,
}

/// Resolved stroke for an edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	/// CSS color
	pub color: String,
	/// Stroke width in graph units
	pub width: f64,
}

/// Global label toggles and camera scale, read per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPolicy {
	/// User pinned "show labels"
	pub show_labels: bool,
	/// Current canvas zoom scale
	pub zoom: f64,
}

/// Resolves categories and styles against one snapshot of highlight state and edges.
///
/// Build a fresh resolver for every frame; it holds no state across changes.
pub struct HighlightResolver<'a> {
	state: &'a HighlightState,
	connected: HashSet<&'a str>,
}

impl<'a> HighlightResolver<'a> {
	/// Precomputes the neighbourhood of whatever is selected or focused.
	pub fn new(state: &'a HighlightState, edges: &'a IndexMap<String, Edge>) -> Self {
		let mut connected = HashSet::new();
		let anchors: Vec<&str> = [state.selected_node(), state.focused_node()]
			.into_iter()
			.flatten()
			.collect();
		if !anchors.is_empty() {
			for edge in edges.values() {
				for anchor in &anchors {
					if edge.source_uid() == *anchor {
						connected.insert(edge.destination_uid());
					} else if edge.destination_uid() == *anchor {
						connected.insert(edge.source_uid());
					}
				}
			}
		}
		for uid in [state.selected_edge(), state.focused_edge()].into_iter().flatten() {
			if let Some(edge) = edges.get(uid) {
				connected.insert(edge.source_uid());
				connected.insert(edge.destination_uid());
			}
		}
		Self { state, connected }
	}

	/// Category of the node with `uid`.
	pub fn node_category(&self, uid: &str) -> NodeCategory {
		if self.state.selected_node() == Some(uid) {
			NodeCategory::Selected
		} else if self.state.focused_node() == Some(uid) {
			NodeCategory::Focused
		} else if !self.state.is_active() {
			NodeCategory::Default
		} else if self.connected.contains(uid) {
			NodeCategory::Connected
		} else {
			NodeCategory::Dimmed
		}
	}

	/// Fill color for `node`: its label color, lightened when dimmed.
	pub fn node_color(&self, node: &Node, colors: &ColorAssigner) -> String {
		let base = colors.color_for(node);
		match self.node_category(node.uid()) {
			NodeCategory::Dimmed => lighten(base, DIMMED_NODE_LIGHTEN),
			_ => base.to_string(),
		}
	}

	/// Category of `edge`.
	pub fn edge_category(&self, edge: &Edge) -> EdgeCategory {
		let uid = Some(edge.uid());
		let touches = |node: Option<&str>| node.is_some_and(|n| edge.touches(n));
		if self.state.selected_edge() == uid {
			EdgeCategory::Selected
		} else if self.state.focused_edge() == uid {
			EdgeCategory::Focused
		} else if touches(self.state.selected_node()) || touches(self.state.focused_node()) {
			EdgeCategory::Connected
		} else if self.state.is_active() {
			EdgeCategory::Dimmed
		} else {
			EdgeCategory::Default
		}
	}

	/// Stroke color and width for `edge`.
	pub fn edge_style(&self, edge: &Edge) -> EdgeStyle {
		match self.edge_category(edge) {
			EdgeCategory::Selected => EdgeStyle {
				color: SELECTED_EDGE_COLOR.into(),
				width: SELECTED_EDGE_WIDTH,
			},
			EdgeCategory::Focused | EdgeCategory::Connected => EdgeStyle {
				color: FOCUSED_EDGE_COLOR.into(),
				width: FOCUSED_EDGE_WIDTH,
			},
			EdgeCategory::Dimmed => EdgeStyle {
				color: lighten(DEFAULT_EDGE_COLOR, DIMMED_EDGE_LIGHTEN),
				width: DEFAULT_EDGE_WIDTH,
			},
			EdgeCategory::Default => EdgeStyle {
				color: DEFAULT_EDGE_COLOR.into(),
				width: DEFAULT_EDGE_WIDTH,
			},
		}
	}

	/// Whether the label of node `uid` is drawn.
	pub fn node_label_visible(&self, uid: &str, policy: LabelPolicy) -> bool {
		policy.show_labels
			|| self.state.selected_node() == Some(uid)
			|| self.state.focused_node() == Some(uid)
	}

	/// Whether the label of `edge` is drawn.
	pub fn edge_label_visible(&self, edge: &Edge, policy: LabelPolicy) -> bool {
		let uid = Some(edge.uid());
		let touches = |node: Option<&str>| node.is_some_and(|n| edge.touches(n));
		if self.state.focused_edge() == uid {
			return true;
		}
		if touches(self.state.selected_node()) || touches(self.state.focused_node()) {
			return true;
		}
		if self.state.selected_edge() == uid {
			return true;
		}
		if policy.show_labels {
			return true;
		}
		policy.zoom > EDGE_LABEL_ZOOM_THRESHOLD && !self.state.is_active()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::element::{EdgeParams, NodeParams};

	fn node(uid: &str) -> Node {
		Node::new(NodeParams {
			uid: uid.into(),
			labels: vec!["City".into()],
			..Default::default()
		})
		.unwrap()
	}

	// 1 - 2 - 3, 4 isolated
	fn edges() -> IndexMap<String, Edge> {
		[("a", "1", "2"), ("b", "2", "3")]
			.into_iter()
			.map(|(uid, s, d)| {
				let edge = Edge::new(EdgeParams {
					uid: uid.into(),
					source_uid: s.into(),
					destination_uid: d.into(),
					..Default::default()
				})
				.unwrap();
				(uid.to_string(), edge)
			})
			.collect()
	}

	const IDLE: LabelPolicy = LabelPolicy {
		show_labels: false,
		zoom: 1.0,
	};

	#[test]
	fn selecting_a_second_node_replaces_the_first() {
		let mut state = HighlightState::default();
		state.select_node("1");
		state.select_edge("a");
		state.select_node("2");
		assert_eq!(state.selected_node(), Some("2"));
		assert_eq!(state.selected_edge(), None);
	}

	#[test]
	fn idle_state_uses_defaults() {
		let state = HighlightState::default();
		let edges = edges();
		let resolver = HighlightResolver::new(&state, &edges);
		assert_eq!(resolver.node_category("4"), NodeCategory::Default);
		assert_eq!(
			resolver.edge_style(&edges["a"]),
			EdgeStyle {
				color: DEFAULT_EDGE_COLOR.into(),
				width: DEFAULT_EDGE_WIDTH
			}
		);
		assert!(resolver.edge_label_visible(&edges["a"], IDLE));
		let zoomed_out = LabelPolicy { zoom: 0.5, ..IDLE };
		assert!(!resolver.edge_label_visible(&edges["a"], zoomed_out));
		assert!(!resolver.node_label_visible("1", IDLE));
	}

	#[test]
	fn selected_node_highlights_its_neighbourhood() {
		let mut state = HighlightState::default();
		state.select_node("1");
		let edges = edges();
		let resolver = HighlightResolver::new(&state, &edges);

		assert_eq!(resolver.node_category("1"), NodeCategory::Selected);
		assert_eq!(resolver.node_category("2"), NodeCategory::Connected);
		assert_eq!(resolver.node_category("3"), NodeCategory::Dimmed);
		assert_eq!(resolver.edge_category(&edges["a"]), EdgeCategory::Connected);
		assert_eq!(resolver.edge_category(&edges["b"]), EdgeCategory::Dimmed);
		assert_eq!(resolver.edge_style(&edges["b"]).width, DEFAULT_EDGE_WIDTH);
		assert_eq!(
			resolver.edge_style(&edges["b"]).color,
			lighten(DEFAULT_EDGE_COLOR, DIMMED_EDGE_LIGHTEN)
		);

		assert!(resolver.edge_label_visible(&edges["a"], IDLE));
		assert!(!resolver.edge_label_visible(&edges["b"], IDLE));
		let pinned = LabelPolicy {
			show_labels: true,
			..IDLE
		};
		assert!(resolver.edge_label_visible(&edges["b"], pinned));
		assert!(resolver.node_label_visible("1", IDLE));
		assert!(!resolver.node_label_visible("2", IDLE));
	}

	#[test]
	fn dimmed_nodes_are_lightened() {
		let mut state = HighlightState::default();
		state.focus_node("1");
		let edges = edges();
		let resolver = HighlightResolver::new(&state, &edges);
		let mut colors = ColorAssigner::new();
		let (near, far) = (node("2"), node("4"));
		colors.assign([&near, &far]);
		assert_eq!(resolver.node_color(&near, &colors), colors.color_for(&near));
		assert_eq!(
			resolver.node_color(&far, &colors),
			lighten(colors.color_for(&far), DIMMED_NODE_LIGHTEN)
		);
	}

	#[test]
	fn selected_edge_beats_focused_node() {
		let mut state = HighlightState::default();
		state.select_edge("b");
		state.focus_node("2");
		let edges = edges();
		let resolver = HighlightResolver::new(&state, &edges);

		assert_eq!(resolver.edge_category(&edges["b"]), EdgeCategory::Selected);
		assert_eq!(resolver.edge_style(&edges["b"]).color, SELECTED_EDGE_COLOR);
		assert_eq!(resolver.edge_category(&edges["a"]), EdgeCategory::Connected);
		assert_eq!(resolver.node_category("3"), NodeCategory::Connected);
		assert_eq!(resolver.node_category("2"), NodeCategory::Focused);
		assert_eq!(resolver.node_category("4"), NodeCategory::Dimmed);
	}

	#[test]
	fn focused_edge_shows_its_label_and_endpoints() {
		let mut state = HighlightState::default();
		state.focus_edge("a");
		let edges = edges();
		let resolver = HighlightResolver::new(&state, &edges);
		assert_eq!(resolver.edge_style(&edges["a"]).width, FOCUSED_EDGE_WIDTH);
		assert!(resolver.edge_label_visible(&edges["a"], IDLE));
		assert!(!resolver.edge_label_visible(&edges["b"], IDLE));
		assert_eq!(resolver.node_category("1"), NodeCategory::Connected);
		assert_eq!(resolver.node_category("3"), NodeCategory::Dimmed);
	}

	#[test]
	fn stale_references_are_dropped() {
		let mut state = HighlightState::default();
		state.select_node("9");
		state.focus_edge("a");
		state.retain_known(&IndexMap::new(), &edges());
		assert_eq!(state.selected, None);
		assert_eq!(state.focused_edge(), Some("a"));
	}
}
