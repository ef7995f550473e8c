//! Contract between the session and the rendering engine.
//!
//! The session pushes [`GraphData`] and exposes per-frame [`FrameStyle`] callbacks; the engine
//! owns positions and never writes back into the session.

use indexmap::IndexMap;

use super::color::{ColorAssigner, FALLBACK_COLOR};
use super::element::{Edge, Node};
use super::highlight::{
	DEFAULT_EDGE_COLOR, DEFAULT_EDGE_WIDTH, HighlightResolver, LabelPolicy, NodeCategory,
};
use super::store::{DataUpdate, UpdateKind};
use super::view::{LayoutParams, ViewMode};

/// Node as seen by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Node uid
	pub id: String,
	/// Text drawn next to the node
	pub label: String,
	/// Size hint
	pub value: Option<f64>,
}

/// Link as seen by the renderer; `source`/`target` are endpoint uids.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Edge uid
	pub id: String,
	/// Source node uid
	pub source: String,
	/// Destination node uid
	pub target: String,
	/// Text drawn along the link
	pub label: String,
}

/// Everything the renderer draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Nodes
	pub nodes: Vec<GraphNode>,
	/// Links
	pub links: Vec<GraphLink>,
}

/// Rendering engine driven by the session.
pub trait RenderEngine {
	/// Replaces the drawn graph. Positions of uids already known to the engine are kept.
	fn set_graph_data(&mut self, data: GraphData);
	/// Forgets every stored position.
	fn reset_positions(&mut self);
	/// Applies layout parameters, restarting the simulation.
	fn set_layout(&mut self, params: LayoutParams);
	/// Moves the camera onto the graph.
	fn recenter(&mut self);
	/// Parks the positions of the graph on screen and restores those last used for `view`.
	fn switch_view(&mut self, view: ViewMode);
}

/// Pushes a data update to `engine`.
///
/// Replacements clear positions first so nothing inherits stale coordinates. View switches
/// keep every view's positions; the table view draws nothing and leaves the engine alone.
pub fn apply_update<R: RenderEngine>(engine: &mut R, data: GraphData, layout: LayoutParams, update: &DataUpdate) {
	match update.kind {
		UpdateKind::Replace => engine.reset_positions(),
		UpdateKind::Merge => {}
		UpdateKind::SwitchView(ViewMode::Table) => return,
		UpdateKind::SwitchView(view) => engine.switch_view(view),
	}
	engine.set_graph_data(data);
	engine.set_layout(layout);
	if update.recenter {
		engine.recenter();
	}
}

/// Style callbacks for one frame. Pure functions of the session state it was built from.
pub struct FrameStyle<'a> {
	nodes: &'a IndexMap<String, Node>,
	edges: &'a IndexMap<String, Edge>,
	resolver: HighlightResolver<'a>,
	colors: &'a ColorAssigner,
	policy: LabelPolicy,
}

impl<'a> FrameStyle<'a> {
	/// Bundles one frame's inputs.
	pub fn new(
		nodes: &'a IndexMap<String, Node>,
		edges: &'a IndexMap<String, Edge>,
		resolver: HighlightResolver<'a>,
		colors: &'a ColorAssigner,
		policy: LabelPolicy,
	) -> Self {
		Self {
			nodes,
			edges,
			resolver,
			colors,
			policy,
		}
	}

	/// Fill color of node `uid`.
	pub fn node_color(&self, uid: &str) -> String {
		match self.nodes.get(uid) {
			Some(node) => self.resolver.node_color(node, self.colors),
			None => FALLBACK_COLOR.to_string(),
		}
	}

	/// Category of node `uid`, used for outline emphasis.
	pub fn node_category(&self, uid: &str) -> NodeCategory {
		self.resolver.node_category(uid)
	}

	/// Stroke color of edge `uid`.
	pub fn link_color(&self, uid: &str) -> String {
		match self.edges.get(uid) {
			Some(edge) => self.resolver.edge_style(edge).color,
			None => DEFAULT_EDGE_COLOR.to_string(),
		}
	}

	/// Stroke width of edge `uid`.
	pub fn link_width(&self, uid: &str) -> f64 {
		self.edges
			.get(uid)
			.map(|edge| self.resolver.edge_style(edge).width)
			.unwrap_or(DEFAULT_EDGE_WIDTH)
	}

	/// Whether node `uid` gets a label.
	pub fn node_label_visible(&self, uid: &str) -> bool {
		self.resolver.node_label_visible(uid, self.policy)
	}

	/// Whether edge `uid` gets a label.
	pub fn link_label_visible(&self, uid: &str) -> bool {
		self.edges
			.get(uid)
			.is_some_and(|edge| self.resolver.edge_label_visible(edge, self.policy))
	}

	/// Curvature amount of edge `uid`.
	pub fn link_curvature(&self, uid: &str) -> f64 {
		self.edges
			.get(uid)
			.map(|edge| edge.curvature.amount)
			.unwrap_or(0.0)
	}

	/// True when edge `uid` is stored with its endpoints swapped relative to its pair key.
	///
	/// The renderer flips the bend of such edges so a whole group bends around one chord.
	pub fn link_reversed(&self, uid: &str) -> bool {
		self.edges
			.get(uid)
			.is_some_and(|edge| edge.source_uid() > edge.destination_uid())
	}
}

/// Radius of the loop drawn for self-referencing edges.
pub const SELF_LOOP_RADIUS: f64 = 12.0;

/// Control point of the quadratic curve from `p1` to `p2`.
///
/// The bend is `curvature` times the chord length, perpendicular to the chord.
pub fn control_point(p1: (f64, f64), p2: (f64, f64), curvature: f64) -> (f64, f64) {
	let (mx, my) = ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0);
	let (dx, dy) = (p2.0 - p1.0, p2.1 - p1.1);
	(mx - dy * curvature, my + dx * curvature)
}

/// Where the label of a link is drawn.
///
/// Distinct endpoints use the midpoint of the quadratic curve; self-loops anchor above the
/// loop instead.
pub fn label_anchor(p1: (f64, f64), p2: (f64, f64), curvature: f64, self_loop: bool) -> (f64, f64) {
	if self_loop {
		return (p1.0, p1.1 - SELF_LOOP_RADIUS * 2.0);
	}
	let c = control_point(p1, p2, curvature);
	(
		0.25 * p1.0 + 0.5 * c.0 + 0.25 * p2.0,
		0.25 * p1.1 + 0.5 * c.1 + 0.25 * p2.1,
	)
}
