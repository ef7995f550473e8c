//! Session state: the live graph, its schema, highlight and view state.

use indexmap::IndexMap;
use log::{info, warn};
use serde_json::Value;

use super::color::ColorAssigner;
use super::curvature::assign_curvature;
use super::element::{Edge, GraphElement, Node};
use super::highlight::{ElementRef, HighlightResolver, HighlightState, LabelPolicy};
use super::merge::{MergeReport, merge_expansion, should_recenter};
use super::render::{FrameStyle, GraphData, GraphLink, GraphNode};
use super::schema::Schema;
use super::view::{LayoutMode, LayoutParams, ViewMode, ViewState};
use crate::backend::{EdgeDirection, ExpansionRequest, GraphResponse, QueryParams};
use crate::error::{GraphError, GraphResult};

/// How a data update changed the node/edge set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
	/// The whole set was swapped; render positions must be cleared.
	Replace,
	/// New elements were appended; existing positions stay.
	Merge,
	/// The view changed; the data behind each view is untouched.
	SwitchView(ViewMode),
}

/// Outcome of a data update, consumed by the render adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUpdate {
	/// Replace, merge or view switch
	pub kind: UpdateKind,
	/// Camera should recenter
	pub recenter: bool,
	/// Node count after the update
	pub node_count: usize,
	/// Elements added by a merge; empty for replacements
	pub report: MergeReport,
}

/// Validated elements of one response.
#[derive(Clone, Debug, Default)]
pub struct LoadedElements {
	/// Nodes that passed validation
	pub nodes: Vec<Node>,
	/// Instantiated edges
	pub edges: Vec<Edge>,
}

/// Everything the session knows about the graph on screen.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	nodes: IndexMap<String, Node>,
	edges: IndexMap<String, Edge>,
	schema: Option<Schema>,
	schema_nodes: IndexMap<String, Node>,
	schema_edges: IndexMap<String, Edge>,
	rows: Vec<Value>,
	highlight: HighlightState,
	view: ViewState,
	colors: ColorAssigner,
	show_labels: bool,
	loaded_before: bool,
}

impl GraphStore {
	/// Empty session.
	pub fn new(show_labels: bool) -> Self {
		Self {
			show_labels,
			..Default::default()
		}
	}

	/// Live nodes by uid, in arrival order.
	pub fn nodes(&self) -> &IndexMap<String, Node> {
		&self.nodes
	}

	/// Live edges by uid, in arrival order.
	pub fn edges(&self) -> &IndexMap<String, Edge> {
		&self.edges
	}

	/// Loaded schema, if any.
	pub fn schema(&self) -> Option<&Schema> {
		self.schema.as_ref()
	}

	/// Rows of the last query.
	pub fn rows(&self) -> &[Value] {
		&self.rows
	}

	/// Selection and focus.
	pub fn highlight(&self) -> &HighlightState {
		&self.highlight
	}

	/// View and layout.
	pub fn view(&self) -> &ViewState {
		&self.view
	}

	/// Shared label colors.
	pub fn colors(&self) -> &ColorAssigner {
		&self.colors
	}

	/// Whether labels are pinned on.
	pub fn show_labels(&self) -> bool {
		self.show_labels
	}

	/// Pins labels on or off.
	pub fn set_show_labels(&mut self, show: bool) {
		self.show_labels = show;
	}

	fn load_schema(&mut self, raw: Option<&Value>) {
		let Some(raw) = raw else {
			return;
		};
		match Schema::from_value(raw) {
			Ok(schema) => {
				let (nodes, edges) = schema.to_graph();
				self.schema_nodes = nodes;
				self.schema_edges = edges;
				assign_curvature(self.schema_edges.values_mut());
				self.schema = Some(schema);
			}
			Err(e) => warn!("Ignoring malformed schema: {}", e),
		}
	}

	/// Validates the elements of `response`, skipping and logging the ones that fail.
	///
	/// Nodes without key property names get them from the schema when it can resolve them.
	pub fn load_elements(&self, response: &GraphResponse) -> LoadedElements {
		let mut loaded = LoadedElements::default();
		for raw in &response.nodes {
			match Node::from_json(raw) {
				Ok(mut node) => {
					if node.key_property_names().is_empty() {
						if let Some(schema) = &self.schema {
							node.set_key_property_names(schema.key_property_names(node.labels()));
						}
					}
					loaded.nodes.push(node);
				}
				Err(e) => warn!("Skipping node: {}", e),
			}
		}
		for raw in &response.edges {
			match Edge::from_json(raw) {
				Ok(edge) if edge.instantiated => loaded.edges.push(edge),
				Ok(edge) => warn!(
					"Skipping edge {}: {}",
					edge.uid(),
					edge.instantiation_error_reason.as_deref().unwrap_or("invalid endpoints")
				),
				Err(e) => warn!("Skipping edge: {}", e),
			}
		}
		loaded
	}

	fn finish_update(&mut self, kind: UpdateKind, previous: usize, report: MergeReport) -> DataUpdate {
		assign_curvature(self.edges.values_mut());
		self.colors.assign(self.nodes.values());
		self.colors.assign(self.schema_nodes.values());
		let (nodes, edges) = match self.view.view_mode() {
			ViewMode::Schema => (&self.schema_nodes, &self.schema_edges),
			ViewMode::Default | ViewMode::Table => (&self.nodes, &self.edges),
		};
		self.highlight.retain_known(nodes, edges);

		let node_count = self.nodes.len();
		let recenter = should_recenter(previous, node_count, self.loaded_before);
		if node_count > 0 {
			self.loaded_before = true;
		}
		info!(
			"{:?}: {} nodes, {} edges (recenter: {})",
			kind,
			node_count,
			self.edges.len(),
			recenter
		);
		DataUpdate {
			kind,
			recenter,
			node_count,
			report,
		}
	}

	/// Swaps the whole graph for the result of a query.
	pub fn replace_data(&mut self, response: GraphResponse) -> DataUpdate {
		let previous = self.nodes.len();
		self.load_schema(response.schema.as_ref());
		let loaded = self.load_elements(&response);
		self.nodes = loaded
			.nodes
			.into_iter()
			.map(|node| (node.uid().to_string(), node))
			.collect();
		self.edges = loaded
			.edges
			.into_iter()
			.map(|edge| (edge.uid().to_string(), edge))
			.collect();
		self.rows = response.rows;
		self.finish_update(UpdateKind::Replace, previous, MergeReport::default())
	}

	/// Appends the new elements of an expansion result.
	pub fn merge_expansion(&mut self, response: GraphResponse) -> DataUpdate {
		let previous = self.nodes.len();
		if self.schema.is_none() {
			self.load_schema(response.schema.as_ref());
		}
		let loaded = self.load_elements(&response);
		let report = merge_expansion(&mut self.nodes, &mut self.edges, loaded.nodes, loaded.edges);
		self.finish_update(UpdateKind::Merge, previous, report)
	}

	/// Builds the expansion request for node `uid` without touching the network.
	pub fn expansion_request(
		&self,
		uid: &str,
		params: &QueryParams,
		direction: EdgeDirection,
		edge_label: Option<String>,
	) -> GraphResult<ExpansionRequest> {
		let node = self
			.nodes
			.get(uid)
			.ok_or_else(|| GraphError::UnknownNode(uid.to_string()))?;
		ExpansionRequest::for_node(node, self.schema.as_ref(), params, direction, edge_label)
	}

	/// Nodes and edges of the graph the current view renders.
	pub fn visible(&self) -> (&IndexMap<String, Node>, &IndexMap<String, Edge>) {
		match self.view.view_mode() {
			ViewMode::Schema => (&self.schema_nodes, &self.schema_edges),
			ViewMode::Default | ViewMode::Table => (&self.nodes, &self.edges),
		}
	}

	/// Display name of a visible element.
	pub fn display_name(&self, target: &ElementRef) -> Option<String> {
		let (nodes, edges) = self.visible();
		match target {
			ElementRef::Node(uid) => nodes.get(uid).map(GraphElement::display_name),
			ElementRef::Edge(uid) => edges.get(uid).map(GraphElement::display_name),
		}
	}

	/// Whether node `uid` can be expanded from the current view.
	pub fn expandable(&self, uid: &str) -> bool {
		self.view.view_mode() == ViewMode::Default && self.nodes.contains_key(uid)
	}

	/// Selects the node `uid`. Unknown uids are ignored.
	pub fn select_node(&mut self, uid: &str) -> bool {
		if !self.visible().0.contains_key(uid) {
			return false;
		}
		self.highlight.select_node(uid);
		true
	}

	/// Selects the edge `uid`. Unknown uids are ignored.
	pub fn select_edge(&mut self, uid: &str) -> bool {
		if !self.visible().1.contains_key(uid) {
			return false;
		}
		self.highlight.select_edge(uid);
		true
	}

	/// Clears the selection, keeping focus.
	pub fn clear_selection(&mut self) {
		self.highlight.selected = None;
	}

	/// Hover moved onto a node, or off everything with `None`.
	pub fn focus_node(&mut self, uid: Option<&str>) {
		match uid {
			Some(uid) => self.highlight.focus_node(uid),
			None => self.highlight.focused = None,
		}
	}

	/// Hover moved onto an edge, or off everything with `None`.
	pub fn focus_edge(&mut self, uid: Option<&str>) {
		match uid {
			Some(uid) => self.highlight.focus_edge(uid),
			None => self.highlight.focused = None,
		}
	}

	/// Switches view; highlight is cleared because live and schema uids differ.
	///
	/// Returns the update the renderer needs, or `None` when nothing changed.
	pub fn set_view_mode(&mut self, mode: ViewMode) -> Option<DataUpdate> {
		if !self.view.set_view_mode(mode) {
			return None;
		}
		self.highlight.clear();
		let node_count = self.visible().0.len();
		Some(DataUpdate {
			kind: UpdateKind::SwitchView(mode),
			recenter: mode != ViewMode::Table && node_count > 0,
			node_count,
			report: MergeReport::default(),
		})
	}

	/// Switches layout. Returns true when the simulation must restart.
	pub fn set_layout_mode(&mut self, mode: LayoutMode) -> bool {
		self.view.set_layout_mode(mode)
	}

	/// Layout parameters for the graph on screen.
	pub fn layout_params(&self) -> LayoutParams {
		let mode = if self.view.layout_enabled() {
			self.view.layout_mode()
		} else {
			LayoutMode::Force
		};
		mode.params(self.visible().0.len())
	}

	/// Graph handed to the renderer; links point at endpoint uids.
	pub fn render_data(&self) -> GraphData {
		let (nodes, edges) = self.visible();
		GraphData {
			nodes: nodes
				.values()
				.map(|node| GraphNode {
					id: node.uid().to_string(),
					label: node.identifiers().join(", "),
					value: node.value,
				})
				.collect(),
			links: edges
				.values()
				.filter(|edge| {
					nodes.contains_key(edge.source_uid())
						&& nodes.contains_key(edge.destination_uid())
				})
				.map(|edge| GraphLink {
					id: edge.uid().to_string(),
					source: edge.source_uid().to_string(),
					target: edge.destination_uid().to_string(),
					label: edge.primary_label().unwrap_or_default().to_string(),
				})
				.collect(),
		}
	}

	/// Style callbacks for one frame at camera scale `zoom`.
	pub fn frame_style(&self, zoom: f64) -> FrameStyle<'_> {
		let (nodes, edges) = self.visible();
		FrameStyle::new(
			nodes,
			edges,
			HighlightResolver::new(&self.highlight, edges),
			&self.colors,
			LabelPolicy {
				show_labels: self.show_labels,
				zoom,
			},
		)
	}
}
