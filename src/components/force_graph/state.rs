use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::graph::render::{SELF_LOOP_RADIUS, control_point};
use crate::graph::{GraphData, LayoutMode, LayoutParams, RenderEngine, ViewMode};

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
pub const EDGE_HIT_DISTANCE: f64 = 4.0;
const CURVE_SAMPLES: usize = 12;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub uid: String,
	pub label: String,
	pub value: Option<f64>,
}

impl NodeInfo {
	pub fn radius(&self) -> f64 {
		match self.value {
			Some(v) if v > 0.0 => NODE_RADIUS * (1.0 + v.ln_1p() * 0.25),
			_ => NODE_RADIUS,
		}
	}
}

#[derive(Clone, Debug)]
pub struct LinkInfo {
	pub uid: String,
	pub label: String,
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f32,
	pub y: f32,
	pub pinned: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

/// Longest-path level of every uid; nodes caught in cycles keep the level reached so far.
pub fn dag_levels<'a>(uids: &[&'a str], links: &[(&'a str, &'a str)]) -> HashMap<&'a str, usize> {
	let mut levels: HashMap<&str, usize> = uids.iter().map(|uid| (*uid, 0)).collect();
	let mut indegree: HashMap<&str, usize> = uids.iter().map(|uid| (*uid, 0)).collect();
	let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
	let mut seen = HashSet::new();
	for &(source, target) in links {
		if source == target || !seen.insert((source, target)) {
			continue;
		}
		if let Some(d) = indegree.get_mut(target) {
			*d += 1;
			successors.entry(source).or_default().push(target);
		}
	}
	let mut queue: VecDeque<&str> = uids
		.iter()
		.copied()
		.filter(|uid| indegree.get(uid) == Some(&0))
		.collect();
	while let Some(uid) = queue.pop_front() {
		let level = levels.get(uid).copied().unwrap_or(0);
		for &next in successors.get(uid).map(Vec::as_slice).unwrap_or_default() {
			if let Some(l) = levels.get_mut(next) {
				*l = (*l).max(level + 1);
			}
			if let Some(d) = indegree.get_mut(next) {
				*d -= 1;
				if *d == 0 {
					queue.push_back(next);
				}
			}
		}
	}
	levels
}

/// Render-side state: simulation, camera and the uid-keyed position table.
pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	links: Vec<LinkInfo>,
	positions: HashMap<String, Position>,
	parked: HashMap<ViewMode, HashMap<String, Position>>,
	view: ViewMode,
	layout: LayoutParams,
	levels: HashMap<DefaultNodeIdx, usize>,
	max_level: usize,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: simulation(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			animation_running: true,
			links: Vec::new(),
			positions: HashMap::new(),
			parked: HashMap::new(),
			view: ViewMode::Default,
			layout: LayoutMode::Force.params(0),
			levels: HashMap::new(),
			max_level: 0,
		}
	}

	pub fn links(&self) -> &[LinkInfo] {
		&self.links
	}

	/// Copies simulated coordinates into the position table.
	fn snapshot_positions(&mut self) {
		let mut current = Vec::new();
		self.graph.visit_nodes(|node| {
			current.push((
				node.data.user_data.uid.clone(),
				Position {
					x: node.x(),
					y: node.y(),
					pinned: node.data.is_anchor,
				},
			));
		});
		self.positions.extend(current);
	}

	pub fn node_positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut positions = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		positions
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS.max(node.data.user_data.radius()) {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_radius(&self, idx: DefaultNodeIdx) -> f64 {
		let mut radius = NODE_RADIUS;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				radius = node.data.user_data.radius();
			}
		});
		radius
	}

	pub fn node_uid(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut uid = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				uid = Some(node.data.user_data.uid.clone());
			}
		});
		uid
	}

	/// Edge under the cursor, measured against the sampled curve each link is drawn as.
	pub fn link_at_position(
		&self,
		sx: f64,
		sy: f64,
		curvature: impl Fn(&str) -> f64,
	) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let positions = self.node_positions();
		let tolerance = EDGE_HIT_DISTANCE / self.transform.k.max(0.1);
		let mut best: Option<(f64, &str)> = None;
		for link in &self.links {
			let (Some(&p1), Some(&p2)) = (positions.get(&link.source), positions.get(&link.target))
			else {
				continue;
			};
			let distance = if link.source == link.target {
				let (cx, cy) = (p1.0, p1.1 - SELF_LOOP_RADIUS);
				(((gx - cx).powi(2) + (gy - cy).powi(2)).sqrt() - SELF_LOOP_RADIUS).abs()
			} else {
				curve_distance((gx, gy), p1, p2, curvature(&link.uid))
			};
			if distance < tolerance && best.is_none_or(|(d, _)| distance < d) {
				best = Some((distance, link.uid.as_str()));
			}
		}
		best.map(|(_, uid)| uid.to_string())
	}

	fn seed_position(&self, i: usize, total: usize, anchor: Option<Position>) -> Position {
		let angle = (i as f64) * 2.0 * PI / total.max(1) as f64;
		let (cx, cy, r) = match anchor {
			Some(p) => (p.x as f64, p.y as f64, 30.0),
			None => (0.0, 0.0, 100.0),
		};
		Position {
			x: (cx + r * angle.cos()) as f32,
			y: (cy + r * angle.sin()) as f32,
			pinned: false,
		}
	}

	fn rebuild_levels(&mut self, data: &GraphData) {
		let uids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		let links: Vec<(&str, &str)> = data
			.links
			.iter()
			.map(|l| (l.source.as_str(), l.target.as_str()))
			.collect();
		let by_uid = dag_levels(&uids, &links);
		let mut levels = HashMap::new();
		self.graph.visit_nodes(|node| {
			if let Some(level) = by_uid.get(node.data.user_data.uid.as_str()) {
				levels.insert(node.index(), *level);
			}
		});
		self.max_level = levels.values().copied().max().unwrap_or(0);
		self.levels = levels;
	}

	/// Pulls nodes onto their DAG level along the layout axis.
	fn apply_dag_constraint(&mut self) {
		let (Some(axis), Some(distance)) = (self.layout.dag_axis, self.layout.level_distance) else {
			return;
		};
		let (levels, max_level) = (&self.levels, self.max_level);
		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			let Some(&level) = levels.get(&node.index()) else {
				return;
			};
			let offset = (level as f64 - max_level as f64 / 2.0) * distance;
			match axis {
				"td" => node.data.y = offset as f32,
				"lr" => node.data.x = offset as f32,
				_ => {
					let ring = if axis == "radialin" {
						(max_level - level) as f64
					} else {
						level as f64
					} * distance;
					let (x, y) = (node.data.x as f64, node.data.y as f64);
					let len = (x * x + y * y).sqrt();
					let (ux, uy) = if len < 1e-6 { (1.0, 0.0) } else { (x / len, y / len) };
					node.data.x = (ux * ring) as f32;
					node.data.y = (uy * ring) as f32;
				}
			}
		});
	}

	/// Pushes overlapping nodes apart by the layout's collision radius.
	fn apply_collisions(&mut self) {
		let radius = self.layout.collision_radius;
		if radius <= 1.0 {
			return;
		}
		let mut points = Vec::new();
		self.graph.visit_nodes(|node| {
			points.push((node.index(), node.x() as f64, node.y() as f64));
		});
		let min_distance = radius * 2.0;
		let mut shift: HashMap<DefaultNodeIdx, (f64, f64)> = HashMap::new();
		for (i, a) in points.iter().enumerate() {
			for b in &points[i + 1..] {
				let (dx, dy) = (b.1 - a.1, b.2 - a.2);
				let distance = (dx * dx + dy * dy).sqrt();
				if distance >= min_distance {
					continue;
				}
				let (ux, uy) = if distance < 1e-6 { (1.0, 0.0) } else { (dx / distance, dy / distance) };
				let push = (min_distance - distance) / 2.0;
				let sa = shift.entry(a.0).or_default();
				sa.0 -= ux * push;
				sa.1 -= uy * push;
				let sb = shift.entry(b.0).or_default();
				sb.0 += ux * push;
				sb.1 += uy * push;
			}
		}
		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some((sx, sy)) = shift.get(&node.index()) {
				node.data.x += *sx as f32;
				node.data.y += *sy as f32;
			}
		});
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.apply_dag_constraint();
		self.apply_collisions();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Distance from `point` to the quadratic curve drawn between `p1` and `p2`.
fn curve_distance(point: (f64, f64), p1: (f64, f64), p2: (f64, f64), curvature: f64) -> f64 {
	let c = control_point(p1, p2, curvature);
	let at = |t: f64| {
		let u = 1.0 - t;
		(
			u * u * p1.0 + 2.0 * u * t * c.0 + t * t * p2.0,
			u * u * p1.1 + 2.0 * u * t * c.1 + t * t * p2.1,
		)
	};
	let mut best = f64::MAX;
	let mut prev = p1;
	for step in 1..=CURVE_SAMPLES {
		let next = at(step as f64 / CURVE_SAMPLES as f64);
		best = best.min(segment_distance(point, prev, next));
		prev = next;
	}
	best
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 < 1e-12 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
	((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

impl RenderEngine for ForceGraphState {
	fn set_graph_data(&mut self, data: GraphData) {
		self.snapshot_positions();
		let known: HashSet<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		self.positions.retain(|uid, _| known.contains(uid.as_str()));

		// New nodes start next to a known neighbour when they have one.
		let mut anchors: HashMap<&str, Position> = HashMap::new();
		for link in &data.links {
			for (new, old) in [(&link.target, &link.source), (&link.source, &link.target)] {
				if !self.positions.contains_key(new.as_str()) {
					if let Some(p) = self.positions.get(old.as_str()) {
						anchors.entry(new.as_str()).or_insert(*p);
					}
				}
			}
		}

		let mut graph = simulation();
		let mut index = HashMap::new();
		let total = data.nodes.len();
		for (i, node) in data.nodes.iter().enumerate() {
			let position = match self.positions.get(&node.id) {
				Some(p) => *p,
				None => self.seed_position(i, total, anchors.get(node.id.as_str()).copied()),
			};
			let idx = graph.add_node(NodeData {
				x: position.x,
				y: position.y,
				mass: 10.0,
				is_anchor: position.pinned,
				user_data: NodeInfo {
					uid: node.id.clone(),
					label: node.label.clone(),
					value: node.value,
				},
			});
			index.insert(node.id.clone(), idx);
		}

		let mut springs = HashSet::new();
		let mut links = Vec::new();
		for link in &data.links {
			if let (Some(&src), Some(&tgt)) = (index.get(&link.source), index.get(&link.target)) {
				// One spring per node pair; self-loops carry no force.
				if src != tgt && springs.insert((src.min(tgt), src.max(tgt))) {
					graph.add_edge(src, tgt, EdgeData::default());
				}
				links.push(LinkInfo {
					uid: link.id.clone(),
					label: link.label.clone(),
					source: src,
					target: tgt,
				});
			}
		}

		self.graph = graph;
		self.links = links;
		self.drag = DragState::default();
		self.animation_running = true;
		self.rebuild_levels(&data);
	}

	fn reset_positions(&mut self) {
		self.graph = simulation();
		self.links.clear();
		self.positions.clear();
		self.parked.clear();
	}

	fn switch_view(&mut self, view: ViewMode) {
		if view == self.view {
			return;
		}
		self.snapshot_positions();
		let current = std::mem::take(&mut self.positions);
		self.parked.insert(self.view, current);
		self.positions = self.parked.remove(&view).unwrap_or_default();
		self.graph = simulation();
		self.links.clear();
		self.view = view;
	}

	fn set_layout(&mut self, params: LayoutParams) {
		self.layout = params;
		self.animation_running = true;
	}

	fn recenter(&mut self) {
		let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
		self.graph.visit_nodes(|node| {
			sx += node.x() as f64;
			sy += node.y() as f64;
			n += 1;
		});
		if n == 0 {
			return;
		}
		let (cx, cy) = (sx / n as f64, sy / n as f64);
		self.transform.k = 1.0;
		self.transform.x = self.width / 2.0 - cx;
		self.transform.y = self.height / 2.0 - cy;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::GraphResponse;
	use crate::graph::{DataUpdate, GraphStore, apply_update};
	use serde_json::{Value, json};

	fn person(uid: &str) -> Value {
		json!({"identifier": uid, "labels": ["Person"], "properties": {"id": uid}})
	}

	fn knows(uid: &str, source: &str, destination: &str) -> Value {
		json!({
			"identifier": uid,
			"labels": ["Knows"],
			"source_node_identifier": source,
			"destination_node_identifier": destination,
		})
	}

	fn response(body: Value) -> GraphResponse {
		GraphResponse::from_body(body).unwrap()
	}

	fn push(state: &mut ForceGraphState, store: &GraphStore, update: &DataUpdate) {
		apply_update(state, store.render_data(), store.layout_params(), update);
	}

	fn positions(state: &ForceGraphState) -> HashMap<String, (f32, f32)> {
		let mut positions = HashMap::new();
		state.graph.visit_nodes(|node| {
			positions.insert(node.data.user_data.uid.clone(), (node.x(), node.y()));
		});
		positions
	}

	fn settle(state: &mut ForceGraphState, ticks: usize) {
		for _ in 0..ticks {
			state.tick(0.016);
		}
	}

	/// Four people in a chain, with a two-table schema, laid out for 200 ticks.
	fn settled_chain() -> (GraphStore, ForceGraphState) {
		let mut store = GraphStore::new(false);
		let update = store.replace_data(response(json!({
			"nodes": [person("1"), person("2"), person("3"), person("4")],
			"edges": [knows("a", "1", "2"), knows("b", "2", "3"), knows("c", "3", "4")],
			"schema": {
				"nodeTables": [
					{"name": "Person", "labelNames": ["Person"], "keyColumns": ["id"]},
					{"name": "City", "labelNames": ["City"]}
				],
				"edgeTables": [{
					"name": "LivesIn",
					"labelNames": ["LivesIn"],
					"sourceNodeTable": {"nodeTableName": "Person"},
					"destinationNodeTable": {"nodeTableName": "City"}
				}]
			}
		})));
		let mut state = ForceGraphState::new(800.0, 600.0);
		push(&mut state, &store, &update);
		settle(&mut state, 200);
		(store, state)
	}

	fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
		((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
	}

	#[test]
	fn table_round_trip_keeps_layout() {
		let (mut store, mut state) = settled_chain();
		let before = positions(&state);

		let to_table = store.set_view_mode(ViewMode::Table).unwrap();
		push(&mut state, &store, &to_table);
		assert_eq!(positions(&state), before);

		let back = store.set_view_mode(ViewMode::Default).unwrap();
		push(&mut state, &store, &back);
		assert_eq!(positions(&state), before);
	}

	#[test]
	fn schema_round_trip_keeps_live_layout() {
		let (mut store, mut state) = settled_chain();
		let before = positions(&state);

		let to_schema = store.set_view_mode(ViewMode::Schema).unwrap();
		push(&mut state, &store, &to_schema);
		let schema: HashSet<String> = positions(&state).into_keys().collect();
		assert_eq!(schema, HashSet::from(["Person".to_string(), "City".to_string()]));
		settle(&mut state, 50);

		let back = store.set_view_mode(ViewMode::Default).unwrap();
		push(&mut state, &store, &back);
		assert_eq!(positions(&state), before);
	}

	#[test]
	fn merge_keeps_settled_nodes_and_seeds_new_ones_nearby() {
		let mut store = GraphStore::new(false);
		let update = store.replace_data(response(json!({
			"nodes": [person("1"), person("2")],
			"edges": [knows("a", "1", "2")],
		})));
		let mut state = ForceGraphState::new(800.0, 600.0);
		push(&mut state, &store, &update);
		settle(&mut state, 100);
		let before = positions(&state);

		let merged = store.merge_expansion(response(json!({
			"nodes": [person("2"), person("3")],
			"edges": [knows("b", "2", "3")],
		})));
		push(&mut state, &store, &merged);
		let after = positions(&state);
		assert_eq!(after["1"], before["1"]);
		assert_eq!(after["2"], before["2"]);
		assert!((distance(after["3"], before["2"]) - 30.0).abs() < 1e-3);
	}

	#[test]
	fn replace_clears_the_position_table() {
		let (mut store, mut state) = settled_chain();
		let update = store.replace_data(response(json!({
			"nodes": [person("1"), person("2"), person("3"), person("4")],
		})));
		push(&mut state, &store, &update);
		for (uid, position) in positions(&state) {
			let radius = distance(position, (0.0, 0.0));
			assert!((radius - 100.0).abs() < 1e-3, "{uid} kept a stale position");
		}
	}

	#[test]
	fn levels_follow_longest_path() {
		let levels = dag_levels(
			&["a", "b", "c", "d"],
			&[("a", "b"), ("b", "c"), ("a", "c"), ("d", "d")],
		);
		assert_eq!(levels["a"], 0);
		assert_eq!(levels["b"], 1);
		assert_eq!(levels["c"], 2);
		assert_eq!(levels["d"], 0);
	}

	#[test]
	fn cycles_do_not_hang() {
		let levels = dag_levels(&["a", "b"], &[("a", "b"), ("b", "a")]);
		assert_eq!(levels.len(), 2);
	}

	#[test]
	fn curve_distance_matches_straight_segment() {
		let d = curve_distance((5.0, 3.0), (0.0, 0.0), (10.0, 0.0), 0.0);
		assert!((d - 3.0).abs() < 1e-9);
	}
}
