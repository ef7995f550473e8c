//! Node and edge value objects.
//!
//! Elements are identified solely by `uid`. Simulation state (positions, velocities) is not
//! part of an element; the render adapter keeps it in its own table keyed by uid.

use serde_json::{Map, Value};

use super::curvature::Curvature;
use crate::error::ElementError;

/// Property bag carried by every element.
pub type Properties = Map<String, Value>;

/// Which side of the element model a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
	/// Vertex
	Node,
	/// Relationship
	Edge,
}

impl ElementKind {
	/// Type name used as identifier placeholder and display fallback.
	pub fn type_name(self) -> &'static str {
		match self {
			ElementKind::Node => "Node",
			ElementKind::Edge => "Edge",
		}
	}
}

/// Capabilities shared by nodes and edges.
pub trait GraphElement {
	/// Session-unique identity.
	fn uid(&self) -> &str;
	/// Ordered labels; the first one is the primary type.
	fn labels(&self) -> &[String];
	/// Arbitrary JSON properties.
	fn properties(&self) -> &Properties;
	/// Property keys that identify the element to a human.
	fn key_property_names(&self) -> &[String];
	/// Node or edge.
	fn kind(&self) -> ElementKind;

	/// First label, if any.
	fn primary_label(&self) -> Option<&str> {
		self.labels().first().map(String::as_str)
	}

	/// Resolved key property values, skipping missing and falsy ones.
	///
	/// Falls back to the element type name when nothing resolves.
	fn identifiers(&self) -> Vec<String> {
		let resolved: Vec<String> = self
			.key_property_names()
			.iter()
			.filter_map(|key| self.properties().get(key))
			.filter_map(identifier_text)
			.collect();
		if resolved.is_empty() {
			vec![self.kind().type_name().to_string()]
		} else {
			resolved
		}
	}

	/// `"<primary label> (<uid>)"`, or `"<type name> <uid>"` for unlabeled elements.
	fn display_name(&self) -> String {
		match self.primary_label() {
			Some(label) => format!("{} ({})", label, self.uid()),
			None => format!("{} {}", self.kind().type_name(), self.uid()),
		}
	}
}

fn identifier_text(value: &Value) -> Option<String> {
	match value {
		Value::Null | Value::Bool(false) => None,
		Value::Bool(true) => Some("true".into()),
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Number(n) if n.as_f64() == Some(0.0) => None,
		Value::Number(n) => Some(n.to_string()),
		other => Some(other.to_string()),
	}
}

fn validate_uid(field: &str, uid: &str) -> Result<(), ElementError> {
	if uid.is_empty() {
		return Err(ElementError::InvalidIdentity(format!(
			"{field} must be a non-empty string"
		)));
	}
	Ok(())
}

fn json_uid(field: &str, value: Option<&Value>) -> Result<String, ElementError> {
	match value {
		Some(Value::String(s)) => {
			validate_uid(field, s)?;
			Ok(s.clone())
		}
		Some(other) => Err(ElementError::InvalidIdentity(format!(
			"{field} must be a string, got {other}"
		))),
		None => Err(ElementError::InvalidIdentity(format!("{field} is missing"))),
	}
}

fn json_labels(value: Option<&Value>) -> Result<Vec<String>, ElementError> {
	match value {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Array(items)) => Ok(items
			.iter()
			.map(|item| match item {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			})
			.collect()),
		Some(other) => Err(ElementError::InvalidLabels(format!(
			"labels must be an array, got {other}"
		))),
	}
}

fn json_string_list(value: Option<&Value>) -> Vec<String> {
	value
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.filter_map(Value::as_str)
				.map(String::from)
				.collect()
		})
		.unwrap_or_default()
}

fn json_properties(value: Option<&Value>) -> Properties {
	value.and_then(Value::as_object).cloned().unwrap_or_default()
}

/// Fields shared by [`NodeParams`] and [`EdgeParams`].
#[derive(Clone, Debug, Default)]
struct ElementCore {
	uid: String,
	labels: Vec<String>,
	properties: Properties,
	key_property_names: Vec<String>,
}

impl ElementCore {
	fn from_json(object: &Value) -> Result<Self, ElementError> {
		let uid = json_uid("uid", object.get("identifier").or_else(|| object.get("uid")))?;
		let labels = json_labels(object.get("labels"))?;
		Ok(Self {
			uid,
			labels,
			properties: json_properties(object.get("properties")),
			key_property_names: json_string_list(
				object
					.get("key_property_names")
					.or_else(|| object.get("keyPropertyNames")),
			),
		})
	}
}

/// Input for [`Node::new`].
#[derive(Clone, Debug, Default)]
pub struct NodeParams {
	/// Identity
	pub uid: String,
	/// Ordered labels
	pub labels: Vec<String>,
	/// Properties
	pub properties: Properties,
	/// Human-identifying property keys
	pub key_property_names: Vec<String>,
	/// Size hint
	pub value: Option<f64>,
}

/// A vertex of the visualized graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	uid: String,
	labels: Vec<String>,
	properties: Properties,
	key_property_names: Vec<String>,
	/// Magnitude hint used to size the rendered node.
	pub value: Option<f64>,
}

impl Node {
	/// Validates and builds a node. Fails on an empty uid.
	pub fn new(params: NodeParams) -> Result<Self, ElementError> {
		validate_uid("uid", &params.uid)?;
		Ok(Self {
			uid: params.uid,
			labels: params.labels,
			properties: params.properties,
			key_property_names: params.key_property_names,
			value: params.value,
		})
	}

	/// Builds a node from its wire representation.
	pub fn from_json(object: &Value) -> Result<Self, ElementError> {
		let core = ElementCore::from_json(object)?;
		Ok(Self {
			uid: core.uid,
			labels: core.labels,
			properties: core.properties,
			key_property_names: core.key_property_names,
			value: object.get("value").and_then(Value::as_f64),
		})
	}

	/// Replaces key property names, used when they are resolved from the schema.
	pub fn set_key_property_names(&mut self, names: Vec<String>) {
		self.key_property_names = names;
	}
}

impl GraphElement for Node {
	fn uid(&self) -> &str {
		&self.uid
	}
	fn labels(&self) -> &[String] {
		&self.labels
	}
	fn properties(&self) -> &Properties {
		&self.properties
	}
	fn key_property_names(&self) -> &[String] {
		&self.key_property_names
	}
	fn kind(&self) -> ElementKind {
		ElementKind::Node
	}
}

/// Input for [`Edge::new`].
#[derive(Clone, Debug, Default)]
pub struct EdgeParams {
	/// Identity
	pub uid: String,
	/// Ordered labels
	pub labels: Vec<String>,
	/// Properties
	pub properties: Properties,
	/// Human-identifying property keys
	pub key_property_names: Vec<String>,
	/// Source node uid
	pub source_uid: String,
	/// Destination node uid
	pub destination_uid: String,
}

/// A relationship between two nodes.
///
/// Invalid endpoints do not fail construction: the edge is built with
/// `instantiated == false` so batch loads can skip it.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	uid: String,
	labels: Vec<String>,
	properties: Properties,
	key_property_names: Vec<String>,
	source_uid: String,
	destination_uid: String,
	/// Whether both endpoints validated.
	pub instantiated: bool,
	/// Why the endpoints failed to validate.
	pub instantiation_error_reason: Option<String>,
	/// Derived on every edge set change.
	pub curvature: Curvature,
}

impl Edge {
	/// Validates and builds an edge. Fails only on an invalid uid.
	pub fn new(params: EdgeParams) -> Result<Self, ElementError> {
		validate_uid("uid", &params.uid)?;
		let endpoint_error = validate_uid("source_uid", &params.source_uid)
			.and_then(|_| validate_uid("destination_uid", &params.destination_uid))
			.err();
		Ok(Self::assemble(
			ElementCore {
				uid: params.uid,
				labels: params.labels,
				properties: params.properties,
				key_property_names: params.key_property_names,
			},
			params.source_uid,
			params.destination_uid,
			endpoint_error,
		))
	}

	/// Builds an edge from its wire representation.
	pub fn from_json(object: &Value) -> Result<Self, ElementError> {
		let core = ElementCore::from_json(object)?;
		let source = json_uid(
			"source_uid",
			object
				.get("source_node_identifier")
				.or_else(|| object.get("source")),
		);
		let destination = json_uid(
			"destination_uid",
			object
				.get("destination_node_identifier")
				.or_else(|| object.get("destination")),
		);
		let (source_uid, destination_uid, endpoint_error) = match (source, destination) {
			(Ok(s), Ok(d)) => (s, d, None),
			(Ok(s), Err(e)) => (s, String::new(), Some(e)),
			(Err(e), Ok(d)) => (String::new(), d, Some(e)),
			(Err(e), Err(_)) => (String::new(), String::new(), Some(e)),
		};
		Ok(Self::assemble(core, source_uid, destination_uid, endpoint_error))
	}

	fn assemble(
		core: ElementCore,
		source_uid: String,
		destination_uid: String,
		endpoint_error: Option<ElementError>,
	) -> Self {
		Self {
			uid: core.uid,
			labels: core.labels,
			properties: core.properties,
			key_property_names: core.key_property_names,
			source_uid,
			destination_uid,
			instantiated: endpoint_error.is_none(),
			instantiation_error_reason: endpoint_error.map(|e| e.to_string()),
			curvature: Curvature::default(),
		}
	}

	/// Source node uid.
	pub fn source_uid(&self) -> &str {
		&self.source_uid
	}

	/// Destination node uid.
	pub fn destination_uid(&self) -> &str {
		&self.destination_uid
	}

	/// True when the edge starts and ends at the same node.
	pub fn is_self_loop(&self) -> bool {
		self.source_uid == self.destination_uid
	}

	/// True when `uid` is one of the endpoints.
	pub fn touches(&self, uid: &str) -> bool {
		self.source_uid == uid || self.destination_uid == uid
	}
}

impl GraphElement for Edge {
	fn uid(&self) -> &str {
		&self.uid
	}
	fn labels(&self) -> &[String] {
		&self.labels
	}
	fn properties(&self) -> &Properties {
		&self.properties
	}
	fn key_property_names(&self) -> &[String] {
		&self.key_property_names
	}
	fn kind(&self) -> ElementKind {
		ElementKind::Edge
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn person() -> Node {
		Node::from_json(&json!({
			"identifier": "1",
			"labels": ["Person"],
			"properties": {"name": "Alice", "age": 0},
			"key_property_names": ["name"],
		}))
		.unwrap()
	}

	#[test]
	fn display_name_uses_primary_label_and_uid() {
		assert_eq!(person().display_name(), "Person (1)");

		let unlabeled = Node::new(NodeParams {
			uid: "7".into(),
			..Default::default()
		})
		.unwrap();
		assert_eq!(unlabeled.display_name(), "Node 7");
	}

	#[test]
	fn identifiers_skip_falsy_and_fall_back_to_type_name() {
		assert_eq!(person().identifiers(), vec!["Alice".to_string()]);

		let mut node = person();
		node.set_key_property_names(vec!["age".into(), "missing".into()]);
		assert_eq!(node.identifiers(), vec!["Node".to_string()]);

		let edge = Edge::new(EdgeParams {
			uid: "e".into(),
			source_uid: "1".into(),
			destination_uid: "2".into(),
			..Default::default()
		})
		.unwrap();
		assert_eq!(edge.identifiers(), vec!["Edge".to_string()]);
	}

	#[test]
	fn invalid_uid_is_a_validation_error() {
		let err = Node::new(NodeParams::default()).unwrap_err();
		assert!(matches!(err, ElementError::InvalidIdentity(_)));

		let err = Node::from_json(&json!({"identifier": 12, "labels": []})).unwrap_err();
		assert!(matches!(err, ElementError::InvalidIdentity(_)));
	}

	#[test]
	fn non_array_labels_is_a_type_error() {
		let err = Node::from_json(&json!({"identifier": "1", "labels": "Person"})).unwrap_err();
		assert!(matches!(err, ElementError::InvalidLabels(_)));
	}

	#[test]
	fn bad_edge_endpoint_does_not_fail_construction() {
		let edge = Edge::new(EdgeParams {
			uid: "e1".into(),
			source_uid: String::new(),
			destination_uid: "2".into(),
			..Default::default()
		})
		.unwrap();
		assert!(!edge.instantiated);
		assert!(edge.instantiation_error_reason.is_some());

		let edge = Edge::from_json(&json!({
			"identifier": "e2",
			"labels": ["KNOWS"],
			"source_node_identifier": "1",
		}))
		.unwrap();
		assert!(!edge.instantiated);
	}

	#[test]
	fn edge_wire_shape_accepts_aliases() {
		let edge = Edge::from_json(&json!({
			"uid": "a",
			"labels": ["KNOWS"],
			"source": "1",
			"destination": "1",
		}))
		.unwrap();
		assert!(edge.instantiated);
		assert!(edge.is_self_loop());
		assert!(edge.touches("1"));
	}
}
