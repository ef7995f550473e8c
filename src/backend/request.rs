//! Request payloads and the local checks run before anything reaches the network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, GraphResult};
use crate::graph::{GraphElement, Node, Schema};

/// Connection parameters forwarded with every query.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct QueryParams {
	/// Cloud project
	#[serde(default)]
	pub project: String,
	/// Database instance
	#[serde(default)]
	pub instance: String,
	/// Database
	#[serde(default)]
	pub database: String,
	/// Property graph name
	#[serde(default)]
	pub graph: String,
	/// Serve canned data instead of querying a database
	#[serde(default)]
	pub mock: bool,
}

/// Body of a query request. `params` travels as a JSON-encoded string.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct QueryRequest {
	/// Query text
	pub query: String,
	/// Encoded [`QueryParams`]
	pub params: String,
}

impl QueryRequest {
	/// Encodes `params` into the request body.
	pub fn new(query: &str, params: &QueryParams) -> GraphResult<Self> {
		Ok(Self {
			query: query.to_string(),
			params: serde_json::to_string(params)?,
		})
	}
}

/// Traversal direction of a node expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeDirection {
	/// Edges ending at the node
	Incoming,
	/// Edges starting at the node
	Outgoing,
}

/// Type tag of the key property used to locate the node being expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
	/// BOOL
	Bool,
	/// BYTES
	Bytes,
	/// DATE
	Date,
	/// ENUM
	Enum,
	/// INT64
	Int64,
	/// NUMERIC
	Numeric,
	/// FLOAT32
	Float32,
	/// FLOAT64
	Float64,
	/// STRING
	String,
	/// TIMESTAMP
	Timestamp,
}

impl PropertyType {
	/// Every accepted tag, in the order listed in error messages.
	pub const ALL: [PropertyType; 10] = [
		PropertyType::Bool,
		PropertyType::Bytes,
		PropertyType::Date,
		PropertyType::Enum,
		PropertyType::Int64,
		PropertyType::Numeric,
		PropertyType::Float32,
		PropertyType::Float64,
		PropertyType::String,
		PropertyType::Timestamp,
	];

	/// Upper-case wire name.
	pub fn as_str(self) -> &'static str {
		match self {
			PropertyType::Bool => "BOOL",
			PropertyType::Bytes => "BYTES",
			PropertyType::Date => "DATE",
			PropertyType::Enum => "ENUM",
			PropertyType::Int64 => "INT64",
			PropertyType::Numeric => "NUMERIC",
			PropertyType::Float32 => "FLOAT32",
			PropertyType::Float64 => "FLOAT64",
			PropertyType::String => "STRING",
			PropertyType::Timestamp => "TIMESTAMP",
		}
	}

	/// Tag inferred from a JSON value when the schema declares none.
	///
	/// Integer-valued numbers are INT64, other numbers FLOAT64, booleans BOOL, anything
	/// else STRING.
	pub fn infer(value: &Value) -> Self {
		match value {
			Value::Bool(_) => PropertyType::Bool,
			Value::Number(n) if n.is_i64() || n.is_u64() => PropertyType::Int64,
			Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => {
				PropertyType::Int64
			}
			Value::Number(_) => PropertyType::Float64,
			_ => PropertyType::String,
		}
	}

	/// Parses an optional tag, case-insensitively.
	pub fn parse(raw: Option<&str>) -> GraphResult<Self> {
		match raw.map(str::trim) {
			None | Some("") => Err(GraphError::Protocol("Property type must be provided".into())),
			Some(text) => text.parse(),
		}
	}
}

impl fmt::Display for PropertyType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PropertyType {
	type Err = GraphError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let upper = s.trim().to_uppercase();
		PropertyType::ALL
			.into_iter()
			.find(|t| t.as_str() == upper)
			.ok_or_else(|| {
				let allowed: Vec<&str> = PropertyType::ALL.iter().map(|t| t.as_str()).collect();
				GraphError::Protocol(format!(
					"Invalid property type: {}. Allowed types are: {}",
					s,
					allowed.join(", ")
				))
			})
	}
}

/// Body of a node expansion request.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExpansionRequest {
	/// Cloud project
	pub project: String,
	/// Database instance
	pub instance: String,
	/// Database
	pub database: String,
	/// Property graph name
	pub graph: String,
	/// Node being expanded
	pub uid: String,
	/// Key property used to locate the node
	pub node_key_property_name: String,
	/// Key property value, as text
	pub node_key_property_value: String,
	/// Key property type tag
	pub property_type: PropertyType,
	/// Traversal direction
	pub direction: EdgeDirection,
	/// Restrict the expansion to one edge label
	#[serde(skip_serializing_if = "Option::is_none")]
	pub edge_label: Option<String>,
}

fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

impl ExpansionRequest {
	/// Builds the request for `node`, resolving its key property and type tag.
	///
	/// Fails without touching the network when the node has no usable key property or its
	/// declared type is not an accepted tag.
	pub fn for_node(
		node: &Node,
		schema: Option<&Schema>,
		params: &QueryParams,
		direction: EdgeDirection,
		edge_label: Option<String>,
	) -> GraphResult<Self> {
		let (name, value) = node
			.key_property_names()
			.iter()
			.find_map(|name| node.properties().get(name).map(|value| (name, value)))
			.ok_or_else(|| {
				GraphError::Protocol(format!(
					"Node {} has no key property to expand from",
					node.uid()
				))
			})?;

		let property_type = match schema.and_then(|s| s.property_type(name)) {
			Some(declared) => PropertyType::parse(Some(declared))?,
			None => PropertyType::infer(value),
		};

		Ok(Self {
			project: params.project.clone(),
			instance: params.instance.clone(),
			database: params.database.clone(),
			graph: params.graph.clone(),
			uid: node.uid().to_string(),
			node_key_property_name: name.clone(),
			node_key_property_value: value_text(value),
			property_type,
			direction,
			edge_label: edge_label.filter(|label| !label.is_empty()),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::NodeParams;
	use serde_json::json;

	fn node(properties: Value) -> Node {
		Node::new(NodeParams {
			uid: "1".into(),
			labels: vec!["Person".into()],
			properties: properties.as_object().cloned().unwrap(),
			key_property_names: vec!["id".into()],
			value: None,
		})
		.unwrap()
	}

	#[test]
	fn parses_tags_case_insensitively() {
		assert_eq!("int64".parse::<PropertyType>().unwrap(), PropertyType::Int64);
		assert_eq!("Bool".parse::<PropertyType>().unwrap(), PropertyType::Bool);
		assert_eq!(PropertyType::parse(Some("timestamp")).unwrap(), PropertyType::Timestamp);
	}

	#[test]
	fn rejects_unknown_and_missing_tags() {
		for raw in ["ARRAY", "STRUCT", "JSON", "PROTO", "INVALID_TYPE"] {
			let message = raw.parse::<PropertyType>().unwrap_err().to_string();
			assert!(message.contains("Invalid property type"), "{message}");
			assert!(message.contains("Allowed types are:"), "{message}");
		}
		for raw in [None, Some("")] {
			let message = PropertyType::parse(raw).unwrap_err().to_string();
			assert!(message.contains("Property type must be provided"));
		}
	}

	#[test]
	fn infers_tags_from_values() {
		assert_eq!(PropertyType::infer(&json!(7)), PropertyType::Int64);
		assert_eq!(PropertyType::infer(&json!(7.0)), PropertyType::Int64);
		assert_eq!(PropertyType::infer(&json!(7.5)), PropertyType::Float64);
		assert_eq!(PropertyType::infer(&json!(true)), PropertyType::Bool);
		assert_eq!(PropertyType::infer(&json!("x")), PropertyType::String);
	}

	#[test]
	fn expansion_request_uses_declared_type_before_inference() {
		let schema = Schema::from_value(&json!({
			"propertyDeclarations": [{"name": "id", "type": "string"}]
		}))
		.unwrap();
		let params = QueryParams::default();
		let node = node(json!({"id": 42}));

		let inferred =
			ExpansionRequest::for_node(&node, None, &params, EdgeDirection::Outgoing, None)
				.unwrap();
		assert_eq!(inferred.property_type, PropertyType::Int64);
		assert_eq!(inferred.node_key_property_value, "42");

		let declared = ExpansionRequest::for_node(
			&node,
			Some(&schema),
			&params,
			EdgeDirection::Incoming,
			Some("Owns".into()),
		)
		.unwrap();
		assert_eq!(declared.property_type, PropertyType::String);

		let body = serde_json::to_value(&declared).unwrap();
		assert_eq!(body["direction"], "INCOMING");
		assert_eq!(body["property_type"], "STRING");
		assert_eq!(body["edge_label"], "Owns");
	}

	#[test]
	fn expansion_rejects_unsupported_declared_type() {
		let schema = Schema::from_value(&json!({
			"propertyDeclarations": [{"name": "id", "type": "JSON"}]
		}))
		.unwrap();
		let err = ExpansionRequest::for_node(
			&node(json!({"id": 1})),
			Some(&schema),
			&QueryParams::default(),
			EdgeDirection::Outgoing,
			None,
		)
		.unwrap_err();
		assert!(matches!(err, GraphError::Protocol(_)));
	}

	#[test]
	fn expansion_needs_a_key_property() {
		let err = ExpansionRequest::for_node(
			&node(json!({"name": "Alice"})),
			None,
			&QueryParams::default(),
			EdgeDirection::Outgoing,
			None,
		)
		.unwrap_err();
		assert!(matches!(err, GraphError::Protocol(_)));
	}

	#[test]
	fn query_params_travel_as_a_string() {
		let request = QueryRequest::new(
			"GRAPH g MATCH (n) RETURN n",
			&QueryParams {
				graph: "g".into(),
				mock: true,
				..Default::default()
			},
		)
		.unwrap();
		let params: Value = serde_json::from_str(&request.params).unwrap();
		assert_eq!(params["graph"], "g");
		assert_eq!(params["mock"], true);
	}
}
