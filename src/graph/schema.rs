//! Property-graph schema descriptors.
//!
//! Read-only once loaded. Drives the schema view and key-property resolution, never identity.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::element::{Edge, EdgeParams, Node, NodeParams, Properties};

/// Maps a property declaration onto a column expression of a table.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
	/// Declared property name
	pub property_declaration_name: String,
	/// Column expression backing the property
	#[serde(default)]
	pub value_expression_sql: String,
}

/// Link from an edge table to one of its endpoint node tables.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeTableReference {
	/// Referenced node table
	pub node_table_name: String,
	/// Edge-side join columns
	#[serde(default)]
	pub edge_table_columns: Vec<String>,
	/// Node-side join columns
	#[serde(default)]
	pub node_table_columns: Vec<String>,
}

/// A node table of the graph.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeTable {
	/// Table name
	pub name: String,
	/// Labels exposed by the table
	#[serde(default)]
	pub label_names: Vec<String>,
	/// Primary key columns
	#[serde(default)]
	pub key_columns: Vec<String>,
	/// Properties exposed by the table
	#[serde(default)]
	pub property_definitions: Vec<PropertyDefinition>,
}

/// An edge table of the graph.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTable {
	/// Table name
	pub name: String,
	/// Labels exposed by the table
	#[serde(default)]
	pub label_names: Vec<String>,
	/// Primary key columns
	#[serde(default)]
	pub key_columns: Vec<String>,
	/// Properties exposed by the table
	#[serde(default)]
	pub property_definitions: Vec<PropertyDefinition>,
	/// Source endpoint table
	#[serde(default)]
	pub source_node_table: NodeTableReference,
	/// Destination endpoint table
	#[serde(default)]
	pub destination_node_table: NodeTableReference,
}

/// A declared property and its type name.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PropertyDeclaration {
	/// Property name
	pub name: String,
	/// Database type name, e.g. `INT64`
	#[serde(default, rename = "type")]
	pub type_name: String,
}

/// Whole graph schema.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
	/// Graph name
	#[serde(default)]
	pub name: String,
	/// Node tables
	#[serde(default)]
	pub node_tables: Vec<NodeTable>,
	/// Edge tables
	#[serde(default)]
	pub edge_tables: Vec<EdgeTable>,
	/// Property declarations
	#[serde(default)]
	pub property_declarations: Vec<PropertyDeclaration>,
}

impl Schema {
	/// Parses a schema given either as a JSON object or as a JSON-encoded string.
	pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
		match value {
			Value::String(text) => serde_json::from_str(text),
			other => Self::deserialize(other),
		}
	}

	/// Labels owned by exactly one single-label node table.
	fn unique_node_labels(&self) -> HashMap<&str, &NodeTable> {
		let mut counts: HashMap<&str, (usize, &NodeTable)> = HashMap::new();
		for table in &self.node_tables {
			if let [label] = table.label_names.as_slice() {
				counts.entry(label.as_str()).or_insert((0, table)).0 += 1;
			}
		}
		counts
			.into_iter()
			.filter(|(_, (count, _))| *count == 1)
			.map(|(label, (_, table))| (label, table))
			.collect()
	}

	/// Key property names for a node carrying `labels`.
	///
	/// Only resolvable for single-label nodes whose label maps to exactly one node table;
	/// empty otherwise.
	pub fn key_property_names(&self, labels: &[String]) -> Vec<String> {
		let [label] = labels else {
			return Vec::new();
		};
		let unique = self.unique_node_labels();
		let Some(table) = unique.get(label.as_str()) else {
			return Vec::new();
		};
		table
			.key_columns
			.iter()
			.filter_map(|column| {
				table
					.property_definitions
					.iter()
					.find(|p| &p.value_expression_sql == column)
					.map(|p| p.property_declaration_name.clone())
			})
			.collect()
	}

	/// Declared type of a property, if any.
	pub fn property_type(&self, name: &str) -> Option<&str> {
		self.property_declarations
			.iter()
			.find(|p| p.name == name)
			.map(|p| p.type_name.as_str())
			.filter(|t| !t.is_empty())
	}

	fn declared_properties(&self, definitions: &[PropertyDefinition]) -> Properties {
		definitions
			.iter()
			.map(|d| {
				let declared = self.property_type(&d.property_declaration_name).unwrap_or("");
				(d.property_declaration_name.clone(), Value::String(declared.into()))
			})
			.collect()
	}

	/// Schema rendered as a graph: node tables become nodes, edge tables become edges.
	///
	/// Nodes carry the table's labels so they share label colors with live nodes.
	pub fn to_graph(&self) -> (IndexMap<String, Node>, IndexMap<String, Edge>) {
		let mut nodes = IndexMap::new();
		for table in &self.node_tables {
			let params = NodeParams {
				uid: table.name.clone(),
				labels: table.label_names.clone(),
				properties: self.declared_properties(&table.property_definitions),
				key_property_names: Vec::new(),
				value: None,
			};
			match Node::new(params) {
				Ok(node) => {
					nodes.insert(table.name.clone(), node);
				}
				Err(e) => warn!("Skipping schema node table: {}", e),
			}
		}

		let mut edges = IndexMap::new();
		for table in &self.edge_tables {
			let params = EdgeParams {
				uid: table.name.clone(),
				labels: table.label_names.clone(),
				properties: self.declared_properties(&table.property_definitions),
				key_property_names: Vec::new(),
				source_uid: table.source_node_table.node_table_name.clone(),
				destination_uid: table.destination_node_table.node_table_name.clone(),
			};
			match Edge::new(params) {
				Ok(edge) if edge.instantiated => {
					edges.insert(table.name.clone(), edge);
				}
				Ok(edge) => warn!(
					"Skipping schema edge table {}: {}",
					table.name,
					edge.instantiation_error_reason.unwrap_or_default()
				),
				Err(e) => warn!("Skipping schema edge table: {}", e),
			}
		}
		(nodes, edges)
	}
}
