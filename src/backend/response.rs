//! Response bodies consumed by the session.

use serde_json::Value;

use crate::error::{GraphError, GraphResult};

/// Elements, schema and rows returned by a query or an expansion.
///
/// Elements stay raw JSON here; each one is validated separately when loaded so that one bad
/// element does not reject the whole response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphResponse {
	/// Raw node objects
	pub nodes: Vec<Value>,
	/// Raw edge objects
	pub edges: Vec<Value>,
	/// Schema, as an object or a JSON-encoded string
	pub schema: Option<Value>,
	/// Tabular rows for the table view
	pub rows: Vec<Value>,
}

fn array(object: &mut serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
	match object.remove(key) {
		Some(Value::Array(items)) => items,
		_ => Vec::new(),
	}
}

impl GraphResponse {
	/// Parses a response body, unwrapping an optional `{"response": {...}}` envelope.
	///
	/// A body carrying `{"error": "..."}` becomes [`GraphError::Server`].
	pub fn from_body(body: Value) -> GraphResult<Self> {
		let mut object = match body {
			Value::Object(object) => object,
			other => {
				return Err(GraphError::Request(format!(
					"Expected a JSON object, got {}",
					other
				)));
			}
		};
		if let Some(error) = object.remove("error").filter(|error| !error.is_null()) {
			let message = match error {
				Value::String(s) => s,
				other => other.to_string(),
			};
			return Err(GraphError::Server(message));
		}
		if let Some(Value::Object(inner)) = object.remove("response") {
			object = inner;
		}
		Ok(Self {
			nodes: array(&mut object, "nodes"),
			edges: array(&mut object, "edges"),
			schema: object.remove("schema").filter(|schema| !schema.is_null()),
			rows: array(&mut object, "rows"),
		})
	}
}
