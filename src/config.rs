//! Application configuration.
//!
//! Read from a JSON document embedded in the host page; every field has a default.

use log::warn;
use serde::Deserialize;

use crate::backend::QueryParams;

/// Id of the `<script type="application/json">` element holding the configuration.
pub const CONFIG_ELEMENT_ID: &str = "graph-config";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
	/// Graph server location
	#[serde(default)]
	pub backend: BackendConfig,

	/// Parameters forwarded with every query
	#[serde(default)]
	pub connection: QueryParams,

	/// Query executed once on mount
	#[serde(default)]
	pub initial_query: Option<String>,

	/// Initial state of the "show labels" toggle
	#[serde(default)]
	pub show_labels: bool,
}

/// Graph server endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
	/// Base URL
	#[serde(default = "default_url")]
	pub url: String,

	/// GET liveness endpoint
	#[serde(default = "default_ping_path")]
	pub ping_path: String,

	/// POST query endpoint
	#[serde(default = "default_query_path")]
	pub query_path: String,

	/// POST node expansion endpoint
	#[serde(default = "default_expansion_path")]
	pub expansion_path: String,
}

impl Default for BackendConfig {
	fn default() -> Self {
		Self {
			url: default_url(),
			ping_path: default_ping_path(),
			query_path: default_query_path(),
			expansion_path: default_expansion_path(),
		}
	}
}

fn default_url() -> String {
	"http://localhost:8195".to_string()
}

fn default_ping_path() -> String {
	"/get_ping".to_string()
}

fn default_query_path() -> String {
	"/post_query".to_string()
}

fn default_expansion_path() -> String {
	"/post_node_expansion".to_string()
}

impl AppConfig {
	/// Parses a JSON configuration document.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Parses `text` when present, falling back to defaults on absence or error.
	pub fn from_optional_json(text: Option<&str>) -> Self {
		let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
			warn!("No embedded configuration, using defaults");
			return Self::default();
		};
		match Self::from_json(text) {
			Ok(config) => config,
			Err(e) => {
				warn!("Invalid configuration, using defaults: {}", e);
				Self::default()
			}
		}
	}

	/// Reads the configuration embedded in the current document.
	pub fn from_document() -> Self {
		let text = web_sys::window()
			.and_then(|window| window.document())
			.and_then(|document| document.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|element| element.text_content());
		Self::from_optional_json(text.as_deref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_document_keeps_defaults() {
		let config = AppConfig::from_json(
			r#"{
				"backend": {"url": "http://127.0.0.1:9000/"},
				"connection": {"project": "p", "graph": "FinGraph", "mock": true},
				"initial_query": "GRAPH FinGraph MATCH p = (a)-[e]->(b) RETURN TO_JSON(p) AS p"
			}"#,
		)
		.unwrap();
		assert_eq!(config.backend.url, "http://127.0.0.1:9000/");
		assert_eq!(config.backend.query_path, "/post_query");
		assert_eq!(config.connection.graph, "FinGraph");
		assert!(config.connection.mock);
		assert_eq!(config.connection.instance, "");
		assert!(!config.show_labels);
	}

	#[test]
	fn malformed_or_missing_document_falls_back() {
		assert_eq!(AppConfig::from_optional_json(None), AppConfig::default());
		assert_eq!(AppConfig::from_optional_json(Some("  ")), AppConfig::default());
		assert_eq!(AppConfig::from_optional_json(Some("{nope")), AppConfig::default());
		assert_eq!(AppConfig::default().backend.ping_path, "/get_ping");
	}
}
