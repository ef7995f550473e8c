//! Error taxonomy for element construction, backend requests and expansion protocol checks.

use thiserror::Error;

/// Failure to construct a single graph element.
///
/// Fatal to the element it was raised for; batch loads skip the element and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
	/// `uid` (or an identity field validated like it) is missing, not a string, or empty.
	#[error("Validation error: {0}")]
	InvalidIdentity(String),

	/// `labels` is present but is not an array.
	#[error("Type error: {0}")]
	InvalidLabels(String),
}

/// Errors surfaced by graph sessions and backends.
#[derive(Error, Debug)]
pub enum GraphError {
	/// Element construction failed
	#[error(transparent)]
	Element(#[from] ElementError),

	/// Non-2xx response or unreachable backend
	#[error("Request error: {0}")]
	Request(String),

	/// The backend answered with an `{"error": ...}` body
	#[error("Server error: {0}")]
	Server(String),

	/// HTTP transport error
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	/// JSON serialization/deserialization error
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Request rejected locally before reaching the network
	#[error("Protocol error: {0}")]
	Protocol(String),

	/// Referenced node is not part of the session
	#[error("Unknown node: {0}")]
	UnknownNode(String),
}

/// Result alias used across the crate.
pub type GraphResult<T> = Result<T, GraphError>;
