//! Boundary toward the query backend.
//!
//! The session only talks to a [`GraphBackend`]; the HTTP client is one implementation and
//! tests inject their own.

mod http;
mod request;
mod response;

use async_trait::async_trait;

use crate::error::GraphResult;

pub use http::HttpBackend;
pub use request::{EdgeDirection, ExpansionRequest, PropertyType, QueryParams, QueryRequest};
pub use response::GraphResponse;

/// Operations the backend answers.
///
/// Futures are not `Send`: everything runs on the browser event loop.
#[async_trait(?Send)]
pub trait GraphBackend {
	/// Liveness check. Never fails; any error reads as `false`.
	async fn ping(&self) -> bool;

	/// Runs `query` and returns the full result.
	async fn query(&self, query: &str, params: &QueryParams) -> GraphResult<GraphResponse>;

	/// Fetches the neighbourhood described by `request`.
	async fn expand_node(&self, request: &ExpansionRequest) -> GraphResult<GraphResponse>;
}
