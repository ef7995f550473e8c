//! HTTP implementation of [`GraphBackend`].

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde_json::Value;

use super::{ExpansionRequest, GraphBackend, GraphResponse, QueryParams, QueryRequest};
use crate::config::BackendConfig;
use crate::error::{GraphError, GraphResult};

/// Talks to the graph server over HTTP.
pub struct HttpBackend {
	config: BackendConfig,
	http_client: Client,
}

impl HttpBackend {
	/// Client for the server described by `config`.
	pub fn new(config: BackendConfig) -> Self {
		Self {
			config,
			http_client: Client::new(),
		}
	}

	fn route(&self, path: &str) -> String {
		format!("{}{}", self.config.url.trim_end_matches('/'), path)
	}

	async fn read_graph(response: Response) -> GraphResult<GraphResponse> {
		let status = response.status();
		if !status.is_success() {
			let detail = response.text().await.unwrap_or_default();
			return Err(GraphError::Request(format!(
				"Request failed with status {}: {}",
				status, detail
			)));
		}
		let body: Value = response.json().await?;
		GraphResponse::from_body(body)
	}
}

#[async_trait(?Send)]
impl GraphBackend for HttpBackend {
	async fn ping(&self) -> bool {
		let route = self.route(&self.config.ping_path);
		match self.http_client.get(&route).send().await {
			Ok(response) if response.status().is_success() => true,
			Ok(response) => {
				warn!("Ping failed with status {}", response.status());
				false
			}
			Err(e) => {
				warn!("Ping failed: {}", e);
				false
			}
		}
	}

	async fn query(&self, query: &str, params: &QueryParams) -> GraphResult<GraphResponse> {
		let route = self.route(&self.config.query_path);
		let body = QueryRequest::new(query, params)?;
		debug!("POST {}", route);
		let response = self.http_client.post(&route).json(&body).send().await?;
		Self::read_graph(response).await
	}

	async fn expand_node(&self, request: &ExpansionRequest) -> GraphResult<GraphResponse> {
		let route = self.route(&self.config.expansion_path);
		debug!("POST {} uid={} direction={:?}", route, request.uid, request.direction);
		let response = self.http_client.post(&route).json(request).send().await?;
		Self::read_graph(response).await
	}
}
