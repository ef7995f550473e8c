//! Runs backend requests against the session store.
//!
//! Responses are applied in the order they resolve. The store is only borrowed after a
//! response arrives, never across an await.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{error, info};

use crate::backend::{EdgeDirection, GraphBackend, QueryParams};
use crate::error::GraphResult;
use crate::graph::{DataUpdate, GraphStore};

/// In-flight request counter exposed as a boolean `loading` flag.
#[derive(Clone, Default)]
pub struct LoadingFlag {
	in_flight: Rc<Cell<usize>>,
	observer: Option<Rc<dyn Fn(bool)>>,
}

impl LoadingFlag {
	/// Flag that calls `observer` whenever it flips.
	pub fn with_observer(observer: impl Fn(bool) + 'static) -> Self {
		Self {
			in_flight: Rc::default(),
			observer: Some(Rc::new(observer)),
		}
	}

	/// True while any request is pending.
	pub fn is_loading(&self) -> bool {
		self.in_flight.get() > 0
	}

	/// Marks a request as started; the flag clears when the guard drops, whatever the outcome.
	pub fn begin(&self) -> LoadingGuard {
		let was_loading = self.is_loading();
		self.in_flight.set(self.in_flight.get() + 1);
		if !was_loading {
			self.notify(true);
		}
		LoadingGuard { flag: self.clone() }
	}

	fn notify(&self, loading: bool) {
		if let Some(observer) = self.observer.as_deref() {
			observer(loading);
		}
	}
}

/// Keeps [`LoadingFlag`] raised while alive.
pub struct LoadingGuard {
	flag: LoadingFlag,
}

impl Drop for LoadingGuard {
	fn drop(&mut self) {
		let remaining = self.flag.in_flight.get().saturating_sub(1);
		self.flag.in_flight.set(remaining);
		if remaining == 0 {
			self.flag.notify(false);
		}
	}
}

/// Owns the backend and connection parameters; mutates the shared store on each response.
pub struct GraphController<B: GraphBackend> {
	backend: B,
	params: QueryParams,
	store: Rc<RefCell<GraphStore>>,
	loading: LoadingFlag,
}

impl<B: GraphBackend> GraphController<B> {
	/// Controller over `store`.
	pub fn new(backend: B, params: QueryParams, store: Rc<RefCell<GraphStore>>, loading: LoadingFlag) -> Self {
		Self {
			backend,
			params,
			store,
			loading,
		}
	}

	/// Shared session store.
	pub fn store(&self) -> &Rc<RefCell<GraphStore>> {
		&self.store
	}

	/// True while any request is pending.
	pub fn is_loading(&self) -> bool {
		self.loading.is_loading()
	}

	/// Backend liveness.
	pub async fn ping(&self) -> bool {
		let _guard = self.loading.begin();
		self.backend.ping().await
	}

	/// Runs `query` and replaces the whole graph with its result.
	pub async fn execute_query(&self, query: &str) -> GraphResult<DataUpdate> {
		let _guard = self.loading.begin();
		info!("Executing query");
		let response = self.backend.query(query, &self.params).await.inspect_err(|e| {
			error!("Query failed: {}", e);
		})?;
		Ok(self.store.borrow_mut().replace_data(response))
	}

	/// Expands node `uid` in `direction` and merges the result.
	///
	/// Requests the store cannot build (unknown node, missing key property, unsupported
	/// property type) fail before any network call.
	pub async fn expand_node(
		&self,
		uid: &str,
		direction: EdgeDirection,
		edge_label: Option<String>,
	) -> GraphResult<DataUpdate> {
		let request = self
			.store
			.borrow()
			.expansion_request(uid, &self.params, direction, edge_label)?;
		let _guard = self.loading.begin();
		info!("Expanding node {} ({:?})", uid, direction);
		let response = self.backend.expand_node(&request).await.inspect_err(|e| {
			error!("Expansion of {} failed: {}", uid, e);
		})?;
		Ok(self.store.borrow_mut().merge_expansion(response))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{ExpansionRequest, GraphResponse};
	use crate::error::GraphError;
	use async_trait::async_trait;
	use serde_json::{Value, json};

	struct CannedBackend {
		query: Value,
		expansion: Value,
		expansions: Cell<usize>,
		loading_seen: LoadingFlag,
		observed: Cell<bool>,
	}

	#[async_trait(?Send)]
	impl GraphBackend for CannedBackend {
		async fn ping(&self) -> bool {
			true
		}

		async fn query(&self, _query: &str, _params: &QueryParams) -> GraphResult<GraphResponse> {
			self.observed.set(self.loading_seen.is_loading());
			GraphResponse::from_body(self.query.clone())
		}

		async fn expand_node(&self, _request: &ExpansionRequest) -> GraphResult<GraphResponse> {
			self.expansions.set(self.expansions.get() + 1);
			GraphResponse::from_body(self.expansion.clone())
		}
	}

	fn node(uid: &str) -> Value {
		json!({
			"identifier": uid,
			"labels": ["Person"],
			"properties": {"id": uid},
			"key_property_names": ["id"],
		})
	}

	fn controller(query: Value, expansion: Value) -> (GraphController<CannedBackend>, Rc<Cell<Vec<bool>>>) {
		let transitions: Rc<Cell<Vec<bool>>> = Rc::default();
		let recorded = transitions.clone();
		let loading = LoadingFlag::with_observer(move |flag| {
			let mut seen = recorded.take();
			seen.push(flag);
			recorded.set(seen);
		});
		let backend = CannedBackend {
			query,
			expansion,
			expansions: Cell::new(0),
			loading_seen: loading.clone(),
			observed: Cell::new(false),
		};
		let store = Rc::new(RefCell::new(GraphStore::new(false)));
		(GraphController::new(backend, QueryParams::default(), store, loading), transitions)
	}

	#[tokio::test]
	async fn query_replaces_and_loading_always_clears() {
		let (controller, transitions) = controller(json!({"response": {"nodes": [node("1")]}}), json!({}));
		let update = controller.execute_query("GRAPH g MATCH (n) RETURN n").await.unwrap();
		assert!(update.recenter);
		assert!(controller.backend.observed.get());
		assert!(!controller.is_loading());
		assert_eq!(transitions.take(), vec![true, false]);
	}

	#[tokio::test]
	async fn failed_query_still_clears_loading() {
		let (controller, transitions) = controller(json!({"error": "boom"}), json!({}));
		let err = controller.execute_query("bad").await.unwrap_err();
		assert!(matches!(err, GraphError::Server(_)));
		assert!(!controller.is_loading());
		assert_eq!(transitions.take(), vec![true, false]);
	}

	#[tokio::test]
	async fn expansion_merges_without_duplicates() {
		let (controller, _) = controller(
			json!({"nodes": [node("1")]}),
			json!({"nodes": [node("1"), node("2")], "edges": [{
				"identifier": "e",
				"labels": ["Knows"],
				"source_node_identifier": "1",
				"destination_node_identifier": "2",
			}]}),
		);
		controller.execute_query("q").await.unwrap();
		let update = controller
			.expand_node("1", EdgeDirection::Outgoing, None)
			.await
			.unwrap();
		assert!(!update.recenter);
		assert_eq!(update.report.added_nodes, vec!["2".to_string()]);
		let store = controller.store().borrow();
		let uids: Vec<&str> = store.nodes().keys().map(String::as_str).collect();
		assert_eq!(uids, ["1", "2"]);
	}

	#[tokio::test]
	async fn invalid_expansion_never_reaches_the_backend() {
		let (controller, transitions) = controller(json!({"nodes": [node("1")]}), json!({}));
		controller.execute_query("q").await.unwrap();
		transitions.take();

		let err = controller
			.expand_node("missing", EdgeDirection::Incoming, None)
			.await
			.unwrap_err();
		assert!(matches!(err, GraphError::UnknownNode(_)));
		assert_eq!(controller.backend.expansions.get(), 0);
		assert!(transitions.take().is_empty());
	}
}
