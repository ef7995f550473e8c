use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::backend::{EdgeDirection, HttpBackend};
use crate::components::force_graph::{ExpandHandler, ForceGraphCanvas, SelectHandler};
use crate::config::AppConfig;
use crate::controller::{GraphController, LoadingFlag};
use crate::graph::{DataUpdate, ElementRef, GraphStore, LayoutMode, ViewMode};

type Controller = GraphController<HttpBackend>;

fn view_label(mode: ViewMode) -> &'static str {
	match mode {
		ViewMode::Default => "Graph",
		ViewMode::Table => "Table",
		ViewMode::Schema => "Schema",
	}
}

fn layout_label(mode: LayoutMode) -> &'static str {
	match mode {
		LayoutMode::Force => "Force",
		LayoutMode::TopDown => "Top-down",
		LayoutMode::LeftRight => "Left-right",
		LayoutMode::RadialIn => "Radial in",
		LayoutMode::RadialOut => "Radial out",
	}
}

/// Signals the page mirrors out of the store after each change.
#[derive(Clone, Copy)]
struct PageSignals {
	update: RwSignal<Option<DataUpdate>>,
	rows: RwSignal<Vec<String>>,
	error: RwSignal<Option<String>>,
	selection: RwSignal<Option<String>>,
}

impl PageSignals {
	fn sync_rows(&self, store: &GraphStore) {
		self.rows
			.set(store.rows().iter().map(|row| row.to_string()).collect());
	}

	fn sync_selection(&self, store: &GraphStore, target: Option<ElementRef>) {
		self.selection
			.set(target.and_then(|target| store.display_name(&target)));
	}
}

fn run_query(controller: Rc<Controller>, query: String, signals: PageSignals) {
	spawn_local(async move {
		match controller.execute_query(&query).await {
			Ok(update) => {
				signals.error.set(None);
				signals.selection.set(None);
				signals.sync_rows(&controller.store().borrow());
				signals.update.set(Some(update));
			}
			Err(e) => signals.error.set(Some(e.to_string())),
		}
	});
}

fn expand(controller: Rc<Controller>, uid: String, direction: EdgeDirection, signals: PageSignals) {
	spawn_local(async move {
		match controller.expand_node(&uid, direction, None).await {
			Ok(update) if update.report.is_empty() => {
				info!("Expansion of {} found nothing new", uid);
			}
			Ok(update) => {
				signals.error.set(None);
				signals.update.set(Some(update));
			}
			Err(e) => signals.error.set(Some(e.to_string())),
		}
	});
}

/// Explorer page: query bar, mode toolbar, and the graph canvas or row table.
#[component]
pub fn Home() -> impl IntoView {
	let config = AppConfig::from_document();
	let store = Rc::new(RefCell::new(GraphStore::new(config.show_labels)));

	let loading = RwSignal::new(false);
	let signals = PageSignals {
		update: RwSignal::new(None),
		rows: RwSignal::new(Vec::new()),
		error: RwSignal::new(None),
		selection: RwSignal::new(None),
	};
	let view_mode = RwSignal::new(ViewMode::Default);
	let layout = RwSignal::new(LayoutMode::Force);
	let show_labels = RwSignal::new(config.show_labels);
	let query = RwSignal::new(config.initial_query.clone().unwrap_or_default());

	let controller = Rc::new(GraphController::new(
		HttpBackend::new(config.backend.clone()),
		config.connection.clone(),
		store.clone(),
		LoadingFlag::with_observer(move |flag| loading.set(flag)),
	));

	{
		let controller = controller.clone();
		let initial = config.initial_query.clone();
		spawn_local(async move {
			if !controller.ping().await {
				warn!("Graph server did not answer the ping");
			}
			if let Some(initial) = initial {
				run_query(controller, initial, signals);
			}
		});
	}

	let controller_expand = controller.clone();
	let on_expand: ExpandHandler = Rc::new(move |uid, direction| {
		expand(controller_expand.clone(), uid, direction, signals);
	});

	let store_select = store.clone();
	let on_select: SelectHandler = Rc::new(move |target| {
		signals.sync_selection(&store_select.borrow(), target);
	});

	let controller_run = controller.clone();
	let on_run = move |_: web_sys::MouseEvent| {
		let text = query.get_untracked();
		if !text.trim().is_empty() {
			run_query(controller_run.clone(), text, signals);
		}
	};

	let view_buttons = ViewMode::ALL
		.into_iter()
		.map(|mode| {
			let store = store.clone();
			view! {
			<button
				class:active=move || view_mode.get() == mode
				on:click=move |_| {
					let changed = store.borrow_mut().set_view_mode(mode);
					if let Some(update) = changed {
						view_mode.set(mode);
						signals.selection.set(None);
						signals.update.set(Some(update));
					}
				}
			>
				{view_label(mode)}
			</button>
		}
		})
		.collect_view();

	let layout_buttons = LayoutMode::ALL
		.into_iter()
		.map(|mode| {
		let store = store.clone();
		view! {
			<button
				class:active=move || layout.get() == mode
				disabled=move || view_mode.get() != ViewMode::Default
				on:click=move |_| {
					if store.borrow_mut().set_layout_mode(mode) {
						layout.set(mode);
					}
				}
			>
				{layout_label(mode)}
			</button>
		}
		})
		.collect_view();

	let store_labels = store.clone();
	let on_labels = move |ev: web_sys::Event| {
		let checked = event_target_checked(&ev);
		store_labels.borrow_mut().set_show_labels(checked);
		show_labels.set(checked);
	};

	view! {
		<div class="fullscreen-graph">
			<div class:hidden=move || view_mode.get() == ViewMode::Table>
				<ForceGraphCanvas
					store=store.clone()
					update=signals.update
					layout=layout
					on_expand=on_expand
					on_select=on_select
					fullscreen=true
				/>
			</div>
			<div class="graph-overlay">
				<div class="query-bar">
					<textarea
						prop:value=move || query.get()
						on:input=move |ev| query.set(event_target_value(&ev))
					/>
					<button on:click=on_run disabled=move || loading.get()>
						"Run"
					</button>
				</div>
				<div class="toolbar">
					<span class="view-modes">{view_buttons}</span>
					<span class="layout-modes">{layout_buttons}</span>
					<label>
						<input
							type="checkbox"
							prop:checked=move || show_labels.get()
							on:change=on_labels
						/>
						"Show labels"
					</label>
				</div>
				<Show when=move || loading.get()>
					<p class="loading">"Loading..."</p>
				</Show>
				{move || signals.error.get().map(|e| view! { <p class="error">{e}</p> })}
				{move || signals.selection.get().map(|name| view! { <p class="selection">{name}</p> })}
				<p class="subtitle">
					"Click to select. Double-click a node to expand outgoing edges, shift+double-click for incoming."
				</p>
			</div>
			<Show when=move || view_mode.get() == ViewMode::Table>
				<table class="rows">
					<tbody>
						{move || {
							signals
								.rows
								.get()
								.into_iter()
								.map(|row| view! { <tr><td><pre>{row}</pre></td></tr> })
								.collect_view()
						}}
					</tbody>
				</table>
			</Show>
		</div>
	}
}
