use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::backend::EdgeDirection;
use crate::graph::{DataUpdate, ElementRef, GraphStore, LayoutMode, RenderEngine, apply_update};

/// Pointer travel, in pixels, past which a press counts as a drag rather than a click.
const CLICK_SLOP: f64 = 3.0;

type Shared<T> = Rc<RefCell<Option<T>>>;

/// Called with the node uid and direction when a node is double-clicked.
pub type ExpandHandler = Rc<dyn Fn(String, EdgeDirection)>;

/// Called after a click changes the selection.
pub type SelectHandler = Rc<dyn Fn(Option<ElementRef>)>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Edge under the pointer using the same bend the renderer draws.
fn link_under(state: &ForceGraphState, store: &GraphStore, x: f64, y: f64) -> Option<String> {
	let style = store.frame_style(state.transform.k);
	state.link_at_position(x, y, |uid| {
		let amount = style.link_curvature(uid);
		if style.link_reversed(uid) { -amount } else { amount }
	})
}

fn push_store(state: &mut ForceGraphState, store: &GraphStore, update: &DataUpdate) {
	apply_update(state, store.render_data(), store.layout_params(), update);
}

#[component]
pub fn ForceGraphCanvas(
	store: Rc<RefCell<GraphStore>>,
	#[prop(into)] update: Signal<Option<DataUpdate>>,
	#[prop(into)] layout: Signal<LayoutMode>,
	on_expand: ExpandHandler,
	#[prop(optional)] on_select: Option<SelectHandler>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, store_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), store.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("Canvas 2d context unavailable");
				return;
			}
		};

		let mut initial = ForceGraphState::new(w, h);
		{
			let store = store_init.borrow();
			initial.set_graph_data(store.render_data());
			initial.set_layout(store.layout_params());
			initial.recenter();
		}
		*state_init.borrow_mut() = Some(initial);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, store_anim, animate_inner) =
			(state_init.clone(), store_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				let store = store_anim.borrow();
				render::render(s, &store.frame_style(s.transform.k), &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (state_up, store_up) = (state.clone(), store.clone());
	Effect::new(move |_| {
		let Some(update) = update.get() else {
			return;
		};
		if let Some(ref mut s) = *state_up.borrow_mut() {
			push_store(s, &store_up.borrow(), &update);
		}
	});

	let (state_layout, store_layout) = (state.clone(), store.clone());
	Effect::new(move |_| {
		layout.track();
		if let Some(ref mut s) = *state_layout.borrow_mut() {
			s.set_layout(store_layout.borrow().layout_params());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pan.moved = false;
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let (state_mm, store_mm) = (state.clone(), store.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_mm.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};

		if s.drag.active {
			if let Some(idx) = s.drag.node_idx {
				let (dx, dy) = (x - s.drag.start_x, y - s.drag.start_y);
				if dx.hypot(dy) > CLICK_SLOP {
					s.pan.moved = true;
				}
				let (nx, ny) = (
					s.drag.node_start_x + (dx / s.transform.k) as f32,
					s.drag.node_start_y + (dy / s.transform.k) as f32,
				);
				s.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.x = nx;
						node.data.y = ny;
						node.data.is_anchor = true;
					}
				});
			}
			return;
		}
		if s.pan.active {
			let (dx, dy) = (x - s.pan.start_x, y - s.pan.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				s.pan.moved = true;
			}
			s.transform.x = s.pan.transform_start_x + dx;
			s.transform.y = s.pan.transform_start_y + dy;
			return;
		}

		let hovered = s.node_at_position(x, y).and_then(|idx| s.node_uid(idx));
		let edge = match hovered {
			Some(_) => None,
			None => link_under(s, &store_mm.borrow(), x, y),
		};
		let mut store = store_mm.borrow_mut();
		match (hovered, edge) {
			(Some(uid), _) => store.focus_node(Some(&uid)),
			(None, Some(uid)) => store.focus_edge(Some(&uid)),
			(None, None) => store.focus_node(None),
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let (state_ml, store_ml) = (state.clone(), store.clone());
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
		store_ml.borrow_mut().focus_node(None);
	};

	let (state_cl, store_cl) = (state.clone(), store.clone());
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let target = {
			let guard = state_cl.borrow();
			let Some(s) = guard.as_ref() else {
				return;
			};
			if s.pan.moved {
				return;
			}
			match s.node_at_position(x, y).and_then(|idx| s.node_uid(idx)) {
				Some(uid) => Some(ElementRef::Node(uid)),
				None => link_under(s, &store_cl.borrow(), x, y).map(ElementRef::Edge),
			}
		};
		{
			let mut store = store_cl.borrow_mut();
			match &target {
				Some(ElementRef::Node(uid)) => {
					store.select_node(uid);
				}
				Some(ElementRef::Edge(uid)) => {
					store.select_edge(uid);
				}
				None => store.clear_selection(),
			}
		}
		if let Some(on_select) = on_select.as_deref() {
			on_select(target);
		}
	};

	let (state_dc, store_dc) = (state.clone(), store.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let uid = match *state_dc.borrow() {
			Some(ref s) => s.node_at_position(x, y).and_then(|idx| s.node_uid(idx)),
			None => None,
		};
		if let Some(uid) = uid.filter(|uid| store_dc.borrow().expandable(uid)) {
			let direction = if ev.shift_key() {
				EdgeDirection::Incoming
			} else {
				EdgeDirection::Outgoing
			};
			on_expand(uid, direction);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
