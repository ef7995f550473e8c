use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use crate::graph::FrameStyle;
use crate::graph::highlight::NodeCategory;
use crate::graph::render::{SELF_LOOP_RADIUS, control_point, label_anchor};

const BACKGROUND: &str = "#ffffff";
const LABEL_COLOR: &str = "#3c4043";
const OUTLINE_COLOR: &str = "#1a73e8";

pub fn render(state: &ForceGraphState, style: &FrameStyle<'_>, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let positions = state.node_positions();
	draw_links(state, style, &positions, ctx);
	draw_nodes(state, style, ctx);
	ctx.restore();
}

fn draw_links(
	state: &ForceGraphState,
	style: &FrameStyle<'_>,
	positions: &HashMap<DefaultNodeIdx, (f64, f64)>,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let arrow_size = 6.0 / k.max(0.5);

	for link in state.links() {
		let (Some(&p1), Some(&p2)) = (positions.get(&link.source), positions.get(&link.target)) else {
			continue;
		};
		let color = style.link_color(&link.uid);
		ctx.set_stroke_style_str(&color);
		ctx.set_fill_style_str(&color);
		ctx.set_line_width(style.link_width(&link.uid) / k.max(0.5));

		let self_loop = link.source == link.target;
		let mut curvature = style.link_curvature(&link.uid);
		if style.link_reversed(&link.uid) {
			curvature = -curvature;
		}

		ctx.begin_path();
		if self_loop {
			let _ = ctx.arc(p1.0, p1.1 - SELF_LOOP_RADIUS, SELF_LOOP_RADIUS, 0.0, 2.0 * PI);
			ctx.stroke();
		} else {
			let (dx, dy) = (p2.0 - p1.0, p2.1 - p1.1);
			if (dx * dx + dy * dy).sqrt() < 0.001 {
				continue;
			}
			let c = control_point(p1, p2, curvature);
			ctx.move_to(p1.0, p1.1);
			ctx.quadratic_curve_to(c.0, c.1, p2.0, p2.1);
			ctx.stroke();
			draw_arrow(ctx, c, p2, state.node_radius(link.target), arrow_size);
		}

		if style.link_label_visible(&link.uid) && !link.label.is_empty() {
			let (x, y) = label_anchor(p1, p2, curvature, self_loop);
			ctx.set_fill_style_str(LABEL_COLOR);
			ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&link.label, x, y);
			ctx.set_text_align("start");
		}
	}
}

/// Arrowhead at `tip` pointing away from `from`, pulled back to the node rim.
fn draw_arrow(ctx: &CanvasRenderingContext2d, from: (f64, f64), tip: (f64, f64), rim: f64, size: f64) {
	let (dx, dy) = (tip.0 - from.0, tip.1 - from.1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (tip_x, tip_y) = (tip.0 - ux * rim, tip.1 - uy * rim);
	let (back_x, back_y) = (tip_x - ux * size, tip_y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_nodes(state: &ForceGraphState, style: &FrameStyle<'_>, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let radius = info.radius();

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&style.node_color(&info.uid));
		ctx.fill();

		match style.node_category(&info.uid) {
			NodeCategory::Selected | NodeCategory::Focused => {
				ctx.set_stroke_style_str(OUTLINE_COLOR);
				ctx.set_line_width(2.0 / k.max(0.5));
				ctx.stroke();
			}
			_ => {}
		}

		if style.node_label_visible(&info.uid) && !info.label.is_empty() {
			ctx.set_fill_style_str(LABEL_COLOR);
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);
		}
	});
}
