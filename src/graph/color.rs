//! Stable per-label node colors.

use std::collections::HashMap;

use log::debug;

use super::element::GraphElement;

/// Palette drawn in order for each newly seen primary label.
pub const PALETTE: [&str; 12] = [
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#bcbd22",
	"#17becf", "#aec7e8", "#ffbb78", "#98df8a",
];

/// Used once the palette is exhausted, and for unlabeled nodes.
pub const FALLBACK_COLOR: &str = "#808080";

/// Reserved for labels containing "account".
pub const ACCOUNT_COLOR: &str = "#F4B400";
/// Reserved for labels containing "person".
pub const PERSON_COLOR: &str = "#DB4437";

fn reserved_color(label: &str) -> Option<&'static str> {
	let lower = label.to_lowercase();
	if lower.contains("account") {
		Some(ACCOUNT_COLOR)
	} else if lower.contains("person") {
		Some(PERSON_COLOR)
	} else {
		None
	}
}

/// Label → color map shared by live and schema views for the whole session.
#[derive(Clone, Debug, Default)]
pub struct ColorAssigner {
	label_colors: HashMap<String, String>,
	next: usize,
}

impl ColorAssigner {
	/// Empty map, palette cursor at the first entry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Assigns a color to `label` if it has none yet and returns the label's color.
	pub fn assign_label(&mut self, label: &str) -> String {
		if let Some(reserved) = reserved_color(label) {
			return reserved.to_string();
		}
		if let Some(color) = self.label_colors.get(label) {
			return color.clone();
		}
		let color = PALETTE
			.get(self.next)
			.copied()
			.unwrap_or(FALLBACK_COLOR)
			.to_string();
		self.next += 1;
		debug!("Assigned color {} to label {}", color, label);
		self.label_colors.insert(label.to_string(), color.clone());
		color
	}

	/// Assigns colors for the primary labels of `elements` in iteration order.
	pub fn assign<'a, E: GraphElement + 'a>(&mut self, elements: impl IntoIterator<Item = &'a E>) {
		for element in elements {
			if let Some(label) = element.primary_label() {
				self.assign_label(label);
			}
		}
	}

	/// Color of a label without assigning one.
	pub fn label_color(&self, label: &str) -> &str {
		if let Some(reserved) = reserved_color(label) {
			return reserved;
		}
		self.label_colors
			.get(label)
			.map(String::as_str)
			.unwrap_or(FALLBACK_COLOR)
	}

	/// Color of an element's primary label.
	pub fn color_for<E: GraphElement>(&self, element: &E) -> &str {
		element
			.primary_label()
			.map(|label| self.label_color(label))
			.unwrap_or(FALLBACK_COLOR)
	}

	/// Number of labels holding a palette color.
	pub fn len(&self) -> usize {
		self.label_colors.len()
	}

	/// True before any palette color was handed out.
	pub fn is_empty(&self) -> bool {
		self.label_colors.is_empty()
	}
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
	let hex = color.strip_prefix('#').filter(|hex| hex.is_ascii())?;
	let expanded: String = match hex.len() {
		3 => hex.chars().flat_map(|c| [c, c]).collect(),
		6 => hex.to_string(),
		_ => return None,
	};
	let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
	Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Moves each channel of a hex color toward white by `amount` (clamped to `[0, 1]`).
///
/// Returns `rgb(r, g, b)`; colors that are not hex pass through unchanged.
pub fn lighten(color: &str, amount: f64) -> String {
	let Some((r, g, b)) = parse_hex(color) else {
		return color.to_string();
	};
	let amount = amount.clamp(0.0, 1.0);
	let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
	format!("rgb({}, {}, {})", mix(r), mix(g), mix(b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::element::{Node, NodeParams};

	fn node(uid: &str, label: &str) -> Node {
		Node::new(NodeParams {
			uid: uid.into(),
			labels: vec![label.into()],
			..Default::default()
		})
		.unwrap()
	}

	#[test]
	fn palette_is_drawn_in_order_and_stable() {
		let mut colors = ColorAssigner::new();
		assert_eq!(colors.assign_label("City"), PALETTE[0]);
		assert_eq!(colors.assign_label("Company"), PALETTE[1]);
		assert_eq!(colors.assign_label("City"), PALETTE[0]);

		// A refresh with the same and one new label only adds the new one.
		colors.assign([&node("1", "Company"), &node("2", "Street")]);
		assert_eq!(colors.label_color("Company"), PALETTE[1]);
		assert_eq!(colors.label_color("Street"), PALETTE[2]);
		assert_eq!(colors.len(), 3);
	}

	#[test]
	fn reserved_labels_skip_the_palette() {
		let mut colors = ColorAssigner::new();
		assert_eq!(colors.assign_label("BankAccount"), ACCOUNT_COLOR);
		assert_eq!(colors.assign_label("PERSON"), PERSON_COLOR);
		assert!(colors.is_empty());
		assert_eq!(colors.assign_label("City"), PALETTE[0]);
	}

	#[test]
	fn exhausted_palette_falls_back_to_gray() {
		let mut colors = ColorAssigner::new();
		for i in 0..PALETTE.len() {
			colors.assign_label(&format!("L{i}"));
		}
		assert_eq!(colors.assign_label("Extra"), FALLBACK_COLOR);
	}

	#[test]
	fn live_and_schema_nodes_share_label_colors() {
		let mut colors = ColorAssigner::new();
		let live = node("42", "City");
		let schema = node("CityTable", "City");
		colors.assign([&live]);
		colors.assign([&schema]);
		assert_eq!(colors.color_for(&live), colors.color_for(&schema));
	}

	#[test]
	fn lighten_interpolates_toward_white() {
		assert_eq!(lighten("#000000", 0.5), "rgb(128, 128, 128)");
		assert_eq!(lighten("#DADCE0", 0.0), "rgb(218, 220, 224)");
		assert_eq!(lighten("#fff", 0.3), "rgb(255, 255, 255)");
		assert_eq!(lighten("rgb(1, 2, 3)", 0.5), "rgb(1, 2, 3)");
	}
}
