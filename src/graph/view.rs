//! View and layout modes and the layout parameters they imply.

use log::debug;

/// What the main panel shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
	/// Force-directed live graph
	#[default]
	Default,
	/// Tabular query rows
	Table,
	/// Schema graph
	Schema,
}

/// How nodes are arranged in the default view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
	/// Free force simulation
	#[default]
	Force,
	/// Levels stacked top to bottom
	TopDown,
	/// Levels stacked left to right
	LeftRight,
	/// Concentric rings, deepest level innermost
	RadialIn,
	/// Concentric rings, deepest level outermost
	RadialOut,
}

impl ViewMode {
	/// All modes in menu order.
	pub const ALL: [ViewMode; 3] = [ViewMode::Default, ViewMode::Table, ViewMode::Schema];
}

impl LayoutMode {
	/// All modes in menu order.
	pub const ALL: [LayoutMode; 5] = [
		LayoutMode::Force,
		LayoutMode::TopDown,
		LayoutMode::LeftRight,
		LayoutMode::RadialIn,
		LayoutMode::RadialOut,
	];

	/// DAG axis passed to the renderer; `None` for the free force layout.
	pub fn dag_axis(self) -> Option<&'static str> {
		match self {
			LayoutMode::Force => None,
			LayoutMode::TopDown => Some("td"),
			LayoutMode::LeftRight => Some("lr"),
			LayoutMode::RadialIn => Some("radialin"),
			LayoutMode::RadialOut => Some("radialout"),
		}
	}

	fn level_factor(self) -> f64 {
		match self {
			LayoutMode::TopDown => 50.0,
			_ => 100.0,
		}
	}

	/// Distance between DAG levels for a graph of `node_count` nodes.
	pub fn level_distance(self, node_count: usize) -> Option<f64> {
		self.dag_axis()?;
		Some((node_count.max(15) as f64).log10() * self.level_factor())
	}

	/// Collision radius used to keep nodes apart.
	pub fn collision_radius(self) -> f64 {
		match self {
			LayoutMode::Force => 1.0,
			LayoutMode::TopDown | LayoutMode::LeftRight => 12.0,
			LayoutMode::RadialIn | LayoutMode::RadialOut => 8.0,
		}
	}

	/// Parameters for `node_count` nodes.
	pub fn params(self, node_count: usize) -> LayoutParams {
		LayoutParams {
			mode: self,
			dag_axis: self.dag_axis(),
			level_distance: self.level_distance(node_count),
			collision_radius: self.collision_radius(),
		}
	}
}

/// Everything the renderer needs to apply a layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
	/// Mode the parameters were derived from
	pub mode: LayoutMode,
	/// DAG axis, if any
	pub dag_axis: Option<&'static str>,
	/// Level spacing, if any
	pub level_distance: Option<f64>,
	/// Collision radius
	pub collision_radius: f64,
}

/// Current view and layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
	view_mode: ViewMode,
	layout_mode: LayoutMode,
}

impl ViewState {
	/// Current view mode.
	pub fn view_mode(&self) -> ViewMode {
		self.view_mode
	}

	/// Current layout mode.
	pub fn layout_mode(&self) -> LayoutMode {
		self.layout_mode
	}

	/// Layout only applies to the default view.
	pub fn layout_enabled(&self) -> bool {
		self.view_mode == ViewMode::Default
	}

	/// Switches view. Returns false when already in `mode`.
	pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
		if self.view_mode == mode {
			return false;
		}
		debug!("View mode {:?} -> {:?}", self.view_mode, mode);
		self.view_mode = mode;
		true
	}

	/// Switches layout. Returns true only when the simulation must restart.
	///
	/// Requesting the current mode, or any mode outside the default view, changes nothing.
	pub fn set_layout_mode(&mut self, mode: LayoutMode) -> bool {
		if self.layout_mode == mode || !self.layout_enabled() {
			return false;
		}
		debug!("Layout mode {:?} -> {:?}", self.layout_mode, mode);
		self.layout_mode = mode;
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn level_distance_uses_at_least_fifteen_nodes() {
		let small = LayoutMode::TopDown.level_distance(3).unwrap();
		assert!((small - 15f64.log10() * 50.0).abs() < 1e-9);
		let large = LayoutMode::RadialOut.level_distance(1000).unwrap();
		assert!((large - 300.0).abs() < 1e-9);
		let lr = LayoutMode::LeftRight.level_distance(100).unwrap();
		assert!((lr - 200.0).abs() < 1e-9);
		assert_eq!(LayoutMode::Force.level_distance(100), None);
	}

	#[test]
	fn collision_radius_per_mode() {
		assert_eq!(LayoutMode::Force.collision_radius(), 1.0);
		assert_eq!(LayoutMode::TopDown.collision_radius(), 12.0);
		assert_eq!(LayoutMode::LeftRight.collision_radius(), 12.0);
		assert_eq!(LayoutMode::RadialIn.collision_radius(), 8.0);
		assert_eq!(LayoutMode::RadialOut.params(10).dag_axis, Some("radialout"));
	}

	#[test]
	fn same_layout_is_a_no_op() {
		let mut view = ViewState::default();
		assert!(!view.set_layout_mode(LayoutMode::Force));
		assert!(view.set_layout_mode(LayoutMode::TopDown));
		assert!(!view.set_layout_mode(LayoutMode::TopDown));
		assert_eq!(view.layout_mode(), LayoutMode::TopDown);
	}

	#[test]
	fn layout_is_locked_outside_default_view() {
		let mut view = ViewState::default();
		assert!(view.set_view_mode(ViewMode::Schema));
		assert!(!view.layout_enabled());
		assert!(!view.set_layout_mode(LayoutMode::RadialIn));
		assert_eq!(view.layout_mode(), LayoutMode::Force);
		assert!(view.set_view_mode(ViewMode::Table));
		assert!(view.set_view_mode(ViewMode::Default));
		assert!(view.set_layout_mode(LayoutMode::RadialIn));
	}
}
