//! Graph state core: element model, merge, colors, curvature, highlight and view state.

pub mod color;
pub mod curvature;
mod element;
pub mod highlight;
pub mod merge;
pub mod render;
mod schema;
mod store;
pub mod view;

pub use element::{
	Edge, EdgeParams, ElementKind, GraphElement, Node, NodeParams, Properties,
};
pub use highlight::{ElementRef, HighlightState};
pub use render::{FrameStyle, GraphData, GraphLink, GraphNode, RenderEngine, apply_update};
pub use schema::{EdgeTable, NodeTable, NodeTableReference, PropertyDeclaration, PropertyDefinition, Schema};
pub use store::{DataUpdate, GraphStore, LoadedElements, UpdateKind};
pub use view::{LayoutMode, LayoutParams, ViewMode, ViewState};
