pub mod analysis;
pub mod canvas;
pub mod cluster;
pub mod config;
pub mod graph;
pub mod graphml;
pub mod hit_tester;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod viewport;

pub use analysis::{Bottlenecks, PathOutcome, find_bottlenecks, shortest_path};
pub use canvas::GraphCanvas;
pub use cluster::{
    ClusterAssignment, ClusterEngine, Clusterer, Communities, DEFAULT_CLUSTERING, Dendrogram,
};
pub use config::{CanvasConfig, FilterDefaults};
pub use graph::{Edge, GraphModel, Vertex};
pub use graphml::{LoadedGraph, find_vertex, parse_graphml, read_graphml};
pub use hit_tester::{HitResult, HitTester};
pub use interaction::{CanvasMode, DragState, InteractionController, PendingAction, Selection};
pub use layout::{DEFAULT_LAYOUT, LayoutEngine, Layouter, WEIGHTED_LAYOUTS, normalize_and_fit};
pub use render::{DrawCommand, RenderPacket, RenderStyle, Stroke, render};
pub use viewport::{EdgeFilter, Projection, Viewport};
