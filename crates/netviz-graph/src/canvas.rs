use crate::cluster::ClusterEngine;
use crate::config::CanvasConfig;
use crate::graph::{Edge, GraphModel, Vertex};
use crate::graphml::{LoadedGraph, read_graphml};
use crate::hit_tester::HitTester;
use crate::interaction::{CanvasMode, InteractionController, PendingAction, Selection};
use crate::layout::{LayoutEngine, normalize_and_fit};
use crate::render::{RenderPacket, RenderStyle, render};
use crate::viewport::{EdgeFilter, Projection, Viewport};
use netviz_core::{CanvasError, Vec2};
use netviz_events::{Event, EventBus};
use std::path::{Path, PathBuf};

/// A single interactive canvas session.
///
/// Owns the graph, the view and the interaction state. The UI shell drives it
/// through the methods below, drains [`GraphCanvas::events`] for callbacks and
/// repaints whenever [`GraphCanvas::take_repaint_request`] says so.
pub struct GraphCanvas {
    config: CanvasConfig,
    model: GraphModel,
    source: Option<PathBuf>,
    viewport: Viewport,
    controller: InteractionController,
    layouts: LayoutEngine,
    clusters: ClusterEngine,
    filter: Option<EdgeFilter>,
    style: RenderStyle,
    fit_size: Vec2,
    events: EventBus,
    needs_repaint: bool,
}

impl Default for GraphCanvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl GraphCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self::with_event_bus(config, EventBus::new())
    }

    pub fn with_event_bus(config: CanvasConfig, events: EventBus) -> Self {
        let viewport = Viewport::new(&config);
        Self {
            model: GraphModel::new(),
            source: None,
            fit_size: viewport.size(),
            viewport,
            controller: InteractionController::new(HitTester::new(&config)),
            layouts: LayoutEngine::new(config.seed),
            clusters: ClusterEngine::new(config.seed),
            filter: None,
            style: RenderStyle::new(&config),
            events,
            needs_repaint: true,
            config,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn mode(&self) -> CanvasMode {
        self.controller.mode()
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.controller.pending_action()
    }

    pub fn selection(&self) -> &Selection {
        self.controller.selection()
    }

    pub fn filter(&self) -> Option<&EdgeFilter> {
        self.filter.as_ref()
    }

    /// Size of the area the current layout was fitted to.
    pub fn fit_size(&self) -> Vec2 {
        self.fit_size
    }

    pub fn layout_names(&self) -> Vec<String> {
        self.layouts.names().map(str::to_string).collect()
    }

    pub fn clustering_names(&self) -> Vec<String> {
        self.clusters.names().map(str::to_string).collect()
    }

    /// Load a GraphML file, replacing the current graph.
    pub fn set_graph(&mut self, path: &Path) -> Result<(), CanvasError> {
        let result = read_graphml(path)
            .map_err(CanvasError::from)
            .and_then(|loaded| self.install(loaded, Some(path.to_path_buf())));
        self.report(result)
    }

    /// Replace the current graph with one built in memory.
    pub fn load_graph(&mut self, loaded: LoadedGraph) -> Result<(), CanvasError> {
        let result = self.install(loaded, None);
        self.report(result)
    }

    /// Missing positions run the default layout and missing clusters the
    /// default clustering; the result is then fitted. Nothing is replaced
    /// unless both succeed.
    fn install(&mut self, loaded: LoadedGraph, source: Option<PathBuf>) -> Result<(), CanvasError> {
        let LoadedGraph {
            mut model,
            has_positions,
            has_clusters,
        } = loaded;

        if !has_positions {
            let positions = self
                .layouts
                .compute(&model, &self.config.default_layout, None)?;
            model.apply_positions(&positions);
        }
        if has_clusters {
            self.clusters.assign_colors(&mut model);
        } else {
            self.clusters
                .compute(&model, &self.config.default_clustering, None)?
                .apply(&mut model);
        }

        self.fit_size = normalize_and_fit(&mut model, self.config.canvas_height);
        self.model = model;
        self.source = source;
        self.controller.reset();
        self.viewport.reset(self.fit_size);

        self.events.publish(Event::GraphLoaded {
            path: self.source.clone(),
            vertex_count: self.model.vertex_count(),
            edge_count: self.model.edge_count(),
        });
        self.request_repaint();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: CanvasMode) {
        for event in self.controller.set_mode(mode, &self.model) {
            self.events.publish(event);
        }
        self.request_repaint();
    }

    /// Re-layout with the named algorithm, then refit the view.
    pub fn set_layout(&mut self, name: &str, weights: Option<&str>) -> Result<(), CanvasError> {
        let result = self.layouts.compute(&self.model, name, weights);
        let positions = self.report(result)?;
        self.model.apply_positions(&positions);
        self.fit_size = normalize_and_fit(&mut self.model, self.config.canvas_height);
        self.viewport.reset(self.fit_size);
        self.request_repaint();
        Ok(())
    }

    /// Re-cluster with the named algorithm. Returns the number of clusters.
    pub fn set_clustering(
        &mut self,
        name: &str,
        weights: Option<&str>,
    ) -> Result<usize, CanvasError> {
        let result = self.clusters.compute(&self.model, name, weights);
        let assignment = self.report(result)?;
        assignment.apply(&mut self.model);
        if self.mode() == CanvasMode::FindBottleneck {
            self.set_mode(CanvasMode::FindBottleneck);
        }
        self.request_repaint();
        Ok(assignment.cluster_count())
    }

    pub fn set_filter(&mut self, attribute: &str, low: f64, high: f64) {
        tracing::debug!("Edge filter: {} < {} < {}", low, attribute, high);
        self.filter = Some(EdgeFilter::new(attribute, low, high));
        self.request_repaint();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.request_repaint();
    }

    pub fn arm_pending_action(&mut self, action: PendingAction) {
        self.controller.arm(action);
    }

    pub fn pointer_press(&mut self, pos: Vec2) -> Result<(), CanvasError> {
        let projection = self.projection();
        let result =
            self.controller
                .pointer_press(pos, &mut self.model, &self.viewport, &projection);
        let events = self.report(result)?;
        for event in events {
            self.events.publish(event);
        }
        self.request_repaint();
        Ok(())
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if self
            .controller
            .pointer_move(pos, &mut self.model, &mut self.viewport)
        {
            self.request_repaint();
        }
    }

    pub fn pointer_release(&mut self) {
        if self.controller.pointer_release() {
            self.request_repaint();
        }
    }

    pub fn wheel(&mut self, angle_delta: f32) {
        if self.controller.wheel(angle_delta, &mut self.viewport) {
            self.request_repaint();
        }
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.request_repaint();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.request_repaint();
    }

    pub fn zoom_reset(&mut self) {
        self.viewport.zoom_reset();
        self.request_repaint();
    }

    pub fn resize(&mut self, size: Vec2) {
        if self.viewport.resize(size) {
            self.request_repaint();
        }
    }

    pub fn projection(&self) -> Projection {
        self.viewport.project(&self.model, self.filter.as_ref())
    }

    pub fn render(&self) -> RenderPacket {
        render(
            &self.model,
            &self.projection(),
            self.controller.selection(),
            &self.style,
        )
    }

    /// Most recently selected vertex, for the info panel.
    pub fn selected_vertex(&self) -> Option<&Vertex> {
        self.selection()
            .vertices
            .last()
            .and_then(|&id| self.model.vertex(id))
    }

    pub fn selected_edge(&self) -> Option<&Edge> {
        self.selection()
            .edges
            .last()
            .and_then(|&id| self.model.edge(id))
    }

    /// Whether anything changed since the last call.
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_repaint)
    }

    fn request_repaint(&mut self) {
        self.needs_repaint = true;
    }

    fn report<T>(&self, result: Result<T, CanvasError>) -> Result<T, CanvasError> {
        if let Err(err) = &result {
            tracing::error!("Canvas operation failed: {}", err);
            self.events.publish(Event::ShowError {
                message: err.to_string(),
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::graph_from;
    use netviz_core::{AlgorithmKind, ClusterId};

    fn canvas() -> GraphCanvas {
        let mut model = graph_from(
            &[(0.0, 0.0), (100.0, 0.0), (200.0, 100.0), (300.0, 100.0)],
            &[(0, 1), (1, 2), (2, 3)],
        );
        for (vertex, c) in model.vertices_mut().zip([0, 0, 1, 1]) {
            vertex.cluster = Some(ClusterId(c));
        }
        let mut canvas = GraphCanvas::default();
        canvas.resize(Vec2::new(1000.0, 500.0));
        canvas.load_graph(LoadedGraph::from_model(model)).unwrap();
        canvas.events().drain();
        canvas
    }

    #[test]
    fn test_load_fits_layout() {
        let canvas = canvas();
        assert_eq!(canvas.fit_size(), Vec2::new(1500.0, 500.0));
        assert_eq!(canvas.viewport().center(), Vec2::new(750.0, 250.0));
        assert_eq!(canvas.viewport().zoom(), 1.0);
        assert_eq!(canvas.model().vertices()[3].position, Vec2::new(1500.0, 500.0));
        // file clusters are kept and colored consistently
        let v = canvas.model().vertices();
        assert_eq!(v[0].color, v[1].color);
        assert_eq!(v[2].cluster, Some(ClusterId(1)));
    }

    #[test]
    fn test_unknown_layout_keeps_state_and_reports() {
        let mut canvas = canvas();
        let before: Vec<Vec2> = canvas.model().vertices().iter().map(|v| v.position).collect();
        canvas.take_repaint_request();

        let err = canvas.set_layout("layout_nope", None).unwrap_err();
        assert!(matches!(
            err,
            CanvasError::UnknownAlgorithm {
                kind: AlgorithmKind::Layout,
                ..
            }
        ));
        let after: Vec<Vec2> = canvas.model().vertices().iter().map(|v| v.position).collect();
        assert_eq!(before, after);
        assert!(!canvas.take_repaint_request());
        assert!(matches!(
            canvas.events().drain().as_slice(),
            [Event::ShowError { .. }]
        ));
    }

    #[test]
    fn test_relayout_refits() {
        let mut canvas = canvas();
        canvas.zoom_in();
        canvas.set_layout("layout_circle", None).unwrap();
        assert_eq!(canvas.viewport().zoom(), 1.0);
        assert_eq!(canvas.fit_size().y, 500.0);
        assert!(
            canvas
                .model()
                .vertices()
                .iter()
                .all(|v| v.position.x >= 0.0 && v.position.y >= 0.0)
        );
    }

    #[test]
    fn test_every_mutation_requests_repaint() {
        let mut canvas = canvas();
        assert!(canvas.take_repaint_request());
        assert!(!canvas.take_repaint_request());

        canvas.zoom_in();
        assert!(canvas.take_repaint_request());
        canvas.set_filter("total_delay", 0.0, 10.0);
        assert!(canvas.take_repaint_request());
        canvas.set_mode(CanvasMode::FindShortestPath);
        assert!(canvas.take_repaint_request());
        canvas.pointer_press(Vec2::new(600.0, 600.0)).unwrap();
        assert!(canvas.take_repaint_request());
        canvas.pointer_move(Vec2::new(610.0, 600.0));
        assert!(canvas.take_repaint_request());
        canvas.pointer_release();
        assert!(canvas.take_repaint_request());

        canvas.pointer_move(Vec2::new(0.0, 0.0));
        assert!(!canvas.take_repaint_request());
    }

    #[test]
    fn test_collapsed_viewport_repaints_once() {
        let mut canvas = canvas();
        canvas.take_repaint_request();

        canvas.resize(Vec2::new(0.0, 300.0));
        assert!(canvas.take_repaint_request());
        assert_eq!(canvas.viewport().size(), Vec2::new(1.0, 300.0));

        canvas.resize(Vec2::new(0.0, 300.0));
        assert!(!canvas.take_repaint_request());
        canvas.resize(Vec2::new(1.0, 300.0));
        assert!(!canvas.take_repaint_request());
    }

    #[test]
    fn test_vertex_click_publishes_selection() {
        let mut canvas = canvas();
        let projection = canvas.projection();
        let target = canvas.model().vertices()[1].id;
        let pos = projection.position(target).unwrap();

        canvas.pointer_press(pos).unwrap();
        canvas.pointer_release();

        assert_eq!(canvas.selected_vertex().map(|v| v.id), Some(target));
        assert!(canvas.selected_edge().is_none());
        match canvas.events().drain().as_slice() {
            [Event::VertexSelected { id, attributes }] => {
                assert_eq!(*id, target);
                assert!(attributes.contains_key("degree"));
            }
            other => panic!("Expected VertexSelected, got {:?}", other),
        }
    }

    #[test]
    fn test_bottleneck_mode_follows_reclustering() {
        let mut canvas = canvas();
        canvas.set_mode(CanvasMode::FindBottleneck);
        assert_eq!(canvas.selection().edges, vec![canvas.model().edges()[1].id]);

        canvas.set_clustering("connected_components", None).unwrap();
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn test_render_respects_filter() {
        let mut canvas = canvas();
        let lines = |packet: &RenderPacket| {
            packet
                .commands
                .iter()
                .filter(|c| matches!(c, crate::render::DrawCommand::Line { .. }))
                .count()
        };
        assert_eq!(lines(&canvas.render()), 3);
        canvas.set_filter("total_delay", 0.0, 10.0);
        assert_eq!(lines(&canvas.render()), 0);
        assert_eq!(canvas.model().edge_count(), 3);
        canvas.clear_filter();
        assert_eq!(lines(&canvas.render()), 3);
    }
}
