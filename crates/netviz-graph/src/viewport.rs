use crate::config::CanvasConfig;
use crate::graph::{Edge, GraphModel};
use netviz_core::{AttrValue, EdgeId, LineSegment, Rect, Vec2, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Zoom and pan state mapping world space onto a pixel viewport.
///
/// `center` is the world point shown in the middle of the viewport. Zoom
/// buttons scale multiplicatively while the wheel adjusts additively.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f32,
    center: Vec2,
    size: Vec2,
    zoom_step: f32,
    wheel_step: f32,
    min_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl Viewport {
    /// One wheel notch in angle-delta units.
    pub const WHEEL_NOTCH: f32 = 120.0;

    pub fn new(config: &CanvasConfig) -> Self {
        let side = config.canvas_height;
        Self {
            zoom: 1.0,
            center: Vec2::new(side / 2.0, side / 2.0),
            size: Vec2::new(side, side),
            zoom_step: config.zoom_step,
            wheel_step: config.wheel_zoom_step,
            min_zoom: config.min_zoom.max(f32::EPSILON),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// World-space window currently visible.
    pub fn world_rect(&self) -> Rect {
        let extent = self.size / self.zoom;
        Rect::from_pos_size(self.center - extent / 2.0, extent)
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::from_pos_size(Vec2::ZERO, self.size)
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.world_rect().min) * self.zoom
    }

    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        screen / self.zoom + self.world_rect().min
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / self.zoom_step);
    }

    pub fn zoom_reset(&mut self) {
        self.zoom = 1.0;
    }

    /// Additive zoom from a wheel event.
    pub fn wheel(&mut self, angle_delta: f32) {
        self.set_zoom(self.zoom + angle_delta / Self::WHEEL_NOTCH * self.wheel_step);
    }

    /// Drag the view so the content under `from` follows the pointer to `to`.
    pub fn pan_by(&mut self, from: Vec2, to: Vec2) {
        self.center += (from - to) / self.zoom;
    }

    /// Returns whether the size changed. Each side is at least one pixel.
    pub fn resize(&mut self, size: Vec2) -> bool {
        let size = Vec2::new(size.x.max(1.0), size.y.max(1.0));
        let changed = self.size != size;
        self.size = size;
        changed
    }

    /// Center on a freshly fitted layout of `fit_size` at zoom 1.
    pub fn reset(&mut self, fit_size: Vec2) {
        self.center = fit_size / 2.0;
        self.zoom = 1.0;
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.max(self.min_zoom)
        } else {
            self.min_zoom
        };
    }

    /// Screen-space snapshot of the graph used for one frame of drawing and
    /// hit testing.
    pub fn project(&self, model: &GraphModel, filter: Option<&EdgeFilter>) -> Projection {
        let world = self.world_rect();
        let screen = self.screen_rect();
        let borders = screen.borders();

        let mut projection = Projection::default();
        for vertex in model.vertices() {
            projection
                .positions
                .insert(vertex.id, self.to_screen(vertex.position));
            if world.contains(vertex.position) {
                projection.visible_vertices.push(vertex.id);
            }
        }

        for edge in model.edges() {
            let (Some(&a), Some(&b)) = (
                projection.positions.get(&edge.source),
                projection.positions.get(&edge.target),
            ) else {
                continue;
            };
            let segment = LineSegment::new(a, b);
            projection.segments.insert(edge.id, segment);

            let visible = screen.contains(a)
                || screen.contains(b)
                || borders.iter().any(|border| segment.intersects(border));
            if visible && filter.is_none_or(|f| f.accepts(edge)) {
                projection.visible_edges.push(edge.id);
            }
        }
        projection
    }
}

/// Exclusive numeric range over an edge attribute. Edges without a numeric
/// value for the attribute are filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFilter {
    pub attribute: String,
    pub low: f64,
    pub high: f64,
}

impl EdgeFilter {
    pub fn new(attribute: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            attribute: attribute.into(),
            low,
            high,
        }
    }

    pub fn accepts(&self, edge: &Edge) -> bool {
        edge.attributes
            .get(&self.attribute)
            .and_then(AttrValue::as_f64)
            .is_some_and(|v| self.low < v && v < self.high)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub positions: HashMap<VertexId, Vec2>,
    pub segments: HashMap<EdgeId, LineSegment>,
    /// In model order.
    pub visible_vertices: Vec<VertexId>,
    /// In model order, after filtering.
    pub visible_edges: Vec<EdgeId>,
}

impl Projection {
    pub fn position(&self, id: VertexId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    pub fn segment(&self, id: EdgeId) -> Option<LineSegment> {
        self.segments.get(&id).copied()
    }

    pub fn is_vertex_visible(&self, id: VertexId) -> bool {
        self.visible_vertices.contains(&id)
    }

    pub fn is_edge_visible(&self, id: EdgeId) -> bool {
        self.visible_edges.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::graph_from;
    use netviz_core::Entity;

    fn viewport(width: f32, height: f32) -> Viewport {
        let mut viewport = Viewport::default();
        viewport.resize(Vec2::new(width, height));
        viewport.reset(Vec2::new(width, height));
        viewport
    }

    #[test]
    fn test_world_rect_origin_maps_to_screen_origin() {
        let mut vp = viewport(800.0, 600.0);
        vp.zoom_in();
        vp.pan_by(Vec2::new(10.0, 10.0), Vec2::new(40.0, -20.0));
        let origin = vp.world_rect().min;
        let screen = vp.to_screen(origin);
        assert!(screen.x.abs() < 1e-3 && screen.y.abs() < 1e-3);
    }

    #[test]
    fn test_world_rect_matches_zoom() {
        let mut vp = viewport(400.0, 200.0);
        vp.zoom_in();
        vp.zoom_in();
        let rect = vp.world_rect();
        assert!((rect.width() - 400.0 / 1.44).abs() < 1e-3);
        assert!((rect.height() - 200.0 / 1.44).abs() < 1e-3);
        assert!((rect.center().x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_three_zoom_ins() {
        let mut vp = viewport(500.0, 500.0);
        vp.zoom_in();
        vp.zoom_in();
        vp.zoom_in();
        assert!((vp.zoom() - 1.2f32.powi(3)).abs() < 1e-5);

        vp.wheel(240.0);
        vp.zoom_reset();
        assert_eq!(vp.zoom(), 1.0);
    }

    #[test]
    fn test_wheel_is_additive_and_clamped() {
        let mut vp = viewport(500.0, 500.0);
        vp.wheel(120.0);
        assert!((vp.zoom() - 1.05).abs() < 1e-6);
        vp.wheel(-120.0 * 100.0);
        assert_eq!(vp.zoom(), CanvasConfig::default().min_zoom);
    }

    #[test]
    fn test_pan_divides_by_zoom() {
        let mut vp = viewport(500.0, 500.0);
        vp.zoom_in();
        vp.zoom_in();
        let before = vp.center();
        vp.pan_by(Vec2::new(100.0, 100.0), Vec2::new(100.0 - 14.4, 100.0));
        assert!((vp.center().x - (before.x + 10.0)).abs() < 1e-3);
        assert_eq!(vp.center().y, before.y);
    }

    #[test]
    fn test_edge_crossing_viewport_is_visible() {
        // Both endpoints lie outside the 100x100 window, the segment crosses it.
        let model = graph_from(&[(-50.0, 50.0), (150.0, 50.0), (-50.0, -50.0)], &[(0, 1), (0, 2)]);
        let projection = viewport(100.0, 100.0).project(&model, None);

        assert!(projection.visible_vertices.is_empty());
        assert_eq!(projection.visible_edges, vec![model.edges()[0].id]);
    }

    #[test]
    fn test_filter_is_view_only() {
        let mut model = graph_from(
            &[(10.0, 10.0), (20.0, 20.0), (30.0, 30.0), (40.0, 40.0)],
            &[(0, 1), (1, 2), (2, 3), (0, 3)],
        );
        let delays = [0.0, 5.0, 10.0];
        for (edge, delay) in model.edges().to_vec().iter().zip(delays) {
            model
                .set_attribute(Entity::Edge(edge.id), "total_delay", AttrValue::Float(delay))
                .unwrap();
        }
        let filter = EdgeFilter::new("total_delay", 0.0, 10.0);
        let projection = viewport(100.0, 100.0).project(&model, Some(&filter));

        assert_eq!(projection.visible_edges, vec![model.edges()[1].id]);
        assert_eq!(model.edge_count(), 4);
        assert_eq!(
            model.edges()[0].attribute("total_delay"),
            Some(AttrValue::Float(0.0))
        );
    }
}
