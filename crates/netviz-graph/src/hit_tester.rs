use crate::config::CanvasConfig;
use crate::viewport::Projection;
use netviz_core::{EdgeId, Vec2, VertexId};

/// Result of a hit test at a screen position.
///
/// Priority order: Vertex > Edge > Background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    Vertex(VertexId),
    Edge(EdgeId),
    /// Nothing visible under the pointer.
    Background,
}

/// Screen-space hit tester over the visible part of a [`Projection`].
///
/// Vertices are discs of `point_radius` pixels. Edges are hit within
/// `line_distance` pixels of their line, strictly inside their x-span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    pub point_radius: f32,
    pub line_distance: f32,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl HitTester {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            point_radius: config.point_radius,
            line_distance: config.line_distance,
        }
    }

    /// First visible vertex, then first visible edge, under `pos`.
    pub fn hit_test(&self, projection: &Projection, pos: Vec2) -> HitResult {
        if let Some(id) = self.hit_vertex(projection, pos) {
            return HitResult::Vertex(id);
        }
        if let Some(id) = self.hit_edge(projection, pos) {
            return HitResult::Edge(id);
        }
        HitResult::Background
    }

    pub fn hit_vertex(&self, projection: &Projection, pos: Vec2) -> Option<VertexId> {
        let radius_sq = self.point_radius * self.point_radius;
        projection.visible_vertices.iter().copied().find(|&id| {
            projection
                .position(id)
                .is_some_and(|p| p.distance_sq(pos) <= radius_sq)
        })
    }

    pub fn hit_edge(&self, projection: &Projection, pos: Vec2) -> Option<EdgeId> {
        projection.visible_edges.iter().copied().find(|&id| {
            projection.segment(id).is_some_and(|segment| {
                // zero-length segments have no distance and are never hit
                segment
                    .line_distance(pos)
                    .is_some_and(|d| d < self.line_distance && segment.spans_x(pos.x))
            })
        })
    }
}
