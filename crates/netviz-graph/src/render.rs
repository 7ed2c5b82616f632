use crate::config::CanvasConfig;
use crate::graph::GraphModel;
use crate::interaction::Selection;
use crate::viewport::Projection;
use netviz_core::{Color, LineSegment, Vec2, VertexId};

// ============================================================================
// Colors
// ============================================================================

pub const COLOR_BACKGROUND: Color = Color::BLACK;
pub const COLOR_EDGE: Color = Color::WHITE;
pub const COLOR_VERTEX_OUTLINE: Color = Color::BLACK;
pub const COLOR_HIGHLIGHT: Color = Color::RED;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Screen-space primitive; the GUI maps these one-to-one onto painter calls.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Color,
        stroke: Stroke,
    },
}

/// Everything needed to paint one frame, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPacket {
    pub background: Color,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub edge: Stroke,
    pub vertex_outline: Stroke,
    pub highlight: Stroke,
    /// Drawn diameter of a vertex.
    pub point_diameter: f32,
    pub selected_point_diameter: f32,
    pub background: Color,
}

impl RenderStyle {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            edge: Stroke::new(0.5, COLOR_EDGE),
            vertex_outline: Stroke::new(1.0, COLOR_VERTEX_OUTLINE),
            highlight: Stroke::new(2.0, COLOR_HIGHLIGHT),
            point_diameter: config.point_radius,
            selected_point_diameter: config.selected_point_radius,
            background: COLOR_BACKGROUND,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

/// Build the frame: plain edges, plain vertices, then the selected edges and
/// vertices on top.
pub fn render(
    model: &GraphModel,
    projection: &Projection,
    selection: &Selection,
    style: &RenderStyle,
) -> RenderPacket {
    let mut commands = Vec::with_capacity(
        projection.visible_edges.len()
            + projection.visible_vertices.len()
            + selection.edges.len()
            + selection.vertices.len(),
    );

    let line = |segment: LineSegment, stroke: Stroke| DrawCommand::Line {
        from: segment.a,
        to: segment.b,
        stroke,
    };
    let circle = |model: &GraphModel,
                  id: VertexId,
                  diameter: f32,
                  stroke: Stroke|
     -> Option<DrawCommand> {
        let center = projection.position(id)?;
        let fill = model.vertex(id)?.color;
        Some(DrawCommand::Circle {
            center,
            radius: diameter / 2.0,
            fill,
            stroke,
        })
    };

    for &id in &projection.visible_edges {
        if selection.contains_edge(id) {
            continue;
        }
        if let Some(segment) = projection.segment(id) {
            commands.push(line(segment, style.edge));
        }
    }
    for &id in &projection.visible_vertices {
        if selection.contains_vertex(id) {
            continue;
        }
        commands.extend(circle(model, id, style.point_diameter, style.vertex_outline));
    }
    for &id in &selection.edges {
        if let Some(segment) = projection.segment(id) {
            commands.push(line(segment, style.highlight));
        }
    }
    for &id in &selection.vertices {
        commands.extend(circle(
            model,
            id,
            style.selected_point_diameter,
            style.highlight,
        ));
    }

    RenderPacket {
        background: style.background,
        commands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::path_graph;
    use crate::viewport::Viewport;

    fn setup() -> (GraphModel, Projection) {
        let model = path_graph(3);
        let mut viewport = Viewport::default();
        viewport.resize(Vec2::new(100.0, 100.0));
        viewport.reset(Vec2::new(100.0, 100.0));
        let projection = viewport.project(&model, None);
        (model, projection)
    }

    #[test]
    fn test_unselected_frame() {
        let (model, projection) = setup();
        let packet = render(&model, &projection, &Selection::default(), &RenderStyle::default());

        assert_eq!(packet.background, COLOR_BACKGROUND);
        assert_eq!(packet.commands.len(), 5);
        assert!(matches!(packet.commands[0], DrawCommand::Line { stroke, .. } if stroke.color == COLOR_EDGE));
        match packet.commands[2] {
            DrawCommand::Circle { radius, fill, .. } => {
                assert_eq!(radius, 4.0);
                assert_eq!(fill, Color::WHITE);
            }
            ref other => panic!("Expected a vertex, got {:?}", other),
        }
    }

    #[test]
    fn test_selection_is_drawn_last_and_once() {
        let (model, projection) = setup();
        let selection = Selection {
            vertices: vec![model.vertices()[1].id],
            edges: vec![model.edges()[0].id],
        };
        let packet = render(&model, &projection, &selection, &RenderStyle::default());

        assert_eq!(packet.commands.len(), 5);
        let last = packet.commands.len() - 1;
        match packet.commands[last] {
            DrawCommand::Circle { radius, stroke, .. } => {
                assert_eq!(radius, 6.0);
                assert_eq!(stroke.color, COLOR_HIGHLIGHT);
            }
            ref other => panic!("Expected the selected vertex last, got {:?}", other),
        }
        assert!(matches!(
            packet.commands[last - 1],
            DrawCommand::Line { stroke, .. } if stroke.width == 2.0
        ));
    }
}
