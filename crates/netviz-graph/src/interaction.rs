use crate::analysis::{PathOutcome, find_bottlenecks, shortest_path};
use crate::graph::{ATTR_CLUSTER, ATTR_X, ATTR_Y, GraphModel};
use crate::hit_tester::{HitResult, HitTester};
use crate::viewport::{Projection, Viewport};
use netviz_core::{AttrValue, Attributes, CanvasError, EdgeId, Entity, Vec2, VertexId};
use netviz_events::Event;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CanvasMode {
    #[default]
    Edit,
    FindShortestPath,
    FindBottleneck,
}

impl CanvasMode {
    pub const ALL: [CanvasMode; 3] = [
        CanvasMode::Edit,
        CanvasMode::FindShortestPath,
        CanvasMode::FindBottleneck,
    ];
}

impl fmt::Display for CanvasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CanvasMode::Edit => "Edit",
            CanvasMode::FindShortestPath => "Find shortest path",
            CanvasMode::FindBottleneck => "Find bottleneck",
        };
        f.write_str(label)
    }
}

/// One-shot edit intent, consumed by the next click it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingAction {
    AddNode,
    DeleteNode,
    AddLine,
    DeleteLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Panning; holds the last pointer position.
    Background { last: Vec2 },
    Vertex(VertexId),
}

/// Ordered selected vertices and edges, highlighted by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }

    pub fn only_vertex(&mut self, id: VertexId) {
        self.clear();
        self.vertices.push(id);
    }

    pub fn only_edge(&mut self, id: EdgeId) {
        self.clear();
        self.edges.push(id);
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    /// Drop a deleted vertex and the edges that went with it.
    fn forget_vertex(&mut self, id: VertexId, edges: &[EdgeId]) {
        self.vertices.retain(|&v| v != id);
        self.edges.retain(|e| !edges.contains(e));
    }
}

/// Mode state machine turning pointer input into selection changes, graph
/// edits and analysis queries.
///
/// Every handler reports the events to publish; handlers that can fail leave
/// the graph and selection untouched on error.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: CanvasMode,
    pending: Option<PendingAction>,
    drag: DragState,
    selection: Selection,
    hit_tester: HitTester,
}

impl InteractionController {
    pub fn new(hit_tester: HitTester) -> Self {
        Self {
            hit_tester,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.pending
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn hit_tester(&self) -> &HitTester {
        &self.hit_tester
    }

    pub fn arm(&mut self, action: PendingAction) {
        tracing::debug!("Armed {:?}", action);
        self.pending = Some(action);
    }

    pub fn disarm(&mut self) {
        self.pending = None;
    }

    /// Reset selection, drag and pending action. Used after the graph is replaced.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.drag = DragState::Idle;
        self.pending = None;
    }

    /// Switch modes. Entering `FindBottleneck` runs detection right away.
    pub fn set_mode(&mut self, mode: CanvasMode, model: &GraphModel) -> Vec<Event> {
        self.reset();
        self.mode = mode;
        tracing::info!("Canvas mode: {}", mode);

        if mode == CanvasMode::FindBottleneck {
            let found = find_bottlenecks(model);
            self.selection.edges = found.edges.clone();
            self.selection.vertices = found.vertices;
            return vec![Event::BottlenecksDetected { edges: found.edges }];
        }
        Vec::new()
    }

    pub fn pointer_press(
        &mut self,
        pos: Vec2,
        model: &mut GraphModel,
        viewport: &Viewport,
        projection: &Projection,
    ) -> Result<Vec<Event>, CanvasError> {
        match self.hit_tester.hit_test(projection, pos) {
            HitResult::Vertex(id) => self.press_vertex(id, model),
            HitResult::Edge(id) => self.press_edge(id, model),
            HitResult::Background => self.press_background(pos, model, viewport),
        }
    }

    /// Continue a drag. Returns whether anything moved.
    pub fn pointer_move(
        &mut self,
        pos: Vec2,
        model: &mut GraphModel,
        viewport: &mut Viewport,
    ) -> bool {
        match self.drag {
            DragState::Idle => false,
            DragState::Background { last } => {
                viewport.pan_by(last, pos);
                self.drag = DragState::Background { last: pos };
                true
            }
            DragState::Vertex(id) => {
                if model.set_position(id, viewport.to_world(pos)).is_err() {
                    self.drag = DragState::Idle;
                    return false;
                }
                true
            }
        }
    }

    /// End any drag. Returns whether one was active.
    pub fn pointer_release(&mut self) -> bool {
        let was_dragging = self.drag != DragState::Idle;
        self.drag = DragState::Idle;
        was_dragging
    }

    /// Wheel zoom, ignored while panning. Returns whether the zoom changed.
    pub fn wheel(&mut self, angle_delta: f32, viewport: &mut Viewport) -> bool {
        if matches!(self.drag, DragState::Background { .. }) {
            return false;
        }
        viewport.wheel(angle_delta);
        true
    }

    fn press_vertex(
        &mut self,
        id: VertexId,
        model: &mut GraphModel,
    ) -> Result<Vec<Event>, CanvasError> {
        match self.mode {
            CanvasMode::Edit => match self.pending {
                Some(PendingAction::DeleteNode) => {
                    let incident = model.incident_edges(id);
                    model.delete_vertex(id)?;
                    self.selection.forget_vertex(id, &incident);
                    self.pending = None;
                    let mut events = vec![Event::VertexDeleted { id }];
                    events.extend(incident.into_iter().map(|id| Event::EdgeDeleted { id }));
                    Ok(events)
                }
                Some(PendingAction::AddLine) => self.add_line_endpoint(id, model),
                _ => {
                    let attributes = model.attribute_map(Entity::Vertex(id))?;
                    self.selection.only_vertex(id);
                    self.drag = DragState::Vertex(id);
                    Ok(vec![Event::VertexSelected { id, attributes }])
                }
            },
            CanvasMode::FindShortestPath => {
                let [start] = self.selection.vertices.as_slice() else {
                    self.selection.only_vertex(id);
                    return Ok(Vec::new());
                };
                let start = *start;
                match shortest_path(model, start, id)? {
                    PathOutcome::Found { edges, vertices } => {
                        let hops = edges.len();
                        self.selection.edges = edges;
                        self.selection.vertices = vertices;
                        Ok(vec![Event::ShortestPathFound {
                            from: start,
                            to: id,
                            hops,
                        }])
                    }
                    PathOutcome::Disconnected => {
                        self.selection.clear();
                        Ok(vec![Event::NotConnected { from: start, to: id }])
                    }
                }
            }
            CanvasMode::FindBottleneck => {
                self.drag = DragState::Vertex(id);
                Ok(Vec::new())
            }
        }
    }

    fn add_line_endpoint(
        &mut self,
        id: VertexId,
        model: &mut GraphModel,
    ) -> Result<Vec<Event>, CanvasError> {
        self.selection.edges.clear();
        if self.selection.vertices.len() >= 2 {
            self.selection.vertices.clear();
        }
        if self.selection.contains_vertex(id) {
            return Ok(Vec::new());
        }
        let [first] = self.selection.vertices.as_slice() else {
            self.selection.vertices.push(id);
            return Ok(Vec::new());
        };
        let edge = model.add_edge(*first, id)?;
        self.selection.clear();
        self.pending = None;
        Ok(vec![Event::EdgeAdded { id: edge }])
    }

    fn press_edge(&mut self, id: EdgeId, model: &mut GraphModel) -> Result<Vec<Event>, CanvasError> {
        if self.mode != CanvasMode::Edit {
            return Ok(Vec::new());
        }
        if self.pending == Some(PendingAction::DeleteLine) {
            model.delete_edge(id)?;
            self.selection.edges.retain(|&e| e != id);
            self.pending = None;
            return Ok(vec![Event::EdgeDeleted { id }]);
        }

        let edge = model
            .edge(id)
            .ok_or(CanvasError::NotFound(Entity::Edge(id)))?;
        let event = Event::EdgeSelected {
            id,
            source: edge.source,
            target: edge.target,
            attributes: edge.attribute_map(),
        };
        self.selection.only_edge(id);
        Ok(vec![event])
    }

    fn press_background(
        &mut self,
        pos: Vec2,
        model: &mut GraphModel,
        viewport: &Viewport,
    ) -> Result<Vec<Event>, CanvasError> {
        let mut events = Vec::new();
        if self.mode == CanvasMode::Edit {
            self.selection.clear();
            if self.pending == Some(PendingAction::AddNode) {
                let world = viewport.to_world(pos);
                let mut attributes = Attributes::new();
                attributes.insert(ATTR_X.into(), AttrValue::Float(world.x as f64));
                attributes.insert(ATTR_Y.into(), AttrValue::Float(world.y as f64));
                attributes.insert(ATTR_CLUSTER.into(), AttrValue::Int(0));
                let id = model.add_vertex(attributes)?;
                self.pending = None;
                events.push(Event::VertexAdded { id });
            }
        }
        self.drag = DragState::Background { last: pos };
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::graph_from;
    use netviz_core::{ClusterId, Color};

    /// Canvas-less harness: 200x200 viewport showing world [0, 200]^2 at zoom 1.
    pub(crate) struct Harness {
        pub model: GraphModel,
        pub viewport: Viewport,
        pub controller: InteractionController,
    }

    impl Harness {
        pub fn new(model: GraphModel) -> Self {
            let mut viewport = Viewport::default();
            viewport.resize(Vec2::new(200.0, 200.0));
            viewport.reset(Vec2::new(200.0, 200.0));
            Self {
                model,
                viewport,
                controller: InteractionController::default(),
            }
        }

        pub fn press(&mut self, x: f32, y: f32) -> Vec<Event> {
            let projection = self.viewport.project(&self.model, None);
            self.controller
                .pointer_press(Vec2::new(x, y), &mut self.model, &self.viewport, &projection)
                .unwrap()
        }

        pub fn click(&mut self, x: f32, y: f32) -> Vec<Event> {
            let events = self.press(x, y);
            self.controller.pointer_release();
            events
        }

        pub fn id(&self, ordinal: usize) -> VertexId {
            self.model.vertices()[ordinal].id
        }

        pub fn edge(&self, ordinal: usize) -> EdgeId {
            self.model.edges()[ordinal].id
        }
    }

    /// Chain 0-1-2-3 along y = 20 plus an isolated vertex 4.
    fn chain() -> Harness {
        Harness::new(graph_from(
            &[(20.0, 20.0), (70.0, 20.0), (120.0, 20.0), (170.0, 20.0), (100.0, 150.0)],
            &[(0, 1), (1, 2), (2, 3)],
        ))
    }

    #[test]
    fn test_plain_vertex_click_selects_and_notifies() {
        let mut h = chain();
        let events = h.press(21.0, 22.0);
        let id = h.id(0);

        assert_eq!(h.controller.selection().vertices, vec![id]);
        assert_eq!(h.controller.drag(), DragState::Vertex(id));
        match &events[..] {
            [Event::VertexSelected { id: selected, attributes }] => {
                assert_eq!(*selected, id);
                assert_eq!(attributes.get("degree"), Some(&AttrValue::Int(1)));
            }
            other => panic!("Expected VertexSelected, got {:?}", other),
        }
    }

    #[test]
    fn test_vertex_drag_follows_pointer() {
        let mut h = chain();
        h.press(20.0, 20.0);
        let moved = h
            .controller
            .pointer_move(Vec2::new(40.0, 60.0), &mut h.model, &mut h.viewport);
        assert!(moved);
        assert_eq!(h.model.vertices()[0].position, Vec2::new(40.0, 60.0));

        assert!(h.controller.pointer_release());
        assert_eq!(h.controller.drag(), DragState::Idle);
    }

    #[test]
    fn test_edge_click_selects_edge() {
        let mut h = chain();
        let events = h.click(45.0, 21.0);
        let edge = h.edge(0);

        assert_eq!(h.controller.selection().edges, vec![edge]);
        assert!(h.controller.selection().vertices.is_empty());
        assert!(matches!(
            events.as_slice(),
            [Event::EdgeSelected { id, .. }] if *id == edge
        ));
    }

    #[test]
    fn test_background_click_clears_selection_and_pans() {
        let mut h = chain();
        h.click(20.0, 20.0);
        h.press(100.0, 100.0);

        assert!(h.controller.selection().is_empty());
        assert_eq!(
            h.controller.drag(),
            DragState::Background {
                last: Vec2::new(100.0, 100.0)
            }
        );
        h.controller
            .pointer_move(Vec2::new(90.0, 100.0), &mut h.model, &mut h.viewport);
        assert_eq!(h.viewport.center(), Vec2::new(110.0, 100.0));
    }

    #[test]
    fn test_wheel_is_ignored_while_panning() {
        let mut h = chain();
        h.press(100.0, 100.0);
        assert!(!h.controller.wheel(120.0, &mut h.viewport));
        assert_eq!(h.viewport.zoom(), 1.0);
        h.controller.pointer_release();
        assert!(h.controller.wheel(120.0, &mut h.viewport));
        assert!(h.viewport.zoom() > 1.0);
    }

    #[test]
    fn test_add_node_on_background() {
        let mut h = chain();
        h.controller.arm(PendingAction::AddNode);
        let events = h.click(60.0, 90.0);

        assert_eq!(h.model.vertex_count(), 6);
        let added = h.model.vertices().last().unwrap();
        assert_eq!(added.position, Vec2::new(60.0, 90.0));
        assert_eq!(added.cluster, Some(ClusterId(0)));
        assert_eq!(added.color, Color::default());
        assert_eq!(events, vec![Event::VertexAdded { id: added.id }]);
        assert_eq!(h.controller.pending_action(), None);

        h.click(60.0, 120.0);
        assert_eq!(h.model.vertex_count(), 6);
    }

    #[test]
    fn test_add_node_waits_for_background_click() {
        let mut h = chain();
        h.controller.arm(PendingAction::AddNode);
        h.click(20.0, 20.0);
        assert_eq!(h.controller.pending_action(), Some(PendingAction::AddNode));
        assert_eq!(h.model.vertex_count(), 5);
    }

    #[test]
    fn test_delete_node_removes_incident_edges() {
        let mut h = chain();
        let victim = h.id(1);
        h.controller.arm(PendingAction::DeleteNode);
        let events = h.click(70.0, 20.0);

        assert!(!h.model.contains_vertex(victim));
        assert_eq!(h.model.edge_count(), 1);
        assert_eq!(events[0], Event::VertexDeleted { id: victim });
        assert_eq!(events.len(), 3);
        assert_eq!(h.controller.pending_action(), None);
        assert!(!h.controller.selection().contains_vertex(victim));
    }

    #[test]
    fn test_add_line_between_two_vertices() {
        let mut h = chain();
        let (a, b) = (h.id(0), h.id(4));
        h.controller.arm(PendingAction::AddLine);

        assert!(h.click(20.0, 20.0).is_empty());
        assert_eq!(h.controller.selection().vertices, vec![a]);
        // a second click on the same vertex does not form a loop
        assert!(h.click(20.0, 20.0).is_empty());

        let events = h.click(100.0, 150.0);
        let edge = h.model.edges().last().unwrap();
        assert_eq!((edge.source, edge.target), (a, b));
        assert_eq!(events, vec![Event::EdgeAdded { id: edge.id }]);
        assert!(h.controller.selection().is_empty());
        assert_eq!(h.controller.pending_action(), None);
        assert_eq!(h.model.degree_of(b).unwrap(), 1);
    }

    #[test]
    fn test_delete_line() {
        let mut h = chain();
        let edge = h.edge(1);
        h.controller.arm(PendingAction::DeleteLine);
        let events = h.click(95.0, 20.5);

        assert!(!h.model.contains_edge(edge));
        assert_eq!(events, vec![Event::EdgeDeleted { id: edge }]);
        assert_eq!(h.controller.pending_action(), None);
    }

    #[test]
    fn test_shortest_path_selection() {
        let mut h = chain();
        h.controller.set_mode(CanvasMode::FindShortestPath, &h.model);

        h.click(20.0, 20.0);
        let events = h.click(170.0, 20.0);

        let vertices: Vec<VertexId> = (0..4).map(|i| h.id(i)).collect();
        let edges: Vec<EdgeId> = (0..3).map(|i| h.edge(i)).collect();
        assert_eq!(h.controller.selection().vertices, vertices);
        assert_eq!(h.controller.selection().edges, edges);
        assert_eq!(
            events,
            vec![Event::ShortestPathFound {
                from: vertices[0],
                to: vertices[3],
                hops: 3
            }]
        );
        assert_eq!(h.controller.drag(), DragState::Idle);

        // with a path selected, the next click starts over
        h.click(70.0, 20.0);
        assert_eq!(h.controller.selection().vertices, vec![vertices[1]]);
        assert!(h.controller.selection().edges.is_empty());
    }

    #[test]
    fn test_shortest_path_not_connected() {
        let mut h = chain();
        h.controller.set_mode(CanvasMode::FindShortestPath, &h.model);
        h.click(20.0, 20.0);
        let events = h.click(100.0, 150.0);

        assert!(h.controller.selection().is_empty());
        assert_eq!(
            events,
            vec![Event::NotConnected {
                from: h.id(0),
                to: h.id(4)
            }]
        );
    }

    #[test]
    fn test_shortest_path_to_the_same_vertex() {
        let mut h = chain();
        h.controller.set_mode(CanvasMode::FindShortestPath, &h.model);
        h.click(20.0, 20.0);
        let events = h.click(20.0, 20.0);

        assert_eq!(
            events,
            vec![Event::NotConnected {
                from: h.id(0),
                to: h.id(0)
            }]
        );
        assert!(h.controller.selection().is_empty());

        h.click(70.0, 20.0);
        assert_eq!(h.controller.selection().vertices, vec![h.id(1)]);
    }

    #[test]
    fn test_bottleneck_mode_is_eager() {
        let mut model = graph_from(&[(20.0, 20.0), (70.0, 20.0), (120.0, 20.0)], &[(0, 1), (1, 2)]);
        let clusters = [0, 0, 1];
        for (vertex, c) in model.vertices_mut().zip(clusters) {
            vertex.cluster = Some(ClusterId(c));
        }
        let mut h = Harness::new(model);

        let events = h.controller.set_mode(CanvasMode::FindBottleneck, &h.model);
        let bridge = h.edge(1);
        assert_eq!(events, vec![Event::BottlenecksDetected { edges: vec![bridge] }]);
        assert_eq!(h.controller.selection().edges, vec![bridge]);
        assert_eq!(h.controller.selection().vertices, vec![h.id(2), h.id(1)]);

        // clicking a vertex drags it without touching the selection
        let before = h.controller.selection().clone();
        h.press(20.0, 20.0);
        assert_eq!(h.controller.drag(), DragState::Vertex(h.id(0)));
        assert_eq!(h.controller.selection(), &before);
    }

    #[test]
    fn test_mode_switch_disarms_pending_action() {
        let mut h = chain();
        h.controller.arm(PendingAction::DeleteNode);
        h.controller.set_mode(CanvasMode::Edit, &h.model);
        assert_eq!(h.controller.pending_action(), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::graph::test_support::graph_from;
    use proptest::prelude::*;

    fn mode_strategy() -> impl Strategy<Value = CanvasMode> {
        prop_oneof![
            Just(CanvasMode::Edit),
            Just(CanvasMode::FindShortestPath),
            Just(CanvasMode::FindBottleneck),
        ]
    }

    proptest! {
        /// Whatever was clicked before, switching modes leaves nothing selected
        /// (except the bottleneck result, which this graph has none of).
        #[test]
        fn prop_mode_switch_empties_selection(
            start in mode_strategy(),
            next in mode_strategy(),
            clicks in proptest::collection::vec((0.0f32..200.0, 0.0f32..200.0), 0..12),
        ) {
            let mut model = graph_from(
                &[(20.0, 20.0), (70.0, 20.0), (120.0, 20.0), (170.0, 20.0)],
                &[(0, 1), (1, 2), (2, 3), (0, 2)],
            );
            let mut viewport = Viewport::default();
            viewport.resize(Vec2::new(200.0, 200.0));
            viewport.reset(Vec2::new(200.0, 200.0));
            let mut controller = InteractionController::default();
            controller.set_mode(start, &model);

            for (x, y) in clicks {
                let projection = viewport.project(&model, None);
                controller
                    .pointer_press(Vec2::new(x, y), &mut model, &viewport, &projection)
                    .unwrap();
                controller.pointer_release();
            }

            controller.set_mode(next, &model);
            prop_assert!(controller.selection().is_empty());
            prop_assert_eq!(controller.drag(), DragState::Idle);
        }
    }
}
