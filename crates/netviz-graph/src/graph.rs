use netviz_core::{
    AttrValue, Attributes, CanvasError, ClusterId, Color, EdgeId, Entity, Vec2, VertexId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ATTR_X: &str = "x";
pub const ATTR_Y: &str = "y";
pub const ATTR_CLUSTER: &str = "cluster";
pub const ATTR_DEGREE: &str = "degree";
pub const ATTR_COLOR: &str = "color";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    /// Model-space position.
    pub position: Vec2,
    pub degree: usize,
    pub cluster: Option<ClusterId>,
    pub color: Color,
    /// Everything that is not one of the typed fields above.
    pub attributes: Attributes,
}

impl Vertex {
    fn new(id: VertexId) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            degree: 0,
            cluster: None,
            color: Color::default(),
            attributes: Attributes::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            ATTR_X => Some(AttrValue::Float(self.position.x as f64)),
            ATTR_Y => Some(AttrValue::Float(self.position.y as f64)),
            ATTR_DEGREE => Some(AttrValue::Int(self.degree as i64)),
            ATTR_CLUSTER => self.cluster.map(|c| AttrValue::Int(c.0)),
            ATTR_COLOR => Some(AttrValue::Text(self.color.to_hex())),
            _ => self.attributes.get(name).cloned(),
        }
    }

    /// Full attribute mapping, typed fields included, as shown in the info panel.
    pub fn attribute_map(&self) -> Attributes {
        let mut map = self.attributes.clone();
        for name in [ATTR_X, ATTR_Y, ATTR_DEGREE, ATTR_CLUSTER, ATTR_COLOR] {
            if let Some(value) = self.attribute(name) {
                map.insert(name.to_string(), value);
            }
        }
        map
    }

    fn apply_attribute(&mut self, name: &str, value: AttrValue) -> Result<(), &'static str> {
        match name {
            ATTR_X => {
                self.position.x = value.as_f64().ok_or("expected a number")? as f32;
            }
            ATTR_Y => {
                self.position.y = value.as_f64().ok_or("expected a number")? as f32;
            }
            ATTR_CLUSTER => {
                self.cluster = Some(ClusterId(value.as_i64().ok_or("expected an integer")?));
            }
            ATTR_DEGREE => return Err("degree is derived from the edge set"),
            ATTR_COLOR => return Err("color is assigned by clustering"),
            _ => {
                self.attributes.insert(name.to_string(), value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub attributes: Attributes,
}

impl Edge {
    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name).cloned()
    }

    pub fn attribute_map(&self) -> Attributes {
        self.attributes.clone()
    }

    pub fn touches(&self, vertex: VertexId) -> bool {
        self.source == vertex || self.target == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint.
    pub fn opposite(&self, vertex: VertexId) -> Option<VertexId> {
        if self.source == vertex {
            Some(self.target)
        } else if self.target == vertex {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Mutable vertex/edge store backing a canvas session.
///
/// Vertices and edges keep insertion order, which is also the order used for
/// visibility and hit testing. Ids are never reused within one model.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    vertex_index: HashMap<VertexId, usize>,
    edge_index: HashMap<EdgeId, usize>,
    next_vertex_id: i64,
    next_edge_id: i64,
    directed: bool,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertex_index.get(&id).map(|&idx| &self.vertices[idx])
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertex_index
            .get(&id)
            .map(|&idx| &mut self.vertices[idx])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index.get(&id).map(|&idx| &self.edges[idx])
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex_index.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_index.contains_key(&id)
    }

    fn require_vertex(&self, id: VertexId) -> Result<&Vertex, CanvasError> {
        self.vertex(id)
            .ok_or(CanvasError::NotFound(Entity::Vertex(id)))
    }

    /// Add a vertex. Keys `x`, `y` and `cluster` populate the typed fields,
    /// everything else lands in the attribute bag.
    pub fn add_vertex(&mut self, attributes: Attributes) -> Result<VertexId, CanvasError> {
        let id = VertexId(self.next_vertex_id);
        let mut vertex = Vertex::new(id);
        for (name, value) in attributes {
            vertex
                .apply_attribute(&name, value)
                .map_err(|reason| CanvasError::InvalidAttribute {
                    entity: Entity::Vertex(id),
                    name: name.clone(),
                    reason,
                })?;
        }

        self.next_vertex_id += 1;
        self.vertex_index.insert(id, self.vertices.len());
        self.vertices.push(vertex);
        tracing::debug!("Added vertex {}", id);
        Ok(id)
    }

    /// Delete a vertex together with every edge incident to it.
    pub fn delete_vertex(&mut self, id: VertexId) -> Result<Vertex, CanvasError> {
        let idx = *self
            .vertex_index
            .get(&id)
            .ok_or(CanvasError::NotFound(Entity::Vertex(id)))?;

        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(id));
        let removed_edges = before - self.edges.len();

        let vertex = self.vertices.remove(idx);
        self.reindex();
        self.recompute_degrees();
        tracing::debug!("Deleted vertex {} and {} incident edges", id, removed_edges);
        Ok(vertex)
    }

    pub fn add_edge(&mut self, source: VertexId, target: VertexId) -> Result<EdgeId, CanvasError> {
        self.add_edge_with(source, target, Attributes::new())
    }

    pub fn add_edge_with(
        &mut self,
        source: VertexId,
        target: VertexId,
        attributes: Attributes,
    ) -> Result<EdgeId, CanvasError> {
        if source == target {
            return Err(CanvasError::InvalidEndpoint {
                from: source,
                to: target,
                reason: "an edge needs two distinct endpoints",
            });
        }
        if !self.contains_vertex(source) || !self.contains_vertex(target) {
            return Err(CanvasError::InvalidEndpoint {
                from: source,
                to: target,
                reason: "endpoint does not exist",
            });
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edge_index.insert(id, self.edges.len());
        self.edges.push(Edge {
            id,
            source,
            target,
            attributes,
        });
        self.recompute_degrees();
        tracing::debug!("Added edge {} ({} -> {})", id, source, target);
        Ok(id)
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> Result<Edge, CanvasError> {
        let idx = *self
            .edge_index
            .get(&id)
            .ok_or(CanvasError::NotFound(Entity::Edge(id)))?;
        let edge = self.edges.remove(idx);
        self.reindex();
        self.recompute_degrees();
        tracing::debug!("Deleted edge {}", id);
        Ok(edge)
    }

    pub fn attribute(&self, entity: Entity, name: &str) -> Result<Option<AttrValue>, CanvasError> {
        match entity {
            Entity::Vertex(id) => Ok(self.require_vertex(id)?.attribute(name)),
            Entity::Edge(id) => self
                .edge(id)
                .map(|edge| edge.attribute(name))
                .ok_or(CanvasError::NotFound(entity)),
        }
    }

    pub fn set_attribute(
        &mut self,
        entity: Entity,
        name: &str,
        value: AttrValue,
    ) -> Result<(), CanvasError> {
        match entity {
            Entity::Vertex(id) => {
                let vertex = self
                    .vertex_mut(id)
                    .ok_or(CanvasError::NotFound(entity))?;
                vertex
                    .apply_attribute(name, value)
                    .map_err(|reason| CanvasError::InvalidAttribute {
                        entity,
                        name: name.to_string(),
                        reason,
                    })
            }
            Entity::Edge(id) => {
                let idx = *self
                    .edge_index
                    .get(&id)
                    .ok_or(CanvasError::NotFound(entity))?;
                self.edges[idx]
                    .attributes
                    .insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Full attribute mapping of a vertex or edge, used for display callbacks.
    pub fn attribute_map(&self, entity: Entity) -> Result<Attributes, CanvasError> {
        match entity {
            Entity::Vertex(id) => Ok(self.require_vertex(id)?.attribute_map()),
            Entity::Edge(id) => self
                .edge(id)
                .map(Edge::attribute_map)
                .ok_or(CanvasError::NotFound(entity)),
        }
    }

    pub fn degree_of(&self, id: VertexId) -> Result<usize, CanvasError> {
        Ok(self.require_vertex(id)?.degree)
    }

    pub fn set_position(&mut self, id: VertexId, position: Vec2) -> Result<(), CanvasError> {
        let vertex = self
            .vertex_mut(id)
            .ok_or(CanvasError::NotFound(Entity::Vertex(id)))?;
        vertex.position = position;
        Ok(())
    }

    /// Overwrite all positions at once. Vertices missing from `positions` keep theirs.
    pub fn apply_positions(&mut self, positions: &HashMap<VertexId, Vec2>) {
        for vertex in &mut self.vertices {
            if let Some(&pos) = positions.get(&vertex.id) {
                vertex.position = pos;
            }
        }
    }

    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Vertex> {
        self.vertices.iter_mut()
    }

    pub fn has_clusters(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(|v| v.cluster.is_some())
    }

    pub fn incident_edges(&self, id: VertexId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|edge| edge.touches(id))
            .map(|edge| edge.id)
            .collect()
    }

    /// Edges leaving `id` together with the vertex they lead to.
    ///
    /// Undirected graphs traverse every incident edge; directed graphs only
    /// outgoing ones.
    pub fn neighbors(&self, id: VertexId) -> Vec<(EdgeId, VertexId)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == id {
                    Some((edge.id, edge.target))
                } else if edge.target == id && !self.directed {
                    Some((edge.id, edge.source))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Per-edge weights read from a numeric attribute, in edge order.
    ///
    /// Missing or non-numeric values fall back to 1.0.
    pub fn edge_weights(&self, attribute: &str) -> Vec<f64> {
        self.edges
            .iter()
            .map(|edge| {
                edge.attributes
                    .get(attribute)
                    .and_then(AttrValue::as_f64)
                    .unwrap_or(1.0)
            })
            .collect()
    }

    fn reindex(&mut self) {
        self.vertex_index = self
            .vertices
            .iter()
            .enumerate()
            .map(|(idx, v)| (v.id, idx))
            .collect();
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id, idx))
            .collect();
    }

    /// Degrees are stored, not computed per query; refresh them after any
    /// structural change to the edge set.
    pub fn recompute_degrees(&mut self) {
        let mut degrees: HashMap<VertexId, usize> = HashMap::with_capacity(self.vertices.len());
        for edge in &self.edges {
            *degrees.entry(edge.source).or_default() += 1;
            *degrees.entry(edge.target).or_default() += 1;
        }
        for vertex in &mut self.vertices {
            vertex.degree = degrees.get(&vertex.id).copied().unwrap_or(0);
        }
    }
}
