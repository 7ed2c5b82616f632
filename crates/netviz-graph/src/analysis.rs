//! Graph queries behind the FindShortestPath and FindBottleneck modes.

use crate::graph::GraphModel;
use netviz_core::{CanvasError, ClusterId, EdgeId, Entity, VertexId};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Result of a shortest-path query. `Disconnected` is informational, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// `edges` in path order; `vertices` holds the start of every edge plus
    /// the destination.
    Found {
        edges: Vec<EdgeId>,
        vertices: Vec<VertexId>,
    },
    Disconnected,
}

impl PathOutcome {
    pub fn hops(&self) -> Option<usize> {
        match self {
            PathOutcome::Found { edges, .. } => Some(edges.len()),
            PathOutcome::Disconnected => None,
        }
    }
}

/// Fewest-hops path from `from` to `to`, ignoring weights. A vertex has no
/// path to itself.
///
/// Neighbors are explored in edge insertion order, so among equally short
/// paths the one using earlier edges wins.
pub fn shortest_path(
    model: &GraphModel,
    from: VertexId,
    to: VertexId,
) -> Result<PathOutcome, CanvasError> {
    for id in [from, to] {
        if !model.contains_vertex(id) {
            return Err(CanvasError::NotFound(Entity::Vertex(id)));
        }
    }
    if from == to {
        return Ok(PathOutcome::Disconnected);
    }

    let mut parent: HashMap<VertexId, (EdgeId, VertexId)> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    'search: while let Some(current) = queue.pop_front() {
        for (edge, next) in model.neighbors(current) {
            if next == from || parent.contains_key(&next) {
                continue;
            }
            parent.insert(next, (edge, current));
            if next == to {
                break 'search;
            }
            queue.push_back(next);
        }
    }

    if !parent.contains_key(&to) {
        tracing::info!("{} and {} are not connected", from, to);
        return Ok(PathOutcome::Disconnected);
    }

    let mut edges = Vec::new();
    let mut vertices = vec![to];
    let mut cursor = to;
    while let Some(&(edge, previous)) = parent.get(&cursor) {
        edges.push(edge);
        vertices.push(previous);
        cursor = previous;
    }
    edges.reverse();
    vertices.reverse();
    Ok(PathOutcome::Found { edges, vertices })
}

/// Edges that are the only link between a cluster and the rest of the graph,
/// together with their endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bottlenecks {
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
}

impl Bottlenecks {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

pub fn find_bottlenecks(model: &GraphModel) -> Bottlenecks {
    let mut outgoing: BTreeMap<Option<ClusterId>, Vec<EdgeId>> = BTreeMap::new();
    for edge in model.edges() {
        let (Some(source), Some(target)) = (model.vertex(edge.source), model.vertex(edge.target))
        else {
            continue;
        };
        if source.cluster != target.cluster {
            outgoing.entry(source.cluster).or_default().push(edge.id);
            outgoing.entry(target.cluster).or_default().push(edge.id);
        }
    }

    let mut found = Bottlenecks::default();
    for edges in outgoing.values() {
        let [edge_id] = edges.as_slice() else {
            continue;
        };
        let Some(edge) = model.edge(*edge_id) else {
            continue;
        };
        if !found.edges.contains(edge_id) {
            found.edges.push(*edge_id);
        }
        for vertex in [edge.target, edge.source] {
            if !found.vertices.contains(&vertex) {
                found.vertices.push(vertex);
            }
        }
    }

    tracing::debug!("Found {} bottleneck edges", found.edges.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{graph_from, path_graph};

    fn ids(model: &GraphModel) -> Vec<VertexId> {
        model.vertices().iter().map(|v| v.id).collect()
    }

    fn edge_ids(model: &GraphModel) -> Vec<EdgeId> {
        model.edges().iter().map(|e| e.id).collect()
    }

    fn set_clusters(model: &mut GraphModel, clusters: &[i64]) {
        for (vertex, &c) in model.vertices_mut().zip(clusters) {
            vertex.cluster = Some(ClusterId(c));
        }
    }

    #[test]
    fn test_path_through_chain() {
        let model = path_graph(4);
        let v = ids(&model);
        let outcome = shortest_path(&model, v[0], v[3]).unwrap();
        assert_eq!(
            outcome,
            PathOutcome::Found {
                edges: edge_ids(&model),
                vertices: v.clone(),
            }
        );
        assert_eq!(outcome.hops(), Some(3));
    }

    #[test]
    fn test_path_against_edge_direction_in_undirected_graph() {
        let model = path_graph(4);
        let v = ids(&model);
        let outcome = shortest_path(&model, v[3], v[0]).unwrap();
        let mut expected_edges = edge_ids(&model);
        expected_edges.reverse();
        assert_eq!(
            outcome,
            PathOutcome::Found {
                edges: expected_edges,
                vertices: vec![v[3], v[2], v[1], v[0]],
            }
        );
    }

    #[test]
    fn test_path_prefers_fewest_hops() {
        // 0-1-2-3 plus shortcut 0-3
        let model = graph_from(&[(0.0, 0.0); 4], &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let v = ids(&model);
        let outcome = shortest_path(&model, v[0], v[3]).unwrap();
        assert_eq!(
            outcome,
            PathOutcome::Found {
                edges: vec![model.edges()[3].id],
                vertices: vec![v[0], v[3]],
            }
        );
    }

    #[test]
    fn test_disconnected_is_not_an_error() {
        let model = graph_from(&[(0.0, 0.0); 4], &[(0, 1), (2, 3)]);
        let v = ids(&model);
        assert_eq!(
            shortest_path(&model, v[0], v[3]).unwrap(),
            PathOutcome::Disconnected
        );
    }

    #[test]
    fn test_path_to_self_and_missing_vertex() {
        let model = path_graph(2);
        let v = ids(&model);
        assert_eq!(
            shortest_path(&model, v[0], v[0]).unwrap(),
            PathOutcome::Disconnected
        );
        assert_eq!(
            shortest_path(&model, v[0], VertexId(77)).unwrap_err(),
            CanvasError::NotFound(Entity::Vertex(VertexId(77)))
        );
    }

    #[test]
    fn test_directed_path_follows_edges() {
        let mut model = GraphModel::with_direction(true);
        let a = model.add_vertex(Default::default()).unwrap();
        let b = model.add_vertex(Default::default()).unwrap();
        model.add_edge(a, b).unwrap();
        assert_eq!(shortest_path(&model, a, b).unwrap().hops(), Some(1));
        assert_eq!(
            shortest_path(&model, b, a).unwrap(),
            PathOutcome::Disconnected
        );
    }

    #[test]
    fn test_single_bridge_is_a_bottleneck() {
        let mut model = graph_from(
            &[(0.0, 0.0); 6],
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)],
        );
        set_clusters(&mut model, &[0, 0, 0, 1, 1, 1]);
        let v = ids(&model);

        let found = find_bottlenecks(&model);
        assert_eq!(found.edges, vec![model.edges()[6].id]);
        assert_eq!(found.vertices, vec![v[3], v[2]]);
    }

    #[test]
    fn test_two_bridges_are_not_bottlenecks() {
        let mut model = graph_from(
            &[(0.0, 0.0); 6],
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3), (0, 5)],
        );
        set_clusters(&mut model, &[0, 0, 0, 1, 1, 1]);
        assert!(find_bottlenecks(&model).is_empty());
        assert!(find_bottlenecks(&model).vertices.is_empty());
    }

    #[test]
    fn test_leaf_cluster_in_chain() {
        // clusters 0 - 1 - 2 in a chain: 0 and 2 each have one outgoing edge,
        // 1 has two.
        let mut model = path_graph(3);
        set_clusters(&mut model, &[0, 1, 2]);
        let found = find_bottlenecks(&model);
        assert_eq!(found.edges, edge_ids(&model));
        assert_eq!(found.vertices.len(), 3);
    }
}
