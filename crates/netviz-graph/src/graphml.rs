//! GraphML reader.
//!
//! Supports the subset produced by common network datasets: typed `<key>`
//! declarations (with optional `<default>`), `edgedefault`, and `<data>` on
//! nodes and edges. Nested graphs, hyperedges and ports are ignored.

use crate::graph::{ATTR_CLUSTER, ATTR_COLOR, ATTR_DEGREE, ATTR_X, ATTR_Y, GraphModel};
use netviz_core::{AttrValue, Attributes, GraphFileError, VertexId};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::path::Path;

/// Attribute name under which the GraphML node id is kept.
pub const ATTR_XML_ID: &str = "id";

#[derive(Debug)]
pub struct LoadedGraph {
    pub model: GraphModel,
    /// Every vertex carried both `x` and `y`.
    pub has_positions: bool,
    /// Every vertex carried `cluster`.
    pub has_clusters: bool,
}

impl LoadedGraph {
    /// Wrap a model built in code. Its positions are taken as given.
    pub fn from_model(model: GraphModel) -> Self {
        Self {
            has_positions: true,
            has_clusters: model.has_clusters(),
            model,
        }
    }
}

/// Look a vertex up by its GraphML node id.
pub fn find_vertex(model: &GraphModel, xml_id: &str) -> Option<VertexId> {
    model
        .vertices()
        .iter()
        .find(|v| matches!(v.attributes.get(ATTR_XML_ID), Some(AttrValue::Text(id)) if id == xml_id))
        .map(|v| v.id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Int,
    Float,
    Bool,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDomain {
    Node,
    Edge,
    /// `for="all"` or no `for`: applies to nodes and edges.
    All,
    /// `for="graph"`, `for="graphml"` and the like: never copied onto elements.
    Graph,
}

#[derive(Debug, Clone)]
struct KeyDef {
    name: String,
    ty: KeyType,
    domain: KeyDomain,
    default: Option<AttrValue>,
}

pub fn read_graphml(path: &Path) -> Result<LoadedGraph, GraphFileError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GraphFileError::Io(format!("{}: {}", path.display(), e)))?;
    let loaded = parse_graphml(&text)?;
    tracing::info!(
        "Loaded {:?}: {} vertices, {} edges",
        path,
        loaded.model.vertex_count(),
        loaded.model.edge_count()
    );
    Ok(loaded)
}

pub fn parse_graphml(text: &str) -> Result<LoadedGraph, GraphFileError> {
    let doc = Document::parse(text).map_err(|e| GraphFileError::Xml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "graphml" {
        return Err(GraphFileError::Malformed(format!(
            "expected <graphml> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let keys = parse_keys(root);
    let graph = child_elements(root, "graph")
        .next()
        .ok_or_else(|| GraphFileError::Malformed("missing <graph> element".into()))?;
    let directed = graph.attribute("edgedefault") == Some("directed");

    let mut node_attrs = Vec::new();
    for node in child_elements(graph, "node") {
        let xml_id = node
            .attribute("id")
            .ok_or_else(|| GraphFileError::Malformed("<node> without id".into()))?;
        let mut attrs = read_data(node, &keys, KeyDomain::Node);
        attrs.insert(ATTR_XML_ID.to_string(), AttrValue::Text(xml_id.to_string()));
        node_attrs.push((xml_id.to_string(), attrs));
    }

    let has_positions = !node_attrs.is_empty()
        && node_attrs
            .iter()
            .all(|(_, a)| a.contains_key(ATTR_X) && a.contains_key(ATTR_Y));
    let has_clusters =
        !node_attrs.is_empty() && node_attrs.iter().all(|(_, a)| a.contains_key(ATTR_CLUSTER));
    normalize_cluster_values(&mut node_attrs);

    let mut model = GraphModel::with_direction(directed);
    let mut by_xml_id: HashMap<String, VertexId> = HashMap::with_capacity(node_attrs.len());
    for (xml_id, mut attrs) in node_attrs {
        // Derived on load; stale values from the file are discarded.
        attrs.remove(ATTR_DEGREE);
        attrs.remove(ATTR_COLOR);
        let id = model
            .add_vertex(attrs)
            .map_err(|e| GraphFileError::Malformed(format!("node '{}': {}", xml_id, e)))?;
        if by_xml_id.insert(xml_id.clone(), id).is_some() {
            return Err(GraphFileError::Malformed(format!(
                "duplicate node id '{}'",
                xml_id
            )));
        }
    }

    for edge in child_elements(graph, "edge") {
        let (Some(source), Some(target)) = (edge.attribute("source"), edge.attribute("target"))
        else {
            return Err(GraphFileError::Malformed(
                "<edge> without source or target".into(),
            ));
        };
        let (Some(&src), Some(&dst)) = (by_xml_id.get(source), by_xml_id.get(target)) else {
            tracing::warn!(
                "Dropping edge {} -> {} because an endpoint is missing from the graph",
                source,
                target
            );
            continue;
        };
        if src == dst {
            tracing::warn!("Dropping self-loop on node {}", source);
            continue;
        }
        let mut attrs = read_data(edge, &keys, KeyDomain::Edge);
        if let Some(id) = edge.attribute("id") {
            attrs
                .entry(ATTR_XML_ID.to_string())
                .or_insert_with(|| AttrValue::Text(id.to_string()));
        }
        model
            .add_edge_with(src, dst, attrs)
            .map_err(|e| GraphFileError::Malformed(e.to_string()))?;
    }

    Ok(LoadedGraph {
        model,
        has_positions,
        has_clusters,
    })
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn parse_keys(root: Node<'_, '_>) -> HashMap<String, KeyDef> {
    let mut keys = HashMap::new();
    for key in child_elements(root, "key") {
        let Some(id) = key.attribute("id") else {
            continue;
        };
        let name = key.attribute("attr.name").unwrap_or(id).to_string();
        let ty = match key.attribute("attr.type").unwrap_or("string") {
            "int" | "long" => KeyType::Int,
            "float" | "double" => KeyType::Float,
            "boolean" => KeyType::Bool,
            _ => KeyType::Text,
        };
        let domain = match key.attribute("for") {
            Some("node") => KeyDomain::Node,
            Some("edge") => KeyDomain::Edge,
            None | Some("all") => KeyDomain::All,
            Some(_) => KeyDomain::Graph,
        };
        let default = child_elements(key, "default")
            .next()
            .and_then(|d| d.text())
            .map(|text| convert(text, ty));
        keys.insert(
            id.to_string(),
            KeyDef {
                name,
                ty,
                domain,
                default,
            },
        );
    }
    keys
}

fn read_data(
    element: Node<'_, '_>,
    keys: &HashMap<String, KeyDef>,
    domain: KeyDomain,
) -> Attributes {
    let mut attrs = Attributes::new();
    for def in keys.values() {
        if def.domain != domain && def.domain != KeyDomain::All {
            continue;
        }
        if let Some(default) = &def.default {
            attrs.insert(def.name.clone(), default.clone());
        }
    }
    for data in child_elements(element, "data") {
        let Some(key) = data.attribute("key") else {
            continue;
        };
        let text = data.text().unwrap_or("");
        match keys.get(key) {
            Some(def) => {
                attrs.insert(def.name.clone(), convert(text, def.ty));
            }
            None => {
                tracing::debug!("Undeclared GraphML key '{}', keeping as text", key);
                attrs.insert(key.to_string(), AttrValue::Text(text.to_string()));
            }
        }
    }
    attrs
}

fn convert(text: &str, ty: KeyType) -> AttrValue {
    let trimmed = text.trim();
    match ty {
        KeyType::Int => trimmed
            .parse::<i64>()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Text(text.to_string())),
        KeyType::Float => trimmed
            .parse::<f64>()
            .map(AttrValue::Float)
            .unwrap_or_else(|_| AttrValue::Text(text.to_string())),
        KeyType::Bool => AttrValue::Bool(matches!(trimmed, "true" | "1" | "True" | "TRUE")),
        KeyType::Text => AttrValue::Text(text.to_string()),
    }
}

/// Cluster labels may be arbitrary strings; map them onto integer ids from 1
/// in order of first appearance unless every label already is an integer.
fn normalize_cluster_values(nodes: &mut [(String, Attributes)]) {
    let all_integral = nodes
        .iter()
        .filter_map(|(_, a)| a.get(ATTR_CLUSTER))
        .all(|v| v.as_i64().is_some());
    if all_integral {
        return;
    }

    let mut interned: HashMap<String, i64> = HashMap::new();
    for (_, attrs) in nodes.iter_mut() {
        if let Some(value) = attrs.get_mut(ATTR_CLUSTER) {
            let next = interned.len() as i64 + 1;
            let id = *interned.entry(value.to_string()).or_insert(next);
            *value = AttrValue::Int(id);
        }
    }
}
