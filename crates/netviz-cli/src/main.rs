use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use netviz_core::{AttrValue, VertexId};
use netviz_graph::graphml::ATTR_XML_ID;
use netviz_graph::{
    CanvasConfig, GraphCanvas, GraphModel, PathOutcome, find_bottlenecks, find_vertex,
    shortest_path,
};
use serde_json::{Value, json};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect GraphML network topologies", long_about = None)]
struct Args {
    /// GraphML file to load
    graph: PathBuf,

    /// JSON file overriding canvas defaults (seed, default algorithms, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vertex, edge and cluster counts
    Summary,
    /// Run a layout algorithm and print fitted vertex positions
    Layout {
        name: String,
        /// Edge attribute used as weights
        #[arg(short, long)]
        weights: Option<String>,
    },
    /// Run a clustering algorithm and print the membership
    Clusters {
        name: String,
        #[arg(short, long)]
        weights: Option<String>,
    },
    /// Fewest-hop path between two vertices, by GraphML id
    Path { from: String, to: String },
    /// Edges that are the only way out of their cluster
    Bottlenecks {
        /// Re-cluster before the search
        #[arg(long)]
        clustering: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CanvasConfig::from_json_file(path)
            .with_context(|| format!("reading config {:?}", path))?,
        None => CanvasConfig::default(),
    };

    let mut canvas = GraphCanvas::new(config);
    canvas
        .set_graph(&args.graph)
        .with_context(|| format!("loading {:?}", args.graph))?;
    tracing::info!(
        "Loaded {} vertices and {} edges",
        canvas.model().vertex_count(),
        canvas.model().edge_count()
    );

    let output = match args.command {
        Command::Summary => summary(&canvas),
        Command::Layout { name, weights } => {
            canvas.set_layout(&name, weights.as_deref())?;
            let fit = canvas.fit_size();
            json!({
                "layout": name,
                "width": fit.x,
                "height": fit.y,
                "positions": canvas.model().vertices().iter().map(|v| json!({
                    "id": xml_id(canvas.model(), v.id),
                    "x": v.position.x,
                    "y": v.position.y,
                })).collect::<Vec<_>>(),
            })
        }
        Command::Clusters { name, weights } => {
            let count = canvas.set_clustering(&name, weights.as_deref())?;
            json!({
                "clustering": name,
                "count": count,
                "membership": canvas.model().vertices().iter().map(|v| json!({
                    "id": xml_id(canvas.model(), v.id),
                    "cluster": v.cluster.map(|c| c.0),
                    "color": v.color.to_hex(),
                })).collect::<Vec<_>>(),
            })
        }
        Command::Path { from, to } => {
            let model = canvas.model();
            let (source, target) = (lookup(model, &from)?, lookup(model, &to)?);
            match shortest_path(model, source, target)? {
                PathOutcome::Found { vertices, .. } => json!({
                    "connected": true,
                    "hops": vertices.len().saturating_sub(1),
                    "path": vertices.iter().map(|&id| xml_id(model, id)).collect::<Vec<_>>(),
                }),
                PathOutcome::Disconnected => json!({ "connected": false }),
            }
        }
        Command::Bottlenecks { clustering } => {
            if let Some(name) = clustering {
                canvas.set_clustering(&name, None)?;
            }
            let model = canvas.model();
            let found = find_bottlenecks(model);
            json!({
                "edges": found.edges.iter().filter_map(|&id| model.edge(id)).map(|e| json!({
                    "source": xml_id(model, e.source),
                    "target": xml_id(model, e.target),
                })).collect::<Vec<_>>(),
                "vertices": found.vertices.iter().map(|&id| xml_id(model, id)).collect::<Vec<_>>(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn summary(canvas: &GraphCanvas) -> Value {
    let model = canvas.model();
    let clusters: std::collections::BTreeSet<_> =
        model.vertices().iter().filter_map(|v| v.cluster).collect();
    json!({
        "source": canvas.source().map(|p| p.display().to_string()),
        "directed": model.is_directed(),
        "vertices": model.vertex_count(),
        "edges": model.edge_count(),
        "clusters": clusters.len(),
        "width": canvas.fit_size().x,
        "height": canvas.fit_size().y,
    })
}

fn lookup(model: &GraphModel, xml_id: &str) -> Result<VertexId> {
    find_vertex(model, xml_id).ok_or_else(|| anyhow!("no vertex with id {:?}", xml_id))
}

/// GraphML id of a vertex, or its numeric id for vertices added in-session.
fn xml_id(model: &GraphModel, id: VertexId) -> String {
    match model.vertex(id).and_then(|v| v.attributes.get(ATTR_XML_ID)) {
        Some(AttrValue::Text(text)) => text.clone(),
        _ => id.to_string(),
    }
}
