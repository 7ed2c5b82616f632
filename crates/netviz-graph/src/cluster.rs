use crate::graph::GraphModel;
use netviz_core::{AlgorithmKind, CanvasError, ClusterId, Color, VertexId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

pub const DEFAULT_CLUSTERING: &str = "community_edge_betweenness";

/// Raw output of a community detection algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum Communities {
    /// Disjoint member lists covering the vertex set.
    Partition(Vec<Vec<VertexId>>),
    /// Hierarchical result; flatten with [`Dendrogram::as_clustering`].
    Dendrogram(Dendrogram),
}

impl Communities {
    pub fn into_partition(self) -> Vec<Vec<VertexId>> {
        match self {
            Communities::Partition(partition) => partition,
            Communities::Dendrogram(dendrogram) => dendrogram.as_clustering(),
        }
    }
}

/// Successive partitions from the coarsest to the finest, each scored by modularity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dendrogram {
    pub levels: Vec<Vec<Vec<VertexId>>>,
    pub modularity: Vec<f64>,
}

impl Dendrogram {
    pub fn push_level(&mut self, partition: Vec<Vec<VertexId>>, modularity: f64) {
        self.levels.push(partition);
        self.modularity.push(modularity);
    }

    /// The level with the highest modularity; the coarser level wins ties.
    pub fn optimal_level(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (level, &q) in self.modularity.iter().enumerate() {
            if best.is_none_or(|(_, best_q)| q > best_q + 1e-12) {
                best = Some((level, q));
            }
        }
        best.map(|(level, _)| level)
    }

    pub fn as_clustering(&self) -> Vec<Vec<VertexId>> {
        self.optimal_level()
            .and_then(|level| self.levels.get(level).cloned())
            .unwrap_or_default()
    }
}

pub trait Clusterer {
    /// `weights` is aligned with `model.edges()`.
    fn detect(&self, model: &GraphModel, weights: Option<&[f64]>, rng: &mut StdRng)
    -> Communities;
}

/// Cluster id per vertex plus one color per cluster, produced by a single run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterAssignment {
    pub clusters: BTreeMap<VertexId, ClusterId>,
    pub colors: BTreeMap<ClusterId, Color>,
}

impl ClusterAssignment {
    pub fn cluster_count(&self) -> usize {
        self.colors.len()
    }

    /// Write cluster ids and colors onto the vertices.
    pub fn apply(&self, model: &mut GraphModel) {
        for vertex in model.vertices_mut() {
            if let Some(&cluster) = self.clusters.get(&vertex.id) {
                vertex.cluster = Some(cluster);
                vertex.color = self.colors.get(&cluster).copied().unwrap_or_default();
            }
        }
    }
}

pub struct ClusterEngine {
    clusterers: BTreeMap<String, Box<dyn Clusterer>>,
    seed: u64,
}

impl ClusterEngine {
    pub fn new(seed: u64) -> Self {
        let mut engine = Self {
            clusterers: BTreeMap::new(),
            seed,
        };
        engine.register("community_edge_betweenness", EdgeBetweenness);
        engine.register("community_label_propagation", LabelPropagation::default());
        engine.register("community_multilevel", Multilevel);
        engine.register("connected_components", ConnectedComponents);
        engine
    }

    pub fn register(&mut self, name: &str, clusterer: impl Clusterer + 'static) {
        self.clusterers.insert(name.to_string(), Box::new(clusterer));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clusterers.keys().map(String::as_str)
    }

    /// Run the named algorithm. Cluster ids start at 1; 0 is left to vertices
    /// added by hand.
    pub fn compute(
        &self,
        model: &GraphModel,
        name: &str,
        weights: Option<&str>,
    ) -> Result<ClusterAssignment, CanvasError> {
        let clusterer = self
            .clusterers
            .get(name)
            .ok_or_else(|| CanvasError::UnknownAlgorithm {
                kind: AlgorithmKind::Clustering,
                name: name.to_string(),
            })?;

        let weight_values = weights.map(|attr| model.edge_weights(attr));
        let mut rng = StdRng::seed_from_u64(self.seed);
        let partition = clusterer
            .detect(model, weight_values.as_deref(), &mut rng)
            .into_partition();

        let mut clusters = BTreeMap::new();
        for vertex in model.vertices() {
            let index = partition
                .iter()
                .position(|members| members.contains(&vertex.id))
                .ok_or(CanvasError::OrphanVertex(vertex.id))?;
            clusters.insert(vertex.id, ClusterId(index as i64 + 1));
        }

        let colors = random_colors(clusters.values().copied(), &mut rng);
        tracing::info!(
            "{} found {} clusters over {} vertices",
            name,
            colors.len(),
            clusters.len()
        );
        Ok(ClusterAssignment { clusters, colors })
    }

    /// Color clusters that came with the graph file, without recomputing them.
    pub fn assign_colors(&self, model: &mut GraphModel) -> BTreeMap<ClusterId, Color> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let colors = random_colors(model.vertices().iter().filter_map(|v| v.cluster), &mut rng);
        for vertex in model.vertices_mut() {
            if let Some(cluster) = vertex.cluster {
                vertex.color = colors.get(&cluster).copied().unwrap_or_default();
            }
        }
        colors
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

fn random_colors(
    clusters: impl Iterator<Item = ClusterId>,
    rng: &mut StdRng,
) -> BTreeMap<ClusterId, Color> {
    let distinct: BTreeSet<ClusterId> = clusters.collect();
    distinct
        .into_iter()
        .map(|cluster| (cluster, Color::rgb(rng.r#gen(), rng.r#gen(), rng.r#gen())))
        .collect()
}

/// Undirected, index-based view of a model for the community algorithms.
struct Adjacency {
    ids: Vec<VertexId>,
    /// (neighbor, edge index) per vertex.
    neighbors: Vec<Vec<(usize, usize)>>,
    /// (source, target, weight) per edge index.
    edges: Vec<(usize, usize, f64)>,
}

impl Adjacency {
    fn new(model: &GraphModel, weights: Option<&[f64]>) -> Self {
        let ids: Vec<VertexId> = model.vertices().iter().map(|v| v.id).collect();
        let index: HashMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut neighbors = vec![Vec::new(); ids.len()];
        let mut edges = Vec::with_capacity(model.edge_count());
        for (e, edge) in model.edges().iter().enumerate() {
            let (s, t) = (index[&edge.source], index[&edge.target]);
            let w = weights.and_then(|w| w.get(e)).copied().unwrap_or(1.0);
            neighbors[s].push((t, e));
            neighbors[t].push((s, e));
            edges.push((s, t, w));
        }
        Self {
            ids,
            neighbors,
            edges,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Group vertices by label, ordered by first appearance.
    fn partition_by(&self, labels: &[usize]) -> Vec<Vec<VertexId>> {
        let mut order: Vec<usize> = Vec::new();
        let mut groups: HashMap<usize, Vec<VertexId>> = HashMap::new();
        for (i, &label) in labels.iter().enumerate() {
            groups
                .entry(label)
                .or_insert_with(|| {
                    order.push(label);
                    Vec::new()
                })
                .push(self.ids[i]);
        }
        order
            .into_iter()
            .filter_map(|label| groups.remove(&label))
            .collect()
    }

    /// Component label per vertex using only the edges flagged alive.
    fn components(&self, alive: &[bool]) -> (Vec<usize>, usize) {
        let mut labels = vec![usize::MAX; self.len()];
        let mut count = 0;
        for start in 0..self.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = count;
            let mut queue = VecDeque::from([start]);
            while let Some(v) = queue.pop_front() {
                for &(w, e) in &self.neighbors[v] {
                    if alive[e] && labels[w] == usize::MAX {
                        labels[w] = count;
                        queue.push_back(w);
                    }
                }
            }
            count += 1;
        }
        (labels, count)
    }

    fn modularity(&self, labels: &[usize]) -> f64 {
        let total: f64 = self.edges.iter().map(|&(_, _, w)| w).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let mut internal: HashMap<usize, f64> = HashMap::new();
        let mut degree: HashMap<usize, f64> = HashMap::new();
        for &(s, t, w) in &self.edges {
            if labels[s] == labels[t] {
                *internal.entry(labels[s]).or_default() += w;
            }
            *degree.entry(labels[s]).or_default() += w;
            *degree.entry(labels[t]).or_default() += w;
        }
        degree
            .iter()
            .map(|(label, &d)| {
                let l = internal.get(label).copied().unwrap_or(0.0);
                l / total - (d / (2.0 * total)).powi(2)
            })
            .sum()
    }

    /// Brandes edge betweenness over alive edges; weights act as lengths.
    fn edge_betweenness(&self, alive: &[bool], weighted: bool) -> Vec<f64> {
        const EPS: f64 = 1e-12;
        let n = self.len();
        let mut score = vec![0.0; self.edges.len()];

        for source in 0..n {
            let mut dist = vec![f64::INFINITY; n];
            let mut sigma = vec![0.0f64; n];
            let mut preds: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
            let mut settled = vec![false; n];
            let mut order = Vec::with_capacity(n);
            dist[source] = 0.0;
            sigma[source] = 1.0;

            // Simple O(n^2) Dijkstra; unit lengths make it a BFS.
            loop {
                let next = (0..n)
                    .filter(|&v| !settled[v] && dist[v].is_finite())
                    .min_by(|&a, &b| dist[a].total_cmp(&dist[b]));
                let Some(v) = next else { break };
                settled[v] = true;
                order.push(v);
                for &(w, e) in &self.neighbors[v] {
                    if !alive[e] || settled[w] {
                        continue;
                    }
                    let length = if weighted {
                        self.edges[e].2.max(EPS)
                    } else {
                        1.0
                    };
                    let candidate = dist[v] + length;
                    if candidate < dist[w] - EPS {
                        dist[w] = candidate;
                        sigma[w] = sigma[v];
                        preds[w].clear();
                        preds[w].push((v, e));
                    } else if (candidate - dist[w]).abs() <= EPS {
                        sigma[w] += sigma[v];
                        preds[w].push((v, e));
                    }
                }
            }

            let mut delta = vec![0.0f64; n];
            for &w in order.iter().rev() {
                for &(v, e) in &preds[w] {
                    let share = sigma[v] / sigma[w] * (1.0 + delta[w]);
                    score[e] += share;
                    delta[v] += share;
                }
            }
        }
        score
    }
}

/// Girvan-Newman: repeatedly drop the edge with the highest betweenness and
/// record a level whenever the component count grows.
pub struct EdgeBetweenness;

impl Clusterer for EdgeBetweenness {
    fn detect(
        &self,
        model: &GraphModel,
        weights: Option<&[f64]>,
        _rng: &mut StdRng,
    ) -> Communities {
        let adjacency = Adjacency::new(model, weights);
        let mut alive = vec![true; adjacency.edges.len()];
        let mut dendrogram = Dendrogram::default();

        let (labels, mut components) = adjacency.components(&alive);
        dendrogram.push_level(adjacency.partition_by(&labels), adjacency.modularity(&labels));

        for _ in 0..alive.len() {
            let scores = adjacency.edge_betweenness(&alive, weights.is_some());
            let victim = scores
                .iter()
                .enumerate()
                .filter(|(e, _)| alive[*e])
                .fold(None, |best: Option<(usize, f64)>, (e, &s)| match best {
                    Some((_, best_s)) if s <= best_s + 1e-9 => best,
                    _ => Some((e, s)),
                });
            let Some((victim, _)) = victim else { break };
            alive[victim] = false;

            let (labels, count) = adjacency.components(&alive);
            if count > components {
                components = count;
                dendrogram
                    .push_level(adjacency.partition_by(&labels), adjacency.modularity(&labels));
            }
        }

        tracing::debug!(
            "edge betweenness dendrogram has {} levels",
            dendrogram.levels.len()
        );
        Communities::Dendrogram(dendrogram)
    }
}

/// Asynchronous label propagation; a vertex keeps its label while it is
/// among the heaviest labels around it.
pub struct LabelPropagation {
    pub max_rounds: usize,
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self { max_rounds: 100 }
    }
}

impl Clusterer for LabelPropagation {
    fn detect(&self, model: &GraphModel, weights: Option<&[f64]>, rng: &mut StdRng) -> Communities {
        let adjacency = Adjacency::new(model, weights);
        let mut labels: Vec<usize> = (0..adjacency.len()).collect();
        let mut order: Vec<usize> = (0..adjacency.len()).collect();

        for _ in 0..self.max_rounds {
            order.shuffle(rng);
            let mut changed = false;
            for &v in &order {
                let mut tally: BTreeMap<usize, f64> = BTreeMap::new();
                for &(w, e) in &adjacency.neighbors[v] {
                    *tally.entry(labels[w]).or_default() += adjacency.edges[e].2;
                }
                let Some(best) = tally.values().copied().reduce(f64::max) else {
                    continue;
                };
                let dominant: Vec<usize> = tally
                    .iter()
                    .filter(|&(_, &weight)| (weight - best).abs() <= 1e-12)
                    .map(|(&label, _)| label)
                    .collect();
                if dominant.contains(&labels[v]) {
                    continue;
                }
                if let Some(&label) = dominant.choose(rng) {
                    labels[v] = label;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Communities::Partition(adjacency.partition_by(&labels))
    }
}

/// Louvain modularity optimisation: local moving followed by aggregation
/// until no vertex moves.
pub struct Multilevel;

impl Clusterer for Multilevel {
    fn detect(
        &self,
        model: &GraphModel,
        weights: Option<&[f64]>,
        _rng: &mut StdRng,
    ) -> Communities {
        let adjacency = Adjacency::new(model, weights);
        let mut membership: Vec<usize> = (0..adjacency.len()).collect();
        let mut level = WeightedGraph::from_edges(adjacency.len(), &adjacency.edges);

        loop {
            let Some((community, count)) = level.local_moving() else {
                break;
            };
            for m in membership.iter_mut() {
                *m = community[*m];
            }
            level = level.aggregate(&community, count);
        }

        Communities::Partition(adjacency.partition_by(&membership))
    }
}

struct WeightedGraph {
    adj: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl WeightedGraph {
    fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut graph = Self {
            adj: vec![Vec::new(); n],
            self_loops: vec![0.0; n],
        };
        for &(s, t, w) in edges {
            let w = w.max(0.0);
            if s == t {
                graph.self_loops[s] += w;
            } else {
                graph.adj[s].push((t, w));
                graph.adj[t].push((s, w));
            }
        }
        graph
    }

    fn strength(&self, i: usize) -> f64 {
        self.adj[i].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[i]
    }

    /// Move nodes between communities while modularity improves. Returns the
    /// renumbered community per node, or `None` when nothing moved.
    fn local_moving(&self) -> Option<(Vec<usize>, usize)> {
        let n = self.adj.len();
        let strength: Vec<f64> = (0..n).map(|i| self.strength(i)).collect();
        let m2: f64 = strength.iter().sum();
        if m2 <= 0.0 {
            return None;
        }

        let mut community: Vec<usize> = (0..n).collect();
        let mut total = strength.clone();
        let mut moved_any = false;

        loop {
            let mut moved = false;
            for i in 0..n {
                let current = community[i];
                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &self.adj[i] {
                    *links.entry(community[j]).or_default() += w;
                }

                total[current] -= strength[i];
                let gain = |c: usize, links_to: f64| links_to - total[c] * strength[i] / m2;
                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&c, &links_to) in &links {
                    let g = gain(c, links_to);
                    if g > best_gain + 1e-12 {
                        best = c;
                        best_gain = g;
                    }
                }
                total[best] += strength[i];
                if best != current {
                    community[i] = best;
                    moved = true;
                    moved_any = true;
                }
            }
            if !moved {
                break;
            }
        }

        if !moved_any {
            return None;
        }
        let mut renumber: HashMap<usize, usize> = HashMap::new();
        for c in community.iter_mut() {
            let next = renumber.len();
            *c = *renumber.entry(*c).or_insert(next);
        }
        Some((community, renumber.len()))
    }

    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut self_loops = vec![0.0; count];
        let mut links: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (i, neighbors) in self.adj.iter().enumerate() {
            let ci = community[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in neighbors {
                let cj = community[j];
                if ci == cj {
                    // each internal edge is seen from both ends
                    self_loops[ci] += w / 2.0;
                } else {
                    *links.entry((ci, cj)).or_default() += w;
                }
            }
        }
        let mut adj = vec![Vec::new(); count];
        for ((a, b), w) in links {
            adj[a].push((b, w));
        }
        Self { adj, self_loops }
    }
}

pub struct ConnectedComponents;

impl Clusterer for ConnectedComponents {
    fn detect(
        &self,
        model: &GraphModel,
        _weights: Option<&[f64]>,
        _rng: &mut StdRng,
    ) -> Communities {
        let adjacency = Adjacency::new(model, None);
        let alive = vec![true; adjacency.edges.len()];
        let (labels, _) = adjacency.components(&alive);
        Communities::Partition(adjacency.partition_by(&labels))
    }
}
