use crate::graph::GraphModel;
use netviz_core::{AlgorithmKind, CanvasError, Vec2, VertexId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::f32::consts::PI;

pub const DEFAULT_LAYOUT: &str = "layout_lgl";

/// Layout algorithms that take edge weights. Every other algorithm ignores them.
pub const WEIGHTED_LAYOUTS: &[&str] = &["layout_drl", "layout_fruchterman_reingold"];

pub trait Layouter {
    /// Compute a position for every vertex. `weights` is aligned with
    /// `model.edges()` and only supplied to weighted algorithms.
    fn execute(
        &self,
        model: &GraphModel,
        weights: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> HashMap<VertexId, Vec2>;
}

/// Name-addressed registry of layout algorithms.
pub struct LayoutEngine {
    layouters: BTreeMap<String, Box<dyn Layouter>>,
    seed: u64,
}

impl LayoutEngine {
    pub fn new(seed: u64) -> Self {
        let mut engine = Self {
            layouters: BTreeMap::new(),
            seed,
        };
        engine.register("layout_circle", CircleLayout);
        engine.register("layout_grid", GridLayout);
        engine.register("layout_random", RandomLayout);
        engine.register("layout_lgl", ForceDirectedLayout::large_graph());
        engine.register(
            "layout_fruchterman_reingold",
            ForceDirectedLayout::fruchterman_reingold(),
        );
        engine.register("layout_drl", ForceDirectedLayout::distributed_recursive());
        engine
    }

    pub fn register(&mut self, name: &str, layouter: impl Layouter + 'static) {
        self.layouters.insert(name.to_string(), Box::new(layouter));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouters.keys().map(String::as_str)
    }

    pub fn is_weighted(name: &str) -> bool {
        WEIGHTED_LAYOUTS.contains(&name)
    }

    /// Run the named algorithm. `weights` names a numeric edge attribute and is
    /// only consulted for algorithms on the weighted allow-list.
    pub fn compute(
        &self,
        model: &GraphModel,
        name: &str,
        weights: Option<&str>,
    ) -> Result<HashMap<VertexId, Vec2>, CanvasError> {
        let layouter = self
            .layouters
            .get(name)
            .ok_or_else(|| CanvasError::UnknownAlgorithm {
                kind: AlgorithmKind::Layout,
                name: name.to_string(),
            })?;

        let weight_values = match weights {
            Some(attr) if Self::is_weighted(name) => Some(model.edge_weights(attr)),
            Some(attr) => {
                tracing::debug!("{} ignores edge weights ('{}')", name, attr);
                None
            }
            None => None,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let positions = layouter.execute(model, weight_values.as_deref(), &mut rng);
        tracing::info!(
            "Computed {} for {} vertices",
            name,
            positions.len()
        );
        Ok(positions)
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Translate positions to the non-negative quadrant and scale them onto a
/// `canvas_height`-tall area whose width keeps the layout's aspect ratio.
///
/// Returns the fit size. A zero extent on either axis counts as a square layout.
pub fn normalize_and_fit(model: &mut GraphModel, canvas_height: f32) -> Vec2 {
    if model.is_empty() {
        return Vec2::new(canvas_height, canvas_height);
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    for vertex in model.vertices() {
        min_x = min_x.min(vertex.position.x);
        min_y = min_y.min(vertex.position.y);
    }
    let (mut max_x, mut max_y) = (0.0f32, 0.0f32);
    for vertex in model.vertices_mut() {
        vertex.position.x -= min_x;
        vertex.position.y -= min_y;
        max_x = max_x.max(vertex.position.x);
        max_y = max_y.max(vertex.position.y);
    }

    let ratio = if max_x > 0.0 && max_y > 0.0 {
        max_x / max_y
    } else {
        1.0
    };
    let size = Vec2::new(canvas_height * ratio, canvas_height);
    let scale_x = if max_x > 0.0 { size.x / max_x } else { 1.0 };
    let scale_y = if max_y > 0.0 { size.y / max_y } else { 1.0 };
    for vertex in model.vertices_mut() {
        vertex.position.x *= scale_x;
        vertex.position.y *= scale_y;
    }
    size
}

pub struct CircleLayout;

impl Layouter for CircleLayout {
    fn execute(
        &self,
        model: &GraphModel,
        _weights: Option<&[f64]>,
        _rng: &mut StdRng,
    ) -> HashMap<VertexId, Vec2> {
        let n = model.vertex_count().max(1) as f32;
        model
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let angle = 2.0 * PI * i as f32 / n;
                (v.id, Vec2::new(angle.cos(), angle.sin()))
            })
            .collect()
    }
}

pub struct GridLayout;

impl Layouter for GridLayout {
    fn execute(
        &self,
        model: &GraphModel,
        _weights: Option<&[f64]>,
        _rng: &mut StdRng,
    ) -> HashMap<VertexId, Vec2> {
        let width = (model.vertex_count() as f32).sqrt().ceil().max(1.0) as usize;
        model
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, Vec2::new((i % width) as f32, (i / width) as f32)))
            .collect()
    }
}

pub struct RandomLayout;

impl Layouter for RandomLayout {
    fn execute(
        &self,
        model: &GraphModel,
        _weights: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> HashMap<VertexId, Vec2> {
        model
            .vertices()
            .iter()
            .map(|v| (v.id, Vec2::new(rng.r#gen(), rng.r#gen())))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPlacement {
    Random,
    /// Concentric rings by hop distance from the highest-degree vertex.
    BreadthFirst,
}

/// Fruchterman-Reingold spring embedder; the presets differ in starting
/// placement, iteration budget and cooling.
#[derive(Debug, Clone)]
pub struct ForceDirectedLayout {
    pub iterations: usize,
    pub initial: InitialPlacement,
    /// Starting step size as a fraction of the layout radius.
    pub start_temperature: f32,
}

impl ForceDirectedLayout {
    const MIN_DISTANCE: f32 = 0.01;

    pub fn fruchterman_reingold() -> Self {
        Self {
            iterations: 500,
            initial: InitialPlacement::Random,
            start_temperature: 0.1,
        }
    }

    pub fn large_graph() -> Self {
        Self {
            iterations: 150,
            initial: InitialPlacement::BreadthFirst,
            start_temperature: 0.05,
        }
    }

    pub fn distributed_recursive() -> Self {
        Self {
            iterations: 800,
            initial: InitialPlacement::Random,
            start_temperature: 0.2,
        }
    }

    fn initial_positions(&self, model: &GraphModel, rng: &mut StdRng) -> Vec<Vec2> {
        let n = model.vertex_count();
        let radius = (n as f32).sqrt();
        match self.initial {
            InitialPlacement::Random => (0..n)
                .map(|_| {
                    Vec2::new(
                        rng.gen_range(-radius..=radius),
                        rng.gen_range(-radius..=radius),
                    )
                })
                .collect(),
            InitialPlacement::BreadthFirst => {
                let rings = breadth_first_rings(model);
                let mut by_ring: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
                for (idx, ring) in rings.iter().enumerate() {
                    by_ring.entry(*ring).or_default().push(idx);
                }
                let mut positions = vec![Vec2::ZERO; n];
                for (ring, members) in by_ring {
                    let count = members.len() as f32;
                    let offset: f32 = rng.gen_range(0.0..2.0 * PI);
                    for (k, idx) in members.into_iter().enumerate() {
                        let angle = offset + 2.0 * PI * k as f32 / count;
                        let r = ring as f32;
                        positions[idx] = Vec2::new(r * angle.cos(), r * angle.sin());
                    }
                }
                positions
            }
        }
    }
}

impl Layouter for ForceDirectedLayout {
    fn execute(
        &self,
        model: &GraphModel,
        weights: Option<&[f64]>,
        rng: &mut StdRng,
    ) -> HashMap<VertexId, Vec2> {
        let n = model.vertex_count();
        if n == 0 {
            return HashMap::new();
        }

        let index: HashMap<VertexId, usize> = model
            .vertices()
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();
        let springs: Vec<(usize, usize, f32)> = model
            .edges()
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let w = weights
                    .and_then(|w| w.get(i))
                    .copied()
                    .unwrap_or(1.0)
                    .max(0.0) as f32;
                (index[&e.source], index[&e.target], w)
            })
            .collect();

        let mut positions = self.initial_positions(model, rng);
        let k = 1.0f32;
        let radius = (n as f32).sqrt();
        let start_temperature = self.start_temperature * radius.max(1.0) * 10.0;

        for iteration in 0..self.iterations {
            let mut displacement = vec![Vec2::ZERO; n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let mut delta = positions[i] - positions[j];
                    if delta.length() < Self::MIN_DISTANCE {
                        delta = Vec2::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));
                    }
                    let dist = delta.length().max(Self::MIN_DISTANCE);
                    let push = delta / dist * (k * k / dist);
                    displacement[i] += push;
                    displacement[j] = displacement[j] - push;
                }
            }

            for &(s, t, w) in &springs {
                let delta = positions[s] - positions[t];
                let dist = delta.length().max(Self::MIN_DISTANCE);
                let pull = delta / dist * (dist * dist / k * w);
                displacement[s] = displacement[s] - pull;
                displacement[t] += pull;
            }

            let temperature =
                start_temperature * (1.0 - iteration as f32 / self.iterations as f32);
            for (pos, disp) in positions.iter_mut().zip(&displacement) {
                let len = disp.length();
                if len > 0.0 && len.is_finite() {
                    *pos += *disp / len * len.min(temperature);
                }
            }
        }

        model
            .vertices()
            .iter()
            .zip(positions)
            .map(|(v, p)| (v.id, p))
            .collect()
    }
}

/// Hop distance from the highest-degree vertex, per vertex in model order.
/// Disconnected parts continue outward from the furthest ring reached so far.
fn breadth_first_rings(model: &GraphModel) -> Vec<usize> {
    let vertices = model.vertices();
    let index: HashMap<VertexId, usize> =
        vertices.iter().enumerate().map(|(i, v)| (v.id, i)).collect();
    let mut rings: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut order: Vec<usize> = (0..vertices.len()).collect();
    order.sort_by(|&a, &b| vertices[b].degree.cmp(&vertices[a].degree).then(a.cmp(&b)));

    let mut base = 0;
    for start in order {
        if rings[start].is_some() {
            continue;
        }
        rings[start] = Some(base);
        let mut furthest = base;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let ring = rings[current].unwrap_or(base);
            furthest = furthest.max(ring);
            for (_, neighbor) in model.neighbors(vertices[current].id) {
                let idx = index[&neighbor];
                if rings[idx].is_none() {
                    rings[idx] = Some(ring + 1);
                    queue.push_back(idx);
                }
            }
        }
        base = furthest + 1;
    }

    rings.into_iter().map(|r| r.unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{graph_from, path_graph};

    #[test]
    fn test_unknown_algorithm() {
        let engine = LayoutEngine::default();
        let model = path_graph(3);
        let err = engine.compute(&model, "layout_sugiyama_3000", None).unwrap_err();
        assert_eq!(
            err,
            CanvasError::UnknownAlgorithm {
                kind: AlgorithmKind::Layout,
                name: "layout_sugiyama_3000".into(),
            }
        );
    }

    #[test]
    fn test_every_builtin_positions_every_vertex() {
        let engine = LayoutEngine::new(7);
        let model = graph_from(
            &[(0.0, 0.0); 6],
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5)],
        );
        let names: Vec<String> = engine.names().map(str::to_string).collect();
        assert!(names.contains(&DEFAULT_LAYOUT.to_string()));
        for name in names {
            let positions = engine.compute(&model, &name, Some("total_delay")).unwrap();
            assert_eq!(positions.len(), 6, "{} missed vertices", name);
            assert!(
                positions.values().all(|p| p.x.is_finite() && p.y.is_finite()),
                "{} produced non-finite coordinates",
                name
            );
        }
    }

    #[test]
    fn test_layout_is_reproducible_for_a_seed() {
        let model = path_graph(5);
        let a = LayoutEngine::new(3)
            .compute(&model, "layout_fruchterman_reingold", None)
            .unwrap();
        let b = LayoutEngine::new(3)
            .compute(&model, "layout_fruchterman_reingold", None)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_weighted_allow_list() {
        assert!(LayoutEngine::is_weighted("layout_drl"));
        assert!(LayoutEngine::is_weighted("layout_fruchterman_reingold"));
        assert!(!LayoutEngine::is_weighted("layout_lgl"));
    }

    #[test]
    fn test_normalize_and_fit() {
        let mut model = graph_from(&[(-10.0, -5.0), (10.0, 5.0), (0.0, 0.0)], &[]);
        let size = normalize_and_fit(&mut model, 500.0);

        assert_eq!(size, Vec2::new(1000.0, 500.0));
        let positions: Vec<Vec2> = model.vertices().iter().map(|v| v.position).collect();
        assert_eq!(positions[0], Vec2::new(0.0, 0.0));
        assert_eq!(positions[1], Vec2::new(1000.0, 500.0));
        assert_eq!(positions[2], Vec2::new(500.0, 250.0));
    }

    #[test]
    fn test_normalize_degenerate_extent() {
        let mut model = graph_from(&[(3.0, 7.0)], &[]);
        let size = normalize_and_fit(&mut model, 500.0);
        assert_eq!(size, Vec2::new(500.0, 500.0));
        assert_eq!(model.vertices()[0].position, Vec2::ZERO);

        let mut line = graph_from(&[(0.0, 2.0), (4.0, 2.0)], &[]);
        let size = normalize_and_fit(&mut line, 500.0);
        assert_eq!(size, Vec2::new(500.0, 500.0));
        assert_eq!(line.vertices()[1].position, Vec2::new(500.0, 0.0));
    }

    #[test]
    fn test_breadth_first_rings() {
        let model = path_graph(4);
        // vertex 1 (degree 2) is the first highest-degree vertex
        assert_eq!(breadth_first_rings(&model), vec![1, 0, 1, 2]);
    }
}
