use std::cmp::Reverse;

use fixedbitset::FixedBitSet;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use tracing::{debug, info, instrument, trace};

use crate::edge::Edge;
use crate::graph::Graph;
use crate::label::{LabelArena, LabelHandle};

/// The path the engine returns when a solve finds an improving column.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalPath {
    pub reduced_cost: f64,
    pub shortest_path: Vec<usize>,
    pub original_cost: f64,
}

/// Result of a single [`LabelSettingEngine::solve`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// A resource-feasible elementary path from source to sink was found.
    Optimal(OptimalPath),
    /// The sink bucket is empty: no feasible path exists at all.
    NoImprovingPath,
    /// A popped-label budget was exhausted before the frontier drained.
    /// `best_so_far` holds whatever the sink bucket contained at that point.
    BudgetExceeded { best_so_far: Option<OptimalPath> },
}

impl SolveOutcome {
    pub fn is_improving(&self) -> bool {
        matches!(self, SolveOutcome::Optimal(p) if p.reduced_cost < 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierKey {
    reduced_cost: OrderedFloat<f64>,
    routing_time: OrderedFloat<f64>,
    demand: OrderedFloat<f64>,
    sequence: u64,
}

/// The monotone best-first label-setting search for ESPPRC.
///
/// Owns a private copy of the input [`Graph`] (optionally mutated by one
/// branching decision) so that repeated calls to [`LabelSettingEngine::solve`]
/// with different dual vectors never leak mutation back to the caller's graph.
pub struct LabelSettingEngine {
    graph: Graph,
    capacity: f64,
    arena: LabelArena,
    frontier: PriorityQueue<LabelHandle, Reverse<FrontierKey>>,
    buckets: Vec<Vec<LabelHandle>>,
    live: Vec<bool>,
    insertion_seq: u64,
}

impl LabelSettingEngine {
    /// Builds an engine over a deep copy of `graph`, optionally applying one
    /// branch-and-price decision `(arc, value)` before any solve runs.
    pub fn new(graph: &Graph, capacity: f64, branch: Option<((usize, usize), u8)>) -> Self {
        let mut graph = graph.clone();
        if let Some((arc, value)) = branch {
            graph.apply_branch(arc, value);
        }
        let num_nodes = graph.num_nodes();
        Self {
            graph,
            capacity,
            arena: LabelArena::new(),
            frontier: PriorityQueue::new(),
            buckets: vec![Vec::new(); num_nodes],
            live: Vec::new(),
            insertion_seq: 0,
        }
    }

    /// Restores internal search state (frontier, buckets, arena) but not the
    /// graph or any branching decision applied at construction.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.frontier.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.live.clear();
        self.insertion_seq = 0;
    }

    /// Runs one solve to completion; equivalent to
    /// `solve_with_budget(dual, None)`.
    pub fn solve(&mut self, dual: &[f64]) -> SolveOutcome {
        self.solve_with_budget(dual, None)
    }

    /// Runs one solve, stopping early once `max_popped` labels have been
    /// popped from the frontier (if given). On early stop, whatever the sink
    /// bucket currently holds is returned as `BudgetExceeded`.
    #[instrument(skip(self, dual))]
    pub fn solve_with_budget(&mut self, dual: &[f64], max_popped: Option<usize>) -> SolveOutcome {
        self.reset();
        self.graph.revise_costs(dual);
        debug!(num_nodes = self.graph.num_nodes(), "revised arc costs");

        let n = self.graph.num_nodes();
        let mut all_reachable = FixedBitSet::with_capacity(n);
        all_reachable.set_range(.., true);
        let (seed_reachable, seed_reachable_count) =
            self.compute_reachability(&all_reachable, 0, 0.0, 0.0);
        let seed = self.new_seed_label(seed_reachable);
        debug!(seed_reachable_count, "constructed seed label");
        self.submit(seed);

        const PROGRESS_INTERVAL: usize = 100;
        let mut popped = 0usize;
        let mut budget_exceeded = false;
        while let Some((handle, _)) = self.frontier.pop() {
            if !self.live[handle as usize] {
                continue;
            }
            if let Some(max) = max_popped {
                if popped >= max {
                    budget_exceeded = true;
                    break;
                }
            }
            popped += 1;
            if popped % PROGRESS_INTERVAL == 0 {
                let bucket_total: usize = self.buckets.iter().map(Vec::len).sum();
                trace!(popped, bucket_total, "frontier progress");
            }
            self.extend_label(handle);
        }
        info!(popped, budget_exceeded, "frontier drained");

        self.extract_outcome(budget_exceeded)
    }

    #[instrument(skip(self))]
    fn extract_outcome(&self, budget_exceeded: bool) -> SolveOutcome {
        let sink = self.graph.num_nodes() - 1;
        let best = self.buckets[sink].first().copied();
        let optimal = best.map(|handle| {
            let label = self.arena.get(handle);
            let path = self.arena.visited_path(handle);
            let original_cost = self.graph.original_cost_of_path(&path);
            OptimalPath {
                reduced_cost: label.reduced_cost,
                shortest_path: path,
                original_cost,
            }
        });
        debug!(found = optimal.is_some(), "extracted outcome from sink bucket");

        match (optimal, budget_exceeded) {
            (Some(path), false) => SolveOutcome::Optimal(path),
            (path, true) => SolveOutcome::BudgetExceeded { best_so_far: path },
            (None, false) => SolveOutcome::NoImprovingPath,
        }
    }

    fn new_seed_label(&mut self, reachable: FixedBitSet) -> LabelHandle {
        let handle = self.arena.insert_seed(0, reachable);
        self.live.push(true);
        handle
    }

    #[allow(clippy::too_many_arguments)]
    fn new_successor_label(
        &mut self,
        node: usize,
        reduced_cost: f64,
        routing_time: f64,
        demand: f64,
        predecessor: LabelHandle,
        reachable: FixedBitSet,
    ) -> LabelHandle {
        let handle = self
            .arena
            .insert_successor(node, reduced_cost, routing_time, demand, predecessor, reachable);
        self.live.push(true);
        handle
    }

    /// Computes the reachability bitset for a label at `node` with the given
    /// accumulated `time`/`demand`, starting from `base` (the predecessor's
    /// reachability, or the all-true bitset for the seed).
    fn compute_reachability(
        &self,
        base: &FixedBitSet,
        node: usize,
        time: f64,
        demand: f64,
    ) -> (FixedBitSet, usize) {
        let mut reachable = base.clone();
        reachable.set(node, false);
        for edge in self.graph.outgoing(node) {
            let w = edge.to;
            if !reachable.contains(w) {
                continue;
            }
            let node_w = self.graph.node(w);
            let candidate_demand = demand + node_w.demand as f64;
            let candidate_time = time + node_w.service_time as f64 + edge.routing_time as f64;
            if candidate_demand > self.capacity || candidate_time > node_w.latest as f64 {
                reachable.set(w, false);
            }
        }
        let count = reachable.count_ones(..);
        (reachable, count)
    }

    fn extend_label(&mut self, handle: LabelHandle) {
        let node = self.arena.get(handle).node;
        let edges: Vec<Edge> = self.graph.outgoing(node).to_vec();
        for edge in &edges {
            self.try_extend(handle, edge);
        }
    }

    #[instrument(skip(self), fields(from = handle, to = edge.to))]
    fn try_extend(&mut self, handle: LabelHandle, edge: &Edge) {
        let label = self.arena.get(handle);
        if !label.is_reachable(edge.to) {
            return;
        }

        let node_v = *self.graph.node(edge.to);
        let demand = label.demand + node_v.demand as f64;
        let t_raw = label.routing_time + node_v.service_time as f64 + edge.routing_time as f64;
        let time = if t_raw < node_v.earliest as f64 {
            node_v.earliest as f64
        } else {
            t_raw
        };

        debug_assert!(
            demand <= self.capacity + 1e-9,
            "reachability should have excluded over-capacity extensions"
        );
        debug_assert!(
            time <= node_v.latest as f64 + 1e-9,
            "reachability should have excluded time-infeasible extensions"
        );

        let reduced_cost = label.reduced_cost + self.graph.revised_cost(edge.from, edge.to);
        let base_reachable = label.reachable_bits().clone();
        let (reachable, _) = self.compute_reachability(&base_reachable, edge.to, time, demand);

        trace!(reduced_cost, time, demand, "extended label");
        let successor =
            self.new_successor_label(edge.to, reduced_cost, time, demand, handle, reachable);
        self.submit(successor);
    }

    fn push_frontier(&mut self, handle: LabelHandle) {
        let label = self.arena.get(handle);
        let key = FrontierKey {
            reduced_cost: OrderedFloat(label.reduced_cost),
            routing_time: OrderedFloat(label.routing_time),
            demand: OrderedFloat(label.demand),
            sequence: self.insertion_seq,
        };
        self.insertion_seq += 1;
        self.frontier.push(handle, Reverse(key));
    }

    /// Single-pass dominance check and bucket update for a freshly created
    /// candidate label. See the module-level design notes for why an early
    /// "candidate is dominated" exit can leave unscanned bucket entries
    /// behind; this mirrors the reference label-setting implementation.
    fn submit(&mut self, candidate: LabelHandle) {
        let node = self.arena.get(candidate).node;
        let is_sink = node == self.graph.num_nodes() - 1;
        let original_bucket = self.buckets[node].clone();

        let mut survivor_may_be_dominated = true;
        let mut keep = Vec::with_capacity(original_bucket.len() + 1);
        let mut candidate_dominated = false;

        for q in original_bucket {
            let candidate_dominates_q = self.arena.get(candidate).dominates(self.arena.get(q), is_sink);
            if candidate_dominates_q {
                if survivor_may_be_dominated && self.arena.labels_equal(candidate, q) {
                    // Exact duplicate of an already-processed label: drop the
                    // candidate and leave the bucket exactly as it was.
                    return;
                }
                self.live[q as usize] = false;
                survivor_may_be_dominated = false;
                continue;
            }

            keep.push(q);
            if survivor_may_be_dominated && self.arena.get(q).dominates(self.arena.get(candidate), is_sink) {
                candidate_dominated = true;
                break;
            }
        }

        if candidate_dominated {
            self.live[candidate as usize] = false;
        } else {
            keep.push(candidate);
            if !is_sink {
                self.push_frontier(candidate);
            }
        }

        self.buckets[node] = keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::node::Node;

    fn node(id: usize, earliest: i64, latest: i64, demand: u64, service: i64) -> Node {
        Node::new(id, 0, 0, demand, earliest, latest, service)
    }

    fn three_node_graph() -> Graph {
        let nodes = vec![
            node(0, 0, 1000, 0, 0),
            node(1, 0, 100, 10, 5),
            node(2, 0, 1000, 0, 0),
        ];
        let adjacency = vec![
            vec![Edge::new(0, 1, 10.0, 10), Edge::new(0, 2, 100.0, 10)],
            vec![Edge::new(1, 2, 20.0, 10)],
            vec![],
        ];
        Graph::construct(nodes, adjacency).unwrap()
    }

    #[test]
    fn three_node_trivial_with_zero_dual() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => {
                assert_eq!(path.shortest_path, vec![0, 1, 2]);
                assert_eq!(path.original_cost, 30.0);
                assert_eq!(path.reduced_cost, 30.0);
            }
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn dual_rewarding_node_1_reduces_cost() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0, 25.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => {
                assert_eq!(path.shortest_path, vec![0, 1, 2]);
                assert_eq!(path.original_cost, 30.0);
                assert_eq!(path.reduced_cost, 5.0);
            }
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn tight_time_window_forces_detour() {
        // latest(1) = 8 makes (0,1) time-infeasible (arrival at 1 is 0+5+10=15).
        let nodes = vec![
            node(0, 0, 1000, 0, 0),
            node(1, 0, 8, 10, 5),
            node(2, 0, 1000, 0, 0),
        ];
        let adjacency = vec![
            vec![Edge::new(0, 1, 10.0, 10), Edge::new(0, 2, 100.0, 10)],
            vec![Edge::new(1, 2, 20.0, 10)],
            vec![],
        ];
        let graph = Graph::construct(nodes, adjacency).unwrap();

        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => {
                assert_eq!(path.shortest_path, vec![0, 2]);
                assert_eq!(path.original_cost, 100.0);
            }
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn capacity_cut_forces_detour() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 5.0, None);
        let outcome = engine.solve(&[0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => {
                assert_eq!(path.shortest_path, vec![0, 2]);
                assert_eq!(path.original_cost, 100.0);
            }
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn branching_forces_arc_through_node_2() {
        let nodes = vec![
            node(0, 0, 1000, 0, 0),
            node(1, 0, 1000, 0, 0),
            node(2, 0, 1000, 0, 0),
            node(3, 0, 1000, 0, 0),
        ];
        let adjacency = vec![
            vec![Edge::new(0, 1, 1.0, 1), Edge::new(0, 2, 5.0, 1)],
            vec![Edge::new(1, 3, 1.0, 1)],
            vec![Edge::new(2, 3, 1.0, 1)],
            vec![],
        ];
        let graph = Graph::construct(nodes, adjacency).unwrap();

        let mut engine = LabelSettingEngine::new(&graph, 100.0, Some(((0, 2), 1)));
        let outcome = engine.solve(&[0.0, 0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => assert_eq!(path.shortest_path, vec![0, 2, 3]),
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn forbidding_an_arc_excludes_it_from_the_result() {
        let nodes = vec![
            node(0, 0, 1000, 0, 0),
            node(1, 0, 1000, 0, 0),
            node(2, 0, 1000, 0, 0),
            node(3, 0, 1000, 0, 0),
        ];
        let adjacency = vec![
            vec![Edge::new(0, 1, 1.0, 1), Edge::new(0, 2, 5.0, 1)],
            vec![Edge::new(1, 3, 1.0, 1)],
            vec![Edge::new(2, 3, 1.0, 1)],
            vec![],
        ];
        let graph = Graph::construct(nodes, adjacency).unwrap();

        let mut engine = LabelSettingEngine::new(&graph, 100.0, Some(((0, 1), 0)));
        let outcome = engine.solve(&[0.0, 0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => assert_eq!(path.shortest_path, vec![0, 2, 3]),
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn single_node_instance_returns_trivial_path() {
        let nodes = vec![node(0, 0, 1000, 0, 0)];
        let adjacency = vec![vec![]];
        let graph = Graph::construct(nodes, adjacency).unwrap();

        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => {
                assert_eq!(path.shortest_path, vec![0]);
                assert_eq!(path.reduced_cost, 0.0);
                assert_eq!(path.original_cost, 0.0);
            }
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn source_with_no_outgoing_edges_has_no_path() {
        let nodes = vec![node(0, 0, 1000, 0, 0), node(1, 0, 1000, 0, 0)];
        let adjacency = vec![vec![], vec![]];
        let graph = Graph::construct(nodes, adjacency).unwrap();

        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0, 0.0]);
        assert_eq!(outcome, SolveOutcome::NoImprovingPath);
    }

    #[test]
    fn nonnegative_costs_and_zero_dual_give_nonnegative_reduced_cost() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve(&[0.0, 0.0, 0.0]);
        match outcome {
            SolveOutcome::Optimal(path) => assert!(path.reduced_cost >= 0.0),
            other => panic!("expected Optimal, got {other:?}"),
        }
    }

    #[test]
    fn budget_exceeded_reports_best_so_far() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let outcome = engine.solve_with_budget(&[0.0, 0.0, 0.0], Some(0));
        assert_eq!(
            outcome,
            SolveOutcome::BudgetExceeded { best_so_far: None }
        );
    }

    #[test]
    fn repeated_solves_reuse_the_engine_with_fresh_duals() {
        let graph = three_node_graph();
        let mut engine = LabelSettingEngine::new(&graph, 100.0, None);
        let first = engine.solve(&[0.0, 0.0, 0.0]);
        let second = engine.solve(&[0.0, 25.0, 0.0]);
        assert_ne!(first, second);
    }
}
