use std::collections::HashMap;

use tracing::debug;

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::Node;

/// A directed graph over [`Node`]s with per-node outgoing-edge lists and a
/// pair of cost maps keyed by `(from, to)`.
///
/// `original_cost` is fixed at construction time; `revised_cost` is
/// overwritten wholesale by [`Graph::revise_costs`] on every solve and is the
/// map the label-setting engine actually searches over.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    adjacency: Vec<Vec<Edge>>,
    original_cost: HashMap<(usize, usize), f64>,
    revised_cost: HashMap<(usize, usize), f64>,
}

impl Graph {
    /// Builds a graph from a node list and a matching per-node adjacency list.
    ///
    /// `adjacency[i]` must hold exactly the outgoing edges of `nodes[i]`.
    pub fn construct(nodes: Vec<Node>, adjacency: Vec<Vec<Edge>>) -> Result<Self, GraphError> {
        if nodes.len() != adjacency.len() {
            return Err(GraphError::ShapeMismatch {
                nodes: nodes.len(),
                adjacency: adjacency.len(),
            });
        }

        debug_assert!(
            nodes.iter().all(Node::has_valid_window),
            "every node's time window must satisfy earliest <= latest"
        );

        let mut original_cost = HashMap::new();
        for edges in &adjacency {
            for edge in edges {
                debug_assert!(edge.from != edge.to, "self-loop edge: {edge:?}");
                debug_assert!(
                    edge.from < nodes.len() && edge.to < nodes.len(),
                    "edge references unknown node id: {edge:?}"
                );
                debug_assert!(
                    edge.routing_time >= 0,
                    "edge routing time must be non-negative: {edge:?}"
                );
                original_cost.insert((edge.from, edge.to), edge.revised_cost);
            }
        }
        let revised_cost = original_cost.clone();

        Ok(Self {
            nodes,
            adjacency,
            original_cost,
            revised_cost,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn outgoing(&self, id: usize) -> &[Edge] {
        &self.adjacency[id]
    }

    pub fn original_cost(&self, from: usize, to: usize) -> f64 {
        self.original_cost[&(from, to)]
    }

    pub fn revised_cost(&self, from: usize, to: usize) -> f64 {
        self.revised_cost[&(from, to)]
    }

    /// Sorts every node's outgoing-edge list by ascending revised cost.
    ///
    /// This can speed up or slow down the search depending on the instance;
    /// it is not required for correctness.
    pub fn sort_outgoing(&mut self) {
        for edges in &mut self.adjacency {
            edges.sort();
        }
    }

    /// Applies a single branch-and-price decision to the adjacency lists.
    ///
    /// `value == 0` forbids the arc `(u, v)`; `value == 1` forces every
    /// outgoing edge from `u` other than `(u, v)` to be removed. Both are
    /// idempotent. Cost maps are left untouched: a stale entry there is
    /// simply never looked up again once its edge is gone.
    pub fn apply_branch(&mut self, arc: (usize, usize), value: u8) {
        let (from, to) = arc;
        let edges = &mut self.adjacency[from];
        // Collect-then-remove: mutating a Vec while iterating it is the
        // hazard the original labeling-4-espprc implementation stumbled into.
        let keep: Vec<Edge> = match value {
            0 => edges.iter().copied().filter(|e| e.to != to).collect(),
            _ => edges.iter().copied().filter(|e| e.to == to).collect(),
        };
        debug!(from, to, value, removed = edges.len() - keep.len(), "apply_branch");
        *edges = keep;
    }

    /// Rewrites `revised_cost[(from, to)] := original_cost[(from, to)] - dual[from]`
    /// for every arc currently present in `original_cost`.
    pub fn revise_costs(&mut self, dual: &[f64]) {
        debug_assert_eq!(
            dual.len(),
            self.nodes.len(),
            "dual vector must have one entry per node"
        );
        for (&(from, to), original) in &self.original_cost {
            self.revised_cost.insert((from, to), original - dual[from]);
        }
    }

    /// Sums `original_cost[(path[i], path[i+1])]` along a node sequence.
    pub fn original_cost_of_path(&self, path: &[usize]) -> f64 {
        path.windows(2)
            .map(|pair| self.original_cost(pair[0], pair[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn shape_mismatch_is_rejected() {
        let nodes = vec![node(0, 0, 10, 0, 0), node(1, 0, 10, 0, 0)];
        let adjacency = vec![vec![]];
        let err = Graph::construct(nodes, adjacency).unwrap_err();
        assert_eq!(
            err,
            GraphError::ShapeMismatch {
                nodes: 2,
                adjacency: 1
            }
        );
    }

    #[test]
    fn revise_costs_with_zero_dual_is_identity() {
        let mut graph = three_node_graph();
        graph.revise_costs(&[0.0, 0.0, 0.0]);
        assert_eq!(graph.revised_cost(0, 1), graph.original_cost(0, 1));
        assert_eq!(graph.revised_cost(1, 2), graph.original_cost(1, 2));
    }

    #[test]
    fn revise_costs_subtracts_dual_at_tail() {
        let mut graph = three_node_graph();
        graph.revise_costs(&[0.0, 25.0, 0.0]);
        assert_eq!(graph.revised_cost(0, 1), 10.0);
        assert_eq!(graph.revised_cost(1, 2), 20.0 - 25.0);
    }

    #[test]
    fn original_cost_of_path_sums_arcs() {
        let graph = three_node_graph();
        assert_eq!(graph.original_cost_of_path(&[0, 1, 2]), 30.0);
    }

    #[test]
    fn apply_branch_forbid_removes_only_that_arc() {
        let mut graph = three_node_graph();
        graph.apply_branch((0, 1), 0);
        assert_eq!(graph.outgoing(0).len(), 1);
        assert_eq!(graph.outgoing(0)[0].to, 2);

        // Idempotent when the arc is already gone.
        graph.apply_branch((0, 1), 0);
        assert_eq!(graph.outgoing(0).len(), 1);
    }

    #[test]
    fn apply_branch_force_keeps_only_that_arc() {
        let mut graph = three_node_graph();
        graph.apply_branch((0, 1), 1);
        assert_eq!(graph.outgoing(0).len(), 1);
        assert_eq!(graph.outgoing(0)[0].to, 1);
    }

    #[test]
    fn sort_outgoing_orders_by_revised_cost() {
        let mut graph = three_node_graph();
        graph.sort_outgoing();
        let costs: Vec<f64> = graph.outgoing(0).iter().map(|e| e.revised_cost).collect();
        assert_eq!(costs, vec![10.0, 100.0]);
    }
}
