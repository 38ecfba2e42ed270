use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A directed arc between two nodes.
///
/// `revised_cost` starts out equal to the arc's original cost and is
/// rewritten in place by [`crate::graph::Graph::revise_costs`] on every solve;
/// the original is kept separately so the real cost of a chosen column can
/// always be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub revised_cost: f64,
    pub routing_time: i64,
}

impl Edge {
    pub fn new(from: usize, to: usize, cost: f64, routing_time: i64) -> Self {
        Self {
            from,
            to,
            revised_cost: cost,
            routing_time,
        }
    }
}

impl Eq for Edge {}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.revised_cost).cmp(&OrderedFloat(other.revised_cost))
    }
}
