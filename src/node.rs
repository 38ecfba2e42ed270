use serde::{Deserialize, Serialize};

/// A customer (or depot) in the routing network.
///
/// Node `0` is always the source and node `N - 1` is always the sink of the
/// graph it belongs to; both conventions are enforced by [`crate::graph::Graph`]
/// rather than by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    pub x_coord: i64,
    pub y_coord: i64,
    pub demand: u64,
    pub earliest: i64,
    pub latest: i64,
    pub service_time: i64,
}

impl Node {
    pub fn new(
        id: usize,
        x_coord: i64,
        y_coord: i64,
        demand: u64,
        earliest: i64,
        latest: i64,
        service_time: i64,
    ) -> Self {
        Self {
            id,
            x_coord,
            y_coord,
            demand,
            earliest,
            latest,
            service_time,
        }
    }

    /// `true` when the time window is internally consistent (`earliest <= latest`).
    pub fn has_valid_window(&self) -> bool {
        self.earliest <= self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_window_ordering() {
        let n = Node::new(0, 0, 0, 0, 0, 10, 0);
        assert!(n.has_valid_window());

        let n = Node::new(1, 0, 0, 0, 10, 0, 0);
        assert!(!n.has_valid_window());
    }
}
