use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::edge::Edge;
use crate::error::InstanceError;
use crate::graph::Graph;
use crate::node::Node;

/// One row of the `all_customers` map in a Solomon-style benchmark document.
#[derive(Debug, Deserialize)]
struct CustomerRecord {
    x_coord: i64,
    y_coord: i64,
    demand: u64,
    ready_time: i64,
    due_time: i64,
    service_time: i64,
}

/// Root of the benchmark instance document: a map from stringified customer
/// index to its record.
#[derive(Debug, Deserialize)]
struct InstanceDocument {
    all_customers: HashMap<String, CustomerRecord>,
}

/// How the adapter turns Euclidean distance into an arc's cost and routing
/// time. Mirrors the original test driver's `randint(1, 5) * distance` cost
/// rule and `15 * distance` time rule, but makes the cost factor an explicit
/// per-call choice instead of a hardcoded random draw.
pub struct CostModel {
    pub cost_factor: f64,
    pub time_factor: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            cost_factor: 1.0,
            time_factor: 15.0,
        }
    }
}

fn euclidean_distance(a: &Node, b: &Node) -> i64 {
    let dx = (a.x_coord - b.x_coord) as f64;
    let dy = (a.y_coord - b.y_coord) as f64;
    (dx * dx + dy * dy).sqrt().floor() as i64
}

/// Parses a benchmark instance document into a [`Graph`].
///
/// `all_customers` must contain every index in `[0, node_count)`. Node `0`
/// is the source; `node_count - 1` is the sink and gets no outgoing edges.
pub fn parse_instance(
    raw: &str,
    node_count: usize,
    cost_model: &CostModel,
) -> Result<Graph, InstanceError> {
    if node_count == 0 {
        return Err(InstanceError::Empty);
    }
    let doc: InstanceDocument = serde_json::from_str(raw)?;

    let mut nodes = Vec::with_capacity(node_count);
    for i in 0..node_count {
        let record = doc
            .all_customers
            .get(&i.to_string())
            .ok_or(InstanceError::MissingCustomer(i))?;
        nodes.push(Node::new(
            i,
            record.x_coord,
            record.y_coord,
            record.demand,
            record.ready_time,
            record.due_time,
            record.service_time,
        ));
    }

    let sink = node_count - 1;
    let mut adjacency = vec![Vec::new(); node_count];
    for i in 0..sink {
        for j in 1..node_count {
            if i == j {
                continue;
            }
            let distance = euclidean_distance(&nodes[i], &nodes[j]);
            let cost = (distance as f64) * cost_model.cost_factor;
            let routing_time = ((distance as f64) * cost_model.time_factor).floor() as i64;
            adjacency[i].push(Edge::new(i, j, cost, routing_time));
        }
    }

    debug!(node_count, "parsed benchmark instance");
    Ok(Graph::construct(nodes, adjacency)
        .expect("nodes and adjacency are always built with matching length above"))
}

/// Convenience wrapper around [`parse_instance`] that reads the document from
/// disk first.
pub fn load_instance_file<P: AsRef<Path>>(
    path: P,
    node_count: usize,
    cost_model: &CostModel,
) -> Result<Graph, InstanceError> {
    use std::io::Read;

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    parse_instance(&contents, node_count, cost_model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> String {
        serde_json::json!({
            "all_customers": {
                "0": {"x_coord": 0, "y_coord": 0, "demand": 0, "ready_time": 0, "due_time": 1000, "service_time": 0},
                "1": {"x_coord": 3, "y_coord": 4, "demand": 5, "ready_time": 0, "due_time": 100, "service_time": 5},
                "2": {"x_coord": 0, "y_coord": 0, "demand": 0, "ready_time": 0, "due_time": 1000, "service_time": 0},
            }
        })
        .to_string()
    }

    #[test]
    fn parses_three_node_instance() {
        let graph = parse_instance(&sample_document(), 3, &CostModel::default()).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        // distance(0,1) = 5 (3-4-5 triangle).
        assert_eq!(graph.original_cost(0, 1), 5.0);
        assert_eq!(graph.outgoing(2).len(), 0);
    }

    #[test]
    fn missing_customer_index_is_an_error() {
        let doc = serde_json::json!({ "all_customers": {} }).to_string();
        let err = parse_instance(&doc, 2, &CostModel::default()).unwrap_err();
        assert!(matches!(err, InstanceError::MissingCustomer(0)));
    }

    #[test]
    fn zero_node_count_is_rejected() {
        let err = parse_instance("{}", 0, &CostModel::default()).unwrap_err();
        assert!(matches!(err, InstanceError::Empty));
    }
}
