//! A label-setting solver for the Elementary Shortest Path Problem with
//! Resource Constraints (ESPPRC): the pricing subproblem that shows up in
//! column-generation formulations of vehicle-routing problems with time
//! windows and vehicle capacity.
//!
//! The entry point is [`engine::LabelSettingEngine`]: build a [`graph::Graph`],
//! construct an engine over it, and call `solve` with a dual vector from the
//! master LP on every column-generation iteration.

pub mod edge;
pub mod engine;
pub mod error;
pub mod graph;
pub mod instance;
pub mod label;
pub mod node;

pub use edge::Edge;
pub use engine::{LabelSettingEngine, OptimalPath, SolveOutcome};
pub use error::{GraphError, InstanceError};
pub use graph::Graph;
pub use node::Node;
