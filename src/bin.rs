use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use espprc_labeling::instance::{load_instance_file, CostModel};
use espprc_labeling::{LabelSettingEngine, SolveOutcome};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[command(about = "Solve one ESPPRC pricing problem over a benchmark instance")]
struct Args {
    /// Path to a Solomon-style benchmark instance JSON document.
    #[arg(long)]
    instance: PathBuf,

    /// Number of customers (including source and sink) to read from the instance.
    #[arg(long)]
    node_count: usize,

    /// Vehicle capacity.
    #[arg(long)]
    capacity: f64,

    /// Per-arc cost multiplier applied to the Euclidean distance.
    #[arg(long, default_value_t = 1.0)]
    cost_factor: f64,

    /// Explicit dual vector as a JSON array of length `node_count`. When
    /// omitted, a random vector in `[0, max_dual)` is generated instead.
    #[arg(long)]
    dual: Option<String>,

    /// Upper bound for randomly generated dual values (ignored if `--dual` is given).
    #[arg(long, default_value_t = 50.0)]
    max_dual: f64,

    /// Optional single branching decision to apply before solving: `from,to,value`.
    #[arg(long, value_parser = parse_branch)]
    branch: Option<((usize, usize), u8)>,

    /// Stop after this many labels have been popped from the frontier.
    #[arg(long)]
    max_popped: Option<usize>,
}

fn parse_branch(raw: &str) -> Result<((usize, usize), u8), String> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [from, to, value] = parts[..] else {
        return Err(format!("expected `from,to,value`, got `{raw}`"));
    };
    let from = from.parse().map_err(|e| format!("bad `from`: {e}"))?;
    let to = to.parse().map_err(|e| format!("bad `to`: {e}"))?;
    let value = value.parse().map_err(|e| format!("bad `value`: {e}"))?;
    Ok(((from, to), value))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let cost_model = CostModel {
        cost_factor: args.cost_factor,
        ..CostModel::default()
    };
    let graph = load_instance_file(&args.instance, args.node_count, &cost_model)?;

    let dual = match &args.dual {
        Some(raw) => serde_json::from_str::<Vec<f64>>(raw)?,
        None => {
            let mut rng = SmallRng::from_entropy();
            (0..args.node_count)
                .map(|_| rng.gen_range(0.0..args.max_dual))
                .collect()
        }
    };
    if dual.len() != args.node_count {
        return Err(format!(
            "dual vector has {} entries, expected {}",
            dual.len(),
            args.node_count
        )
        .into());
    }

    let mut engine = LabelSettingEngine::new(&graph, args.capacity, args.branch);
    let outcome = engine.solve_with_budget(&dual, args.max_popped);

    match outcome {
        SolveOutcome::Optimal(path) => {
            println!("reduced_cost = {}", path.reduced_cost);
            println!("original_cost = {}", path.original_cost);
            println!("shortest_path = {:?}", path.shortest_path);
        }
        SolveOutcome::NoImprovingPath => println!("no feasible path exists"),
        SolveOutcome::BudgetExceeded { best_so_far } => {
            println!("budget exceeded before the frontier drained");
            match best_so_far {
                Some(path) => {
                    println!("best_so_far.reduced_cost = {}", path.reduced_cost);
                    println!("best_so_far.shortest_path = {:?}", path.shortest_path);
                }
                None => println!("no sink label was found before the budget ran out"),
            }
        }
    }

    Ok(())
}
