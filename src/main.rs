use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use signal_planner::output::write_plan;
use signal_planner::scenario::Scenario;
use signal_planner::scoring::{score, ScoreReport};
use signal_planner::simulation::{
    GreedyQueuePolicy, PolicyConfig, SchedulingPolicy, SimWorld, UsageWeightedPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    /// Grant the longest queue while the simulation runs
    Greedy,
    /// Split green time by how many cars use each street
    UsageWeighted,
}

#[derive(Parser)]
#[command(name = "signal_planner")]
#[command(about = "Builds traffic-light schedules for road network scenarios")]
struct Cli {
    /// Scenario files to schedule
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving one `<scenario>.out` file per input
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Scheduling heuristic
    #[arg(long, value_enum, default_value_t = PolicyKind::Greedy)]
    policy: PolicyKind,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Grant gate fires with probability NUMERATOR / duration
    #[arg(long, default_value_t = 30.0)]
    grant_numerator: f64,

    /// Smallest queue a street needs before it can be granted
    #[arg(long, default_value_t = 1)]
    min_grant_queue: usize,

    /// Ticks after a grant before an intersection may grant again
    #[arg(long)]
    rearm_cooldown: Option<u32>,

    /// Base green time for used streets in usage-weighted mode
    #[arg(long, default_value_t = 1.5)]
    usage_base: f64,

    /// Car count worth one extra tick of green in usage-weighted mode
    #[arg(long, default_value_t = 550)]
    usage_divisor: u64,
}

impl Cli {
    fn policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            grant_numerator: self.grant_numerator,
            min_grant_queue: self.min_grant_queue,
            rearm_cooldown: self.rearm_cooldown,
            usage_base: self.usage_base,
            usage_divisor: self.usage_divisor,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut total_points = 0;
    let mut failures = 0;
    for input in &cli.inputs {
        match solve(input, &cli) {
            Ok(report) => total_points += report.points,
            Err(e) => {
                error!("Failed to schedule {}: {:#}", input.display(), e);
                failures += 1;
            }
        }
    }

    info!("=== RUN COMPLETE ===");
    info!("Scenarios: {}, failed: {}", cli.inputs.len(), failures);
    info!("Total score: {}", total_points);

    if failures > 0 {
        std::process::exit(1);
    }
}

/// Schedule one scenario, write its output file and score it
fn solve(input: &Path, cli: &Cli) -> Result<ScoreReport> {
    info!("=== SCENARIO {} ===", input.display());
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let scenario = Scenario::parse(&text).context("Malformed scenario")?;

    let mut world = SimWorld::from_scenario(&scenario).context("Invalid road network")?;
    if let Some(seed) = cli.seed {
        world = world.with_seed(seed);
    }

    let config = cli.policy_config();
    let policy: Box<dyn SchedulingPolicy> = match cli.policy {
        PolicyKind::Greedy => Box::new(GreedyQueuePolicy::new(config)),
        PolicyKind::UsageWeighted => Box::new(UsageWeightedPolicy::new(
            world.usage_stats().clone(),
            config,
        )),
    };

    let plan = world.run(policy.as_ref()).context("Simulation aborted")?;
    world.log_summary();

    let stem = input
        .file_stem()
        .context("Scenario path has no file name")?;
    let out_path = cli.output_dir.join(stem).with_extension("out");
    let file = File::create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    write_plan(&plan, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    info!("Wrote {} schedules to {}", plan.len(), out_path.display());

    let report = score(&scenario, &plan).context("Emitted plan does not match scenario")?;
    info!(
        "Cars arrived: {}/{} ({:.1}%)",
        report.cars_arrived,
        report.total_cars,
        report.arrival_rate()
    );
    info!("Score: {}", report.points);
    Ok(report)
}
