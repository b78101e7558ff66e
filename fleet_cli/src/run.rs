use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Args;
use fleet_dispatch::{clock::ManualClock, optimizer::OptimizerKind, scenario::Scenario};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::SmallRng};
use tracing::{debug, info};

use crate::{
    config::ExperimentConfig,
    report::{Report, RunMetrics},
};

#[derive(Args)]
pub struct RunArgs {
    /// JSON experiment configuration, defaults to $FLEET_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of generated scenarios, overrides the configuration
    #[arg(short, long)]
    experiments: Option<usize>,

    /// Optimizers to compare (default: all)
    #[arg(short, long = "optimizer")]
    optimizers: Vec<OptimizerKind>,

    /// Seed for scenario generation, overrides the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Writes every run and the summaries as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

pub fn run(args: RunArgs) -> Result<(), anyhow::Error> {
    let mut config = ExperimentConfig::load(args.config.as_deref())?;
    if let Some(experiments) = args.experiments {
        config.experiments = experiments;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let optimizers = if args.optimizers.is_empty() {
        OptimizerKind::ALL.to_vec()
    } else {
        args.optimizers
    };

    info!(
        experiments = config.experiments,
        trips = config.scenario.trip_count(),
        optimizers = optimizers.len(),
        "Running experiments"
    );

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let bar = ProgressBar::new((config.experiments * optimizers.len()) as u64);
    bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

    let mut report = Report::default();
    for experiment in 0..config.experiments {
        let scenario = Scenario::generate(&config.scenario, &mut rng);

        for kind in &optimizers {
            bar.set_message(format!("experiment {} {kind}", experiment + 1));

            let instance =
                scenario.instantiate(Arc::new(ManualClock::new(scenario.service_start())));
            kind.build(&config.optimizers)
                .optimize(&instance.timetable, &instance.buses, &instance.drivers)
                .with_context(|| format!("{kind} failed on experiment {}", experiment + 1))?;

            let metrics = RunMetrics::measure(*kind, experiment, &instance);
            debug!(?metrics, "run done");
            report.push(metrics);
            bar.inc(1);
        }
    }
    bar.finish_and_clear();

    println!("{}", report.to_table(&optimizers));

    if let Some(output) = args.output {
        fs::write(&output, report.to_json(&optimizers)?)
            .with_context(|| format!("Cannot write report to {}", output.display()))?;
        info!("Report written to {:?}", output);
    }

    Ok(())
}
