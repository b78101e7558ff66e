use comfy_table::{Cell, Table, presets::UTF8_FULL};
use fleet_dispatch::{
    fleet::{
        bus::BusId,
        driver::{DriverId, DriverType},
        trip::Trip,
    },
    optimizer::OptimizerKind,
    scenario::ScenarioInstance,
};
use fxhash::FxHashSet;
use serde::Serialize;

/// What one optimizer produced on one scenario.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub optimizer: OptimizerKind,
    pub experiment: usize,
    pub drivers_hired: usize,
    pub drivers_used: usize,
    pub buses_used: usize,
    pub trips_per_driver: f64,
    pub trips_per_bus: f64,
    pub type_a_share: f64,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl RunMetrics {
    pub fn measure(
        optimizer: OptimizerKind,
        experiment: usize,
        instance: &ScenarioInstance,
    ) -> Self {
        let trips = instance.timetable.all_trips();
        let drivers: FxHashSet<DriverId> = trips.iter().filter_map(Trip::driver_id).collect();
        let buses: FxHashSet<BusId> = trips.iter().filter_map(Trip::bus_id).collect();
        let type_a = drivers
            .iter()
            .filter_map(|driver_id| instance.drivers.get(*driver_id))
            .filter(|driver| driver.driver_type() == DriverType::A)
            .count();

        RunMetrics {
            optimizer,
            experiment,
            drivers_hired: instance.drivers.len(),
            drivers_used: drivers.len(),
            buses_used: buses.len(),
            trips_per_driver: ratio(trips.len(), drivers.len()),
            trips_per_bus: ratio(trips.len(), buses.len()),
            type_a_share: ratio(type_a, drivers.len()),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Statistic {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl Statistic {
    /// Population statistics, all zero for no values.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Statistic {
                mean: 0.0,
                median: 0.0,
                std_dev: 0.0,
            };
        }

        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let middle = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[middle - 1] + sorted[middle]) / 2.0
        } else {
            sorted[middle]
        };

        Statistic {
            mean,
            median,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct OptimizerSummary {
    pub optimizer: OptimizerKind,
    pub runs: usize,
    pub drivers_hired: Statistic,
    pub drivers_used: Statistic,
    pub buses_used: Statistic,
    pub trips_per_driver: Statistic,
    pub trips_per_bus: Statistic,
    pub type_a_share: Statistic,
}

impl OptimizerSummary {
    fn metrics(&self) -> [(&'static str, Statistic); 6] {
        [
            ("drivers hired", self.drivers_hired),
            ("drivers used", self.drivers_used),
            ("buses used", self.buses_used),
            ("trips per driver", self.trips_per_driver),
            ("trips per bus", self.trips_per_bus),
            ("type A share", self.type_a_share),
        ]
    }
}

#[derive(Serialize, Debug, Default)]
pub struct Report {
    runs: Vec<RunMetrics>,
}

impl Report {
    pub fn push(&mut self, run: RunMetrics) {
        self.runs.push(run);
    }

    pub fn summarize(&self, optimizer: OptimizerKind) -> OptimizerSummary {
        let runs: Vec<&RunMetrics> = self
            .runs
            .iter()
            .filter(|run| run.optimizer == optimizer)
            .collect();
        let statistic = |metric: fn(&RunMetrics) -> f64| {
            Statistic::of(&runs.iter().map(|run| metric(run)).collect::<Vec<_>>())
        };

        OptimizerSummary {
            optimizer,
            runs: runs.len(),
            drivers_hired: statistic(|run| run.drivers_hired as f64),
            drivers_used: statistic(|run| run.drivers_used as f64),
            buses_used: statistic(|run| run.buses_used as f64),
            trips_per_driver: statistic(|run| run.trips_per_driver),
            trips_per_bus: statistic(|run| run.trips_per_bus),
            type_a_share: statistic(|run| run.type_a_share),
        }
    }

    pub fn summaries(&self, optimizers: &[OptimizerKind]) -> Vec<OptimizerSummary> {
        optimizers
            .iter()
            .map(|optimizer| self.summarize(*optimizer))
            .collect()
    }

    pub fn to_table(&self, optimizers: &[OptimizerKind]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Optimizer", "Metric", "Mean", "Median", "Std dev"]);

        for summary in self.summaries(optimizers) {
            for (name, statistic) in summary.metrics() {
                table.add_row(vec![
                    Cell::new(summary.optimizer),
                    Cell::new(name),
                    Cell::new(format!("{:.2}", statistic.mean)),
                    Cell::new(format!("{:.2}", statistic.median)),
                    Cell::new(format!("{:.2}", statistic.std_dev)),
                ]);
            }
        }

        table
    }

    pub fn to_json(&self, optimizers: &[OptimizerKind]) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Output<'a> {
            runs: &'a [RunMetrics],
            summaries: Vec<OptimizerSummary>,
        }

        serde_json::to_string_pretty(&Output {
            runs: &self.runs,
            summaries: self.summaries(optimizers),
        })
    }
}
