use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;
use fleet_dispatch::{optimizer::OptimizerParams, scenario::ScenarioParams};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable pointing to the experiment configuration.
pub const CONFIG_ENV: &str = "FLEET_CONFIG";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Scenarios generated, every optimizer runs once on each.
    pub experiments: usize,
    pub seed: Option<u64>,
    pub scenario: ScenarioParams,
    pub optimizers: OptimizerParams,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            experiments: 10,
            seed: None,
            scenario: ScenarioParams::default(),
            optimizers: OptimizerParams::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open config file {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Reads the file given on the command line, else the one named by
    /// `FLEET_CONFIG`, else falls back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => {
                info!("Loading config {:?}", path);
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{
                "experiments": 3,
                "scenario": { "distinct_routes": 4, "drivers_b": 0 },
                "optimizers": { "greedy": { "chain_selection": "legacy" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.experiments, 3);
        assert_eq!(config.scenario.distinct_routes, 4);
        assert_eq!(config.scenario.drivers_b, 0);
        assert_eq!(config.scenario.repetitions, 7);
        assert_eq!(config.optimizers.greedy.observe_ratio, 0.37);
        assert_eq!(config.optimizers.genetic.epochs, 100);
    }

    #[test]
    fn test_default_config_round_trips() {
        let json = serde_json::to_string(&ExperimentConfig::default()).unwrap();
        let config: ExperimentConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.scenario, ScenarioParams::default());
    }
}
