mod generator;
mod scenario_params;

pub use generator::{Route, Scenario, ScenarioInstance};
pub use scenario_params::ScenarioParams;
