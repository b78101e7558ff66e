use std::ops::Range;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// 2024-11-30T00:00:00Z
const DEFAULT_SERVICE_DAY: Timestamp = Timestamp::constant(1_732_924_800, 0);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScenarioParams {
    /// Termini shared between routes.
    pub terminal_stations: usize,
    pub distinct_routes: usize,
    /// Departures generated per route.
    pub repetitions: usize,
    pub buses_per_station: usize,
    pub drivers_a: usize,
    pub drivers_b: usize,
    /// Stations per route, termini included.
    pub stations_per_route: Range<usize>,
    pub leg_minutes: Range<i64>,
    /// Departure hours, end excluded.
    pub service_hours: Range<i64>,
    pub departure_minutes: Vec<i64>,
    /// Midnight of the simulated day.
    pub service_day: Timestamp,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        ScenarioParams {
            terminal_stations: 5,
            distinct_routes: 15,
            repetitions: 7,
            buses_per_station: 1,
            drivers_a: 1,
            drivers_b: 1,
            stations_per_route: 10..20,
            leg_minutes: 3..15,
            service_hours: 6..23,
            departure_minutes: vec![0, 5, 10, 15, 20, 25, 30, 35, 45, 50, 55],
            service_day: DEFAULT_SERVICE_DAY,
        }
    }
}

impl ScenarioParams {
    pub fn trip_count(&self) -> usize {
        self.distinct_routes * self.repetitions
    }

    pub fn bus_count(&self) -> usize {
        self.terminal_stations * self.buses_per_station
    }
}
