use std::sync::Arc;

use fleet_dispatch::{
    clock::ManualClock,
    fleet::{driver::DriverId, trip::Trip},
    scenario::{Scenario, ScenarioInstance, ScenarioParams},
    timetable::Timetable,
};
use rand::{SeedableRng, rngs::SmallRng};

pub fn create_scenario(seed: u64) -> Scenario {
    Scenario::generate(&ScenarioParams::default(), &mut SmallRng::seed_from_u64(seed))
}

pub fn instantiate(scenario: &Scenario) -> ScenarioInstance {
    scenario.instantiate(Arc::new(ManualClock::new(scenario.service_start())))
}

pub fn unassigned_fields(timetable: &Timetable) -> usize {
    timetable
        .all_trips()
        .iter()
        .map(|trip| usize::from(trip.bus_id().is_none()) + usize::from(trip.driver_id().is_none()))
        .sum()
}

/// Pairs of trips sharing a bus or a driver over overlapping intervals.
pub fn double_bookings(timetable: &Timetable) -> Vec<(Trip, Trip)> {
    let trips = timetable.all_trips();
    let mut conflicts = Vec::new();

    for (index, a) in trips.iter().enumerate() {
        for b in &trips[index + 1..] {
            let shares_bus = a.bus_id().is_some() && a.bus_id() == b.bus_id();
            let shares_driver = a.driver_id().is_some() && a.driver_id() == b.driver_id();

            if (shares_bus || shares_driver) && a.overlaps(b.start_time(), b.end_time()) {
                conflicts.push((a.clone(), b.clone()));
            }
        }
    }

    conflicts
}

/// Drivers whose bookings exceed their work duration inside one continuous
/// work window.
pub fn overworked_drivers(instance: &ScenarioInstance) -> Vec<DriverId> {
    instance
        .drivers
        .enumerate()
        .into_iter()
        .filter(|driver| driver.overworks(&instance.timetable.trips_of_driver(driver.id())))
        .map(|driver| driver.id())
        .collect()
}
