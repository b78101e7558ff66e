use fxhash::FxHashSet;
use jiff::SignedDuration;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::DispatchError,
    fleet::{bus::BusId, driver::DriverId, trip::Trip},
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timer_debug,
    timetable::Timetable,
};

use super::Optimizer;

const DRIVER_WEIGHT: i64 = 1000;
const TRIP_WEIGHT: i64 = 500;
const OVERWORK_PENALTY: i64 = 500;
const NO_REST_PENALTY: i64 = 250;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverMode {
    /// Each parent's trips are assigned back to the same parent, leaving the
    /// assignment as it was.
    #[default]
    Reaffirm,
    /// Half of each parent's trips move to the other parent when it is free
    /// over the trip.
    Swap,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GeneticParams {
    pub epochs: usize,
    /// Number of best buses selected as parents each epoch.
    pub selection_size: usize,
    pub crossover: CrossoverMode,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            epochs: 100,
            selection_size: 10,
            crossover: CrossoverMode::default(),
        }
    }
}

/// Score of a bus, lower is better: few distinct drivers and many trips, with
/// penalties for drivers that work past their limit.
///
/// The recent driving penalty only sees trips that end before a departure and
/// start less than one work duration earlier. Such trips fit in one work
/// duration, so the penalty only fires for a driver booked on overlapping
/// trips.
pub fn fitness(timetable: &Timetable, drivers: &DriverHub, bus_id: BusId) -> i64 {
    let trips = timetable.trips_of_bus(bus_id);
    let driver_ids: FxHashSet<DriverId> = trips.iter().filter_map(Trip::driver_id).collect();

    let mut penalty = 0;
    for &driver_id in &driver_ids {
        let Some(driver) = drivers.get(driver_id) else {
            continue;
        };
        let limit = driver.work_duration();
        let driven = timetable.trips_of_driver(driver_id);

        if total_duration(driven.iter()) > limit {
            penalty += OVERWORK_PENALTY;
        }

        for trip in trips.iter().filter(|trip| trip.driver_id() == Some(driver_id)) {
            let window_start = trip.start_time() - limit;
            let recent = driven.iter().filter(|other| {
                other.end_time() < trip.start_time() && other.start_time() > window_start
            });

            if total_duration(recent) > limit {
                penalty += NO_REST_PENALTY;
            }
        }
    }

    driver_ids.len() as i64 * DRIVER_WEIGHT - trips.len() as i64 * TRIP_WEIGHT + penalty
}

fn total_duration<'a>(trips: impl Iterator<Item = &'a Trip>) -> SignedDuration {
    trips.fold(SignedDuration::ZERO, |total, trip| total + trip.duration())
}

/// Refines the assignment of a base optimizer by recombining the trips of
/// the fittest buses, epoch after epoch.
pub struct Genetic<O> {
    base: O,
    params: GeneticParams,
}

impl<O: Optimizer> Genetic<O> {
    pub fn new(base: O, params: GeneticParams) -> Self {
        Genetic { base, params }
    }

    /// Buses ranked by ascending fitness, at most `selection_size` of them.
    fn select_parents(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Vec<(i64, BusId)> {
        let mut ranked: Vec<(i64, BusId)> = buses
            .ids()
            .into_par_iter()
            .map(|bus_id| (fitness(timetable, drivers, bus_id), bus_id))
            .collect();
        ranked.sort_unstable();
        ranked.truncate(self.params.selection_size);

        ranked
    }

    fn crossover(
        &self,
        timetable: &Timetable,
        first: BusId,
        second: BusId,
    ) -> Result<(), DispatchError> {
        let first_trips = timetable.trips_of_bus(first);
        let second_trips = timetable.trips_of_bus(second);

        match self.params.crossover {
            CrossoverMode::Reaffirm => {
                let genome = first_trips.len() + second_trips.len();
                reaffirm(timetable, first, &first_trips, genome)?;
                reaffirm(timetable, second, &second_trips, genome)
            }
            CrossoverMode::Swap => {
                give_half(timetable, &first_trips, second)?;
                give_half(timetable, &second_trips, first)
            }
        }
    }

    fn epoch(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<Option<i64>, DispatchError> {
        let parents = self.select_parents(timetable, buses, drivers);

        for pair in parents.chunks_exact(2) {
            self.crossover(timetable, pair[0].1, pair[1].1)?;
        }

        Ok(parents.first().map(|(score, _)| *score))
    }
}

fn reaffirm(
    timetable: &Timetable,
    parent: BusId,
    trips: &[Trip],
    genome: usize,
) -> Result<(), DispatchError> {
    for trip in trips.iter().take(genome.min(trips.len())) {
        timetable.assign_bus(trip.id(), parent)?;
    }

    Ok(())
}

fn give_half(timetable: &Timetable, trips: &[Trip], receiver: BusId) -> Result<(), DispatchError> {
    for trip in trips.iter().take(trips.len() / 2) {
        if !timetable.is_bus_busy_between(receiver, trip.start_time(), trip.end_time()) {
            timetable.assign_bus(trip.id(), receiver)?;
        }
    }

    Ok(())
}

impl<O: Optimizer> Optimizer for Genetic<O> {
    #[instrument(skip_all, level = "debug")]
    fn optimize(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<(), DispatchError> {
        self.base.optimize(timetable, buses, drivers)?;

        let best = timer_debug!("genetic refinement", {
            let mut best = None;
            for epoch in 0..self.params.epochs {
                best = self.epoch(timetable, buses, drivers)?;
                debug!(epoch, ?best, "epoch done");
            }
            best
        });

        info!(
            epochs = self.params.epochs,
            ?best,
            crossover = ?self.params.crossover,
            "genetic refinement done"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fleet::driver::Driver,
        optimizer::bruteforce::{Bruteforce, BruteforceParams},
        test_utils,
    };

    struct KeepAssignment;

    impl Optimizer for KeepAssignment {
        fn optimize(
            &self,
            _: &Timetable,
            _: &BusDepot,
            _: &DriverHub,
        ) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[test]
    fn test_fewer_drivers_is_fitter() {
        let timetable = Timetable::new();
        let shared = test_utils::register_route(&timetable, &[20], &["08:00", "09:00"]);
        let split = test_utils::register_route(&timetable, &[20], &["08:00", "09:00"]);
        let (a, b, c) = (Driver::type_a(), Driver::type_a(), Driver::type_a());
        let drivers = test_utils::create_driver_hub([a.clone(), b.clone(), c.clone()]);
        let (first_bus, second_bus) = (BusId::new(), BusId::new());

        for trip_id in &shared {
            timetable.assign_bus(*trip_id, first_bus).unwrap();
            timetable.assign_driver(*trip_id, a.id()).unwrap();
        }
        timetable.assign_bus(split[0], second_bus).unwrap();
        timetable.assign_driver(split[0], b.id()).unwrap();
        timetable.assign_bus(split[1], second_bus).unwrap();
        timetable.assign_driver(split[1], c.id()).unwrap();

        let fewer = fitness(&timetable, &drivers, first_bus);
        let more = fitness(&timetable, &drivers, second_bus);
        assert_eq!(fewer, 1000 - 2 * 500);
        assert_eq!(more, 2 * 1000 - 2 * 500);
        assert!(fewer < more);
    }

    #[test]
    fn test_overworked_driver_is_penalized() {
        let timetable = Timetable::new();
        let ids = test_utils::register_route(
            &timetable,
            &[60, 60, 60],
            &["06:00", "09:10", "12:20"],
        );
        let driver = Driver::type_a();
        let drivers = test_utils::create_driver_hub([driver.clone()]);
        let bus_id = BusId::new();
        timetable.assign_bus(ids[0], bus_id).unwrap();
        for trip_id in &ids {
            timetable.assign_driver(*trip_id, driver.id()).unwrap();
        }

        assert_eq!(
            fitness(&timetable, &drivers, bus_id),
            1000 - 500 + OVERWORK_PENALTY
        );
    }

    #[test]
    fn test_rest_window_penalty_needs_overlapping_trips() {
        let timetable = Timetable::new();
        let ids = test_utils::register_route(
            &timetable,
            &[60, 60, 60],
            &["06:00", "09:10", "12:20"],
        );
        let driver = Driver::type_a();
        let drivers = test_utils::create_driver_hub([driver.clone()]);
        let bus_id = BusId::new();
        for trip_id in &ids {
            timetable.assign_bus(*trip_id, bus_id).unwrap();
            timetable.assign_driver(*trip_id, driver.id()).unwrap();
        }

        // 9h in a row, but any 8h window before a departure holds at most 8h
        assert_eq!(
            fitness(&timetable, &drivers, bus_id),
            1000 - 3 * 500 + OVERWORK_PENALTY
        );

        let timetable = Timetable::new();
        let ids = test_utils::register_route(&timetable, &[300], &["06:00", "06:30", "12:00"]);
        let driver = Driver::type_a();
        let drivers = test_utils::create_driver_hub([driver.clone()]);
        for trip_id in &ids {
            timetable.assign_driver(*trip_id, driver.id()).unwrap();
        }
        timetable.assign_bus(ids[2], bus_id).unwrap();

        assert_eq!(
            fitness(&timetable, &drivers, bus_id),
            1000 - 500 + OVERWORK_PENALTY + NO_REST_PENALTY
        );
    }

    #[test]
    fn test_reaffirm_keeps_assignment() {
        let timetable = test_utils::create_dense_timetable();
        let drivers = test_utils::create_driver_hub([]);
        let buses = test_utils::create_bus_depot(0);
        Bruteforce::new(BruteforceParams { seed: Some(1) })
            .optimize(&timetable, &buses, &drivers)
            .unwrap();
        let mut before = timetable.all_trips();

        Genetic::new(KeepAssignment, GeneticParams::default())
            .optimize(&timetable, &buses, &drivers)
            .unwrap();

        let mut after = timetable.all_trips();
        before.sort_by_key(Trip::id);
        after.sort_by_key(Trip::id);
        assert_eq!(before, after);
    }

    #[test]
    fn test_swap_keeps_buses_free_of_overlap() {
        let timetable = test_utils::create_dense_timetable();
        let drivers = test_utils::create_driver_hub([]);
        let buses = test_utils::create_bus_depot(0);
        let params = GeneticParams {
            epochs: 10,
            crossover: CrossoverMode::Swap,
            ..GeneticParams::default()
        };

        Genetic::new(Bruteforce::default(), params)
            .optimize(&timetable, &buses, &drivers)
            .unwrap();

        test_utils::assert_complete(&timetable);
        test_utils::assert_no_double_booking(&timetable);
    }

    #[test]
    fn test_selection_is_clamped_and_sorted() {
        let timetable = test_utils::create_dense_timetable();
        let drivers = test_utils::create_driver_hub([]);
        let buses = test_utils::create_bus_depot(0);
        Bruteforce::default()
            .optimize(&timetable, &buses, &drivers)
            .unwrap();

        let genetic = Genetic::new(
            KeepAssignment,
            GeneticParams {
                selection_size: 1000,
                ..GeneticParams::default()
            },
        );
        let parents = genetic.select_parents(&timetable, &buses, &drivers);

        assert_eq!(parents.len(), buses.len());
        assert!(parents.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    }
}
