use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::{DispatchError, ResourceKind},
    fleet::{
        bus::BusId,
        driver::{Driver, DriverType},
        trip::Trip,
    },
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timetable::Timetable,
};

use super::Optimizer;

/// How the winning chain is picked among the candidate drivers' chains.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ChainSelection {
    /// Strictly longest chain, first candidate on ties.
    #[default]
    Longest,
    /// Replaces the best chain whenever the number of candidates exceeds the
    /// best chain's length, whatever the length of the challenger.
    Legacy,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GreedyParams {
    /// Share of the trips used as chain seeds, the rest are swept trip by trip.
    pub observe_ratio: f64,
    pub chain_selection: ChainSelection,
}

impl Default for GreedyParams {
    fn default() -> Self {
        GreedyParams {
            observe_ratio: 0.37,
            chain_selection: ChainSelection::default(),
        }
    }
}

/// Back-to-back trips one driver could take with one bus.
#[derive(Debug, Clone)]
struct Chain {
    driver: Driver,
    trips: Vec<Trip>,
    rest_breaks: usize,
}

impl Chain {
    fn len(&self) -> usize {
        self.trips.len()
    }
}

/// Chains consecutive departures onto one driver and one bus, starting from a
/// bounded sample of trips, then sweeps the leftovers.
pub struct Greedy {
    params: GreedyParams,
}

impl Default for Greedy {
    fn default() -> Self {
        Greedy::new(GreedyParams::default())
    }
}

impl Greedy {
    pub fn new(params: GreedyParams) -> Self {
        Greedy { params }
    }

    fn observe_count(&self, trips: usize) -> usize {
        (trips as f64 * self.params.observe_ratio).floor() as usize
    }

    /// Extends `first` with the closest unassigned departure after the chain's
    /// end until none is left. When the next departure would overwork the
    /// driver, the search resumes after a rest.
    fn build_chain(timetable: &Timetable, driver: Driver, bus_id: BusId, first: Trip) -> Chain {
        let mut anchor = first.end_time();
        let mut booked = timetable.trips_of_driver(driver.id());
        booked.push(first.clone());
        let mut trips = vec![first];
        let mut rest_breaks = 0;
        let mut rested = false;

        while let Some(next) = timetable.next_unassigned_trip_after(anchor) {
            if timetable.is_bus_busy_between(bus_id, next.start_time(), next.end_time())
                || timetable.is_driver_busy_between(driver.id(), next.start_time(), next.end_time())
            {
                break;
            }

            booked.push(next.clone());
            if driver.overworks(&booked) {
                booked.pop();
                if rested {
                    break;
                }
                anchor += driver.rest_duration();
                rest_breaks += 1;
                rested = true;
                continue;
            }

            anchor = next.end_time();
            trips.push(next);
            rested = false;
        }

        Chain {
            driver,
            trips,
            rest_breaks,
        }
    }

    fn select_chain(&self, chains: Vec<Chain>) -> Option<Chain> {
        let candidates = chains.len();
        chains
            .into_iter()
            .reduce(|best, chain| match self.params.chain_selection {
                ChainSelection::Longest if chain.len() > best.len() => chain,
                ChainSelection::Legacy if candidates > best.len() => chain,
                _ => best,
            })
    }

    fn candidate_drivers(
        timetable: &Timetable,
        drivers: &DriverHub,
        trip: &Trip,
    ) -> Result<Vec<Driver>, DispatchError> {
        match drivers.get_idle_for(timetable, trip) {
            Some(driver) => Ok(vec![driver]),
            None if drivers.auto_provisioning() => Ok(DriverType::ALL.map(Driver::new).to_vec()),
            None => Err(DispatchError::NoFreeResource(ResourceKind::Driver)),
        }
    }

    fn sweep(
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<usize, DispatchError> {
        let leftovers = timetable.trips_where(Trip::is_unassigned);

        for trip in &leftovers {
            let driver = match drivers.get_idle_for(timetable, trip) {
                Some(driver) => driver,
                None => drivers.provision_if_allowed()?,
            };
            timetable.assign_driver(trip.id(), driver.id())?;

            let bus = buses.get_idle_or_provision(timetable, trip)?;
            timetable.assign_bus(trip.id(), bus.id())?;
        }

        Ok(leftovers.len())
    }
}

impl Optimizer for Greedy {
    #[instrument(skip_all, level = "debug")]
    fn optimize(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<(), DispatchError> {
        let observe = self.observe_count(timetable.len());
        let seeds = timetable.first_n(observe, Trip::is_unassigned);
        let mut chained = 0;

        for trip_id in seeds {
            let Some(trip) = timetable.trip(trip_id) else {
                continue;
            };
            // taken by an earlier chain
            if !trip.is_unassigned() {
                continue;
            }

            let bus = buses.get_idle_or_provision(timetable, &trip)?;
            let candidates = Self::candidate_drivers(timetable, drivers, &trip)?;

            let chains: Vec<Chain> = candidates
                .into_par_iter()
                .map(|driver| Self::build_chain(timetable, driver, bus.id(), trip.clone()))
                .collect();

            let Some(best) = self.select_chain(chains) else {
                continue;
            };

            if drivers.get(best.driver.id()).is_none() {
                debug!(
                    driver_id = %best.driver.id(),
                    driver_type = %best.driver.driver_type(),
                    "hired driver"
                );
                drivers.register(best.driver.clone());
            }

            debug!(
                driver_id = %best.driver.id(),
                bus_id = %bus.id(),
                trips = best.len(),
                rest_breaks = best.rest_breaks,
                "assigning chain"
            );
            for chain_trip in &best.trips {
                timetable.assign_driver(chain_trip.id(), best.driver.id())?;
                timetable.assign_bus(chain_trip.id(), bus.id())?;
            }
            chained += best.len();
        }

        let swept = Self::sweep(timetable, buses, drivers)?;

        info!(
            chained,
            swept,
            drivers = drivers.len(),
            buses = buses.len(),
            "greedy assignment done"
        );

        Ok(())
    }
}
