use std::ops::Range;

use jiff::{SignedDuration, Timestamp};
use rand::{Rng, seq::IndexedRandom};
use tracing::{debug, instrument};

use crate::{
    clock::SharedClock,
    fleet::{
        bus::Bus,
        driver::{Driver, DriverType},
        station::Station,
        trip::{Leg, Trip},
    },
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timetable::Timetable,
};

use super::ScenarioParams;

/// One route and all of its departures.
#[derive(Debug, Clone)]
pub struct Route {
    pub number: usize,
    pub legs: Vec<Leg>,
    pub departures: Vec<Trip>,
}

impl Route {
    pub fn stations(&self) -> &[Station] {
        self.departures
            .first()
            .map(|trip| trip.points())
            .unwrap_or_default()
    }
}

/// A generated problem that can be instantiated any number of times, so every
/// optimizer works on the same trips.
#[derive(Debug, Clone)]
pub struct Scenario {
    terminals: Vec<Station>,
    routes: Vec<Route>,
    buses: usize,
    drivers_a: usize,
    drivers_b: usize,
    service_start: Timestamp,
}

/// Fresh timetable and pools built from a scenario.
pub struct ScenarioInstance {
    pub timetable: Timetable,
    pub buses: BusDepot,
    pub drivers: DriverHub,
}

fn pick<T>(rng: &mut impl Rng, range: &Range<T>) -> T
where
    T: Copy + PartialOrd + rand::distr::uniform::SampleUniform,
{
    if range.start < range.end {
        rng.random_range(range.clone())
    } else {
        range.start
    }
}

impl Scenario {
    #[instrument(skip_all, level = "debug")]
    pub fn generate(params: &ScenarioParams, rng: &mut impl Rng) -> Self {
        let terminals: Vec<Station> = (1..=params.terminal_stations)
            .map(|index| Station::terminal(format!("Terminal {index}")))
            .collect();

        let routes = if terminals.is_empty() {
            Vec::new()
        } else {
            (1..=params.distinct_routes)
                .map(|number| Self::generate_route(params, &terminals, number, rng))
                .collect()
        };

        let scenario = Scenario {
            terminals,
            routes,
            buses: params.bus_count(),
            drivers_a: params.drivers_a,
            drivers_b: params.drivers_b,
            service_start: params.service_day
                + SignedDuration::from_hours(params.service_hours.start),
        };
        debug!(
            routes = scenario.routes.len(),
            trips = scenario.trip_count(),
            "generated scenario"
        );

        scenario
    }

    fn generate_route(
        params: &ScenarioParams,
        terminals: &[Station],
        number: usize,
        rng: &mut impl Rng,
    ) -> Route {
        let origin = rng.random_range(0..terminals.len());
        // distinct termini whenever there is a choice
        let destination = if terminals.len() > 1 {
            (origin + rng.random_range(1..terminals.len())) % terminals.len()
        } else {
            origin
        };

        let stations = pick(rng, &params.stations_per_route).max(2);
        let mut points = Vec::with_capacity(stations);
        points.push(terminals[origin].clone());
        points.extend(
            (1..stations - 1).map(|stop| Station::stop(format!("Route {number} stop {stop}"))),
        );
        points.push(terminals[destination].clone());

        let legs = points
            .windows(2)
            .map(|pair| {
                let minutes = pick(rng, &params.leg_minutes);
                Leg::new(pair[0].id(), pair[1].id(), SignedDuration::from_mins(minutes))
            })
            .collect();

        let template = Trip::new(points, number, params.service_day);
        let departures = (0..params.repetitions)
            .map(|_| {
                let hour = pick(rng, &params.service_hours);
                let minute = params.departure_minutes.choose(rng).copied().unwrap_or(0);
                let start = params.service_day
                    + SignedDuration::from_hours(hour)
                    + SignedDuration::from_mins(minute);

                template.repeat_at(start)
            })
            .collect();

        Route {
            number,
            legs,
            departures,
        }
    }

    pub fn terminals(&self) -> &[Station] {
        &self.terminals
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn trip_count(&self) -> usize {
        self.routes.iter().map(|route| route.departures.len()).sum()
    }

    /// Start of the first service hour, a natural starting point for clocks.
    pub fn service_start(&self) -> Timestamp {
        self.service_start
    }

    /// Registers every departure in a new timetable and stocks new pools with
    /// the initial buses and drivers.
    pub fn instantiate(&self, clock: SharedClock) -> ScenarioInstance {
        let timetable = Timetable::new();
        for route in &self.routes {
            for trip in &route.departures {
                timetable.register_trip(trip.clone(), &route.legs);
            }
        }

        let buses = BusDepot::new();
        for _ in 0..self.buses {
            buses.register(Bus::new());
        }

        let drivers = DriverHub::new(clock);
        let driver_types = std::iter::repeat_n(DriverType::A, self.drivers_a)
            .chain(std::iter::repeat_n(DriverType::B, self.drivers_b));
        for driver_type in driver_types {
            drivers.register(Driver::new(driver_type));
        }

        ScenarioInstance {
            timetable,
            buses,
            drivers,
        }
    }
}
