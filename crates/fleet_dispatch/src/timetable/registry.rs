use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    error::DispatchError,
    fleet::{
        bus::BusId,
        driver::DriverId,
        station::{Station, StationId},
        trip::{Leg, Trip, TripId},
    },
};

use super::drive_times::DriveTimes;

/// How far ahead `next_unassigned_trip_after` looks for a departure.
pub const NEXT_TRIP_WINDOW: SignedDuration = SignedDuration::from_mins(30);

/// The resource side of an assignment, used by queries that work the same
/// way for buses and drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Bus(BusId),
    Driver(DriverId),
}

impl ResourceRef {
    pub fn is_assigned_to(&self, trip: &Trip) -> bool {
        match self {
            ResourceRef::Bus(bus_id) => trip.bus_id() == Some(*bus_id),
            ResourceRef::Driver(driver_id) => trip.driver_id() == Some(*driver_id),
        }
    }
}

impl From<BusId> for ResourceRef {
    fn from(bus_id: BusId) -> Self {
        ResourceRef::Bus(bus_id)
    }
}

impl From<DriverId> for ResourceRef {
    fn from(driver_id: DriverId) -> Self {
        ResourceRef::Driver(driver_id)
    }
}

/// Source of truth for every trip, the stations they visit and the drive
/// times between those stations.
///
/// Each registry sits behind its own lock. Nothing here spans two registries
/// or two writes atomically: `assign_bus` and `assign_driver` are separate
/// writes and a reader may observe a trip with only one of them applied.
#[derive(Default)]
pub struct Timetable {
    trips: RwLock<FxHashMap<TripId, Trip>>,
    stations: RwLock<FxHashMap<StationId, Station>>,
    drive_times: RwLock<DriveTimes>,
}

impl Timetable {
    pub fn new() -> Self {
        Timetable::default()
    }

    /// Adds `trip` unless a trip with the same id is already registered.
    ///
    /// Supplied legs of the trip's route are installed in both directions when
    /// the pair is not known yet, any remaining unknown pair gets the fallback
    /// drive time. The trip's end time is derived from the resulting matrix.
    /// Returns whether the trip was inserted.
    pub fn register_trip(&self, mut trip: Trip, legs: &[Leg]) -> bool {
        if self.trips.read().contains_key(&trip.id()) {
            debug!(trip_id = %trip.id(), "trip already registered");
            return false;
        }

        {
            let mut stations = self.stations.write();
            for point in trip.points() {
                stations
                    .entry(point.id())
                    .or_insert_with(|| point.clone());
            }
        }

        let route_duration = {
            let mut drive_times = self.drive_times.write();
            let on_route = |leg: &Leg| {
                trip.legs().any(|(from, to)| {
                    (from.id(), to.id()) == (leg.from, leg.to)
                        || (from.id(), to.id()) == (leg.to, leg.from)
                })
            };
            for leg in legs.iter().filter(|leg| on_route(leg)) {
                if !drive_times.contains(leg.from, leg.to) {
                    drive_times.insert(leg.from, leg.to, leg.duration);
                }
            }

            trip.legs().fold(SignedDuration::ZERO, |total, (from, to)| {
                total + drive_times.get_or_insert_fallback(from.id(), to.id())
            })
        };
        trip.set_end_time(trip.start_time() + route_duration);

        let mut trips = self.trips.write();
        if trips.contains_key(&trip.id()) {
            return false;
        }
        trips.insert(trip.id(), trip);

        true
    }

    pub fn len(&self) -> usize {
        self.trips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.read().is_empty()
    }

    pub fn trip(&self, trip_id: TripId) -> Option<Trip> {
        self.trips.read().get(&trip_id).cloned()
    }

    /// Every trip, in no particular order.
    pub fn all_trips(&self) -> Vec<Trip> {
        self.trips.read().values().cloned().collect()
    }

    pub fn trips_where(&self, predicate: impl Fn(&Trip) -> bool) -> Vec<Trip> {
        self.trips
            .read()
            .values()
            .filter(|trip| predicate(trip))
            .cloned()
            .collect()
    }

    /// Up to `n` ids of trips matching `predicate`. The registry is unordered,
    /// so which trips are picked is unspecified.
    pub fn first_n(&self, n: usize, predicate: impl Fn(&Trip) -> bool) -> Vec<TripId> {
        self.trips
            .read()
            .values()
            .filter(|trip| predicate(trip))
            .map(Trip::id)
            .take(n)
            .collect()
    }

    pub fn trips_of(&self, resource: impl Into<ResourceRef>) -> Vec<Trip> {
        let resource = resource.into();
        self.trips_where(|trip| resource.is_assigned_to(trip))
    }

    pub fn trips_of_bus(&self, bus_id: BusId) -> Vec<Trip> {
        self.trips_of(bus_id)
    }

    pub fn trips_of_driver(&self, driver_id: DriverId) -> Vec<Trip> {
        self.trips_of(driver_id)
    }

    pub fn station(&self, station_id: StationId) -> Option<Station> {
        self.stations.read().get(&station_id).cloned()
    }

    pub fn stations(&self) -> Vec<Station> {
        self.stations.read().values().cloned().collect()
    }

    /// Drive time between two stations. An unknown pair gets the fallback
    /// duration, which is cached for later lookups.
    pub fn drive_time(&self, from: StationId, to: StationId) -> SignedDuration {
        if let Some(duration) = self.drive_times.read().get(from, to) {
            return duration;
        }

        self.drive_times.write().get_or_insert_fallback(from, to)
    }

    /// True iff a trip assigned to `resource` runs at `at`, exclusive of its
    /// start and end.
    pub fn is_busy_at(&self, resource: impl Into<ResourceRef>, at: Timestamp) -> bool {
        let resource = resource.into();
        self.trips
            .read()
            .values()
            .any(|trip| resource.is_assigned_to(trip) && trip.is_running_at(at))
    }

    pub fn is_bus_busy_at(&self, bus_id: BusId, at: Timestamp) -> bool {
        self.is_busy_at(bus_id, at)
    }

    pub fn is_driver_busy_at(&self, driver_id: DriverId, at: Timestamp) -> bool {
        self.is_busy_at(driver_id, at)
    }

    /// True iff a trip assigned to `resource` overlaps the open interval
    /// `(start, end)`.
    pub fn is_busy_between(
        &self,
        resource: impl Into<ResourceRef>,
        start: Timestamp,
        end: Timestamp,
    ) -> bool {
        let resource = resource.into();
        self.trips
            .read()
            .values()
            .any(|trip| resource.is_assigned_to(trip) && trip.overlaps(start, end))
    }

    pub fn is_bus_busy_between(&self, bus_id: BusId, start: Timestamp, end: Timestamp) -> bool {
        self.is_busy_between(bus_id, start, end)
    }

    pub fn is_driver_busy_between(
        &self,
        driver_id: DriverId,
        start: Timestamp,
        end: Timestamp,
    ) -> bool {
        self.is_busy_between(driver_id, start, end)
    }

    /// Station the resource last reached at `at`, walking the legs of the trip
    /// that covers `at` (`start <= at < end`). `None` when no trip covers it.
    pub fn position_at(
        &self,
        resource: impl Into<ResourceRef>,
        at: Timestamp,
    ) -> Option<StationId> {
        let resource = resource.into();
        let trip = self
            .trips
            .read()
            .values()
            .find(|trip| {
                resource.is_assigned_to(trip) && trip.start_time() <= at && at < trip.end_time()
            })
            .cloned()?;

        let mut departed_at = trip.start_time();
        for (from, to) in trip.legs() {
            let arrival = departed_at + self.drive_time(from.id(), to.id());
            if at < arrival {
                return Some(from.id());
            }
            departed_at = arrival;
        }

        trip.last().map(Station::id)
    }

    /// The fully unassigned trip departing soonest in `(at, at + 30min]`.
    /// Trips sharing a departure time are returned in no particular order.
    pub fn next_unassigned_trip_after(&self, at: Timestamp) -> Option<Trip> {
        let horizon = at + NEXT_TRIP_WINDOW;
        self.trips
            .read()
            .values()
            .filter(|trip| {
                trip.is_unassigned() && trip.start_time() > at && trip.start_time() <= horizon
            })
            .min_by_key(|trip| trip.start_time().duration_since(at))
            .cloned()
    }

    pub fn assign_bus(&self, trip_id: TripId, bus_id: BusId) -> Result<(), DispatchError> {
        let mut trips = self.trips.write();
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(DispatchError::UnknownTrip(trip_id))?;
        trip.set_bus(bus_id);
        Ok(())
    }

    pub fn assign_driver(&self, trip_id: TripId, driver_id: DriverId) -> Result<(), DispatchError> {
        let mut trips = self.trips.write();
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(DispatchError::UnknownTrip(trip_id))?;
        trip.set_driver(driver_id);
        Ok(())
    }

    pub fn planned_count(&self) -> usize {
        self.trips
            .read()
            .values()
            .filter(|trip| trip.is_planned())
            .count()
    }
}
