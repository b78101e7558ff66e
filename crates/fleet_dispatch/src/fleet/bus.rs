use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    define_id_newtype,
    error::DispatchError,
    fleet::{driver::DriverId, station::Station, trip::Trip},
    timetable::Timetable,
};

define_id_newtype!(BusId);

pub const DEFAULT_BUS_CAPACITY: u32 = 50;

/// A bus and its live position along the trip it currently follows.
///
/// Dispatch only cares about the identity, the rest is bookkeeping for
/// whoever moves the bus along its route.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bus {
    id: BusId,
    capacity: u32,
    load: u32,
    on_trip: bool,
    driver_id: Option<DriverId>,
    trip: Option<Trip>,
    last: Option<Station>,
    next: Option<Station>,
    last_stop_time: Option<Timestamp>,
    next_stop_time: Option<Timestamp>,
}

impl Default for Bus {
    fn default() -> Self {
        Bus::with_capacity(DEFAULT_BUS_CAPACITY)
    }
}

impl Bus {
    pub fn new() -> Self {
        Bus::default()
    }

    pub fn with_capacity(capacity: u32) -> Self {
        Bus {
            id: BusId::new(),
            capacity,
            load: 0,
            on_trip: false,
            driver_id: None,
            trip: None,
            last: None,
            next: None,
            last_stop_time: None,
            next_stop_time: None,
        }
    }

    pub fn id(&self) -> BusId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn load(&self) -> u32 {
        self.load
    }

    pub fn is_on_trip(&self) -> bool {
        self.on_trip
    }

    pub fn driver_id(&self) -> Option<DriverId> {
        self.driver_id
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn last_station(&self) -> Option<&Station> {
        self.last.as_ref()
    }

    pub fn next_station(&self) -> Option<&Station> {
        self.next.as_ref()
    }

    pub fn last_stop_time(&self) -> Option<Timestamp> {
        self.last_stop_time
    }

    pub fn next_stop_time(&self) -> Option<Timestamp> {
        self.next_stop_time
    }

    fn is_at_route_end(&self) -> bool {
        match (&self.trip, &self.last) {
            (Some(trip), Some(last)) => trip.last().is_some_and(|end| end.id() == last.id()),
            _ => false,
        }
    }

    /// Puts the bus on `trip`, parked at its first station. Only allowed when
    /// the bus has no trip yet or stands at the terminus of the current one.
    pub fn change_trip(&mut self, trip: Trip) -> Result<(), DispatchError> {
        if self.trip.is_some() && !self.is_at_route_end() {
            return Err(DispatchError::BusNotAtSafeRepositionPoint);
        }

        let first = trip.first().ok_or(DispatchError::NoNextRoutePoint)?.clone();
        self.next = trip.next_after(first.id()).cloned();
        self.last = Some(first);
        self.trip = Some(trip);
        self.on_trip = false;
        self.last_stop_time = None;
        self.next_stop_time = None;

        Ok(())
    }

    /// Departs from the first station at `now`.
    pub fn start_trip(
        &mut self,
        timetable: &Timetable,
        now: Timestamp,
    ) -> Result<(), DispatchError> {
        let last = self.last.as_ref().ok_or(DispatchError::NoActiveTrip)?;
        let next = self.next.as_ref().ok_or(DispatchError::NoNextRoutePoint)?;

        self.next_stop_time = Some(now + timetable.drive_time(last.id(), next.id()));
        self.last_stop_time = Some(now);
        self.on_trip = true;

        Ok(())
    }

    /// Whether the bus should have reached its next stop by `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.on_trip && self.next_stop_time.is_some_and(|next_stop| now >= next_stop)
    }

    /// Consumes the next leg of the route: the bus arrives at its next stop at
    /// `now` and heads for the one after. Returns the station reached.
    pub fn advance(
        &mut self,
        timetable: &Timetable,
        now: Timestamp,
    ) -> Result<&Station, DispatchError> {
        let trip = self.trip.as_ref().ok_or(DispatchError::NoActiveTrip)?;
        if self.is_at_route_end() {
            return Err(DispatchError::TripAlreadyAtRouteEnd);
        }

        let reached = self.next.take().ok_or(DispatchError::NoNextRoutePoint)?;
        let reached_end = trip.last().is_none_or(|end| end.id() == reached.id());

        if reached_end {
            self.next_stop_time = None;
            self.on_trip = false;
        } else {
            let next = trip
                .next_after(reached.id())
                .ok_or(DispatchError::NoNextRoutePoint)?
                .clone();
            self.next_stop_time = Some(now + timetable.drive_time(reached.id(), next.id()));
            self.next = Some(next);
        }

        self.last_stop_time = Some(now);
        Ok(self.last.insert(reached))
    }

    /// Passengers leave, then board. The load stays within `[0, capacity]`.
    pub fn serve_station(&mut self, alighting: u32, boarding: u32) {
        self.load = self.load.saturating_sub(alighting);
        self.load = self.load.saturating_add(boarding).min(self.capacity);
    }

    pub fn swap_driver(&mut self, driver_id: DriverId) -> Option<DriverId> {
        self.driver_id.replace(driver_id)
    }
}
