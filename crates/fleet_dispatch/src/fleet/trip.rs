use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    define_id_newtype,
    fleet::{bus::BusId, driver::DriverId, station::Station, station::StationId},
};

define_id_newtype!(TripId);

/// Drive duration between two consecutive stations of a route.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub from: StationId,
    pub to: StationId,
    pub duration: SignedDuration,
}

impl Leg {
    pub fn new(from: StationId, to: StationId, duration: SignedDuration) -> Self {
        Leg { from, to, duration }
    }
}

/// A single scheduled run of a route.
///
/// The route geometry and the timestamps never change once the trip is in a
/// timetable, only the bus and driver assignments do.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Trip {
    id: TripId,
    points: Vec<Station>,
    number: usize,
    start_time: Timestamp,
    end_time: Timestamp,
    bus_id: Option<BusId>,
    driver_id: Option<DriverId>,
}

impl Trip {
    /// Creates an unassigned trip. The end time equals the start time until the
    /// timetable derives it from its drive-time matrix at registration.
    pub fn new(points: Vec<Station>, number: usize, start_time: Timestamp) -> Self {
        debug_assert!(points.len() >= 2, "a trip needs at least two stations");

        Trip {
            id: TripId::new(),
            points,
            number,
            start_time,
            end_time: start_time,
            bus_id: None,
            driver_id: None,
        }
    }

    /// Same route departing at another time, under a new identity.
    pub fn repeat_at(&self, start_time: Timestamp) -> Self {
        Trip::new(self.points.clone(), self.number, start_time)
    }

    pub fn id(&self) -> TripId {
        self.id
    }

    pub fn points(&self) -> &[Station] {
        &self.points
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn duration(&self) -> SignedDuration {
        self.end_time.duration_since(self.start_time)
    }

    pub fn bus_id(&self) -> Option<BusId> {
        self.bus_id
    }

    pub fn driver_id(&self) -> Option<DriverId> {
        self.driver_id
    }

    pub fn is_planned(&self) -> bool {
        self.bus_id.is_some() && self.driver_id.is_some()
    }

    pub fn is_unassigned(&self) -> bool {
        self.bus_id.is_none() && self.driver_id.is_none()
    }

    /// Origin of the route. `None` only for a trip deserialized without
    /// stations.
    pub fn first(&self) -> Option<&Station> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Station> {
        self.points.last()
    }

    /// Station that follows `station` on the route.
    pub fn next_after(&self, station: StationId) -> Option<&Station> {
        let position = self.points.iter().position(|point| point.id() == station)?;
        self.points.get(position + 1)
    }

    /// Consecutive station pairs in route order.
    pub fn legs(&self) -> impl Iterator<Item = (&Station, &Station)> {
        self.points.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// `start < at < end`: a resource on this trip is free again exactly at
    /// its end time.
    pub fn is_running_at(&self, at: Timestamp) -> bool {
        self.start_time < at && at < self.end_time
    }

    /// Open-interval overlap of `(start, end)` with this trip.
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        self.start_time < end && start < self.end_time
    }

    pub(crate) fn set_end_time(&mut self, end_time: Timestamp) {
        self.end_time = end_time;
    }

    pub(crate) fn set_bus(&mut self, bus_id: BusId) {
        self.bus_id = Some(bus_id);
    }

    pub(crate) fn set_driver(&mut self, driver_id: DriverId) {
        self.driver_id = Some(driver_id);
    }
}
