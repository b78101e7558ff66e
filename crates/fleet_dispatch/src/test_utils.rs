use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};

use crate::{
    clock::{ManualClock, SharedClock},
    fleet::{
        bus::Bus,
        driver::Driver,
        station::Station,
        trip::{Leg, Trip, TripId},
    },
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timetable::Timetable,
};

pub const TEST_DAY: &str = "2024-11-30";

/// `HH:MM` on the test day, UTC.
pub fn at(time: &str) -> Timestamp {
    format!("{TEST_DAY}T{time}:00Z").parse().unwrap()
}

pub fn create_trip(stations: usize, start: Timestamp) -> Trip {
    let points = (0..stations)
        .map(|index| {
            let is_terminal = index == 0 || index == stations - 1;
            Station::new(format!("S{index}"), is_terminal)
        })
        .collect();

    Trip::new(points, 1, start)
}

pub fn create_timed_trip(start: Timestamp, end: Timestamp) -> Trip {
    let mut trip = create_trip(2, start);
    trip.set_end_time(end);
    trip
}

pub fn legs_for(trip: &Trip, minutes: &[i64]) -> Vec<Leg> {
    trip.legs()
        .zip(minutes)
        .map(|((from, to), &mins)| Leg::new(from.id(), to.id(), SignedDuration::from_mins(mins)))
        .collect()
}

pub fn create_timetable_with_legs(minutes: &[i64], start: &str) -> (Timetable, TripId) {
    let timetable = Timetable::new();
    let trip = create_trip(minutes.len() + 1, at(start));
    let legs = legs_for(&trip, minutes);
    let trip_id = trip.id();
    timetable.register_trip(trip, &legs);

    (timetable, trip_id)
}

/// Registers one route departing at every `starts` time. Returns the trip ids
/// in departure order.
pub fn register_route(timetable: &Timetable, minutes: &[i64], starts: &[&str]) -> Vec<TripId> {
    let route = create_trip(minutes.len() + 1, at(starts[0]));
    let legs = legs_for(&route, minutes);

    starts
        .iter()
        .map(|start| {
            let trip = route.repeat_at(at(start));
            let trip_id = trip.id();
            timetable.register_trip(trip, &legs);
            trip_id
        })
        .collect()
}

/// Three 25 minute routes, each departing every 20 minutes from 06:00 to
/// 12:00, so consecutive runs of a route overlap.
pub fn create_dense_timetable() -> Timetable {
    let timetable = Timetable::new();
    let starts: Vec<String> = (0..19)
        .map(|index| {
            let minutes = 6 * 60 + index * 20;
            format!("{:02}:{:02}", minutes / 60, minutes % 60)
        })
        .collect();
    let starts: Vec<&str> = starts.iter().map(String::as_str).collect();

    for _ in 0..3 {
        register_route(&timetable, &[10, 15], &starts);
    }

    timetable
}

pub fn manual_clock(time: &str) -> SharedClock {
    Arc::new(ManualClock::new(at(time)))
}

pub fn create_driver_hub(drivers: impl IntoIterator<Item = Driver>) -> DriverHub {
    let hub = DriverHub::new(manual_clock("05:00"));
    for driver in drivers {
        hub.register(driver);
    }
    hub
}

pub fn create_bus_depot(buses: usize) -> BusDepot {
    let depot = BusDepot::new();
    for _ in 0..buses {
        depot.register(Bus::new());
    }
    depot
}

pub fn assert_complete(timetable: &Timetable) {
    let trips = timetable.all_trips();
    assert!(
        trips.iter().all(Trip::is_planned),
        "{} of {} trips are not fully assigned",
        trips.iter().filter(|trip| !trip.is_planned()).count(),
        trips.len()
    );
}

pub fn assert_no_double_booking(timetable: &Timetable) {
    let trips = timetable.all_trips();
    for (index, a) in trips.iter().enumerate() {
        for b in &trips[index + 1..] {
            if !a.overlaps(b.start_time(), b.end_time()) {
                continue;
            }

            assert!(
                a.bus_id().is_none() || a.bus_id() != b.bus_id(),
                "bus {:?} is booked on overlapping trips",
                a.bus_id()
            );
            assert!(
                a.driver_id().is_none() || a.driver_id() != b.driver_id(),
                "driver {:?} is booked on overlapping trips",
                a.driver_id()
            );
        }
    }
}

pub fn assert_legal(timetable: &Timetable, drivers: &DriverHub) {
    for driver in drivers.enumerate() {
        let trips = timetable.trips_of_driver(driver.id());
        assert!(
            !driver.overworks(&trips),
            "type {} driver {} drives past a work window over {} trips",
            driver.driver_type(),
            driver.id(),
            trips.len()
        );
    }
}
