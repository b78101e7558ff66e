use jiff::Timestamp;
use tracing::{debug, info};

use crate::{
    clock::SharedClock,
    error::DispatchError,
    fleet::{
        driver::{Driver, DriverId},
        trip::Trip,
    },
    timetable::Timetable,
};

use super::resource_pool::ResourcePool;

/// The drivers of the fleet and their availability.
pub struct DriverHub {
    pool: ResourcePool<Driver>,
    clock: SharedClock,
}

impl DriverHub {
    pub fn new(clock: SharedClock) -> Self {
        DriverHub {
            pool: ResourcePool::new(),
            clock,
        }
    }

    pub fn without_auto_provisioning(mut self) -> Self {
        self.pool.set_auto_provisioning(false);
        self
    }

    pub fn auto_provisioning(&self) -> bool {
        self.pool.auto_provisioning()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn register(&self, driver: Driver) -> Option<Driver> {
        self.pool.register(driver)
    }

    pub fn get(&self, driver_id: DriverId) -> Option<Driver> {
        self.pool.get(driver_id)
    }

    pub fn get_first(&self, predicate: impl Fn(&Driver) -> bool) -> Option<Driver> {
        self.pool.get_first(predicate)
    }

    pub fn each(&self, predicate: impl Fn(&Driver) -> bool) -> Vec<Driver> {
        self.pool.each(predicate)
    }

    pub fn enumerate(&self) -> Vec<Driver> {
        self.pool.enumerate()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn provision_if_allowed(&self) -> Result<Driver, DispatchError> {
        self.pool.provision_if_allowed()
    }

    /// A driver that can take work starting at `until`.
    ///
    /// Only the first driver that is available and not on a trip at `until` is
    /// considered. If driving the trips it finished by `until` already calls
    /// for rest, no driver is returned even though others may qualify.
    pub fn get_idle(&self, timetable: &Timetable, until: Timestamp) -> Option<Driver> {
        let now = self.clock.now();
        let candidate = self.pool.get_first(|driver| {
            driver.is_available_at(now) && !timetable.is_driver_busy_at(driver.id(), until)
        })?;

        self.check_legality(timetable, candidate, until)
    }

    /// Same as `get_idle` for `trip.start_time`, except the driver must be free
    /// over the whole trip rather than at its start, and taking the trip must
    /// keep every work window of the driver within the work duration.
    pub fn get_idle_for(&self, timetable: &Timetable, trip: &Trip) -> Option<Driver> {
        let now = self.clock.now();
        let candidate = self.pool.get_first(|driver| {
            driver.is_available_at(now)
                && !timetable.is_driver_busy_between(
                    driver.id(),
                    trip.start_time(),
                    trip.end_time(),
                )
        })?;

        let mut booked = timetable.trips_of_driver(candidate.id());
        booked.push(trip.clone());
        if candidate.overworks(&booked) {
            debug!(
                driver_id = %candidate.id(),
                trips = booked.len(),
                "trip would overwork driver"
            );
            return None;
        }

        Some(candidate)
    }

    fn check_legality(
        &self,
        timetable: &Timetable,
        candidate: Driver,
        until: Timestamp,
    ) -> Option<Driver> {
        let driven = timetable.trips_where(|trip| {
            trip.driver_id() == Some(candidate.id()) && trip.end_time() <= until
        });

        if candidate.needs_rest(&driven) {
            debug!(driver_id = %candidate.id(), trips = driven.len(), "driver needs rest");
            return None;
        }

        Some(candidate)
    }

    /// Sends the driver on one rest slice from now. Returns whether the driver
    /// is known.
    pub fn rest(&self, driver_id: DriverId) -> bool {
        let now = self.clock.now();
        self.pool
            .update(driver_id, |driver| driver.rest(now))
            .is_some()
    }

    /// Moves every driver one day forward in its workday/weekend cycle.
    pub fn start_new_day(&self) {
        self.pool.update_all(Driver::new_day_session);

        let active = self.pool.each(Driver::is_active_today).len();
        info!(drivers = self.pool.len(), active, "started a new day");
    }
}
