use jiff::Timestamp;

use crate::{
    error::DispatchError,
    fleet::{
        bus::{Bus, BusId},
        trip::Trip,
    },
    timetable::Timetable,
};

use super::resource_pool::ResourcePool;

#[derive(Default)]
pub struct BusDepot {
    pool: ResourcePool<Bus>,
}

impl BusDepot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_auto_provisioning(mut self) -> Self {
        self.pool.set_auto_provisioning(false);
        self
    }

    pub fn auto_provisioning(&self) -> bool {
        self.pool.auto_provisioning()
    }

    pub fn register(&self, bus: Bus) -> Option<Bus> {
        self.pool.register(bus)
    }

    pub fn get(&self, bus_id: BusId) -> Option<Bus> {
        self.pool.get(bus_id)
    }

    pub fn get_first(&self, predicate: impl Fn(&Bus) -> bool) -> Option<Bus> {
        self.pool.get_first(predicate)
    }

    pub fn each(&self, predicate: impl Fn(&Bus) -> bool) -> Vec<Bus> {
        self.pool.each(predicate)
    }

    pub fn enumerate(&self) -> Vec<Bus> {
        self.pool.enumerate()
    }

    pub fn ids(&self) -> Vec<BusId> {
        self.pool.ids()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn update<T>(&self, bus_id: BusId, f: impl FnOnce(&mut Bus) -> T) -> Option<T> {
        self.pool.update(bus_id, f)
    }

    pub fn provision_if_allowed(&self) -> Result<Bus, DispatchError> {
        self.pool.provision_if_allowed()
    }

    /// Any bus not on a trip at `until`.
    pub fn get_idle(&self, timetable: &Timetable, until: Timestamp) -> Option<Bus> {
        self.pool
            .get_first(|bus| !timetable.is_bus_busy_at(bus.id(), until))
    }

    /// Any bus with no booking overlapping `trip`.
    pub fn get_idle_for(&self, timetable: &Timetable, trip: &Trip) -> Option<Bus> {
        self.pool.get_first(|bus| {
            !timetable.is_bus_busy_between(bus.id(), trip.start_time(), trip.end_time())
        })
    }

    pub fn get_idle_or_provision(
        &self,
        timetable: &Timetable,
        trip: &Trip,
    ) -> Result<Bus, DispatchError> {
        match self.get_idle_for(timetable, trip) {
            Some(bus) => Ok(bus),
            None => self.provision_if_allowed(),
        }
    }
}
