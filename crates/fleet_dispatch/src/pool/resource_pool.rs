use std::{fmt::Display, hash::Hash};

use fxhash::FxHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    error::{DispatchError, ResourceKind},
    fleet::{
        bus::{Bus, BusId},
        driver::{Driver, DriverId},
    },
    timetable::ResourceRef,
};

/// Anything a pool can hand out to a trip.
pub trait Resource: Clone + Send + Sync {
    type Id: Copy + Eq + Hash + Display + Into<ResourceRef> + Send + Sync;

    const KIND: ResourceKind;

    fn id(&self) -> Self::Id;

    /// Resource manufactured when the pool runs dry.
    fn provision() -> Self;
}

impl Resource for Bus {
    type Id = BusId;

    const KIND: ResourceKind = ResourceKind::Bus;

    fn id(&self) -> BusId {
        Bus::id(self)
    }

    fn provision() -> Self {
        Bus::new()
    }
}

impl Resource for Driver {
    type Id = DriverId;

    const KIND: ResourceKind = ResourceKind::Driver;

    fn id(&self) -> DriverId {
        Driver::id(self)
    }

    fn provision() -> Self {
        Driver::type_a()
    }
}

/// Resource registry behind its own lock. Lookups hand out clones; updates go
/// through `update` so the lock is never held by the caller.
pub struct ResourcePool<R: Resource> {
    resources: RwLock<FxHashMap<R::Id, R>>,
    auto_provisioning: bool,
}

impl<R: Resource> Default for ResourcePool<R> {
    fn default() -> Self {
        ResourcePool {
            resources: RwLock::new(FxHashMap::default()),
            auto_provisioning: true,
        }
    }
}

impl<R: Resource> ResourcePool<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_auto_provisioning(&mut self, auto_provisioning: bool) -> &mut Self {
        self.auto_provisioning = auto_provisioning;
        self
    }

    pub fn auto_provisioning(&self) -> bool {
        self.auto_provisioning
    }

    /// Inserts or overwrites by id. Returns the overwritten resource.
    pub fn register(&self, resource: R) -> Option<R> {
        self.resources.write().insert(resource.id(), resource)
    }

    pub fn get(&self, id: R::Id) -> Option<R> {
        self.resources.read().get(&id).cloned()
    }

    /// First resource matching `predicate`, in no particular order.
    pub fn get_first(&self, predicate: impl Fn(&R) -> bool) -> Option<R> {
        self.resources
            .read()
            .values()
            .find(|resource| predicate(resource))
            .cloned()
    }

    pub fn each(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.resources
            .read()
            .values()
            .filter(|resource| predicate(resource))
            .cloned()
            .collect()
    }

    pub fn enumerate(&self) -> Vec<R> {
        self.resources.read().values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<R::Id> {
        self.resources.read().keys().copied().collect()
    }

    pub fn contains(&self, id: R::Id) -> bool {
        self.resources.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    pub fn update<T>(&self, id: R::Id, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        self.resources.write().get_mut(&id).map(f)
    }

    pub fn update_all(&self, mut f: impl FnMut(&mut R)) {
        self.resources.write().values_mut().for_each(|resource| f(resource));
    }

    /// Registers and returns a fresh default resource, or fails with
    /// `NoFreeResource` when the pool may not grow.
    pub fn provision_if_allowed(&self) -> Result<R, DispatchError> {
        if !self.auto_provisioning {
            return Err(DispatchError::NoFreeResource(R::KIND));
        }

        let resource = R::provision();
        debug!(kind = %R::KIND, id = %resource.id(), "provisioned resource");
        self.register(resource.clone());

        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::driver::DriverType;

    #[test]
    fn test_register_overwrites_by_id() {
        let pool = ResourcePool::<Bus>::new();
        let bus = Bus::with_capacity(10);

        assert!(pool.register(bus.clone()).is_none());
        assert_eq!(pool.register(bus.clone()), Some(bus.clone()));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(bus.id()), Some(bus));
    }

    #[test]
    fn test_predicates() {
        let pool = ResourcePool::<Driver>::new();
        pool.register(Driver::type_a());
        pool.register(Driver::type_a());
        pool.register(Driver::type_b());

        let type_b = pool
            .get_first(|driver| driver.driver_type() == DriverType::B)
            .unwrap();
        assert_eq!(type_b.driver_type(), DriverType::B);
        assert_eq!(
            pool.each(|driver| driver.driver_type() == DriverType::A)
                .len(),
            2
        );
        assert_eq!(pool.enumerate().len(), 3);
        assert!(pool.get_first(|_| false).is_none());
    }

    #[test]
    fn test_provisioning_registers_default_resource() {
        let pool = ResourcePool::<Driver>::new();

        let driver = pool.provision_if_allowed().unwrap();

        assert_eq!(driver.driver_type(), DriverType::A);
        assert!(pool.contains(driver.id()));
    }

    #[test]
    fn test_disabled_provisioning_fails() {
        let mut pool = ResourcePool::<Bus>::new();
        pool.set_auto_provisioning(false);

        assert_eq!(
            pool.provision_if_allowed(),
            Err(DispatchError::NoFreeResource(ResourceKind::Bus))
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn test_update_mutates_in_place() {
        let pool = ResourcePool::<Bus>::new();
        let bus = Bus::with_capacity(10);
        let bus_id = bus.id();
        pool.register(bus);

        pool.update(bus_id, |bus| bus.serve_station(0, 4));

        assert_eq!(pool.get(bus_id).map(|bus| bus.load()), Some(4));
        assert!(pool.update(BusId::new(), |bus| bus.load()).is_none());
    }
}
