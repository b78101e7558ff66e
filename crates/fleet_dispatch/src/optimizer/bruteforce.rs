use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::DispatchError,
    fleet::{
        bus::Bus,
        driver::{Driver, DriverType},
    },
    pool::{bus_depot::BusDepot, driver_hub::DriverHub},
    timetable::Timetable,
};

use super::Optimizer;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct BruteforceParams {
    /// Makes the type of hired drivers reproducible.
    pub seed: Option<u64>,
}

/// First fit, trip by trip. Whatever the pools cannot supply is hired on the
/// spot, so every trip ends up assigned even when the pools may not grow.
pub struct Bruteforce {
    params: BruteforceParams,
}

impl Bruteforce {
    pub fn new(params: BruteforceParams) -> Self {
        Bruteforce { params }
    }

    fn hire_driver(drivers: &DriverHub, rng: &mut SmallRng) -> Driver {
        let driver_type = if rng.random_bool(0.5) {
            DriverType::A
        } else {
            DriverType::B
        };

        let driver = Driver::new(driver_type);
        debug!(driver_id = %driver.id(), %driver_type, "hired driver");
        drivers.register(driver.clone());

        driver
    }

    fn buy_bus(buses: &BusDepot) -> Bus {
        let bus = Bus::new();
        debug!(bus_id = %bus.id(), "added bus");
        buses.register(bus.clone());

        bus
    }
}

impl Default for Bruteforce {
    fn default() -> Self {
        Bruteforce::new(BruteforceParams::default())
    }
}

impl Optimizer for Bruteforce {
    #[instrument(skip_all, level = "debug")]
    fn optimize(
        &self,
        timetable: &Timetable,
        buses: &BusDepot,
        drivers: &DriverHub,
    ) -> Result<(), DispatchError> {
        let mut rng = match self.params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        for trip in timetable.all_trips() {
            if trip.driver_id().is_none() {
                let driver = match drivers.get_idle_for(timetable, &trip) {
                    Some(driver) => driver,
                    None => Self::hire_driver(drivers, &mut rng),
                };
                timetable.assign_driver(trip.id(), driver.id())?;
            }

            if trip.bus_id().is_none() {
                let bus = match buses.get_idle_for(timetable, &trip) {
                    Some(bus) => bus,
                    None => Self::buy_bus(buses),
                };
                timetable.assign_bus(trip.id(), bus.id())?;
            }
        }

        info!(
            trips = timetable.len(),
            drivers = drivers.len(),
            buses = buses.len(),
            "bruteforce assignment done"
        );

        Ok(())
    }
}
