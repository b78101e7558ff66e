pub mod bus_depot;
pub mod driver_hub;
pub mod resource_pool;
