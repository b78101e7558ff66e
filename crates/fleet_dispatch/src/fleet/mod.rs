pub mod bus;
pub mod driver;
pub mod station;
pub mod trip;
