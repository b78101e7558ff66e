pub mod clock;
pub mod error;
pub mod fleet;
pub mod optimizer;
pub mod pool;
pub mod scenario;
pub mod timetable;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
