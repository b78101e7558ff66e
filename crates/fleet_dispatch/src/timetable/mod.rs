pub mod drive_times;
mod registry;

pub use registry::{NEXT_TRIP_WINDOW, ResourceRef, Timetable};
