use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::fleet::trip::TripId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    Bus,
    Driver,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Bus => write!(f, "bus"),
            ResourceKind::Driver => write!(f, "driver"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Bus already reached the end of its trip")]
    TripAlreadyAtRouteEnd,
    #[error("Cannot find the next point of the route")]
    NoNextRoutePoint,
    #[error("Bus is not at a safe point to change its trip")]
    BusNotAtSafeRepositionPoint,
    #[error("Bus has no active trip")]
    NoActiveTrip,
    #[error("No free {0} available and auto-provisioning is disabled")]
    NoFreeResource(ResourceKind),
    #[error("Trip {0} is not registered in the timetable")]
    UnknownTrip(TripId),
}
