use std::fmt::Display;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{define_id_newtype, fleet::trip::Trip};

define_id_newtype!(DriverId);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverType {
    A,
    B,
}

impl DriverType {
    pub const ALL: [DriverType; 2] = [DriverType::A, DriverType::B];

    pub fn policy(&self) -> DriverPolicy {
        match self {
            DriverType::A => DriverPolicy::TYPE_A,
            DriverType::B => DriverPolicy::TYPE_B,
        }
    }
}

impl Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverType::A => write!(f, "A"),
            DriverType::B => write!(f, "B"),
        }
    }
}

/// Work and rest limits shared by every driver of a type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverPolicy {
    /// Cumulative driving allowed before a rest is mandatory.
    pub work_duration: SignedDuration,
    pub rest_duration: SignedDuration,
    /// Rest is granted one slice at a time.
    pub rest_slices: i32,
    pub work_days: u32,
    pub weekend_days: u32,
}

impl DriverPolicy {
    pub const TYPE_A: DriverPolicy = DriverPolicy {
        work_duration: SignedDuration::from_hours(8),
        rest_duration: SignedDuration::from_hours(1),
        rest_slices: 1,
        work_days: 5,
        weekend_days: 2,
    };

    pub const TYPE_B: DriverPolicy = DriverPolicy {
        work_duration: SignedDuration::from_hours(24),
        rest_duration: SignedDuration::from_hours(4),
        rest_slices: 12,
        work_days: 5,
        weekend_days: 2,
    };

    pub fn rest_slice(&self) -> SignedDuration {
        self.rest_duration / self.rest_slices.max(1)
    }

    fn cycle_days(&self) -> u32 {
        (self.work_days + self.weekend_days).max(1)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSession {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Driver {
    id: DriverId,
    driver_type: DriverType,
    policy: DriverPolicy,
    work_session: Option<WorkSession>,
    remaining_work: SignedDuration,
    ready_to_work_at: Option<Timestamp>,
    /// Position in the workday/weekend cycle, workdays come first.
    cycle_day: u32,
}

impl Driver {
    pub fn new(driver_type: DriverType) -> Self {
        let policy = driver_type.policy();
        Driver {
            id: DriverId::new(),
            driver_type,
            policy,
            work_session: None,
            remaining_work: policy.work_duration,
            ready_to_work_at: None,
            cycle_day: 0,
        }
    }

    pub fn type_a() -> Self {
        Self::new(DriverType::A)
    }

    pub fn type_b() -> Self {
        Self::new(DriverType::B)
    }

    pub fn id(&self) -> DriverId {
        self.id
    }

    pub fn driver_type(&self) -> DriverType {
        self.driver_type
    }

    pub fn policy(&self) -> &DriverPolicy {
        &self.policy
    }

    pub fn work_duration(&self) -> SignedDuration {
        self.policy.work_duration
    }

    pub fn rest_duration(&self) -> SignedDuration {
        self.policy.rest_duration
    }

    pub fn ready_to_work_at(&self) -> Option<Timestamp> {
        self.ready_to_work_at
    }

    pub fn remaining_work(&self) -> SignedDuration {
        self.remaining_work
    }

    pub fn work_session(&self) -> Option<&WorkSession> {
        self.work_session.as_ref()
    }

    /// Whether driving `trips` exceeds the work duration. Counts active
    /// driving time only, the gaps between trips are ignored.
    pub fn needs_rest(&self, trips: &[Trip]) -> bool {
        let mut sorted: Vec<&Trip> = trips.iter().collect();
        sorted.sort_by(|a, b| b.start_time().cmp(&a.start_time()));

        let mut driven = SignedDuration::ZERO;
        for trip in sorted {
            driven += trip.duration();
            if driven > self.policy.work_duration {
                return true;
            }
        }

        false
    }

    /// Whether some continuous work window of `trips` drives longer than the
    /// work duration. A window ends at a break of at least the rest duration.
    pub fn overworks(&self, trips: &[Trip]) -> bool {
        let mut sorted: Vec<&Trip> = trips.iter().collect();
        sorted.sort_by_key(|trip| trip.start_time());

        let mut driven = SignedDuration::ZERO;
        let mut window_end: Option<Timestamp> = None;
        for trip in sorted {
            let rested = window_end.is_some_and(|end| {
                trip.start_time().duration_since(end) >= self.policy.rest_duration
            });
            if rested {
                driven = SignedDuration::ZERO;
            }

            driven += trip.duration();
            if driven > self.policy.work_duration {
                return true;
            }
            window_end = Some(window_end.map_or(trip.end_time(), |end| end.max(trip.end_time())));
        }

        false
    }

    /// Grants one rest slice starting at `now`.
    pub fn rest(&mut self, now: Timestamp) {
        self.ready_to_work_at = Some(now + self.policy.rest_slice());
    }

    pub fn is_ready_at(&self, now: Timestamp) -> bool {
        self.ready_to_work_at
            .is_none_or(|ready_to_work_at| now >= ready_to_work_at)
    }

    pub fn is_active_today(&self) -> bool {
        self.cycle_day < self.policy.work_days
    }

    pub fn is_available_at(&self, now: Timestamp) -> bool {
        self.is_active_today() && self.is_ready_at(now)
    }

    pub fn new_work_session(&mut self, start: Timestamp, end: Timestamp) {
        self.work_session = Some(WorkSession { start, end });
    }

    /// Closes the current session and charges it to the daily budget. Once
    /// the budget is spent the driver rests. Returns the charged duration.
    pub fn stop_work_session(&mut self, now: Timestamp) -> Option<SignedDuration> {
        let session = self.work_session.take()?;
        let worked = session.end.duration_since(session.start);

        self.remaining_work -= worked;
        if self.remaining_work < SignedDuration::ZERO {
            self.rest(now);
        }

        Some(worked)
    }

    /// Moves one day forward in the workday/weekend cycle.
    pub fn new_day_session(&mut self) {
        self.cycle_day = (self.cycle_day + 1) % self.policy.cycle_days();
        self.work_session = None;

        if self.is_active_today() {
            self.remaining_work = self.policy.work_duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn trips_of_hours(hours: &[i64]) -> Vec<Trip> {
        let mut start = test_utils::at("06:00");
        hours
            .iter()
            .map(|&h| {
                let trip =
                    test_utils::create_timed_trip(start, start + SignedDuration::from_hours(h));
                start = trip.end_time() + SignedDuration::from_mins(10);
                trip
            })
            .collect()
    }

    #[test]
    fn test_needs_rest_counts_driving_time() {
        let driver = Driver::type_a();

        assert!(!driver.needs_rest(&[]));
        assert!(!driver.needs_rest(&trips_of_hours(&[4, 4])));
        assert!(driver.needs_rest(&trips_of_hours(&[4, 4, 1])));

        let driver = Driver::type_b();
        assert!(!driver.needs_rest(&trips_of_hours(&[8, 8, 8])));
        assert!(driver.needs_rest(&trips_of_hours(&[8, 8, 8, 1])));
    }

    #[test]
    fn test_overwork_is_per_work_window() {
        let driver = Driver::type_a();

        assert!(!driver.overworks(&[]));
        assert!(!driver.overworks(&trips_of_hours(&[4, 4])));
        assert!(driver.overworks(&trips_of_hours(&[3, 3, 3])));

        // an hour off between 6h and 3h of driving starts a new window
        let mut trips = trips_of_hours(&[3, 3]);
        let restart = trips[1].end_time() + SignedDuration::from_hours(1);
        trips.push(test_utils::create_timed_trip(
            restart,
            restart + SignedDuration::from_hours(3),
        ));
        assert!(!driver.overworks(&trips));
        assert!(driver.needs_rest(&trips));

        let mut reversed = trips_of_hours(&[3, 3, 3]);
        reversed.reverse();
        assert!(driver.overworks(&reversed));
        assert!(!Driver::type_b().overworks(&reversed));
    }

    #[test]
    fn test_rest_grants_one_slice() {
        let now = test_utils::at("10:00");

        let mut driver = Driver::type_a();
        assert!(driver.is_ready_at(now));
        driver.rest(now);
        assert_eq!(driver.ready_to_work_at(), Some(test_utils::at("11:00")));
        assert!(!driver.is_ready_at(test_utils::at("10:59")));
        assert!(driver.is_ready_at(test_utils::at("11:00")));

        let mut driver = Driver::type_b();
        driver.rest(now);
        assert_eq!(driver.ready_to_work_at(), Some(test_utils::at("10:20")));
    }

    #[test]
    fn test_work_session_spends_daily_budget() {
        let mut driver = Driver::type_a();

        driver.new_work_session(test_utils::at("06:00"), test_utils::at("12:00"));
        let worked = driver.stop_work_session(test_utils::at("12:00"));
        assert_eq!(worked, Some(SignedDuration::from_hours(6)));
        assert_eq!(driver.remaining_work(), SignedDuration::from_hours(2));
        assert!(driver.ready_to_work_at().is_none());

        driver.new_work_session(test_utils::at("13:00"), test_utils::at("16:00"));
        driver.stop_work_session(test_utils::at("16:00"));
        assert_eq!(driver.ready_to_work_at(), Some(test_utils::at("17:00")));

        assert!(driver.stop_work_session(test_utils::at("17:00")).is_none());
    }

    #[test]
    fn test_day_cycle_alternates_workdays_and_weekend() {
        let mut driver = Driver::type_a();
        let mut active = vec![driver.is_active_today()];
        for _ in 0..7 {
            driver.new_day_session();
            active.push(driver.is_active_today());
        }

        assert_eq!(
            active,
            vec![true, true, true, true, true, false, false, true]
        );
    }

    #[test]
    fn test_new_workday_resets_budget() {
        let mut driver = Driver::type_a();
        driver.new_work_session(test_utils::at("06:00"), test_utils::at("13:00"));
        driver.stop_work_session(test_utils::at("13:00"));
        assert_eq!(driver.remaining_work(), SignedDuration::from_hours(1));

        for _ in 0..7 {
            driver.new_day_session();
        }
        assert_eq!(driver.remaining_work(), SignedDuration::from_hours(8));
    }
}
