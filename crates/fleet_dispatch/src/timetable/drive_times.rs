use fxhash::FxHashMap;
use jiff::SignedDuration;

use crate::fleet::station::StationId;

/// Drive time assumed between two stations nobody supplied a duration for.
pub const FALLBACK_DRIVE_TIME: SignedDuration = SignedDuration::from_mins(5);

/// Symmetric station-to-station drive durations, filled incrementally as
/// trips are registered.
#[derive(Default, Debug, Clone)]
pub struct DriveTimes {
    durations: FxHashMap<StationId, FxHashMap<StationId, SignedDuration>>,
}

impl DriveTimes {
    pub fn contains(&self, from: StationId, to: StationId) -> bool {
        let forward = self
            .durations
            .get(&from)
            .is_some_and(|row| row.contains_key(&to));
        let backward = self
            .durations
            .get(&to)
            .is_some_and(|row| row.contains_key(&from));

        forward && backward
    }

    pub fn insert(&mut self, from: StationId, to: StationId, duration: SignedDuration) {
        self.durations.entry(from).or_default().insert(to, duration);
        self.durations.entry(to).or_default().insert(from, duration);
    }

    pub fn get(&self, from: StationId, to: StationId) -> Option<SignedDuration> {
        if from == to {
            return Some(SignedDuration::ZERO);
        }

        self.durations
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
    }

    /// Looks the pair up and caches the fallback duration when it is missing.
    pub fn get_or_insert_fallback(&mut self, from: StationId, to: StationId) -> SignedDuration {
        if let Some(duration) = self.get(from, to) {
            return duration;
        }

        self.insert(from, to, FALLBACK_DRIVE_TIME);
        FALLBACK_DRIVE_TIME
    }

    /// Number of ordered station pairs with a known duration.
    pub fn len(&self) -> usize {
        self.durations.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
