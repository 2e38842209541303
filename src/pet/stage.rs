//! Life stages and the pure function that derives them.
//!
//! A stage is never stored as authoritative state. It is recomputed from the
//! pet's age and current vitals every time somebody asks.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::attributes::Vitals;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeStage {
    #[default]
    Egg,
    Baby,
    Child,
    Teen,
    Adult,
    Senior,
    Dead,
}

/// Inclusive upper age bounds in minutes, checked in order. Anything older
/// than the last entry is dead of old age.
const AGE_THRESHOLDS: [(f64, LifeStage); 6] = [
    (1.0, LifeStage::Egg),
    (10.0, LifeStage::Baby),
    (60.0, LifeStage::Child),
    (120.0, LifeStage::Teen),
    (300.0, LifeStage::Adult),
    (400.0, LifeStage::Senior),
];

impl LifeStage {
    /// Derive the stage for a pet of the given age and vitals.
    ///
    /// Any depleted attribute means [`LifeStage::Dead`] regardless of age.
    /// Otherwise the age (fractional minutes, never truncated) is matched
    /// against the thresholds, first inclusive bound wins. Negative ages
    /// (a clock stepping backwards) count as newborn.
    pub fn derive(age: Duration, vitals: &Vitals) -> LifeStage {
        if vitals.any_depleted() {
            return LifeStage::Dead;
        }
        Self::for_age_minutes(age_in_minutes(age))
    }

    /// Age-only part of [`LifeStage::derive`].
    pub fn for_age_minutes(minutes: f64) -> LifeStage {
        AGE_THRESHOLDS
            .iter()
            .find(|(bound, _)| minutes <= *bound)
            .map(|(_, stage)| *stage)
            .unwrap_or(LifeStage::Dead)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifeStage::Dead)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifeStage::Egg => "Egg",
            LifeStage::Baby => "Baby",
            LifeStage::Child => "Child",
            LifeStage::Teen => "Teen",
            LifeStage::Adult => "Adult",
            LifeStage::Senior => "Senior",
            LifeStage::Dead => "Dead",
        }
    }
}

impl fmt::Display for LifeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert an age to fractional minutes with microsecond resolution.
pub fn age_in_minutes(age: Duration) -> f64 {
    let micros = age.num_microseconds().unwrap_or(i64::MAX).max(0);
    micros as f64 / 60_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> Vitals {
        Vitals::new(3, 3, 3).unwrap()
    }

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn depleted_attribute_is_dead_at_any_age() {
        for (h, j, i) in [(0, 4, 4), (4, 0, 4), (4, 4, 0)] {
            let v = Vitals::new(h, j, i).unwrap();
            assert_eq!(LifeStage::derive(Duration::zero(), &v), LifeStage::Dead);
            assert_eq!(LifeStage::derive(minutes(200), &v), LifeStage::Dead);
        }
    }

    #[test]
    fn age_maps_to_stage() {
        let v = healthy();
        assert_eq!(LifeStage::derive(Duration::zero(), &v), LifeStage::Egg);
        assert_eq!(LifeStage::derive(minutes(5), &v), LifeStage::Baby);
        assert_eq!(LifeStage::derive(minutes(15), &v), LifeStage::Child);
        assert_eq!(LifeStage::derive(minutes(90), &v), LifeStage::Teen);
        assert_eq!(LifeStage::derive(minutes(250), &v), LifeStage::Adult);
        assert_eq!(LifeStage::derive(minutes(350), &v), LifeStage::Senior);
        assert_eq!(LifeStage::derive(minutes(500), &v), LifeStage::Dead);
    }

    #[test]
    fn bounds_are_inclusive() {
        let v = healthy();
        assert_eq!(LifeStage::derive(minutes(10), &v), LifeStage::Baby);
        // 10.0001 minutes is 10 minutes and 6 milliseconds
        let just_over = minutes(10) + Duration::milliseconds(6);
        assert_eq!(LifeStage::derive(just_over, &v), LifeStage::Child);

        assert_eq!(LifeStage::for_age_minutes(1.0), LifeStage::Egg);
        assert_eq!(LifeStage::for_age_minutes(60.0), LifeStage::Child);
        assert_eq!(LifeStage::for_age_minutes(120.0), LifeStage::Teen);
        assert_eq!(LifeStage::for_age_minutes(300.0), LifeStage::Adult);
        assert_eq!(LifeStage::for_age_minutes(400.0), LifeStage::Senior);
        assert_eq!(LifeStage::for_age_minutes(400.000_1), LifeStage::Dead);
    }

    #[test]
    fn negative_age_is_newborn() {
        assert_eq!(LifeStage::derive(minutes(-3), &healthy()), LifeStage::Egg);
    }

    #[test]
    fn fractional_minutes_are_kept() {
        assert!((age_in_minutes(Duration::seconds(90)) - 1.5).abs() < 1e-9);
        assert_eq!(
            LifeStage::derive(Duration::seconds(61), &healthy()),
            LifeStage::Baby
        );
    }
}
