//! The three bounded vitality values and their clamp rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PetError;

/// Lowest accepted value for any attribute. Reaching it kills the pet.
pub const ATTRIBUTE_MIN: i32 = 0;
/// Highest accepted value for any attribute.
pub const ATTRIBUTE_MAX: i32 = 4;
/// Value every attribute starts at.
pub const ATTRIBUTE_START: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Hunger,
    Happiness,
    Intelligence,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [
        Attribute::Hunger,
        Attribute::Happiness,
        Attribute::Intelligence,
    ];

    /// Map a decay draw in `0..=9` to the attribute it decrements.
    /// Draws `3..=9` leave the pet alone.
    pub fn from_draw(draw: u8) -> Option<Self> {
        match draw {
            0 => Some(Attribute::Hunger),
            1 => Some(Attribute::Happiness),
            2 => Some(Attribute::Intelligence),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Hunger => "hunger",
            Attribute::Happiness => "happiness",
            Attribute::Intelligence => "intelligence",
        }
    }

    /// Parse from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hunger" | "food" => Some(Attribute::Hunger),
            "happiness" | "fun" => Some(Attribute::Happiness),
            "intelligence" | "smarts" => Some(Attribute::Intelligence),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hunger, happiness and intelligence taken together.
///
/// Every field is kept inside `[ATTRIBUTE_MIN, ATTRIBUTE_MAX]`; the only way to
/// change one is [`Vitals::set`] (or [`Vitals::adjust`]), which rejects
/// out-of-range values without touching the stored one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    hunger: i32,
    happiness: i32,
    intelligence: i32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            hunger: ATTRIBUTE_START,
            happiness: ATTRIBUTE_START,
            intelligence: ATTRIBUTE_START,
        }
    }
}

impl Vitals {
    /// Build vitals from raw values; `None` if any lies outside the range.
    pub fn new(hunger: i32, happiness: i32, intelligence: i32) -> Option<Self> {
        [hunger, happiness, intelligence]
            .iter()
            .all(|v| in_range(*v))
            .then_some(Self {
                hunger,
                happiness,
                intelligence,
            })
    }

    pub fn hunger(&self) -> i32 {
        self.hunger
    }

    pub fn happiness(&self) -> i32 {
        self.happiness
    }

    pub fn intelligence(&self) -> i32 {
        self.intelligence
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Hunger => self.hunger,
            Attribute::Happiness => self.happiness,
            Attribute::Intelligence => self.intelligence,
        }
    }

    /// Guarded assignment.
    ///
    /// # Returns
    /// - `Ok(true)` if the value was applied and differs from the previous one
    /// - `Ok(false)` if it was applied but equal to the previous one
    /// - `Err(PetError::OutOfRange)` if rejected; the stored value is untouched
    pub fn set(&mut self, attribute: Attribute, value: i32) -> Result<bool, PetError> {
        if !in_range(value) {
            return Err(PetError::OutOfRange { attribute, value });
        }
        let slot = match attribute {
            Attribute::Hunger => &mut self.hunger,
            Attribute::Happiness => &mut self.happiness,
            Attribute::Intelligence => &mut self.intelligence,
        };
        let changed = *slot != value;
        *slot = value;
        Ok(changed)
    }

    /// Shift an attribute by `delta` through the same guard as [`Vitals::set`].
    /// Returns whether the stored value changed.
    pub fn adjust(&mut self, attribute: Attribute, delta: i32) -> bool {
        let target = self.get(attribute).saturating_add(delta);
        matches!(self.set(attribute, target), Ok(true))
    }

    /// True when any attribute sits at the floor.
    pub fn any_depleted(&self) -> bool {
        Attribute::ALL
            .iter()
            .any(|a| self.get(*a) == ATTRIBUTE_MIN)
    }
}

fn in_range(value: i32) -> bool {
    (ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_midpoint() {
        let v = Vitals::default();
        assert_eq!((v.hunger(), v.happiness(), v.intelligence()), (2, 2, 2));
    }

    #[test]
    fn out_of_range_is_rejected_without_change() {
        let mut v = Vitals::default();
        for bad in [-1, 5, i32::MIN, i32::MAX] {
            for attr in Attribute::ALL {
                assert_eq!(
                    v.set(attr, bad),
                    Err(PetError::OutOfRange {
                        attribute: attr,
                        value: bad
                    })
                );
                assert_eq!(v.get(attr), 2);
            }
        }
    }

    #[test]
    fn set_reports_change() {
        let mut v = Vitals::default();
        assert_eq!(v.set(Attribute::Happiness, 4), Ok(true));
        assert_eq!(v.set(Attribute::Happiness, 4), Ok(false));
        assert_eq!(v.happiness(), 4);
    }

    #[test]
    fn adjust_stops_at_bounds() {
        let mut v = Vitals::new(0, 4, 1).unwrap();
        assert!(!v.adjust(Attribute::Hunger, -1));
        assert!(!v.adjust(Attribute::Happiness, 1));
        assert!(v.adjust(Attribute::Intelligence, -1));
        assert_eq!(v.intelligence(), 0);
        assert!(v.any_depleted());
    }

    #[test]
    fn draw_mapping() {
        assert_eq!(Attribute::from_draw(0), Some(Attribute::Hunger));
        assert_eq!(Attribute::from_draw(1), Some(Attribute::Happiness));
        assert_eq!(Attribute::from_draw(2), Some(Attribute::Intelligence));
        assert!((3..=9).all(|d| Attribute::from_draw(d).is_none()));
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(Vitals::new(5, 1, 1).is_none());
        assert!(Vitals::new(1, -1, 1).is_none());
        assert!(Vitals::new(0, 4, 2).is_some());
    }
}
