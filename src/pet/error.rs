use thiserror::Error;

use super::attributes::{Attribute, ATTRIBUTE_MAX, ATTRIBUTE_MIN};

/// Errors surfaced by the strict pet API.
///
/// The default setters never return these; they treat every rejection as a
/// silent no-op. Only [`crate::pet::Pet::try_set`] and configuration checks do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PetError {
    /// Proposed attribute value lies outside the clamp range.
    #[error("{attribute} value {value} out of range [{min}, {max}]", min = ATTRIBUTE_MIN, max = ATTRIBUTE_MAX)]
    OutOfRange { attribute: Attribute, value: i32 },

    /// The pet has reached its terminal stage; its vitals are frozen.
    #[error("pet is dead")]
    Dead,

    /// The pet was disposed by its owner before dying.
    #[error("pet has been disposed")]
    Disposed,

    /// Pet configuration rejected.
    #[error("invalid pet configuration: {0}")]
    InvalidConfig(String),
}
