//! The pet engine.
//!
//! A [`Pet`] owns three bounded attributes, a birth timestamp and a periodic
//! scheduler. Each tick first checks whether the derived [`LifeStage`] moved
//! on (announcing it to stage subscribers), then lets one attribute decay with
//! 30% probability (announcing it to attribute subscribers). Reaching
//! [`LifeStage::Dead`] halts the scheduler for good.
//!
//! - [`attributes`] - [`Attribute`], [`Vitals`] and the clamp range
//! - [`stage`] - [`LifeStage`] and its derivation from age and vitals
//! - [`clock`] - wall-clock sources ([`SystemClock`], [`ManualClock`])
//! - [`observer`] - subscription handles
//! - [`engine`] - [`Pet`] itself

pub mod attributes;
pub mod clock;
pub mod engine;
pub mod error;
pub mod observer;
pub mod stage;
mod ticker;

pub use attributes::{Attribute, Vitals, ATTRIBUTE_MAX, ATTRIBUTE_MIN, ATTRIBUTE_START};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{HaltReason, Pet, PetSnapshot, TickReport, WeakPet};
pub use error::PetError;
pub use observer::SubscriptionId;
pub use stage::LifeStage;
pub use ticker::SchedulerWatch;
