//! # Tamapet - a tick-driven virtual pet engine
//!
//! Tamapet models a single virtual pet whose well-being degrades over time and
//! whose life stage advances purely as a function of its age and current
//! well-being.
//!
//! ## Features
//!
//! - **Bounded Vitals**: Hunger, happiness and intelligence, each clamped to `[0, 4]`; out-of-range writes are silently ignored.
//! - **Derived Life Stages**: Egg → Baby → Child → Teen → Adult → Senior, plus Dead from anywhere, recomputed on every read.
//! - **Periodic Decay**: A Tokio-driven 1 second tick lowers one random attribute 30% of the time.
//! - **Observers**: Ordered life-stage-changed and attribute-changed subscriber lists with unsubscribe handles.
//! - **Clean Shutdown**: The scheduler stops on death, on explicit disposal, or when the last handle is dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tamapet::pet::Pet;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pet = Pet::hatch("Beestje");
//!     pet.on_stage_changed(|stage| println!("stage: {stage}"));
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     pet.feed();
//!     pet.shutdown().await;
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`pet`] - The engine: vitals, stages, scheduler and subscriptions
//! - [`config`] - Configuration loading and defaults
//! - [`display`] - Text rendering used by the `tamapet` binary
//! - [`logutil`] - Log-safe escaping of user strings
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Front end     │ ← renders bars, issues feed/play/teach
//! └─────────────────┘
//!          │ subscribe / set
//! ┌─────────────────┐
//! │   Pet engine    │ ← vitals, stage derivation, notifications
//! └─────────────────┘
//!          │ tick
//! ┌─────────────────┐
//! │   Ticker task   │ ← tokio interval, one per pet
//! └─────────────────┘
//! ```

pub mod config;
pub mod display;
pub mod logutil;
pub mod pet;
