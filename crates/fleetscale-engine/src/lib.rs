//! fleetscale-engine — rule-driven container scaling and kill decisions.
//!
//! Evaluates declarative rule sets against an application snapshot and
//! its metric windows, then applies the resulting decisions through the
//! fleet API. The engine keeps no state between cycles.
//!
//! # Decision order
//!
//! ```text
//! for each rule set, in declaration order:
//!     for each container:
//!         killWhen holds over the container window  => kill container
//!     running < minContainers                       => scale to min
//!     running > maxContainers                       => scale to max
//!     addWhen (OR) holds over the app window        => add n (1 if n would pass max)
//!     reduceWhen (AND) holds over the app window    => remove n (1 if n would pass min)
//! ```
//!
//! A threshold holds only if every sample in the window satisfies it.
//! An application reporting `updating` is never mutated, and simulation
//! mode only logs what would have been done.

pub mod alerts;
pub mod controller;
pub mod decider;
pub mod error;
pub mod threshold;

pub use controller::{ActionRecord, CycleOptions, CycleReport, Outcome, PlannedAction, ScalingController};
pub use decider::{kill_decisions, scale_decision, KillDecision, ScaleDecision, ScaleReason};
pub use error::{EngineError, EngineResult};
pub use threshold::{checks_to_text, evaluate, CheckResult};
