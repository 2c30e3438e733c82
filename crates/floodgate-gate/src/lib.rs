//! floodgate-gate — rate-limits new-account registration.
//!
//! Compares the current user count against a baseline sample taken
//! roughly one window ago and asserts the resulting registration state
//! on every run.
//!
//! # Decision
//!
//! ```text
//! baseline = youngest sample older than now - window
//!            (else the oldest sample, as a partial window)
//!            (else the on_missing_baseline policy)
//!
//! open = current <= baseline + max_per_hour
//! ```
//!
//! There is no tracked "current state": each run computes the desired
//! state from scratch and re-asserts it through the `RegistrationSwitch`.

pub mod actuator;
pub mod decision;
pub mod pipeline;

pub use actuator::CommandSwitch;
pub use decision::{BaselineSource, Decision, DecisionPolicy, decide};
pub use pipeline::{Floodgate, RunReport};
