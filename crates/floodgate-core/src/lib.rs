//! floodgate-core — shared types for the Floodgate registration limiter.
//!
//! Holds the `Sample` record, the `floodgate.toml` configuration, the
//! error taxonomy, and the two seams the pipeline is generic over:
//! `CountSource` (where the user count comes from) and
//! `RegistrationSwitch` (what flips registrations open or closed).

pub mod config;
pub mod error;
pub mod types;

pub use config::{CommandConfig, FloodgateConfig, HistoryConfig, HttpConfig, MissingBaseline};
pub use error::{FloodgateError, FloodgateResult};
pub use types::*;
