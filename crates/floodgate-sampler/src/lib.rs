//! floodgate-sampler — fetches the user count of a monitored instance.
//!
//! Performs a blocking `GET <base-url>/api/v1/instance` and pulls
//! `stats.user_count` out of the JSON body. There are no retries; a
//! failed fetch fails the run and the next scheduled run tries again.

pub mod client;

pub use client::{InstanceSampler, parse_user_count};
