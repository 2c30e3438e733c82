//! Types used across Floodgate crates.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::FloodgateResult;

/// One observation of the instance's user count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the Unix epoch.
    pub time: u64,
    /// Registered user count at `time`.
    pub value: u64,
}

impl Sample {
    pub fn new(time: u64, value: u64) -> Self {
        Self { time, value }
    }

    /// Seconds elapsed between this sample and `now`.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.time)
    }
}

/// Something that can report the current user count.
///
/// `Ok(None)` means the source answered but did not include a count.
pub trait CountSource {
    fn fetch_user_count(&self) -> FloodgateResult<Option<u64>>;
}

/// Something that can open or close new-account registration.
pub trait RegistrationSwitch {
    fn set_registrations(&self, open: bool) -> FloodgateResult<()>;
}

impl<T: CountSource + ?Sized> CountSource for &T {
    fn fetch_user_count(&self) -> FloodgateResult<Option<u64>> {
        (**self).fetch_user_count()
    }
}

impl<T: RegistrationSwitch + ?Sized> RegistrationSwitch for &T {
    fn set_registrations(&self, open: bool) -> FloodgateResult<()> {
        (**self).set_registrations(open)
    }
}

/// Current time in whole seconds since the Unix epoch.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
