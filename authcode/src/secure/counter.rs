use std::time::Duration;

use serde::Deserialize;

use super::error::TotpError;

/// Length of a TOTP window in whole seconds. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u64")]
pub struct TimeStep(u64);

impl TimeStep {
    pub const GOOGLE_AUTHENTICATOR: TimeStep = TimeStep(30);

    pub fn new(seconds: u64) -> Result<Self, TotpError> {
        if seconds == 0 {
            return Err(TotpError::TimeStep);
        }
        Ok(Self(seconds))
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Index of the window containing `timestamp`.
    pub fn counter(self, timestamp: u64) -> u64 {
        timestamp / self.0
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self::GOOGLE_AUTHENTICATOR
    }
}

impl TryFrom<u64> for TimeStep {
    type Error = TotpError;

    fn try_from(seconds: u64) -> Result<Self, Self::Error> {
        Self::new(seconds)
    }
}

/// Big-endian window counter for `timestamp`, the HMAC message of RFC 6238.
pub fn counter_bytes(timestamp: u64, time_step: TimeStep) -> [u8; 8] {
    time_step.counter(timestamp).to_be_bytes()
}
