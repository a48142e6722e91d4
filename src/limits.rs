use crate::ByteSize;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock time allowed for one program run
///
/// A zero limit disables the deadline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeLimit(Duration);

impl TimeLimit {
    /// Negative or non-finite values yield a zero (disabled) limit
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Countdown to arm, if any
    pub fn deadline(&self) -> Option<Duration> {
        (!self.0.is_zero()).then_some(self.0)
    }
}

impl From<Duration> for TimeLimit {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// Resource limits applied to a single execution window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Wall-clock deadline (None or zero = disabled)
    pub time: Option<TimeLimit>,
    /// Address-space ceiling for the program (None = inherit the harness limit)
    pub memory: Option<ByteSize>,
}

impl Limits {
    pub fn with_time(mut self, time: impl Into<TimeLimit>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_memory(mut self, memory: ByteSize) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.time.and_then(|time| time.deadline())
    }
}
