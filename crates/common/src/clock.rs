use chrono::{DateTime, SubsecRound, Utc};

/// Wall-clock source for version timestamps.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock, truncated to milliseconds to match ISO-8601 `...sssZ` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }
}

/// A clock that always reads the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
