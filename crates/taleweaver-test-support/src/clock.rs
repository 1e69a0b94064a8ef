//! Test clock.

use chrono::{DateTime, TimeZone, Utc};
use taleweaver_core::clock::Clock;

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// The instant every test in the workspace uses: 2026-01-15 10:00 UTC.
    ///
    /// # Panics
    ///
    /// Never; the literal date is valid.
    #[must_use]
    pub fn standard() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
