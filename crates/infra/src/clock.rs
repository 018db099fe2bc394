//! Current-time source.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Reads the current time in a configured zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock normalized to a fixed offset (UTC unless configured).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock in `offset`; `None` means UTC.
    pub fn new(offset: Option<FixedOffset>) -> Self {
        Self {
            offset: offset.unwrap_or_else(|| Utc.fix()),
        }
    }

    pub fn utc() -> Self {
        Self::new(None)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }

    pub fn at_utc(at: DateTime<Utc>) -> Self {
        Self::new(at.with_timezone(&Utc.fix()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }
}
