//! Time-zone-aware "today" for effective-date defaulting.

use chrono::{FixedOffset, Local, NaiveDate, Utc};

pub trait TodayProvider: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in the configured zone, falling back to the system date
/// when no zone is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToday {
    offset: Option<FixedOffset>,
}

impl SystemToday {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl TodayProvider for SystemToday {
    fn today(&self) -> NaiveDate {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

/// Fixed date, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedToday(pub NaiveDate);

impl TodayProvider for FixedToday {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
