//! Wall-clock source for the tracker.

use chrono::{Local, NaiveDateTime};

/// Supplies the local wall-clock date and time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<NaiveDateTime>,
}

#[cfg(test)]
impl FixedClock {
    pub const fn new(now: NaiveDateTime) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// Move the clock to a new instant.
    pub fn set(&self, now: NaiveDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = now;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
