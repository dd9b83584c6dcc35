//! Millisecond timestamps that never repeat or go backwards.

use std::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

/// Wall-clock milliseconds, bumped by one whenever the wall clock would
/// repeat or step back. Two mutations in the same millisecond still order.
#[derive(Debug, Default)]
pub struct Clock {
    last: AtomicI64,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, strictly greater than every previous one.
    pub fn now_ms(&self) -> i64 {
        let wall = wall_ms();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev.saturating_add(1));
            match self.last.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Make sure future timestamps sort after `ts` (e.g. after loading data
    /// written by a machine whose clock ran ahead).
    pub fn observe(&self, ts: i64) {
        self.last.fetch_max(ts, Ordering::Relaxed);
    }
}

fn wall_ms() -> i64 {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms).unwrap_or(i64::MAX)
}
