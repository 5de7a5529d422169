//! Time source and id generation for the store.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use crate::models::TaskItem;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Issues item ids from Unix milliseconds.
///
/// Tokens strictly increase: a request in the same millisecond as the
/// previous one (or after the clock stepped backwards) gets `last + 1`.
/// Once `last` sits at `i64::MAX` numbering restarts from the clock.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: i64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for an item created at `now`.
    pub fn next(&mut self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let token = match self.last.checked_add(1) {
            Some(after_last) => millis.max(after_last),
            None => millis,
        };
        self.last = token;
        token.to_string()
    }

    /// Make sure future ids sort after every numeric id already in the tree.
    pub fn observe(&mut self, items: &[TaskItem]) {
        for item in items {
            if let Ok(token) = item.id.parse::<i64>() {
                self.last = self.last.max(token);
            }
            self.observe(&item.children);
        }
    }
}
