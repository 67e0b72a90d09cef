use crate::digit::{Digit, extract_digit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One accepted quote, its projected [`Digit`], and the time it arrived.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tick {
    pub quote: f64,
    pub digit: Digit,
    pub time_received: DateTime<Utc>,
}

impl Tick {
    pub fn new(quote: f64, time_received: DateTime<Utc>) -> Self {
        Self {
            quote,
            digit: extract_digit(quote),
            time_received,
        }
    }
}

/// Ring buffer retaining the `capacity` most recent [`Tick`]s of one channel.
///
/// Insertion ordered, oldest evicted first.
#[derive(Debug, Clone)]
pub struct TickHistory {
    ticks: VecDeque<Tick>,
    capacity: usize,
}

impl TickHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ticks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, tick: Tick) {
        if self.capacity == 0 {
            return;
        }
        if self.ticks.len() >= self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
    }

    /// Digits of the last `n` ticks (or fewer if less are retained), oldest first.
    pub fn trailing_digits(&self, n: usize) -> Vec<Digit> {
        let start = self.ticks.len().saturating_sub(n);
        self.ticks.range(start..).map(|tick| tick.digit).collect()
    }
}
