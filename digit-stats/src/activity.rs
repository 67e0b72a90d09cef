use crate::{channel::ChannelId, digit::Digit, history::Tick};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of ticks retained by the [`RecentActivity`] feed.
pub const DEFAULT_RECENT_CAPACITY: usize = 100;

/// Display record of one accepted tick.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActivityEntry {
    pub channel: ChannelId,
    pub value: f64,
    pub digit: Digit,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(channel: ChannelId, tick: &Tick) -> Self {
        Self {
            channel,
            value: tick.quote,
            digit: tick.digit,
            timestamp: tick.time_received,
        }
    }
}

/// Bounded feed of the most recent ticks across all channels. Display only.
#[derive(Debug, Clone)]
pub struct RecentActivity {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl RecentActivity {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: ActivityEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned copy of the feed, most recent last.
    pub fn snapshot(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for RecentActivity {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}
