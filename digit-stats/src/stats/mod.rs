use self::bucket::{BucketClass, StatBucket};
use crate::{
    digit::Digit,
    error::FeedError,
    history::TickHistory,
    rule::{Evaluation, evaluate},
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// [`StatBucket`] counters and the [`BucketClass`] key.
pub mod bucket;

/// Closed range of window lengths evaluated independently for every channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct WindowRange {
    min: usize,
    max: usize,
}

impl WindowRange {
    pub fn new(min: usize, max: usize) -> Result<Self, FeedError> {
        if min == 0 || min > max {
            return Err(FeedError::Config(format!(
                "window range {min}..={max} must satisfy 1 <= min <= max"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }

    pub fn len(&self) -> usize {
        self.max - self.min + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for WindowRange {
    fn default() -> Self {
        Self { min: 3, max: 15 }
    }
}

/// Every [`StatBucket`] of one channel, initialised for the full
/// (window length x [`BucketClass`]) key space up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsTable {
    windows: WindowRange,
    buckets: Vec<[StatBucket; 3]>,
}

impl StatsTable {
    pub fn new(windows: WindowRange) -> Self {
        Self {
            windows,
            buckets: vec![[StatBucket::default(); 3]; windows.len()],
        }
    }

    /// Rebuild a table from empty by sliding every window length across the whole of
    /// `digits`: each position preceded by a full window is evaluated once.
    pub fn recompute(windows: WindowRange, digits: &[Digit]) -> Self {
        let mut table = Self::new(windows);
        for len in windows.iter() {
            for index in len..digits.len() {
                if let Some(evaluation) = evaluate(&digits[index - len..index], digits[index]) {
                    table.record(len, evaluation);
                }
            }
        }
        table
    }

    /// Evaluate only the newest tick of `history` for every window length, merging the
    /// outcomes into the running buckets. Returns the number of evaluations recorded.
    pub fn apply_live(&mut self, history: &TickHistory) -> usize {
        let digits = history.trailing_digits(self.windows.max() + 1);
        let Some((&next, preceding)) = digits.split_last() else {
            return 0;
        };

        let mut recorded = 0;
        for len in self.windows.iter() {
            if preceding.len() < len {
                break;
            }
            let group = &preceding[preceding.len() - len..];
            if let Some(evaluation) = evaluate(group, next) {
                self.record(len, evaluation);
                recorded += 1;
            }
        }
        recorded
    }

    /// Merge an [`Evaluation`] into the `All` bucket and the bucket of its origin parity.
    pub fn record(&mut self, len: usize, evaluation: Evaluation) {
        let Some(row) = self.row_mut(len) else {
            return;
        };
        row[BucketClass::All.index()].record(evaluation.outcome);
        row[BucketClass::from(evaluation.origin).index()].record(evaluation.outcome);
    }

    pub fn bucket(&self, len: usize, class: BucketClass) -> Option<&StatBucket> {
        self.row(len).map(|row| &row[class.index()])
    }

    pub fn windows(&self) -> WindowRange {
        self.windows
    }

    /// Iterate each window length alongside its buckets, ordered by window length.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[StatBucket; 3])> {
        self.windows.iter().zip(self.buckets.iter())
    }

    pub fn clear(&mut self) {
        self.buckets
            .iter_mut()
            .for_each(|row| *row = [StatBucket::default(); 3]);
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().flatten().all(StatBucket::is_empty)
    }

    fn row(&self, len: usize) -> Option<&[StatBucket; 3]> {
        if !self.windows.contains(len) {
            return None;
        }
        self.buckets.get(len - self.windows.min())
    }

    fn row_mut(&mut self, len: usize) -> Option<&mut [StatBucket; 3]> {
        if !self.windows.contains(len) {
            return None;
        }
        let offset = len - self.windows.min();
        self.buckets.get_mut(offset)
    }
}
