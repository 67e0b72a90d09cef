use crate::{digit::Parity, rule::Outcome};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Subset of evaluations a [`StatBucket`] aggregates.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BucketClass {
    #[display("all")]
    All,
    #[display("even_origin")]
    EvenOrigin,
    #[display("odd_origin")]
    OddOrigin,
}

impl BucketClass {
    pub const ALL: [BucketClass; 3] = [
        BucketClass::All,
        BucketClass::EvenOrigin,
        BucketClass::OddOrigin,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            BucketClass::All => 0,
            BucketClass::EvenOrigin => 1,
            BucketClass::OddOrigin => 2,
        }
    }
}

impl From<Parity> for BucketClass {
    fn from(value: Parity) -> Self {
        match value {
            Parity::Even => BucketClass::EvenOrigin,
            Parity::Odd => BucketClass::OddOrigin,
        }
    }
}

/// Running win/loss counters for one (channel, window length, class) key.
///
/// Invariants: `entries == wins + losses`, at most one current streak is non-zero, and the
/// max streaks never decrease.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct StatBucket {
    entries: u64,
    wins: u64,
    losses: u64,
    win_streak: u64,
    loss_streak: u64,
    max_win_streak: u64,
    max_loss_streak: u64,
}

impl StatBucket {
    pub fn record(&mut self, outcome: Outcome) {
        self.entries += 1;
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.win_streak += 1;
                self.loss_streak = 0;
            }
            Outcome::Loss => {
                self.losses += 1;
                self.loss_streak += 1;
                self.win_streak = 0;
            }
        }
        self.max_win_streak = self.max_win_streak.max(self.win_streak);
        self.max_loss_streak = self.max_loss_streak.max(self.loss_streak);
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn losses(&self) -> u64 {
        self.losses
    }

    pub fn win_streak(&self) -> u64 {
        self.win_streak
    }

    pub fn loss_streak(&self) -> u64 {
        self.loss_streak
    }

    pub fn max_win_streak(&self) -> u64 {
        self.max_win_streak
    }

    pub fn max_loss_streak(&self) -> u64 {
        self.max_loss_streak
    }

    /// Percentage of wins rounded to two decimals, `0.0` for an empty bucket.
    pub fn win_rate(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        let rate = self.wins as f64 / self.entries as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_bucket_record() {
        struct TestCase {
            outcomes: Vec<Outcome>,
            expected: StatBucket,
        }

        use Outcome::*;
        let tests = vec![
            TestCase {
                // TC0: no outcomes
                outcomes: vec![],
                expected: StatBucket::default(),
            },
            TestCase {
                // TC1: single win
                outcomes: vec![Win],
                expected: StatBucket {
                    entries: 1,
                    wins: 1,
                    losses: 0,
                    win_streak: 1,
                    loss_streak: 0,
                    max_win_streak: 1,
                    max_loss_streak: 0,
                },
            },
            TestCase {
                // TC2: win streak broken by losses keeps the max
                outcomes: vec![Win, Win, Win, Loss, Loss],
                expected: StatBucket {
                    entries: 5,
                    wins: 3,
                    losses: 2,
                    win_streak: 0,
                    loss_streak: 2,
                    max_win_streak: 3,
                    max_loss_streak: 2,
                },
            },
            TestCase {
                // TC3: alternating outcomes
                outcomes: vec![Loss, Win, Loss, Win],
                expected: StatBucket {
                    entries: 4,
                    wins: 2,
                    losses: 2,
                    win_streak: 1,
                    loss_streak: 0,
                    max_win_streak: 1,
                    max_loss_streak: 1,
                },
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let mut actual = StatBucket::default();
            test.outcomes.into_iter().for_each(|outcome| actual.record(outcome));
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_stat_bucket_invariants_hold_over_any_sequence() {
        let mut bucket = StatBucket::default();
        let (mut prev_max_win, mut prev_max_loss) = (0, 0);

        // Deterministic pseudo-random outcome sequence
        let mut state = 0x2545_f491_u32;
        for _ in 0..1_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let outcome = if state % 3 == 0 { Outcome::Loss } else { Outcome::Win };
            bucket.record(outcome);

            assert_eq!(bucket.entries(), bucket.wins() + bucket.losses());
            assert!(bucket.win_streak() == 0 || bucket.loss_streak() == 0);
            assert!(bucket.max_win_streak() >= prev_max_win);
            assert!(bucket.max_loss_streak() >= prev_max_loss);
            prev_max_win = bucket.max_win_streak();
            prev_max_loss = bucket.max_loss_streak();
        }
    }

    #[test]
    fn test_win_rate() {
        let mut bucket = StatBucket::default();
        assert_eq!(bucket.win_rate(), 0.0);

        bucket.record(Outcome::Win);
        bucket.record(Outcome::Loss);
        bucket.record(Outcome::Loss);
        assert_eq!(bucket.win_rate(), 33.33);
    }
}
