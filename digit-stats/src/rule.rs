//! Parity-reversal rule evaluated over a group of consecutive digits.
//!
//! A group qualifies only when it has no adjacent repeats and every digit shares one parity.
//! The rule then predicts the next digit breaks that parity: a break is a [`Outcome::Win`],
//! a continuation is a [`Outcome::Loss`].

use crate::digit::{Digit, Parity};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Result of a single qualified prediction.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[display("win")]
    Win,
    #[display("loss")]
    Loss,
}

/// A qualified group, its shared parity, and the outcome against the next digit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Evaluation {
    pub origin: Parity,
    pub outcome: Outcome,
}

/// Evaluate the rule for `group` against the digit that followed it.
///
/// Returns `None` when the group is inapplicable (empty, contains adjacent repeats, or has
/// mixed parity).
pub fn evaluate(group: &[Digit], next: Digit) -> Option<Evaluation> {
    if has_adjacent_repeat(group) {
        return None;
    }

    let origin = shared_parity(group)?;
    let outcome = if Parity::of(next) == origin {
        Outcome::Loss
    } else {
        Outcome::Win
    };

    Some(Evaluation { origin, outcome })
}

pub fn has_adjacent_repeat(group: &[Digit]) -> bool {
    group.windows(2).any(|pair| pair[0] == pair[1])
}

/// Parity shared by every digit in the group, if any.
pub fn shared_parity(group: &[Digit]) -> Option<Parity> {
    let (first, rest) = group.split_first()?;
    let parity = Parity::of(*first);
    rest.iter()
        .all(|digit| Parity::of(*digit) == parity)
        .then_some(parity)
}
