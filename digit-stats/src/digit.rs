use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A single decimal digit in `[0, 9]` projected from a tick quote.
pub type Digit = u8;

/// Parity of a [`Digit`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[display("even")]
    Even,
    #[display("odd")]
    Odd,
}

impl Parity {
    pub fn of(digit: Digit) -> Self {
        if digit % 2 == 0 { Self::Even } else { Self::Odd }
    }
}

/// Project a quote onto the second digit after its decimal point.
///
/// The quote is rendered as shortest round-trip decimal text. Quotes rendering with fewer
/// than two fractional digits (eg/ `100.5`, `100`, `NaN`) map to `0`. The fallback is
/// silent: callers always receive a digit.
///
/// `f64` display never switches to exponent notation, so quotes below `1e-4` still project
/// from their positional fraction, eg/ `0.00005` -> `0`, `0.0123` -> `1`.
pub fn extract_digit(quote: f64) -> Digit {
    let text = quote.to_string();
    text.split_once('.')
        .and_then(|(_, fraction)| fraction.as_bytes().get(1).copied())
        .filter(u8::is_ascii_digit)
        .map(|byte| byte - b'0')
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_digit() {
        struct TestCase {
            input: f64,
            expected: Digit,
        }

        let tests = vec![
            TestCase {
                // TC0: second fractional digit of a two decimal quote
                input: 1234.56,
                expected: 6,
            },
            TestCase {
                // TC1: second fractional digit of a long fraction
                input: 6543.2187,
                expected: 1,
            },
            TestCase {
                // TC2: single fractional digit falls back to zero
                input: 1234.5,
                expected: 0,
            },
            TestCase {
                // TC3: integral quote falls back to zero
                input: 1234.0,
                expected: 0,
            },
            TestCase {
                // TC4: trailing zero is not rendered, so falls back to zero
                input: 10.50,
                expected: 0,
            },
            TestCase {
                // TC5: negative quote
                input: -3.14,
                expected: 4,
            },
            TestCase {
                // TC6: NaN falls back to zero
                input: f64::NAN,
                expected: 0,
            },
            TestCase {
                // TC7: infinity falls back to zero
                input: f64::INFINITY,
                expected: 0,
            },
            TestCase {
                // TC8: leading zero fraction
                input: 0.09,
                expected: 9,
            },
            TestCase {
                // TC9: tiny quote renders positionally, not in exponent form
                input: 0.00005,
                expected: 0,
            },
            TestCase {
                // TC10: tiny quote w/ a non-zero second fractional digit
                input: 0.0123,
                expected: 1,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = extract_digit(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_extract_digit_always_in_range() {
        for cents in 0..2_000u32 {
            let quote = 987.0 + f64::from(cents) * 0.001;
            assert!(extract_digit(quote) <= 9);
        }
    }

    #[test]
    fn test_parity_of() {
        assert_eq!(Parity::of(0), Parity::Even);
        assert_eq!(Parity::of(7), Parity::Odd);
        assert_eq!(Parity::of(8), Parity::Even);
    }
}
