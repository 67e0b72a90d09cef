use crate::error::FeedError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Trailing tick counts a [`DataFilter::Last`] may take.
pub const ACCEPTED_TICK_FILTERS: [usize; 6] = [25, 50, 100, 500, 1000, 3000];

/// Sentinel selecting the live (unfiltered) statistics.
pub const NO_FILTER: &str = "no_filter";

/// Selects which statistics a results request returns.
///
/// [`DataFilter::NoFilter`] returns the live running buckets, [`DataFilter::Last`] rebuilds
/// buckets over the last `n` retained ticks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub enum DataFilter {
    NoFilter,
    Last(usize),
}

impl DataFilter {
    /// Check the filter is the sentinel or one of the [`ACCEPTED_TICK_FILTERS`].
    pub fn validate(self) -> Result<Self, FeedError> {
        match self {
            DataFilter::NoFilter => Ok(self),
            DataFilter::Last(ticks) if ACCEPTED_TICK_FILTERS.contains(&ticks) => Ok(self),
            DataFilter::Last(ticks) => Err(FeedError::InvalidFilter(format!(
                "{ticks} is not one of {ACCEPTED_TICK_FILTERS:?} or \"{NO_FILTER}\""
            ))),
        }
    }
}

impl Default for DataFilter {
    fn default() -> Self {
        DataFilter::Last(1000)
    }
}

impl fmt::Display for DataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFilter::NoFilter => write!(f, "{NO_FILTER}"),
            DataFilter::Last(ticks) => write!(f, "{ticks}"),
        }
    }
}

impl FromStr for DataFilter {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case(NO_FILTER) || value.eq_ignore_ascii_case("no filter") {
            return Ok(DataFilter::NoFilter);
        }
        value
            .parse::<usize>()
            .map(DataFilter::Last)
            .map_err(|_| FeedError::InvalidFilter(value.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum RawFilter {
    Ticks(usize),
    Label(String),
}

impl TryFrom<RawFilter> for DataFilter {
    type Error = FeedError;

    fn try_from(value: RawFilter) -> Result<Self, Self::Error> {
        match value {
            RawFilter::Ticks(ticks) => Ok(DataFilter::Last(ticks)),
            RawFilter::Label(label) => label.parse(),
        }
    }
}

impl From<DataFilter> for RawFilter {
    fn from(value: DataFilter) -> Self {
        match value {
            DataFilter::NoFilter => RawFilter::Label(NO_FILTER.to_string()),
            DataFilter::Last(ticks) => RawFilter::Ticks(ticks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_data_filter() {
        struct TestCase {
            input: &'static str,
            expected: Result<DataFilter, ()>,
        }

        let tests = vec![
            TestCase {
                // TC0: integer tick count
                input: "500",
                expected: Ok(DataFilter::Last(500)),
            },
            TestCase {
                // TC1: sentinel string
                input: r#""no_filter""#,
                expected: Ok(DataFilter::NoFilter),
            },
            TestCase {
                // TC2: numeric string
                input: r#""3000""#,
                expected: Ok(DataFilter::Last(3000)),
            },
            TestCase {
                // TC3: unknown label
                input: r#""everything""#,
                expected: Err(()),
            },
            TestCase {
                // TC4: negative number
                input: "-25",
                expected: Err(()),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = serde_json::from_str::<DataFilter>(test.input).map_err(|_| ());
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_ser_data_filter() {
        assert_eq!(
            serde_json::to_string(&DataFilter::NoFilter).unwrap(),
            r#""no_filter""#
        );
        assert_eq!(serde_json::to_string(&DataFilter::Last(25)).unwrap(), "25");
    }

    #[test]
    fn test_validate() {
        for ticks in ACCEPTED_TICK_FILTERS {
            assert!(DataFilter::Last(ticks).validate().is_ok());
        }
        assert!(DataFilter::NoFilter.validate().is_ok());
        assert!(matches!(
            DataFilter::Last(42).validate(),
            Err(FeedError::InvalidFilter(_))
        ));
        assert!(DataFilter::Last(0).validate().is_err());
    }

    #[test]
    fn test_default_is_last_1000() {
        assert_eq!(DataFilter::default(), DataFilter::Last(1000));
    }
}
