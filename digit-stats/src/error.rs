use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// All errors generated in `digit-stats`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum FeedError {
    #[error("failed to connect to upstream feed: {0}")]
    Connect(String),

    #[error("failed to send subscription for channel {channel}: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("upstream closed the connection: {0}")]
    Closed(String),

    #[error("invalid data filter: {0}")]
    InvalidFilter(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

impl FeedError {
    /// Determine if an error is a transient channel fault, ie/ one handled by the reconnect
    /// state machine rather than reported to a caller.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Connect(_)
            | FeedError::Subscribe { .. }
            | FeedError::Socket(_)
            | FeedError::Closed(_) => true,
            _ => false,
        }
    }
}

impl From<tungstenite::Error> for FeedError {
    fn from(value: tungstenite::Error) -> Self {
        match value {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::Closed(value.to_string())
            }
            other => Self::Socket(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Socket(format!("serde: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_is_transient() {
        struct TestCase {
            input: FeedError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: is transient w/ FeedError::Connect
                input: FeedError::Connect("dns failure".to_string()),
                expected: true,
            },
            TestCase {
                // TC1: is transient w/ FeedError::Closed from tungstenite ConnectionClosed
                input: FeedError::from(tungstenite::Error::ConnectionClosed),
                expected: true,
            },
            TestCase {
                // TC2: is transient w/ FeedError::Subscribe
                input: FeedError::Subscribe {
                    channel: "1HZ10V".to_string(),
                    reason: "sink closed".to_string(),
                },
                expected: true,
            },
            TestCase {
                // TC3: is not transient w/ FeedError::InvalidFilter
                input: FeedError::InvalidFilter("7".to_string()),
                expected: false,
            },
            TestCase {
                // TC4: is not transient w/ FeedError::UnknownChannel
                input: FeedError::UnknownChannel("R_100".to_string()),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_transient();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_tungstenite_closed_maps_to_closed() {
        assert!(matches!(
            FeedError::from(tungstenite::Error::AlreadyClosed),
            FeedError::Closed(_)
        ));
    }
}
