//! Upstream tick feed wire format.
//!
//! Outbound: one subscribe request per connection, eg/ `{"ticks":"1HZ10V","subscribe":1}`.
//!
//! Inbound: JSON frames. Only frames carrying a `tick` object with a numeric `quote` are
//! ticks, everything else (acks, pings, server errors, unparsable text) is a non-tick frame.

use crate::channel::ChannelId;
use serde::{Deserialize, Deserializer, Serialize};

/// Subscribe request sent on every successful connection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SubscribeRequest<'a> {
    pub ticks: &'a str,
    pub subscribe: u8,
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(channel: &'a ChannelId) -> Self {
        Self {
            ticks: channel.as_str(),
            subscribe: 1,
        }
    }
}

/// Channel-scoped quote carried by a tick frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickPayload {
    #[serde(deserialize_with = "de_quote")]
    pub quote: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub epoch: Option<i64>,
}

/// Error object the upstream attaches to rejected requests.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    tick: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Tick(TickPayload),
    Error(ErrorPayload),
    Other,
}

/// Classify an inbound text frame. Never fails: anything not recognisable is
/// [`Frame::Other`].
pub fn parse_frame(text: &str) -> Frame {
    let Ok(raw) = serde_json::from_str::<RawFrame>(text) else {
        return Frame::Other;
    };

    if let Some(tick) = raw.tick {
        return serde_json::from_value::<TickPayload>(tick)
            .map(Frame::Tick)
            .unwrap_or(Frame::Other);
    }

    raw.error.map(Frame::Error).unwrap_or(Frame::Other)
}

/// Deserialize a quote sent either as a JSON number or a numeric string.
fn de_quote<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quote {
        Number(f64),
        Text(String),
    }

    match Quote::deserialize(deserializer)? {
        Quote::Number(quote) => Ok(quote),
        Quote::Text(text) => text.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_request() {
        let channel = ChannelId::new("1HZ10V");
        let actual = serde_json::to_string(&SubscribeRequest::new(&channel)).unwrap();
        assert_eq!(actual, r#"{"ticks":"1HZ10V","subscribe":1}"#);
    }

    #[test]
    fn test_parse_frame() {
        struct TestCase {
            input: &'static str,
            expected: Frame,
        }

        let tests = vec![
            TestCase {
                // TC0: tick frame with numeric quote
                input: r#"
                    {
                        "echo_req": {"subscribe": 1, "ticks": "1HZ10V"},
                        "msg_type": "tick",
                        "subscription": {"id": "2a9b0c4e"},
                        "tick": {
                            "ask": 6419.76,
                            "bid": 6419.56,
                            "epoch": 1715000000,
                            "id": "2a9b0c4e",
                            "pip_size": 2,
                            "quote": 6419.66,
                            "symbol": "1HZ10V"
                        }
                    }
                "#,
                expected: Frame::Tick(TickPayload {
                    quote: 6419.66,
                    symbol: Some("1HZ10V".to_string()),
                    epoch: Some(1715000000),
                }),
            },
            TestCase {
                // TC1: tick frame with string quote
                input: r#"{"tick": {"quote": "812.37"}}"#,
                expected: Frame::Tick(TickPayload {
                    quote: 812.37,
                    symbol: None,
                    epoch: None,
                }),
            },
            TestCase {
                // TC2: tick frame with unparsable quote is not a tick
                input: r#"{"tick": {"quote": "n/a", "symbol": "1HZ10V"}}"#,
                expected: Frame::Other,
            },
            TestCase {
                // TC3: tick frame without quote is not a tick
                input: r#"{"tick": {"symbol": "1HZ10V"}}"#,
                expected: Frame::Other,
            },
            TestCase {
                // TC4: error frame
                input: r#"{"error": {"code": "InvalidSymbol", "message": "Symbol R_0 invalid"}, "msg_type": "tick"}"#,
                expected: Frame::Error(ErrorPayload {
                    code: Some("InvalidSymbol".to_string()),
                    message: Some("Symbol R_0 invalid".to_string()),
                }),
            },
            TestCase {
                // TC5: ping ack
                input: r#"{"msg_type": "ping", "ping": "pong"}"#,
                expected: Frame::Other,
            },
            TestCase {
                // TC6: not json
                input: "hello",
                expected: Frame::Other,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = parse_frame(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
