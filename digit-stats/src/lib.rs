//! # Digit-Stats
//! Streams live price ticks from a set of independent upstream channels, projects each
//! quote onto a single decimal digit, and keeps running win/loss statistics of a parity
//! pattern rule for every channel, window length, and origin class.
//!
//! **It is:**
//! * **Resilient**: every channel has its own connection lifecycle with staleness
//!   detection and fixed-delay, attempt-capped reconnection.
//! * **Independent**: channels share no lock. A fault on one never affects another.
//! * **Dual-mode**: [`DataFilter::NoFilter`] returns the live statistics, updated once per
//!   arriving tick, while [`DataFilter::Last`] rebuilds statistics over a trailing slice of
//!   retained history. Results are flagged with the [`ResultsMode`] that produced them.
//!
//! ## Overview
//! A [`Supervisor`] owns one [`ChannelSession`](session::ChannelSession) per configured
//! channel and connects them through a [`Connector`]. See `digit-stats-server` for a
//! runnable process.
//!
//! ```rust,no_run
//! use digit_stats::{FeedConfig, Supervisor, WsConnector};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = FeedConfig::new(["1HZ10V", "1HZ25V"]);
//!     let connector = WsConnector::new(config.url.clone());
//!     let supervisor = Supervisor::new(config, connector).unwrap();
//!
//!     supervisor.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!
//!     let results = supervisor.filtered_results();
//!     println!("{}", serde_json::to_string_pretty(&results).unwrap());
//!     supervisor.stop();
//! }
//! ```

/// Bounded feed of the most recent ticks across all channels.
pub mod activity;

/// Opaque upstream channel identifier.
pub mod channel;

/// [`FeedConfig`] and its environment overrides.
pub mod config;

/// [`Connector`] seam to the upstream feed and its WebSocket implementation.
pub mod connector;

/// Digit extraction from raw quotes.
pub mod digit;

/// All errors generated in `digit-stats`.
pub mod error;

/// Results filter selecting live or windowed statistics.
pub mod filter;

/// [`Tick`](history::Tick) and the bounded per-channel tick history.
pub mod history;

/// Best and worst window length scan over a results report.
pub mod opportunity;

/// Upstream wire format.
pub mod protocol;

/// Serialisable status, results, and command outcomes.
pub mod report;

/// Parity pattern rule.
pub mod rule;

/// Per-channel connection lifecycle state machine.
pub mod session;

/// Win/loss buckets and the live and windowed aggregation modes.
pub mod stats;

/// Owner of every channel session, health sweep, and reconnect scheduling.
pub mod supervisor;

pub use channel::ChannelId;
pub use config::FeedConfig;
pub use connector::{Connector, TickStream, WsConnector};
pub use error::FeedError;
pub use filter::DataFilter;
pub use report::{CommandOutcome, ResultsMode, ResultsReport, SystemStatus};
pub use supervisor::Supervisor;
