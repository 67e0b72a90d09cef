use crate::{
    activity::DEFAULT_RECENT_CAPACITY, channel::ChannelId, error::FeedError, filter::DataFilter,
    stats::WindowRange,
};
use std::{str::FromStr, time::Duration};
use url::Url;

/// Default upstream tick feed WebSocket url.
pub const DEFAULT_FEED_URL: &str = "wss://ws.binaryws.com/websockets/v3?app_id=82681";

/// Default channel set, one upstream connection each.
pub const DEFAULT_CHANNELS: [&str; 5] = ["1HZ10V", "1HZ25V", "1HZ50V", "1HZ75V", "1HZ100V"];

/// Supervisor and channel session configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Upstream WebSocket url
    pub url: String,
    /// Fixed channel set
    pub channels: Vec<ChannelId>,
    /// Ticks retained per channel
    pub history_capacity: usize,
    /// Window lengths evaluated for every channel
    pub windows: WindowRange,
    /// Bound on establishing and subscribing one connection
    pub connect_timeout: Duration,
    /// Constant delay before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Reconnect attempts before a channel is exhausted
    pub max_reconnect_attempts: u32,
    /// Period of the health sweep
    pub sweep_interval: Duration,
    /// Heartbeat age after which a connected channel is stale
    pub stale_after: Duration,
    /// Ticks retained by the recent activity feed
    pub recent_capacity: usize,
    /// Filter active at startup
    pub default_filter: DataFilter,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            channels: DEFAULT_CHANNELS.iter().map(ChannelId::new).collect(),
            history_capacity: 10_000,
            windows: WindowRange::default(),
            connect_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 100,
            sweep_interval: Duration::from_secs(10),
            stale_after: Duration::from_secs(30),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            default_filter: DataFilter::default(),
        }
    }
}

impl FeedConfig {
    /// Create a new configuration with custom channels
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            channels: channels.into_iter().map(ChannelId::new).collect(),
            ..Default::default()
        }
    }

    /// Load from environment with defaults. Unparsable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DIGIT_STATS_WS_URL") {
            config.url = url;
        }
        if let Ok(channels) = std::env::var("DIGIT_STATS_CHANNELS") {
            let channels = channels
                .split(',')
                .map(str::trim)
                .filter(|channel| !channel.is_empty())
                .map(ChannelId::new)
                .collect::<Vec<_>>();
            if !channels.is_empty() {
                config.channels = channels;
            }
        }

        config.history_capacity = env_or("DIGIT_STATS_HISTORY", config.history_capacity);
        config.max_reconnect_attempts =
            env_or("DIGIT_STATS_MAX_RECONNECTS", config.max_reconnect_attempts);
        config.recent_capacity = env_or("DIGIT_STATS_RECENT", config.recent_capacity);
        config.connect_timeout = Duration::from_secs(env_or(
            "DIGIT_STATS_CONNECT_TIMEOUT_SECS",
            config.connect_timeout.as_secs(),
        ));
        config.reconnect_delay = Duration::from_secs(env_or(
            "DIGIT_STATS_RECONNECT_DELAY_SECS",
            config.reconnect_delay.as_secs(),
        ));
        config.sweep_interval = Duration::from_secs(env_or(
            "DIGIT_STATS_SWEEP_SECS",
            config.sweep_interval.as_secs(),
        ));
        config.stale_after = Duration::from_secs(env_or(
            "DIGIT_STATS_STALE_SECS",
            config.stale_after.as_secs(),
        ));

        let min = env_or("DIGIT_STATS_WINDOW_MIN", config.windows.min());
        let max = env_or("DIGIT_STATS_WINDOW_MAX", config.windows.max());
        if let Ok(windows) = WindowRange::new(min, max) {
            config.windows = windows;
        }

        config
    }

    /// Set upstream url
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set per-channel history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set evaluated window lengths
    pub fn with_windows(mut self, windows: WindowRange) -> Self {
        self.windows = windows;
        self
    }

    /// Set connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set maximum reconnect attempts
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set health sweep period
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set staleness threshold
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Set recent activity feed capacity
    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    /// Set the filter active at startup
    pub fn with_default_filter(mut self, filter: DataFilter) -> Self {
        self.default_filter = filter;
        self
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        Url::parse(&self.url)
            .map_err(|error| FeedError::Config(format!("invalid url {}: {error}", self.url)))?;

        if self.channels.is_empty() {
            return Err(FeedError::Config("no channels configured".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(FeedError::Config("history capacity must be non-zero".to_string()));
        }
        if self.recent_capacity == 0 {
            return Err(FeedError::Config(
                "recent activity capacity must be non-zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(FeedError::Config("connect timeout must be non-zero".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(FeedError::Config("sweep interval must be non-zero".to_string()));
        }
        WindowRange::new(self.windows.min(), self.windows.max())?;
        self.default_filter.validate()?;

        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
