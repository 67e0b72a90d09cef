use crate::{
    channel::ChannelId,
    filter::DataFilter,
    session::ConnectionState,
    stats::{
        StatsTable,
        bucket::{BucketClass, StatBucket},
    },
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Soft success/failure reported by supervisor commands.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Connection summary of one channel.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    pub connected: bool,
    pub reconnect_attempts: u32,
    pub total_ticks: usize,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SystemStatus {
    pub running: bool,
    pub connections: IndexMap<ChannelId, ChannelStatus>,
    pub total_ticks: usize,
    pub recent_activity_count: usize,
    pub data_filter: DataFilter,
}

/// Which computation produced a [`ResultsReport`].
///
/// Live statistics evaluate each tick once on arrival and are never rebuilt, so they keep
/// evaluations of ticks since evicted from history. Windowed statistics are rebuilt from
/// empty over the trailing slice. The two generally differ.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResultsMode {
    Live,
    Windowed { ticks: usize },
}

impl From<DataFilter> for ResultsMode {
    fn from(value: DataFilter) -> Self {
        match value {
            DataFilter::NoFilter => ResultsMode::Live,
            DataFilter::Last(ticks) => ResultsMode::Windowed { ticks },
        }
    }
}

/// Presentation of one [`StatBucket`].
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BucketReport {
    pub wins: u64,
    pub losses: u64,
    pub entries: u64,
    pub win_rate: f64,
    pub current_win_streak: u64,
    pub current_loss_streak: u64,
    pub max_win_streak: u64,
    pub max_loss_streak: u64,
}

impl From<&StatBucket> for BucketReport {
    fn from(bucket: &StatBucket) -> Self {
        Self {
            wins: bucket.wins(),
            losses: bucket.losses(),
            entries: bucket.entries(),
            win_rate: bucket.win_rate(),
            current_win_streak: bucket.win_streak(),
            current_loss_streak: bucket.loss_streak(),
            max_win_streak: bucket.max_win_streak(),
            max_loss_streak: bucket.max_loss_streak(),
        }
    }
}

/// Buckets of one window length, one per [`BucketClass`].
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct WindowReport {
    pub all: BucketReport,
    pub even_origin: BucketReport,
    pub odd_origin: BucketReport,
}

impl WindowReport {
    pub fn class(&self, class: BucketClass) -> &BucketReport {
        match class {
            BucketClass::All => &self.all,
            BucketClass::EvenOrigin => &self.even_origin,
            BucketClass::OddOrigin => &self.odd_origin,
        }
    }
}

impl From<&[StatBucket; 3]> for WindowReport {
    fn from(row: &[StatBucket; 3]) -> Self {
        Self {
            all: BucketReport::from(&row[BucketClass::All.index()]),
            even_origin: BucketReport::from(&row[BucketClass::EvenOrigin.index()]),
            odd_origin: BucketReport::from(&row[BucketClass::OddOrigin.index()]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelResults {
    pub connected: bool,
    pub total_ticks: usize,
    /// Ticks the windowed statistics were rebuilt over, `None` for live statistics.
    pub analysed_ticks: Option<usize>,
    /// Keyed by window length.
    pub groups: BTreeMap<usize, WindowReport>,
}

impl ChannelResults {
    pub fn new(
        connected: bool,
        total_ticks: usize,
        analysed_ticks: Option<usize>,
        table: &StatsTable,
    ) -> Self {
        Self {
            connected,
            total_ticks,
            analysed_ticks,
            groups: table
                .iter()
                .map(|(len, row)| (len, WindowReport::from(row)))
                .collect(),
        }
    }

    pub fn window(&self, len: usize) -> Option<&WindowReport> {
        self.groups.get(&len)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResultsReport {
    pub mode: ResultsMode,
    pub channels: IndexMap<ChannelId, ChannelResults>,
}
