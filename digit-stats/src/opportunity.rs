use crate::{
    channel::ChannelId,
    report::{ChannelResults, ResultsReport},
};
use derive_more::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Buckets with this many entries or fewer are ignored by the cross-channel scan.
pub const DEFAULT_MIN_ENTRIES: u64 = 10;

/// Best win rate above this is [`Signal::Favourable`].
pub const FAVOURABLE_WIN_RATE: f64 = 70.0;

/// Worst win rate below this is [`Signal::Unfavourable`].
pub const UNFAVOURABLE_WIN_RATE: f64 = 30.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    #[display("favourable")]
    Favourable,
    #[display("unfavourable")]
    Unfavourable,
    #[display("neutral")]
    Neutral,
}

/// One (channel, window length) ALL-class bucket singled out by a scan.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Opportunity {
    pub channel: ChannelId,
    pub window_len: usize,
    pub win_rate: f64,
    pub entries: u64,
    pub signal: Signal,
}

/// Best and worst window length of a single channel.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelExtremes {
    pub best_window: usize,
    pub best_win_rate: f64,
    pub worst_window: usize,
    pub worst_win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OpportunityScan {
    pub best: Option<Opportunity>,
    pub worst: Option<Opportunity>,
    pub per_channel: IndexMap<ChannelId, ChannelExtremes>,
}

/// Scan every channel and window length of a results report.
///
/// The cross-channel best/worst only consider ALL buckets with more than `min_entries`
/// entries. Ties keep the first candidate in channel then window order.
pub fn scan(report: &ResultsReport, min_entries: u64) -> OpportunityScan {
    let mut best: Option<Opportunity> = None;
    let mut worst: Option<Opportunity> = None;

    for (channel, results) in &report.channels {
        for (&window_len, window) in &results.groups {
            if window.all.entries <= min_entries {
                continue;
            }
            let win_rate = window.all.win_rate;

            if best.as_ref().is_none_or(|best| win_rate > best.win_rate) {
                best = Some(Opportunity {
                    channel: channel.clone(),
                    window_len,
                    win_rate,
                    entries: window.all.entries,
                    signal: if win_rate > FAVOURABLE_WIN_RATE {
                        Signal::Favourable
                    } else {
                        Signal::Neutral
                    },
                });
            }
            if worst.as_ref().is_none_or(|worst| win_rate < worst.win_rate) {
                worst = Some(Opportunity {
                    channel: channel.clone(),
                    window_len,
                    win_rate,
                    entries: window.all.entries,
                    signal: if win_rate < UNFAVOURABLE_WIN_RATE {
                        Signal::Unfavourable
                    } else {
                        Signal::Neutral
                    },
                });
            }
        }
    }

    let per_channel = report
        .channels
        .iter()
        .filter_map(|(channel, results)| {
            channel_extremes(results).map(|extremes| (channel.clone(), extremes))
        })
        .collect();

    OpportunityScan {
        best,
        worst,
        per_channel,
    }
}

/// Best and worst window length among the channel's non-empty ALL buckets.
pub fn channel_extremes(results: &ChannelResults) -> Option<ChannelExtremes> {
    let mut extremes: Option<ChannelExtremes> = None;

    for (&window_len, window) in &results.groups {
        if window.all.entries == 0 {
            continue;
        }
        let win_rate = window.all.win_rate;

        match extremes.as_mut() {
            None => {
                extremes = Some(ChannelExtremes {
                    best_window: window_len,
                    best_win_rate: win_rate,
                    worst_window: window_len,
                    worst_win_rate: win_rate,
                })
            }
            Some(extremes) => {
                if win_rate > extremes.best_win_rate {
                    extremes.best_window = window_len;
                    extremes.best_win_rate = win_rate;
                }
                if win_rate < extremes.worst_win_rate {
                    extremes.worst_window = window_len;
                    extremes.worst_win_rate = win_rate;
                }
            }
        }
    }

    extremes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BucketReport, ResultsMode, WindowReport};
    use std::collections::BTreeMap;

    fn window(entries: u64, win_rate: f64) -> WindowReport {
        WindowReport {
            all: BucketReport {
                entries,
                win_rate,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn channel(windows: &[(usize, u64, f64)]) -> ChannelResults {
        ChannelResults {
            connected: true,
            total_ticks: 0,
            analysed_ticks: None,
            groups: windows
                .iter()
                .map(|&(len, entries, win_rate)| (len, window(entries, win_rate)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn report(channels: Vec<(&str, ChannelResults)>) -> ResultsReport {
        ResultsReport {
            mode: ResultsMode::Live,
            channels: channels
                .into_iter()
                .map(|(id, results)| (ChannelId::new(id), results))
                .collect(),
        }
    }

    #[test]
    fn test_scan() {
        struct TestCase {
            input: ResultsReport,
            expected_best: Option<(&'static str, usize, Signal)>,
            expected_worst: Option<(&'static str, usize, Signal)>,
        }

        let tests = vec![
            TestCase {
                // TC0: no channels
                input: report(vec![]),
                expected_best: None,
                expected_worst: None,
            },
            TestCase {
                // TC1: every bucket at or below min entries is ignored
                input: report(vec![("R_10", channel(&[(3, 10, 90.0), (4, 2, 0.0)]))]),
                expected_best: None,
                expected_worst: None,
            },
            TestCase {
                // TC2: extremes across channels w/ signals
                input: report(vec![
                    ("R_10", channel(&[(3, 40, 75.5), (4, 40, 50.0)])),
                    ("R_25", channel(&[(3, 40, 25.0), (5, 5, 99.0)])),
                ]),
                expected_best: Some(("R_10", 3, Signal::Favourable)),
                expected_worst: Some(("R_25", 3, Signal::Unfavourable)),
            },
            TestCase {
                // TC3: thresholds are exclusive
                input: report(vec![("R_10", channel(&[(3, 40, 70.0), (4, 40, 30.0)]))]),
                expected_best: Some(("R_10", 3, Signal::Neutral)),
                expected_worst: Some(("R_10", 4, Signal::Neutral)),
            },
            TestCase {
                // TC4: tie keeps first in order
                input: report(vec![
                    ("R_10", channel(&[(6, 20, 50.0)])),
                    ("R_25", channel(&[(6, 20, 50.0)])),
                ]),
                expected_best: Some(("R_10", 6, Signal::Neutral)),
                expected_worst: Some(("R_10", 6, Signal::Neutral)),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = scan(&test.input, DEFAULT_MIN_ENTRIES);
            let summarise = |opportunity: Option<Opportunity>| {
                opportunity.map(|opportunity| {
                    (
                        opportunity.channel.as_str().to_string(),
                        opportunity.window_len,
                        opportunity.signal,
                    )
                })
            };
            let expected = |value: Option<(&str, usize, Signal)>| {
                value.map(|(channel, len, signal)| (channel.to_string(), len, signal))
            };
            assert_eq!(
                summarise(actual.best),
                expected(test.expected_best),
                "TC{} failed",
                index
            );
            assert_eq!(
                summarise(actual.worst),
                expected(test.expected_worst),
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_channel_extremes() {
        assert_eq!(channel_extremes(&channel(&[(3, 0, 0.0), (4, 0, 0.0)])), None);

        let actual = channel_extremes(&channel(&[(3, 0, 0.0), (4, 3, 33.33), (5, 1, 100.0)]));
        assert_eq!(
            actual,
            Some(ChannelExtremes {
                best_window: 5,
                best_win_rate: 100.0,
                worst_window: 4,
                worst_win_rate: 33.33,
            })
        );
    }

    #[test]
    fn test_scan_per_channel_skips_empty_channels() {
        let actual = scan(
            &report(vec![
                ("R_10", channel(&[(3, 0, 0.0)])),
                ("R_25", channel(&[(3, 2, 50.0)])),
            ]),
            DEFAULT_MIN_ENTRIES,
        );
        assert_eq!(actual.per_channel.len(), 1);
        assert!(actual.per_channel.contains_key(&ChannelId::new("R_25")));
    }
}
