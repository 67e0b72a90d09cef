//! Per-channel connection lifecycle.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connected -> Reconnecting           (close, error, staleness)
//! Reconnecting -> Connecting          (after the constant reconnect delay)
//! Connecting | Reconnecting -> Exhausted  (reconnect attempts at maximum)
//! ```
//!
//! Every transition is one method on [`ChannelState`]. Each connection is tagged with a
//! generation so events from a torn-down connection are ignored.

use crate::{
    channel::ChannelId,
    digit::Digit,
    history::{Tick, TickHistory},
    stats::{StatsTable, WindowRange},
};
use derive_more::Display;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{task::AbortHandle, time::Instant};

/// Connection state of one channel.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Display, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    #[display("disconnected")]
    Disconnected,
    #[display("connecting")]
    Connecting,
    #[display("connected")]
    Connected,
    #[display("reconnecting")]
    Reconnecting,
    /// Reconnect attempts exhausted, no further automatic recovery until restarted.
    #[display("exhausted")]
    Exhausted,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// What to do after a connection ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReconnectPlan {
    /// Reconnect after the constant delay, this being attempt number `attempt`.
    Schedule { attempt: u32 },
    /// Attempt cap reached, channel is now [`ConnectionState::Exhausted`].
    Exhausted,
    /// System is stopped, channel is now [`ConnectionState::Disconnected`].
    Idle,
}

/// Mutable state of one channel, always accessed under its [`ChannelSession`] lock.
#[derive(Debug)]
pub struct ChannelState {
    state: ConnectionState,
    reconnect_attempts: u32,
    heartbeat: Instant,
    generation: u64,
    connection: Option<AbortHandle>,
    history: TickHistory,
    stats: StatsTable,
}

impl ChannelState {
    pub fn new(history_capacity: usize, windows: WindowRange) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            heartbeat: Instant::now(),
            generation: 0,
            connection: None,
            history: TickHistory::new(history_capacity),
            stats: StatsTable::new(windows),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    pub fn heartbeat(&self) -> Instant {
        self.heartbeat
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn history(&self) -> &TickHistory {
        &self.history
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    /// Digits of the last `n` retained ticks, detached from the live history.
    pub fn digits_snapshot(&self, n: usize) -> Vec<Digit> {
        self.history.trailing_digits(n)
    }

    /// Reset the reconnect counter and heartbeat ahead of a supervisor start.
    pub fn prepare_start(&mut self, now: Instant) {
        self.reconnect_attempts = 0;
        self.heartbeat = now;
    }

    /// Tear down any previous connection and enter [`ConnectionState::Connecting`].
    ///
    /// Returns the generation identifying the new connection.
    pub fn begin_connect(&mut self) -> u64 {
        self.teardown();
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        self.generation
    }

    /// Register the task driving the connection of the current generation.
    pub fn attach(&mut self, generation: u64, connection: AbortHandle) {
        if generation == self.generation {
            self.teardown();
            self.connection = Some(connection);
        } else {
            connection.abort();
        }
    }

    /// Connection established and subscribed.
    pub fn on_open(&mut self, generation: u64, now: Instant) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.reconnect_attempts = 0;
        self.heartbeat = now;
        true
    }

    /// Accept a tick, only while connected. Drives live aggregation.
    pub fn on_tick(&mut self, generation: u64, tick: Tick, now: Instant) -> bool {
        if generation != self.generation || !self.state.is_connected() {
            return false;
        }
        self.history.push(tick);
        self.stats.apply_live(&self.history);
        self.heartbeat = now;
        self.reconnect_attempts = 0;
        true
    }

    /// Connection closed or errored.
    ///
    /// Returns `None` when the event no longer applies (superseded generation, or the
    /// channel already left the live states).
    pub fn on_disconnect(
        &mut self,
        generation: u64,
        running: bool,
        max_attempts: u32,
    ) -> Option<ReconnectPlan> {
        if generation != self.generation
            || !matches!(
                self.state,
                ConnectionState::Connecting | ConnectionState::Connected
            )
        {
            return None;
        }

        self.connection = None;
        if !running {
            self.state = ConnectionState::Disconnected;
            return Some(ReconnectPlan::Idle);
        }
        Some(self.plan_reconnect(max_attempts))
    }

    /// Health sweep check: a connected channel whose heartbeat is older than `stale_after`
    /// is torn down and sent down the reconnect path.
    pub fn mark_stale(
        &mut self,
        now: Instant,
        stale_after: Duration,
        max_attempts: u32,
    ) -> Option<ReconnectPlan> {
        if !self.state.is_connected() || now.saturating_duration_since(self.heartbeat) <= stale_after
        {
            return None;
        }

        self.teardown();
        self.state = ConnectionState::Disconnected;
        Some(self.plan_reconnect(max_attempts))
    }

    /// Whether a reconnect scheduled for the connection of `generation` should connect now.
    ///
    /// A restart begins a new generation, so timers scheduled before it never fire into the
    /// new lifecycle.
    pub fn should_reconnect(&self, generation: u64) -> bool {
        generation == self.generation && self.state == ConnectionState::Reconnecting
    }

    /// Tear down the connection and enter [`ConnectionState::Disconnected`]. History and
    /// statistics are kept.
    pub fn stop(&mut self) {
        self.teardown();
        self.state = ConnectionState::Disconnected;
    }

    /// Clear history and statistics.
    pub fn reset_data(&mut self) {
        self.history.clear();
        self.stats.clear();
    }

    fn plan_reconnect(&mut self, max_attempts: u32) -> ReconnectPlan {
        if self.reconnect_attempts >= max_attempts {
            self.state = ConnectionState::Exhausted;
            return ReconnectPlan::Exhausted;
        }
        self.reconnect_attempts += 1;
        self.state = ConnectionState::Reconnecting;
        ReconnectPlan::Schedule {
            attempt: self.reconnect_attempts,
        }
    }

    fn teardown(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
    }
}

/// Shared handle to one channel's [`ChannelState`], guarded by a per-channel lock.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    id: ChannelId,
    state: Arc<Mutex<ChannelState>>,
}

impl ChannelSession {
    pub fn new(id: ChannelId, history_capacity: usize, windows: WindowRange) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(ChannelState::new(history_capacity, windows))),
        }
    }

    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    pub fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.lock().state()
    }
}
