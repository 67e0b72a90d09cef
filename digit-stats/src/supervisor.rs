//! Connection supervisor owning every [`ChannelSession`].
//!
//! One task per channel drives its upstream connection, one periodic task runs the health
//! sweep, and each scheduled reconnect is its own short-lived delay task. Channel state is
//! only ever touched under that channel's lock, channels never share a lock.

use crate::{
    activity::{ActivityEntry, RecentActivity},
    channel::ChannelId,
    config::FeedConfig,
    connector::Connector,
    error::FeedError,
    filter::DataFilter,
    history::Tick,
    opportunity::{DEFAULT_MIN_ENTRIES, OpportunityScan, scan},
    protocol::TickPayload,
    report::{
        ChannelResults, ChannelStatus, CommandOutcome, ResultsMode, ResultsReport, SystemStatus,
    },
    session::{ChannelSession, ChannelState, ReconnectPlan},
    stats::StatsTable,
};
use chrono::Utc;
use futures::StreamExt;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

/// Cheaply cloneable handle to the shared supervisor.
///
/// [`Supervisor::start`] spawns Tokio tasks, so it must be called from within a Tokio
/// runtime.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Shared>,
}

struct Shared {
    config: FeedConfig,
    connector: Arc<dyn Connector>,
    sessions: IndexMap<ChannelId, ChannelSession>,
    running: AtomicBool,
    activity: Mutex<RecentActivity>,
    filter: RwLock<DataFilter>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("channels", &self.inner.sessions.keys().collect::<Vec<_>>())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Validate `config` and initialise the full channel set. Nothing connects until
    /// [`Supervisor::start`].
    pub fn new<C>(config: FeedConfig, connector: C) -> Result<Self, FeedError>
    where
        C: Connector,
    {
        config.validate()?;

        let sessions = config
            .channels
            .iter()
            .map(|channel| {
                (
                    channel.clone(),
                    ChannelSession::new(channel.clone(), config.history_capacity, config.windows),
                )
            })
            .collect();

        Ok(Self {
            inner: Arc::new(Shared {
                activity: Mutex::new(RecentActivity::new(config.recent_capacity)),
                filter: RwLock::new(config.default_filter),
                connector: Arc::new(connector),
                sessions,
                running: AtomicBool::new(false),
                sweeper: Mutex::new(None),
                config,
            }),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.inner.sessions.keys()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running()
    }

    /// Connect every channel and start the health sweep.
    ///
    /// Fails softly if already running.
    pub fn start(&self) -> CommandOutcome {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return CommandOutcome::failed("system is already running");
        }

        let now = Instant::now();
        for session in self.inner.sessions.values() {
            let mut state = session.lock();
            state.prepare_start(now);
            self.inner.spawn_connection(session, &mut state);
        }

        let sweeper = self.inner.spawn_sweeper();
        if let Some(previous) = self.inner.sweeper.lock().replace(sweeper) {
            previous.abort();
        }

        info!(
            channels = self.inner.sessions.len(),
            sweep_interval = ?self.inner.config.sweep_interval,
            stale_after = ?self.inner.config.stale_after,
            "supervisor started"
        );
        CommandOutcome::ok(format!("started {} channels", self.inner.sessions.len()))
    }

    /// Close every connection and stop the health sweep. History and statistics survive.
    ///
    /// Fails softly if not running.
    pub fn stop(&self) -> CommandOutcome {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return CommandOutcome::failed("system is not running");
        }

        if let Some(sweeper) = self.inner.sweeper.lock().take() {
            sweeper.abort();
        }
        for session in self.inner.sessions.values() {
            session.lock().stop();
        }

        info!("supervisor stopped");
        CommandOutcome::ok("system stopped")
    }

    /// Clear history, statistics, and the recent activity feed of every channel as one
    /// operation. Always succeeds, whether running or not.
    pub fn reset(&self) -> CommandOutcome {
        // Every channel lock then the feed lock, the same order ticks are accepted in
        let mut states = self
            .inner
            .sessions
            .values()
            .map(ChannelSession::lock)
            .collect::<Vec<_>>();
        let mut activity = self.inner.activity.lock();

        states.iter_mut().for_each(|state| state.reset_data());
        activity.clear();

        info!(channels = states.len(), "statistics reset");
        CommandOutcome::ok("all data reset")
    }

    pub fn filter(&self) -> DataFilter {
        *self.inner.filter.read()
    }

    /// Replace the active filter. An unlisted value fails softly and leaves the prior
    /// filter in place.
    pub fn set_filter(&self, filter: DataFilter) -> CommandOutcome {
        match filter.validate() {
            Ok(filter) => {
                *self.inner.filter.write() = filter;
                info!(%filter, "data filter updated");
                CommandOutcome::ok(format!("data filter set to {filter}"))
            }
            Err(error) => {
                warn!(%error, "rejected data filter");
                CommandOutcome::failed(error.to_string())
            }
        }
    }

    /// [`Supervisor::set_filter`] from its text form, eg/ "500" or "no_filter".
    pub fn set_filter_str(&self, value: &str) -> CommandOutcome {
        match value.parse::<DataFilter>() {
            Ok(filter) => self.set_filter(filter),
            Err(error) => {
                warn!(%error, "rejected data filter");
                CommandOutcome::failed(error.to_string())
            }
        }
    }

    pub fn status(&self) -> SystemStatus {
        let connections = self
            .inner
            .sessions
            .iter()
            .map(|(channel, session)| {
                let state = session.lock();
                let status = ChannelStatus {
                    state: state.state(),
                    connected: state.state().is_connected(),
                    reconnect_attempts: state.reconnect_attempts(),
                    total_ticks: state.history().len(),
                };
                (channel.clone(), status)
            })
            .collect::<IndexMap<_, _>>();

        SystemStatus {
            running: self.is_running(),
            total_ticks: connections.values().map(|status| status.total_ticks).sum(),
            recent_activity_count: self.inner.activity.lock().len(),
            data_filter: self.filter(),
            connections,
        }
    }

    /// Results of every channel.
    ///
    /// [`DataFilter::NoFilter`] returns the live statistics. [`DataFilter::Last`] rebuilds
    /// statistics over the last `n` retained ticks, clamped to what each channel retains.
    pub fn results(&self, filter: DataFilter) -> ResultsReport {
        ResultsReport {
            mode: ResultsMode::from(filter),
            channels: self
                .inner
                .sessions
                .iter()
                .map(|(channel, session)| {
                    (channel.clone(), self.inner.channel_report(session, filter))
                })
                .collect(),
        }
    }

    /// [`Supervisor::results`] using the active filter.
    pub fn filtered_results(&self) -> ResultsReport {
        self.results(self.filter())
    }

    /// Results of one configured channel.
    pub fn channel_results(
        &self,
        channel: &ChannelId,
        filter: DataFilter,
    ) -> Result<ChannelResults, FeedError> {
        self.inner
            .sessions
            .get(channel)
            .map(|session| self.inner.channel_report(session, filter))
            .ok_or_else(|| FeedError::UnknownChannel(channel.to_string()))
    }

    /// Recent ticks across all channels, most recent last.
    pub fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.inner.activity.lock().snapshot()
    }

    /// Best and worst window lengths of the results under the active filter.
    pub fn opportunities(&self) -> OpportunityScan {
        scan(&self.filtered_results(), DEFAULT_MIN_ENTRIES)
    }

    /// Run one health sweep now, returning the channels found stale.
    pub fn sweep(&self) -> Vec<ChannelId> {
        self.inner.sweep()
    }
}

impl Shared {
    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin a new connection for the channel whose lock is held as `state`.
    ///
    /// The task is attached before the lock is released, so it cannot observe the channel
    /// before its own generation is current.
    fn spawn_connection(self: &Arc<Self>, session: &ChannelSession, state: &mut ChannelState) {
        let generation = state.begin_connect();
        debug!(channel = %session.id(), generation, "connecting");

        let task = tokio::spawn(Arc::clone(self).run_connection(session.clone(), generation));
        state.attach(generation, task.abort_handle());
    }

    async fn run_connection(self: Arc<Self>, session: ChannelSession, generation: u64) {
        let channel = session.id().clone();

        let connect = self.connector.connect(&channel);
        let reason = match tokio::time::timeout(self.config.connect_timeout, connect).await {
            Err(_) => FeedError::Connect(format!(
                "no connection within {:?}",
                self.config.connect_timeout
            )),
            Ok(Err(error)) => error,
            Ok(Ok(mut stream)) => {
                let opened = session.lock().on_open(generation, Instant::now());
                if !opened {
                    debug!(%channel, generation, "superseded before open");
                    return;
                }
                info!(%channel, generation, "channel connected");

                loop {
                    match stream.next().await {
                        Some(Ok(payload)) => {
                            if !self.accept_tick(&session, generation, payload) {
                                debug!(%channel, generation, "connection superseded");
                                return;
                            }
                        }
                        Some(Err(error)) => break error,
                        None => break FeedError::Closed("tick stream ended".to_string()),
                    }
                }
            }
        };

        self.handle_disconnect(&session, generation, reason);
    }

    /// Returns false once the connection of `generation` is no longer live.
    fn accept_tick(
        &self,
        session: &ChannelSession,
        generation: u64,
        payload: TickPayload,
    ) -> bool {
        let channel = session.id();
        if payload
            .symbol
            .as_deref()
            .is_some_and(|symbol| symbol != channel.as_str())
        {
            debug!(%channel, symbol = ?payload.symbol, "dropping tick for another channel");
            return true;
        }

        let tick = Tick::new(payload.quote, Utc::now());

        let mut state = session.lock();
        if !state.on_tick(generation, tick, Instant::now()) {
            return false;
        }
        self.activity
            .lock()
            .push(ActivityEntry::new(channel.clone(), &tick));
        true
    }

    fn handle_disconnect(
        self: &Arc<Self>,
        session: &ChannelSession,
        generation: u64,
        reason: FeedError,
    ) {
        let plan = session.lock().on_disconnect(
            generation,
            self.running(),
            self.config.max_reconnect_attempts,
        );

        match plan {
            Some(plan) => {
                if reason.is_transient() {
                    warn!(channel = %session.id(), generation, %reason, "connection lost");
                } else {
                    error!(channel = %session.id(), generation, %reason, "connection failed");
                }
                self.apply_plan(session, generation, plan);
            }
            None => {
                debug!(channel = %session.id(), generation, %reason, "ignoring stale disconnect");
            }
        }
    }

    /// Act on the reconnect decision made for the connection of `generation`.
    fn apply_plan(
        self: &Arc<Self>,
        session: &ChannelSession,
        generation: u64,
        plan: ReconnectPlan,
    ) {
        let max = self.config.max_reconnect_attempts;
        match plan {
            ReconnectPlan::Schedule { attempt } => {
                info!(
                    channel = %session.id(),
                    generation,
                    attempt,
                    max,
                    delay = ?self.config.reconnect_delay,
                    "scheduling reconnect"
                );
                let shared = Arc::clone(self);
                let session = session.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(shared.config.reconnect_delay).await;
                    shared.reconnect(&session, generation);
                });
            }
            ReconnectPlan::Exhausted => {
                error!(channel = %session.id(), max, "reconnect attempts exhausted");
            }
            ReconnectPlan::Idle => {
                debug!(channel = %session.id(), "system stopped, not reconnecting");
            }
        }
    }

    /// Fire a reconnect scheduled for the connection of `generation`. A no-op once stopped,
    /// once the channel left the reconnecting state, or once a restart began a newer
    /// generation.
    fn reconnect(self: &Arc<Self>, session: &ChannelSession, generation: u64) {
        let mut state = session.lock();
        if !self.running() || !state.should_reconnect(generation) {
            debug!(
                channel = %session.id(),
                generation,
                state = %state.state(),
                "dropping scheduled reconnect"
            );
            return;
        }
        self.spawn_connection(session, &mut state);
    }

    fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let shared = Arc::clone(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if !shared.running() {
                    break;
                }
                shared.sweep();
            }
        })
    }

    fn sweep(self: &Arc<Self>) -> Vec<ChannelId> {
        let now = Instant::now();
        let mut stale = Vec::new();

        for session in self.sessions.values() {
            let (generation, plan) = {
                let mut state = session.lock();
                let plan = state.mark_stale(
                    now,
                    self.config.stale_after,
                    self.config.max_reconnect_attempts,
                );
                (state.generation(), plan)
            };
            if let Some(plan) = plan {
                warn!(
                    channel = %session.id(),
                    stale_after = ?self.config.stale_after,
                    "no ticks received, channel stale"
                );
                self.apply_plan(session, generation, plan);
                stale.push(session.id().clone());
            }
        }

        stale
    }

    fn channel_report(&self, session: &ChannelSession, filter: DataFilter) -> ChannelResults {
        match filter {
            DataFilter::NoFilter => {
                let state = session.lock();
                ChannelResults::new(
                    state.state().is_connected(),
                    state.history().len(),
                    None,
                    state.stats(),
                )
            }
            DataFilter::Last(ticks) => {
                let (connected, total_ticks, digits) = {
                    let state = session.lock();
                    (
                        state.state().is_connected(),
                        state.history().len(),
                        state.digits_snapshot(ticks),
                    )
                };
                let table = StatsTable::recompute(self.config.windows, &digits);
                ChannelResults::new(connected, total_ticks, Some(digits.len()), &table)
            }
        }
    }
}
