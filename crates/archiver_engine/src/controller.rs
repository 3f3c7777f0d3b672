use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use archiver_core::{update, Candidate, Effect, Msg, Phase, RunState};
use log::{debug, info};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use crate::fetch::MediaFetcher;
use crate::freeze::{self, PrepareOptions};
use crate::locate;
use crate::page::{MutationEvent, Page};
use crate::scroll::{ScrollPolicy, StepDecision, NUDGE_PX, SCROLL_STEP_FRACTION};
use crate::settings::SettingsStore;
use crate::stability::StabilityGate;
use crate::types::{EngineError, Notice, PrepareStats};

enum Command {
    Start,
    Stop {
        freeze: bool,
    },
    Reset,
    PrepareForSave {
        reply: oneshot::Sender<Result<PrepareStats, EngineError>>,
    },
}

/// Handle to a spawned run controller. Dropping it shuts the controller down
/// once in-flight work drains.
pub struct ControllerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    notices: mpsc::UnboundedReceiver<Notice>,
}

impl ControllerHandle {
    pub fn start(&self) {
        let _ = self.cmd_tx.send(Command::Start);
    }

    pub fn stop(&self, freeze: bool) {
        let _ = self.cmd_tx.send(Command::Stop { freeze });
    }

    pub fn reset(&self) {
        let _ = self.cmd_tx.send(Command::Reset);
    }

    /// Runs the freeze/prepare step and waits for its stats. Always resolves,
    /// even when the controller has gone away.
    pub async fn prepare_for_save(&self) -> Result<PrepareStats, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PrepareForSave { reply })
            .map_err(|_| EngineError::ControllerClosed)?;
        rx.await.unwrap_or(Err(EngineError::ControllerClosed))
    }

    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    pub fn try_notice(&mut self) -> Option<Notice> {
        self.notices.try_recv().ok()
    }
}

/// Owns the run state and serializes every mutation onto one task: commands,
/// observed DOM mutations, scroll ticks and stability settlements all land in
/// the same `select!` loop, so no locking is needed anywhere in the core.
pub struct RunController {
    page: Arc<dyn Page>,
    settings: Arc<dyn SettingsStore>,
    fetcher: Arc<dyn MediaFetcher>,
    state: RunState,
    gate: StabilityGate,
    /// Candidates admitted and waiting behind the stability gate.
    pending: HashMap<String, Candidate>,
    policy: Option<ScrollPolicy>,
    observing: bool,
    scroll_active: bool,
    next_scroll_at: Instant,
    step: u64,
    epoch: Instant,
    notice_tx: mpsc::UnboundedSender<Notice>,
}

impl RunController {
    pub fn spawn(
        page: Arc<dyn Page>,
        settings: Arc<dyn SettingsStore>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> ControllerHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let mutations = page.subscribe_mutations();

        let controller = Self {
            page,
            settings,
            fetcher,
            state: RunState::new(),
            gate: StabilityGate::new(Duration::from_millis(400)),
            pending: HashMap::new(),
            policy: None,
            observing: false,
            scroll_active: false,
            next_scroll_at: Instant::now(),
            step: 0,
            epoch: Instant::now(),
            notice_tx,
        };
        tokio::spawn(controller.run(cmd_rx, mutations));

        ControllerHandle {
            cmd_tx,
            notices: notice_rx,
        }
    }

    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut mutations: mpsc::UnboundedReceiver<MutationEvent>,
    ) {
        let mut mutations_open = true;
        loop {
            let scroll_armed = self.scroll_active && self.state.phase() == Phase::Running;
            let scroll_at = self.next_scroll_at;
            let gate_deadline = self.gate.next_deadline();

            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                event = mutations.recv(), if mutations_open => match event {
                    Some(event) => self.handle_mutation(event),
                    None => mutations_open = false,
                },
                _ = sleep_until(scroll_at), if scroll_armed => self.on_scroll_tick(),
                _ = sleep_until(gate_deadline.unwrap_or_else(Instant::now)),
                    if gate_deadline.is_some() => self.on_gate_deadline(),
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                let config = self.settings.load().into_config();
                info!(
                    "run: start requested (max_items {}, scroll_delay {}ms, stability {}ms)",
                    config.max_items, config.scroll_delay_ms, config.stability_timeout_ms
                );
                self.gate = StabilityGate::new(Duration::from_millis(config.stability_timeout_ms));
                self.pending.clear();
                let known_urls = locate::census(&self.page.html(), &self.page.base_url());
                let style_snapshot = self.page.read_root_styles();
                self.dispatch(Msg::StartRequested {
                    config,
                    known_urls,
                    style_snapshot,
                });
            }
            Command::Stop { freeze } => {
                info!("run: stop requested (freeze: {freeze})");
                self.dispatch(Msg::StopRequested { freeze });
            }
            Command::Reset => {
                info!("run: reset requested");
                self.dispatch(Msg::ResetRequested);
            }
            Command::PrepareForSave { reply } => {
                // Runs off the control loop so a long inline pass never
                // starves stop/reset handling; the page is shared state
                // either way.
                let page = self.page.clone();
                let fetcher = self.fetcher.clone();
                tokio::spawn(async move {
                    let stats =
                        freeze::prepare_for_save(page, fetcher, PrepareOptions::default()).await;
                    let _ = reply.send(Ok(stats));
                });
            }
        }
    }

    fn handle_mutation(&mut self, event: MutationEvent) {
        if !self.observing || self.state.phase() != Phase::Running {
            return;
        }
        if let (Some(key), Some(attribute)) = (&event.target_key, &event.attribute) {
            if self.gate.note_mutation(key, attribute, Instant::now()) {
                debug!("stability: countdown restarted for {key} ({attribute})");
            }
        }
        // Any observed change may have revealed new cards.
        self.scan_once();
    }

    fn on_scroll_tick(&mut self) {
        if !self.scroll_active || self.state.phase() != Phase::Running {
            self.scroll_active = false;
            return;
        }
        self.step += 1;
        archiver_logging::set_scroll_step(self.step);

        let now = Instant::now();
        let metrics = self.page.scroll_metrics();
        let decision = self
            .policy
            .map(|policy| policy.decide(now, &metrics))
            .unwrap_or(StepDecision::Step);

        match decision {
            StepDecision::Step => {
                self.page.scroll_by(SCROLL_STEP_FRACTION * metrics.viewport);
                self.scan_once();
            }
            StepDecision::Nudge => {
                debug!(
                    "scroll: no new items, nudging at step {}",
                    archiver_logging::get_scroll_step()
                );
                self.page.scroll_by(NUDGE_PX);
                self.scan_once();
            }
            StepDecision::Finish(reason) => {
                info!(
                    "scroll: finished after {} steps ({reason:?})",
                    archiver_logging::get_scroll_step()
                );
                self.scroll_active = false;
                self.dispatch(Msg::ScrollEnded { reason });
                return;
            }
        }
        self.next_scroll_at = now + Duration::from_millis(self.state.config().scroll_delay_ms);
    }

    fn on_gate_deadline(&mut self) {
        let now = Instant::now();
        let settled = self.gate.take_settled(now);
        if settled.is_empty() {
            return;
        }
        // Re-locate each settled key so the commit uses the freshest source,
        // not the one seen at discovery time.
        let fresh = locate::locate(&self.page.html(), &self.page.base_url());
        for key in settled {
            let stored = self.pending.remove(&key);
            let candidate = fresh
                .iter()
                .find(|c| c.detail_key == key)
                .cloned()
                .or(stored);
            if let Some(candidate) = candidate {
                let now_ms = self.run_clock_ms();
                self.dispatch(Msg::CandidateSettled { candidate, now_ms });
            }
        }
    }

    /// One scan pass: locate current candidates and offer each to the state
    /// machine. Admission is first-discovery-wins, so concurrent triggers
    /// (scroll tick, mutation callback) are safe no-ops for known keys.
    fn scan_once(&mut self) {
        if self.state.phase() != Phase::Running || self.state.at_cap() {
            return;
        }
        let candidates = locate::locate(&self.page.html(), &self.page.base_url());
        for candidate in candidates {
            if self.state.phase() != Phase::Running || self.state.at_cap() {
                break;
            }
            self.dispatch(Msg::CandidateDiscovered { candidate });
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let before_captured = state.captured();
        let (state, effects) = update(state, msg);
        self.state = state;

        if self.state.captured() > before_captured {
            if let Some(policy) = self.policy.as_mut() {
                policy.note_accept(Instant::now());
            }
        }
        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::ApplyScrollStyles => self.page.apply_scroll_styles(),
            Effect::RestoreScrollStyles {
                snapshot,
                discard_staging,
            } => {
                self.page.restore_root_styles(&snapshot);
                if discard_staging {
                    self.page.discard_staging();
                }
                self.gate.clear();
                self.pending.clear();
            }
            Effect::StartScroll => {
                let now = Instant::now();
                self.page.scroll_to_top();
                self.policy = Some(ScrollPolicy::new(now));
                self.scroll_active = true;
                self.step = 0;
                self.next_scroll_at =
                    now + Duration::from_millis(self.state.config().scroll_delay_ms);
            }
            Effect::StopScroll => {
                self.scroll_active = false;
                self.policy = None;
            }
            Effect::StartObserver => self.observing = true,
            Effect::StopObserver => self.observing = false,
            Effect::ScanNow => self.scan_once(),
            Effect::AwaitStability { candidate } => {
                self.gate.watch(&candidate.detail_key, Instant::now());
                self.pending.insert(candidate.detail_key.clone(), candidate);
            }
            Effect::EmitStats(stats) => {
                let _ = self.notice_tx.send(Notice::Stats(stats));
            }
            Effect::EmitState(state) => {
                let _ = self.notice_tx.send(Notice::State(state));
            }
        }
    }

    fn run_clock_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
