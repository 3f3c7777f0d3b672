use std::collections::HashSet;

use crate::ledger::{Candidate, CaptureLedger, CommitOutcome};

/// Lifecycle of the single process-wide run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    /// Stopped for save: styles restored, staged capture artifacts kept.
    Frozen,
}

/// Per-run configuration loaded from the settings collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub max_items: usize,
    pub scroll_delay_ms: u64,
    pub stability_timeout_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            scroll_delay_ms: 300,
            stability_timeout_ms: 400,
        }
    }
}

/// Inline style values of the two scroll-affecting root elements, captured
/// before the run overrides them and restored on stop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrollStyleSnapshot {
    pub root_style: String,
    pub body_style: String,
}

/// Periodic progress notification for the external progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsNotice {
    pub seen: usize,
    pub captured: usize,
    pub deduped: usize,
    pub total: usize,
}

/// Lifecycle notification for the external progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateNotice {
    pub running: bool,
    pub captured: usize,
    pub max_items: usize,
}

/// The single owned run state. Only [`crate::update`] mutates it; every other
/// component reads `phase` to decide whether to keep working.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    phase: Phase,
    config: RunConfig,
    seen: usize,
    deduped: usize,
    seen_keys: HashSet<String>,
    /// Census of every distinct media URL known on the page; drives `total`.
    known_urls: HashSet<String>,
    ledger: CaptureLedger,
    last_accepted_at: Option<u64>,
    style_snapshot: Option<ScrollStyleSnapshot>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> RunConfig {
        self.config
    }

    pub fn captured(&self) -> usize {
        self.ledger.len()
    }

    pub fn at_cap(&self) -> bool {
        self.ledger.at_cap()
    }

    pub fn last_accepted_at(&self) -> Option<u64> {
        self.last_accepted_at
    }

    pub fn ledger(&self) -> &CaptureLedger {
        &self.ledger
    }

    pub fn style_snapshot(&self) -> Option<&ScrollStyleSnapshot> {
        self.style_snapshot.as_ref()
    }

    pub fn stats(&self) -> StatsNotice {
        StatsNotice {
            seen: self.seen,
            captured: self.ledger.len(),
            deduped: self.deduped,
            total: self.known_urls.len(),
        }
    }

    pub fn state_notice(&self) -> StateNotice {
        StateNotice {
            running: self.phase == Phase::Running,
            captured: self.ledger.len(),
            max_items: self.config.max_items,
        }
    }

    pub(crate) fn begin_run(
        &mut self,
        config: RunConfig,
        known_urls: Vec<String>,
        style_snapshot: ScrollStyleSnapshot,
    ) {
        self.phase = Phase::Running;
        self.config = config;
        self.seen = 0;
        self.deduped = 0;
        self.seen_keys.clear();
        self.known_urls = known_urls.into_iter().collect();
        self.ledger = CaptureLedger::new(config.max_items);
        self.last_accepted_at = None;
        self.style_snapshot = Some(style_snapshot);
    }

    /// Admission by detail key: the first discovery wins, later ones no-op.
    pub(crate) fn admit(&mut self, detail_key: &str) -> bool {
        if self.seen_keys.contains(detail_key) {
            return false;
        }
        self.seen_keys.insert(detail_key.to_owned());
        self.seen += 1;
        true
    }

    pub(crate) fn commit(&mut self, candidate: &Candidate, now_ms: u64) -> CommitOutcome {
        let outcome = self.ledger.try_commit(candidate, now_ms);
        if outcome == CommitOutcome::Accepted {
            // A settled candidate that skipped discovery still counts as seen.
            if self.seen_keys.insert(candidate.detail_key.clone()) {
                self.seen += 1;
            }
            self.deduped = self.seen_keys.len();
            self.last_accepted_at = Some(now_ms);
            self.known_urls.insert(candidate.url.clone());
        }
        outcome
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Forces Idle and drops run artifacts; the style snapshot is consumed by
    /// the restore effect that accompanies the transition.
    pub(crate) fn take_style_snapshot(&mut self) -> Option<ScrollStyleSnapshot> {
        self.style_snapshot.take()
    }
}
