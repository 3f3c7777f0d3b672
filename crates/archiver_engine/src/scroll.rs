use std::time::Duration;

use archiver_core::ScrollEndReason;
use tokio::time::Instant;

use crate::page::ScrollMetrics;

/// Fraction of the viewport advanced per scroll step.
pub const SCROLL_STEP_FRACTION: f64 = 0.9;
/// Corrective nudge applied when the run looks stuck.
pub const NUDGE_PX: f64 = 60.0;
/// Quiet period after which the driver tries a nudge.
pub const STUCK_AFTER: Duration = Duration::from_secs(6);
/// Extended stillness after which the run terminates.
pub const GIVE_UP_AFTER: Duration = Duration::from_secs(10);

/// What the driver should do on the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// Advance by a full step.
    Step,
    /// Stuck: apply a small corrective nudge and rescan.
    Nudge,
    Finish(ScrollEndReason),
}

/// Pure stuck-detection policy for the auto-scroll loop. The controller owns
/// the timer and the page; this type only decides.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPolicy {
    last_progress: Instant,
}

impl ScrollPolicy {
    pub fn new(now: Instant) -> Self {
        Self { last_progress: now }
    }

    /// An item was accepted; the run is making progress.
    pub fn note_accept(&mut self, now: Instant) {
        self.last_progress = now;
    }

    pub fn decide(&self, now: Instant, metrics: &ScrollMetrics) -> StepDecision {
        if metrics.at_bottom() {
            return StepDecision::Finish(ScrollEndReason::ReachedBottom);
        }
        let quiet = now.saturating_duration_since(self.last_progress);
        if quiet >= GIVE_UP_AFTER {
            // Terminate rather than pause: extended stillness means the end
            // of content or a loading stall the nudge could not clear.
            return StepDecision::Finish(ScrollEndReason::StuckTimeout);
        }
        if quiet >= STUCK_AFTER {
            return StepDecision::Nudge;
        }
        StepDecision::Step
    }
}
