use crate::{Candidate, ScrollStyleSnapshot, StateNotice, StatsNotice};

/// Side effects requested by [`crate::update`]; the engine executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Override the root elements' styles so programmatic scrolling works.
    ApplyScrollStyles,
    /// Put the pre-run inline styles back. `discard_staging` additionally
    /// removes staged capture artifacts; a freeze keeps them for the save.
    RestoreScrollStyles {
        snapshot: ScrollStyleSnapshot,
        discard_staging: bool,
    },
    StartScroll,
    StopScroll,
    StartObserver,
    StopObserver,
    /// Run one immediate scan cycle.
    ScanNow,
    /// Put a freshly admitted candidate behind the stability gate.
    AwaitStability { candidate: Candidate },
    EmitStats(StatsNotice),
    EmitState(StateNotice),
}
