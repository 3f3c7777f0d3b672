use crate::{Candidate, RunConfig, ScrollStyleSnapshot};

/// Why the auto-scroll driver ended its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEndReason {
    /// The scroll container reached its end.
    ReachedBottom,
    /// Extended stillness: the stuck recovery also produced nothing.
    StuckTimeout,
    /// The capture ledger reached `max_items`.
    CapReached,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Begin a run. No-op while already Running.
    StartRequested {
        config: RunConfig,
        /// Census of every media URL currently on the page (drives `total`).
        known_urls: Vec<String>,
        /// Pre-run inline styles of the scroll-affecting root elements.
        style_snapshot: ScrollStyleSnapshot,
    },
    /// The scan cycle found a candidate; admission is first-discovery-wins.
    CandidateDiscovered { candidate: Candidate },
    /// A candidate passed the stability gate with its freshest source.
    CandidateSettled { candidate: Candidate, now_ms: u64 },
    /// The auto-scroll driver terminated on its own.
    ScrollEnded { reason: ScrollEndReason },
    /// External stop. `freeze` keeps staged artifacts for the save step.
    StopRequested { freeze: bool },
    /// Force Idle from any phase.
    ResetRequested,
}
