use crate::{CommitOutcome, Effect, Msg, Phase, RunState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested {
            config,
            known_urls,
            style_snapshot,
        } => {
            if state.phase() == Phase::Running {
                return (state, Vec::new());
            }
            state.begin_run(config, known_urls, style_snapshot);
            vec![
                Effect::ApplyScrollStyles,
                Effect::StartObserver,
                Effect::ScanNow,
                Effect::StartScroll,
                Effect::EmitStats(state.stats()),
                Effect::EmitState(state.state_notice()),
            ]
        }
        Msg::CandidateDiscovered { candidate } => {
            if state.phase() != Phase::Running || state.at_cap() {
                return (state, Vec::new());
            }
            if !state.admit(&candidate.detail_key) {
                return (state, Vec::new());
            }
            vec![
                Effect::AwaitStability { candidate },
                Effect::EmitStats(state.stats()),
            ]
        }
        Msg::CandidateSettled { candidate, now_ms } => {
            if state.phase() != Phase::Running {
                return (state, Vec::new());
            }
            match state.commit(&candidate, now_ms) {
                CommitOutcome::Accepted => {
                    let mut effects = vec![Effect::EmitStats(state.stats())];
                    if state.at_cap() {
                        // Cap stop: scrolling ends but styles and staging stay
                        // in place until an explicit stop or reset arrives.
                        state.set_phase(Phase::Idle);
                        effects.push(Effect::StopScroll);
                        effects.push(Effect::StopObserver);
                    }
                    effects.push(Effect::EmitState(state.state_notice()));
                    effects
                }
                CommitOutcome::Duplicate
                | CommitOutcome::CapReached
                | CommitOutcome::Placeholder
                | CommitOutcome::LowQuality => Vec::new(),
            }
        }
        Msg::ScrollEnded { reason: _ } => {
            if state.phase() != Phase::Running {
                return (state, Vec::new());
            }
            state.set_phase(Phase::Idle);
            vec![
                Effect::StopObserver,
                Effect::EmitState(state.state_notice()),
            ]
        }
        Msg::StopRequested { freeze } => {
            state.set_phase(if freeze { Phase::Frozen } else { Phase::Idle });
            let mut effects = vec![Effect::StopScroll, Effect::StopObserver];
            if let Some(snapshot) = state.take_style_snapshot() {
                effects.push(Effect::RestoreScrollStyles {
                    snapshot,
                    discard_staging: !freeze,
                });
            }
            effects.push(Effect::EmitState(state.state_notice()));
            effects
        }
        Msg::ResetRequested => {
            state.set_phase(Phase::Idle);
            let mut effects = vec![Effect::StopScroll, Effect::StopObserver];
            if let Some(snapshot) = state.take_style_snapshot() {
                effects.push(Effect::RestoreScrollStyles {
                    snapshot,
                    discard_staging: true,
                });
            }
            effects.push(Effect::EmitState(state.state_notice()));
            effects
        }
    };

    (state, effects)
}
