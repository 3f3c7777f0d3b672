use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Attribute mutations that restart a candidate's settle countdown. Anything
/// else (data attributes, aria churn) is noise and must not delay the gate.
pub const WATCHED_ATTRIBUTES: [&str; 4] = ["src", "srcset", "style", "class"];

/// Debounced per-candidate settle tracking, keyed by detail key.
///
/// A watched element settles when no watched-attribute mutation has arrived
/// for `timeout`; an element that never mutates settles exactly one timeout
/// after `watch`. Every watched mutation restarts the countdown, so the gate
/// resolves `timeout` after the *last* change, not the first.
#[derive(Debug)]
pub struct StabilityGate {
    timeout: Duration,
    deadlines: HashMap<String, Instant>,
}

impl StabilityGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadlines: HashMap::new(),
        }
    }

    /// Begin watching a key. Watching an already-watched key is a no-op so a
    /// re-discovered candidate cannot push its own deadline out.
    pub fn watch(&mut self, detail_key: &str, now: Instant) {
        self.deadlines
            .entry(detail_key.to_owned())
            .or_insert(now + self.timeout);
    }

    /// Note an observed mutation. Returns true if a countdown restarted.
    pub fn note_mutation(&mut self, detail_key: &str, attribute: &str, now: Instant) -> bool {
        if !WATCHED_ATTRIBUTES.contains(&attribute) {
            return false;
        }
        match self.deadlines.get_mut(detail_key) {
            Some(deadline) => {
                *deadline = now + self.timeout;
                true
            }
            None => false,
        }
    }

    /// Earliest pending deadline, for the controller's timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose countdown has elapsed.
    pub fn take_settled(&mut self, now: Instant) -> Vec<String> {
        let settled: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &settled {
            self.deadlines.remove(key);
        }
        settled
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

