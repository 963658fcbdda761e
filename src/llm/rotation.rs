//! API-key rotation state.
//!
//! Round-robin over the configured keys with per-key exhausted flags and a
//! time-based reset. This is an explicit state object owned by the HTTP
//! client, not global state; callers decide how to share it.

use chrono::{DateTime, Duration, Utc};

/// Rotation state over a fixed set of API keys.
#[derive(Debug, Clone)]
pub struct KeyRotation {
    keys: Vec<String>,
    current: usize,
    exhausted: Vec<bool>,
    last_reset: DateTime<Utc>,
    reset_after: Duration,
}

impl KeyRotation {
    /// Create a rotation over the given keys with a reset window in hours.
    pub fn new(keys: Vec<String>, reset_hours: i64) -> Self {
        let exhausted = vec![false; keys.len()];
        Self {
            keys,
            current: 0,
            exhausted,
            last_reset: Utc::now(),
            reset_after: Duration::hours(reset_hours),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Index of the key currently in use (1-based is the operator-facing
    /// convention in logs).
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The key to use for the next request.
    ///
    /// Applies the time-based reset, then scans forward from the current
    /// position for a non-exhausted key. When every key is exhausted the
    /// first key is returned anyway - the upstream 429 is a better signal to
    /// the caller than refusing to try.
    pub fn current_key(&mut self) -> Option<&str> {
        self.maybe_reset();

        if self.keys.is_empty() {
            return None;
        }

        for offset in 0..self.keys.len() {
            let index = (self.current + offset) % self.keys.len();
            if !self.exhausted[index] {
                if index != self.current {
                    tracing::info!(key = index + 1, "switched to API key");
                    self.current = index;
                }
                let index = self.current;
                return Some(&self.keys[index]);
            }
        }

        Some(&self.keys[0])
    }

    /// Mark the key currently in use as exhausted and advance to the next
    /// live one. Returns true when another non-exhausted key exists.
    pub fn mark_exhausted(&mut self) -> bool {
        if self.keys.is_empty() {
            return false;
        }

        tracing::warn!(key = self.current + 1, "API key exhausted");
        self.exhausted[self.current] = true;

        for offset in 1..self.keys.len() {
            let next = (self.current + offset) % self.keys.len();
            if !self.exhausted[next] {
                self.current = next;
                tracing::info!(key = next + 1, "switched to API key");
                return true;
            }
        }
        false
    }

    /// Clear all exhausted flags and restart from the first key.
    pub fn reset(&mut self) {
        self.current = 0;
        self.exhausted.fill(false);
        self.last_reset = Utc::now();
    }

    fn maybe_reset(&mut self) {
        if Utc::now() - self.last_reset >= self.reset_after {
            tracing::info!("API keys reset after quota window");
            self.reset();
        }
    }

    #[cfg(test)]
    fn backdate_last_reset(&mut self, hours: i64) {
        self.last_reset = Utc::now() - Duration::hours(hours);
    }
}
