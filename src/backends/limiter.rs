use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Per-backend admission control: a sliding one-minute call budget plus a
/// cooldown window after the provider answered HTTP 429.
pub struct RateLimiter {
    calls_per_minute: u32,
    cooldown: Duration,
    state: Mutex<LimiterState>,
}

#[derive(Default)]
struct LimiterState {
    calls: VecDeque<Instant>,
    cooling_until: Option<Instant>,
}

impl RateLimiter {
    /// `calls_per_minute == 0` disables the budget.
    pub fn new(calls_per_minute: u32, cooldown: Duration) -> Self {
        Self {
            calls_per_minute,
            cooldown,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Reserve one call. Returns `false` when saturated or cooling down.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.cooling_until.is_some_and(|until| now < until) {
            return false;
        }
        state.cooling_until = None;

        if self.calls_per_minute == 0 {
            return true;
        }
        while state
            .calls
            .front()
            .is_some_and(|at| now.duration_since(*at) >= WINDOW)
        {
            state.calls.pop_front();
        }
        if state.calls.len() >= self.calls_per_minute as usize {
            return false;
        }
        state.calls.push_back(now);
        true
    }

    /// Start the cooldown window.
    pub fn cool_down(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.cooling_until = Some(Instant::now() + self.cooldown);
    }

    /// Time left before the backend is admitted again, if cooling down.
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let until = state.cooling_until?;
        until.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_enforced_per_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn zero_budget_means_unlimited() {
        let limiter = RateLimiter::unlimited();
        assert!((0..500).all(|_| limiter.try_acquire()));
    }

    #[test]
    fn cooldown_blocks_until_expiry() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        limiter.cool_down();
        assert!(!limiter.try_acquire());
        assert!(limiter.remaining_cooldown().is_some());
    }

    #[test]
    fn zero_cooldown_expires_immediately() {
        let limiter = RateLimiter::new(10, Duration::ZERO);
        limiter.cool_down();
        assert!(limiter.try_acquire());
        assert!(limiter.remaining_cooldown().is_none());
    }
}
