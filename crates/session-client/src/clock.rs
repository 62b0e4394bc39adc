//! Elapsed connected time.
//!
//! The clock sums the spans spent `Connected`, measured with
//! [`tokio::time::Instant`]. A span closes on `Reconnecting` (paused) and on
//! any terminal state (stopped); partial seconds carry over into the next
//! span. It never resets; a new session gets a new clock.
//!
//! The connector arms a one-second interval while the clock runs, phased by
//! [`SessionClock::until_next_second`], and calls [`SessionClock::tick`] to
//! learn when the whole-second count moved.

use crate::state::ConnectionState;
use std::time::Duration;
use tokio::time::Instant;

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone)]
pub struct SessionClock {
    /// Connected time of all closed spans.
    accumulated: Duration,
    /// Start of the open span, while `Connected`.
    running_since: Option<Instant>,
    /// Last whole-second count handed out by `tick`.
    reported_seconds: u64,
}

impl SessionClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Total connected time at `now`.
    #[must_use]
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let open = self
            .running_since
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since));
        self.accumulated.saturating_add(open)
    }

    /// Whole connected seconds at `now`.
    #[must_use]
    pub fn elapsed_seconds_at(&self, now: Instant) -> u64 {
        self.elapsed_at(now).as_secs()
    }

    /// Time until the count next reaches a whole second, if it stays running.
    #[must_use]
    pub fn until_next_second(&self, now: Instant) -> Duration {
        let into_second = self.elapsed_at(now).subsec_nanos();
        SECOND.saturating_sub(Duration::from_nanos(u64::from(into_second)))
    }

    /// Follow a connection state change at `now`. Returns whether the clock
    /// runs.
    pub fn on_state(&mut self, state: ConnectionState, now: Instant) -> bool {
        match state {
            ConnectionState::Connected => {
                self.running_since.get_or_insert(now);
            }
            ConnectionState::Idle
            | ConnectionState::Connecting
            | ConnectionState::Reconnecting
            | ConnectionState::Disconnected
            | ConnectionState::Failed => {
                if let Some(since) = self.running_since.take() {
                    self.accumulated = self
                        .accumulated
                        .saturating_add(now.saturating_duration_since(since));
                }
            }
        }
        self.is_running()
    }

    /// The new whole-second count, if it moved since the last tick. `None`
    /// unless running.
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        let seconds = self.elapsed_seconds_at(now);
        (seconds > self.reported_seconds).then(|| {
            self.reported_seconds = seconds;
            seconds
        })
    }

    /// Elapsed time at `now` as `m:ss`.
    #[must_use]
    pub fn formatted_at(&self, now: Instant) -> String {
        format_elapsed(self.elapsed_seconds_at(now))
    }
}

/// Render seconds as `m:ss`. Minutes are not wrapped into hours.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
