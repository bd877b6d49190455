//! Network-idle detection.
//!
//! [`SettleDetector`] races two deadlines: a quiet-period deadline pushed
//! back by every activity notification, and an absolute deadline fixed when
//! the detector is armed. Whichever passes first resolves the detector, and
//! once resolved it ignores further activity.
//!
//! The detector never spawns timers of its own. [`SettleDetector::next_resolution`]
//! sleeps until the nearer deadline and is meant to be polled inside a
//! `tokio::select!` next to the event source; dropping it mid-sleep cancels
//! the pending timer without changing state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);
pub const DEFAULT_ABSOLUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Stand-in for deadlines too far out for `Instant` to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleOutcome {
    /// The network stayed silent for a full quiet period.
    Settled,
    /// The absolute timeout passed first.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    Idle,
    Armed {
        quiet_deadline: Instant,
        hard_deadline: Instant,
        resets: u64,
    },
    Resolved(SettleOutcome),
}

#[derive(Debug)]
pub struct SettleDetector {
    quiet_period: Duration,
    absolute_timeout: Duration,
    state: DetectorState,
}

impl Default for SettleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD, DEFAULT_ABSOLUTE_TIMEOUT)
    }
}

impl SettleDetector {
    pub fn new(quiet_period: Duration, absolute_timeout: Duration) -> Self {
        Self {
            quiet_period,
            absolute_timeout,
            state: DetectorState::Idle,
        }
    }

    /// Records network activity: arms the detector on first use and pushes the
    /// quiet deadline back otherwise. No effect once resolved.
    pub fn notify_activity(&mut self) {
        let now = Instant::now();
        let quiet_period = self.quiet_period;
        if let DetectorState::Armed {
            quiet_deadline,
            resets,
            ..
        } = &mut self.state
        {
            *quiet_deadline = deadline_after(now, quiet_period);
            *resets += 1;
        } else if self.state == DetectorState::Idle {
            self.arm(now);
        }
    }

    pub fn outcome(&self) -> Option<SettleOutcome> {
        match self.state {
            DetectorState::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DetectorState::Armed { .. })
    }

    /// Number of times activity pushed the quiet deadline back.
    pub fn resets(&self) -> u64 {
        match self.state {
            DetectorState::Armed { resets, .. } => resets,
            _ => 0,
        }
    }

    /// Waits for the nearer of the two deadlines and resolves.
    ///
    /// Arms the detector if no activity has been seen yet. Cancel-safe: a
    /// future dropped before its deadline leaves the detector armed, and the
    /// next call waits on the deadlines as they stand then.
    pub async fn next_resolution(&mut self) -> SettleOutcome {
        let (quiet_deadline, hard_deadline) = match self.state {
            DetectorState::Idle => self.arm(Instant::now()),
            DetectorState::Armed {
                quiet_deadline,
                hard_deadline,
                ..
            } => (quiet_deadline, hard_deadline),
            DetectorState::Resolved(outcome) => return outcome,
        };

        // Hard deadline only wins when strictly earlier than the quiet one.
        let outcome = if hard_deadline < quiet_deadline {
            tokio::time::sleep_until(hard_deadline).await;
            SettleOutcome::TimedOut
        } else {
            tokio::time::sleep_until(quiet_deadline).await;
            SettleOutcome::Settled
        };
        self.state = DetectorState::Resolved(outcome);
        outcome
    }

    fn arm(&mut self, now: Instant) -> (Instant, Instant) {
        let quiet_deadline = deadline_after(now, self.quiet_period);
        let hard_deadline = deadline_after(now, self.absolute_timeout);
        self.state = DetectorState::Armed {
            quiet_deadline,
            hard_deadline,
            resets: 0,
        };
        tracing::debug!(
            target: "loadtrace_session",
            quiet_ms = u64::try_from(self.quiet_period.as_millis()).unwrap_or(u64::MAX),
            timeout_ms = u64::try_from(self.absolute_timeout.as_millis()).unwrap_or(u64::MAX),
            "settle detector armed"
        );
        (quiet_deadline, hard_deadline)
    }
}

fn deadline_after(now: Instant, period: Duration) -> Instant {
    now.checked_add(period).unwrap_or_else(|| now + FAR_FUTURE)
}
