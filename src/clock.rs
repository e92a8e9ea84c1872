use std::time::Duration;

/// Period between countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies the session a clock (and every tick it schedules) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockToken(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ClockState {
    Stopped,
    Running,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token, or the clock is not running
    Ignored,
    Ticked { remaining_secs: u32 },
    Expired,
}

/// Whole-second countdown bound to one session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionClock {
    token: ClockToken,
    state: ClockState,
    total_secs: u32,
    remaining_secs: u32,
}

impl SessionClock {
    pub fn new(token: ClockToken, total_secs: u32) -> Self {
        Self {
            token,
            state: ClockState::Stopped,
            total_secs,
            remaining_secs: total_secs,
        }
    }

    /// Stopped -> Running. Returns false if the clock was not stopped.
    pub fn start(&mut self) -> bool {
        if self.state != ClockState::Stopped {
            return false;
        }
        self.state = ClockState::Running;
        true
    }

    /// Disarm the clock. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Stopped;
        }
    }

    /// Apply one elapsed second if `token` matches and the clock is running.
    pub fn tick(&mut self, token: ClockToken) -> TickOutcome {
        if token != self.token || self.state != ClockState::Running {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = ClockState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    pub fn token(&self) -> ClockToken {
        self.token
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Seconds counted down so far.
    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }
}
