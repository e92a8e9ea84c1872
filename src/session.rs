use chrono::{DateTime, Local};
use rand::RngCore;
use serde::Serialize;

use crate::clock::{ClockToken, SessionClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::text::{DifficultyProfile, TextBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Active,
    Finished,
}

/// Speed measured at one whole second of the countdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl From<WpmSample> for (f64, f64) {
    fn from(s: WpmSample) -> Self {
        (s.t, s.wpm)
    }
}

/// One typing test. Created Idle by [`Session::create`] and only ever
/// mutated by the controller; a reset replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) buffer: TextBuffer,
    pub(crate) typed_input: String,
    pub(crate) clock: SessionClock,
    pub(crate) started_at: Option<DateTime<Local>>,
    pub(crate) metrics: Metrics,
    pub(crate) wpm_samples: Vec<WpmSample>,
}

impl Session {
    /// Validate `config` and build a fresh Idle session.
    pub fn create(
        token: ClockToken,
        config: &EngineConfig,
        profile: &DifficultyProfile,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::fresh(token, config, profile, rng))
    }

    pub(crate) fn fresh(
        token: ClockToken,
        config: &EngineConfig,
        profile: &DifficultyProfile,
        rng: &mut dyn RngCore,
    ) -> Self {
        let buffer = TextBuffer::seeded(
            profile,
            rng,
            config.lookahead_threshold,
            config.minimum_initial_length,
        );

        Self {
            state: SessionState::Idle,
            buffer,
            typed_input: String::new(),
            clock: SessionClock::new(token, config.total_duration_secs),
            started_at: None,
            metrics: Metrics::default(),
            wpm_samples: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target_text(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn typed_input(&self) -> &str {
        &self.typed_input
    }

    pub fn total_duration_secs(&self) -> u32 {
        self.clock.total_secs()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.clock.remaining_secs()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.clock.elapsed_secs()
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn token(&self) -> ClockToken {
        self.clock.token()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        &self.wpm_samples
    }

    /// Immutable view handed to renderers and callbacks
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            remaining_seconds: self.remaining_secs(),
            state: self.state,
            target_text: self.target_text().to_string(),
            typed_input: self.typed_input.clone(),
            wpm: self.metrics.wpm,
            cpm: self.metrics.cpm,
            accuracy: self.metrics.accuracy,
            correct_count: self.metrics.correct_count,
            incorrect_count: self.metrics.incorrect_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub remaining_seconds: u32,
    pub state: SessionState,
    pub target_text: String,
    pub typed_input: String,
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: u32,
    pub correct_count: usize,
    pub incorrect_count: usize,
}
