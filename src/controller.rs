use chrono::Local;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockToken, TickOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics;
use crate::session::{Session, SessionState, Snapshot, WpmSample};
use crate::text::DifficultyProfile;

/// Emitted on every accepted input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub percent: u32,
    pub wpm: u32,
    pub cpm: u32,
}

/// Emitted once, when the countdown expires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishEvent {
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: u32,
    pub difficulty: String,
    pub total_duration_secs: u32,
}

/// Result of one controller operation
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotUpdate {
    pub snapshot: Snapshot,
    /// Set when this call moved the session from Idle to Active; the caller
    /// should arm a once-per-second ticker carrying this token.
    pub started: Option<ClockToken>,
    pub progress: Option<ProgressEvent>,
    pub finished: Option<FinishEvent>,
}

/// Owns the session state machine. All mutation goes through
/// [`process_input`](Self::process_input), [`on_tick`](Self::on_tick) and
/// [`reset_session`](Self::reset_session).
#[derive(Debug)]
pub struct SessionController<R: RngCore = StdRng> {
    config: EngineConfig,
    profile: DifficultyProfile,
    rng: R,
    session: Session,
    next_token: u64,
}

impl SessionController<StdRng> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible text generation
    pub fn with_seed(config: EngineConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> SessionController<R> {
    /// Resolve the configured difficulty (unknown ids fall back to the
    /// default profile) and create the first session.
    pub fn with_rng(config: EngineConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let profile = DifficultyProfile::resolve(&config.difficulty)?;
        Self::with_profile(config, profile, rng)
    }

    /// Use a custom profile instead of a built-in one.
    pub fn with_profile(
        config: EngineConfig,
        profile: DifficultyProfile,
        mut rng: R,
    ) -> Result<Self> {
        let token = ClockToken(1);
        let session = Session::create(token, &config, &profile, &mut rng)?;

        tracing::debug!(
            difficulty = profile.id(),
            duration = config.total_duration_secs,
            "created session"
        );

        Ok(Self {
            config,
            profile,
            rng,
            session,
            next_token: token.0 + 1,
        })
    }

    /// Apply the full current input string.
    ///
    /// The first call after a reset starts the clock, whatever the input.
    /// Once finished, calls change nothing and emit no events.
    pub fn process_input(&mut self, value: &str) -> SnapshotUpdate {
        if self.session.state == SessionState::Finished {
            return self.update(None, None, None);
        }

        let mut started = None;
        if self.session.state == SessionState::Idle {
            self.session.clock.start();
            self.session.state = SessionState::Active;
            self.session.started_at = Some(Local::now());
            started = Some(self.session.token());
            tracing::debug!(token = self.session.token().0, "session started");
        }

        let typed_len = value.chars().count();
        self.session
            .buffer
            .ensure_lookahead(typed_len, &self.profile, &mut self.rng);

        let session = &mut self.session;
        session.metrics = metrics::compute(
            session.buffer.as_str(),
            value,
            f64::from(session.clock.elapsed_secs()),
        );
        session.typed_input = value.to_string();

        let target_len = session.buffer.char_len();
        let percent = ((100.0 * typed_len as f64 / target_len as f64).round() as u32).min(100);
        let progress = ProgressEvent {
            percent,
            wpm: session.metrics.wpm,
            cpm: session.metrics.cpm,
        };

        self.update(started, Some(progress), None)
    }

    /// Apply one countdown second. Ticks for another session, or for a clock
    /// that is not running, are ignored.
    pub fn on_tick(&mut self, token: ClockToken) -> SnapshotUpdate {
        let outcome = self.session.clock.tick(token);
        if outcome == TickOutcome::Ignored {
            tracing::debug!(
                token = token.0,
                current = self.session.token().0,
                clock = %self.session.clock.state(),
                "ignoring tick"
            );
            return self.update(None, None, None);
        }

        self.record_sample();

        if outcome != TickOutcome::Expired {
            return self.update(None, None, None);
        }

        self.session.state = SessionState::Finished;
        self.session.clock.stop();

        let m = self.session.metrics;
        let finish = FinishEvent {
            wpm: m.wpm,
            cpm: m.cpm,
            accuracy: m.accuracy,
            difficulty: self.profile.id().to_string(),
            total_duration_secs: self.session.total_duration_secs(),
        };
        tracing::info!(
            wpm = finish.wpm,
            cpm = finish.cpm,
            accuracy = finish.accuracy,
            difficulty = %finish.difficulty,
            "session finished"
        );

        self.update(None, None, Some(finish))
    }

    /// Disarm the clock and replace the session with a fresh Idle one.
    /// Ticks still carrying the old token are ignored afterwards.
    pub fn reset_session(&mut self) -> Snapshot {
        self.session.clock.stop();

        let token = ClockToken(self.next_token);
        self.next_token += 1;
        self.session = Session::fresh(token, &self.config, &self.profile, &mut self.rng);

        tracing::debug!(token = token.0, "session reset");
        self.session.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn wpm_samples(&self) -> &[WpmSample] {
        self.session.wpm_samples()
    }

    fn record_sample(&mut self) {
        let session = &mut self.session;
        let elapsed = session.clock.elapsed_secs();
        let current = metrics::compute(
            session.buffer.as_str(),
            &session.typed_input,
            f64::from(elapsed),
        );
        session.wpm_samples.push(WpmSample {
            t: f64::from(elapsed),
            wpm: f64::from(current.wpm),
        });
    }

    fn update(
        &self,
        started: Option<ClockToken>,
        progress: Option<ProgressEvent>,
        finished: Option<FinishEvent>,
    ) -> SnapshotUpdate {
        SnapshotUpdate {
            snapshot: self.session.snapshot(),
            started,
            progress,
            finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockState;
    use assert_matches::assert_matches;

    fn controller(secs: u32, difficulty: &str) -> SessionController {
        SessionController::with_seed(EngineConfig::new(secs, difficulty), 42).unwrap()
    }

    fn tick_n(c: &mut SessionController, n: u32) {
        let token = c.session().token();
        for _ in 0..n {
            c.on_tick(token);
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let c = controller(60, "medium");
        let snap = c.snapshot();
        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(snap.remaining_seconds, 60);
        assert_eq!(snap.typed_input, "");
        assert!(snap.target_text.chars().count() >= 100);
    }

    #[test]
    fn test_unknown_difficulty_falls_back() {
        let c = controller(30, "impossible");
        assert_eq!(c.profile().id(), "medium");
    }

    #[test]
    fn test_zero_duration_fails_fast() {
        let err = SessionController::with_seed(EngineConfig::new(0, "easy"), 1).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_first_input_starts_session() {
        let mut c = controller(60, "medium");
        let update = c.process_input("");

        assert_eq!(update.started, Some(c.session().token()));
        assert_eq!(update.snapshot.state, SessionState::Active);
        assert_eq!(c.session().clock().state(), ClockState::Running);
        assert_eq!(update.snapshot.wpm, 0);
        assert_eq!(update.snapshot.cpm, 0);
        assert_eq!(update.snapshot.accuracy, 100);
        assert!(c.session().started_at().is_some());
    }

    #[test]
    fn test_only_first_input_reports_start() {
        let mut c = controller(60, "medium");
        assert!(c.process_input("a").started.is_some());
        assert!(c.process_input("ab").started.is_none());
    }

    #[test]
    fn test_metrics_follow_countdown() {
        let config = EngineConfig {
            minimum_initial_length: 400,
            ..EngineConfig::new(60, "medium")
        };
        let mut c = SessionController::with_seed(config, 42).unwrap();
        let target = c.snapshot().target_text;

        c.process_input("");
        tick_n(&mut c, 30);

        // 135 correct chars followed by 15 wrong ones
        let mut typed: String = target.chars().take(135).collect();
        typed.extend(target.chars().skip(135).take(15).map(|_| '#'));
        let update = c.process_input(&typed);

        assert_eq!(update.snapshot.remaining_seconds, 30);
        assert_eq!(update.snapshot.incorrect_count, 15);
        assert_eq!(update.snapshot.wpm, 54);
        assert_eq!(update.snapshot.cpm, 270);
        assert_eq!(update.snapshot.accuracy, 90);
    }

    #[test]
    fn test_lookahead_grows_before_metrics() {
        let mut c = controller(60, "easy");
        let target = c.snapshot().target_text;
        let len = target.chars().count();
        let typed: String = target.chars().take(len - 50).collect();

        let update = c.process_input(&typed);

        assert!(update.snapshot.target_text.chars().count() > len);
        assert!(update.snapshot.target_text.starts_with(&target));
        assert_eq!(update.snapshot.incorrect_count, 0);
    }

    #[test]
    fn test_progress_percent() {
        let mut c = controller(60, "medium");
        let update = c.process_input("");
        assert_progress(&update, 0);

        let target = c.snapshot().target_text;
        let len = c.session().buffer().char_len();
        let typed: String = target.chars().take(10).collect();
        let update = c.process_input(&typed);
        let expected = (100.0 * 10.0 / len as f64).round() as u32;
        assert_progress(&update, expected);
    }

    fn assert_progress(update: &SnapshotUpdate, percent: u32) {
        let progress = update.progress.expect("progress event");
        assert_eq!(progress.percent, percent);
        assert_eq!(progress.wpm, update.snapshot.wpm);
    }

    #[test]
    fn test_expiry_finishes_once() {
        let mut c = controller(3, "medium");
        c.process_input("x");
        let token = c.session().token();

        assert!(c.on_tick(token).finished.is_none());
        assert!(c.on_tick(token).finished.is_none());
        let last = c.on_tick(token);
        let finish = last.finished.expect("finish event");
        assert_eq!(finish.total_duration_secs, 3);
        assert_eq!(finish.difficulty, "medium");
        assert_eq!(last.snapshot.state, SessionState::Finished);

        let again = c.on_tick(token);
        assert!(again.finished.is_none());
        assert_eq!(again.snapshot.remaining_seconds, 0);
        assert_eq!(again.snapshot.state, SessionState::Finished);
    }

    #[test]
    fn test_ticks_before_start_are_ignored() {
        let mut c = controller(10, "medium");
        let token = c.session().token();
        c.on_tick(token);
        assert_eq!(c.snapshot().remaining_seconds, 10);
        assert_eq!(c.snapshot().state, SessionState::Idle);
    }

    #[test]
    fn test_input_after_finish_is_noop() {
        let mut c = controller(1, "medium");
        c.process_input("ab");
        let token = c.session().token();
        c.on_tick(token);
        let before = c.snapshot();

        let update = c.process_input("abcdefghijklmnopqrstuvwxyz");

        assert_eq!(update.snapshot, before);
        assert!(update.progress.is_none());
        assert!(update.started.is_none());
    }

    #[test]
    fn test_reset_replaces_session() {
        let mut c = controller(30, "hard");
        c.process_input("abc");
        let old = c.session().token();
        tick_n(&mut c, 5);

        let snap = c.reset_session();

        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(snap.remaining_seconds, 30);
        assert_eq!(snap.typed_input, "");
        assert!(snap.target_text.chars().count() >= 100);
        assert_ne!(c.session().token(), old);
        assert!(c.wpm_samples().is_empty());
    }

    #[test]
    fn test_stale_tick_after_reset_is_ignored() {
        let mut c = controller(30, "medium");
        c.process_input("a");
        let old = c.session().token();
        c.reset_session();
        c.process_input("a");

        c.on_tick(old);

        assert_eq!(c.snapshot().remaining_seconds, 30);
        assert_matches!(c.snapshot().state, SessionState::Active);
    }

    #[test]
    fn test_samples_recorded_per_tick() {
        let mut c = controller(10, "medium");
        let target = c.snapshot().target_text;
        c.process_input("");
        tick_n(&mut c, 2);
        let typed: String = target.chars().take(20).collect();
        c.process_input(&typed);
        tick_n(&mut c, 1);

        let samples = c.wpm_samples();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].wpm, 0.0);
        assert_eq!(samples[2].t, 3.0);
        // 20 correct chars over 3 seconds -> 80 wpm
        assert_eq!(samples[2].wpm, 80.0);
    }
}
