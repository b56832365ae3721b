//! Tribulation session state machine.
//!
//! A session walks `NotStarted -> PuzzlePending -> NarrativeStaging ->
//! Resolved`, skipping the puzzle phase when the gate carries no trial.
//! Character state is never touched here; the orchestrator applies all
//! consequences atomically once the session is terminal.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{TRIBULATION_HP_LOSS_MAX_PCT, TRIBULATION_HP_LOSS_MIN_PCT};
use crate::event::{SessionEvent, SessionEventKind};
use crate::narrative::{NarrativeStage, StageTimer};
use crate::numbers::pct_of_i64;
use crate::stats::{BonusBreakdown, StatBundle};
use crate::trial::{Attempt, Challenge, Evaluation, TrialError, evaluate};

/// Lifecycle phase of a tribulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    PuzzlePending,
    NarrativeStaging,
    Resolved,
}

/// Terminal outcome of a tribulation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TribulationResult {
    pub success: bool,
    pub failure_probability: f32,
    /// The uniform resolution draw; absent when attempt exhaustion forced
    /// the failure without a roll.
    pub roll: Option<f32>,
    /// HP cost of weathering the tribulation, set only on success.
    pub hp_loss: Option<i64>,
    pub description: String,
}

/// Misuse of the session surface.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("operation requires phase {expected:?}, session is {actual:?}")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("session is already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// One in-flight tribulation. Created by the orchestrator when a trial is
/// warranted; discarded when the consumer acknowledges the outcome.
#[derive(Debug, Clone)]
pub struct TribulationSession {
    target_tier: String,
    failure_probability: f32,
    total_stats: StatBundle,
    breakdown: BonusBreakdown,
    challenge: Option<Challenge>,
    attempts_used: u32,
    hint_used: bool,
    stage_timer: StageTimer,
    phase: SessionPhase,
    result: Option<TribulationResult>,
    max_hp_at_start: i64,
    events: Vec<SessionEvent>,
    event_seq: u16,
}

impl TribulationSession {
    /// Build a session from precomputed inputs. The failure probability is
    /// opaque, produced upstream by balancing.
    #[must_use]
    pub fn new(
        target_tier: &str,
        failure_probability: f32,
        total_stats: StatBundle,
        breakdown: BonusBreakdown,
        challenge: Option<Challenge>,
    ) -> Self {
        Self {
            target_tier: String::from(target_tier),
            failure_probability: failure_probability.clamp(0.0, 1.0),
            total_stats,
            breakdown,
            challenge,
            attempts_used: 0,
            hint_used: false,
            stage_timer: StageTimer::new(),
            phase: SessionPhase::NotStarted,
            result: None,
            max_hp_at_start: total_stats.max_hp,
            events: Vec::new(),
            event_seq: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn target_tier(&self) -> &str {
        &self.target_tier
    }

    #[must_use]
    pub const fn failure_probability(&self) -> f32 {
        self.failure_probability
    }

    /// Read-only stat snapshot shown during the tribulation.
    #[must_use]
    pub const fn total_stats(&self) -> &StatBundle {
        &self.total_stats
    }

    /// Itemized per-source-kind bonus breakdown, display only.
    #[must_use]
    pub const fn breakdown(&self) -> &BonusBreakdown {
        &self.breakdown
    }

    #[must_use]
    pub const fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    #[must_use]
    pub const fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    #[must_use]
    pub const fn result(&self) -> Option<&TribulationResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.phase, SessionPhase::Resolved)
    }

    /// Drain the pending presentation events.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, kind: SessionEventKind) {
        self.events.push(SessionEvent::new(self.event_seq, kind));
        self.event_seq = self.event_seq.saturating_add(1);
    }

    /// Start the session, entering the puzzle phase when a trial is
    /// attached and narrative staging otherwise.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` unless the session is untouched.
    pub fn begin(&mut self) -> Result<SessionPhase, SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::WrongPhase {
                expected: SessionPhase::NotStarted,
                actual: self.phase,
            });
        }
        if let Some(challenge) = &self.challenge {
            self.phase = SessionPhase::PuzzlePending;
            let challenge = challenge.clone();
            self.emit(SessionEventKind::ChallengeIssued { challenge });
        } else {
            self.phase = SessionPhase::NarrativeStaging;
        }
        Ok(self.phase)
    }

    /// Submit one puzzle attempt.
    ///
    /// A malformed submission is rejected without consuming an attempt. A
    /// miss that exhausts the budget resolves the session as an
    /// unconditional failure with no probability roll.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` outside the puzzle phase and
    /// `SessionError::Trial` for malformed submissions.
    pub fn submit_attempt(&mut self, attempt: &Attempt) -> Result<Evaluation, SessionError> {
        if self.phase != SessionPhase::PuzzlePending {
            return Err(SessionError::WrongPhase {
                expected: SessionPhase::PuzzlePending,
                actual: self.phase,
            });
        }
        let challenge = self
            .challenge
            .as_ref()
            .expect("puzzle phase implies a challenge");
        let evaluation = evaluate(challenge, attempt, self.attempts_used)?;
        if evaluation.solved {
            self.phase = SessionPhase::NarrativeStaging;
            self.emit(SessionEventKind::TrialSolved);
        } else {
            self.attempts_used = self.attempts_used.saturating_add(1);
            if evaluation.attempts_remaining == 0 {
                self.resolve_forced_failure();
            } else {
                self.emit(SessionEventKind::AttemptMissed {
                    attempts_remaining: evaluation.attempts_remaining,
                });
            }
        }
        Ok(evaluation)
    }

    /// Serve the penalty-free hint. The used flag is informational only.
    #[must_use]
    pub fn request_hint(&mut self) -> Option<String> {
        let text = self.challenge.as_ref().map(Challenge::hint)?;
        if !self.hint_used {
            self.hint_used = true;
            self.emit(SessionEventKind::HintServed { text: text.clone() });
        }
        Some(text)
    }

    #[must_use]
    pub const fn hint_used(&self) -> bool {
        self.hint_used
    }

    /// Step the narrative stage script, returning the stage just entered or
    /// `None` once every stage has played.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` outside narrative staging.
    pub fn advance_stage(&mut self) -> Result<Option<(usize, NarrativeStage)>, SessionError> {
        if self.phase != SessionPhase::NarrativeStaging {
            return Err(SessionError::WrongPhase {
                expected: SessionPhase::NarrativeStaging,
                actual: self.phase,
            });
        }
        let Some((index, stage)) = self.stage_timer.next() else {
            return Ok(None);
        };
        self.emit(SessionEventKind::StageEntered {
            index,
            label: String::from(stage.label),
        });
        Ok(Some((index, stage)))
    }

    /// Whether the stage script has fully played out.
    #[must_use]
    pub const fn staging_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::NarrativeStaging) && self.stage_timer.is_finished()
    }

    /// Resolve the tribulation with one uniform draw. Success requires the
    /// draw to meet or exceed the failure probability; a success costs a
    /// second, independent vitality draw worth 10-40% of max HP at trial
    /// start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyResolved` for a terminal session and
    /// `SessionError::WrongPhase` before staging has finished.
    pub fn resolve<R: Rng, V: Rng>(
        &mut self,
        resolve_rng: &mut R,
        vitality_rng: &mut V,
    ) -> Result<&TribulationResult, SessionError> {
        if self.phase == SessionPhase::Resolved {
            return Err(SessionError::AlreadyResolved);
        }
        if !self.staging_finished() {
            return Err(SessionError::WrongPhase {
                expected: SessionPhase::NarrativeStaging,
                actual: self.phase,
            });
        }
        let roll: f32 = resolve_rng.r#gen();
        let success = roll >= self.failure_probability;
        let hp_loss = success.then(|| {
            let pct = vitality_rng.gen_range(TRIBULATION_HP_LOSS_MIN_PCT..=TRIBULATION_HP_LOSS_MAX_PCT);
            pct_of_i64(self.max_hp_at_start, pct)
        });
        let description = if success {
            format!("{} tribulation weathered", self.target_tier)
        } else {
            format!("{} tribulation overwhelms the cultivator", self.target_tier)
        };
        let result = TribulationResult {
            success,
            failure_probability: self.failure_probability,
            roll: Some(roll),
            hp_loss,
            description,
        };
        self.finish(result);
        Ok(self.result.as_ref().expect("just resolved"))
    }

    fn resolve_forced_failure(&mut self) {
        let result = TribulationResult {
            success: false,
            failure_probability: self.failure_probability,
            roll: None,
            hp_loss: None,
            description: format!("{} trial attempts exhausted", self.target_tier),
        };
        self.finish(result);
    }

    fn finish(&mut self, result: TribulationResult) {
        self.phase = SessionPhase::Resolved;
        self.emit(SessionEventKind::Resolved {
            result: result.clone(),
        });
        self.result = Some(result);
    }
}
