//! Structured session events consumed by the presentation layer.
//!
//! The tribulation session emits these alongside journal log keys; the
//! `kind` remains a mechanical descriptor and never feeds back into
//! resolution math.

use serde::{Deserialize, Serialize};

use crate::trial::Challenge;
use crate::tribulation::TribulationResult;

/// Stable, deterministic identifier for a single session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Per-session sequence number (0-based) within the emitted stream.
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(seq: u16) -> Self {
        Self { seq }
    }
}

/// Mechanical event kind emitted by a tribulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// A trial challenge was issued for the puzzle phase.
    ChallengeIssued { challenge: Challenge },
    /// A consuming attempt missed; the budget shrank.
    AttemptMissed { attempts_remaining: u32 },
    /// The puzzle phase ended in a solve.
    TrialSolved,
    /// The one-time hint was served.
    HintServed { text: String },
    /// A narrative stage began.
    StageEntered { index: usize, label: String },
    /// The session reached its terminal result.
    Resolved { result: TribulationResult },
}

/// Structured event emitted by a tribulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub id: EventId,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    #[must_use]
    pub const fn new(seq: u16, kind: SessionEventKind) -> Self {
        Self {
            id: EventId::new(seq),
            kind,
        }
    }
}
