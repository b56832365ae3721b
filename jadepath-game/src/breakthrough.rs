//! Breakthrough orchestrator: the top-level progression entry point.
//!
//! Ordinary level-ups (and realm transitions into ungated realms) resolve
//! with a flat chance and no session. Tribulation-gated realms spin up a
//! full session, optionally with a trial puzzle, and apply every character
//! mutation atomically when the session resolves. At most one session may
//! be active at a time; abandonment before resolution leaves the character
//! unmutated.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::Character;
use crate::constants::{
    BACKLASH_EXP_PCT, BACKLASH_HP_PCT, HP_FLOOR, LOG_BREAKTHROUGH_BACKLASH,
    LOG_BREAKTHROUGH_SUCCESS, LOG_CHAIN_STEP, LOG_FLAVOR_UNAVAILABLE, LOG_REALM_ASCENDED,
    LOG_TRIAL_EXHAUSTED, LOG_TRIAL_SOLVED, LOG_TRIBULATION_FAILURE, LOG_TRIBULATION_SUCCESS,
};
use crate::content::ContentLibrary;
use crate::event::SessionEvent;
use crate::narrative::FlavorText;
use crate::numbers::{pct_of_i64, usize_to_f32};
use crate::realms::{CatalogError, RealmCatalog};
use crate::rng::RngBundle;
use crate::stats::{StatBundle, aggregate_breakdown};
use crate::trial::{Attempt, ChallengeKind, Evaluation, generate_challenge};
use crate::tribulation::{SessionError, TribulationResult, TribulationSession};

use rand::Rng;

/// Orchestrator-level failures.
#[derive(Debug, Error, PartialEq)]
pub enum BreakthroughError {
    #[error("a tribulation session is already active")]
    SessionActive,
    #[error("no tribulation session is active")]
    NoSession,
    #[error("experience {have} is below the requirement {needed}")]
    ExperienceShort { needed: i64, have: i64 },
    #[error("already at the final tier of the catalog")]
    AtFinalTier,
    #[error("realm index {0} is not in the catalog")]
    UnknownRealm(usize),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Report of a completed single-tier advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceReport {
    pub tier_label: String,
    pub realm: usize,
    pub level: u8,
    /// Experience carried past the prior tier's requirement, exactly.
    pub carried_exp: i64,
    pub stats: StatBundle,
    pub description: String,
}

/// Report of an ordinary failed breakthrough's backlash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklashReport {
    pub exp_lost: i64,
    pub hp_lost: i64,
}

/// Outcome of a single breakthrough attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BreakthroughOutcome {
    /// The tier-up applied immediately (ordinary path).
    Advanced(AdvanceReport),
    /// The attempt failed; the lesser backlash applied.
    Backlash(BacklashReport),
    /// A tribulation session is now active and must be driven to
    /// resolution through the orchestrator.
    TribulationStarted,
}

/// Terminal report handed back when an active tribulation resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct TribulationReport {
    pub result: TribulationResult,
    /// Undrained presentation events from the session.
    pub events: Vec<SessionEvent>,
    /// Present when the resolution advanced the character.
    pub advance: Option<AdvanceReport>,
}

/// Outcome of a chained, guaranteed-success advancement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub steps: u32,
    pub charges_spent: u32,
    pub final_level: u8,
    pub stats: StatBundle,
}

struct ActiveTribulation {
    session: TribulationSession,
    target_realm: usize,
    requirement: i64,
}

/// Top-level breakthrough driver. Holds the content tables, the seeded RNG
/// bundle, and the single allowed active session.
pub struct Orchestrator {
    catalog: RealmCatalog,
    library: ContentLibrary,
    rng: Rc<RngBundle>,
    active: Option<ActiveTribulation>,
}

impl Orchestrator {
    /// Build an orchestrator over validated content.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the realm catalog violates its bounds.
    pub fn new(
        catalog: RealmCatalog,
        library: ContentLibrary,
        seed: u64,
    ) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self {
            catalog,
            library,
            rng: Rc::new(RngBundle::from_user_seed(seed)),
            active: None,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &RealmCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn library(&self) -> &ContentLibrary {
        &self.library
    }

    /// The active session, if a tribulation is in flight.
    #[must_use]
    pub fn session(&self) -> Option<&TribulationSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    #[must_use]
    pub const fn has_active_session(&self) -> bool {
        self.active.is_some()
    }

    /// Abandon the active session before resolution. The character record
    /// is untouched; the attempt simply never happened.
    pub fn abandon_session(&mut self) -> Option<TribulationSession> {
        self.active.take().map(|active| active.session)
    }

    /// Drain pending presentation events from the active session.
    pub fn drain_session_events(&mut self) -> Vec<SessionEvent> {
        self.active
            .as_mut()
            .map(|active| active.session.drain_events())
            .unwrap_or_default()
    }

    /// Serve the active trial's penalty-free hint.
    pub fn request_hint(&mut self) -> Option<String> {
        self.active
            .as_mut()
            .and_then(|active| active.session.request_hint())
    }

    /// Forward one puzzle attempt to the active session. A miss that
    /// exhausts the budget leaves the session resolved as a failure;
    /// `resolve_tribulation` then applies the consequences.
    ///
    /// # Errors
    ///
    /// Returns `BreakthroughError::NoSession` without an active session,
    /// or the session's own phase/attempt errors.
    pub fn submit_trial_attempt(
        &mut self,
        attempt: &Attempt,
    ) -> Result<Evaluation, BreakthroughError> {
        let active = self.active.as_mut().ok_or(BreakthroughError::NoSession)?;
        Ok(active.session.submit_attempt(attempt)?)
    }

    /// Step the active session's narrative stage script.
    ///
    /// # Errors
    ///
    /// Returns `BreakthroughError::NoSession` without an active session,
    /// or `SessionError::WrongPhase` outside narrative staging.
    pub fn advance_stage(&mut self) -> Result<bool, BreakthroughError> {
        let active = self.active.as_mut().ok_or(BreakthroughError::NoSession)?;
        Ok(active.session.advance_stage()?.is_some())
    }

    /// Attempt a single-tier breakthrough.
    ///
    /// # Errors
    ///
    /// Rejected while a session is active, below the experience
    /// requirement, or at the catalog's final tier.
    pub fn attempt_breakthrough<F: FlavorText>(
        &mut self,
        character: &mut Character,
        flavor: &F,
    ) -> Result<BreakthroughOutcome, BreakthroughError> {
        if self.active.is_some() {
            return Err(BreakthroughError::SessionActive);
        }
        let realm = self
            .catalog
            .get(character.realm)
            .ok_or(BreakthroughError::UnknownRealm(character.realm))?;
        let requirement = realm.exp_required(character.level);
        if character.experience < requirement {
            return Err(BreakthroughError::ExperienceShort {
                needed: requirement,
                have: character.experience,
            });
        }

        if character.is_at_realm_ceiling() {
            if self.catalog.is_final(character.realm) {
                return Err(BreakthroughError::AtFinalTier);
            }
            let target_realm = character.realm + 1;
            let next = self
                .catalog
                .get(target_realm)
                .ok_or(BreakthroughError::UnknownRealm(target_realm))?;
            if let Some(gate) = next.gate.clone() {
                self.begin_tribulation(character, target_realm, requirement, &gate);
                return Ok(BreakthroughOutcome::TribulationStarted);
            }
            let chance = next.level_up_chance;
            return Ok(self.resolve_ordinary(
                character,
                (target_realm, 1),
                requirement,
                chance,
                flavor,
            ));
        }

        let chance = realm.level_up_chance;
        let target = (character.realm, character.level + 1);
        Ok(self.resolve_ordinary(character, target, requirement, chance, flavor))
    }

    /// Resolve the active tribulation and apply its consequences.
    ///
    /// All character mutations happen here, atomically: advancement with
    /// carry-forward experience and a full heal (minus the rolled HP loss)
    /// on success, the backlash penalty on failure. The session is
    /// discarded either way.
    ///
    /// # Errors
    ///
    /// Returns `BreakthroughError::NoSession` without an active session,
    /// or `SessionError::WrongPhase` before staging has finished.
    pub fn resolve_tribulation(
        &mut self,
        character: &mut Character,
    ) -> Result<TribulationReport, BreakthroughError> {
        let active = self.active.as_mut().ok_or(BreakthroughError::NoSession)?;
        if !active.session.is_resolved() {
            let rng = Rc::clone(&self.rng);
            let outcome = active
                .session
                .resolve(&mut *rng.resolve(), &mut *rng.vitality());
            if let Err(error) = outcome {
                return Err(BreakthroughError::Session(error));
            }
        }

        let mut active = self.active.take().expect("checked above");
        let events = active.session.drain_events();
        let result = active
            .session
            .result()
            .cloned()
            .expect("resolved session has a result");

        let advance = if result.success {
            if active.session.challenge().is_some() {
                character.push_log(LOG_TRIAL_SOLVED);
            }
            let report = self.apply_advance(character, (active.target_realm, 1), active.requirement);
            character.push_log(LOG_TRIBULATION_SUCCESS);
            if let Some(hp_loss) = result.hp_loss {
                character.hp = (character.hp - hp_loss).max(HP_FLOOR);
            }
            Some(report)
        } else {
            if result.roll.is_none() {
                character.push_log(LOG_TRIAL_EXHAUSTED);
            }
            self.apply_backlash(character, active.requirement);
            character.push_log(LOG_TRIBULATION_FAILURE);
            None
        };

        Ok(TribulationReport {
            result,
            events,
            advance,
        })
    }

    /// Perform up to `max_chain` guaranteed-success level-ups, consuming
    /// one inheritance charge per step. Stops at the realm ceiling, at
    /// charge exhaustion, or at the cap, whichever comes first.
    ///
    /// # Errors
    ///
    /// Rejected while a tribulation session is active.
    pub fn attempt_chained_breakthrough(
        &mut self,
        character: &mut Character,
        max_chain: u32,
    ) -> Result<ChainOutcome, BreakthroughError> {
        if self.active.is_some() {
            return Err(BreakthroughError::SessionActive);
        }
        let mut steps = 0u32;
        while steps < max_chain
            && !character.is_at_realm_ceiling()
            && character.inheritance_charges > 0
        {
            character.inheritance_charges -= 1;
            character.level += 1;
            character.recompute_stats(&self.catalog, &self.library);
            character.full_heal();
            character.push_log(LOG_CHAIN_STEP);
            steps += 1;
        }
        Ok(ChainOutcome {
            steps,
            charges_spent: steps,
            final_level: character.level,
            stats: character.stats,
        })
    }

    fn begin_tribulation(
        &mut self,
        character: &Character,
        target_realm: usize,
        requirement: i64,
        gate: &crate::realms::TribulationGate,
    ) {
        let challenge = gate.trial.map(|kind| {
            let difficulty = self.trial_difficulty(character, target_realm, kind);
            generate_challenge(kind, difficulty, &mut *self.rng.trial())
        });
        let breakdown = {
            let base = self
                .catalog
                .get(character.realm)
                .map(|realm| realm.base_for_level(character.level))
                .unwrap_or_default();
            let sources = self.library.resolve(&character.source_refs);
            aggregate_breakdown(&base, &sources)
        };
        let target_label = self
            .catalog
            .get(target_realm)
            .map_or_else(|| String::from("Unknown"), |realm| format!("{} 1", realm.name));
        let mut session = TribulationSession::new(
            &target_label,
            gate.failure_probability,
            character.stats,
            breakdown,
            challenge,
        );
        session.begin().expect("fresh session begins cleanly");
        self.active = Some(ActiveTribulation {
            session,
            target_realm,
            requirement,
        });
    }

    fn resolve_ordinary<F: FlavorText>(
        &mut self,
        character: &mut Character,
        target: (usize, u8),
        requirement: i64,
        chance: f32,
        flavor: &F,
    ) -> BreakthroughOutcome {
        let draw: f32 = self.rng.resolve().r#gen();
        if draw < chance {
            let mut report = self.apply_advance(character, target, requirement);
            match flavor.breakthrough_text(&report.tier_label) {
                Ok(text) => report.description = text,
                Err(_) => character.push_log(LOG_FLAVOR_UNAVAILABLE),
            }
            BreakthroughOutcome::Advanced(report)
        } else {
            BreakthroughOutcome::Backlash(self.apply_backlash(character, requirement))
        }
    }

    fn apply_advance(
        &self,
        character: &mut Character,
        target: (usize, u8),
        requirement: i64,
    ) -> AdvanceReport {
        let realm_changed = target.0 != character.realm;
        character.experience -= requirement;
        character.realm = target.0;
        character.level = target.1;
        character.recompute_stats(&self.catalog, &self.library);
        character.full_heal();
        character.push_log(LOG_BREAKTHROUGH_SUCCESS);
        if realm_changed {
            character.push_log(LOG_REALM_ASCENDED);
        }
        let tier_label = character.tier_label(&self.catalog);
        AdvanceReport {
            description: format!("{tier_label} attained"),
            tier_label,
            realm: character.realm,
            level: character.level,
            carried_exp: character.experience,
            stats: character.stats,
        }
    }

    fn apply_backlash(&self, character: &mut Character, requirement: i64) -> BacklashReport {
        let exp_lost = pct_of_i64(requirement, BACKLASH_EXP_PCT).min(character.experience);
        let hp_lost = pct_of_i64(character.hp, BACKLASH_HP_PCT);
        character.experience -= exp_lost;
        character.hp = (character.hp - hp_lost).max(HP_FLOOR);
        character.push_log(LOG_BREAKTHROUGH_BACKLASH);
        BacklashReport { exp_lost, hp_lost }
    }

    fn trial_difficulty(
        &self,
        character: &Character,
        target_realm: usize,
        kind: ChallengeKind,
    ) -> f32 {
        let arts = self.library.arts_known(&character.source_refs);
        let score = usize_to_f32(target_realm) + usize_to_f32(arts) * 0.5;
        match kind {
            ChallengeKind::NumberSequence => score,
            // Rune difficulty is a 0-1 ratio over the catalog span.
            ChallengeKind::RuneSequence => {
                (score / usize_to_f32(self.catalog.realms.len())).clamp(0.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::NullFlavor;
    use crate::stats::SourceKind;
    use crate::content::SourceRef;

    fn fixture() -> (Orchestrator, Character) {
        let catalog = RealmCatalog::default();
        let library = ContentLibrary::sample();
        let character = Character::new("Lin Feng", &catalog, &library);
        let orchestrator = Orchestrator::new(catalog, library, 0xBEEF).unwrap();
        (orchestrator, character)
    }

    #[test]
    fn experience_gate_rejects_premature_attempts() {
        let (mut orchestrator, mut character) = fixture();
        character.experience = 0;
        let error = orchestrator.attempt_breakthrough(&mut character, &NullFlavor);
        assert_eq!(
            error,
            Err(BreakthroughError::ExperienceShort {
                needed: 100,
                have: 0,
            })
        );
    }

    #[test]
    fn ordinary_attempt_advances_or_backlashes() {
        let (mut orchestrator, mut character) = fixture();
        character.experience = 150;
        let before_level = character.level;
        let outcome = orchestrator
            .attempt_breakthrough(&mut character, &NullFlavor)
            .unwrap();
        match outcome {
            BreakthroughOutcome::Advanced(report) => {
                assert_eq!(report.level, before_level + 1);
                assert_eq!(report.carried_exp, 50);
                assert_eq!(character.hp, character.stats.max_hp);
            }
            BreakthroughOutcome::Backlash(report) => {
                assert!(report.exp_lost > 0);
                assert_eq!(character.experience, 150 - report.exp_lost);
            }
            BreakthroughOutcome::TribulationStarted => panic!("no gate at level 1"),
        }
    }

    #[test]
    fn realm_ceiling_starts_a_tribulation() {
        let (mut orchestrator, mut character) = fixture();
        character.level = 9;
        character.experience = 1_000_000;
        let snapshot = character.clone();
        let outcome = orchestrator
            .attempt_breakthrough(&mut character, &NullFlavor)
            .unwrap();
        assert_eq!(outcome, BreakthroughOutcome::TribulationStarted);
        assert!(orchestrator.has_active_session());
        // No mutation before resolution.
        assert_eq!(character, snapshot);

        let second = orchestrator.attempt_breakthrough(&mut character, &NullFlavor);
        assert_eq!(second, Err(BreakthroughError::SessionActive));
        assert!(orchestrator.has_active_session());
    }

    #[test]
    fn abandonment_leaves_character_unmutated() {
        let (mut orchestrator, mut character) = fixture();
        character.level = 9;
        character.experience = 1_000_000;
        let snapshot = character.clone();
        let _ = orchestrator
            .attempt_breakthrough(&mut character, &NullFlavor)
            .unwrap();
        let abandoned = orchestrator.abandon_session();
        assert!(abandoned.is_some());
        assert!(!orchestrator.has_active_session());
        assert_eq!(character, snapshot);
    }

    #[test]
    fn chained_advancement_respects_every_bound() {
        let (mut orchestrator, mut character) = fixture();
        character.level = 5;
        character.inheritance_charges = 2;
        let outcome = orchestrator
            .attempt_chained_breakthrough(&mut character, 10)
            .unwrap();
        assert_eq!(outcome.steps, 2);
        assert_eq!(character.level, 7);
        assert_eq!(character.inheritance_charges, 0);

        // No charges left: the chain is a no-op.
        let empty = orchestrator
            .attempt_chained_breakthrough(&mut character, 10)
            .unwrap();
        assert_eq!(empty.steps, 0);

        character.inheritance_charges = 50;
        let capped = orchestrator
            .attempt_chained_breakthrough(&mut character, 50)
            .unwrap();
        assert_eq!(character.level, 9);
        assert_eq!(capped.steps, 2);
        assert_eq!(character.inheritance_charges, 48);
    }

    #[test]
    fn trial_difficulty_scales_with_arts() {
        let (orchestrator, mut character) = fixture();
        let bare = orchestrator.trial_difficulty(&character, 2, ChallengeKind::NumberSequence);
        character.source_refs.push(SourceRef::new(
            SourceKind::CultivationArt,
            "flowing-river-sutra",
        ));
        character.source_refs.push(SourceRef::new(
            SourceKind::CultivationArt,
            "mountain-shaking-fist",
        ));
        let learned = orchestrator.trial_difficulty(&character, 2, ChallengeKind::NumberSequence);
        assert!(learned > bare);

        let ratio = orchestrator.trial_difficulty(&character, 2, ChallengeKind::RuneSequence);
        assert!((0.0..=1.0).contains(&ratio));
    }
}
