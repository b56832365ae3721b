//! Deterministic headless simulation of a cultivator's full ascension.

use jadepath_game::{
    Attempt, BreakthroughError, BreakthroughOutcome, Challenge, Character, ContentLibrary,
    NullFlavor, Orchestrator, RealmCatalog, SourceKind, SourceRef,
};

/// How the simulated player answers trial puzzles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPolicy {
    /// Reads the withheld solution and answers correctly first try.
    Oracle,
    /// Always submits a wrong answer, exercising the exhaustion path.
    Clumsy,
}

/// Configuration for one simulated ascension run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub policy: SolverPolicy,
    /// Breakthrough attempts before the run is abandoned.
    pub max_attempts: u32,
    /// Inheritance charges granted at the start, spent on chained level-ups.
    pub starting_charges: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(seed: u64, policy: SolverPolicy) -> Self {
        Self {
            seed,
            policy,
            max_attempts: 50_000,
            starting_charges: 3,
        }
    }
}

/// Aggregate telemetry from one simulated run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunSummary {
    pub final_realm: usize,
    pub final_level: u8,
    pub breakthrough_attempts: u32,
    pub advances: u32,
    pub backlashes: u32,
    pub tribulations_won: u32,
    pub tribulations_lost: u32,
    pub trials_solved: u32,
    pub trials_exhausted: u32,
    pub chain_steps: u32,
    pub reached_catalog_end: bool,
}

/// Drive one character from the first realm as far as the attempt budget
/// allows, attempting a breakthrough whenever experience suffices.
pub fn run_ascension(config: SimulationConfig) -> anyhow::Result<RunSummary> {
    let catalog = RealmCatalog::default();
    let library = ContentLibrary::sample();
    let mut character = Character::new("simulated", &catalog, &library);
    character.inheritance_charges = config.starting_charges;
    character
        .source_refs
        .push(SourceRef::new(SourceKind::CultivationArt, "flowing-river-sutra"));
    character.recompute_stats(&catalog, &library);
    let mut orchestrator = Orchestrator::new(catalog, library, config.seed)?;

    let mut summary = RunSummary::default();

    // Spend the granted charges up front, like a player burning an
    // inheritance windfall.
    let chain = orchestrator.attempt_chained_breakthrough(&mut character, config.starting_charges)?;
    summary.chain_steps = chain.steps;

    for _ in 0..config.max_attempts {
        let realm = orchestrator
            .catalog()
            .get(character.realm)
            .expect("character realm in catalog");
        let requirement = realm.exp_required(character.level);
        if character.experience < requirement {
            // Stand in for the out-of-scope grind loop.
            character.experience += requirement / 4 + 1;
            continue;
        }

        summary.breakthrough_attempts += 1;
        match orchestrator.attempt_breakthrough(&mut character, &NullFlavor) {
            Ok(BreakthroughOutcome::Advanced(_)) => summary.advances += 1,
            Ok(BreakthroughOutcome::Backlash(_)) => summary.backlashes += 1,
            Ok(BreakthroughOutcome::TribulationStarted) => {
                drive_session(&mut orchestrator, config.policy, &mut summary);
                let report = orchestrator.resolve_tribulation(&mut character)?;
                if report.result.success {
                    summary.tribulations_won += 1;
                } else {
                    summary.tribulations_lost += 1;
                }
            }
            Err(BreakthroughError::AtFinalTier) => {
                summary.reached_catalog_end = true;
                break;
            }
            Err(error) => return Err(error.into()),
        }
    }

    summary.final_realm = character.realm;
    summary.final_level = character.level;
    Ok(summary)
}

fn drive_session(
    orchestrator: &mut Orchestrator,
    policy: SolverPolicy,
    summary: &mut RunSummary,
) {
    loop {
        let Some(session) = orchestrator.session() else {
            return;
        };
        if session.is_resolved() {
            return;
        }
        let Some(challenge) = session.challenge().cloned() else {
            break;
        };
        let attempt = match (policy, &challenge) {
            (SolverPolicy::Oracle, Challenge::NumberSequence { solution, .. }) => Attempt::Number {
                value: *solution,
            },
            (SolverPolicy::Oracle, Challenge::RuneSequence { target, .. }) => Attempt::Runes {
                sequence: target.to_vec(),
            },
            (SolverPolicy::Clumsy, Challenge::NumberSequence { .. }) => {
                Attempt::Number { value: i64::MIN }
            }
            (SolverPolicy::Clumsy, Challenge::RuneSequence { start, .. }) => Attempt::Runes {
                sequence: start.to_vec(),
            },
        };
        match orchestrator.submit_trial_attempt(&attempt) {
            Ok(evaluation) if evaluation.solved => {
                summary.trials_solved += 1;
                break;
            }
            Ok(_) => {
                if orchestrator
                    .session()
                    .is_some_and(jadepath_game::TribulationSession::is_resolved)
                {
                    summary.trials_exhausted += 1;
                    return;
                }
            }
            Err(_) => return,
        }
    }
    while orchestrator.advance_stage().unwrap_or(false) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_run_reaches_the_catalog_end() {
        let summary = run_ascension(SimulationConfig::new(1337, SolverPolicy::Oracle)).unwrap();
        assert!(summary.reached_catalog_end);
        assert_eq!(summary.trials_exhausted, 0);
        assert!(summary.advances > 0);
        assert_eq!(summary.chain_steps, 3);
    }

    #[test]
    fn clumsy_run_exhausts_trials_but_never_errors() {
        let summary = run_ascension(SimulationConfig::new(4242, SolverPolicy::Clumsy)).unwrap();
        assert!(summary.breakthrough_attempts > 0);
        // A clumsy player can still climb gates without trials, but every
        // trial-bearing gate ends in exhaustion.
        assert_eq!(summary.trials_solved, 0);
    }
}
