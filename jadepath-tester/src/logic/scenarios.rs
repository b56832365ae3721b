//! Named QA scenarios over the engine, run in bulk per seed.

use std::time::{Duration, Instant};

use jadepath_game::{
    BonusBreakdown, Challenge, ChallengeKind, StatBundle, TribulationSession, generate_challenge,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::logic::simulation::{SimulationConfig, SolverPolicy, run_ascension};

/// Result of running one scenario across its iterations.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub average_duration: Duration,
}

/// All scenario names accepted by the CLI.
pub const SCENARIOS: [&str; 4] = ["ascension", "trials", "resolution", "chained"];

#[derive(Debug, thiserror::Error)]
#[error("unknown scenario '{0}'")]
pub struct UnknownScenario(String);

/// Dispatch a scenario by name.
pub fn run_scenario(name: &str, seeds: &[u64], iterations: usize) -> anyhow::Result<ScenarioResult> {
    log::debug!("running scenario {name} over {} seed(s)", seeds.len());
    match name {
        "ascension" => Ok(run_ascension_scenario(seeds, iterations)),
        "trials" => Ok(run_trials_scenario(seeds, iterations)),
        "resolution" => Ok(run_resolution_scenario(seeds)),
        "chained" => Ok(run_chained_scenario(seeds)),
        other => Err(UnknownScenario(String::from(other)).into()),
    }
}

fn finish(
    name: &str,
    iterations_run: usize,
    failures: Vec<String>,
    elapsed: Duration,
) -> ScenarioResult {
    if !failures.is_empty() {
        log::warn!("scenario {name}: {} failure(s)", failures.len());
    }
    let successful_iterations = iterations_run.saturating_sub(failures.len());
    let average_duration = if iterations_run == 0 {
        Duration::ZERO
    } else {
        elapsed / u32::try_from(iterations_run).unwrap_or(1)
    };
    ScenarioResult {
        scenario_name: String::from(name),
        passed: failures.is_empty(),
        iterations_run,
        successful_iterations,
        failures,
        average_duration,
    }
}

/// Full-climb simulation: an oracle player must reach the catalog's end; a
/// clumsy player must never hit an engine error.
fn run_ascension_scenario(seeds: &[u64], iterations: usize) -> ScenarioResult {
    let start = Instant::now();
    let mut failures = Vec::new();
    let mut run = 0usize;
    for &seed in seeds {
        for iteration in 0..iterations {
            run += 2;
            let oracle_seed = seed.wrapping_add(iteration as u64);
            match run_ascension(SimulationConfig::new(oracle_seed, SolverPolicy::Oracle)) {
                Ok(summary) if summary.reached_catalog_end => {}
                Ok(summary) => failures.push(format!(
                    "seed {oracle_seed}: oracle stalled at realm {} level {}",
                    summary.final_realm, summary.final_level
                )),
                Err(error) => failures.push(format!("seed {oracle_seed}: {error}")),
            }
            match run_ascension(SimulationConfig::new(oracle_seed, SolverPolicy::Clumsy)) {
                Ok(summary) => {
                    if summary.trials_solved != 0 {
                        failures.push(format!("seed {oracle_seed}: clumsy player solved a trial"));
                    }
                }
                Err(error) => failures.push(format!("seed {oracle_seed} (clumsy): {error}")),
            }
        }
    }
    finish("ascension", run, failures, start.elapsed())
}

/// Bulk generation validity: stated patterns must predict their solutions
/// and rune scrambles must stay permutations.
fn run_trials_scenario(seeds: &[u64], iterations: usize) -> ScenarioResult {
    let start = Instant::now();
    let mut failures = Vec::new();
    let mut run = 0usize;
    for &seed in seeds {
        let mut rng = SmallRng::seed_from_u64(seed);
        for iteration in 0..iterations.max(100) {
            run += 1;
            let difficulty = (iteration % 6) as f32;
            let challenge = generate_challenge(ChallengeKind::NumberSequence, difficulty, &mut rng);
            if let Challenge::NumberSequence {
                visible,
                solution,
                pattern,
                ..
            } = &challenge
            {
                let predicted = pattern.term(5);
                if *solution != predicted {
                    failures.push(format!(
                        "seed {seed}: pattern {pattern:?} predicts {predicted}, stored {solution}"
                    ));
                }
                if visible.len() != 5 {
                    failures.push(format!("seed {seed}: {} visible terms", visible.len()));
                }
            }

            let ratio = (iteration % 11) as f32 / 10.0;
            let runes = generate_challenge(ChallengeKind::RuneSequence, ratio, &mut rng);
            if let Challenge::RuneSequence { start: s, target, .. } = &runes {
                let mut counts = [0i32; 8];
                for rune in s {
                    counts[*rune as usize] += 1;
                }
                for rune in target {
                    counts[*rune as usize] -= 1;
                }
                if counts.iter().any(|count| *count != 0) {
                    failures.push(format!("seed {seed}: rune start is not a permutation"));
                }
            }
        }
    }
    finish("trials", run, failures, start.elapsed())
}

/// Statistical resolution sweep: observed success rate at failure
/// probability 0.3 must stay within one percent of 0.70.
fn run_resolution_scenario(seeds: &[u64]) -> ScenarioResult {
    const SAMPLE: u32 = 100_000;
    const TOLERANCE: f64 = 0.01;

    let start = Instant::now();
    let mut failures = Vec::new();
    for &seed in seeds {
        let mut resolve_rng = SmallRng::seed_from_u64(seed);
        let mut vitality_rng = SmallRng::seed_from_u64(seed ^ 0xA5A5);
        let mut successes = 0u32;
        for _ in 0..SAMPLE {
            let mut session = TribulationSession::new(
                "sweep",
                0.3,
                StatBundle {
                    max_hp: 1_000,
                    ..StatBundle::default()
                },
                BonusBreakdown::default(),
                None,
            );
            let _ = session.begin();
            while let Ok(Some(_)) = session.advance_stage() {}
            if let Ok(result) = session.resolve(&mut resolve_rng, &mut vitality_rng) {
                if result.success {
                    successes += 1;
                }
            }
        }
        let observed = f64::from(successes) / f64::from(SAMPLE);
        if (observed - 0.70).abs() > TOLERANCE {
            failures.push(format!("seed {seed}: observed success rate {observed:.4}"));
        }
    }
    finish("resolution", seeds.len(), failures, start.elapsed())
}

/// Chained advancement sweep: charges and the realm ceiling must bound
/// every chain, and charges never go negative.
fn run_chained_scenario(seeds: &[u64]) -> ScenarioResult {
    use jadepath_game::{Character, ContentLibrary, Orchestrator, RealmCatalog};

    let start = Instant::now();
    let mut failures = Vec::new();
    let mut run = 0usize;
    for &seed in seeds {
        for charges in [0u32, 1, 3, 10, 100] {
            run += 1;
            let catalog = RealmCatalog::default();
            let library = ContentLibrary::sample();
            let mut character = Character::new("chained", &catalog, &library);
            character.inheritance_charges = charges;
            let Ok(mut orchestrator) = Orchestrator::new(catalog, library, seed) else {
                failures.push(format!("seed {seed}: catalog rejected"));
                continue;
            };
            match orchestrator.attempt_chained_breakthrough(&mut character, 50) {
                Ok(outcome) => {
                    if character.level > 9 {
                        failures.push(format!("seed {seed}: chain exceeded the ceiling"));
                    }
                    if outcome.charges_spent > charges {
                        failures.push(format!("seed {seed}: charges went negative"));
                    }
                }
                Err(error) => failures.push(format!("seed {seed}: {error}")),
            }
        }
    }
    finish("chained", run, failures, start.elapsed())
}
