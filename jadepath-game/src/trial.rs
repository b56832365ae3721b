//! Procedural trial challenges and their evaluation.
//!
//! Two closed challenge kinds exist: hidden-term number sequences and
//! rune rearrangement puzzles. Difficulty always arrives from the
//! orchestrator; this module only shapes it into concrete content.
//! Every generated challenge carries a human-readable classification so
//! the presentation layer can serve a penalty-free hint.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    NUMBER_SEQUENCE_VISIBLE_TERMS, RUNE_ALPHABET_SIZE, RUNE_TARGET_LEN_MAX, RUNE_TARGET_LEN_MIN,
};

/// First primes, enough for every offset the generator can request.
const PRIMES: [i64; 20] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
];

/// Challenge family, referenced by realm gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    NumberSequence,
    RuneSequence,
}

/// The eight trigram runes used by rearrangement trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuneSymbol {
    Qian,
    Dui,
    Li,
    Zhen,
    Xun,
    Kan,
    Gen,
    Kun,
}

impl RuneSymbol {
    pub const ALL: [Self; RUNE_ALPHABET_SIZE] = [
        Self::Qian,
        Self::Dui,
        Self::Li,
        Self::Zhen,
        Self::Xun,
        Self::Kan,
        Self::Gen,
        Self::Kun,
    ];

    /// Trigram glyph for presentation.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Qian => '\u{2630}',
            Self::Dui => '\u{2631}',
            Self::Li => '\u{2632}',
            Self::Zhen => '\u{2633}',
            Self::Xun => '\u{2634}',
            Self::Kan => '\u{2635}',
            Self::Gen => '\u{2636}',
            Self::Kun => '\u{2637}',
        }
    }
}

/// Rune sequences stay inline at the maximum trial length.
pub type RuneSeq = SmallVec<[RuneSymbol; RUNE_TARGET_LEN_MAX]>;

/// Mechanical truth behind a number-sequence trial. Generation and the
/// withheld solution both derive from `term`, so the stated pattern can
/// never disagree with the expected answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum SequencePattern {
    Arithmetic { start: i64, step: i64 },
    Geometric { start: i64, ratio: i64 },
    QuadraticStep { start: i64, scale: i64 },
    DipThenRise { start: i64, fall: i64, rise: i64 },
    Squares { offset: i64 },
    LinearRecurrence { first: i64, second: i64, mul_prev: i64, mul_prev2: i64 },
    AlternatingMulAdd { start: i64, mul: i64, add: i64 },
    Primes { offset: usize },
    Cubes { offset: i64 },
}

impl SequencePattern {
    /// The `index`-th term (0-based) of the sequence this pattern defines.
    #[must_use]
    pub fn term(&self, index: usize) -> i64 {
        let i = i64::try_from(index).unwrap_or(0);
        match *self {
            Self::Arithmetic { start, step } => start + step * i,
            Self::Geometric { start, ratio } => {
                start * ratio.pow(u32::try_from(index).unwrap_or(0))
            }
            Self::QuadraticStep { start, scale } => {
                // Step k of the walk adds scale * k^2.
                let sum_sq = i * (i + 1) * (2 * i + 1) / 6;
                start + scale * sum_sq
            }
            Self::DipThenRise { start, fall, rise } => {
                if i <= 2 {
                    start - fall * i
                } else {
                    start - fall * 2 + rise * (i - 2)
                }
            }
            Self::Squares { offset } => {
                let n = offset + i + 1;
                n * n
            }
            Self::LinearRecurrence {
                first,
                second,
                mul_prev,
                mul_prev2,
            } => {
                if index == 0 {
                    return first;
                }
                let (mut prev2, mut prev) = (first, second);
                for _ in 1..index {
                    let next = mul_prev * prev + mul_prev2 * prev2;
                    prev2 = prev;
                    prev = next;
                }
                prev
            }
            Self::AlternatingMulAdd { start, mul, add } => {
                let mut value = start;
                for step in 0..index {
                    if step % 2 == 0 {
                        value *= mul;
                    } else {
                        value += add;
                    }
                }
                value
            }
            Self::Primes { offset } => PRIMES[offset + index],
            Self::Cubes { offset } => {
                let n = offset + i + 1;
                n * n * n
            }
        }
    }

    /// Human-readable pattern classification for the hint surface.
    #[must_use]
    pub const fn classification(&self) -> &'static str {
        match self {
            Self::Arithmetic { .. } => "arithmetic progression with a constant step",
            Self::Geometric { .. } => "geometric progression with a constant ratio",
            Self::QuadraticStep { .. } => "steps that grow quadratically",
            Self::DipThenRise { .. } => "a descent that turns into a climb",
            Self::Squares { .. } => "consecutive perfect squares",
            Self::LinearRecurrence { .. } => "each term combines the previous two",
            Self::AlternatingMulAdd { .. } => "alternating multiplication and addition",
            Self::Primes { .. } => "consecutive prime numbers",
            Self::Cubes { .. } => "consecutive perfect cubes",
        }
    }
}

/// A generated trial challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Challenge {
    NumberSequence {
        visible: Vec<i64>,
        solution: i64,
        pattern: SequencePattern,
        difficulty: f32,
        max_attempts: u32,
    },
    RuneSequence {
        start: RuneSeq,
        target: RuneSeq,
        max_attempts: u32,
    },
}

impl Challenge {
    #[must_use]
    pub const fn kind(&self) -> ChallengeKind {
        match self {
            Self::NumberSequence { .. } => ChallengeKind::NumberSequence,
            Self::RuneSequence { .. } => ChallengeKind::RuneSequence,
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        match self {
            Self::NumberSequence { max_attempts, .. } | Self::RuneSequence { max_attempts, .. } => {
                *max_attempts
            }
        }
    }

    /// One-time, penalty-free hint text.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::NumberSequence { pattern, .. } => {
                format!("The sequence follows {}.", pattern.classification())
            }
            Self::RuneSequence { target, .. } => {
                let glyphs: String = target.iter().map(|rune| rune.glyph()).collect();
                format!("Swap runes until the array reads {glyphs}.")
            }
        }
    }
}

/// A proposed solution, submitted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attempt {
    Number { value: i64 },
    Runes { sequence: Vec<RuneSymbol> },
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub solved: bool,
    pub attempts_remaining: u32,
}

/// Trial evaluation failures. Malformed submissions never consume attempts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrialError {
    #[error("invalid attempt: {reason}")]
    InvalidAttempt { reason: &'static str },
}

/// Generate a challenge of `kind` at the supplied difficulty.
///
/// Number-sequence difficulty is an open-ended score whose floor selects the
/// pattern band; rune-sequence difficulty is a 0-1 ratio scaling length and
/// scramble intensity.
pub fn generate_challenge<R: Rng>(kind: ChallengeKind, difficulty: f32, rng: &mut R) -> Challenge {
    match kind {
        ChallengeKind::NumberSequence => generate_number_sequence(difficulty, rng),
        ChallengeKind::RuneSequence => generate_rune_sequence(difficulty, rng),
    }
}

fn difficulty_floor(difficulty: f32) -> u32 {
    crate::numbers::round_f64_to_i64(f64::from(difficulty.max(0.0)).floor())
        .try_into()
        .unwrap_or(0)
}

fn generate_number_sequence<R: Rng>(difficulty: f32, rng: &mut R) -> Challenge {
    let band = difficulty_floor(difficulty);
    let pattern = if band <= 1 {
        SequencePattern::Arithmetic {
            start: rng.gen_range(1..=12),
            step: rng.gen_range(2..=7),
        }
    } else if band <= 3 {
        match rng.gen_range(0..3) {
            0 => SequencePattern::Geometric {
                start: rng.gen_range(2..=5),
                ratio: rng.gen_range(2..=4),
            },
            1 => SequencePattern::QuadraticStep {
                start: rng.gen_range(1..=10),
                scale: rng.gen_range(1..=3),
            },
            _ => SequencePattern::DipThenRise {
                start: rng.gen_range(30..=60),
                fall: rng.gen_range(2..=6),
                rise: rng.gen_range(3..=8),
            },
        }
    } else {
        match rng.gen_range(0..5) {
            0 => SequencePattern::Squares {
                offset: rng.gen_range(0..=6),
            },
            1 => SequencePattern::LinearRecurrence {
                first: rng.gen_range(1..=3),
                second: rng.gen_range(2..=5),
                mul_prev: rng.gen_range(1..=2),
                mul_prev2: rng.gen_range(1..=2),
            },
            2 => SequencePattern::AlternatingMulAdd {
                start: rng.gen_range(2..=5),
                mul: rng.gen_range(2..=3),
                add: rng.gen_range(3..=9),
            },
            3 => SequencePattern::Primes {
                offset: rng.gen_range(0..=10),
            },
            _ => SequencePattern::Cubes {
                offset: rng.gen_range(0..=4),
            },
        }
    };

    let visible: Vec<i64> = (0..NUMBER_SEQUENCE_VISIBLE_TERMS)
        .map(|index| pattern.term(index))
        .collect();
    let solution = pattern.term(NUMBER_SEQUENCE_VISIBLE_TERMS);
    Challenge::NumberSequence {
        visible,
        solution,
        pattern,
        difficulty,
        max_attempts: (9u32.saturating_sub(band)).max(3),
    }
}

fn generate_rune_sequence<R: Rng>(difficulty: f32, rng: &mut R) -> Challenge {
    let ratio = difficulty.clamp(0.0, 1.0);
    let span = (RUNE_TARGET_LEN_MAX - RUNE_TARGET_LEN_MIN) as f32;
    let len = RUNE_TARGET_LEN_MIN + (ratio * span).round() as usize;

    let mut target: RuneSeq = (0..len)
        .map(|_| RuneSymbol::ALL[rng.gen_range(0..RUNE_ALPHABET_SIZE)])
        .collect();
    // A single-symbol array is already solved; force one differing rune.
    if target.iter().all(|rune| *rune == target[0]) {
        let replacement = RuneSymbol::ALL
            .into_iter()
            .find(|candidate| *candidate != target[0])
            .unwrap_or(RuneSymbol::Kun);
        target[len - 1] = replacement;
    }

    let mut start = target.clone();
    let swaps = 1 + (ratio * 7.0).round() as usize;
    for _ in 0..swaps {
        let a = rng.gen_range(0..len);
        let b = rng.gen_range(0..len);
        start.swap(a, b);
    }
    if start == target {
        // Even swap counts can cancel out; force a visible scramble.
        let a = (0..len)
            .find(|&index| target[index] != target[0])
            .unwrap_or(0);
        start.swap(0, a);
    }

    let step_budget = 15u32.saturating_sub(difficulty_floor(ratio * 3.0)).max(5);
    Challenge::RuneSequence {
        start,
        target,
        max_attempts: step_budget,
    }
}

/// Validate one proposed solution against a challenge.
///
/// `attempts_used` counts prior consuming evaluations. A failed evaluation
/// consumes one more attempt; a malformed one consumes none.
///
/// # Errors
///
/// Returns `TrialError::InvalidAttempt` when the submission does not fit the
/// challenge kind or is not a legal rearrangement of the rune multiset.
pub fn evaluate(
    challenge: &Challenge,
    attempt: &Attempt,
    attempts_used: u32,
) -> Result<Evaluation, TrialError> {
    let solved = match (challenge, attempt) {
        (Challenge::NumberSequence { solution, .. }, Attempt::Number { value }) => {
            value == solution
        }
        (Challenge::RuneSequence { target, .. }, Attempt::Runes { sequence }) => {
            if sequence.len() != target.len() {
                return Err(TrialError::InvalidAttempt {
                    reason: "rune sequence length mismatch",
                });
            }
            if !same_multiset(sequence, target) {
                return Err(TrialError::InvalidAttempt {
                    reason: "rune sequence is not a rearrangement of the array",
                });
            }
            sequence.iter().eq(target.iter())
        }
        _ => {
            return Err(TrialError::InvalidAttempt {
                reason: "attempt kind does not match the challenge",
            });
        }
    };

    let max_attempts = challenge.max_attempts();
    let consumed = if solved {
        attempts_used
    } else {
        attempts_used.saturating_add(1)
    };
    Ok(Evaluation {
        solved,
        attempts_remaining: max_attempts.saturating_sub(consumed),
    })
}

fn same_multiset(left: &[RuneSymbol], right: &[RuneSymbol]) -> bool {
    let mut counts = [0i32; RUNE_ALPHABET_SIZE];
    for rune in left {
        counts[*rune as usize] += 1;
    }
    for rune in right {
        counts[*rune as usize] -= 1;
    }
    counts.iter().all(|count| *count == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn arithmetic_band_has_five_visible_terms() {
        let mut rng = SmallRng::seed_from_u64(11);
        let challenge = generate_challenge(ChallengeKind::NumberSequence, 0.5, &mut rng);
        let Challenge::NumberSequence {
            visible,
            solution,
            pattern,
            max_attempts,
            ..
        } = challenge
        else {
            panic!("expected a number sequence");
        };
        assert_eq!(visible.len(), 5);
        assert!(matches!(pattern, SequencePattern::Arithmetic { .. }));
        assert_eq!(solution, pattern.term(5));
        assert_eq!(max_attempts, 9);
    }

    #[test]
    fn attempt_budget_floors_at_three() {
        let mut rng = SmallRng::seed_from_u64(12);
        let challenge = generate_challenge(ChallengeKind::NumberSequence, 8.0, &mut rng);
        assert_eq!(challenge.max_attempts(), 3);
    }

    #[test]
    fn dip_then_rise_turns_at_the_third_term() {
        let pattern = SequencePattern::DipThenRise {
            start: 40,
            fall: 3,
            rise: 5,
        };
        let terms: Vec<i64> = (0..6).map(|i| pattern.term(i)).collect();
        assert_eq!(terms, vec![40, 37, 34, 39, 44, 49]);
    }

    #[test]
    fn recurrence_combines_previous_two_terms() {
        let pattern = SequencePattern::LinearRecurrence {
            first: 1,
            second: 2,
            mul_prev: 2,
            mul_prev2: 1,
        };
        assert_eq!(pattern.term(2), 5);
        assert_eq!(pattern.term(3), 12);
    }

    #[test]
    fn rune_start_is_permutation_of_target() {
        let mut rng = SmallRng::seed_from_u64(13);
        for tenths in 0u16..=10 {
            let ratio = f32::from(tenths) / 10.0;
            let challenge = generate_challenge(ChallengeKind::RuneSequence, ratio, &mut rng);
            let Challenge::RuneSequence { start, target, .. } = challenge else {
                panic!("expected a rune sequence");
            };
            assert!(same_multiset(&start, &target));
            assert_ne!(start, target);
            assert!((4..=8).contains(&target.len()));
        }
    }

    #[test]
    fn wrong_number_consumes_an_attempt() {
        let challenge = Challenge::NumberSequence {
            visible: vec![2, 4, 6, 8, 10],
            solution: 12,
            pattern: SequencePattern::Arithmetic { start: 2, step: 2 },
            difficulty: 1.0,
            max_attempts: 8,
        };
        let miss = evaluate(&challenge, &Attempt::Number { value: 13 }, 0).unwrap();
        assert!(!miss.solved);
        assert_eq!(miss.attempts_remaining, 7);

        let hit = evaluate(&challenge, &Attempt::Number { value: 12 }, 1).unwrap();
        assert!(hit.solved);
        assert_eq!(hit.attempts_remaining, 7);
    }

    #[test]
    fn malformed_attempts_are_rejected_without_cost() {
        let challenge = Challenge::RuneSequence {
            start: RuneSeq::from_slice(&[RuneSymbol::Kan, RuneSymbol::Li, RuneSymbol::Qian]),
            target: RuneSeq::from_slice(&[RuneSymbol::Qian, RuneSymbol::Kan, RuneSymbol::Li]),
            max_attempts: 5,
        };
        let wrong_kind = evaluate(&challenge, &Attempt::Number { value: 3 }, 0);
        assert!(wrong_kind.is_err());

        let short = evaluate(
            &challenge,
            &Attempt::Runes {
                sequence: vec![RuneSymbol::Qian],
            },
            0,
        );
        assert!(short.is_err());

        let foreign = evaluate(
            &challenge,
            &Attempt::Runes {
                sequence: vec![RuneSymbol::Kun, RuneSymbol::Kan, RuneSymbol::Li],
            },
            0,
        );
        assert_eq!(
            foreign,
            Err(TrialError::InvalidAttempt {
                reason: "rune sequence is not a rearrangement of the array",
            })
        );
    }

    #[test]
    fn rune_solution_matches_elementwise() {
        let challenge = Challenge::RuneSequence {
            start: RuneSeq::from_slice(&[RuneSymbol::Kan, RuneSymbol::Li, RuneSymbol::Qian]),
            target: RuneSeq::from_slice(&[RuneSymbol::Qian, RuneSymbol::Kan, RuneSymbol::Li]),
            max_attempts: 5,
        };
        let solved = evaluate(
            &challenge,
            &Attempt::Runes {
                sequence: vec![RuneSymbol::Qian, RuneSymbol::Kan, RuneSymbol::Li],
            },
            2,
        )
        .unwrap();
        assert!(solved.solved);
        assert_eq!(solved.attempts_remaining, 3);
    }

    #[test]
    fn hints_name_the_pattern() {
        let challenge = Challenge::NumberSequence {
            visible: vec![4, 9, 16, 25, 36],
            solution: 49,
            pattern: SequencePattern::Squares { offset: 1 },
            difficulty: 4.0,
            max_attempts: 5,
        };
        assert!(challenge.hint().contains("perfect squares"));
    }
}
