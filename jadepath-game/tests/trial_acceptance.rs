use jadepath_game::{Challenge, ChallengeKind, RuneSymbol, generate_challenge};
use rand::SeedableRng;
use rand::rngs::SmallRng;

const PUZZLE_SAMPLE: usize = 10_000;

/// Sweep difficulty inputs covering all three number-sequence bands.
fn band_difficulties(index: usize) -> f32 {
    match index % 5 {
        0 => 0.0,
        1 => 1.0,
        2 => 2.0,
        3 => 3.5,
        _ => 5.0,
    }
}

#[test]
fn number_sequence_solutions_match_their_stated_pattern() {
    let mut rng = SmallRng::seed_from_u64(0xA11CE);
    for index in 0..PUZZLE_SAMPLE {
        let difficulty = band_difficulties(index);
        let challenge = generate_challenge(ChallengeKind::NumberSequence, difficulty, &mut rng);
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

        assert_eq!(visible.len(), 5, "difficulty {difficulty}");
        for (term_index, term) in visible.iter().enumerate() {
            assert_eq!(
                *term,
                pattern.term(term_index),
                "visible term {term_index} disagrees with pattern {pattern:?}"
            );
        }
        // The withheld 6th term must always be what the pattern predicts.
        assert_eq!(solution, pattern.term(5), "pattern {pattern:?}");

        let expected_attempts = match difficulty {
            d if d < 1.0 => 9,
            d if d < 2.0 => 8,
            d if d < 3.0 => 7,
            d if d < 4.0 => 6,
            _ => 4,
        };
        assert_eq!(max_attempts, expected_attempts, "difficulty {difficulty}");
    }
}

#[test]
fn attempt_budget_never_drops_below_three() {
    let mut rng = SmallRng::seed_from_u64(0xB0B);
    for tens in 0u16..50 {
        let difficulty = f32::from(tens);
        let challenge = generate_challenge(ChallengeKind::NumberSequence, difficulty, &mut rng);
        assert!(challenge.max_attempts() >= 3);
    }
}

#[test]
fn rune_start_is_always_a_permutation_of_target() {
    let mut rng = SmallRng::seed_from_u64(0xC0DE);
    for index in 0..PUZZLE_SAMPLE {
        let ratio = f32::from(u16::try_from(index % 11).expect("small index")) / 10.0;
        let challenge = generate_challenge(ChallengeKind::RuneSequence, ratio, &mut rng);
        let Challenge::RuneSequence {
            start,
            target,
            max_attempts,
        } = challenge
        else {
            panic!("expected a rune sequence");
        };

        assert!((4..=8).contains(&target.len()), "ratio {ratio}");
        assert_eq!(start.len(), target.len());
        let mut counts = [0i32; 8];
        for rune in &start {
            counts[*rune as usize] += 1;
        }
        for rune in &target {
            counts[*rune as usize] -= 1;
        }
        assert!(
            counts.iter().all(|count| *count == 0),
            "start multiset diverged at ratio {ratio}"
        );
        assert_ne!(start, target, "scramble produced a solved start");
        assert!(max_attempts >= 5);
    }
}

#[test]
fn rune_alphabet_has_eight_distinct_glyphs() {
    let glyphs: std::collections::HashSet<char> =
        RuneSymbol::ALL.iter().map(|rune| rune.glyph()).collect();
    assert_eq!(glyphs.len(), 8);
}

#[test]
fn every_challenge_carries_a_hint() {
    let mut rng = SmallRng::seed_from_u64(7);
    for difficulty in [0.0, 2.0, 5.0] {
        let numbers = generate_challenge(ChallengeKind::NumberSequence, difficulty, &mut rng);
        assert!(!numbers.hint().is_empty());
    }
    let runes = generate_challenge(ChallengeKind::RuneSequence, 0.5, &mut rng);
    assert!(!runes.hint().is_empty());
}
