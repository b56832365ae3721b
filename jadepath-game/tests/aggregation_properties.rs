use jadepath_game::{
    EffectSet, ProgressionSource, SourceKind, StatBundle, aggregate, aggregate_breakdown,
};

fn base() -> StatBundle {
    StatBundle {
        attack: 100,
        defense: 60,
        max_hp: 1_200,
        spirit: 40,
        physique: 40,
        speed: 25,
        luck: 5,
        exp_rate: 100,
    }
}

fn flat(kind: SourceKind, id: &str, attack: i64, defense: i64) -> ProgressionSource {
    let effects = EffectSet {
        attack,
        defense,
        ..EffectSet::default()
    };
    let id = String::from(id);
    match kind {
        SourceKind::Talent => ProgressionSource::Talent { id, effects },
        SourceKind::Title => ProgressionSource::Title { id, effects },
        SourceKind::TitleSet => ProgressionSource::TitleSet { id, effects },
        SourceKind::CultivationArt => ProgressionSource::CultivationArt { id, effects },
        SourceKind::Equipment => ProgressionSource::Equipment { id, effects },
        SourceKind::Inheritance => ProgressionSource::Inheritance {
            id,
            effects,
            percent: EffectSet::default(),
        },
        SourceKind::Realm => ProgressionSource::Realm { id, effects },
    }
}

fn percent_source(id: &str, attack_pct: i64) -> ProgressionSource {
    ProgressionSource::Inheritance {
        id: String::from(id),
        effects: EffectSet::default(),
        percent: EffectSet {
            attack: attack_pct,
            ..EffectSet::default()
        },
    }
}

#[test]
fn flat_aggregation_is_order_independent() {
    let sources = vec![
        flat(SourceKind::Talent, "a", 10, 0),
        flat(SourceKind::Equipment, "b", 0, 15),
        flat(SourceKind::Title, "c", 7, 3),
        percent_source("d", 10),
    ];
    let reference = aggregate(&base(), &sources);

    // All 24 permutations of the four sources.
    let indices = [0usize, 1, 2, 3];
    for &i in &indices {
        for &j in &indices {
            for &k in &indices {
                for &l in &indices {
                    let mut seen = [false; 4];
                    seen[i] = true;
                    if seen[j] {
                        continue;
                    }
                    seen[j] = true;
                    if seen[k] {
                        continue;
                    }
                    seen[k] = true;
                    if seen[l] {
                        continue;
                    }
                    let permuted = vec![
                        sources[i].clone(),
                        sources[j].clone(),
                        sources[k].clone(),
                        sources[l].clone(),
                    ];
                    assert_eq!(aggregate(&base(), &permuted), reference);
                }
            }
        }
    }
}

#[test]
fn percentage_contributions_never_compound() {
    let base = StatBundle {
        attack: 100,
        ..StatBundle::default()
    };
    let sources = vec![percent_source("first", 10), percent_source("second", 10)];
    let out = aggregate(&base, &sources);
    assert_eq!(out.attack, 120, "two +10% sources must yield 120, never 121");
}

#[test]
fn percentages_see_the_post_flat_baseline() {
    let base = StatBundle {
        attack: 100,
        ..StatBundle::default()
    };
    let sources = vec![
        flat(SourceKind::Equipment, "sabre", 100, 0),
        percent_source("dragon", 10),
    ];
    let out = aggregate(&base, &sources);
    assert_eq!(out.attack, 220);
}

#[test]
fn empty_source_list_is_identity_after_clamp() {
    let out = aggregate(&base(), &[]);
    assert_eq!(out, base());
}

#[test]
fn breakdown_sums_match_full_aggregate_for_flat_sources() {
    let sources = vec![
        flat(SourceKind::Talent, "a", 10, 4),
        flat(SourceKind::Equipment, "b", 25, 15),
        flat(SourceKind::Title, "c", 7, 3),
    ];
    let total = aggregate(&base(), &sources);
    let breakdown = aggregate_breakdown(&base(), &sources);

    let bonus_attack: i64 = breakdown.0.iter().map(|entry| entry.delta.attack).sum();
    let bonus_defense: i64 = breakdown.0.iter().map(|entry| entry.delta.defense).sum();
    assert_eq!(base().attack + bonus_attack, total.attack);
    assert_eq!(base().defense + bonus_defense, total.defense);
}
