//! Stat aggregation across independent progression sources.
//!
//! Aggregation is pure and deterministic: flat contributions apply first,
//! then every percentage delta references the post-flat baseline. Percentage
//! contributions therefore never compound with each other regardless of
//! source order.

use serde::{Deserialize, Serialize};

use crate::numbers::pct_of_i64;

/// Complete numeric attribute set for a character at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatBundle {
    #[serde(default)]
    pub attack: i64,
    #[serde(default)]
    pub defense: i64,
    #[serde(default)]
    pub max_hp: i64,
    #[serde(default)]
    pub spirit: i64,
    #[serde(default)]
    pub physique: i64,
    #[serde(default)]
    pub speed: i64,
    #[serde(default)]
    pub luck: i64,
    #[serde(default)]
    pub exp_rate: i64,
}

impl StatBundle {
    /// Clamp every field to be non-negative.
    pub const fn clamp(&mut self) {
        self.attack = if self.attack < 0 { 0 } else { self.attack };
        self.defense = if self.defense < 0 { 0 } else { self.defense };
        self.max_hp = if self.max_hp < 0 { 0 } else { self.max_hp };
        self.spirit = if self.spirit < 0 { 0 } else { self.spirit };
        self.physique = if self.physique < 0 { 0 } else { self.physique };
        self.speed = if self.speed < 0 { 0 } else { self.speed };
        self.luck = if self.luck < 0 { 0 } else { self.luck };
        self.exp_rate = if self.exp_rate < 0 { 0 } else { self.exp_rate };
    }

    fn add(&mut self, other: &EffectSet) {
        self.attack = self.attack.saturating_add(other.attack);
        self.defense = self.defense.saturating_add(other.defense);
        self.max_hp = self.max_hp.saturating_add(other.max_hp);
        self.spirit = self.spirit.saturating_add(other.spirit);
        self.physique = self.physique.saturating_add(other.physique);
        self.speed = self.speed.saturating_add(other.speed);
        self.luck = self.luck.saturating_add(other.luck);
        self.exp_rate = self.exp_rate.saturating_add(other.exp_rate);
    }

    /// Percentage slice of this bundle, field-wise. `percent` fields are
    /// whole percent points.
    #[must_use]
    fn pct_slice(&self, percent: &EffectSet) -> EffectSet {
        EffectSet {
            attack: pct_of_i64(self.attack, percent.attack),
            defense: pct_of_i64(self.defense, percent.defense),
            max_hp: pct_of_i64(self.max_hp, percent.max_hp),
            spirit: pct_of_i64(self.spirit, percent.spirit),
            physique: pct_of_i64(self.physique, percent.physique),
            speed: pct_of_i64(self.speed, percent.speed),
            luck: pct_of_i64(self.luck, percent.luck),
            exp_rate: pct_of_i64(self.exp_rate, percent.exp_rate),
        }
    }
}

/// Flat stat deltas contributed by a single progression source. When carried
/// in a percentage position the fields are whole percent points instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EffectSet {
    #[serde(default)]
    pub attack: i64,
    #[serde(default)]
    pub defense: i64,
    #[serde(default)]
    pub max_hp: i64,
    #[serde(default)]
    pub spirit: i64,
    #[serde(default)]
    pub physique: i64,
    #[serde(default)]
    pub speed: i64,
    #[serde(default)]
    pub luck: i64,
    #[serde(default)]
    pub exp_rate: i64,
}

impl EffectSet {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Category of a progression source, used for display breakdowns and
/// content-table lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Talent,
    Title,
    TitleSet,
    CultivationArt,
    Equipment,
    Inheritance,
    Realm,
}

impl SourceKind {
    /// All categories, in display order.
    pub const ALL: [Self; 7] = [
        Self::Talent,
        Self::Title,
        Self::TitleSet,
        Self::CultivationArt,
        Self::Equipment,
        Self::Inheritance,
        Self::Realm,
    ];
}

/// A single resolved stat-modifier mechanism. The kind set is closed and
/// exhaustively matched everywhere; only Inheritance carries percentage
/// deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionSource {
    Talent { id: String, effects: EffectSet },
    Title { id: String, effects: EffectSet },
    TitleSet { id: String, effects: EffectSet },
    CultivationArt { id: String, effects: EffectSet },
    Equipment { id: String, effects: EffectSet },
    Inheritance { id: String, effects: EffectSet, percent: EffectSet },
    Realm { id: String, effects: EffectSet },
}

impl ProgressionSource {
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Talent { .. } => SourceKind::Talent,
            Self::Title { .. } => SourceKind::Title,
            Self::TitleSet { .. } => SourceKind::TitleSet,
            Self::CultivationArt { .. } => SourceKind::CultivationArt,
            Self::Equipment { .. } => SourceKind::Equipment,
            Self::Inheritance { .. } => SourceKind::Inheritance,
            Self::Realm { .. } => SourceKind::Realm,
        }
    }

    #[must_use]
    pub const fn flat(&self) -> &EffectSet {
        match self {
            Self::Talent { effects, .. }
            | Self::Title { effects, .. }
            | Self::TitleSet { effects, .. }
            | Self::CultivationArt { effects, .. }
            | Self::Equipment { effects, .. }
            | Self::Inheritance { effects, .. }
            | Self::Realm { effects, .. } => effects,
        }
    }

    #[must_use]
    pub const fn percent(&self) -> Option<&EffectSet> {
        match self {
            Self::Inheritance { percent, .. } => Some(percent),
            _ => None,
        }
    }
}

/// Combine a tier base value with zero or more source contributions.
///
/// Flat deltas sum first; each percentage delta is then taken against the
/// post-flat baseline, never against another percentage's applied result.
/// The result is clamped non-negative field-wise.
#[must_use]
pub fn aggregate(base: &StatBundle, sources: &[ProgressionSource]) -> StatBundle {
    let mut out = *base;
    for source in sources {
        out.add(source.flat());
    }
    let baseline = out;
    for source in sources {
        if let Some(percent) = source.percent() {
            out.add(&baseline.pct_slice(percent));
        }
    }
    out.clamp();
    out
}

/// Itemized per-category delta for the tribulation display breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub kind: SourceKind,
    pub delta: EffectSet,
}

/// Presentational per-source-kind bonus breakdown. Derived by re-running the
/// aggregator filtered per category; never feeds back into resolution math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BonusBreakdown(pub Vec<BreakdownEntry>);

impl BonusBreakdown {
    #[must_use]
    pub fn get(&self, kind: SourceKind) -> Option<&EffectSet> {
        self.0
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| &entry.delta)
    }
}

/// Itemize the aggregate bonus by source category, for display only.
#[must_use]
pub fn aggregate_breakdown(base: &StatBundle, sources: &[ProgressionSource]) -> BonusBreakdown {
    let mut entries = Vec::new();
    for kind in SourceKind::ALL {
        let filtered: Vec<ProgressionSource> = sources
            .iter()
            .filter(|source| source.kind() == kind)
            .cloned()
            .collect();
        if filtered.is_empty() {
            continue;
        }
        let with = aggregate(base, &filtered);
        let delta = EffectSet {
            attack: with.attack - base.attack,
            defense: with.defense - base.defense,
            max_hp: with.max_hp - base.max_hp,
            spirit: with.spirit - base.spirit,
            physique: with.physique - base.physique,
            speed: with.speed - base.speed,
            luck: with.luck - base.luck,
            exp_rate: with.exp_rate - base.exp_rate,
        };
        if !delta.is_zero() {
            entries.push(BreakdownEntry { kind, delta });
        }
    }
    BonusBreakdown(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_100() -> StatBundle {
        StatBundle {
            attack: 100,
            defense: 50,
            max_hp: 1000,
            spirit: 30,
            physique: 30,
            speed: 20,
            luck: 5,
            exp_rate: 100,
        }
    }

    #[test]
    fn flat_contributions_sum() {
        let sources = vec![
            ProgressionSource::Talent {
                id: String::from("iron-bones"),
                effects: EffectSet {
                    defense: 10,
                    ..EffectSet::default()
                },
            },
            ProgressionSource::Equipment {
                id: String::from("jade-sabre"),
                effects: EffectSet {
                    attack: 25,
                    ..EffectSet::default()
                },
            },
        ];
        let out = aggregate(&base_100(), &sources);
        assert_eq!(out.attack, 125);
        assert_eq!(out.defense, 60);
        assert_eq!(out.max_hp, 1000);
    }

    #[test]
    fn percentages_reference_post_flat_baseline() {
        let sources = vec![
            ProgressionSource::Equipment {
                id: String::from("jade-sabre"),
                effects: EffectSet {
                    attack: 100,
                    ..EffectSet::default()
                },
            },
            ProgressionSource::Inheritance {
                id: String::from("azure-dragon"),
                effects: EffectSet::default(),
                percent: EffectSet {
                    attack: 10,
                    ..EffectSet::default()
                },
            },
        ];
        // 100 base + 100 flat = 200 baseline; +10% of 200 = 220.
        let out = aggregate(&base_100(), &sources);
        assert_eq!(out.attack, 220);
    }

    #[test]
    fn two_percent_sources_never_compound() {
        let inherit = |id: &str| ProgressionSource::Inheritance {
            id: String::from(id),
            effects: EffectSet::default(),
            percent: EffectSet {
                attack: 10,
                ..EffectSet::default()
            },
        };
        let base = StatBundle {
            attack: 100,
            ..StatBundle::default()
        };
        let out = aggregate(&base, &[inherit("first"), inherit("second")]);
        assert_eq!(out.attack, 120);
    }

    #[test]
    fn negative_results_clamp_to_zero() {
        let sources = vec![ProgressionSource::Title {
            id: String::from("disgraced"),
            effects: EffectSet {
                speed: -50,
                ..EffectSet::default()
            },
        }];
        let out = aggregate(&base_100(), &sources);
        assert_eq!(out.speed, 0);
    }

    #[test]
    fn breakdown_itemizes_by_kind() {
        let sources = vec![
            ProgressionSource::Talent {
                id: String::from("iron-bones"),
                effects: EffectSet {
                    defense: 10,
                    ..EffectSet::default()
                },
            },
            ProgressionSource::Equipment {
                id: String::from("jade-sabre"),
                effects: EffectSet {
                    attack: 25,
                    ..EffectSet::default()
                },
            },
        ];
        let breakdown = aggregate_breakdown(&base_100(), &sources);
        assert_eq!(breakdown.0.len(), 2);
        assert_eq!(breakdown.get(SourceKind::Talent).unwrap().defense, 10);
        assert_eq!(breakdown.get(SourceKind::Equipment).unwrap().attack, 25);
        assert!(breakdown.get(SourceKind::Inheritance).is_none());
    }
}
