//! Immutable content tables mapping source ids to stat effects.
//!
//! Talents, titles, title sets, cultivation arts, equipment, and
//! inheritances are authored outside this engine and consumed read-only.
//! Resolution is forgiving: an unresolvable id simply contributes zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats::{EffectSet, ProgressionSource, SourceKind};

/// Reference to a content entry held by a character record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: String,
}

impl SourceRef {
    #[must_use]
    pub fn new(kind: SourceKind, id: &str) -> Self {
        Self {
            kind,
            id: String::from(id),
        }
    }
}

/// Inheritance entries mix flat deltas with percent-of-baseline deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InheritanceEntry {
    #[serde(default)]
    pub effects: EffectSet,
    #[serde(default)]
    pub percent: EffectSet,
}

/// Read-only id-to-effects tables for every source category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentLibrary {
    #[serde(default)]
    pub talents: HashMap<String, EffectSet>,
    #[serde(default)]
    pub titles: HashMap<String, EffectSet>,
    #[serde(default)]
    pub title_sets: HashMap<String, EffectSet>,
    #[serde(default)]
    pub cultivation_arts: HashMap<String, EffectSet>,
    #[serde(default)]
    pub equipment: HashMap<String, EffectSet>,
    #[serde(default)]
    pub inheritances: HashMap<String, InheritanceEntry>,
}

impl ContentLibrary {
    /// Parse a library from JSON content.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid content data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolve character source references into concrete progression
    /// sources. Unknown ids are dropped; realm refs never resolve here
    /// because the realm contribution is the tier base itself.
    #[must_use]
    pub fn resolve(&self, refs: &[SourceRef]) -> Vec<ProgressionSource> {
        let mut sources = Vec::with_capacity(refs.len());
        for reference in refs {
            let id = reference.id.clone();
            let source = match reference.kind {
                SourceKind::Talent => self
                    .talents
                    .get(&reference.id)
                    .map(|effects| ProgressionSource::Talent {
                        id,
                        effects: *effects,
                    }),
                SourceKind::Title => self
                    .titles
                    .get(&reference.id)
                    .map(|effects| ProgressionSource::Title {
                        id,
                        effects: *effects,
                    }),
                SourceKind::TitleSet => {
                    self.title_sets
                        .get(&reference.id)
                        .map(|effects| ProgressionSource::TitleSet {
                            id,
                            effects: *effects,
                        })
                }
                SourceKind::CultivationArt => self.cultivation_arts.get(&reference.id).map(
                    |effects| ProgressionSource::CultivationArt {
                        id,
                        effects: *effects,
                    },
                ),
                SourceKind::Equipment => {
                    self.equipment
                        .get(&reference.id)
                        .map(|effects| ProgressionSource::Equipment {
                            id,
                            effects: *effects,
                        })
                }
                SourceKind::Inheritance => self.inheritances.get(&reference.id).map(|entry| {
                    ProgressionSource::Inheritance {
                        id,
                        effects: entry.effects,
                        percent: entry.percent,
                    }
                }),
                SourceKind::Realm => None,
            };
            if let Some(source) = source {
                sources.push(source);
            }
        }
        sources
    }

    /// Count of cultivation arts known from a reference list, used by the
    /// orchestrator as a trial-difficulty input.
    #[must_use]
    pub fn arts_known(&self, refs: &[SourceRef]) -> usize {
        refs.iter()
            .filter(|reference| {
                reference.kind == SourceKind::CultivationArt
                    && self.cultivation_arts.contains_key(&reference.id)
            })
            .count()
    }

    /// Small built-in content set for tests and headless simulation.
    #[must_use]
    pub fn sample() -> Self {
        let mut library = Self::default();
        library.talents.insert(
            String::from("iron-bones"),
            EffectSet {
                defense: 12,
                physique: 8,
                ..EffectSet::default()
            },
        );
        library.talents.insert(
            String::from("spirit-eye"),
            EffectSet {
                spirit: 15,
                luck: 3,
                ..EffectSet::default()
            },
        );
        library.titles.insert(
            String::from("sect-disciple"),
            EffectSet {
                exp_rate: 10,
                ..EffectSet::default()
            },
        );
        library.title_sets.insert(
            String::from("outer-court"),
            EffectSet {
                max_hp: 80,
                ..EffectSet::default()
            },
        );
        library.cultivation_arts.insert(
            String::from("flowing-river-sutra"),
            EffectSet {
                spirit: 20,
                attack: 10,
                ..EffectSet::default()
            },
        );
        library.cultivation_arts.insert(
            String::from("mountain-shaking-fist"),
            EffectSet {
                attack: 25,
                physique: 10,
                ..EffectSet::default()
            },
        );
        library.equipment.insert(
            String::from("jade-sabre"),
            EffectSet {
                attack: 30,
                ..EffectSet::default()
            },
        );
        library.equipment.insert(
            String::from("tortoise-shell-robe"),
            EffectSet {
                defense: 20,
                max_hp: 120,
                ..EffectSet::default()
            },
        );
        library.inheritances.insert(
            String::from("azure-dragon"),
            InheritanceEntry {
                effects: EffectSet {
                    attack: 15,
                    ..EffectSet::default()
                },
                percent: EffectSet {
                    attack: 10,
                    max_hp: 5,
                    ..EffectSet::default()
                },
            },
        );
        library
    }
}
