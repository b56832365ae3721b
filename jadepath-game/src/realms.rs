//! Realm catalog: the externally balanced progression content table.
//!
//! Each realm carries its base stat line, experience curve, flat level-up
//! chance, and — for tribulation-gated realms — an opaque failure
//! probability plus an optional trial requirement. The engine never
//! derives these numbers; they arrive balanced from content.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numbers::{ceil_f64_to_i64, i64_to_f64, pct_of_i64};
use crate::stats::StatBundle;
use crate::trial::ChallengeKind;

/// Validation failures for realm catalog content.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("realm catalog contains no realms")]
    Empty,
    #[error("{field} out of range [{min}, {max}]: {value}")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Entry gate for a tribulation-gated realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TribulationGate {
    /// Opaque failure probability, produced upstream by balancing.
    pub failure_probability: f32,
    /// Trial kind that must be solved before resolution, when present.
    #[serde(default)]
    pub trial: Option<ChallengeKind>,
}

/// Static definition of one cultivation realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmDef {
    pub name: String,
    /// Base stat line at level 1 of this realm.
    pub base: StatBundle,
    /// Experience required to leave level 1.
    pub exp_base: i64,
    /// Geometric growth of the per-level experience requirement.
    pub exp_growth: f32,
    /// Per-level base stat growth, in percent of the realm base.
    pub level_growth_pct: i64,
    /// Flat success chance for ordinary level-ups inside this realm.
    pub level_up_chance: f32,
    /// Present when entering this realm requires a tribulation.
    #[serde(default)]
    pub gate: Option<TribulationGate>,
}

impl RealmDef {
    /// Experience required to advance out of `level` (1-based).
    #[must_use]
    pub fn exp_required(&self, level: u8) -> i64 {
        let exponent = i32::from(level.saturating_sub(1));
        let factor = f64::from(self.exp_growth).powi(exponent);
        ceil_f64_to_i64(i64_to_f64(self.exp_base) * factor)
    }

    /// Base stat line at `level` (1-based): the realm base plus
    /// `level_growth_pct` percent of it per level gained.
    #[must_use]
    pub fn base_for_level(&self, level: u8) -> StatBundle {
        let steps = i64::from(level.saturating_sub(1));
        let pct = steps.saturating_mul(self.level_growth_pct);
        let mut out = self.base;
        out.attack += pct_of_i64(self.base.attack, pct);
        out.defense += pct_of_i64(self.base.defense, pct);
        out.max_hp += pct_of_i64(self.base.max_hp, pct);
        out.spirit += pct_of_i64(self.base.spirit, pct);
        out.physique += pct_of_i64(self.base.physique, pct);
        out.speed += pct_of_i64(self.base.speed, pct);
        out.luck += pct_of_i64(self.base.luck, pct);
        out.exp_rate += pct_of_i64(self.base.exp_rate, pct);
        out
    }

    fn validate(&self, index: usize) -> Result<(), CatalogError> {
        if !(0.0..=1.0).contains(&self.level_up_chance) {
            return Err(CatalogError::RangeViolation {
                field: "level_up_chance",
                min: 0.0,
                max: 1.0,
                value: f64::from(self.level_up_chance),
            });
        }
        if self.exp_base <= 0 {
            return Err(CatalogError::RangeViolation {
                field: "exp_base",
                min: 1.0,
                max: f64::from(i32::MAX),
                value: i64_to_f64(self.exp_base),
            });
        }
        if !(1.0..=10.0).contains(&self.exp_growth) {
            return Err(CatalogError::RangeViolation {
                field: "exp_growth",
                min: 1.0,
                max: 10.0,
                value: f64::from(self.exp_growth),
            });
        }
        if let Some(gate) = &self.gate {
            if !(0.0..=1.0).contains(&gate.failure_probability) {
                return Err(CatalogError::RangeViolation {
                    field: "gate.failure_probability",
                    min: 0.0,
                    max: 1.0,
                    value: f64::from(gate.failure_probability),
                });
            }
            if index == 0 {
                return Err(CatalogError::RangeViolation {
                    field: "gate",
                    min: 1.0,
                    max: f64::from(i32::MAX),
                    value: 0.0,
                });
            }
        }
        Ok(())
    }
}

/// Ordered table of realms; index order is ascension order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmCatalog {
    pub realms: Vec<RealmDef>,
}

impl RealmCatalog {
    /// Parse a catalog from JSON content.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid realm data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate catalog invariants before sanitization.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.realms.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, realm) in self.realms.iter().enumerate() {
            realm.validate(index)?;
        }
        Ok(())
    }

    /// Clamp out-of-range probabilities in place.
    pub fn sanitize(&mut self) {
        for realm in &mut self.realms {
            realm.level_up_chance = realm.level_up_chance.clamp(0.0, 1.0);
            if let Some(gate) = &mut realm.gate {
                gate.failure_probability = gate.failure_probability.clamp(0.0, 1.0);
            }
        }
    }

    #[must_use]
    pub fn get(&self, realm: usize) -> Option<&RealmDef> {
        self.realms.get(realm)
    }

    /// Whether `realm` is the final realm of the catalog.
    #[must_use]
    pub fn is_final(&self, realm: usize) -> bool {
        realm.saturating_add(1) >= self.realms.len()
    }
}

impl Default for RealmCatalog {
    fn default() -> Self {
        let realm = |name: &str,
                     attack: i64,
                     max_hp: i64,
                     exp_base: i64,
                     chance: f32,
                     gate: Option<TribulationGate>| RealmDef {
            name: String::from(name),
            base: StatBundle {
                attack,
                defense: attack / 2,
                max_hp,
                spirit: attack / 2,
                physique: attack / 2,
                speed: attack / 4,
                luck: 5,
                exp_rate: 100,
            },
            exp_base,
            exp_growth: 1.5,
            level_growth_pct: 10,
            level_up_chance: chance,
            gate,
        };
        Self {
            realms: vec![
                realm("Qi Refining", 20, 200, 100, 0.9, None),
                realm(
                    "Foundation Establishment",
                    60,
                    700,
                    400,
                    0.8,
                    Some(TribulationGate {
                        failure_probability: 0.15,
                        trial: None,
                    }),
                ),
                realm(
                    "Core Formation",
                    160,
                    2_000,
                    1_500,
                    0.7,
                    Some(TribulationGate {
                        failure_probability: 0.25,
                        trial: Some(ChallengeKind::NumberSequence),
                    }),
                ),
                realm(
                    "Nascent Soul",
                    400,
                    5_500,
                    5_000,
                    0.6,
                    Some(TribulationGate {
                        failure_probability: 0.35,
                        trial: Some(ChallengeKind::RuneSequence),
                    }),
                ),
                realm(
                    "Soul Transformation",
                    950,
                    14_000,
                    16_000,
                    0.5,
                    Some(TribulationGate {
                        failure_probability: 0.45,
                        trial: Some(ChallengeKind::NumberSequence),
                    }),
                ),
                realm(
                    "Void Refinement",
                    2_200,
                    36_000,
                    50_000,
                    0.4,
                    Some(TribulationGate {
                        failure_probability: 0.55,
                        trial: Some(ChallengeKind::RuneSequence),
                    }),
                ),
                realm(
                    "Immortal Ascension",
                    5_000,
                    90_000,
                    160_000,
                    0.3,
                    Some(TribulationGate {
                        failure_probability: 0.65,
                        trial: Some(ChallengeKind::NumberSequence),
                    }),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_validates() {
        let catalog = RealmCatalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.realms.len(), 7);
        assert!(catalog.realms[0].gate.is_none());
    }

    #[test]
    fn exp_curve_is_geometric() {
        let realm = &RealmCatalog::default().realms[0];
        assert_eq!(realm.exp_required(1), 100);
        assert_eq!(realm.exp_required(2), 150);
        assert_eq!(realm.exp_required(3), 225);
    }

    #[test]
    fn level_base_grows_linearly() {
        let realm = &RealmCatalog::default().realms[0];
        let l1 = realm.base_for_level(1);
        let l3 = realm.base_for_level(3);
        assert_eq!(l1.attack, 20);
        assert_eq!(l3.attack, 24);
        assert_eq!(l3.max_hp, 240);
    }

    #[test]
    fn sanitize_clamps_probabilities() {
        let mut catalog = RealmCatalog::default();
        catalog.realms[1].level_up_chance = 3.0;
        if let Some(gate) = &mut catalog.realms[1].gate {
            gate.failure_probability = -0.5;
        }
        assert!(catalog.validate().is_err());
        catalog.sanitize();
        assert!(catalog.validate().is_ok());
        assert!((catalog.realms[1].level_up_chance - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn first_realm_rejects_gate() {
        let mut catalog = RealmCatalog::default();
        catalog.realms[0].gate = Some(TribulationGate {
            failure_probability: 0.1,
            trial: None,
        });
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn catalog_roundtrips_json() {
        let catalog = RealmCatalog::default();
        let json = serde_json::to_string(&catalog).unwrap();
        let restored = RealmCatalog::from_json(&json).unwrap();
        assert_eq!(restored, catalog);
    }
}
