//! Mutable character record shared with the out-of-scope persistence and
//! presentation layers. The breakthrough orchestrator is the only engine
//! component that writes it, and only at terminal transition points.

use serde::{Deserialize, Serialize};

use crate::constants::LEVELS_PER_REALM;
use crate::content::{ContentLibrary, SourceRef};
use crate::realms::RealmCatalog;
use crate::stats::{StatBundle, aggregate};

/// One player character's progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    /// Realm index into the catalog.
    pub realm: usize,
    /// Sub-level within the realm, 1 through 9.
    pub level: u8,
    pub hp: i64,
    pub experience: i64,
    /// Finite resource consumed by chained advancement.
    pub inheritance_charges: u32,
    /// References into the content library; read-only to this engine.
    #[serde(default)]
    pub source_refs: Vec<SourceRef>,
    /// Cached aggregate, recomputed after any permanent change.
    pub stats: StatBundle,
    /// Journal of i18n log keys for the presentation layer.
    #[serde(default)]
    pub logs: Vec<String>,
}

impl Character {
    /// Create a fresh character at the first realm's first level.
    #[must_use]
    pub fn new(name: &str, catalog: &RealmCatalog, library: &ContentLibrary) -> Self {
        let mut character = Self {
            name: String::from(name),
            realm: 0,
            level: 1,
            hp: 0,
            experience: 0,
            inheritance_charges: 0,
            source_refs: Vec::new(),
            stats: StatBundle::default(),
            logs: Vec::new(),
        };
        character.recompute_stats(catalog, library);
        character.hp = character.stats.max_hp;
        character
    }

    /// Whether the character sits at the realm's level-9 ceiling, where the
    /// next advancement crosses a realm boundary.
    #[must_use]
    pub const fn is_at_realm_ceiling(&self) -> bool {
        self.level >= LEVELS_PER_REALM
    }

    /// Re-derive the cached StatBundle from the current tier base plus the
    /// character's resolved source set.
    pub fn recompute_stats(&mut self, catalog: &RealmCatalog, library: &ContentLibrary) {
        let Some(realm) = catalog.get(self.realm) else {
            return;
        };
        let base = realm.base_for_level(self.level);
        let sources = library.resolve(&self.source_refs);
        self.stats = aggregate(&base, &sources);
        self.hp = self.hp.min(self.stats.max_hp);
    }

    /// Restore current HP to the aggregate maximum.
    pub const fn full_heal(&mut self) {
        self.hp = self.stats.max_hp;
    }

    /// Append a journal log key.
    pub fn push_log(&mut self, key: &str) {
        self.logs.push(String::from(key));
    }

    /// Display label for the current tier, e.g. `Core Formation 3`.
    #[must_use]
    pub fn tier_label(&self, catalog: &RealmCatalog) -> String {
        catalog.get(self.realm).map_or_else(
            || format!("Unknown {}", self.level),
            |realm| format!("{} {}", realm.name, self.level),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SourceKind;

    #[test]
    fn new_character_starts_at_full_health() {
        let catalog = RealmCatalog::default();
        let library = ContentLibrary::sample();
        let character = Character::new("Lin Feng", &catalog, &library);
        assert_eq!(character.realm, 0);
        assert_eq!(character.level, 1);
        assert_eq!(character.hp, character.stats.max_hp);
        assert!(!character.is_at_realm_ceiling());
    }

    #[test]
    fn recompute_folds_in_sources_and_caps_hp() {
        let catalog = RealmCatalog::default();
        let library = ContentLibrary::sample();
        let mut character = Character::new("Lin Feng", &catalog, &library);
        let bare_max = character.stats.max_hp;

        character
            .source_refs
            .push(SourceRef::new(SourceKind::Equipment, "tortoise-shell-robe"));
        character.recompute_stats(&catalog, &library);
        assert_eq!(character.stats.max_hp, bare_max + 120);
        // Current HP never rises from a recompute alone.
        assert_eq!(character.hp, bare_max);

        character.source_refs.clear();
        character.recompute_stats(&catalog, &library);
        assert_eq!(character.hp, bare_max);
    }

    #[test]
    fn tier_label_names_realm_and_level() {
        let catalog = RealmCatalog::default();
        let library = ContentLibrary::sample();
        let mut character = Character::new("Lin Feng", &catalog, &library);
        character.realm = 2;
        character.level = 4;
        assert_eq!(character.tier_label(&catalog), "Core Formation 4");
    }
}
