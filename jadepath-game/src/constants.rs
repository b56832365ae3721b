//! Centralized balance and tuning constants for Jadepath game logic.
//!
//! These values define the deterministic math for breakthrough resolution.
//! Keeping them together ensures that progression can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_BREAKTHROUGH_SUCCESS: &str = "log.breakthrough.success";
pub(crate) const LOG_BREAKTHROUGH_BACKLASH: &str = "log.breakthrough.backlash";
pub(crate) const LOG_REALM_ASCENDED: &str = "log.breakthrough.realm-ascended";
pub(crate) const LOG_TRIBULATION_SUCCESS: &str = "log.tribulation.success";
pub(crate) const LOG_TRIBULATION_FAILURE: &str = "log.tribulation.failure";
pub(crate) const LOG_TRIAL_EXHAUSTED: &str = "log.tribulation.trial-exhausted";
pub(crate) const LOG_TRIAL_SOLVED: &str = "log.tribulation.trial-solved";
pub(crate) const LOG_CHAIN_STEP: &str = "log.breakthrough.chain-step";
pub(crate) const LOG_FLAVOR_UNAVAILABLE: &str = "log.flavor.unavailable";

// Tier structure -----------------------------------------------------------
/// Sub-levels per realm; level 9 is the realm ceiling.
pub const LEVELS_PER_REALM: u8 = 9;

// Tribulation tuning -------------------------------------------------------
/// HP loss on a successful tribulation, as a percentage band of max HP
/// at trial start.
pub(crate) const TRIBULATION_HP_LOSS_MIN_PCT: i64 = 10;
pub(crate) const TRIBULATION_HP_LOSS_MAX_PCT: i64 = 40;

// Trial tuning -------------------------------------------------------------
pub(crate) const NUMBER_SEQUENCE_VISIBLE_TERMS: usize = 5;
pub(crate) const RUNE_ALPHABET_SIZE: usize = 8;
pub(crate) const RUNE_TARGET_LEN_MIN: usize = 4;
pub(crate) const RUNE_TARGET_LEN_MAX: usize = 8;

// Backlash tuning ----------------------------------------------------------
/// Experience forfeited on an ordinary failed breakthrough, as a percentage
/// of the current tier's requirement.
pub(crate) const BACKLASH_EXP_PCT: i64 = 30;
/// Current HP lost on an ordinary failed breakthrough.
pub(crate) const BACKLASH_HP_PCT: i64 = 20;
/// HP never drops below this floor from backlash or tribulation loss.
pub(crate) const HP_FLOOR: i64 = 1;
