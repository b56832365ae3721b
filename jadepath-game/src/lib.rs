//! Jadepath Game Engine
//!
//! Platform-agnostic core game logic for the Jadepath cultivation simulation.
//! This crate provides the breakthrough and tribulation resolution mechanics
//! without UI or platform-specific dependencies.

pub mod breakthrough;
pub mod character;
pub mod constants;
pub mod content;
pub mod event;
pub mod narrative;
pub mod numbers;
pub mod realms;
pub mod rng;
pub mod stats;
pub mod trial;
pub mod tribulation;

// Re-export commonly used types
pub use breakthrough::{
    AdvanceReport, BacklashReport, BreakthroughError, BreakthroughOutcome, ChainOutcome,
    Orchestrator, TribulationReport,
};
pub use character::Character;
pub use constants::LEVELS_PER_REALM;
pub use content::{ContentLibrary, InheritanceEntry, SourceRef};
pub use event::{EventId, SessionEvent, SessionEventKind};
pub use narrative::{FlavorText, NarrativeStage, NullFlavor, STAGES, StageTimer};
pub use realms::{CatalogError, RealmCatalog, RealmDef, TribulationGate};
pub use rng::{CountingRng, RngBundle};
pub use stats::{
    BonusBreakdown, BreakdownEntry, EffectSet, ProgressionSource, SourceKind, StatBundle,
    aggregate, aggregate_breakdown,
};
pub use trial::{
    Attempt, Challenge, ChallengeKind, Evaluation, RuneSeq, RuneSymbol, SequencePattern,
    TrialError, evaluate, generate_challenge,
};
pub use tribulation::{SessionError, SessionPhase, TribulationResult, TribulationSession};

/// Trait for abstracting content loading operations.
/// Platform-specific implementations should provide this.
pub trait ContentSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the realm catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or parsed.
    fn load_catalog(&self) -> Result<RealmCatalog, Self::Error>;

    /// Load the content library from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be loaded or parsed.
    fn load_library(&self) -> Result<ContentLibrary, Self::Error>;
}

/// Content source backed by the built-in default tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinContent;

impl ContentSource for BuiltinContent {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<RealmCatalog, Self::Error> {
        Ok(RealmCatalog::default())
    }

    fn load_library(&self) -> Result<ContentLibrary, Self::Error> {
        Ok(ContentLibrary::sample())
    }
}

/// Construct an orchestrator and starting character from a content source.
///
/// # Errors
///
/// Returns an error if content loading or catalog validation fails.
pub fn bootstrap<C: ContentSource>(
    source: &C,
    name: &str,
    seed: u64,
) -> Result<(Orchestrator, Character), anyhow::Error>
where
    C::Error: Into<anyhow::Error>,
{
    let catalog = source.load_catalog().map_err(Into::into)?;
    let library = source.load_library().map_err(Into::into)?;
    let character = Character::new(name, &catalog, &library);
    let orchestrator = Orchestrator::new(catalog, library, seed)?;
    Ok((orchestrator, character))
}
