//! Narrative staging and the best-effort flavor-text seam.
//!
//! Staging is a static ordered list of (label, duration) pairs consumed by
//! a simple iterator; there is no branching and no general scheduler. The
//! flavor-text service is remote and unreliable, so its failures are logged
//! and never allowed to touch resolution.

use std::time::Duration;

/// One fixed-duration narrative beat of a tribulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrativeStage {
    /// i18n label key for the presentation layer.
    pub label: &'static str,
    pub duration: Duration,
}

/// The tribulation stage script, in play order.
pub const STAGES: [NarrativeStage; 4] = [
    NarrativeStage {
        label: "stage.gathering-clouds",
        duration: Duration::from_millis(2_500),
    },
    NarrativeStage {
        label: "stage.first-bolt",
        duration: Duration::from_millis(1_800),
    },
    NarrativeStage {
        label: "stage.heart-demon",
        duration: Duration::from_millis(3_000),
    },
    NarrativeStage {
        label: "stage.final-strike",
        duration: Duration::from_millis(2_200),
    },
];

/// Timer iterator over the stage script.
#[derive(Debug, Clone, Default)]
pub struct StageTimer {
    next: usize,
}

impl StageTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Index of the stage the next call will yield.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.next
    }

    /// Whether every stage has been consumed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.next >= STAGES.len()
    }
}

impl Iterator for StageTimer {
    type Item = (usize, NarrativeStage);

    fn next(&mut self) -> Option<Self::Item> {
        let stage = STAGES.get(self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, *stage))
    }
}

/// Seam for the best-effort remote flavor-text service.
///
/// Implementations may fail or stall; callers must treat any error as
/// "use default text" and proceed.
pub trait FlavorText {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce narrative text for a successful ordinary breakthrough.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote service is unavailable; resolution
    /// proceeds with default text in that case.
    fn breakthrough_text(&self, tier_label: &str) -> Result<String, Self::Error>;
}

/// Flavor source that always yields the built-in default line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFlavor;

impl FlavorText for NullFlavor {
    type Error = std::convert::Infallible;

    fn breakthrough_text(&self, tier_label: &str) -> Result<String, Self::Error> {
        Ok(format!("A surge of qi settles; {tier_label} is attained."))
    }
}

/// Drive the stage script in real time, invoking `on_stage` as each stage
/// begins and sleeping through its duration.
#[cfg(feature = "async")]
pub async fn run_staging<F>(mut on_stage: F)
where
    F: FnMut(usize, &NarrativeStage),
{
    for (index, stage) in StageTimer::new() {
        on_stage(index, &stage);
        tokio::time::sleep(stage.duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_walks_every_stage_in_order() {
        let timer = StageTimer::new();
        let labels: Vec<&str> = timer.map(|(_, stage)| stage.label).collect();
        assert_eq!(
            labels,
            vec![
                "stage.gathering-clouds",
                "stage.first-bolt",
                "stage.heart-demon",
                "stage.final-strike",
            ]
        );
    }

    #[test]
    fn timer_reports_position_and_finish() {
        let mut timer = StageTimer::new();
        assert_eq!(timer.position(), 0);
        assert!(!timer.is_finished());
        while timer.next().is_some() {}
        assert!(timer.is_finished());
        assert!(timer.next().is_none());
    }

    #[test]
    fn null_flavor_always_produces_text() {
        let text = NullFlavor.breakthrough_text("Core Formation 1").unwrap();
        assert!(text.contains("Core Formation 1"));
    }
}
