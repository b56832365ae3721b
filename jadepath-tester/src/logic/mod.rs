pub mod reports;
pub mod scenarios;
pub mod simulation;

pub use scenarios::{SCENARIOS, ScenarioResult, run_scenario};
pub use simulation::{RunSummary, SimulationConfig, SolverPolicy, run_ascension};
