//! Crossroads simulator - repeated rounds of level-k MCTS decision making
//!
//! A round resets every vehicle to its initial state and then ticks until
//! all vehicles reach their goals, any vehicle collides, or the simulated
//! time runs out. Each tick every active vehicle plans against the same
//! frozen snapshot in parallel, then all vehicles move together.
//!
//! The `decision-making` binary wires these pieces to the command line.

pub mod config;
pub mod experiment;
pub mod export;
pub mod orchestrator;
pub mod report;
pub mod scenario;
pub mod stats;

pub use experiment::{Experiment, ExperimentOptions};
pub use export::TrajectoryExporter;
pub use orchestrator::{plan_seed, Orchestrator};
pub use report::{PlanningSummary, RoundOutcome, RoundReport, VehicleReport};
pub use scenario::Scenario;
pub use stats::{ExperimentSnapshot, ExperimentStats};
