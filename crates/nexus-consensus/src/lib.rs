// crates/nexus-consensus/src/lib.rs
//
// nexus-consensus: Proof of Temporal Commitment (PoTC) scoring and the
// single-process consensus round simulator.
//
// The pure pieces (scoring, weighted selection, vote tallying, slashing) are
// free functions over core types. `PotcEngine` drives them against a
// `ConsensusStore` and owns the round counter and the RNG.

pub mod engine;
pub mod params;
pub mod round;
pub mod scoring;
pub mod selection;
pub mod slashing;

pub use engine::{ConsensusSimulationTask, ConsensusStats, PotcEngine, SimulationOutcome};
pub use params::ConsensusParams;
