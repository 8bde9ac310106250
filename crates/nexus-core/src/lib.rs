// crates/nexus-core/src/lib.rs
//
// nexus-core: Core types, traits, and opaque tokens for the NexusLink
// Proof of Temporal Commitment (PoTC) simulator.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the entity records owned by the store, the error type, the
// storage and periodic-task traits, and the opaque token helpers.

pub mod consensus;
pub mod error;
pub mod network;
pub mod token;
pub mod traits;
pub mod validator;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use nexus_core::Validator;`

// Validator types
pub use validator::{NewValidator, Validator, ValidatorStatus};

// Consensus types
pub use consensus::{ConsensusRound, NewConsensusRound, NewValidatorVote, RoundPhase, ValidatorVote, VoteValue};

// Network types
pub use network::{
    NetworkMetrics, NewNetworkMetrics, NewNode, NewTemporalCommitment, NewTrainingJob, Node,
    NodeStatus, NodeType, TemporalCommitment, TrainingJob, MAX_TRAINING_STEP,
};

// Error type
pub use error::NexusError;

// Traits
pub use traits::{ConsensusStore, NetworkStore, NexusStore, PeriodicTask};
