// crates/nexus-cli/src/commands/mod.rs
//
// Command module declarations for the NexusLink CLI.

pub mod consensus;
pub mod exec;
pub mod network;
pub mod validators;
