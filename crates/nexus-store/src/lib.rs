// crates/nexus-store/src/lib.rs
//
// nexus-store: Storage layer for the NexusLink PoTC simulator.
//
// Provides an in-memory store (the default, and the one tests use), a
// RocksDB-backed store for runs that should survive a restart, and the demo
// data seeding routine that populates either of them.

pub mod memory;
pub mod rocks;
pub mod seed;

// Re-export key types for ergonomic access from downstream crates.
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use seed::{seed_demo_data, SeedSummary};
