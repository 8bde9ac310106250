// crates/nexus-rpc/src/handlers/mod.rs
//
// Handler modules for the `/api` routes.
// Each module defines request/response types and handler functions
// for one API group.

pub mod cli;
pub mod consensus;
pub mod network;
pub mod validators;
