//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors)
//! - `diagnosis` - Issue reports, tool catalogs, conversations and loop outcomes

pub mod diagnosis;
pub mod foundation;
