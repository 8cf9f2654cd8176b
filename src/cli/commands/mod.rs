//! CLI command implementations.

pub mod chunk;
pub mod generate;
pub mod index;
pub mod search;
