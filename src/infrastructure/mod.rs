//! Infrastructure layer module
//!
//! This module contains the in-process building blocks behind the domain
//! ports:
//! - Configuration management
//! - Logging infrastructure
//! - Vector storage (chunking, local embeddings, flat index, snapshots)
//! - Structured output extraction

pub mod config;
pub mod extraction;
pub mod logging;
pub mod vector;
