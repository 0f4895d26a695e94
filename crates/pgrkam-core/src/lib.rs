//! pgrkam-core
//!
//! Domain types, typed errors and collaborator traits shared by the
//! retrieval, answer-grounding and job-ranking crates, plus the chunker,
//! document sources and configuration loader.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
