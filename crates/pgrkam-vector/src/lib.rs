//! In-memory semantic index over document chunks.
//!
//! `VectorStore` embeds chunks through an injected [`Embedder`], keeps them in
//! a flat inner-product index and answers top-k queries. A rebuild swaps the
//! whole snapshot at once.
//!
//! [`Embedder`]: pgrkam_core::traits::Embedder

pub mod cache;
pub mod flat_index;
pub mod store;

pub use flat_index::FlatIndex;
pub use store::{IndexStats, VectorStore, DEFAULT_EMBED_BATCH};
