//! Preference-based job ranking.
//!
//! Catalog rows and the user's preferences are embedded with the same
//! [`Embedder`](pgrkam_core::traits::Embedder) and ranked by dot product.

pub mod catalog;
pub mod ranker;

pub use catalog::{load_catalog, parse_catalog, parse_csv_catalog};
pub use ranker::{job_blob, preference_blob, Recommender};
