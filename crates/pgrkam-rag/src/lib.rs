//! Grounded question answering over a [`VectorStore`].
//!
//! Retrieval hits become a citation-annotated context block; the
//! [`AnswerSynthesizer`] either refuses (nothing retrieved) or asks the
//! completion provider to answer from that context only.
//!
//! [`VectorStore`]: pgrkam_vector::VectorStore

pub mod context;
pub mod intent;
pub mod language;
pub mod prompts;
pub mod provider;
pub mod synthesizer;

pub use context::{assemble, AssembledContext};
pub use intent::{classify_intent, Intent};
pub use language::{detect_language, Language};
pub use provider::ChatCompletionsProvider;
pub use synthesizer::{general_answer, Answer, AnswerSynthesizer, refusal_message};
