//! Word-level n-gram language model.
//!
//! This crate provides the statistical engine behind a predictive keyboard:
//! - Frequency tables counting word sequences of a fixed order
//! - Recursive probability / perplexity scoring through a lazily built backoff chain
//! - Ranked next-word prediction, widened with an embedding oracle when a context is unseen
//! - Online updates from newly typed sentences
//!
//! The corpus reader, text normalizer and embedding oracles are thin collaborators
//! kept here so the front-ends have something to plug in.

/// Runtime configuration (TOML).
pub mod config;

/// Sentence corpus shared by a model and its backoff chain.
pub mod corpus;

/// Nearest-neighbor oracles used by the prediction fallback.
pub mod embedding;

/// Error type shared by the whole crate.
pub mod error;

/// N-gram tables, scoring, prediction and updates.
pub mod model;

/// Text normalization applied to raw input before it reaches the model.
pub mod text;

/// File helpers.
///
/// Not exposed
pub(crate) mod io;

pub use config::{Config, FallbackSettings};
pub use corpus::Corpus;
pub use embedding::{EmbeddingOracle, NeighborTable, WordVectors, load_oracle};
pub use error::NGramError;
pub use model::ngram_model::NGramModel;
pub use model::score::Score;
pub use text::{Normalize, TextNormalizer};
