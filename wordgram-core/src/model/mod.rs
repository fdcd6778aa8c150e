//! N-gram modeling engine.
//!
//! - Frequency tables for a single order (`UnigramTable`, `FrequencyTable`)
//! - The model tying a table to its lazily built backoff chain (`NGramModel`)
//! - Scoring results (`Score`)
//! - The embedding-assisted prediction fallback (internal)

/// Fixed-order word model: construction, scoring, prediction, updates.
pub mod ngram_model;

/// Continuation counts of order >= 2.
pub mod frequency_table;

/// Word counts of order 1.
pub mod unigram;

/// Perplexity / probability / count triple returned by scoring.
pub mod score;

/// Continuations observed after a single context.
pub mod state;

/// Neighbor substitution search for unseen contexts.
/// This module is not exposed publicly.
mod fallback;
