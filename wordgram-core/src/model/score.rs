use serde::Serialize;

/// Result of scoring one n-gram.
///
/// `probability` telescopes through every lower order down to unigram
/// frequencies: it is the n-gram count weighted by the lower-order probability
/// of its context, not a normalized conditional probability. `perplexity` is
/// `(1 / probability)^(1 / n)`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Score {
	pub perplexity: f64,
	pub probability: f64,
	/// Occurrences of the n-gram in the model.
	pub count: u64,
}

impl Score {
	/// Score of an n-gram the model has never seen.
	pub const UNSEEN: Score = Score { perplexity: f64::INFINITY, probability: 0.0, count: 0 };

	pub fn is_seen(&self) -> bool {
		self.count > 0
	}
}
