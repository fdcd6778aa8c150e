use std::collections::HashMap;

use super::score::Score;
use crate::corpus::Corpus;

/// Word counts for an order-1 model.
///
/// # Invariants
/// - `total` equals the sum of all counts (token occurrences, not distinct words)
/// - Every stored count is >= 1
#[derive(Clone, Debug, Default)]
pub struct UnigramTable {
	counts: HashMap<String, u64>,
	total: u64,
}

impl UnigramTable {
	/// Counts every token of every sentence. Sentence boundaries are irrelevant here.
	pub fn build(corpus: &Corpus) -> Self {
		let mut table = Self::default();
		for sentence in corpus.sentences() {
			table.add_tokens(sentence);
		}
		table
	}

	/// Adds one occurrence of every token.
	pub fn add_tokens<I, S>(&mut self, tokens: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for token in tokens {
			self.add_word(token.as_ref());
		}
	}

	fn add_word(&mut self, word: &str) {
		match self.counts.get_mut(word) {
			Some(count) => *count += 1,
			None => {
				self.counts.insert(word.to_owned(), 1);
			}
		}
		self.total += 1;
	}

	pub fn count(&self, word: &str) -> Option<u64> {
		self.counts.get(word).copied()
	}

	/// Total number of token occurrences.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct words.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.counts.iter().map(|(word, count)| (word.as_str(), *count))
	}

	/// Relative frequency of `word`; perplexity is its inverse.
	pub fn score(&self, word: &str) -> Score {
		match self.count(word) {
			Some(count) => {
				let probability = count as f64 / self.total as f64;
				Score { perplexity: 1.0 / probability, probability, count }
			}
			None => Score::UNSEEN,
		}
	}
}
