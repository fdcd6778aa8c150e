use serde::Serialize;

/// A word observed after some context, with its occurrence count.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Continuation {
	pub word: String,
	pub count: u64,
}

/// Every continuation observed after one context.
///
/// Conceptually a node of the model whose outgoing edges are the words that
/// followed the context, weighted by how often they did.
///
/// ## Responsibilities:
/// - Accumulate continuation occurrences during construction and updates
/// - Rank continuations for prediction
///
/// ## Invariants
/// - At most one entry per distinct word
/// - Every count is strictly positive
/// - A state stored in a table is never empty
#[derive(Serialize, Clone, Debug, Default)]
pub struct State {
	/// Entries in first-occurrence order. Ordering by count only happens at query time.
	continuations: Vec<Continuation>,
}

impl State {
	/// Creates a state holding a single continuation.
	pub(crate) fn with_continuation(word: &str, count: u64) -> Self {
		Self { continuations: vec![Continuation { word: word.to_owned(), count }] }
	}

	/// Records one more occurrence of `word`.
	///
	/// - If the word is already present, its count is increased in place.
	/// - Otherwise a new entry is appended with a count of 1.
	pub(crate) fn add_transition(&mut self, word: &str) {
		match self.continuations.iter_mut().find(|c| c.word == word) {
			Some(continuation) => continuation.count += 1,
			None => self.continuations.push(Continuation { word: word.to_owned(), count: 1 }),
		}
	}

	/// Appends an entry known not to be present yet.
	pub(crate) fn push(&mut self, word: String, count: u64) {
		debug_assert!(self.count(&word).is_none());
		self.continuations.push(Continuation { word, count });
	}

	/// Occurrence count of `word` after this context.
	pub fn count(&self, word: &str) -> Option<u64> {
		self.continuations.iter().find(|c| c.word == word).map(|c| c.count)
	}

	/// Total occurrences of all continuations.
	pub fn total(&self) -> u64 {
		self.continuations.iter().map(|c| c.count).sum()
	}

	/// Continuation words, most frequent first.
	///
	/// The sort is stable: words with equal counts keep their relative storage
	/// order. That order is an implementation detail and must not be relied upon.
	pub fn ranked(&self) -> Vec<String> {
		let mut sorted: Vec<&Continuation> = self.continuations.iter().collect();
		sorted.sort_by(|a, b| b.count.cmp(&a.count));
		sorted.into_iter().map(|c| c.word.clone()).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Continuation> {
		self.continuations.iter()
	}

	pub fn len(&self) -> usize {
		self.continuations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.continuations.is_empty()
	}
}
