use std::collections::HashMap;

use super::state::{Continuation, State};
use crate::corpus::Corpus;

/// Continuation counts for a model of order `n >= 2`.
///
/// Maps every observed context (`n-1` words) to the words that followed it.
///
/// # Invariants
/// - `order >= 2`
/// - Every key has exactly `order - 1` words
/// - Every stored [`State`] holds at least one continuation
/// - A count equals the occurrences of its (context, word) pair during
///   construction plus every later update
#[derive(Clone, Debug)]
pub struct FrequencyTable {
	order: usize,
	states: HashMap<Vec<String>, State>,
}

impl FrequencyTable {
	/// Builds the table from a corpus.
	///
	/// A window of `order` words slides over each sentence with stride 1;
	/// windows never cross sentence boundaries and sentences shorter than
	/// `order` contribute nothing.
	///
	/// Counting is done in two phases: n-grams are counted first (in
	/// first-occurrence order), then distributed to their contexts. A context
	/// is therefore only ever inserted together with its first continuation.
	pub(crate) fn build(corpus: &Corpus, order: usize) -> Self {
		debug_assert!(order >= 2);

		let mut index: HashMap<Vec<String>, usize> = HashMap::new();
		let mut ngrams: Vec<(Vec<String>, u64)> = Vec::new();

		for sentence in corpus.sentences() {
			let tokens: Vec<&str> = sentence.collect();
			for window in tokens.windows(order) {
				let ngram: Vec<String> = window.iter().map(|t| (*t).to_owned()).collect();
				match index.get(&ngram) {
					Some(&i) => ngrams[i].1 += 1,
					None => {
						index.insert(ngram.clone(), ngrams.len());
						ngrams.push((ngram, 1));
					}
				}
			}
		}
		drop(index);

		let mut states: HashMap<Vec<String>, State> = HashMap::new();
		for (mut context, count) in ngrams {
			// Windows always hold `order` words
			let Some(word) = context.pop() else { continue };
			states.entry(context).or_default().push(word, count);
		}

		Self { order, states }
	}

	/// Folds one tokenized sentence into the table, window by window.
	pub(crate) fn add_sentence<S: AsRef<str>>(&mut self, tokens: &[S]) {
		for window in tokens.windows(self.order) {
			let Some((word, context)) = window.split_last() else { continue };
			let context: Vec<String> = context.iter().map(|t| t.as_ref().to_owned()).collect();
			self.add_window(context, word.as_ref());
		}
	}

	/// Records one occurrence of `word` after `context`.
	///
	/// - New context: inserted with the single entry `(word, 1)`
	/// - Known context: the entry is incremented in place, or appended with count 1
	fn add_window(&mut self, context: Vec<String>, word: &str) {
		match self.states.get_mut(&context) {
			Some(state) => state.add_transition(word),
			None => {
				self.states.insert(context, State::with_continuation(word, 1));
			}
		}
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Continuations observed after `context`, if any.
	pub fn get(&self, context: &[String]) -> Option<&State> {
		self.states.get(context)
	}

	/// Occurrences of `word` after `context`.
	pub fn count(&self, context: &[String], word: &str) -> Option<u64> {
		self.get(context)?.count(word)
	}

	/// Iterates over every stored (context, continuation) pair.
	pub fn ngrams(&self) -> impl Iterator<Item = (&[String], &Continuation)> {
		self.states
			.iter()
			.flat_map(|(context, state)| state.iter().map(move |c| (context.as_slice(), c)))
	}

	/// Iterates over every context and its state.
	pub fn contexts(&self) -> impl Iterator<Item = (&[String], &State)> {
		self.states.iter().map(|(context, state)| (context.as_slice(), state))
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Number of distinct (context, word) pairs.
	pub fn ngram_count(&self) -> usize {
		self.states.values().map(State::len).sum()
	}
}
