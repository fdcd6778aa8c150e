use std::cell::OnceCell;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use super::fallback;
use super::frequency_table::FrequencyTable;
use super::score::Score;
use super::unigram::UnigramTable;
use crate::config::{Config, FallbackSettings};
use crate::corpus::Corpus;
use crate::embedding::{EmbeddingOracle, load_oracle};
use crate::error::NGramError;
use crate::text::{Normalize, TextNormalizer, sentence_tokens};

/// Counts backing a model: plain word counts for order 1, contexts otherwise.
#[derive(Clone, Debug)]
enum Table {
	Unigram(UnigramTable),
	Contexts(FrequencyTable),
}

/// A word n-gram model of fixed order `n`.
///
/// # Responsibilities
/// - Build its frequency table from a corpus in a single pass
/// - Score n-grams recursively through a lazily built model of order `n-1`
/// - Predict ranked next words, widening unseen contexts with an embedding oracle
/// - Fold newly typed sentences into its own counts
///
/// # Invariants
/// - `order >= 1`, fixed for the life of the model
/// - The backoff model is built at most once, from the same corpus, and is
///   never touched by [`update`](Self::update)
/// - Tables only grow
///
/// The model is not meant for concurrent use; share it behind a lock.
pub struct NGramModel {
	/// The order of the model (number of words in an n-gram)
	order: usize,

	table: Table,

	/// Sentences the model (and its backoff chain) is built from
	corpus: Arc<Corpus>,

	/// Model of order `n-1`, created on first use
	lower: OnceCell<Box<NGramModel>>,

	normalizer: Arc<dyn Normalize>,

	embedding: Option<Arc<dyn EmbeddingOracle>>,

	fallback: FallbackSettings,
}

impl NGramModel {
	/// Builds a model of order `order` from a corpus.
	///
	/// # Errors
	/// Returns [`NGramError::InvalidOrder`] if `order == 0`.
	pub fn new(corpus: Arc<Corpus>, order: usize) -> Result<Self, NGramError> {
		if order == 0 {
			return Err(NGramError::InvalidOrder(order));
		}
		Ok(Self::build(corpus, order, Arc::new(TextNormalizer)))
	}

	/// Loads a corpus file and builds a model of order `order` from it.
	pub fn from_file<P: AsRef<Path>>(path: P, order: usize) -> Result<Self, NGramError> {
		Self::new(Arc::new(Corpus::from_file(path)?), order)
	}

	/// Builds the model described by a configuration: corpus, order and,
	/// when an embedding file is set, the prediction fallback.
	pub fn from_config(config: &Config) -> Result<Self, NGramError> {
		let model = Self::from_file(&config.corpus, config.order)?;
		match &config.embedding {
			Some(path) => Ok(model.with_embedding(load_oracle(path)?, config.fallback)),
			None => Ok(model),
		}
	}

	fn build(corpus: Arc<Corpus>, order: usize, normalizer: Arc<dyn Normalize>) -> Self {
		let table = if order == 1 {
			let table = UnigramTable::build(&corpus);
			info!("built 1-gram model: {} words, {} occurrences", table.len(), table.total());
			Table::Unigram(table)
		} else {
			let table = FrequencyTable::build(&corpus, order);
			info!("built {}-gram model: {} contexts, {} n-grams", order, table.len(), table.ngram_count());
			Table::Contexts(table)
		};

		Self {
			order,
			table,
			corpus,
			lower: OnceCell::new(),
			normalizer,
			embedding: None,
			fallback: FallbackSettings::default(),
		}
	}

	/// Enables the embedding fallback for unseen prediction contexts.
	pub fn with_embedding(mut self, oracle: Arc<dyn EmbeddingOracle>, settings: FallbackSettings) -> Self {
		self.embedding = Some(oracle);
		self.fallback = settings;
		self
	}

	/// Replaces the normalizer applied by [`update`](Self::update).
	pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalize>) -> Self {
		self.normalizer = normalizer;
		self
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// The normalizer applied to raw sentences by [`update`](Self::update).
	///
	/// Front-ends tokenize typed contexts with it so that queries match what updates store.
	pub fn normalizer(&self) -> &dyn Normalize {
		self.normalizer.as_ref()
	}

	/// Word counts, for an order-1 model.
	pub fn unigrams(&self) -> Option<&UnigramTable> {
		match &self.table {
			Table::Unigram(table) => Some(table),
			Table::Contexts(_) => None,
		}
	}

	/// Context counts, for a model of order >= 2.
	pub fn contexts(&self) -> Option<&FrequencyTable> {
		match &self.table {
			Table::Unigram(_) => None,
			Table::Contexts(table) => Some(table),
		}
	}

	/// Occurrences of `ngram` in this model; 0 if unseen or not of length `n`.
	pub fn count<S: AsRef<str>>(&self, ngram: &[S]) -> u64 {
		if ngram.len() != self.order {
			return 0;
		}
		let ngram = owned(ngram);
		let count = match &self.table {
			Table::Unigram(table) => table.count(&ngram[0]),
			Table::Contexts(table) => {
				let (context, word) = ngram.split_at(self.order - 1);
				table.count(context, &word[0])
			}
		};
		count.unwrap_or(0)
	}

	/// Number of distinct stored n-grams (distinct words for order 1).
	pub fn len(&self) -> usize {
		match &self.table {
			Table::Unigram(table) => table.len(),
			Table::Contexts(table) => table.ngram_count(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The model of order `n-1` used to score contexts.
	///
	/// Built from the same corpus on first call, then reused. `None` for order 1.
	pub fn lower_order(&self) -> Option<&NGramModel> {
		if self.order == 1 {
			return None;
		}
		let lower = self.lower.get_or_init(|| {
			debug!("materializing {}-gram backoff model", self.order - 1);
			Box::new(Self::build(self.corpus.clone(), self.order - 1, self.normalizer.clone()))
		});
		Some(&**lower)
	}

	/// Scores an n-gram.
	///
	/// - Order 1: relative frequency of the word
	/// - Order >= 2: the count of the n-gram, weighted by the probability of its
	///   context under the order `n-1` model divided by the context's count
	///
	/// Unseen n-grams score [`Score::UNSEEN`].
	///
	/// # Errors
	/// Returns [`NGramError::LengthMismatch`] if `ngram` does not hold exactly `n` words.
	pub fn score<S: AsRef<str>>(&self, ngram: &[S]) -> Result<Score, NGramError> {
		if ngram.len() != self.order {
			return Err(NGramError::LengthMismatch { expected: self.order, actual: ngram.len() });
		}
		Ok(self.score_tokens(&owned(ngram)))
	}

	fn score_tokens(&self, ngram: &[String]) -> Score {
		let table = match &self.table {
			Table::Unigram(table) => return table.score(&ngram[0]),
			Table::Contexts(table) => table,
		};

		let Some((word, context)) = ngram.split_last() else {
			return Score::UNSEEN;
		};
		let Some(count) = table.count(context, word) else {
			return Score::UNSEEN;
		};
		let Some(lower) = self.lower_order() else {
			return Score::UNSEEN;
		};

		let context_score = lower.score_tokens(context);
		if !context_score.is_seen() {
			// Only reachable for n-grams added by updates, which the backoff model never sees
			debug!("context {:?} unknown to the {}-gram backoff model", context, self.order - 1);
			return Score::UNSEEN;
		}

		let probability = context_score.probability * count as f64 / context_score.count as f64;
		Score { perplexity: (1.0 / probability).powf(1.0 / self.order as f64), probability, count }
	}

	/// Mean perplexity over every distinct stored n-gram.
	///
	/// Each n-gram type counts once, however often it occurred.
	/// Returns `None` if the model is empty.
	pub fn average_perplexity(&self) -> Option<f64> {
		let (sum, types) = match &self.table {
			Table::Unigram(table) => table
				.iter()
				.fold((0.0, 0usize), |(sum, n), (word, _)| (sum + table.score(word).perplexity, n + 1)),
			Table::Contexts(table) => table.ngrams().fold((0.0, 0usize), |(sum, n), (context, continuation)| {
				let mut ngram = context.to_vec();
				ngram.push(continuation.word.clone());
				(sum + self.score_tokens(&ngram).perplexity, n + 1)
			}),
		};

		if types == 0 {
			return None;
		}
		Some(sum / types as f64)
	}

	/// Predicts the words following `context`, most likely first.
	///
	/// Returns an empty list for order 1 or when `context` does not hold
	/// exactly `n-1` words. An unseen context is retried with neighbor
	/// substitutions when an embedding oracle is configured.
	pub fn predict<S: AsRef<str>>(&self, context: &[S]) -> Vec<String> {
		let table = match &self.table {
			Table::Unigram(_) => return Vec::new(),
			Table::Contexts(table) => table,
		};
		if context.len() != self.order - 1 {
			return Vec::new();
		}

		let context = owned(context);
		if let Some(state) = table.get(&context) {
			return state.ranked();
		}

		match &self.embedding {
			Some(oracle) => fallback::predict(table, &context, oracle.as_ref(), &self.fallback),
			None => Vec::new(),
		}
	}

	/// Folds a newly typed sentence into this model's counts.
	///
	/// - Order 1: `raw` is taken as already tokenized and split on whitespace
	/// - Order >= 2: `raw` is normalized first, then split into windows
	///
	/// The backoff model is left untouched.
	pub fn update(&mut self, raw: &str) {
		let tokens = match self.table {
			Table::Unigram(_) => sentence_tokens(raw),
			Table::Contexts(_) => sentence_tokens(&self.normalizer.normalize(raw)),
		};
		self.update_tokens(&tokens);
	}

	/// Folds an already tokenized sentence into this model's counts.
	pub fn update_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
		match &mut self.table {
			Table::Unigram(table) => table.add_tokens(tokens),
			Table::Contexts(table) => table.add_sentence(tokens),
		}
	}
}

impl fmt::Debug for NGramModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NGramModel")
			.field("order", &self.order)
			.field("table", &self.table)
			.field("sentences", &self.corpus.len())
			.field("lower", &self.lower.get().map(|lower| lower.order))
			.field("embedding", &self.embedding.is_some())
			.field("fallback", &self.fallback)
			.finish()
	}
}

fn owned<S: AsRef<str>>(words: &[S]) -> Vec<String> {
	words.iter().map(|w| w.as_ref().to_owned()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::embedding::NeighborTable;
	use approx::assert_relative_eq;

	fn model(sentences: &[&str], order: usize) -> NGramModel {
		NGramModel::new(Arc::new(Corpus::from_sentences(sentences.iter().copied())), order).unwrap()
	}

	#[test]
	fn order_zero_is_rejected() {
		let err = NGramModel::new(Arc::new(Corpus::default()), 0).unwrap_err();
		assert!(matches!(err, NGramError::InvalidOrder(0)));
	}

	#[test]
	fn bigram_score_telescopes_to_unigram_frequency() {
		let model = model(&["the cat sat", "the cat ran"], 2);
		let score = model.score(&["the", "cat"]).unwrap();

		// P(the) = 2/6, count(the cat) / count(the) = 2/2
		assert_eq!(score.count, 2);
		assert_relative_eq!(score.probability, 1.0 / 3.0);
		assert_relative_eq!(score.perplexity, 3.0_f64.sqrt());
	}

	#[test]
	fn trigram_score_recurses_through_two_orders() {
		let model = model(&["a b c", "a b d", "b c"], 3);
		let score = model.score(&["a", "b", "c"]).unwrap();

		// P(a) = 2/8; P(a b) = 2/8 * 2/2; P(a b c) = 2/8 * 1/2
		assert_eq!(score.count, 1);
		assert_relative_eq!(score.probability, 0.125);
		assert_relative_eq!(score.perplexity, 8.0_f64.powf(1.0 / 3.0));
		assert_eq!(model.lower_order().map(NGramModel::order), Some(2));
		assert_eq!(model.lower_order().and_then(NGramModel::lower_order).map(NGramModel::order), Some(1));
	}

	#[test]
	fn backoff_model_is_built_once() {
		let model = model(&["a b c"], 3);
		assert!(model.lower.get().is_none());

		model.score(&["a", "b", "c"]).unwrap();
		let first = model.lower.get().map(|lower| &**lower as *const NGramModel);
		model.score(&["a", "b", "c"]).unwrap();
		let second = model.lower.get().map(|lower| &**lower as *const NGramModel);

		assert!(first.is_some());
		assert_eq!(first, second);
	}

	#[test]
	fn unseen_and_wrong_length() {
		let model = model(&["the cat sat"], 2);

		assert_eq!(model.score(&["the", "dog"]).unwrap(), Score::UNSEEN);
		assert_eq!(model.score(&["a", "cat"]).unwrap(), Score::UNSEEN);
		assert!(matches!(
			model.score(&["the"]),
			Err(NGramError::LengthMismatch { expected: 2, actual: 1 })
		));
		// Unseen n-grams never materialize the backoff model
		assert!(model.lower.get().is_none());
	}

	#[test]
	fn predict_ranks_by_count() {
		let model = model(&["x a", "x b", "x a", "x c", "x b", "x a"], 2);
		assert_eq!(model.predict(&["x"]), vec!["a", "b", "c"]);
		assert!(model.predict(&["y"]).is_empty());
		assert!(model.predict(&["x", "a"]).is_empty());
	}

	#[test]
	fn unigram_model_has_no_predictions() {
		let model = model(&["x a"], 1);
		assert!(model.predict::<&str>(&[]).is_empty());
		assert!(model.lower_order().is_none());
	}

	#[test]
	fn fallback_uses_neighbors_of_unseen_context() {
		let mut oracle = NeighborTable::default();
		oracle.insert("kitten", ["cat", "dog"]);

		let model = model(&["the cat sat", "a cat ran", "a cat ran"], 2)
			.with_embedding(Arc::new(oracle), FallbackSettings::default());

		assert_eq!(model.predict(&["kitten"]), vec!["ran", "sat"]);
		assert!(model.predict(&["puppy"]).is_empty());
	}

	#[test]
	fn update_touches_only_the_live_order() {
		let mut model = model(&["the cat sat"], 2);
		model.score(&["the", "cat"]).unwrap();

		model.update("The dog, sat!");

		assert_eq!(model.count(&["the", "dog"]), 1);
		assert_eq!(model.count(&["dog", "sat"]), 1);
		let lower = model.lower_order().unwrap();
		assert_eq!(lower.count(&["dog"]), 0);

		// The backoff model never saw "dog": the new bigram cannot be scored
		assert_eq!(model.score(&["dog", "sat"]).unwrap(), Score::UNSEEN);
		assert!(model.score(&["the", "dog"]).unwrap().is_seen());
	}

	#[test]
	fn updated_ngram_unknown_to_backoff_makes_the_average_infinite() {
		let mut model = model(&["the cat sat"], 2);
		assert_relative_eq!(model.average_perplexity().unwrap(), 3.0_f64.sqrt());

		model.update("dog barked");

		assert_eq!(model.average_perplexity(), Some(f64::INFINITY));
	}

	struct Shouting;

	impl Normalize for Shouting {
		fn normalize(&self, raw: &str) -> String {
			raw.to_uppercase()
		}
	}

	#[test]
	fn update_uses_the_installed_normalizer() {
		let mut model = model(&["THE CAT SAT"], 2).with_normalizer(Arc::new(Shouting));
		model.update("the cat ran");

		assert_eq!(model.count(&["CAT", "RAN"]), 1);
		assert_eq!(model.count(&["cat", "ran"]), 0);
		assert_eq!(model.normalizer().normalize("the dog"), "THE DOG");
		assert_eq!(model.predict(&["CAT"]), vec!["SAT", "RAN"]);
	}

	#[test]
	fn unigram_update_does_not_normalize() {
		let mut model = model(&["a b"], 1);
		model.update("a A!");

		assert_eq!(model.count(&["a"]), 2);
		assert_eq!(model.count(&["A!"]), 1);
		assert_eq!(model.unigrams().map(UnigramTable::total), Some(4));
	}

	#[test]
	fn average_is_a_macro_average_over_types() {
		let model = model(&["a b", "a b", "a b", "c d"], 2);

		let p1 = model.score(&["a", "b"]).unwrap().perplexity;
		let p2 = model.score(&["c", "d"]).unwrap().perplexity;
		assert_relative_eq!(model.average_perplexity().unwrap(), (p1 + p2) / 2.0);
	}

	#[test]
	fn empty_model_has_no_average() {
		assert_eq!(model(&[], 1).average_perplexity(), None);
		assert_eq!(model(&["too short"], 3).average_perplexity(), None);
	}
}
