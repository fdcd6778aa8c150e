use log::{debug, warn};

use super::frequency_table::FrequencyTable;
use crate::config::FallbackSettings;
use crate::embedding::EmbeddingOracle;

/// Builds one candidate list per context position: the original word
/// followed by its nearest neighbors.
fn candidate_lists(context: &[String], oracle: &dyn EmbeddingOracle, k: usize) -> Vec<Vec<String>> {
	context
		.iter()
		.map(|word| {
			let mut candidates = vec![word.clone()];
			candidates.extend(oracle.nearest(word, k));
			candidates
		})
		.collect()
}

/// Number of combinations to enumerate: `radix^positions`, capped at `cap`.
fn combination_count(radix: usize, positions: usize, cap: usize) -> usize {
	u32::try_from(positions)
		.ok()
		.and_then(|p| radix.checked_pow(p))
		.map_or(cap, |count| count.min(cap))
}

/// Substituted context for combination `index`.
///
/// Position `j` takes `candidates[j][digit_j]` with
/// `digit_j = (index / radix^j) mod radix`.
/// Returns `None` if a position has fewer than `digit_j + 1` candidates.
fn combination(candidates: &[Vec<String>], radix: usize, index: usize) -> Option<Vec<String>> {
	let mut rest = index;
	candidates
		.iter()
		.map(|list| {
			let digit = rest % radix;
			rest /= radix;
			list.get(digit).cloned()
		})
		.collect()
}

/// Predicts from the first known context among the neighbor substitutions of `context`.
///
/// Combinations are tried in increasing index order and the first one that is a
/// known context wins; no better match is searched for. The radix is the length
/// of the first position's candidate list. If another position runs out of
/// candidates the enumeration stops with no prediction.
pub(crate) fn predict(
	table: &FrequencyTable,
	context: &[String],
	oracle: &dyn EmbeddingOracle,
	settings: &FallbackSettings,
) -> Vec<String> {
	let candidates = candidate_lists(context, oracle, settings.neighbors);
	let radix = match candidates.first() {
		Some(first) => first.len(),
		None => return Vec::new(),
	};

	let count = combination_count(radix, candidates.len(), settings.max_combinations);
	if radix.checked_pow(candidates.len() as u32).is_none_or(|full| full > count) {
		warn!("fallback enumeration capped at {} combinations", count);
	}

	for index in 0..count {
		let Some(substituted) = combination(&candidates, radix, index) else {
			warn!("irregular neighbor lists (radix {}), fallback stopped at combination {}", radix, index);
			return Vec::new();
		};
		if let Some(state) = table.get(&substituted) {
			debug!("fallback matched {:?} for {:?} at combination {}", substituted, context, index);
			return state.ranked();
		}
	}

	debug!("fallback found no known context for {:?}", context);
	Vec::new()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::corpus::Corpus;
	use crate::embedding::NeighborTable;

	fn words(list: &[&str]) -> Vec<String> {
		list.iter().map(|w| (*w).to_owned()).collect()
	}

	#[test]
	fn digits_are_little_endian_mixed_radix() {
		let candidates = vec![words(&["a0", "a1", "a2"]), words(&["b0", "b1", "b2"])];

		assert_eq!(combination(&candidates, 3, 0), Some(words(&["a0", "b0"])));
		assert_eq!(combination(&candidates, 3, 1), Some(words(&["a1", "b0"])));
		assert_eq!(combination(&candidates, 3, 3), Some(words(&["a0", "b1"])));
		assert_eq!(combination(&candidates, 3, 8), Some(words(&["a2", "b2"])));
	}

	#[test]
	fn short_list_ends_the_combination() {
		let candidates = vec![words(&["a0", "a1"]), words(&["b0"])];
		assert_eq!(combination(&candidates, 2, 1), Some(words(&["a1", "b0"])));
		assert_eq!(combination(&candidates, 2, 2), None);
	}

	#[test]
	fn count_is_capped() {
		assert_eq!(combination_count(11, 2, 100_000), 121);
		assert_eq!(combination_count(11, 4, 1_000), 1_000);
		assert_eq!(combination_count(usize::MAX, 3, 50), 50);
	}

	#[test]
	fn first_match_in_index_order_wins() {
		// ("large", "cat") is combination 2 and ("big", "dog") combination 4.
		// A lexicographic walk would have reached ("big", "dog") first.
		let corpus = Corpus::from_sentences(["big dog barks", "large cat meows"]);
		let table = FrequencyTable::build(&corpus, 3);

		let mut oracle = NeighborTable::default();
		oracle.insert("huge", ["big", "large"]);
		oracle.insert("cat", ["dog", "kitten"]);

		let settings = FallbackSettings::default();
		let context = words(&["huge", "cat"]);
		assert_eq!(predict(&table, &context, &oracle, &settings), vec!["meows"]);
	}

	#[test]
	fn enumeration_respects_the_cap() {
		let corpus = Corpus::from_sentences(["large cat meows"]);
		let table = FrequencyTable::build(&corpus, 3);

		let mut oracle = NeighborTable::default();
		oracle.insert("huge", ["big", "large"]);
		oracle.insert("cat", ["dog", "kitten"]);

		let context = words(&["huge", "cat"]);
		let capped = FallbackSettings { neighbors: 10, max_combinations: 2 };
		assert!(predict(&table, &context, &oracle, &capped).is_empty());

		let enough = FallbackSettings { neighbors: 10, max_combinations: 3 };
		assert_eq!(predict(&table, &context, &oracle, &enough), vec!["meows"]);
	}

	#[test]
	fn irregular_lists_stop_the_enumeration() {
		let corpus = Corpus::from_sentences(["big kitten purrs"]);
		let table = FrequencyTable::build(&corpus, 3);

		// "cat" has no neighbors: radix 3 from "huge", but position 1 only has one candidate.
		let mut oracle = NeighborTable::default();
		oracle.insert("huge", ["big", "large"]);

		let context = words(&["huge", "cat"]);
		assert!(predict(&table, &context, &oracle, &FallbackSettings::default()).is_empty());
	}
}
