use std::sync::LazyLock;

use regex::Regex;

/// Maps raw typed text to the token format of the corpus.
///
/// Online updates of order >= 2 pass every raw sentence through a `Normalize`
/// before splitting it into windows, so the output must split on whitespace
/// into tokens consistent with how the corpus was preprocessed.
pub trait Normalize: Send + Sync {
	fn normalize(&self, raw: &str) -> String;
}

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"<math.*math>|<ref.*ref>").expect("valid markup pattern")
});
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("valid non-word pattern"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+s?").expect("valid digit pattern"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space pattern"));

/// Default normalizer, matching the corpus preparation rules.
///
/// - `<math>` and `<ref>` spans are removed
/// - non-word characters become spaces
/// - digit runs (and decade suffixes like `1990s`) are removed
/// - whitespace is collapsed and trimmed, text is lowercased
#[derive(Clone, Copy, Debug, Default)]
pub struct TextNormalizer;

impl Normalize for TextNormalizer {
	fn normalize(&self, raw: &str) -> String {
		let text = MARKUP.replace_all(raw, "");
		let text = NON_WORD.replace_all(&text, " ");
		let text = DIGITS.replace_all(&text, "");
		let text = SPACES.replace_all(&text, " ");
		text.trim().to_lowercase()
	}
}

/// Splits already normalized text into owned tokens.
pub fn sentence_tokens(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_punctuation_digits_and_case() {
		let normalizer = TextNormalizer;
		assert_eq!(normalizer.normalize("The Cat, sat!"), "the cat sat");
		assert_eq!(normalizer.normalize("  In the 1990s   there were 42 cats.\n"), "in the there were cats");
	}

	#[test]
	fn drops_markup_spans() {
		let normalizer = TextNormalizer;
		assert_eq!(normalizer.normalize("energy <math>E=mc^2</math> is conserved"), "energy is conserved");
		assert_eq!(normalizer.normalize("a claim<ref>source</ref> here"), "a claim here");
	}

	#[test]
	fn keeps_unicode_letters() {
		assert_eq!(TextNormalizer.normalize("Café Über-alles"), "café über alles");
	}

	#[test]
	fn tokens_ignore_repeated_whitespace() {
		assert_eq!(sentence_tokens(" a  b\tc "), vec!["a", "b", "c"]);
		assert!(sentence_tokens("").is_empty());
	}
}
