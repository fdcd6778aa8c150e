use wordgram_core::{NGramModel, Normalize};

/// What the user has typed so far, split for prediction.
#[derive(Debug, PartialEq)]
pub struct TypedText {
	/// Complete words before the caret
	pub words: Vec<String>,
	/// Partially typed word at the caret (empty after a space)
	pub partial: String,
}

impl TypedText {
	/// Normalizes raw input and separates the word being typed, if any.
	///
	/// A trailing space means the last word is complete.
	pub fn parse(normalizer: &dyn Normalize, raw: &str) -> Self {
		let normalized = normalizer.normalize(raw);
		let mut words: Vec<String> = normalized.split_whitespace().map(str::to_owned).collect();

		let partial = if raw.ends_with(' ') { None } else { words.pop() };
		Self { words, partial: partial.unwrap_or_default() }
	}
}

/// Up to `limit` next-word completions for `typed`, most likely first.
///
/// The context is the last `n-1` complete words; predictions not starting
/// with the partial word are dropped.
pub fn complete(model: &NGramModel, typed: &TypedText, limit: usize) -> Vec<String> {
	let context_len = model.order().saturating_sub(1);
	if context_len == 0 || typed.words.len() < context_len {
		return Vec::new();
	}

	let context = &typed.words[typed.words.len() - context_len..];
	model
		.predict(context)
		.into_iter()
		.filter(|word| word.starts_with(&typed.partial))
		.take(limit)
		.collect()
}
