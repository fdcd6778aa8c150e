use std::path::Path;

use log::info;

use crate::error::NGramError;
use crate::io::read_lines;

/// An immutable collection of already segmented sentences.
///
/// One sentence per entry; tokens are whitespace separated. A model and every
/// member of its backoff chain share the same `Corpus` (behind an `Arc`), so
/// lower orders are always built from exactly the sentences the top order saw.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
	sentences: Vec<String>,
}

impl Corpus {
	/// Loads a corpus from a UTF-8 text file, one sentence per line.
	///
	/// # Errors
	/// Returns [`NGramError::Io`] if the file cannot be read.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NGramError> {
		let sentences = read_lines(&path)?;
		info!("loaded {} sentences from {}", sentences.len(), path.as_ref().display());
		Ok(Self { sentences })
	}

	/// Builds a corpus from in-memory sentences.
	pub fn from_sentences<I, S>(sentences: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { sentences: sentences.into_iter().map(Into::into).collect() }
	}

	/// Iterates over the sentences, each one as an iterator of tokens.
	///
	/// Empty lines yield no tokens.
	pub fn sentences(&self) -> impl Iterator<Item = impl Iterator<Item = &str>> {
		self.sentences.iter().map(|s| s.split_whitespace())
	}

	/// Number of sentences (including empty lines).
	pub fn len(&self) -> usize {
		self.sentences.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sentences.is_empty()
	}
}
