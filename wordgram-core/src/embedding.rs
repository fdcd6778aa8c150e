use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::error::NGramError;
use crate::io::read_lines;

/// Source of semantically similar words.
///
/// Used by the prediction fallback to widen an unseen context. The similarity
/// metric and tie-breaking are the implementor's concern; the returned list is
/// ordered most similar first and holds at most `k` words.
pub trait EmbeddingOracle: Send + Sync {
	fn nearest(&self, word: &str, k: usize) -> Vec<String>;
}

/// Loads an oracle from disk, picking the format from the extension.
///
/// - `.vec`: dense word vectors ([`WordVectors`])
/// - anything else: precomputed neighbor lists ([`NeighborTable`])
pub fn load_oracle<P: AsRef<Path>>(path: P) -> Result<Arc<dyn EmbeddingOracle>, NGramError> {
	let path = path.as_ref();
	if path.extension().is_some_and(|ext| ext == "vec") {
		Ok(Arc::new(WordVectors::from_file(path)?))
	} else {
		Ok(Arc::new(NeighborTable::from_file(path)?))
	}
}

/// Precomputed neighbor lists.
///
/// File format: one line per word, `word n1 n2 n3 ...`, neighbors ordered
/// most similar first. Blank lines are ignored.
#[derive(Clone, Debug, Default)]
pub struct NeighborTable {
	neighbors: HashMap<String, Vec<String>>,
}

impl NeighborTable {
	/// Loads a neighbor table from disk.
	///
	/// # Errors
	/// Returns [`NGramError::Io`] if the file cannot be read.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NGramError> {
		let mut table = Self::default();
		for line in read_lines(&path)? {
			let mut tokens = line.split_whitespace();
			if let Some(word) = tokens.next() {
				table.insert(word, tokens);
			}
		}
		info!("loaded neighbors for {} words from {}", table.neighbors.len(), path.as_ref().display());
		Ok(table)
	}

	/// Registers (or replaces) the neighbors of `word`.
	pub fn insert<I, S>(&mut self, word: &str, neighbors: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.neighbors.insert(word.to_owned(), neighbors.into_iter().map(Into::into).collect());
	}
}

impl EmbeddingOracle for NeighborTable {
	fn nearest(&self, word: &str, k: usize) -> Vec<String> {
		match self.neighbors.get(word) {
			Some(neighbors) => neighbors.iter().take(k).cloned().collect(),
			None => Vec::new(),
		}
	}
}

/// Dense word vectors in the word2vec / fastText `.vec` text format.
///
/// Nearest neighbors are found by brute-force cosine similarity.
///
/// # Invariants
/// - Every vector has the same dimension
/// - Stored vectors are L2-normalized (zero vectors are kept as-is)
#[derive(Clone, Debug, Default)]
pub struct WordVectors {
	words: Vec<String>,
	vectors: Vec<Vec<f32>>,
	index: HashMap<String, usize>,
}

impl WordVectors {
	/// Loads vectors from a `.vec` file.
	///
	/// An optional `count dim` header line is skipped.
	///
	/// # Errors
	/// - [`NGramError::Io`] if the file cannot be read
	/// - [`NGramError::Embedding`] on unparsable values or inconsistent dimensions
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NGramError> {
		let lines = read_lines(&path)?;
		let vectors = Self::parse(lines.iter().map(String::as_str))?;
		info!("loaded {} word vectors from {}", vectors.len(), path.as_ref().display());
		Ok(vectors)
	}

	/// Parses `.vec` lines.
	pub fn parse<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Result<Self, NGramError> {
		let mut this = Self::default();
		let mut dimension = None;

		for (number, line) in lines.into_iter().enumerate() {
			let mut fields = line.split_whitespace();
			let Some(word) = fields.next() else { continue };
			let rest: Vec<&str> = fields.collect();

			// Header: "<count> <dim>"
			if number == 0 && rest.len() == 1 && word.parse::<usize>().is_ok() && rest[0].parse::<usize>().is_ok() {
				continue;
			}

			let values = rest
				.iter()
				.map(|v| v.parse::<f32>())
				.collect::<Result<Vec<f32>, _>>()
				.map_err(|e| NGramError::Embedding { line: number + 1, reason: e.to_string() })?;

			match dimension {
				None => dimension = Some(values.len()),
				Some(d) if d != values.len() => {
					return Err(NGramError::Embedding {
						line: number + 1,
						reason: format!("expected {} components, got {}", d, values.len()),
					});
				}
				Some(_) => (),
			}

			this.insert(word, values);
		}

		Ok(this)
	}

	fn insert(&mut self, word: &str, mut vector: Vec<f32>) {
		let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
		if norm > 0.0 {
			vector.iter_mut().for_each(|v| *v /= norm);
		}
		if let Some(&i) = self.index.get(word) {
			self.vectors[i] = vector;
		} else {
			self.index.insert(word.to_owned(), self.words.len());
			self.words.push(word.to_owned());
			self.vectors.push(vector);
		}
	}

	/// Number of words with a vector.
	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}
}

impl EmbeddingOracle for WordVectors {
	fn nearest(&self, word: &str, k: usize) -> Vec<String> {
		let Some(&target) = self.index.get(word) else {
			return Vec::new();
		};
		let query = &self.vectors[target];

		let mut scored: Vec<(usize, f32)> = self
			.vectors
			.iter()
			.enumerate()
			.filter(|(i, _)| *i != target)
			.map(|(i, v)| (i, v.iter().zip(query).map(|(a, b)| a * b).sum::<f32>()))
			.collect();

		// Stable: equal similarities keep file order
		scored.sort_by(|a, b| b.1.total_cmp(&a.1));

		scored.into_iter().take(k).map(|(i, _)| self.words[i].clone()).collect()
	}
}
