use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::NGramError;
use crate::io::read_text;

/// Settings for the embedding-assisted prediction fallback.
///
/// # Invariants
/// - `max_combinations` bounds the `M^(n-1)` enumeration; combinations past
///   the bound are never tried.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct FallbackSettings {
	/// Number of nearest neighbors requested for every context word.
	pub neighbors: usize,

	/// Upper bound on substitution combinations tried for one prediction.
	pub max_combinations: usize,
}

impl Default for FallbackSettings {
	fn default() -> Self {
		Self { neighbors: 10, max_combinations: 100_000 }
	}
}

/// Address the HTTP front-end binds to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self { host: "127.0.0.1".to_owned(), port: 5000 }
	}
}

/// Runtime configuration shared by the front-ends.
///
/// Every field is optional in the TOML file; missing ones take their default.
///
/// ```toml
/// corpus = "data/sentences.txt"
/// order = 3
/// embedding = "data/neighbors.txt"
///
/// [fallback]
/// neighbors = 5
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
	/// Sentence file the model is built from.
	pub corpus: PathBuf,

	/// Model order (`n`).
	pub order: usize,

	/// Optional neighbor table or word-vector file.
	pub embedding: Option<PathBuf>,

	/// Completions shown per request.
	pub suggestions: usize,

	pub fallback: FallbackSettings,

	pub server: ServerSettings,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			corpus: PathBuf::from("data/sentences.txt"),
			order: 3,
			embedding: None,
			suggestions: 3,
			fallback: FallbackSettings::default(),
			server: ServerSettings::default(),
		}
	}
}

impl Config {
	/// Loads a configuration file.
	///
	/// # Errors
	/// - [`NGramError::Io`] if the file cannot be read
	/// - [`NGramError::Config`] if it is not valid TOML for this structure
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NGramError> {
		Self::parse(&read_text(path)?)
	}

	/// Parses a configuration from TOML text.
	pub fn parse(text: &str) -> Result<Self, NGramError> {
		Ok(toml::from_str(text)?)
	}
}
