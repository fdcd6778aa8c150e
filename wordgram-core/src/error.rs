use std::io;

/// Errors raised by model construction, scoring and collaborator loading.
///
/// Unseen contexts or words are never errors: they are reported through
/// [`Score::UNSEEN`](crate::Score::UNSEEN) or an empty prediction list.
#[derive(Debug, thiserror::Error)]
pub enum NGramError {
	#[error("model order must be >= 1, got {0}")]
	InvalidOrder(usize),

	#[error("length mismatch: expected an n-gram of {expected} words, got {actual}")]
	LengthMismatch { expected: usize, actual: usize },

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("config error: {0}")]
	Config(#[from] toml::de::Error),

	#[error("embedding file, line {line}: {reason}")]
	Embedding { line: usize, reason: String },
}
