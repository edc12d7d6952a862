use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
	#[error(transparent)]
	Snapshot(#[from] techlingo_core::Error),

	#[error("Index snapshot is inconsistent: {0}")]
	Corrupt(String),

	#[error("Query is {chars} characters long, the limit is {max}")]
	QueryTooLong { chars: usize, max: usize },
}
