use futures::task::SpawnError;

/// Failures of the containers themselves.
///
/// Failures of the wrapped operations never show up here, they are
/// published as the error variant of the notifier's state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("the executor refused to spawn a task: {0}")]
	Spawn(#[from] SpawnError),

	#[error("nothing is registered under `{0}`")]
	Missing(String),

	#[error("`{name}` is not a `{expected}`")]
	TypeMismatch { name: String, expected: &'static str },
}
