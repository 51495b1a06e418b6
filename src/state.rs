//! Closed sets of load states published by the notifiers.

use std::backtrace::Backtrace;
use std::fmt::{Debug, Display};
use std::rc::Rc;

/// State of an operation that runs to completion in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncState<T, E> {
	Unloaded,
	Loaded(T),
	Error(E),
}

/// State of an operation backed by a future.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsyncState<T, E> {
	Unloaded,
	Loading,
	Loaded(T),
	Error(E),
}

/// State of a subscription to a stream of values.
///
/// `Error` is not terminal, the source may keep emitting after it.
/// `Complete` is, and carries the last loaded value if there was one.
#[derive(Debug, Clone)]
pub enum StreamState<T, E> {
	Unloaded,
	Loading,
	Loaded(T),
	Error { error: E, trace: Trace },
	Complete(Option<T>),
}

/// Where a stream error was observed.
///
/// Captured with [`Backtrace::capture`], so it is only populated when
/// backtraces are enabled for the process. Two traces always compare equal.
#[derive(Clone)]
pub struct Trace(Rc<Backtrace>);

impl Trace {
	pub fn capture() -> Self {
		Trace(Rc::new(Backtrace::capture()))
	}

	pub fn backtrace(&self) -> &Backtrace {
		&self.0
	}
}

impl Debug for Trace {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Trace").field(&self.0.status()).finish()
	}
}

impl Display for Trace {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&*self.0, f)
	}
}

impl PartialEq for Trace {
	fn eq(&self, _: &Self) -> bool {
		true
	}
}

impl Eq for Trace {}

impl<T: PartialEq, E: PartialEq> PartialEq for StreamState<T, E> {
	fn eq(&self, other: &Self) -> bool {
		use StreamState::*;
		match (self, other) {
			(Unloaded, Unloaded) | (Loading, Loading) => true,
			(Loaded(a), Loaded(b)) => a == b,
			(Error { error: a, .. }, Error { error: b, .. }) => a == b,
			(Complete(a), Complete(b)) => a == b,
			_ => false,
		}
	}
}

impl<T: Eq, E: Eq> Eq for StreamState<T, E> {}

impl<T, E> Default for SyncState<T, E> {
	fn default() -> Self {
		SyncState::Unloaded
	}
}

impl<T, E> Default for AsyncState<T, E> {
	fn default() -> Self {
		AsyncState::Unloaded
	}
}

impl<T, E> Default for StreamState<T, E> {
	fn default() -> Self {
		StreamState::Unloaded
	}
}

impl<T, E> From<Result<T, E>> for SyncState<T, E> {
	fn from(result: Result<T, E>) -> Self {
		match result {
			Ok(value) => SyncState::Loaded(value),
			Err(error) => SyncState::Error(error),
		}
	}
}

impl<T, E> From<Result<T, E>> for AsyncState<T, E> {
	fn from(result: Result<T, E>) -> Self {
		match result {
			Ok(value) => AsyncState::Loaded(value),
			Err(error) => AsyncState::Error(error),
		}
	}
}

impl<T, E> SyncState<T, E> {
	pub fn is_unloaded(&self) -> bool {
		matches!(self, SyncState::Unloaded)
	}

	pub fn is_loaded(&self) -> bool {
		matches!(self, SyncState::Loaded(_))
	}

	pub fn is_error(&self) -> bool {
		matches!(self, SyncState::Error(_))
	}

	pub fn value(&self) -> Option<&T> {
		match self {
			SyncState::Loaded(value) => Some(value),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&E> {
		match self {
			SyncState::Error(error) => Some(error),
			_ => None,
		}
	}

	pub fn map<U>(self, func: impl FnOnce(T) -> U) -> SyncState<U, E> {
		match self {
			SyncState::Unloaded => SyncState::Unloaded,
			SyncState::Loaded(value) => SyncState::Loaded(func(value)),
			SyncState::Error(error) => SyncState::Error(error),
		}
	}

	pub fn map_err<F>(self, func: impl FnOnce(E) -> F) -> SyncState<T, F> {
		match self {
			SyncState::Unloaded => SyncState::Unloaded,
			SyncState::Loaded(value) => SyncState::Loaded(value),
			SyncState::Error(error) => SyncState::Error(func(error)),
		}
	}
}

impl<T, E> AsyncState<T, E> {
	pub fn is_unloaded(&self) -> bool {
		matches!(self, AsyncState::Unloaded)
	}

	pub fn is_loading(&self) -> bool {
		matches!(self, AsyncState::Loading)
	}

	pub fn is_loaded(&self) -> bool {
		matches!(self, AsyncState::Loaded(_))
	}

	pub fn is_error(&self) -> bool {
		matches!(self, AsyncState::Error(_))
	}

	pub fn value(&self) -> Option<&T> {
		match self {
			AsyncState::Loaded(value) => Some(value),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&E> {
		match self {
			AsyncState::Error(error) => Some(error),
			_ => None,
		}
	}

	pub fn map<U>(self, func: impl FnOnce(T) -> U) -> AsyncState<U, E> {
		match self {
			AsyncState::Unloaded => AsyncState::Unloaded,
			AsyncState::Loading => AsyncState::Loading,
			AsyncState::Loaded(value) => AsyncState::Loaded(func(value)),
			AsyncState::Error(error) => AsyncState::Error(error),
		}
	}

	pub fn map_err<F>(self, func: impl FnOnce(E) -> F) -> AsyncState<T, F> {
		match self {
			AsyncState::Unloaded => AsyncState::Unloaded,
			AsyncState::Loading => AsyncState::Loading,
			AsyncState::Loaded(value) => AsyncState::Loaded(value),
			AsyncState::Error(error) => AsyncState::Error(func(error)),
		}
	}
}

impl<T, E> StreamState<T, E> {
	pub fn is_unloaded(&self) -> bool {
		matches!(self, StreamState::Unloaded)
	}

	pub fn is_loading(&self) -> bool {
		matches!(self, StreamState::Loading)
	}

	pub fn is_loaded(&self) -> bool {
		matches!(self, StreamState::Loaded(_))
	}

	pub fn is_error(&self) -> bool {
		matches!(self, StreamState::Error { .. })
	}

	pub fn is_complete(&self) -> bool {
		matches!(self, StreamState::Complete(_))
	}

	/// The payload of a `Loaded` state.
	pub fn loaded_value(&self) -> Option<&T> {
		match self {
			StreamState::Loaded(value) => Some(value),
			_ => None,
		}
	}

	/// The latest known value: a `Loaded` payload, or the one
	/// a `Complete` state kept.
	pub fn value(&self) -> Option<&T> {
		match self {
			StreamState::Loaded(value) => Some(value),
			StreamState::Complete(last) => last.as_ref(),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&E> {
		match self {
			StreamState::Error { error, .. } => Some(error),
			_ => None,
		}
	}

	pub fn map<U>(self, func: impl FnOnce(T) -> U) -> StreamState<U, E> {
		match self {
			StreamState::Unloaded => StreamState::Unloaded,
			StreamState::Loading => StreamState::Loading,
			StreamState::Loaded(value) => StreamState::Loaded(func(value)),
			StreamState::Error { error, trace } => StreamState::Error { error, trace },
			StreamState::Complete(last) => StreamState::Complete(last.map(func)),
		}
	}
}
