//! Observable containers for the load state of synchronous, future-based
//! and stream-based operations.
//!
//! Everything here is single-threaded: values live behind `Rc`/`RefCell`,
//! and asynchronous work runs on a host executor implementing
//! [`LocalSpawn`](futures::task::LocalSpawn). Listeners are called
//! synchronously, once per write, in the order they were added.

pub mod macros;

mod addr;
mod r#async;
mod cell;
mod error;
mod registry;
#[cfg(target_arch = "wasm32")]
mod spawn;
mod state;
mod stream;
mod sync;

pub use cell::{Listener, Var};
pub use error::Error;
pub use r#async::AsyncNotifier;
pub use registry::Registry;
#[cfg(target_arch = "wasm32")]
pub use spawn::MicrotaskSpawner;
pub use state::{AsyncState, StreamState, SyncState, Trace};
pub use stream::StreamNotifier;
pub use sync::SyncNotifier;

/// Something a host can observe: a current state, and listeners called
/// after it changes.
pub trait Notifier {
	type State;

	/// A snapshot of the current state.
	fn state(&self) -> Self::State;

	fn add_listener(&self, listener: Listener);

	/// Removes a listener by identity. Unknown listeners are ignored.
	fn remove_listener(&self, listener: &Listener);
}
