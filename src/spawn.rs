use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

/// Runs notifier tasks on the browser's event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct MicrotaskSpawner;

impl LocalSpawn for MicrotaskSpawner {
	fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
		wasm_bindgen_futures::spawn_local(future);
		Ok(())
	}
}
