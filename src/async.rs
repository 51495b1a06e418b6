use std::any::Any;
use std::cell::Ref;
use std::fmt::Debug;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;

use crate::cell::{Listener, Var};
use crate::error::Error;
use crate::state::AsyncState;
use crate::Notifier;

type Producer<T, E> = Box<dyn Fn() -> LocalBoxFuture<'static, AsyncState<T, E>>>;

/// Publishes the outcome of a future, with a `Loading` state while
/// it is pending.
///
/// Reloads are not serialized: when several are in flight, the one
/// that settles last decides the final state, whichever started last.
pub struct AsyncNotifier<T, E> {
	body: Rc<AsyncBody<T, E>>,
}

pub struct AsyncBody<T, E> {
	state: Var<AsyncState<T, E>>,
	producer: Producer<T, E>,
	spawner: Rc<dyn LocalSpawn>,
	this: Weak<AsyncBody<T, E>>,
}

impl<T, E> Clone for AsyncNotifier<T, E> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T: 'static, E: 'static> From<AsyncNotifier<T, E>> for Rc<dyn Any> {
	fn from(notifier: AsyncNotifier<T, E>) -> Self {
		notifier.body
	}
}

impl<T: 'static, E: 'static> TryFrom<Rc<dyn Any>> for AsyncNotifier<T, E> {
	type Error = Rc<dyn Any>;
	fn try_from(value: Rc<dyn Any>) -> Result<Self, Self::Error> {
		Rc::downcast::<AsyncBody<T, E>>(value).map(|body| AsyncNotifier { body })
	}
}

impl<T, E> AsyncNotifier<T, E>
where
	T: 'static,
	E: 'static,
{
	/// Starts in `Unloaded` and immediately spawns a first reload
	/// on `spawner`.
	pub fn new<F>(
		spawner: impl LocalSpawn + 'static,
		producer: impl Fn() -> F + 'static,
	) -> Result<Self, Error>
	where
		F: Future<Output = AsyncState<T, E>> + 'static,
	{
		let notifier = AsyncNotifier {
			body: Rc::new_cyclic(|this| AsyncBody {
				state: Var::new(AsyncState::Unloaded),
				producer: Box::new(move || producer().boxed_local()) as Producer<T, E>,
				spawner: Rc::new(spawner),
				this: this.clone(),
			}),
		};

		notifier.refresh()?;
		Ok(notifier)
	}

	#[inline]
	pub fn get(&self) -> Ref<'_, AsyncState<T, E>> {
		self.body.state.get()
	}

	/// Publishes `Loading`, starts the producer right away and spawns
	/// the task that publishes its result.
	///
	/// The returned future resolves once the result is published.
	/// Awaiting it is optional, the reload settles either way. A panic
	/// in the producer's future surfaces on the spawner.
	pub fn reload(&self) -> Result<impl Future<Output = ()> + 'static, Error> {
		let settle = self.body.reload();
		let (done, settled) = oneshot::channel::<()>();

		self.body.spawner.spawn_local(async move {
			settle.await;
			let _ = done.send(());
		})?;

		Ok(settled.map(drop))
	}

	/// [`reload`](Self::reload) without a completion signal.
	pub fn refresh(&self) -> Result<(), Error> {
		self.reload().map(drop)
	}

	#[inline]
	pub fn add_listener(&self, listener: Listener) {
		self.body.state.add_listener(listener)
	}

	#[inline]
	pub fn remove_listener(&self, listener: &Listener) {
		self.body.state.remove_listener(listener)
	}
}

impl<T, E> AsyncBody<T, E>
where
	T: 'static,
	E: 'static,
{
	fn reload(&self) -> impl Future<Output = ()> + 'static {
		tracing::trace!("async reload started");
		self.state.set(AsyncState::Loading);

		let future = (self.producer)();
		let this = self.this.clone();

		async move {
			let state = future.await;
			let Some(this) = this.upgrade() else {
				tracing::trace!("async notifier dropped before reload settled");
				return;
			};

			tracing::trace!("async reload settled");
			this.state.set(state);
		}
	}
}

impl<T, E> Notifier for AsyncNotifier<T, E>
where
	T: Clone + 'static,
	E: Clone + 'static,
{
	type State = AsyncState<T, E>;

	fn state(&self) -> Self::State {
		self.body.state.get_cloned()
	}

	fn add_listener(&self, listener: Listener) {
		AsyncNotifier::add_listener(self, listener)
	}

	fn remove_listener(&self, listener: &Listener) {
		AsyncNotifier::remove_listener(self, listener)
	}
}

impl<T, E> Debug for AsyncNotifier<T, E>
where
	T: Debug + 'static,
	E: Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("AsyncNotifier").field(&*self.get()).finish()
	}
}
