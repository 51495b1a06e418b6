use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use futures::future::{AbortHandle, Abortable};
use futures::stream::LocalBoxStream;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::{Stream, StreamExt};

use crate::cell::{Listener, Var};
use crate::error::Error;
use crate::state::{StreamState, Trace};
use crate::Notifier;

type Source<T, E> = Box<dyn Fn() -> LocalBoxStream<'static, Result<StreamState<T, E>, E>>>;

/// Publishes everything a stream emits.
///
/// Each subscription asks `source` for a fresh stream. Its `Ok` items
/// are published as they are, so the source decides how values are
/// wrapped (usually [`StreamState::Loaded`]). `Err` items become
/// [`StreamState::Error`] and the subscription carries on; the end of
/// the stream becomes [`StreamState::Complete`].
///
/// Owners call [`dispose`](StreamNotifier::dispose) when they are done.
/// Dropping the last handle cancels the subscription as well.
pub struct StreamNotifier<T, E> {
	body: Rc<StreamBody<T, E>>,
}

pub struct StreamBody<T, E> {
	state: Var<StreamState<T, E>>,
	source: Source<T, E>,
	spawner: Rc<dyn LocalSpawn>,
	subscription: RefCell<Option<Subscription>>,
	generation: Cell<u64>,
	this: Weak<StreamBody<T, E>>,
}

#[derive(Debug)]
struct Subscription {
	generation: u64,
	handle: AbortHandle,
}

impl Subscription {
	fn cancel(self) {
		tracing::debug!(generation = self.generation, "stream subscription cancelled");
		self.handle.abort();
	}
}

impl<T, E> Clone for StreamNotifier<T, E> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T: 'static, E: 'static> From<StreamNotifier<T, E>> for Rc<dyn Any> {
	fn from(notifier: StreamNotifier<T, E>) -> Self {
		notifier.body
	}
}

impl<T: 'static, E: 'static> TryFrom<Rc<dyn Any>> for StreamNotifier<T, E> {
	type Error = Rc<dyn Any>;
	fn try_from(value: Rc<dyn Any>) -> Result<Self, Self::Error> {
		Rc::downcast::<StreamBody<T, E>>(value).map(|body| StreamNotifier { body })
	}
}

impl<T, E> StreamNotifier<T, E>
where
	T: Clone + 'static,
	E: 'static,
{
	/// Subscribes to a first stream from `source` right away.
	pub fn new<S>(
		spawner: impl LocalSpawn + 'static,
		source: impl Fn() -> S + 'static,
	) -> Result<Self, Error>
	where
		S: Stream<Item = Result<StreamState<T, E>, E>> + 'static,
	{
		let notifier = StreamNotifier {
			body: Rc::new_cyclic(|this| StreamBody {
				state: Var::new(StreamState::Unloaded),
				source: Box::new(move || source().boxed_local()) as Source<T, E>,
				spawner: Rc::new(spawner),
				subscription: RefCell::new(None),
				generation: Cell::new(0),
				this: this.clone(),
			}),
		};

		notifier.body.listen()?;
		Ok(notifier)
	}

	#[inline]
	pub fn get(&self) -> Ref<'_, StreamState<T, E>> {
		self.body.state.get()
	}

	/// Drops the current subscription and starts over with a new
	/// stream from the source.
	pub fn reload(&self) -> Result<(), Error> {
		self.body.listen()
	}

	/// Cancels the subscription and releases every listener.
	///
	/// Calling it again, or after the stream completed, does nothing
	/// beyond that.
	pub fn dispose(&self) {
		tracing::debug!("stream notifier disposed");
		self.body.cancel();
		self.body.state.clear_listeners();
	}

	/// Whether a subscription is live. It ends on cancellation and when
	/// the stream completes.
	pub fn is_subscribed(&self) -> bool {
		self.body.subscription.borrow().is_some()
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

impl<T, E> StreamBody<T, E>
where
	T: Clone + 'static,
	E: 'static,
{
	fn listen(&self) -> Result<(), Error> {
		self.cancel();
		self.state.set(StreamState::Unloaded);

		let generation = self.generation.get() + 1;
		self.generation.set(generation);

		let (handle, registration) = AbortHandle::new_pair();
		// a listener notified of `Unloaded` may have subscribed already
		if let Some(previous) = self
			.subscription
			.replace(Some(Subscription { generation, handle }))
		{
			previous.cancel();
		}

		let task = Abortable::new(
			consume(self.this.clone(), generation, (self.source)()),
			registration,
		);

		tracing::debug!(generation, "stream subscribed");
		if let Err(err) = self.spawner.spawn_local(async move {
			let _ = task.await;
		}) {
			self.cancel();
			return Err(err.into());
		}

		Ok(())
	}

	fn cancel(&self) {
		let subscription = self.subscription.borrow_mut().take();
		if let Some(subscription) = subscription {
			subscription.cancel();
		}
	}

	fn is_current(&self, generation: u64) -> bool {
		self.subscription
			.borrow()
			.as_ref()
			.map_or(false, |s| s.generation == generation)
	}
}

async fn consume<T, E>(
	this: Weak<StreamBody<T, E>>,
	generation: u64,
	mut stream: LocalBoxStream<'static, Result<StreamState<T, E>, E>>,
) where
	T: Clone + 'static,
	E: 'static,
{
	while let Some(item) = stream.next().await {
		let Some(body) = this.upgrade() else {
			return;
		};

		// a listener may have cancelled us while we were delivering
		if !body.is_current(generation) {
			return;
		}

		match item {
			Ok(state) => body.state.set(state),
			Err(error) => body.state.set(StreamState::Error {
				error,
				trace: Trace::capture(),
			}),
		}
	}

	let Some(body) = this.upgrade() else {
		return;
	};

	if !body.is_current(generation) {
		return;
	}

	body.subscription.borrow_mut().take();
	tracing::debug!(generation, "stream complete");

	let last = body.state.get().loaded_value().cloned();
	body.state.set(StreamState::Complete(last));
}

impl<T, E> Drop for StreamBody<T, E> {
	fn drop(&mut self) {
		if let Some(subscription) = self.subscription.get_mut().take() {
			subscription.cancel();
		}
	}
}

impl<T, E> Notifier for StreamNotifier<T, E>
where
	T: Clone + 'static,
	E: Clone + 'static,
{
	type State = StreamState<T, E>;

	fn state(&self) -> Self::State {
		self.body.state.get_cloned()
	}

	fn add_listener(&self, listener: Listener) {
		StreamNotifier::add_listener(self, listener)
	}

	fn remove_listener(&self, listener: &Listener) {
		StreamNotifier::remove_listener(self, listener)
	}
}

impl<T, E> Debug for StreamNotifier<T, E>
where
	T: Debug + 'static,
	E: Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StreamNotifier")
			.field("state", &*self.body.state.get())
			.field("subscription", &*self.body.subscription.borrow())
			.finish()
	}
}
