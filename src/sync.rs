use std::any::Any;
use std::cell::Ref;
use std::fmt::Debug;
use std::rc::Rc;

use crate::cell::{Listener, Var};
use crate::state::SyncState;
use crate::Notifier;

type Producer<T, E> = Box<dyn Fn() -> SyncState<T, E>>;

/// Publishes the result of a synchronous producer.
///
/// The producer runs once on construction and again on every
/// [`reload`](SyncNotifier::reload). It is expected to map its own
/// failures to [`SyncState::Error`]; a panic escapes through the caller.
pub struct SyncNotifier<T, E> {
	body: Rc<SyncBody<T, E>>,
}

struct SyncBody<T, E> {
	state: Var<SyncState<T, E>>,
	producer: Producer<T, E>,
}

impl<T, E> Clone for SyncNotifier<T, E> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T: 'static, E: 'static> From<SyncNotifier<T, E>> for Rc<dyn Any> {
	fn from(notifier: SyncNotifier<T, E>) -> Self {
		notifier.body
	}
}

impl<T: 'static, E: 'static> TryFrom<Rc<dyn Any>> for SyncNotifier<T, E> {
	type Error = Rc<dyn Any>;
	fn try_from(value: Rc<dyn Any>) -> Result<Self, Self::Error> {
		Rc::downcast::<SyncBody<T, E>>(value).map(|body| SyncNotifier { body })
	}
}

impl<T, E> SyncNotifier<T, E>
where
	T: 'static,
	E: 'static,
{
	pub fn new(producer: impl Fn() -> SyncState<T, E> + 'static) -> Self {
		let state = producer();
		SyncNotifier {
			body: Rc::new(SyncBody {
				state: Var::new(state),
				producer: Box::new(producer),
			}),
		}
	}

	#[inline]
	pub fn get(&self) -> Ref<'_, SyncState<T, E>> {
		self.body.state.get()
	}

	/// Runs the producer again and publishes its result.
	pub fn reload(&self) {
		tracing::trace!("sync reload");
		let state = (self.body.producer)();
		self.body.state.set(state);
	}

	/// Publishes `state` without consulting the producer.
	#[inline]
	pub fn set(&self, state: SyncState<T, E>) {
		self.body.state.set(state)
	}

	#[inline]
	pub fn update(&self, func: impl FnOnce(&mut SyncState<T, E>)) {
		self.body.state.update(func)
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

impl<T, E> Notifier for SyncNotifier<T, E>
where
	T: Clone + 'static,
	E: Clone + 'static,
{
	type State = SyncState<T, E>;

	fn state(&self) -> Self::State {
		self.body.state.get_cloned()
	}

	fn add_listener(&self, listener: Listener) {
		SyncNotifier::add_listener(self, listener)
	}

	fn remove_listener(&self, listener: &Listener) {
		SyncNotifier::remove_listener(self, listener)
	}
}

impl<T, E> Debug for SyncNotifier<T, E>
where
	T: Debug + 'static,
	E: Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("SyncNotifier").field(&*self.get()).finish()
	}
}
