use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::addr::RcAddr;
use crate::Notifier;

/// A callback invoked after every write to an observable value.
///
/// Listeners take no arguments: they read the new value back
/// from whatever they observe.
pub type Listener = Rc<dyn Fn()>;

type Listeners = SmallVec<[RcAddr<dyn Fn()>; 4]>;

/// A mutable value slot that synchronously notifies its listeners
/// on every write.
///
/// Writes are never compared against the previous value: setting
/// the same value twice notifies twice.
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

impl<T: 'static> From<Var<T>> for Rc<dyn Any> {
	fn from(var: Var<T>) -> Self {
		var.body
	}
}

impl<T: 'static> TryFrom<Rc<dyn Any>> for Var<T> {
	type Error = Rc<dyn Any>;
	fn try_from(value: Rc<dyn Any>) -> Result<Self, Self::Error> {
		Rc::downcast::<VarBody<T>>(value).map(|body| Var { body })
	}
}

pub struct VarBody<T> {
	value: RefCell<T>,
	inner: RefCell<VarInner>,
}

struct VarInner {
	listeners: Listeners,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self {
		Var {
			body: Rc::new(VarBody {
				value: RefCell::new(value),
				inner: RefCell::new(VarInner {
					listeners: SmallVec::new(),
				}),
			}),
		}
	}

	/// Borrows the current value.
	///
	/// The borrow must be released before the next write, listeners
	/// included.
	#[inline]
	pub fn get(&self) -> Ref<'_, T> {
		self.body.value.borrow()
	}

	#[inline]
	pub fn get_cloned(&self) -> T
	where
		T: Clone,
	{
		self.body.value.borrow().clone()
	}

	#[inline]
	pub fn set(&self, value: T) {
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> T {
		let old = std::mem::replace(&mut *self.body.value.borrow_mut(), value);
		self.body.notify();
		old
	}

	pub fn update(&self, func: impl FnOnce(&mut T)) {
		func(&mut *self.body.value.borrow_mut());
		self.body.notify();
	}

	#[inline]
	pub fn add_listener(&self, listener: Listener) {
		self.body.inner.borrow_mut().add(listener);
	}

	#[inline]
	pub fn remove_listener(&self, listener: &Listener) {
		self.body.inner.borrow_mut().remove(listener);
	}

	/// Drops every registered listener.
	pub fn clear_listeners(&self) {
		let listeners = std::mem::take(&mut self.body.inner.borrow_mut().listeners);
		tracing::trace!(count = listeners.len(), "listeners released");
		// dropped after the borrow ends, a listener's drop glue may touch this cell
		drop(listeners);
	}

	pub fn listener_count(&self) -> usize {
		self.body.inner.borrow().listeners.len()
	}
}

impl<T> VarBody<T> {
	fn notify(&self) {
		// snapshot, so listeners may (un)register while being called
		let listeners = self.inner.borrow().listeners.clone();
		for listener in &listeners {
			// skip whatever an earlier listener of this pass removed
			if !self.inner.borrow().listeners.contains(listener) {
				continue;
			}
			(**listener)()
		}
	}
}

impl VarInner {
	fn add(&mut self, listener: Listener) {
		self.listeners.push(RcAddr::new(listener));
	}

	fn remove(&mut self, listener: &Listener) {
		if let Some(index) = self.listeners.iter().position(|item| item.is(listener)) {
			self.listeners.remove(index);
		}
	}
}

impl<T> Notifier for Var<T>
where
	T: Clone + 'static,
{
	type State = T;

	fn state(&self) -> T {
		self.get_cloned()
	}

	fn add_listener(&self, listener: Listener) {
		Var::add_listener(self, listener)
	}

	fn remove_listener(&self, listener: &Listener) {
		Var::remove_listener(self, listener)
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get().fmt(f)
	}
}
