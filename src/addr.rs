use std::fmt::Debug;
use std::ops::Deref;
use std::rc::Rc;

/// An `Rc` compared by the address it points to rather than by value.
///
/// Closures have no meaningful equality, so listeners are told apart
/// by the allocation that holds them.
pub struct RcAddr<T: ?Sized> {
	ptr: Rc<T>,
}

impl<T: ?Sized> RcAddr<T> {
	pub fn new(ptr: Rc<T>) -> Self {
		RcAddr { ptr }
	}

	/// Whether `other` is the very allocation wrapped here.
	pub fn is(&self, other: &Rc<T>) -> bool {
		addr(&self.ptr) == addr(other)
	}
}

// Thin pointers only: vtable addresses of the same closure type are not
// guaranteed to be unique across codegen units.
fn addr<T: ?Sized>(ptr: &Rc<T>) -> *const () {
	Rc::as_ptr(ptr) as *const ()
}

impl<T: ?Sized> Clone for RcAddr<T> {
	fn clone(&self) -> Self {
		RcAddr {
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for RcAddr<T> {
	type Target = Rc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for RcAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.is(&other.ptr)
	}
}

impl<T: ?Sized> Eq for RcAddr<T> {}

impl<T: ?Sized> Debug for RcAddr<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("RcAddr").field(&addr(&self.ptr)).finish()
	}
}
