use std::any::{type_name, Any};
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::error::Error;

/// Shared notifiers, looked up by name.
///
/// Meant to be built once by the application and handed to whatever
/// needs the shared state, instead of reaching for globals. Anything
/// convertible to `Rc<dyn Any>` can be stored: [`Var`](crate::Var) and
/// all the notifiers are.
#[derive(Default)]
pub struct Registry {
	entries: FxHashMap<String, Rc<dyn Any>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handle` under `name`, returning whatever was there
	/// before.
	pub fn insert<H>(&mut self, name: impl Into<String>, handle: H) -> Option<Rc<dyn Any>>
	where
		H: Into<Rc<dyn Any>>,
	{
		let name = name.into();
		tracing::trace!(name = %name, "registered");
		self.entries.insert(name, handle.into())
	}

	/// A new handle to the value registered under `name`.
	pub fn get<H>(&self, name: &str) -> Result<H, Error>
	where
		H: TryFrom<Rc<dyn Any>, Error = Rc<dyn Any>>,
	{
		let entry = self
			.entries
			.get(name)
			.ok_or_else(|| Error::Missing(name.to_owned()))?;

		H::try_from(entry.clone()).map_err(|_| Error::TypeMismatch {
			name: name.to_owned(),
			expected: type_name::<H>(),
		})
	}

	pub fn remove(&mut self, name: &str) -> Option<Rc<dyn Any>> {
		self.entries.remove(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.entries.keys()).finish()
	}
}
