use std::ops::Deref;

use indexmap::IndexMap;
use tracing::debug;

/// The shared, ordered property store visible to actions while they run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContext {
	properties: IndexMap<String, String>,
}

impl SharedContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.properties.get(key).map(String::as_str)
	}

	/// Store `value` under `key`, returning the previous value.
	pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.properties.insert(key.into(), value.into())
	}

	/// Remove `key`, keeping the order of the remaining entries.
	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.properties.shift_remove(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.properties.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.properties.len()
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.properties
			.iter()
			.map(|(key, value)| (key.as_str(), value.as_str()))
	}
}

impl From<IndexMap<String, String>> for SharedContext {
	fn from(properties: IndexMap<String, String>) -> Self {
		Self { properties }
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SharedContext {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self {
			properties: iter
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		}
	}
}

/// Properties written into a [`SharedContext`] for the duration of one action
/// invocation.
///
/// The overlay remembers every key it wrote together with the value that key
/// held before. Dropping the overlay removes the injected keys and puts back
/// any value they replaced, on every exit path.
#[derive(Debug)]
pub struct ContextOverlay<'a> {
	context: &'a mut SharedContext,
	saved: Vec<(String, Option<String>)>,
}

impl<'a> ContextOverlay<'a> {
	pub fn inject<I, K, V>(context: &'a mut SharedContext, entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut overlay = Self {
			context,
			saved: Vec::new(),
		};

		for (key, value) in entries {
			overlay.put(key.into(), value.into());
		}

		overlay
	}

	fn put(&mut self, key: String, value: String) {
		debug!(key = %key, value = %value, "inject context property");
		let previous = self.context.put(key.clone(), value);

		// A key written twice keeps the value it had before the first write.
		if !self.saved.iter().any(|(saved, _)| *saved == key) {
			self.saved.push((key, previous));
		}
	}

	/// Keys written by this overlay, in injection order.
	pub fn injected_keys(&self) -> impl Iterator<Item = &str> {
		self.saved.iter().map(|(key, _)| key.as_str())
	}

	pub fn context(&self) -> &SharedContext {
		self.context
	}
}

impl Deref for ContextOverlay<'_> {
	type Target = SharedContext;

	fn deref(&self) -> &Self::Target {
		self.context
	}
}

impl Drop for ContextOverlay<'_> {
	fn drop(&mut self) {
		for (key, previous) in self.saved.drain(..).rev() {
			match previous {
				Some(value) => {
					debug!(key = %key, "restore context property");
					self.context.put(key, value);
				}
				None => {
					debug!(key = %key, "remove context property");
					self.context.remove(&key);
				}
			}
		}
	}
}
