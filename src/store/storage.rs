//! Durable key/value storage.
//!
//! The browser implementation wraps `window.localStorage`; the in-memory one
//! backs tests and non-browser hosts. Callers in the overview treat every
//! failure as cosmetic and keep their in-memory state authoritative.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure reading or writing durable storage.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("local storage is unavailable")]
	Unavailable,
	#[error("storage access failed: {0}")]
	Access(String),
	#[error("stored value is corrupt: {0}")]
	Corrupt(#[from] serde_json::Error),
}

impl From<JsValue> for StorageError {
	fn from(value: JsValue) -> Self {
		StorageError::Access(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

/// String key/value storage with `localStorage` semantics.
pub trait KeyValueStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
	fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
	fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and deserializes a JSON value. A missing key is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(
	storage: &dyn KeyValueStorage,
	key: &str,
) -> Result<Option<T>, StorageError> {
	match storage.get(key)? {
		Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
		None => Ok(None),
	}
}

pub fn write_json<T: Serialize>(
	storage: &dyn KeyValueStorage,
	key: &str,
	value: &T,
) -> Result<(), StorageError> {
	let raw = serde_json::to_string(value)?;
	storage.set(key, &raw)
}

/// `window.localStorage`, looked up on every call so a storage that becomes
/// unavailable mid-session only fails the affected call.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
	fn local() -> Result<web_sys::Storage, StorageError> {
		let window = web_sys::window().ok_or(StorageError::Unavailable)?;
		window.local_storage()?.ok_or(StorageError::Unavailable)
	}
}

impl KeyValueStorage for BrowserStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(Self::local()?.get_item(key)?)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		Ok(Self::local()?.set_item(key, value)?)
	}

	fn remove(&self, key: &str) -> Result<(), StorageError> {
		Ok(Self::local()?.remove_item(key)?)
	}
}

/// In-memory storage. Can be switched to fail writes, like a full quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: RefCell<BTreeMap<String, String>>,
	fail_writes: Cell<bool>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_fail_writes(&self, fail: bool) {
		self.fail_writes.set(fail);
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

impl KeyValueStorage for MemoryStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.entries.borrow().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		if self.fail_writes.get() {
			return Err(StorageError::Access("quota exceeded".to_string()));
		}
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StorageError> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}
