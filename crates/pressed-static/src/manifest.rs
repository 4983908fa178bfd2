//! Static file manifest
//!
//! Build steps that fingerprint assets write a JSON object mapping each
//! logical name to the stored name, e.g. `"app.js": "app.3f2a9c.js"`.

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Mapping from logical file names to stored file names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticManifest {
	entries: HashMap<String, String>,
}

impl StaticManifest {
	/// Creates an empty manifest
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a manifest from JSON
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::StaticManifest;
	///
	/// let manifest = StaticManifest::from_json_str(r#"{"app.js": "app.abc123.js"}"#).unwrap();
	/// assert_eq!(manifest.resolve("app.js"), "app.abc123.js");
	/// assert_eq!(manifest.resolve("other.js"), "other.js");
	/// ```
	pub fn from_json_str(s: &str) -> Result<Self> {
		Ok(Self {
			entries: serde_json::from_str(s)?,
		})
	}

	/// Loads a manifest from a JSON file
	///
	/// # Errors
	///
	/// Returns error if the file cannot be read or parsed
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_json_str(&content)
	}

	/// Adds or replaces an entry
	pub fn insert(&mut self, logical: impl Into<String>, stored: impl Into<String>) {
		self.entries.insert(logical.into(), stored.into());
	}

	/// The stored name for a logical name, or the name itself when unmapped
	pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
		self.entries.get(name).map(String::as_str).unwrap_or(name)
	}

	/// Number of entries
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the manifest has no entries
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
