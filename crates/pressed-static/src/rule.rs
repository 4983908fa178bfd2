//! Compression rules and fallback policy

use crate::error::{Result, StaticError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configured pre-compressed variant: the encoding token sent in
/// `Content-Encoding` and the suffix appended to a file path to find it on disk.
///
/// Rules are kept in an ordered list. The earliest rule the client accepts wins,
/// regardless of the order or weights in the client's `Accept-Encoding` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionRule {
	/// Encoding token, e.g. `br` or `gzip`
	pub encoding: String,
	/// Variant file suffix, e.g. `.br` or `.gz`
	pub extension: String,
}

impl CompressionRule {
	/// Creates a rule from an encoding token and a file suffix
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::CompressionRule;
	///
	/// let rule = CompressionRule::new("gzip", ".gz");
	/// assert_eq!(rule.encoding, "gzip");
	/// assert_eq!(rule.extension, ".gz");
	/// ```
	pub fn new(encoding: impl Into<String>, extension: impl Into<String>) -> Self {
		Self {
			encoding: encoding.into(),
			extension: extension.into(),
		}
	}

	/// `br` served from `.br` files
	pub fn brotli() -> Self {
		Self::new("br", ".br")
	}

	/// `gzip` served from `.gz` files
	pub fn gzip() -> Self {
		Self::new("gzip", ".gz")
	}

	/// `zstd` served from `.zst` files
	pub fn zstd() -> Self {
		Self::new("zstd", ".zst")
	}

	/// Case-insensitive comparison against a client token
	pub fn matches(&self, token: &str) -> bool {
		self.encoding.eq_ignore_ascii_case(token)
	}

	/// Checks that the rule can be used to serve files
	///
	/// # Errors
	///
	/// Returns [`StaticError::InvalidRule`] when the encoding is empty, contains
	/// characters outside the HTTP token grammar, or is `*` / `identity`, or when
	/// the extension is empty, lacks a leading `.`, or contains a path separator.
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::CompressionRule;
	///
	/// assert!(CompressionRule::gzip().validate().is_ok());
	/// assert!(CompressionRule::new("gzip", "gz").validate().is_err());
	/// assert!(CompressionRule::new("*", ".any").validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<()> {
		if self.encoding.is_empty() {
			return Err(StaticError::InvalidRule("encoding must not be empty".into()));
		}
		if !self.encoding.bytes().all(is_token_byte) {
			return Err(StaticError::InvalidRule(format!(
				"encoding {:?} is not a valid token",
				self.encoding
			)));
		}
		if self.encoding == "*" || self.encoding.eq_ignore_ascii_case("identity") {
			return Err(StaticError::InvalidRule(format!(
				"encoding {:?} cannot name a variant",
				self.encoding
			)));
		}
		if self.extension.len() < 2 || !self.extension.starts_with('.') {
			return Err(StaticError::InvalidRule(format!(
				"extension {:?} must start with '.' followed by a suffix",
				self.extension
			)));
		}
		if self.extension.contains(['/', '\\', '\0']) {
			return Err(StaticError::InvalidRule(format!(
				"extension {:?} must not contain path separators",
				self.extension
			)));
		}
		Ok(())
	}
}

impl fmt::Display for CompressionRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.encoding, self.extension)
	}
}

/// Validates a full ordered rule list: every rule individually, plus unique
/// encodings.
pub fn validate_rules(rules: &[CompressionRule]) -> Result<()> {
	for (index, rule) in rules.iter().enumerate() {
		rule.validate()?;
		if rules[..index].iter().any(|prev| prev.matches(&rule.encoding)) {
			return Err(StaticError::InvalidRule(format!(
				"encoding {:?} is configured more than once",
				rule.encoding
			)));
		}
	}
	Ok(())
}

// RFC 9110 tchar
fn is_token_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// What to do when the negotiated variant is missing on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
	/// Serve the uncompressed original. Lower-priority variants are not probed.
	#[default]
	Identity,
	/// Probe the remaining accepted rules in order before serving the original.
	Cascade,
}
