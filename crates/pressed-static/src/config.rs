//! Configuration for pre-compressed static file serving

use crate::error::{Result, StaticError};
use crate::rule::{CompressionRule, FallbackPolicy, validate_rules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Static serving configuration
///
/// Loaded once at startup. The compression list is ordered: earlier rules are
/// preferred whenever the client accepts them. An empty list disables
/// compression entirely, including the `Vary` header.
///
/// # Examples
///
/// ```
/// use pressed_static::{CompressionRule, StaticConfig};
/// use std::path::PathBuf;
///
/// let config = StaticConfig::new(PathBuf::from("dist"), "/assets/")
///     .with_rule(CompressionRule::brotli())
///     .with_rule(CompressionRule::gzip());
///
/// assert_eq!(config.compression.len(), 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticConfig {
	/// Directory holding the static files and their variants
	pub root: PathBuf,

	/// URL prefix the files are served under
	#[serde(default = "default_url_prefix")]
	pub url_prefix: String,

	/// Ordered compression rules
	#[serde(default)]
	pub compression: Vec<CompressionRule>,

	/// Behavior when the negotiated variant is missing on disk
	#[serde(default)]
	pub fallback: FallbackPolicy,

	/// Optional JSON manifest mapping logical names to stored names
	#[serde(default)]
	pub manifest: Option<PathBuf>,
}

fn default_url_prefix() -> String {
	"/static/".to_string()
}

impl StaticConfig {
	/// Creates a configuration with no compression rules
	///
	/// # Arguments
	///
	/// * `root` - Static root directory
	/// * `url_prefix` - URL prefix, e.g. `/static/`
	pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
		Self {
			root: root.into(),
			url_prefix: url_prefix.into(),
			compression: Vec::new(),
			fallback: FallbackPolicy::default(),
			manifest: None,
		}
	}

	/// Appends a rule with lower priority than those already configured
	pub fn with_rule(mut self, rule: CompressionRule) -> Self {
		self.compression.push(rule);
		self
	}

	/// Replaces the rule list
	pub fn with_rules(mut self, rules: impl IntoIterator<Item = CompressionRule>) -> Self {
		self.compression = rules.into_iter().collect();
		self
	}

	/// Sets the fallback policy
	pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
		self.fallback = policy;
		self
	}

	/// Sets the manifest path
	pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
		self.manifest = Some(manifest.into());
		self
	}

	/// Checks the rule list and URL prefix
	///
	/// # Errors
	///
	/// Returns [`StaticError::InvalidRule`] for an invalid or duplicated rule,
	/// or a URL prefix that does not both start and end with `/`.
	pub fn validate(&self) -> Result<()> {
		if !self.url_prefix.starts_with('/') || !self.url_prefix.ends_with('/') {
			return Err(StaticError::InvalidRule(format!(
				"url_prefix {:?} must start and end with '/'",
				self.url_prefix
			)));
		}
		validate_rules(&self.compression)
	}

	/// Parses and validates a TOML document
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::{FallbackPolicy, StaticConfig};
	///
	/// let config = StaticConfig::from_toml_str(r#"
	///     root = "dist"
	///     fallback = "cascade"
	///
	///     [[compression]]
	///     encoding = "br"
	///     extension = ".br"
	///
	///     [[compression]]
	///     encoding = "gzip"
	///     extension = ".gz"
	/// "#).unwrap();
	///
	/// assert_eq!(config.url_prefix, "/static/");
	/// assert_eq!(config.compression[0].encoding, "br");
	/// assert_eq!(config.fallback, FallbackPolicy::Cascade);
	/// ```
	pub fn from_toml_str(s: &str) -> Result<Self> {
		let config: Self = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	/// Parses and validates a JSON document
	pub fn from_json_str(s: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads a `.toml` or `.json` configuration file
	///
	/// A relative `root` or `manifest` is resolved against the directory of
	/// the configuration file.
	///
	/// # Errors
	///
	/// Returns [`StaticError::UnsupportedConfigFormat`] for other extensions,
	/// and I/O, parse or validation errors otherwise.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)?;
		let extension = path
			.extension()
			.and_then(|e| e.to_str())
			.map(str::to_ascii_lowercase);

		let mut config = match extension.as_deref() {
			Some("toml") => Self::from_toml_str(&content)?,
			Some("json") => Self::from_json_str(&content)?,
			_ => return Err(StaticError::UnsupportedConfigFormat(path.to_path_buf())),
		};

		if let Some(base) = path.parent() {
			if config.root.is_relative() {
				config.root = base.join(&config.root);
			}
			if let Some(manifest) = config.manifest.as_mut()
				&& manifest.is_relative()
			{
				*manifest = base.join(&*manifest);
			}
		}

		Ok(config)
	}
}
