//! Error types

use std::path::PathBuf;

/// Result type for static asset operations
pub type Result<T> = std::result::Result<T, StaticError>;

/// Errors raised by configuration loading and file serving.
///
/// A missing file is never an error here: an absent variant falls back to the
/// original and an absent original is forwarded to the next handler.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StaticError {
	/// I/O failure while loading configuration or a manifest
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// A file probe or read failed for a reason other than absence
	#[error("Filesystem fault at {}: {source}", .path.display())]
	FilesystemFault {
		/// The path being probed or read
		path: PathBuf,
		/// The underlying I/O error
		#[source]
		source: std::io::Error,
	},

	/// A compression rule failed validation
	#[error("Invalid compression rule: {0}")]
	InvalidRule(String),

	/// TOML configuration could not be parsed
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// JSON configuration or manifest could not be parsed
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// The configuration file extension is neither `.toml` nor `.json`
	#[error("Unsupported configuration format: {}", .0.display())]
	UnsupportedConfigFormat(PathBuf),
}

impl StaticError {
	pub(crate) fn fault(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::FilesystemFault {
			path: path.into(),
			source,
		}
	}
}

/// Maps every variant to a 500 with a fixed message.
///
/// The detailed error names filesystem paths, so callers log it before
/// converting; the response body only carries the generic text.
impl From<StaticError> for pressed_http::Error {
	fn from(_error: StaticError) -> Self {
		pressed_http::Error::Internal("Static file could not be served".to_string())
	}
}
