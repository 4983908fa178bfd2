//! Resolved static files

use crate::probe::FileMeta;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A static file resolved for one request
///
/// The MIME type always comes from the original path, so a variant served as
/// `site.css.br` still reports `text/css`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAsset {
	/// Absolute path of the original (uncompressed) file
	pub path: PathBuf,
	/// MIME type inferred from the original path's extension
	pub mime_type: String,
	/// Size of the original in bytes
	pub size: u64,
	/// Modification time of the original
	pub modified: Option<SystemTime>,
}

impl StaticAsset {
	/// Creates an asset description from probed metadata
	///
	/// # Examples
	///
	/// ```
	/// use pressed_static::StaticAsset;
	/// use pressed_static::probe::FileMeta;
	/// use std::path::Path;
	///
	/// let meta = FileMeta { size: 42, modified: None, is_file: true };
	/// let asset = StaticAsset::from_meta(Path::new("/srv/static/site.css"), meta);
	/// assert_eq!(asset.mime_type, "text/css");
	/// assert_eq!(asset.size, 42);
	/// ```
	pub fn from_meta(path: &Path, meta: FileMeta) -> Self {
		Self {
			path: path.to_path_buf(),
			mime_type: mime_type_for(path),
			size: meta.size,
			modified: meta.modified,
		}
	}
}

/// MIME type for a path, `application/octet-stream` when unknown
pub fn mime_type_for(path: &Path) -> String {
	mime_guess::from_path(path)
		.first_or_octet_stream()
		.to_string()
}
