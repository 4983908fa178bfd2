//! Mapping request URLs to files under the static root

use crate::manifest::StaticManifest;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

/// Strips `prefix` from a request path and percent-decodes the remainder
///
/// Returns `None` when the path is outside the prefix or does not decode to
/// UTF-8. A query string, if still attached, is dropped.
///
/// # Examples
///
/// ```
/// use pressed_static::path::strip_prefix;
///
/// assert_eq!(strip_prefix("/static/css/site%20main.css", "/static/").as_deref(), Some("css/site main.css"));
/// assert_eq!(strip_prefix("/api/users", "/static/"), None);
/// ```
pub fn strip_prefix(request_path: &str, prefix: &str) -> Option<String> {
	let request_path = request_path.split('?').next().unwrap_or(request_path);
	let relative = prefix_remainder(request_path, prefix)?;
	percent_decode_str(relative)
		.decode_utf8()
		.ok()
		.map(|decoded| decoded.into_owned())
}

/// Whether `request_path` lies under `prefix` on a segment boundary
///
/// `/static` matches `/static` and `/static/app.js`, never `/staticapp.js`.
pub fn matches_prefix(request_path: &str, prefix: &str) -> bool {
	prefix_remainder(request_path, prefix).is_some()
}

fn prefix_remainder<'a>(request_path: &'a str, prefix: &str) -> Option<&'a str> {
	let rest = request_path.strip_prefix(prefix)?;
	if prefix.ends_with('/') || rest.is_empty() {
		Some(rest)
	} else {
		rest.strip_prefix('/')
	}
}

/// Joins a relative name onto `root`, refusing anything that could escape it
///
/// Rejects empty names, NUL bytes, backslashes, `..` segments and absolute
/// components. `.` and empty segments are skipped.
///
/// # Examples
///
/// ```
/// use pressed_static::path::safe_join;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/srv/static");
/// assert_eq!(safe_join(root, "css/site.css"), Some(PathBuf::from("/srv/static/css/site.css")));
/// assert_eq!(safe_join(root, "../etc/passwd"), None);
/// ```
pub fn safe_join(root: &Path, relative: &str) -> Option<PathBuf> {
	if relative.is_empty() || relative.contains('\0') || relative.contains('\\') {
		return None;
	}

	let mut joined = root.to_path_buf();
	let mut pushed = false;
	for component in Path::new(relative).components() {
		match component {
			Component::Normal(segment) => {
				joined.push(segment);
				pushed = true;
			}
			Component::CurDir => {}
			Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
		}
	}

	pushed.then_some(joined)
}

/// Resolves a request path to a file path under `root`
///
/// Applies [`strip_prefix`], then the manifest, then [`safe_join`]. Returns
/// `None` when the request cannot name a file under `root`.
pub fn resolve_request_path(
	request_path: &str,
	prefix: &str,
	root: &Path,
	manifest: Option<&StaticManifest>,
) -> Option<PathBuf> {
	let relative = strip_prefix(request_path, prefix)?;
	if relative.is_empty() {
		return None;
	}
	let stored = match manifest {
		Some(manifest) => manifest.resolve(&relative),
		None => relative.as_str(),
	};

	let resolved = safe_join(root, stored);
	if resolved.is_none() {
		tracing::warn!(
			"Path traversal attempt blocked in static path mapping: {}",
			request_path
		);
	}
	resolved
}
