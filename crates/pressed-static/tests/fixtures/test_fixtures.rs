//! Static trees on disk for integration tests

use pressed_static::AcceptEncoding;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir as TempDirType;

/// Contents of `styles.css`
pub const CSS: &str = "body { color: red; }";

/// Contents of `script.js`
pub const JS: &str = "console.log('test');";

/// Wrapper for tempfile TempDir exposing the static root
pub struct TempDir {
	inner: TempDirType,
	root: PathBuf,
}

impl TempDir {
	#[allow(dead_code)]
	pub fn path(&self) -> &Path {
		self.inner.path()
	}

	#[allow(dead_code)]
	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn file(&self, name: &str) -> PathBuf {
		self.root.join(name)
	}
}

/// Creates a static root with:
///
/// - `styles.css` and `styles.css.gz`, no `styles.css.br`
/// - `app.js`, `app.js.br` and `app.js.gz`
/// - `script.js` with no variants
/// - `css/` subdirectory holding `theme.css`
pub fn static_dir() -> TempDir {
	let temp_dir = TempDirType::new().unwrap();
	let root = temp_dir.path().join("static");
	fs::create_dir_all(root.join("css")).unwrap();

	fs::write(root.join("styles.css"), CSS).unwrap();
	fs::write(root.join("styles.css.gz"), b"gzip:styles.css").unwrap();

	fs::write(root.join("app.js"), JS).unwrap();
	fs::write(root.join("app.js.br"), b"br:app.js").unwrap();
	fs::write(root.join("app.js.gz"), b"gzip:app.js").unwrap();

	fs::write(root.join("script.js"), JS).unwrap();
	fs::write(root.join("css").join("theme.css"), CSS).unwrap();

	TempDir {
		inner: temp_dir,
		root,
	}
}

/// Parses an `Accept-Encoding` header value
pub fn accept(header: &str) -> AcceptEncoding {
	AcceptEncoding::parse(header)
}
