//! Filesystem access capability
//!
//! The responder only touches files through [`FileProbe`], so negotiation and
//! fallback can run against [`MemoryFileProbe`] in tests and against
//! [`TokioFileProbe`] in production.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Metadata for a probed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
	/// Size in bytes
	pub size: u64,
	/// Last modification time, when the filesystem reports one
	pub modified: Option<SystemTime>,
	/// Whether the path is a regular file
	pub is_file: bool,
}

/// Read-only access to the files under a static root.
///
/// Implementations must report absence as `Ok(false)` from [`exists`] and as
/// an [`io::ErrorKind::NotFound`] error from the other methods. Any other
/// error is treated as a filesystem fault.
///
/// [`exists`]: FileProbe::exists
#[async_trait]
pub trait FileProbe: Send + Sync {
	/// Whether a regular file exists at `path`
	async fn exists(&self, path: &Path) -> io::Result<bool>;

	/// Size, modification time and kind of `path`
	async fn read_meta(&self, path: &Path) -> io::Result<FileMeta>;

	/// The full contents of `path`
	async fn open_read(&self, path: &Path) -> io::Result<Bytes>;
}

/// Whether an I/O error means "nothing there" rather than a fault
pub fn is_absent(error: &io::Error) -> bool {
	matches!(
		error.kind(),
		io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
	)
}

/// [`FileProbe`] backed by the real filesystem through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileProbe;

impl TokioFileProbe {
	/// Create a new probe
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl FileProbe for TokioFileProbe {
	async fn exists(&self, path: &Path) -> io::Result<bool> {
		match tokio::fs::metadata(path).await {
			Ok(metadata) => Ok(metadata.is_file()),
			Err(e) if is_absent(&e) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn read_meta(&self, path: &Path) -> io::Result<FileMeta> {
		let metadata = tokio::fs::metadata(path).await?;
		Ok(FileMeta {
			size: metadata.len(),
			modified: metadata.modified().ok(),
			is_file: metadata.is_file(),
		})
	}

	async fn open_read(&self, path: &Path) -> io::Result<Bytes> {
		tokio::fs::read(path).await.map(Bytes::from)
	}
}

#[derive(Debug, Clone)]
enum MemoryEntry {
	File { content: Bytes, modified: SystemTime },
	Directory,
	Fault(io::ErrorKind),
	Vanishing,
}

/// In-memory [`FileProbe`] for tests and embedded assets.
///
/// Every path passed to [`FileProbe::exists`] or [`FileProbe::read_meta`] is
/// recorded so callers can assert which paths were probed.
///
/// # Examples
///
/// ```
/// use pressed_static::{FileProbe, MemoryFileProbe};
/// use std::path::Path;
///
/// # tokio_test::block_on(async {
/// let probe = MemoryFileProbe::new()
///     .with_file("/static/app.js", "console.log(1);")
///     .with_file("/static/app.js.gz", vec![0x1fu8, 0x8b]);
///
/// assert!(probe.exists(Path::new("/static/app.js.gz")).await.unwrap());
/// assert!(!probe.exists(Path::new("/static/app.js.br")).await.unwrap());
/// assert_eq!(probe.probed().len(), 2);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryFileProbe {
	entries: HashMap<PathBuf, MemoryEntry>,
	probed: Mutex<Vec<PathBuf>>,
}

impl MemoryFileProbe {
	/// Create an empty probe
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a file
	pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Bytes>) -> Self {
		self.entries.insert(
			path.into(),
			MemoryEntry::File {
				content: content.into(),
				modified: SystemTime::UNIX_EPOCH,
			},
		);
		self
	}

	/// Add a directory entry
	pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
		self.entries.insert(path.into(), MemoryEntry::Directory);
		self
	}

	/// Make every access to `path` fail with the given error kind
	pub fn with_fault(mut self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
		self.entries.insert(path.into(), MemoryEntry::Fault(kind));
		self
	}

	/// Add a file that is removed after it has been probed
	///
	/// [`FileProbe::exists`] and [`FileProbe::read_meta`] report a regular
	/// empty file, while [`FileProbe::open_read`] fails with `NotFound`.
	pub fn with_vanishing(mut self, path: impl Into<PathBuf>) -> Self {
		self.entries.insert(path.into(), MemoryEntry::Vanishing);
		self
	}

	/// Paths probed so far, in order
	pub fn probed(&self) -> Vec<PathBuf> {
		self.probed.lock().clone()
	}

	/// Forget recorded probes
	pub fn clear_probed(&self) {
		self.probed.lock().clear();
	}

	fn lookup(&self, path: &Path) -> io::Result<&MemoryEntry> {
		match self.entries.get(path) {
			Some(MemoryEntry::Fault(kind)) => Err(io::Error::new(
				*kind,
				format!("injected fault: {}", path.display()),
			)),
			Some(entry) => Ok(entry),
			None => Err(io::Error::new(
				io::ErrorKind::NotFound,
				format!("no such file: {}", path.display()),
			)),
		}
	}
}

#[async_trait]
impl FileProbe for MemoryFileProbe {
	async fn exists(&self, path: &Path) -> io::Result<bool> {
		self.probed.lock().push(path.to_path_buf());
		match self.lookup(path) {
			Ok(entry) => Ok(matches!(
				entry,
				MemoryEntry::File { .. } | MemoryEntry::Vanishing
			)),
			Err(e) if is_absent(&e) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn read_meta(&self, path: &Path) -> io::Result<FileMeta> {
		self.probed.lock().push(path.to_path_buf());
		match self.lookup(path)? {
			MemoryEntry::File { content, modified } => Ok(FileMeta {
				size: content.len() as u64,
				modified: Some(*modified),
				is_file: true,
			}),
			MemoryEntry::Vanishing => Ok(FileMeta {
				size: 0,
				modified: None,
				is_file: true,
			}),
			_ => Ok(FileMeta {
				size: 0,
				modified: None,
				is_file: false,
			}),
		}
	}

	async fn open_read(&self, path: &Path) -> io::Result<Bytes> {
		match self.lookup(path)? {
			MemoryEntry::File { content, .. } => Ok(content.clone()),
			MemoryEntry::Vanishing => Err(io::Error::new(
				io::ErrorKind::NotFound,
				format!("removed after probe: {}", path.display()),
			)),
			_ => Err(io::Error::new(
				io::ErrorKind::IsADirectory,
				format!("not a file: {}", path.display()),
			)),
		}
	}
}
