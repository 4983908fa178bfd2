//! Variant resolution and response assembly
//!
//! For one request the responder either serves a pre-compressed variant,
//! serves the original uncompressed, or forwards to the next handler when the
//! original does not exist. Exactly one of those happens, and the response
//! headers are assembled once in [`ServedFile::into_response`].

use crate::asset::StaticAsset;
use crate::error::{Result, StaticError};
use crate::negotiation::{AcceptEncoding, acceptable_rules, negotiate};
use crate::probe::{FileProbe, TokioFileProbe, is_absent};
use crate::rule::{CompressionRule, FallbackPolicy, validate_rules};
use bytes::Bytes;
use hyper::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderValue, VARY};
use pressed_http::Response;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the responder decided for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
	/// Serve a file, compressed or not
	Serve(ServedFile),
	/// The original does not exist; hand the request to the next handler
	Forward,
}

impl HttpOutcome {
	/// Whether the request should be forwarded
	pub fn is_forward(&self) -> bool {
		matches!(self, HttpOutcome::Forward)
	}

	/// The served file, if any
	pub fn served(&self) -> Option<&ServedFile> {
		match self {
			HttpOutcome::Serve(file) => Some(file),
			HttpOutcome::Forward => None,
		}
	}
}

/// A file chosen to answer a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
	/// The original file the request resolved to
	pub asset: StaticAsset,
	/// The file whose bytes are in `body`: the original or a variant
	pub served_path: PathBuf,
	/// `Content-Encoding` token when a variant was served
	pub encoding: Option<String>,
	/// Whether the response carries `Vary: Accept-Encoding`
	pub vary: bool,
	/// File contents
	pub body: Bytes,
}

impl ServedFile {
	/// Builds the 200 response for this file
	///
	/// Sets `Content-Type` from the original path, `Content-Encoding` only for
	/// a variant, and `Vary: Accept-Encoding` whenever compression is
	/// configured. With `head_only` the body is left empty.
	///
	/// # Errors
	///
	/// Returns [`StaticError::InvalidRule`] when the encoding token cannot be
	/// sent as a header value. A variant body is never sent without its
	/// `Content-Encoding`.
	pub fn into_response(self, head_only: bool) -> Result<Response> {
		let content_type = HeaderValue::from_str(&self.asset.mime_type)
			.unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
		let mut response = Response::ok().with_typed_header(CONTENT_TYPE, content_type);

		if let Some(encoding) = &self.encoding {
			let value = HeaderValue::from_str(encoding).map_err(|_| {
				StaticError::InvalidRule(format!(
					"encoding {encoding:?} is not a valid header value"
				))
			})?;
			response = response.with_typed_header(CONTENT_ENCODING, value);
		}

		if self.vary {
			response =
				response.with_typed_header(VARY, HeaderValue::from_static("Accept-Encoding"));
		}

		if head_only {
			Ok(response)
		} else {
			Ok(response.with_body(self.body))
		}
	}
}

/// Appends a variant suffix to a path, e.g. `app.js` + `.br` -> `app.js.br`
///
/// # Examples
///
/// ```
/// use pressed_static::responder::variant_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     variant_path(Path::new("/srv/static/app.js"), ".br"),
///     PathBuf::from("/srv/static/app.js.br"),
/// );
/// ```
pub fn variant_path(path: &Path, extension: &str) -> PathBuf {
	let mut raw: OsString = path.as_os_str().to_os_string();
	raw.push(extension);
	PathBuf::from(raw)
}

/// Resolves one request against the configured rules
///
/// `request_path` is the filesystem path the request maps to. The original is
/// probed first; when it is missing or not a regular file the outcome is
/// [`HttpOutcome::Forward`]. Otherwise the negotiated variant is probed and
/// served when present, and the original is served when it is not.
///
/// With [`FallbackPolicy::Identity`] only the top negotiated rule is probed.
/// With [`FallbackPolicy::Cascade`] every accepted rule is tried in order.
///
/// # Errors
///
/// Returns [`StaticError::FilesystemFault`] when a probe or read fails for any
/// reason other than absence.
pub async fn respond<P>(
	request_path: &Path,
	rules: &[CompressionRule],
	policy: FallbackPolicy,
	accepted: &AcceptEncoding,
	probe: &P,
) -> Result<HttpOutcome>
where
	P: FileProbe + ?Sized,
{
	let meta = match probe.read_meta(request_path).await {
		Ok(meta) => meta,
		Err(e) if is_absent(&e) => {
			tracing::debug!(path = %request_path.display(), "static source missing, forwarding");
			return Ok(HttpOutcome::Forward);
		}
		Err(e) => return Err(StaticError::fault(request_path, e)),
	};
	if !meta.is_file {
		tracing::debug!(path = %request_path.display(), "static source is not a file, forwarding");
		return Ok(HttpOutcome::Forward);
	}

	let asset = StaticAsset::from_meta(request_path, meta);
	let vary = !rules.is_empty();

	if vary {
		let candidates: Vec<&CompressionRule> = match policy {
			FallbackPolicy::Identity => negotiate(rules, accepted).rule().into_iter().collect(),
			FallbackPolicy::Cascade => acceptable_rules(rules, accepted).collect(),
		};

		for rule in candidates {
			let candidate = variant_path(request_path, &rule.extension);
			if let Some(body) = read_variant(probe, &candidate).await? {
				tracing::debug!(
					path = %request_path.display(),
					encoding = %rule.encoding,
					"serving pre-compressed variant"
				);
				return Ok(HttpOutcome::Serve(ServedFile {
					asset,
					served_path: candidate,
					encoding: Some(rule.encoding.clone()),
					vary,
					body,
				}));
			}
			tracing::debug!(
				path = %candidate.display(),
				encoding = %rule.encoding,
				"pre-compressed variant missing"
			);
		}
	}

	let body = match probe.open_read(request_path).await {
		Ok(body) => body,
		Err(e) if is_absent(&e) => {
			tracing::debug!(path = %request_path.display(), "static source vanished, forwarding");
			return Ok(HttpOutcome::Forward);
		}
		Err(e) => return Err(StaticError::fault(request_path, e)),
	};

	Ok(HttpOutcome::Serve(ServedFile {
		served_path: asset.path.clone(),
		asset,
		encoding: None,
		vary,
		body,
	}))
}

async fn read_variant<P>(probe: &P, path: &Path) -> Result<Option<Bytes>>
where
	P: FileProbe + ?Sized,
{
	match probe.exists(path).await {
		Ok(true) => {}
		Ok(false) => return Ok(None),
		Err(e) => return Err(StaticError::fault(path, e)),
	}

	match probe.open_read(path).await {
		Ok(body) => Ok(Some(body)),
		Err(e) if is_absent(&e) => {
			tracing::warn!(path = %path.display(), "pre-compressed variant vanished before read");
			Ok(None)
		}
		Err(e) => Err(StaticError::fault(path, e)),
	}
}

/// Holds the process-wide rule list and a file probe, and answers requests
///
/// The rule list is shared read-only, so one responder can serve any number
/// of concurrent requests.
///
/// # Examples
///
/// ```
/// use pressed_static::{CompressionRule, MemoryFileProbe, VariantResponder};
/// use pressed_static::negotiation::AcceptEncoding;
/// use std::path::Path;
///
/// # tokio_test::block_on(async {
/// let probe = MemoryFileProbe::new()
///     .with_file("/srv/styles.css", "body{}")
///     .with_file("/srv/styles.css.gz", vec![0x1fu8, 0x8b]);
/// let responder = VariantResponder::new(vec![CompressionRule::gzip()], probe).unwrap();
///
/// let outcome = responder
///     .respond(Path::new("/srv/styles.css"), &AcceptEncoding::parse("gzip"))
///     .await
///     .unwrap();
/// let served = outcome.served().unwrap();
/// assert_eq!(served.encoding.as_deref(), Some("gzip"));
/// assert_eq!(served.asset.mime_type, "text/css");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct VariantResponder<P = TokioFileProbe> {
	rules: Arc<[CompressionRule]>,
	policy: FallbackPolicy,
	probe: P,
}

impl<P: FileProbe> VariantResponder<P> {
	/// Create a responder with the default [`FallbackPolicy::Identity`]
	///
	/// # Errors
	///
	/// Returns [`StaticError::InvalidRule`] if any rule fails validation or an
	/// encoding is configured twice.
	pub fn new(rules: impl Into<Arc<[CompressionRule]>>, probe: P) -> Result<Self> {
		let rules = rules.into();
		validate_rules(&rules)?;
		Ok(Self {
			rules,
			policy: FallbackPolicy::default(),
			probe,
		})
	}

	/// Set the policy used when the negotiated variant is missing
	pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// The configured rules in preference order
	pub fn rules(&self) -> &[CompressionRule] {
		&self.rules
	}

	/// The configured fallback policy
	pub fn fallback_policy(&self) -> FallbackPolicy {
		self.policy
	}

	/// The underlying file probe
	pub fn probe(&self) -> &P {
		&self.probe
	}

	/// Whether any compression rule is configured
	pub fn compression_enabled(&self) -> bool {
		!self.rules.is_empty()
	}

	/// Resolve a request; see [`respond`]
	///
	/// # Errors
	///
	/// Returns [`StaticError::FilesystemFault`] on non-absence I/O failures.
	pub async fn respond(
		&self,
		request_path: &Path,
		accepted: &AcceptEncoding,
	) -> Result<HttpOutcome> {
		respond(request_path, &self.rules, self.policy, accepted, &self.probe).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::probe::MemoryFileProbe;
	use rstest::{fixture, rstest};
	use std::io;

	const CSS: &[u8] = b"body { color: red; }";

	#[fixture]
	fn probe() -> MemoryFileProbe {
		MemoryFileProbe::new()
			.with_file("/srv/styles.css", CSS)
			.with_file("/srv/styles.css.gz", "gz-bytes")
			.with_dir("/srv/css")
	}

	fn accept(header: &str) -> AcceptEncoding {
		AcceptEncoding::parse(header)
	}

	#[rstest]
	#[tokio::test]
	async fn test_serves_negotiated_variant(probe: MemoryFileProbe) {
		let responder = VariantResponder::new(vec![CompressionRule::gzip()], probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/styles.css"), &accept("gzip"))
			.await
			.unwrap();

		let served = outcome.served().unwrap();
		assert_eq!(served.served_path, PathBuf::from("/srv/styles.css.gz"));
		assert_eq!(served.encoding.as_deref(), Some("gzip"));
		assert!(served.vary);
		assert_eq!(&served.body[..], b"gz-bytes");
		assert_eq!(served.asset.size, CSS.len() as u64);
	}

	#[rstest]
	#[tokio::test]
	async fn test_no_rules_probes_only_original(probe: MemoryFileProbe) {
		let responder = VariantResponder::new(Vec::<CompressionRule>::new(), probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/styles.css"), &accept("gzip, br"))
			.await
			.unwrap();

		let served = outcome.served().unwrap();
		assert_eq!(served.encoding, None);
		assert!(!served.vary);
		assert_eq!(
			responder.probe().probed(),
			vec![PathBuf::from("/srv/styles.css")]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_source_forwards_before_variants(probe: MemoryFileProbe) {
		let responder = VariantResponder::new(vec![CompressionRule::gzip()], probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/missing.css"), &accept("gzip"))
			.await
			.unwrap();

		assert!(outcome.is_forward());
		assert_eq!(
			responder.probe().probed(),
			vec![PathBuf::from("/srv/missing.css")]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_directory_source_forwards(probe: MemoryFileProbe) {
		let responder = VariantResponder::new(vec![CompressionRule::gzip()], probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/css"), &accept("gzip"))
			.await
			.unwrap();

		assert!(outcome.is_forward());
	}

	#[rstest]
	#[tokio::test]
	async fn test_variant_fault_is_an_error() {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/app.js", "js")
			.with_fault("/srv/app.js.br", io::ErrorKind::PermissionDenied);
		let responder = VariantResponder::new(vec![CompressionRule::brotli()], probe).unwrap();

		let result = responder
			.respond(Path::new("/srv/app.js"), &accept("br"))
			.await;

		assert!(matches!(
			result,
			Err(StaticError::FilesystemFault { ref path, .. }) if path == Path::new("/srv/app.js.br")
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_source_fault_is_an_error() {
		let probe = MemoryFileProbe::new().with_fault("/srv/app.js", io::ErrorKind::Other);
		let responder = VariantResponder::new(vec![CompressionRule::brotli()], probe).unwrap();

		let result = responder
			.respond(Path::new("/srv/app.js"), &accept("br"))
			.await;

		assert!(matches!(result, Err(StaticError::FilesystemFault { .. })));
	}

	#[rstest]
	#[tokio::test]
	async fn test_variant_removed_before_read_serves_original() {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/app.js", "js")
			.with_vanishing("/srv/app.js.br");
		let responder = VariantResponder::new(vec![CompressionRule::brotli()], probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/app.js"), &accept("br"))
			.await
			.unwrap();

		let served = outcome.served().unwrap();
		assert_eq!(served.encoding, None);
		assert_eq!(served.served_path, PathBuf::from("/srv/app.js"));
		assert_eq!(&served.body[..], b"js");
		assert!(served.vary);
	}

	#[rstest]
	#[tokio::test]
	async fn test_original_removed_before_read_forwards() {
		let probe = MemoryFileProbe::new().with_vanishing("/srv/app.js");
		let responder = VariantResponder::new(vec![CompressionRule::brotli()], probe).unwrap();

		let outcome = responder
			.respond(Path::new("/srv/app.js"), &accept("br"))
			.await
			.unwrap();

		assert!(outcome.is_forward());
	}

	#[rstest]
	#[case(CompressionRule::new("gzip\n", ".gz"))]
	#[case(CompressionRule::new("gzip", "gz"))]
	fn test_new_rejects_invalid_rules(#[case] rule: CompressionRule) {
		let result = VariantResponder::new(vec![rule], MemoryFileProbe::new());

		assert!(matches!(result, Err(StaticError::InvalidRule(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_unsendable_encoding_is_never_served_bare() {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/app.js", "js")
			.with_file("/srv/app.js.gz", "compressed");
		let rules = vec![CompressionRule::new("gzip\n", ".gz")];

		let outcome = respond(
			Path::new("/srv/app.js"),
			&rules,
			FallbackPolicy::Identity,
			&accept("*"),
			&probe,
		)
		.await
		.unwrap();
		let served = outcome.served().unwrap().clone();
		assert_eq!(&served.body[..], b"compressed");

		assert!(matches!(
			served.into_response(false),
			Err(StaticError::InvalidRule(_))
		));
	}

	#[rstest]
	fn test_into_response_headers_for_variant() {
		let served = ServedFile {
			asset: StaticAsset {
				path: PathBuf::from("/srv/styles.css"),
				mime_type: "text/css".to_string(),
				size: 20,
				modified: None,
			},
			served_path: PathBuf::from("/srv/styles.css.br"),
			encoding: Some("br".to_string()),
			vary: true,
			body: Bytes::from_static(b"br-bytes"),
		};

		let response = served.into_response(false).unwrap();

		assert_eq!(response.status, hyper::StatusCode::OK);
		assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "text/css");
		assert_eq!(response.headers.get(CONTENT_ENCODING).unwrap(), "br");
		assert_eq!(response.headers.get(VARY).unwrap(), "Accept-Encoding");
		assert_eq!(response.headers.len(), 3);
		assert_eq!(&response.body[..], b"br-bytes");
	}

	#[rstest]
	fn test_into_response_head_only_drops_body() {
		let served = ServedFile {
			asset: StaticAsset {
				path: PathBuf::from("/srv/a.txt"),
				mime_type: "text/plain".to_string(),
				size: 1,
				modified: None,
			},
			served_path: PathBuf::from("/srv/a.txt"),
			encoding: None,
			vary: false,
			body: Bytes::from_static(b"a"),
		};

		let response = served.into_response(true).unwrap();

		assert!(response.body.is_empty());
		assert!(response.headers.get(CONTENT_ENCODING).is_none());
		assert!(response.headers.get(VARY).is_none());
	}

	#[rstest]
	fn test_variant_path_keeps_original_extension() {
		assert_eq!(
			variant_path(Path::new("dir/app.min.js"), ".gz"),
			PathBuf::from("dir/app.min.js.gz")
		);
	}
}
