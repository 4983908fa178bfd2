//! Middleware serving pre-compressed static files
//!
//! Requests under the configured URL prefix are mapped onto the static root
//! and answered by a [`VariantResponder`]. Anything the responder cannot serve
//! is forwarded to the next handler untouched.

use crate::config::StaticConfig;
use crate::error::Result;
use crate::manifest::StaticManifest;
use crate::negotiation::AcceptEncoding;
use crate::path::{matches_prefix, resolve_request_path};
use crate::probe::{FileProbe, TokioFileProbe};
use crate::responder::{HttpOutcome, VariantResponder};
use async_trait::async_trait;
use hyper::Method;
use pressed_http::{Handler, Middleware, Request, Response};
use std::path::PathBuf;
use std::sync::Arc;

/// Serves pre-compressed variants of static files
///
/// Only `GET` and `HEAD` requests under the URL prefix are handled. A `HEAD`
/// response carries the same headers as `GET` with an empty body.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use hyper::header::CONTENT_ENCODING;
/// use pressed_http::{Handler, Middleware, Request, Response, Result};
/// use pressed_static::{CompressionRule, MemoryFileProbe, PrecompressedMiddleware, StaticConfig};
/// use std::sync::Arc;
///
/// struct NotFound;
///
/// #[async_trait::async_trait]
/// impl Handler for NotFound {
///     async fn handle(&self, _request: Request) -> Result<Response> {
///         Ok(Response::not_found())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let config = StaticConfig::new("/srv/static", "/static/").with_rule(CompressionRule::brotli());
/// let probe = MemoryFileProbe::new()
///     .with_file("/srv/static/app.js", "console.log(1);")
///     .with_file("/srv/static/app.js.br", Bytes::from_static(b"br"));
/// let middleware = PrecompressedMiddleware::with_probe(config, probe).unwrap();
///
/// let request = Request::builder()
///     .uri("/static/app.js")
///     .header("accept-encoding", "br, gzip")
///     .build()
///     .unwrap();
/// let response = middleware.process(request, Arc::new(NotFound)).await.unwrap();
///
/// assert_eq!(response.headers.get(CONTENT_ENCODING).unwrap(), "br");
/// # });
/// ```
pub struct PrecompressedMiddleware<P = TokioFileProbe> {
	root: PathBuf,
	url_prefix: String,
	manifest: Option<StaticManifest>,
	responder: VariantResponder<P>,
}

impl PrecompressedMiddleware<TokioFileProbe> {
	/// Create middleware reading from the real filesystem
	///
	/// # Errors
	///
	/// Returns error if the configuration is invalid or the manifest cannot
	/// be loaded.
	pub fn new(config: StaticConfig) -> Result<Self> {
		Self::with_probe(config, TokioFileProbe::new())
	}
}

impl<P: FileProbe> PrecompressedMiddleware<P> {
	/// Create middleware over an arbitrary [`FileProbe`]
	///
	/// # Errors
	///
	/// Returns error if the configuration is invalid or the manifest cannot
	/// be loaded.
	pub fn with_probe(config: StaticConfig, probe: P) -> Result<Self> {
		config.validate()?;

		let manifest = match &config.manifest {
			Some(path) => {
				let manifest = StaticManifest::load(path)?;
				tracing::info!(
					path = %path.display(),
					entries = manifest.len(),
					"loaded static manifest"
				);
				Some(manifest)
			}
			None => None,
		};

		let StaticConfig {
			root,
			url_prefix,
			compression,
			fallback,
			..
		} = config;

		tracing::info!(
			root = %root.display(),
			prefix = %url_prefix,
			rules = compression.len(),
			fallback = ?fallback,
			"static file serving configured"
		);

		Ok(Self {
			root,
			url_prefix,
			manifest,
			responder: VariantResponder::new(compression, probe)?.with_fallback_policy(fallback),
		})
	}

	/// The responder answering mapped requests
	pub fn responder(&self) -> &VariantResponder<P> {
		&self.responder
	}

	/// The URL prefix this middleware answers under
	pub fn url_prefix(&self) -> &str {
		&self.url_prefix
	}

	fn handles(&self, request: &Request) -> bool {
		(request.method == Method::GET || request.method == Method::HEAD)
			&& matches_prefix(request.path(), &self.url_prefix)
	}
}

#[async_trait]
impl<P: FileProbe + 'static> Middleware for PrecompressedMiddleware<P> {
	async fn process(
		&self,
		request: Request,
		next: Arc<dyn Handler>,
	) -> pressed_http::Result<Response> {
		if !self.handles(&request) {
			return next.handle(request).await;
		}

		let Some(file_path) = resolve_request_path(
			request.path(),
			&self.url_prefix,
			&self.root,
			self.manifest.as_ref(),
		) else {
			return next.handle(request).await;
		};

		let accepted = AcceptEncoding::from_headers(&request.headers);
		let head_only = request.method == Method::HEAD;
		let served = match self.responder.respond(&file_path, &accepted).await {
			Ok(HttpOutcome::Serve(file)) => file.into_response(head_only),
			Ok(HttpOutcome::Forward) => return next.handle(request).await,
			Err(e) => Err(e),
		};

		served.map_err(|e| {
			tracing::error!(path = %request.path(), error = %e, "static file lookup failed");
			pressed_http::Error::from(e)
		})
	}

	fn should_continue(&self, request: &Request) -> bool {
		self.handles(request)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::probe::MemoryFileProbe;
	use crate::rule::CompressionRule;
	use hyper::StatusCode;
	use hyper::header::{CONTENT_ENCODING, CONTENT_TYPE, VARY};
	use rstest::rstest;
	use std::io;

	struct Fallthrough;

	#[async_trait]
	impl Handler for Fallthrough {
		async fn handle(&self, _request: Request) -> pressed_http::Result<Response> {
			Ok(Response::not_found().with_body("fallthrough"))
		}
	}

	fn middleware(probe: MemoryFileProbe) -> PrecompressedMiddleware<MemoryFileProbe> {
		let config = StaticConfig::new("/srv", "/static/")
			.with_rules([CompressionRule::gzip(), CompressionRule::brotli()]);
		PrecompressedMiddleware::with_probe(config, probe).unwrap()
	}

	fn get(uri: &str, accept_encoding: &str) -> Request {
		Request::builder()
			.uri(uri)
			.header("accept-encoding", accept_encoding)
			.build()
			.unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_serves_variant() {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/site.css", "body{}")
			.with_file("/srv/site.css.gz", "gz");
		let middleware = middleware(probe);

		let response = middleware
			.process(get("/static/site.css", "gzip, br"), Arc::new(Fallthrough))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.headers.get(CONTENT_ENCODING).unwrap(), "gzip");
		assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "text/css");
		assert_eq!(response.headers.get(VARY).unwrap(), "Accept-Encoding");
		assert_eq!(&response.body[..], b"gz");
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_file_forwards() {
		let middleware = middleware(MemoryFileProbe::new());

		let response = middleware
			.process(get("/static/none.css", "gzip"), Arc::new(Fallthrough))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert_eq!(&response.body[..], b"fallthrough");
	}

	#[rstest]
	#[tokio::test]
	async fn test_traversal_forwards_without_probing() {
		let middleware = middleware(MemoryFileProbe::new().with_file("/etc/passwd", "root"));

		let response = middleware
			.process(get("/static/%2e%2e/etc/passwd", ""), Arc::new(Fallthrough))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(middleware.responder().probe().probed().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_fault_is_internal_error() {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/app.js", "js")
			.with_fault("/srv/app.js.br", io::ErrorKind::PermissionDenied);
		let middleware = middleware(probe);

		let error = middleware
			.process(get("/static/app.js", "br"), Arc::new(Fallthrough))
			.await
			.unwrap_err();

		assert!(matches!(error, pressed_http::Error::Internal(_)));
		assert_eq!(error.status_code(), 500);
		assert!(!error.to_string().contains("/srv"));
	}

	#[rstest]
	#[case(Method::GET, "/api/users", false)]
	#[case(Method::POST, "/static/app.js", false)]
	#[case(Method::GET, "/static/app.js", true)]
	#[case(Method::HEAD, "/static/app.js", true)]
	fn test_should_continue(#[case] method: Method, #[case] uri: &str, #[case] expected: bool) {
		let middleware = middleware(MemoryFileProbe::new());
		let request = Request::builder().method(method).uri(uri).build().unwrap();

		assert_eq!(middleware.should_continue(&request), expected);
	}

	#[rstest]
	#[case("/staticapp.js")]
	#[case("/static-admin/app.js")]
	#[tokio::test]
	async fn test_prefix_needs_segment_boundary(#[case] uri: &str) {
		let probe = MemoryFileProbe::new()
			.with_file("/srv/app.js", "js")
			.with_file("/srv/-admin/app.js", "js");
		let mut config = StaticConfig::new("/srv", "/static/");
		config.url_prefix = "/static".to_string();
		assert!(PrecompressedMiddleware::with_probe(config, MemoryFileProbe::new()).is_err());

		let middleware = middleware(probe);
		let request = get(uri, "");
		assert!(!middleware.should_continue(&request));

		let response = middleware
			.process(request, Arc::new(Fallthrough))
			.await
			.unwrap();
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(middleware.responder().probe().probed().is_empty());
	}

	#[rstest]
	fn test_invalid_config_rejected() {
		let config = StaticConfig::new("/srv", "/static/")
			.with_rules([CompressionRule::gzip(), CompressionRule::gzip()]);

		assert!(PrecompressedMiddleware::with_probe(config, MemoryFileProbe::new()).is_err());
	}
}
