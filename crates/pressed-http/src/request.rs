//! HTTP request type and builder

use bytes::Bytes;
use hyper::header::HeaderName;
use hyper::{HeaderMap, Method, Uri, Version};

use crate::{Error, Result};

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct Request {
	/// Request method
	pub method: Method,
	/// Request target
	pub uri: Uri,
	/// Protocol version
	pub version: Version,
	/// Request headers
	pub headers: HeaderMap,
	/// Request body
	pub body: Bytes,
}

impl Request {
	/// Create a new request from its parts
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Request;
	/// use hyper::{HeaderMap, Method, Uri, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     Uri::from_static("/static/app.js"),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/static/app.js");
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::HEAD)
	///     .uri("/static/site.css")
	///     .header("accept-encoding", "br, gzip")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.method, Method::HEAD);
	/// assert_eq!(request.header("Accept-Encoding"), Some("br, gzip"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Returns the path component of the request URI
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Returns the first value of a header as a string, if present and valid UTF-8
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: HeaderMap,
	body: Bytes,
	invalid_header: Option<String>,
}

impl RequestBuilder {
	/// Set the request method (defaults to `GET`)
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	/// Set the request URI (defaults to `/`)
	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Set the HTTP version (defaults to HTTP/1.1)
	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	/// Replace all headers
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a single header; repeated names keep every value
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			value.parse::<hyper::header::HeaderValue>(),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	/// Set the request body
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Build the request
	///
	/// # Errors
	///
	/// Returns [`Error::Http`] if the URI or a header could not be parsed.
	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::Http(format!("invalid header: {}", name)));
		}

		let uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse::<Uri>()
			.map_err(|e| Error::Http(e.to_string()))?;

		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			version: self.version.unwrap_or(Version::HTTP_11),
			headers: self.headers,
			body: self.body,
		})
	}
}
