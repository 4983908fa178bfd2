//! HTTP response type

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	/// Response status
	pub status: StatusCode,
	/// Response headers
	pub headers: HeaderMap,
	/// Response body
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 404 Not Found status
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Response;
	///
	/// let response = Response::ok().with_body("body { color: red; }");
	/// assert_eq!(&response.body[..], b"body { color: red; }");
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header from string parts; invalid names or values are ignored
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Response;
	///
	/// let response = Response::ok().with_header("Vary", "Accept-Encoding");
	/// assert_eq!(response.headers.get("vary").unwrap(), "Accept-Encoding");
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Set a header from already typed parts
	pub fn with_typed_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let body = serde_json::json!({
			"error": error.to_string(),
		});

		match serde_json::to_vec(&body) {
			Ok(json) => Response::new(status)
				.with_typed_header(
					hyper::header::CONTENT_TYPE,
					HeaderValue::from_static("application/json"),
				)
				.with_body(json),
			Err(_) => Response::internal_server_error(),
		}
	}
}
