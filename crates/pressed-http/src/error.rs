//! Error type for the request pipeline

/// Result type used by handlers and middleware.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while processing a request.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The request could not be built or understood.
	#[error("HTTP error: {0}")]
	Http(String),

	/// No handler was able to produce a response for the request.
	#[error("Not found: {0}")]
	NotFound(String),

	/// The server failed while producing a response.
	#[error("Internal server error: {0}")]
	Internal(String),

	/// A response body could not be serialized.
	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl Error {
	/// Returns the HTTP status code this error maps to.
	///
	/// # Examples
	///
	/// ```
	/// use pressed_http::Error;
	///
	/// assert_eq!(Error::NotFound("/missing".into()).status_code(), 404);
	/// assert_eq!(Error::Internal("disk".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Http(_) => 400,
			Error::NotFound(_) => 404,
			Error::Internal(_) | Error::Serialization(_) => 500,
		}
	}
}
