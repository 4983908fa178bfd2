//! # Pressed
//!
//! Pre-compressed static asset delivery for Rust web services.
//!
//! Static files are compressed at build time and stored beside the original
//! (`app.js`, `app.js.br`, `app.js.gz`). At request time Pressed negotiates
//! `Accept-Encoding` against an ordered rule list, serves the best variant that
//! exists on disk, and forwards anything it cannot serve to the application.
//!
//! ## Crates
//!
//! - [`http`] - Request, response and middleware primitives
//! - [`static_files`] - Negotiation, variant resolution and the static middleware
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pressed::http::{Handler, MiddlewareChain, Request, Response, Result};
//! use pressed::static_files::{CompressionRule, PrecompressedMiddleware, StaticConfig};
//! use std::sync::Arc;
//!
//! struct App;
//!
//! #[async_trait::async_trait]
//! impl Handler for App {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::not_found())
//!     }
//! }
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = StaticConfig::new("static", "/static/")
//!     .with_rule(CompressionRule::brotli())
//!     .with_rule(CompressionRule::gzip());
//!
//! let chain = MiddlewareChain::new(Arc::new(App))
//!     .with_middleware(Arc::new(PrecompressedMiddleware::new(config)?));
//! # let _ = chain;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Request, response and middleware primitives
pub mod http {
	pub use pressed_http::*;
}

/// Pre-compressed static file serving
pub mod static_files {
	pub use pressed_static::*;
}

/// Commonly used types
pub mod prelude {
	pub use pressed_http::{Handler, Middleware, MiddlewareChain, Request, Response};
	pub use pressed_static::{
		AcceptEncoding, CompressionRule, FallbackPolicy, PrecompressedMiddleware, StaticConfig,
		VariantResponder,
	};
}
