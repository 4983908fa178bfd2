//! # Pressed Static
//!
//! Serving of pre-compressed static assets.
//!
//! Assets are compressed ahead of time and stored next to the original, e.g.
//! `site.css`, `site.css.br` and `site.css.gz`. For each request this crate
//! picks the best variant the client accepts, falls back to the original when
//! the variant is missing, and forwards the request when the original itself
//! does not exist. Nothing is compressed at request time.
//!
//! ## Features
//!
//! - **Negotiation**: `Accept-Encoding` parsing with q-values and `*`, resolved
//!   in server rule order
//! - **Fallback**: serve uncompressed when the chosen variant is missing, or
//!   cascade through every accepted rule
//! - **Caching correctness**: `Vary: Accept-Encoding` whenever compression is
//!   configured, and `Content-Type` always taken from the original file
//! - **Manifests**: optional mapping from logical names to fingerprinted names
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pressed_http::MiddlewareChain;
//! use pressed_static::{CompressionRule, PrecompressedMiddleware, StaticConfig};
//! use std::sync::Arc;
//!
//! let config = StaticConfig::new("static", "/static/")
//!     .with_rule(CompressionRule::brotli())
//!     .with_rule(CompressionRule::gzip());
//!
//! let chain = MiddlewareChain::new(Arc::new(app))
//!     .with_middleware(Arc::new(PrecompressedMiddleware::new(config)?));
//! ```
//!
//! ## Module Structure
//!
//! - [`rule`] - Compression rules and fallback policy
//! - [`negotiation`] - `Accept-Encoding` parsing and rule selection
//! - [`probe`] - Filesystem access capability
//! - [`responder`] - Variant resolution and response assembly
//! - [`middleware`] - HTTP middleware implementation
//! - [`config`] - Configuration loading
//! - [`manifest`] - Logical to stored name mapping
//! - [`path`] - URL to filesystem path mapping
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod asset;
pub mod config;
pub mod error;
pub mod manifest;
pub mod middleware;
pub mod negotiation;
pub mod path;
pub mod probe;
pub mod responder;
pub mod rule;

// Re-export main types
pub use asset::StaticAsset;
pub use config::StaticConfig;
pub use error::{Result, StaticError};
pub use manifest::StaticManifest;
pub use middleware::PrecompressedMiddleware;
pub use negotiation::{AcceptEncoding, NegotiationResult, negotiate};
pub use probe::{FileMeta, FileProbe, MemoryFileProbe, TokioFileProbe};
pub use responder::{HttpOutcome, ServedFile, VariantResponder};
pub use rule::{CompressionRule, FallbackPolicy, validate_rules};
