//! # Pressed HTTP
//!
//! Request, response and middleware primitives used by the static asset layer.
//!
//! The types here are the host-facing surface: a [`Handler`] produces a
//! [`Response`] for a [`Request`], and a [`Middleware`] either answers a request
//! itself or forwards it to the next handler in a [`MiddlewareChain`].

#![warn(missing_docs)]

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;
