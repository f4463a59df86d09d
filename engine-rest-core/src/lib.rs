//! Engine REST core: everything between an HTTP request and the engine
//! that does not depend on the HTTP framework.
//!
//! - [`value`]: typed variable values and their `{value, type, valueInfo}`
//!   wire form.
//! - [`query`]: declarative filter binding, sort validation, paging.
//! - [`resource`]: the filter/sort tables of each queryable resource.
//! - [`engine`]: the engine contracts plus an in-memory engine.

pub mod engine;
pub mod error;
pub mod query;
pub mod resource;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{EngineError, EngineErrorKind, RestError};
