//! HTTP surface of the engine REST facade.
//!
//! Routes are built by [`router::build_router`]; handlers translate between
//! axum extractors and the framework-free pieces in `engine_rest_core`.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
