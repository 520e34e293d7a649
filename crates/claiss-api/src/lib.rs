//! Claiss API Library
//!
//! This crate provides the HTTP API handlers, middleware, and application setup.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
