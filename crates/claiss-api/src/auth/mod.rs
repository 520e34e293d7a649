//! Bearer-token gate for every `/api/*` route.

pub mod middleware;

pub use middleware::{auth_middleware, AuthState};
