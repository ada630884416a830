//! Atelier API Library
//!
//! HTTP surface of the submission pipeline: authentication, handlers, and
//! application setup.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
