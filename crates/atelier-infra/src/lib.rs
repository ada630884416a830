//! Atelier Infrastructure Library
//!
//! Shared infrastructure used by the API and the submission services:
//! - Scoped anti-forgery tokens
//! - Telemetry initialization

pub mod csrf;
pub mod telemetry;

// Re-export commonly used types
pub use csrf::{scope_for, AntiForgery, TokenError, NEW_SCOPE};
pub use telemetry::init_telemetry;
