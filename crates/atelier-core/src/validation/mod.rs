//! Validation modules

pub mod sanitize;

pub use sanitize::{is_empty_value, sanitize_field, strip_tags, ALLOWED_RICH_TEXT_TAGS};
