//! API constants

/// Versioned prefix of every API route
pub const API_PREFIX: &str = "/api/v0";

/// Path the stored attachment files are served under
pub const FILES_PATH: &str = "/files";
