//! Atelier DB Library
//!
//! Repository contracts for content items, attachments, users and contest
//! entries, with PostgreSQL implementations and an in-memory store used by
//! tests and database-less local runs.

pub mod db;

pub use db::*;
