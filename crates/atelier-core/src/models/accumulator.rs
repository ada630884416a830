//! Per-request error collection.
//!
//! Built up across every submission step; whether it is empty is the only
//! signal the coordinator uses to decide between commit and rollback.

use serde::{Deserialize, Serialize};

/// Category an accumulated message is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Images,
    Unexpected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorAccumulator {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, rename = "unexpected_errors")]
    pub unexpected: Vec<String>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ErrorCategory, message: impl Into<String>) {
        match category {
            ErrorCategory::Images => self.images.push(message.into()),
            ErrorCategory::Unexpected => self.unexpected.push(message.into()),
        }
    }

    pub fn push_image(&mut self, message: impl Into<String>) {
        self.push(ErrorCategory::Images, message);
    }

    pub fn push_unexpected(&mut self, message: impl Into<String>) {
        self.push(ErrorCategory::Unexpected, message);
    }

    pub fn merge(&mut self, other: ErrorAccumulator) {
        self.images.extend(other.images);
        self.unexpected.extend(other.unexpected);
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.unexpected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.unexpected.len()
    }

    /// Guarantee a failure body is never empty
    pub fn or_generic(mut self, message: impl Into<String>) -> Self {
        if self.is_empty() {
            self.unexpected.push(message.into());
        }
        self
    }
}
