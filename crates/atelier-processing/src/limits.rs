//! Platform size ceiling.

use atelier_core::UploadLimits;
use std::sync::OnceLock;

/// The effective maximum upload size: the smallest of the configured ceilings.
///
/// Computed on first use and cached for the lifetime of the value; the limits
/// never change within a process, so reads need no locking.
#[derive(Debug)]
pub struct SizeCeiling {
    limits: UploadLimits,
    cached: OnceLock<u64>,
}

impl SizeCeiling {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            limits,
            cached: OnceLock::new(),
        }
    }

    /// Maximum accepted size in bytes (`u64::MAX` when unlimited)
    pub fn max_bytes(&self) -> u64 {
        *self.cached.get_or_init(|| {
            let max = self.limits.effective_max();
            tracing::debug!(max_bytes = max, "Computed upload size ceiling");
            max
        })
    }

    pub fn exceeds(&self, size: u64) -> bool {
        size > self.max_bytes()
    }

    /// Human-readable ceiling, e.g. `"8 MB"`
    pub fn describe(&self) -> String {
        format_size(self.max_bytes())
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        u64::MAX => "unlimited".to_string(),
        b if b >= GB && b % GB == 0 => format!("{} GB", b / GB),
        b if b >= MB && b % MB == 0 => format!("{} MB", b / MB),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{} KB", b / KB),
        b => format!("{} bytes", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_minimum_of_limits() {
        let ceiling = SizeCeiling::new(UploadLimits::from_megabytes(8, 2, 128));
        assert_eq!(ceiling.max_bytes(), 2 * 1024 * 1024);
        assert_eq!(ceiling.describe(), "2 MB");
        assert!(ceiling.exceeds(2 * 1024 * 1024 + 1));
        assert!(!ceiling.exceeds(2 * 1024 * 1024));
    }

    #[test]
    fn test_unlimited_ceiling() {
        let ceiling = SizeCeiling::new(UploadLimits::from_megabytes(0, 0, 0));
        assert_eq!(ceiling.describe(), "unlimited");
        assert!(!ceiling.exceeds(u64::MAX - 1));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(64 * 1024), "64 KB");
        assert_eq!(format_size(1536 * 1024), "1.5 MB");
    }
}
