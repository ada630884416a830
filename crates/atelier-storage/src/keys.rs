//! Shared key generation for storage backends.

/// Directory every attachment is stored under
pub const UPLOADS_PREFIX: &str = "uploads";

/// Storage key for a content-addressed attachment filename: `uploads/{filename}`.
pub fn generate_storage_key(filename: &str) -> String {
    format!("{}/{}", UPLOADS_PREFIX, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        assert_eq!(generate_storage_key("abc.png"), "uploads/abc.png");
    }
}
