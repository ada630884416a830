//! Atelier Storage Library
//!
//! Byte storage for validated uploads. The [`Storage`] trait is what the
//! upload engine talks to; [`LocalStorage`] is the filesystem backend.
//!
//! # Storage key format
//!
//! Every attachment lands in one shared namespace, `uploads/{filename}`, which
//! is why the upload engine has to pick names that do not collide. Keys must not
//! contain `..` or a leading `/`.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::generate_storage_key;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
