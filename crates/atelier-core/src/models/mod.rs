pub mod accumulator;
pub mod actor;
pub mod association;
pub mod attachment;
pub mod content;
pub mod schema;

pub use accumulator::{ErrorAccumulator, ErrorCategory};
pub use actor::{Actor, Capability, Role};
pub use association::ContestEntry;
pub use attachment::{Attachment, AttachmentRef, NewAttachment};
pub use content::{ContentItem, ContentStatus, ContentType, CoreFields, NewContent};
pub use schema::{
    ContentSchema, FieldDescriptor, Sanitizer, SchemaSection, COLLABORATORS_KEY,
    CREATION_TYPE_GROUP, CREATION_TYPE_KEY, GALLERY_KEY,
};
