//! Types for the upload pipeline.

use bytes::Bytes;

use crate::image::ImageKind;

/// What the transport layer reported for one file field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportError {
    #[default]
    Ok,
    /// The field was present but no file was chosen
    NoFile,
    /// The file was cut off because it exceeded the size ceiling
    ExceedsLimit,
    /// The upload stopped before the file was complete
    Partial,
}

/// One file as received from the client, before any validation
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    /// Client-supplied file name
    pub name: String,
    /// Client-supplied mime type, never trusted
    pub declared_mime: String,
    pub transport_error: TransportError,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, declared_mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            declared_mime: declared_mime.into(),
            transport_error: TransportError::Ok,
            data: data.into(),
        }
    }

    /// An empty file slot, as sent by a form whose file input was left blank
    pub fn empty() -> Self {
        Self {
            transport_error: TransportError::NoFile,
            ..Self::default()
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Nothing was submitted in this slot
    pub fn is_empty_slot(&self) -> bool {
        self.name.trim().is_empty()
            && (self.transport_error == TransportError::NoFile || self.data.is_empty())
    }
}

/// A file that passed every intake check and is ready to be stored
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub original_name: String,
    /// Client name with its extension corrected to the detected type
    pub corrected_name: String,
    pub declared_mime: String,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl ValidatedImage {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}
