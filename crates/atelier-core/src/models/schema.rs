//! Content schemas.
//!
//! One [`ContentSchema`] per content type lists its metadata fields grouped by
//! section. The same object is served to form renderers and read by the
//! publish gate, so requiredness is declared in exactly one place.

use serde::Serialize;

use super::content::ContentType;

/// Metadata key holding the collaborator id list of a project
pub const COLLABORATORS_KEY: &str = "collaborators";
/// Metadata key holding the ordered gallery attachment ids
pub const GALLERY_KEY: &str = "gallery";
/// Metadata key deciding whether a project is an individual or group effort
pub const CREATION_TYPE_KEY: &str = "creation_type";
/// `creation_type` value that enables collaborator reconciliation
pub const CREATION_TYPE_GROUP: &str = "group";

/// Filter applied to a raw submitted value before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum Sanitizer {
    /// Single line, tags stripped, whitespace collapsed
    Text,
    /// Multi-line, tags stripped, line breaks kept
    Textarea,
    /// Markup restricted to an allow-list of tags
    RichText,
    /// Absolute http(s) URL
    Url,
    /// ISO `YYYY-MM-DD` date
    Date,
    /// One value out of a fixed set
    Choice(&'static [&'static str]),
    /// List of UUIDs
    IdList,
}

/// Declares one metadata key of a content type
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub required: bool,
    /// Write the sanitized value even when it is empty (clears stale values)
    pub always_update: bool,
    pub sanitizer: Option<Sanitizer>,
}

impl FieldDescriptor {
    pub const fn new(id: &'static str, label: &'static str, sanitizer: Sanitizer) -> Self {
        Self {
            id,
            label,
            required: false,
            always_update: false,
            sanitizer: Some(sanitizer),
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn always_update(mut self) -> Self {
        self.always_update = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaSection {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentSchema {
    pub content_type: ContentType,
    pub sections: Vec<SchemaSection>,
    /// Whether a requested `published` status goes through the publish gate
    pub publish_gated: bool,
    /// Metadata key whose value drives the classification category
    pub classification_field: Option<&'static str>,
}

const PROJECT_LICENSES: &[&str] = &["cc-by", "cc-by-sa", "cc0", "all-rights-reserved"];
const CREATION_TYPES: &[&str] = &["individual", CREATION_TYPE_GROUP];

impl ContentSchema {
    pub fn for_type(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Project => Self::project(),
            ContentType::Contest => Self::contest(),
        }
    }

    fn project() -> Self {
        Self {
            content_type: ContentType::Project,
            sections: vec![
                SchemaSection {
                    id: "details",
                    title: "Project details",
                    fields: vec![
                        FieldDescriptor::new(
                            CREATION_TYPE_KEY,
                            "Creation type",
                            Sanitizer::Choice(CREATION_TYPES),
                        )
                        .always_update(),
                        FieldDescriptor::new(COLLABORATORS_KEY, "Collaborators", Sanitizer::IdList)
                            .always_update(),
                        FieldDescriptor::new("project_url", "Project website", Sanitizer::Url),
                        FieldDescriptor::new("video_url", "Video", Sanitizer::Url),
                        FieldDescriptor::new(
                            "license",
                            "License",
                            Sanitizer::Choice(PROJECT_LICENSES),
                        ),
                    ],
                },
                SchemaSection {
                    id: "classification",
                    title: "Classification",
                    fields: vec![FieldDescriptor::new(
                        "project_category",
                        "Category",
                        Sanitizer::Text,
                    )
                    .always_update()],
                },
                SchemaSection {
                    id: "media",
                    title: "Media",
                    fields: vec![
                        FieldDescriptor::new(GALLERY_KEY, "Gallery", Sanitizer::IdList)
                            .always_update(),
                    ],
                },
            ],
            publish_gated: false,
            classification_field: Some("project_category"),
        }
    }

    fn contest() -> Self {
        Self {
            content_type: ContentType::Contest,
            sections: vec![
                SchemaSection {
                    id: "rules",
                    title: "Rules and terms",
                    fields: vec![
                        FieldDescriptor::new("terms", "Terms and conditions", Sanitizer::RichText)
                            .required()
                            .always_update(),
                        FieldDescriptor::new("rules", "Rules", Sanitizer::RichText)
                            .required()
                            .always_update(),
                        FieldDescriptor::new("prizes", "Prizes", Sanitizer::RichText)
                            .always_update(),
                    ],
                },
                SchemaSection {
                    id: "schedule",
                    title: "Schedule",
                    fields: vec![
                        FieldDescriptor::new("start_date", "Start date", Sanitizer::Date)
                            .required()
                            .always_update(),
                        FieldDescriptor::new("end_date", "End date", Sanitizer::Date)
                            .required()
                            .always_update(),
                    ],
                },
                SchemaSection {
                    id: "classification",
                    title: "Classification",
                    fields: vec![FieldDescriptor::new(
                        "contest_category",
                        "Category",
                        Sanitizer::Text,
                    )
                    .always_update()],
                },
                SchemaSection {
                    id: "media",
                    title: "Media",
                    fields: vec![
                        FieldDescriptor::new(GALLERY_KEY, "Gallery", Sanitizer::IdList)
                            .always_update(),
                    ],
                },
            ],
            publish_gated: true,
            classification_field: Some("contest_category"),
        }
    }

    /// All field descriptors, section-agnostic, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.id == id)
    }

    pub fn has_collaborators(&self) -> bool {
        self.field(COLLABORATORS_KEY).is_some()
    }
}
