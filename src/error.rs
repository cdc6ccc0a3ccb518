//! Error taxonomy for schema derivation, decoding and encoding.
use std::any::TypeId;
use thiserror::Error;

use crate::shape::Shape;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Everything that can go wrong while deriving a schema or moving an enum
/// value in and out of JSON.
#[derive(Debug, Error)]
pub enum Error {
    /// The enum's declaration breaks the structural contract.
    #[error("tagged-json: malformed enum type {enum_name}: {violation}")]
    MalformedSchema {
        enum_name: &'static str,
        #[source]
        violation: SchemaViolation,
    },

    /// The dynamic destination/source isn't a registered tagged enum.
    #[error("tagged-json: {type_id:?} is not a registered tagged enum type")]
    InvalidTarget { type_id: TypeId },

    /// Input isn't a JSON object holding a string tag.
    #[error("tagged-json: reading enum tag from field {tag_field:?} of {enum_name}: {source}")]
    TagExtractionFailed {
        enum_name: &'static str,
        tag_field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tagged-json: unknown tag {tag:?} for enum type {enum_name}")]
    UnknownTag { enum_name: &'static str, tag: String },

    /// The payload doesn't fit the variant selected by the tag.
    #[error(
        "tagged-json: decoding enum value into type {variant_type} (tag {tag:?} of {enum_name}) at {path}: {source}"
    )]
    VariantDecodeFailed {
        enum_name: &'static str,
        tag: String,
        variant_type: &'static str,
        /// JSON path inside the payload where decoding stopped.
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value holds a variant type that has no tag.
    #[error("tagged-json: value type {variant_type} doesn't have an associated tag in enum type {enum_name}")]
    UntaggedVariant {
        enum_name: &'static str,
        variant_type: &'static str,
    },

    #[error("tagged-json: encoding enum value of type {variant_type} (tag {tag:?} of {enum_name}): {source}")]
    VariantEncodeFailed {
        enum_name: &'static str,
        tag: String,
        variant_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the finished envelope failed.
    #[error("tagged-json: writing {enum_name} as JSON: {source}")]
    Codec {
        enum_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The specific structural rule a declaration broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("no tag field declared")]
    MissingTagField,
    #[error("tag field name {0:?} is reserved")]
    ReservedTagField(String),
    #[error("value field name {0:?} is reserved")]
    ReservedValueField(String),
    #[error("tag field and value field are both named {0:?}")]
    FieldCollision(String),
    #[error("value layout declared as both nested and embedded")]
    ConflictingValueMode,
    #[error("variant type {variant_type} has an empty tag")]
    EmptyTag { variant_type: &'static str },
    #[error("tag {tag:?} is declared more than once")]
    DuplicateTag { tag: String },
    #[error("variant type {variant_type} is declared under both tag {first:?} and tag {second:?}")]
    DuplicateVariantType {
        variant_type: &'static str,
        first: String,
        second: String,
    },
    #[error("variant type {variant_type} (tag {tag:?}) is a {shape}, which can't be embedded in an object")]
    NotEmbeddable {
        tag: String,
        variant_type: &'static str,
        shape: Shape,
    },
    #[error("embedded variant type {variant_type} (tag {tag:?}) declares field {field:?}, which is the tag field")]
    EmbeddedFieldCollision {
        tag: String,
        variant_type: &'static str,
        field: String,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Error {
    pub(crate) fn malformed(enum_name: &'static str, violation: SchemaViolation) -> Self {
        Self::MalformedSchema { enum_name, violation }
    }

    /// The enum type involved, when the error is tied to one.
    pub fn enum_name(&self) -> Option<&'static str> {
        match self {
            Self::InvalidTarget { .. } => None,
            Self::MalformedSchema { enum_name, .. }
            | Self::TagExtractionFailed { enum_name, .. }
            | Self::UnknownTag { enum_name, .. }
            | Self::VariantDecodeFailed { enum_name, .. }
            | Self::UntaggedVariant { enum_name, .. }
            | Self::VariantEncodeFailed { enum_name, .. }
            | Self::Codec { enum_name, .. } => Some(enum_name),
        }
    }

    /// The tag involved, when the error is tied to one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::UnknownTag { tag, .. }
            | Self::VariantDecodeFailed { tag, .. }
            | Self::VariantEncodeFailed { tag, .. } => Some(tag),
            _ => None,
        }
    }
}
