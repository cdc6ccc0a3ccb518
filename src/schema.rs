//! Enum declarations and the schema derived from them.
//!
//! A host type becomes a tagged enum by implementing [`TaggedEnum`]: it
//! names the JSON field holding the tag, says whether variant payloads sit
//! under a value field or are embedded next to the tag, and lists its
//! `(tag, variant type)` pairs. [`EnumSchema::derive`] checks the
//! declaration and produces the immutable metadata the codec runs on.
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, SchemaViolation};
use crate::path_de::{self, PathError};
use crate::shape::Shape;

/// Field name that stands for "no field" and can't be used as either key.
pub const RESERVED_FIELD: &str = "-";

// ————————————————————————————————————————————————————————————————————————————
// HOST TRAITS
// ————————————————————————————————————————————————————————————————————————————

/// A type whose values hold exactly one of a declared set of variants.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use tagged_json::{SchemaBuilder, TaggedEnum, Variant};
///
/// #[derive(Serialize, Deserialize)]
/// struct ItemAdded { item_id: String, quantity: u32 }
///
/// #[derive(Serialize, Deserialize)]
/// struct Checkout;
///
/// enum CartEvent {
///     ItemAdded(ItemAdded),
///     Checkout(Checkout),
/// }
///
/// impl TaggedEnum for CartEvent {
///     fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
///         schema
///             .tag_field("type")
///             .value_field("value")
///             .variant("item_added", Self::ItemAdded)
///             .variant("checkout", Self::Checkout)
///     }
///
///     fn variant(&self) -> &dyn Variant {
///         match self {
///             Self::ItemAdded(v) => v,
///             Self::Checkout(v) => v,
///         }
///     }
/// }
///
/// let event: CartEvent = tagged_json::from_str(r#"{"type": "checkout"}"#).unwrap();
/// assert!(matches!(event, CartEvent::Checkout(_)));
/// ```
pub trait TaggedEnum: Sized + 'static {
    /// Declare the tag field, value layout and variants.
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self>;

    /// The payload currently held. Its concrete type picks the tag on encode,
    /// so return the payload itself, never a box or reference around it.
    fn variant(&self) -> &dyn Variant;
}

/// Type identity of a variant payload.
pub trait Variant: Any {
    fn as_any(&self) -> &dyn Any;
    fn variant_type_name(&self) -> &'static str;
}

impl<T: Any> Variant for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn variant_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

/// Where a variant's payload lives in the enum's JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueMode {
    /// `{"<tag>": "...", "<field>": <payload>}`
    Nested(String),
    /// `{"<tag>": "...", <payload's own fields>}`
    Embedded,
}

type DecodeFn<E> = Box<dyn Fn(Value) -> Result<E, PathError> + Send + Sync>;
type EncodeFn = fn(&dyn Any) -> Option<Result<Value, serde_json::Error>>;

/// One `(tag, variant type)` pair of a schema.
pub struct VariantShape<E> {
    tag: String,
    type_id: TypeId,
    type_name: &'static str,
    shape: Shape,
    decode: DecodeFn<E>,
    encode: EncodeFn,
}

impl<E> VariantShape<E> {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub(crate) fn decode(&self, payload: Value) -> Result<E, PathError> {
        (self.decode)(payload)
    }

    /// `None` if `variant` isn't of this shape's type.
    pub(crate) fn encode(&self, variant: &dyn Any) -> Option<Result<Value, serde_json::Error>> {
        (self.encode)(variant)
    }
}

impl<E> fmt::Debug for VariantShape<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantShape")
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Validated metadata for one [`TaggedEnum`] type.
pub struct EnumSchema<E> {
    tag_field: String,
    value_mode: ValueMode,
    variants: IndexMap<String, VariantShape<E>>,
    by_type: HashMap<TypeId, usize>,
    _enum: PhantomData<fn() -> E>,
}

impl<E: TaggedEnum> EnumSchema<E> {
    /// Run the enum's declaration through the structural checks.
    ///
    /// Pure and uncached; see [`crate::schema`] for the cached lookup.
    pub fn derive() -> Result<Self, Error> {
        E::describe(SchemaBuilder::new()).build()
    }

    pub fn enum_name(&self) -> &'static str {
        type_name::<E>()
    }

    pub fn tag_field(&self) -> &str {
        &self.tag_field
    }

    pub fn value_mode(&self) -> &ValueMode {
        &self.value_mode
    }

    pub fn is_embedded(&self) -> bool {
        self.value_mode == ValueMode::Embedded
    }

    /// Variants in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = &VariantShape<E>> {
        self.variants.values()
    }

    pub fn variant(&self, tag: &str) -> Option<&VariantShape<E>> {
        self.variants.get(tag)
    }

    /// The variant registered for a payload type.
    pub fn tag_of(&self, type_id: TypeId) -> Option<&VariantShape<E>> {
        let index = *self.by_type.get(&type_id)?;
        self.variants.get_index(index).map(|(_, shape)| shape)
    }
}

impl<E> fmt::Debug for EnumSchema<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumSchema")
            .field("tag_field", &self.tag_field)
            .field("value_mode", &self.value_mode)
            .field("variants", &self.variants.values().collect::<Vec<_>>())
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDER
// ————————————————————————————————————————————————————————————————————————————

/// Collects an enum's declaration; checked by [`SchemaBuilder::build`].
pub struct SchemaBuilder<E> {
    tag_field: Option<String>,
    value_mode: Option<ValueMode>,
    mode_conflict: bool,
    variants: Vec<VariantShape<E>>,
}

impl<E: TaggedEnum> Default for SchemaBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TaggedEnum> SchemaBuilder<E> {
    pub fn new() -> Self {
        Self {
            tag_field: None,
            value_mode: None,
            mode_conflict: false,
            variants: Vec::new(),
        }
    }

    /// JSON field holding the tag.
    pub fn tag_field(mut self, name: &str) -> Self {
        self.tag_field = Some(name.to_owned());
        self
    }

    /// Payloads go under `name`.
    pub fn value_field(self, name: &str) -> Self {
        self.with_mode(ValueMode::Nested(name.to_owned()))
    }

    /// Payload fields sit next to the tag. The default layout.
    pub fn embedded(self) -> Self {
        self.with_mode(ValueMode::Embedded)
    }

    /// Map `tag` to payload type `T`; `wrap` puts a decoded `T` into the enum.
    pub fn variant<T>(mut self, tag: &str, wrap: fn(T) -> E) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.variants.push(VariantShape {
            tag: tag.to_owned(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: Shape::of::<T>(),
            decode: Box::new(move |payload: Value| path_de::from_value_with_path::<T>(payload).map(wrap)),
            encode: encode_payload::<T>,
        });
        self
    }

    fn with_mode(mut self, mode: ValueMode) -> Self {
        match &self.value_mode {
            Some(current) if *current != mode => self.mode_conflict = true,
            _ => self.value_mode = Some(mode),
        }
        self
    }

    pub fn build(self) -> Result<EnumSchema<E>, Error> {
        let enum_name = type_name::<E>();
        let malformed = |violation| Error::malformed(enum_name, violation);

        let tag_field = self.tag_field.ok_or_else(|| malformed(SchemaViolation::MissingTagField))?;
        if tag_field.is_empty() || tag_field == RESERVED_FIELD {
            return Err(malformed(SchemaViolation::ReservedTagField(tag_field)));
        }
        if self.mode_conflict {
            return Err(malformed(SchemaViolation::ConflictingValueMode));
        }
        let value_mode = self.value_mode.unwrap_or(ValueMode::Embedded);
        if let ValueMode::Nested(field) = &value_mode {
            if field.is_empty() || field == RESERVED_FIELD {
                return Err(malformed(SchemaViolation::ReservedValueField(field.clone())));
            }
            if *field == tag_field {
                return Err(malformed(SchemaViolation::FieldCollision(tag_field)));
            }
        }

        let mut variants = IndexMap::with_capacity(self.variants.len());
        let mut by_type = HashMap::with_capacity(self.variants.len());
        for variant in self.variants {
            if variant.tag.is_empty() {
                return Err(malformed(SchemaViolation::EmptyTag { variant_type: variant.type_name }));
            }
            if variants.contains_key(&variant.tag) {
                return Err(malformed(SchemaViolation::DuplicateTag { tag: variant.tag }));
            }
            if let Some(&index) = by_type.get(&variant.type_id) {
                let first = variants.get_index(index).map(|(tag, _)| String::clone(tag));
                return Err(malformed(SchemaViolation::DuplicateVariantType {
                    variant_type: variant.type_name,
                    first: first.unwrap_or_default(),
                    second: variant.tag,
                }));
            }
            if value_mode == ValueMode::Embedded {
                check_embeddable(&variant, &tag_field).map_err(malformed)?;
            }
            by_type.insert(variant.type_id, variants.len());
            variants.insert(variant.tag.clone(), variant);
        }

        Ok(EnumSchema {
            tag_field,
            value_mode,
            variants,
            by_type,
            _enum: PhantomData,
        })
    }
}

fn check_embeddable<E>(variant: &VariantShape<E>, tag_field: &str) -> Result<(), SchemaViolation> {
    if !variant.shape.is_object_like() {
        return Err(SchemaViolation::NotEmbeddable {
            tag: variant.tag.clone(),
            variant_type: variant.type_name,
            shape: variant.shape,
        });
    }
    let declares_tag = variant
        .shape
        .fields()
        .is_some_and(|fields| fields.iter().any(|field| *field == tag_field));
    if declares_tag {
        return Err(SchemaViolation::EmbeddedFieldCollision {
            tag: variant.tag.clone(),
            variant_type: variant.type_name,
            field: tag_field.to_owned(),
        });
    }
    Ok(())
}

fn encode_payload<T: Serialize + 'static>(variant: &dyn Any) -> Option<Result<Value, serde_json::Error>> {
    variant.downcast_ref::<T>().map(serde_json::to_value)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
