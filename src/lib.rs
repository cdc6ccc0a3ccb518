//! Tagged enums as JSON objects.
//!
//! A tagged enum takes one of several shapes (variants), each with its own
//! data. In JSON it is an object where one field names the variant (the tag)
//! and the variant's data either sits under a value field:
//!
//! ```json
//! {"type": "item_added", "value": {"item_id": "xyz", "quantity": 2}}
//! ```
//!
//! or, when the variant is itself an object, is embedded next to the tag:
//!
//! ```json
//! {"type": "item_removed", "item_id": "xyz", "quantity": 2}
//! ```
//!
//! Enums are declared with [`tagged_enum!`] or by implementing
//! [`TaggedEnum`] by hand, then moved in and out of JSON with the functions
//! below, or through their `Serialize`/`Deserialize` impls.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! pub struct ItemAdded { item_id: String, quantity: u32 }
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! pub struct Checkout;
//!
//! tagged_json::tagged_enum! {
//!     #[derive(Debug, PartialEq)]
//!     pub enum CartEvent (tag = "type", value = "value") {
//!         ItemAdded(ItemAdded) = "item_added",
//!         Checkout(Checkout) = "checkout",
//!     }
//! }
//!
//! let event: CartEvent = tagged_json::from_str(
//!     r#"{"type": "item_added", "value": {"item_id": "xyz", "quantity": 5}}"#,
//! )?;
//! assert_eq!(event, CartEvent::ItemAdded(ItemAdded { item_id: "xyz".into(), quantity: 5 }));
//! assert_eq!(tagged_json::to_string(&CartEvent::Checkout(Checkout))?, r#"{"type":"checkout"}"#);
//! # Ok::<_, tagged_json::Error>(())
//! ```
pub mod error;
pub mod schema;
pub mod shape;

mod decode;
mod encode;
mod envelope;
mod macros;
mod path_de;
mod registry;

use std::any::Any;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use error::{Error, SchemaViolation};
pub use registry::{register, schema};
pub use schema::{EnumSchema, SchemaBuilder, TaggedEnum, ValueMode, Variant, VariantShape};
pub use shape::Shape;

#[doc(hidden)]
pub mod __private {
    pub use serde;
}

// ————————————————————————————————————————————————————————————————————————————
// ENCODE
// ————————————————————————————————————————————————————————————————————————————

/// Encode `value` as a JSON object, tag field first.
pub fn to_value<E: TaggedEnum>(value: &E) -> Result<Value, Error> {
    encode::to_value(schema::<E>()?, value)
}

pub fn to_vec<E: TaggedEnum>(value: &E) -> Result<Vec<u8>, Error> {
    let schema = schema::<E>()?;
    let object = encode::to_value(schema, value)?;
    serde_json::to_vec(&object).map_err(|source| Error::Codec { enum_name: schema.enum_name(), source })
}

pub fn to_string<E: TaggedEnum>(value: &E) -> Result<String, Error> {
    let schema = schema::<E>()?;
    let object = encode::to_value(schema, value)?;
    serde_json::to_string(&object).map_err(|source| Error::Codec { enum_name: schema.enum_name(), source })
}

/// Encode a value of any [`register`]ed enum type.
pub fn to_vec_dyn(value: &dyn Any) -> Result<Vec<u8>, Error> {
    let erased = registry::lookup_dyn(value.type_id())?;
    let object = erased.encode_from(value)?;
    serde_json::to_vec(&object).map_err(|source| Error::Codec { enum_name: erased.enum_name(), source })
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE
// ————————————————————————————————————————————————————————————————————————————

pub fn from_slice<E: TaggedEnum>(bytes: &[u8]) -> Result<E, Error> {
    decode::from_slice(schema::<E>()?, bytes)
}

pub fn from_str<E: TaggedEnum>(text: &str) -> Result<E, Error> {
    from_slice(text.as_bytes())
}

pub fn from_value<E: TaggedEnum>(value: Value) -> Result<E, Error> {
    decode::from_value(schema::<E>()?, value)
}

/// Decode into `dst`, which must hold a value of a [`register`]ed enum
/// type. `dst` is left untouched on error.
pub fn from_slice_dyn(bytes: &[u8], dst: &mut dyn Any) -> Result<(), Error> {
    let erased = registry::lookup_dyn((*dst).type_id())?;
    erased.decode_into(bytes, dst)
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATE
// ————————————————————————————————————————————————————————————————————————————

/// Check `E`'s declaration without encoding or decoding anything.
///
/// Succeeds exactly when [`EnumSchema::derive`] does; nothing is cached.
pub fn validate<E: TaggedEnum>() -> Result<(), Error> {
    EnumSchema::<E>::derive().map(drop)
}

// ————————————————————————————————————————————————————————————————————————————
// SERDE GLUE
// ————————————————————————————————————————————————————————————————————————————

/// `Serialize` body for tagged enums; also works as
/// `#[serde(with = "tagged_json")]` on fields.
pub fn serialize<E, S>(value: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: TaggedEnum,
    S: Serializer,
{
    use serde::ser::Error as _;
    to_value(value).map_err(S::Error::custom)?.serialize(serializer)
}

/// `Deserialize` body for tagged enums; also works as
/// `#[serde(with = "tagged_json")]` on fields.
pub fn deserialize<'de, E, D>(deserializer: D) -> Result<E, D::Error>
where
    E: TaggedEnum,
    D: Deserializer<'de>,
{
    use serde::de::Error as _;
    let value = Value::deserialize(deserializer)?;
    from_value(value).map_err(D::Error::custom)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
