//! Structural shape of a variant type, discovered without an instance.
//!
//! The probe hands a recording deserializer to `T::deserialize`; the first
//! `deserialize_*` hint the type asks for reveals how it lays itself out in
//! JSON (derived structs even tell us their declared field names).
use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde_json::{Map, Value};

// Newtype wrappers are looked through; this bounds self-referential ones.
const MAX_NEWTYPE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Struct {
        name: &'static str,
        fields: &'static [&'static str],
    },
    UnitStruct { name: &'static str },
    Map,
    Seq,
    Tuple { len: usize },
    Option,
    Unit,
    Enum { name: &'static str },
    Primitive(&'static str),
    /// Self-describing or custom layout (`serde_json::Value`, untagged enums...).
    Any,
}

impl Shape {
    pub fn of<T: DeserializeOwned>() -> Self {
        match T::deserialize(Probe { depth: 0 }) {
            Err(ProbeError::Found(shape)) => shape,
            Err(ProbeError::Custom(_)) | Ok(_) => Self::Any,
        }
    }

    /// Whether values of this shape can share a JSON object with a tag field.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Self::Struct { .. } | Self::UnitStruct { .. } | Self::Map)
    }

    /// Declared field names, when the shape is a derived struct.
    pub fn fields(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// JSON a missing payload stands for: the zero value of the shape.
    ///
    /// Structs with required fields still fail on `{}`; give them
    /// `#[serde(default)]` to make them zero-constructible.
    pub fn empty_value(&self) -> Value {
        match self {
            Self::Struct { .. } | Self::Map => Value::Object(Map::new()),
            Self::Seq | Self::Tuple { .. } => Value::Array(Vec::new()),
            Self::Primitive(kind) => match *kind {
                "bool" => Value::Bool(false),
                "f32" | "f64" => Value::from(0.0),
                "string" | "identifier" => Value::String(String::new()),
                "char" => Value::String("\0".to_owned()),
                "bytes" => Value::Array(Vec::new()),
                _ => Value::from(0),
            },
            _ => Value::Null,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Struct { name, .. } => write!(f, "struct {name}"),
            Self::UnitStruct { name } => write!(f, "unit struct {name}"),
            Self::Map => f.write_str("map"),
            Self::Seq => f.write_str("sequence"),
            Self::Tuple { len } => write!(f, "{len}-tuple"),
            Self::Option => f.write_str("option"),
            Self::Unit => f.write_str("unit"),
            Self::Enum { name } => write!(f, "enum {name}"),
            Self::Primitive(kind) => write!(f, "primitive {kind}"),
            Self::Any => f.write_str("self-describing value"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PROBE
// ————————————————————————————————————————————————————————————————————————————

struct Probe {
    depth: usize,
}

#[derive(Debug)]
enum ProbeError {
    Found(Shape),
    Custom(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(shape) => write!(f, "probed {shape}"),
            Self::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ProbeError {}

impl de::Error for ProbeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

macro_rules! probe_primitives {
    ($($method:ident => $kind:literal),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
                Err(ProbeError::Found(Shape::Primitive($kind)))
            }
        )*
    };
}

impl<'de> Deserializer<'de> for Probe {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Any))
    }

    probe_primitives! {
        deserialize_bool => "bool",
        deserialize_i8 => "i8",
        deserialize_i16 => "i16",
        deserialize_i32 => "i32",
        deserialize_i64 => "i64",
        deserialize_i128 => "i128",
        deserialize_u8 => "u8",
        deserialize_u16 => "u16",
        deserialize_u32 => "u32",
        deserialize_u64 => "u64",
        deserialize_u128 => "u128",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_char => "char",
        deserialize_str => "string",
        deserialize_string => "string",
        deserialize_bytes => "bytes",
        deserialize_byte_buf => "bytes",
        deserialize_identifier => "identifier",
    }

    fn deserialize_option<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Option))
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Unit))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::UnitStruct { name }))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ProbeError> {
        if self.depth >= MAX_NEWTYPE_DEPTH {
            return Err(ProbeError::Found(Shape::Any));
        }
        visitor.visit_newtype_struct(Probe { depth: self.depth + 1 })
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Seq))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Tuple { len }))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Tuple { len }))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Map))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Struct { name, fields }))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Enum { name }))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeError> {
        Err(ProbeError::Found(Shape::Any))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
