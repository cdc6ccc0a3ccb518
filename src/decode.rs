//! JSON → enum value.
//!
//! 1. read the envelope (tag, and the deferred payload when nested)
//! 2. pick the variant registered for the tag
//! 3. decode the payload into that variant and wrap it in the enum
use serde::de::DeserializeSeed;
use serde_json::Value;

use crate::envelope::{EnvelopeSeed, RawEnvelope};
use crate::error::Error;
use crate::schema::{EnumSchema, TaggedEnum, ValueMode};
use crate::shape::Shape;

pub(crate) fn from_slice<E: TaggedEnum>(schema: &EnumSchema<E>, bytes: &[u8]) -> Result<E, Error> {
    if schema.is_embedded() {
        // Variant fields live next to the tag: the whole object is the payload.
        let value = serde_json::from_slice(bytes).map_err(|source| tag_error(schema, source))?;
        return from_value(schema, value);
    }
    let seed = envelope_seed(schema);
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let envelope = seed
        .deserialize(&mut de)
        .and_then(|envelope| de.end().map(|()| envelope))
        .map_err(|source| tag_error(schema, source))?;
    finish(schema, envelope.tag, envelope.value)
}

pub(crate) fn from_value<E: TaggedEnum>(schema: &EnumSchema<E>, value: Value) -> Result<E, Error> {
    let seed = envelope_seed(schema);
    let (tag, payload) = match schema.value_mode() {
        ValueMode::Nested(_) => {
            let RawEnvelope { tag, value } = seed.deserialize(value).map_err(|source| tag_error(schema, source))?;
            (tag, value)
        }
        ValueMode::Embedded => {
            let RawEnvelope { tag, .. } = seed.deserialize(&value).map_err(|source| tag_error(schema, source))?;
            (tag, Some(value))
        }
    };
    finish(schema, tag, payload)
}

fn envelope_seed<E: TaggedEnum>(schema: &EnumSchema<E>) -> EnvelopeSeed<'_> {
    match schema.value_mode() {
        ValueMode::Nested(field) => EnvelopeSeed::nested(schema.tag_field(), field),
        ValueMode::Embedded => EnvelopeSeed::embedded(schema.tag_field()),
    }
}

fn tag_error<E: TaggedEnum>(schema: &EnumSchema<E>, source: serde_json::Error) -> Error {
    Error::TagExtractionFailed {
        enum_name: schema.enum_name(),
        tag_field: schema.tag_field().to_owned(),
        source,
    }
}

fn finish<E: TaggedEnum>(schema: &EnumSchema<E>, tag: String, payload: Option<Value>) -> Result<E, Error> {
    let Some(variant) = schema.variant(&tag) else {
        return Err(Error::UnknownTag { enum_name: schema.enum_name(), tag });
    };
    tracing::trace!(enum_type = schema.enum_name(), %tag, variant_type = variant.type_name(), "decoding variant");

    let unit_like = matches!(variant.shape(), Shape::UnitStruct { .. } | Shape::Unit);
    let payload = match payload {
        None | Some(Value::Null) => variant.shape().empty_value(),
        Some(Value::Object(_)) if unit_like => Value::Null,
        Some(Value::Object(mut object)) if schema.is_embedded() => {
            object.remove(schema.tag_field());
            Value::Object(object)
        }
        Some(payload) => payload,
    };

    variant.decode(payload).map_err(|err| Error::VariantDecodeFailed {
        enum_name: schema.enum_name(),
        tag,
        variant_type: variant.type_name(),
        path: err.path,
        source: err.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, Variant};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ItemAdded {
        item_id: String,
        quantity: u32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Checkout;

    #[derive(Debug, PartialEq, Default, Serialize, Deserialize)]
    struct Note {
        #[serde(default)]
        text: String,
    }

    #[derive(Debug, PartialEq)]
    enum Cart {
        ItemAdded(ItemAdded),
        Checkout(Checkout),
        Note(Note),
        Skus(Vec<String>),
        Count(u32),
    }

    impl TaggedEnum for Cart {
        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema
                .tag_field("type")
                .value_field("value")
                .variant("item_added", Self::ItemAdded)
                .variant("checkout", Self::Checkout)
                .variant("note", Self::Note)
                .variant("skus", Self::Skus)
                .variant("count", Self::Count)
        }

        fn variant(&self) -> &dyn Variant {
            match self {
                Self::ItemAdded(v) => v,
                Self::Checkout(v) => v,
                Self::Note(v) => v,
                Self::Skus(v) => v,
                Self::Count(v) => v,
            }
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    #[allow(non_snake_case)]
    struct Abc {
        A: String,
        B: String,
        C: String,
    }

    #[derive(Debug, PartialEq)]
    enum Flat {
        Abc(Abc),
        Bare(Checkout),
        Labels(BTreeMap<String, String>),
    }

    impl TaggedEnum for Flat {
        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema
                .tag_field("type")
                .embedded()
                .variant("abc", Self::Abc)
                .variant("bare", Self::Bare)
                .variant("labels", Self::Labels)
        }

        fn variant(&self) -> &dyn Variant {
            match self {
                Self::Abc(v) => v,
                Self::Bare(v) => v,
                Self::Labels(v) => v,
            }
        }
    }

    fn cart(input: &str) -> Result<Cart, Error> {
        from_slice(&EnumSchema::<Cart>::derive().unwrap(), input.as_bytes())
    }

    fn flat(input: &str) -> Result<Flat, Error> {
        from_slice(&EnumSchema::<Flat>::derive().unwrap(), input.as_bytes())
    }

    #[test]
    fn nested_payload_selects_variant() {
        let event = cart(r#"{"type": "item_added", "value": {"item_id": "xyz", "quantity": 5}}"#).unwrap();
        assert_eq!(event, Cart::ItemAdded(ItemAdded { item_id: "xyz".into(), quantity: 5 }));
        assert_eq!(cart(r#"{"value": ["a", "b"], "type": "skus"}"#).unwrap(), Cart::Skus(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn absent_payload_is_the_zero_value() {
        assert_eq!(cart(r#"{"type": "checkout"}"#).unwrap(), Cart::Checkout(Checkout));
        assert_eq!(cart(r#"{"type": "checkout", "value": {}}"#).unwrap(), Cart::Checkout(Checkout));
        assert_eq!(cart(r#"{"type": "note"}"#).unwrap(), Cart::Note(Note::default()));
        assert_eq!(cart(r#"{"type": "skus", "value": null}"#).unwrap(), Cart::Skus(Vec::new()));
        assert_eq!(cart(r#"{"type": "count"}"#).unwrap(), Cart::Count(0));
        assert_eq!(cart(r#"{"type": "count", "value": null}"#).unwrap(), Cart::Count(0));
    }

    #[test]
    fn unit_payload_ignores_fields_in_both_layouts() {
        assert_eq!(cart(r#"{"type": "checkout", "value": {"note": 1}}"#).unwrap(), Cart::Checkout(Checkout));
        assert_eq!(flat(r#"{"type": "bare", "note": 1}"#).unwrap(), Flat::Bare(Checkout));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event = cart(r#"{"type": "count", "value": 3, "at": "2024-01-01"}"#).unwrap();
        assert_eq!(event, Cart::Count(3));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = cart(r#"{"type": "bogus"}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownTag { ref tag, .. } if tag == "bogus"));
        assert!(err.to_string().contains(r#"unknown tag "bogus""#));
    }

    #[test]
    fn malformed_envelope_names_the_tag_field() {
        for input in [r#"["type"]"#, r#"{"value": 1}"#, r#"{"type": 7}"#, "{", r#"{"type": "count"} 1"#] {
            let err = cart(input).unwrap_err();
            assert!(matches!(err, Error::TagExtractionFailed { .. }), "{input}: {err}");
            assert!(err.to_string().contains(r#"field "type""#), "{err}");
        }
    }

    #[test]
    fn payload_failure_names_type_and_path() {
        let err = cart(r#"{"type": "item_added", "value": {"item_id": "xyz", "quantity": "five"}}"#).unwrap_err();
        match &err {
            Error::VariantDecodeFailed { tag, variant_type, path, .. } => {
                assert_eq!(tag, "item_added");
                assert!(variant_type.ends_with("ItemAdded"));
                assert_eq!(path, "quantity");
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = cart(r#"{"type": "skus", "value": "not a list"}"#).unwrap_err();
        assert!(err.to_string().contains("into type alloc::vec::Vec<alloc::string::String>"), "{err}");
    }

    #[test]
    fn embedded_fields_sit_next_to_the_tag() {
        let value = flat(r#"{"type": "abc", "A": "foo", "B": "bar", "C": "qux"}"#).unwrap();
        assert_eq!(value, Flat::Abc(Abc { A: "foo".into(), B: "bar".into(), C: "qux".into() }));
        // Field order doesn't matter.
        let value = flat(r#"{"C": "qux", "B": "bar", "type": "abc", "A": "foo"}"#).unwrap();
        assert!(matches!(value, Flat::Abc(_)));
    }

    #[test]
    fn embedded_maps_and_unit_structs() {
        let value = flat(r#"{"type": "labels", "env": "prod"}"#).unwrap();
        assert_eq!(value, Flat::Labels(BTreeMap::from([("env".to_owned(), "prod".to_owned())])));
        assert_eq!(flat(r#"{"type": "bare", "ignored": true}"#).unwrap(), Flat::Bare(Checkout));
    }

    #[test]
    fn value_input_matches_byte_input() {
        let schema = EnumSchema::<Flat>::derive().unwrap();
        let value = from_value(&schema, json!({"type": "abc", "A": "a", "B": "b", "C": "c"})).unwrap();
        assert_eq!(value, flat(r#"{"type": "abc", "A": "a", "B": "b", "C": "c"}"#).unwrap());

        let schema = EnumSchema::<Cart>::derive().unwrap();
        let err = from_value(&schema, json!({"type": "nope"})).unwrap_err();
        assert!(matches!(err, Error::UnknownTag { .. }));
    }
}
