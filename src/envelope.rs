//! The two-field view of an enum object used on the way in, and the
//! tag-first object assembled on the way out.
use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::{Map, Value};

/// What decoding needs from the input object: the tag, plus the deferred
/// payload when variants are nested under a value field.
#[derive(Debug, PartialEq)]
pub struct RawEnvelope {
    pub tag: String,
    pub value: Option<Value>,
}

/// Reads a [`RawEnvelope`] out of any JSON object, skipping unrelated keys.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeSeed<'a> {
    tag_field: &'a str,
    value_field: Option<&'a str>,
}

impl<'a> EnvelopeSeed<'a> {
    pub fn nested(tag_field: &'a str, value_field: &'a str) -> Self {
        Self { tag_field, value_field: Some(value_field) }
    }

    pub fn embedded(tag_field: &'a str) -> Self {
        Self { tag_field, value_field: None }
    }
}

impl<'de> DeserializeSeed<'de> for EnvelopeSeed<'_> {
    type Value = RawEnvelope;

    fn deserialize<D>(self, deserializer: D) -> Result<RawEnvelope, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for EnvelopeSeed<'_> {
    type Value = RawEnvelope;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a JSON object with a string field `{}`", self.tag_field)
    }

    fn visit_map<A>(self, mut map: A) -> Result<RawEnvelope, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tag: Option<String> = None;
        let mut value: Option<Value> = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == self.tag_field {
                if tag.is_some() {
                    return Err(de::Error::custom(format_args!("duplicate field `{key}`")));
                }
                tag = Some(map.next_value()?);
            } else if self.value_field == Some(key.as_str()) {
                if value.is_some() {
                    return Err(de::Error::custom(format_args!("duplicate field `{key}`")));
                }
                value = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        let tag = tag.ok_or_else(|| de::Error::custom(format_args!("missing field `{}`", self.tag_field)))?;
        Ok(RawEnvelope { tag, value })
    }
}

/// Start an output object whose first key is the tag.
pub fn tagged_object(tag_field: &str, tag: &str) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(tag_field.to_owned(), Value::String(tag.to_owned()));
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(seed: EnvelopeSeed<'_>, input: &Value) -> Result<RawEnvelope, serde_json::Error> {
        seed.deserialize(input)
    }

    #[test]
    fn nested_reads_tag_and_defers_payload() {
        let input = json!({"extra": [1, 2], "value": {"item_id": "xyz"}, "type": "item_added"});
        let env = read(EnvelopeSeed::nested("type", "value"), &input).unwrap();
        assert_eq!(
            env,
            RawEnvelope { tag: "item_added".into(), value: Some(json!({"item_id": "xyz"})) }
        );
    }

    #[test]
    fn absent_payload_is_none() {
        let env = read(EnvelopeSeed::nested("type", "value"), &json!({"type": "checkout"})).unwrap();
        assert_eq!(env.value, None);
    }

    #[test]
    fn embedded_only_reads_the_tag() {
        let input = json!({"A": "foo", "type": "abc", "value": 1});
        let env = read(EnvelopeSeed::embedded("type"), &input).unwrap();
        assert_eq!(env, RawEnvelope { tag: "abc".into(), value: None });
    }

    #[test]
    fn bad_envelopes_name_the_tag_field() {
        let seed = EnvelopeSeed::nested("kind", "value");
        let not_object = read(seed, &json!(["kind", "abc"])).unwrap_err();
        assert!(not_object.to_string().contains("string field `kind`"), "{not_object}");

        let missing = read(seed, &json!({"value": 1})).unwrap_err();
        assert_eq!(missing.to_string(), "missing field `kind`");

        let not_string = read(seed, &json!({"kind": 5})).unwrap_err();
        assert!(not_string.to_string().contains("expected a string"), "{not_string}");
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut de = serde_json::Deserializer::from_str(r#"{"type": "a", "type": "b"}"#);
        let err = EnvelopeSeed::embedded("type").deserialize(&mut de).unwrap_err();
        assert!(err.to_string().contains("duplicate field `type`"), "{err}");
    }

    #[test]
    fn output_starts_with_the_tag() {
        let mut object = tagged_object("type", "abc");
        object.insert("A".into(), json!("foo"));
        let text = serde_json::to_string(&Value::Object(object)).unwrap();
        assert_eq!(text, r#"{"type":"abc","A":"foo"}"#);
    }
}
