//! Enum value → JSON. The tag is found from the payload's concrete type and
//! always written first.
use serde::ser::Error as _;
use serde_json::Value;

use crate::envelope::tagged_object;
use crate::error::Error;
use crate::schema::{EnumSchema, TaggedEnum, ValueMode};

pub(crate) fn to_value<E: TaggedEnum>(schema: &EnumSchema<E>, value: &E) -> Result<Value, Error> {
    let variant = value.variant();
    let payload_any = variant.as_any();
    let Some(shape) = schema.tag_of(payload_any.type_id()) else {
        return Err(Error::UntaggedVariant {
            enum_name: schema.enum_name(),
            variant_type: variant.variant_type_name(),
        });
    };
    tracing::trace!(enum_type = schema.enum_name(), tag = shape.tag(), "encoding variant");

    let encode_error = |source| Error::VariantEncodeFailed {
        enum_name: schema.enum_name(),
        tag: shape.tag().to_owned(),
        variant_type: shape.type_name(),
        source,
    };
    let payload = shape
        .encode(payload_any)
        .unwrap_or_else(|| Err(serde_json::Error::custom("payload type changed during encoding")))
        .map_err(encode_error)?;

    let mut object = tagged_object(schema.tag_field(), shape.tag());
    match (schema.value_mode(), payload) {
        // Absent and null payloads decode the same way; keep the envelope minimal.
        (ValueMode::Nested(_), Value::Null) => {}
        (ValueMode::Nested(field), payload) => {
            object.insert(field.clone(), payload);
        }
        (ValueMode::Embedded, Value::Null) => {}
        (ValueMode::Embedded, Value::Object(fields)) => {
            for (key, field) in fields {
                if key == schema.tag_field() {
                    return Err(encode_error(serde_json::Error::custom(format_args!(
                        "embedded payload writes the tag field `{key}`"
                    ))));
                }
                object.insert(key, field);
            }
        }
        (ValueMode::Embedded, other) => {
            return Err(encode_error(serde_json::Error::custom(format_args!(
                "embedded payload must serialize to a JSON object, got {}",
                kind_of(&other)
            ))));
        }
    }
    Ok(Value::Object(object))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
