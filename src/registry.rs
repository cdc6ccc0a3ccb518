//! Process-wide schema cache, keyed by enum type.
//!
//! Each schema is derived at most once per process and leaked, so lookups
//! hand out `&'static` references. Entries are only ever inserted. The same
//! entries back the type-erased `*_dyn` entry points.
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::Error;
use crate::schema::{EnumSchema, TaggedEnum};
use crate::{decode, encode};

static SCHEMAS: Lazy<RwLock<HashMap<TypeId, &'static dyn ErasedSchema>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// A cached schema with its enum type erased.
pub(crate) trait ErasedSchema: Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn enum_name(&self) -> &'static str;
    fn decode_into(&self, bytes: &[u8], dst: &mut dyn Any) -> Result<(), Error>;
    fn encode_from(&self, src: &dyn Any) -> Result<Value, Error>;
}

impl<E: TaggedEnum> ErasedSchema for EnumSchema<E> {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn enum_name(&self) -> &'static str {
        EnumSchema::enum_name(self)
    }

    fn decode_into(&self, bytes: &[u8], dst: &mut dyn Any) -> Result<(), Error> {
        let type_id = (*dst).type_id();
        let slot = dst.downcast_mut::<E>().ok_or(Error::InvalidTarget { type_id })?;
        *slot = decode::from_slice(self, bytes)?;
        Ok(())
    }

    fn encode_from(&self, src: &dyn Any) -> Result<Value, Error> {
        let value = src
            .downcast_ref::<E>()
            .ok_or(Error::InvalidTarget { type_id: src.type_id() })?;
        encode::to_value(self, value)
    }
}

/// The schema of `E`, derived on first use.
///
/// A declaration that fails to derive is reported every time and never
/// cached.
pub fn schema<E: TaggedEnum>() -> Result<&'static EnumSchema<E>, Error> {
    let type_id = TypeId::of::<E>();
    let cached = lookup(type_id);
    let erased = match cached {
        Some(erased) => erased,
        None => {
            let derived = EnumSchema::<E>::derive()?;
            let mut schemas = SCHEMAS.write().unwrap_or_else(PoisonError::into_inner);
            *schemas.entry(type_id).or_insert_with(|| {
                tracing::debug!(
                    enum_type = derived.enum_name(),
                    tag_field = derived.tag_field(),
                    variants = derived.variants().count(),
                    "derived tagged enum schema"
                );
                let leaked: &'static dyn ErasedSchema = Box::leak(Box::new(derived));
                leaked
            })
        }
    };
    erased
        .as_any()
        .downcast_ref::<EnumSchema<E>>()
        .ok_or(Error::InvalidTarget { type_id })
}

/// Derive and cache `E`'s schema now, e.g. at startup, and make `E`
/// reachable through the `*_dyn` entry points.
pub fn register<E: TaggedEnum>() -> Result<(), Error> {
    schema::<E>().map(drop)
}

pub(crate) fn lookup(type_id: TypeId) -> Option<&'static dyn ErasedSchema> {
    let schemas = SCHEMAS.read().unwrap_or_else(PoisonError::into_inner);
    schemas.get(&type_id).copied()
}

pub(crate) fn lookup_dyn(type_id: TypeId) -> Result<&'static dyn ErasedSchema, Error> {
    lookup(type_id).ok_or(Error::InvalidTarget { type_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, Variant};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u64,
    }

    #[derive(Debug, PartialEq)]
    enum Signal {
        Ping(Ping),
    }

    impl TaggedEnum for Signal {
        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema.tag_field("op").value_field("body").variant("ping", Self::Ping)
        }

        fn variant(&self) -> &dyn Variant {
            match self {
                Self::Ping(v) => v,
            }
        }
    }

    enum Broken {}

    impl TaggedEnum for Broken {
        fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
            schema.value_field("body")
        }

        fn variant(&self) -> &dyn Variant {
            match *self {}
        }
    }

    #[test]
    fn schema_is_derived_once() {
        let first = schema::<Signal>().unwrap();
        let second = schema::<Signal>().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.tag_field(), "op");
    }

    #[test]
    fn concurrent_first_use_agrees() {
        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| schema::<Signal>().map(|s| s as *const _ as usize)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn failed_derivation_is_not_cached() {
        assert!(matches!(schema::<Broken>(), Err(Error::MalformedSchema { .. })));
        assert!(lookup(TypeId::of::<Broken>()).is_none());
        assert!(matches!(register::<Broken>(), Err(Error::MalformedSchema { .. })));
    }

    #[test]
    fn erased_round_trip() {
        register::<Signal>().unwrap();
        let erased = lookup_dyn(TypeId::of::<Signal>()).unwrap();

        let mut dst = Signal::Ping(Ping { seq: 0 });
        erased.decode_into(br#"{"op": "ping", "body": {"seq": 9}}"#, &mut dst).unwrap();
        assert_eq!(dst, Signal::Ping(Ping { seq: 9 }));

        assert!(erased.enum_name().ends_with("Signal"));
        let value = erased.encode_from(&dst).unwrap();
        assert_eq!(value, serde_json::json!({"op": "ping", "body": {"seq": 9}}));
    }

    #[test]
    fn erased_decode_rejects_other_types() {
        register::<Signal>().unwrap();
        let erased = lookup_dyn(TypeId::of::<Signal>()).unwrap();
        let mut wrong = 0_u8;
        let err = erased.decode_into(br#"{"op": "ping"}"#, &mut wrong).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { type_id } if type_id == TypeId::of::<u8>()));
        assert!(matches!(lookup_dyn(TypeId::of::<String>()), Err(Error::InvalidTarget { .. })));
    }
}
