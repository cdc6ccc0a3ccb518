/// Declare an enum of single-payload variants together with its
/// [`TaggedEnum`](crate::TaggedEnum), `Serialize` and `Deserialize` impls.
///
/// `(tag = "type", value = "value")` nests payloads under `"value"`;
/// `(tag = "type")` embeds them next to the tag. A variant's tag defaults to
/// its name and can be set with `= "tag"`.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// pub struct ItemAdded { item_id: String, quantity: u32 }
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// pub struct Checkout;
///
/// tagged_json::tagged_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum CartEvent (tag = "type", value = "value") {
///         ItemAdded(ItemAdded) = "item_added",
///         Checkout(Checkout) = "checkout",
///         Note(String),
///     }
/// }
///
/// let event: CartEvent = serde_json::from_str(r#"{"type": "Note", "value": "gift"}"#).unwrap();
/// assert_eq!(event, CartEvent::Note("gift".into()));
/// assert_eq!(
///     serde_json::to_string(&CartEvent::Checkout(Checkout)).unwrap(),
///     r#"{"type":"checkout"}"#,
/// );
/// ```
///
/// Don't also derive `Serialize`/`Deserialize` on the enum itself.
#[macro_export]
macro_rules! tagged_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident (tag = $tag_field:literal, value = $value_field:literal $(,)?) {
            $($body:tt)*
        }
    ) => {
        $crate::tagged_enum! {
            @enum [$(#[$meta])*] $vis $name [value_field($value_field)] $tag_field { $($body)* }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident (tag = $tag_field:literal $(,)?) {
            $($body:tt)*
        }
    ) => {
        $crate::tagged_enum! {
            @enum [$(#[$meta])*] $vis $name [embedded()] $tag_field { $($body)* }
        }
    };
    (
        @enum [$($meta:tt)*] $vis:vis $name:ident [$($layout:tt)*] $tag_field:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident ($ty:ty) $(= $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $($meta)*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant($ty),
            )*
        }

        impl $crate::TaggedEnum for $name {
            fn describe(schema: $crate::SchemaBuilder<Self>) -> $crate::SchemaBuilder<Self> {
                schema
                    .tag_field($tag_field)
                    .$($layout)*
                    $(.variant::<$ty>($crate::__variant_tag!($variant $(, $tag)?), Self::$variant))*
            }

            fn variant(&self) -> &dyn $crate::Variant {
                match *self {
                    $(Self::$variant(ref payload) => payload,)*
                }
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                $crate::serialize(self, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                $crate::deserialize(deserializer)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __variant_tag {
    ($variant:ident) => {
        ::core::stringify!($variant)
    };
    ($variant:ident, $tag:literal) => {
        $tag
    };
}
