//! Enums the fixtures are decoded into.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tagged_json::{SchemaBuilder, TaggedEnum, Variant};

// ————————————————————————————————————————————————————————————————————————————
// SHOPPING CART
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkout;

tagged_json::tagged_enum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum CartEvent (tag = "type", value = "value") {
        ItemAdded(ItemAdded) = "item_added",
        ItemRemoved(ItemRemoved) = "item_removed",
        Checkout(Checkout) = "checkout",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LETTERS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Abc {
    pub A: String,
    pub B: String,
    pub C: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Def {
    pub D: i64,
    pub E: i64,
    pub F: i64,
}

tagged_json::tagged_enum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Letters (tag = "type") {
        Abc(Abc) = "abc",
        Def(Def) = "def",
    }
}

tagged_json::tagged_enum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Scalar (tag = "kind", value = "data") {
        Text(String) = "text",
        Int(i64) = "int",
        List(Vec<String>) = "list",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EXPRESSIONS
// ————————————————————————————————————————————————————————————————————————————

pub trait Node: fmt::Display + Send + Sync {
    fn as_variant(&self) -> &dyn Variant;
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Number {
    pub value: i64,
}

#[derive(Serialize, Deserialize)]
pub struct Add {
    pub left: Expr,
    pub right: Expr,
}

#[derive(Serialize, Deserialize)]
pub struct Sub {
    pub left: Expr,
    pub right: Expr,
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Add {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} + {})", self.left, self.right)
    }
}

impl fmt::Display for Sub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} - {})", self.left, self.right)
    }
}

macro_rules! node {
    ($($ty:ty),*) => {
        $(impl Node for $ty {
            fn as_variant(&self) -> &dyn Variant {
                self
            }
        })*
    };
}

node!(Number, Add, Sub);

/// Arithmetic expression tree; each node is a separately allocated
/// trait object.
pub struct Expr(pub Box<dyn Node>);

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TaggedEnum for Expr {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .tag_field("type")
            .embedded()
            .variant("number", |n: Number| Expr(Box::new(n)))
            .variant("add", |a: Add| Expr(Box::new(a)))
            .variant("sub", |s: Sub| Expr(Box::new(s)))
    }

    fn variant(&self) -> &dyn Variant {
        self.0.as_variant()
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        tagged_json::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged_json::deserialize(deserializer)
    }
}
