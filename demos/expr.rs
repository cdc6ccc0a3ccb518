//! An expression tree whose nodes are trait objects, decoded from embedded
//! tagged objects.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tagged_json::{SchemaBuilder, TaggedEnum, Variant};

trait Node: fmt::Display + Send + Sync {
    fn eval(&self) -> i64;
    fn as_variant(&self) -> &dyn Variant;
}

#[derive(Serialize, Deserialize)]
struct Number {
    value: i64,
}

#[derive(Serialize, Deserialize)]
struct Add {
    left: Expr,
    right: Expr,
}

#[derive(Serialize, Deserialize)]
struct Sub {
    left: Expr,
    right: Expr,
}

impl Node for Number {
    fn eval(&self) -> i64 {
        self.value
    }

    fn as_variant(&self) -> &dyn Variant {
        self
    }
}

impl Node for Add {
    fn eval(&self) -> i64 {
        self.left.0.eval() + self.right.0.eval()
    }

    fn as_variant(&self) -> &dyn Variant {
        self
    }
}

impl Node for Sub {
    fn eval(&self) -> i64 {
        self.left.0.eval() - self.right.0.eval()
    }

    fn as_variant(&self) -> &dyn Variant {
        self
    }
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

struct Expr(Box<dyn Node>);

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

const INPUT: &str = r#"{
    "type": "add",
    "left": {"type": "number", "value": 3},
    "right": {
        "type": "sub",
        "left": {"type": "number", "value": 5},
        "right": {"type": "number", "value": 2}
    }
}"#;

fn main() -> anyhow::Result<()> {
    let expr: Expr = tagged_json::from_str(INPUT)?;
    println!("{expr} = {}", expr.0.eval());

    let bumped = Expr(Box::new(Add { left: expr, right: Expr(Box::new(Number { value: 1 })) }));
    println!("{}", tagged_json::to_string(&bumped)?);
    Ok(())
}
