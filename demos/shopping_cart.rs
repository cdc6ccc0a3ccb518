//! Decode a stream of cart events, fold them into totals, and write one back.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    item_id: String,
    quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemoved {
    item_id: String,
    quantity: u32,
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

const EVENTS: &str = r#"
{"type": "item_added", "value": {"item_id": "xyz", "quantity": 5}}
{"type": "item_added", "value": {"item_id": "abc", "quantity": 1}}
{"type": "item_removed", "value": {"item_id": "xyz", "quantity": 2}}
{"type": "checkout"}
{"type": "refund"}
"#;

fn main() -> anyhow::Result<()> {
    tagged_json::validate::<CartEvent>()?;

    let mut cart = BTreeMap::<String, u32>::new();
    for line in EVENTS.lines().filter(|line| !line.trim().is_empty()) {
        let event = match tagged_json::from_str::<CartEvent>(line) {
            Ok(event) => event,
            Err(error) => {
                eprintln!("skipping event: {error}");
                continue;
            }
        };
        match event {
            CartEvent::ItemAdded(ItemAdded { item_id, quantity }) => {
                *cart.entry(item_id).or_default() += quantity;
            }
            CartEvent::ItemRemoved(ItemRemoved { item_id, quantity }) => {
                let count = cart.entry(item_id).or_default();
                *count = count.saturating_sub(quantity);
            }
            CartEvent::Checkout(Checkout) => {
                println!("checked out with {cart:?}");
            }
        }
    }

    let echo = CartEvent::ItemRemoved(ItemRemoved { item_id: "abc".into(), quantity: 1 });
    println!("{}", tagged_json::to_string(&echo)?);
    Ok(())
}
