//! sea-orm entities for the store schema.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

pub mod category;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;

/// Money at exactly two decimal places. SQLite hands `DECIMAL(10,2)` back
/// without its scale, so `0.10` would otherwise render as `"0.1"`.
pub fn money(value: Decimal) -> Decimal {
    let mut cents = value.round_dp(2);
    cents.rescale(2);
    cents
}

/// `serialize_with` helper for money columns
pub fn serialize_money<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    Serialize::serialize(&money(*value), serializer)
}
