//! This crate finds the fields that differ between two versions of a
//! record.  It is meant for database models and similar structured data
//! where a "change" should mean a change a human would care about, not a
//! float that picked up representation noise on its way through a decimal
//! column or a name that gained a trailing space.
//!
//! The crate is split into a few pieces:
//!
//! * [`Value`]: the values a field can hold, with [`Decimal`] for
//!   arbitrary precision numbers.
//! * [`ApproxEqConfig`]: the rules for when two values count as equal.
//! * [`Record`]: the capability a host record type implements so it can
//!   be diffed.  It exposes [`FieldDescriptor`]s and the value behind each.
//! * [`FieldDiff`]: the field level diff itself, configured through
//!   [`FieldDiffConfig`], and [`FieldDiffer`] which caches the latest one.
//!
//! # Example
//!
//! ```rust
//! use fielddiff::{FieldDescriptor, FieldDiff, Record, Value};
//!
//! struct Dish {
//!     id: i64,
//!     name: String,
//!     price: f64,
//! }
//!
//! impl Record for Dish {
//!     fn fields(&self) -> Vec<FieldDescriptor> {
//!         vec![
//!             FieldDescriptor::new("id", "ID"),
//!             FieldDescriptor::new("name", "Name"),
//!             FieldDescriptor::new("price", "Price").with_default(0.0),
//!         ]
//!     }
//!
//!     fn value_of(&self, field: &FieldDescriptor) -> Option<Value> {
//!         match field.name() {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.as_str().into()),
//!             "price" => Some(self.price.into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let old = Dish { id: 1, name: "Pizza".into(), price: 9.5 };
//! let new = Dish { id: 2, name: "Pizza ".into(), price: 10.0 };
//! let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
//! assert_eq!(diff.to_string(), "Price: 10.0 -> 9.5");
//! ```
//!
//! # Optional Features
//!
//! * `serde`: adds `Serialize` to values, snapshots and diffs.
mod approx;
mod decimal;
mod differ;
mod error;
mod record;
pub mod utils;
mod value;

pub use self::approx::{
    approx_equal, has_non_whitespace_text, ApproxEqConfig, DEFAULT_FLOAT_EQUALITY_TOLERANCE,
};
pub use self::decimal::Decimal;
pub use self::differ::{FieldChange, FieldDiff, FieldDiffConfig, FieldDiffer};
pub use self::error::Error;
pub use self::record::{
    comparable_fields, FieldDescriptor, Record, Snapshot, DEFAULT_FIELDS_TO_IGNORE,
};
pub use self::value::{Value, ValueKind};

#[cfg(feature = "serde")]
#[test]
fn test_serde() {
    use crate::record::Person;

    let old = Person {
        score: Some(1.5),
        ..Person::named("Bob")
    };
    let new = Person {
        score: Some(2.0),
        tags: Some(vec!["vip".into()]),
        ..Person::named("Alice")
    };
    let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
    let json = serde_json::to_string(&diff).unwrap();
    assert_eq!(
        json,
        r#"{"Name":{"first":"Alice","second":"Bob"},"Score":{"first":2.0,"second":1.5},"Tags":{"first":["vip"],"second":null}}"#
    );

    let price = Value::from(Decimal::new("10.50").unwrap());
    assert_eq!(serde_json::to_string(&price).unwrap(), r#""10.50""#);
}
