//! Various diffing utilities.
//!
//! This module provides one-shot shortcuts for the common ways of calling
//! [`FieldDiffConfig::diff_records`].

use crate::{Error, FieldDiff, FieldDiffConfig, Record};

/// Diffs two versions of a record with the default config.
///
/// Changes are `(record, other)` pairs.
pub fn diff_records<R: Record + ?Sized>(record: &R, other: &R) -> Result<FieldDiff, Error> {
    FieldDiff::from_records(record, Some(other))
}

/// Reports every non-empty field of a record.
///
/// Changes are `(value, null)` pairs.  This is what a freshly created
/// record looks like when compared with nothing.
pub fn diff_against_nothing<R: Record + ?Sized>(record: &R) -> Result<FieldDiff, Error> {
    FieldDiff::from_records(record, None)
}

/// Reports the fields of a record that no longer hold their default.
///
/// Changes are `(default, value)` pairs.
///
/// ```rust
/// # use fielddiff::{FieldDescriptor, Record, Value};
/// # use fielddiff::utils::diff_against_defaults;
/// struct Account {
///     status: &'static str,
/// }
///
/// impl Record for Account {
///     fn fields(&self) -> Vec<FieldDescriptor> {
///         vec![FieldDescriptor::new("status", "Status").with_default("active")]
///     }
///
///     fn value_of(&self, _field: &FieldDescriptor) -> Option<Value> {
///         Some(self.status.into())
///     }
/// }
///
/// assert!(diff_against_defaults(&Account { status: "active" }).unwrap().is_empty());
/// let diff = diff_against_defaults(&Account { status: "inactive" }).unwrap();
/// assert_eq!(diff.to_string(), "Status: \"active\" -> \"inactive\"");
/// ```
pub fn diff_against_defaults<R: Record + ?Sized>(record: &R) -> Result<FieldDiff, Error> {
    FieldDiffConfig::default()
        .show_other_as_second_value(false)
        .use_default_values_if_other_is_none(true)
        .diff_records(record, None)
}

#[test]
fn test_shortcuts() {
    use crate::record::Person;
    use crate::{FieldChange, Value};

    let old = Person::named("Bob");
    let new = Person {
        status: Some("active".into()),
        ..Person::named("Alice")
    };

    let diff = diff_records(&new, &old).unwrap();
    assert_eq!(
        diff.field_names().collect::<Vec<_>>(),
        vec!["Name", "Status"]
    );

    let diff = diff_against_nothing(&new).unwrap();
    assert_eq!(
        diff.get("Status"),
        Some(&FieldChange::new("active".into(), Value::Null))
    );

    let diff = diff_against_defaults(&new).unwrap();
    assert_eq!(diff.field_names().collect::<Vec<_>>(), vec!["Name"]);
    assert_eq!(
        diff.get("Name"),
        Some(&FieldChange::new(Value::Null, "Alice".into()))
    );
}
