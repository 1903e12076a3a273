//! Field level diffing of records.
//!
//! The main entry point is [`FieldDiff`].  It compares the comparable
//! fields of a record against another version of the same record, or
//! against nothing at all, and keeps the fields whose values are not
//! [approximately equal](crate::ApproxEqConfig::approx_equal).
//!
//! ```rust
//! # use fielddiff::{FieldDescriptor, FieldDiff, Record, Value};
//! # struct Dish { name: &'static str }
//! # impl Record for Dish {
//! #     fn fields(&self) -> Vec<FieldDescriptor> {
//! #         vec![FieldDescriptor::new("name", "Name")]
//! #     }
//! #     fn value_of(&self, _: &FieldDescriptor) -> Option<Value> {
//! #         Some(self.name.into())
//! #     }
//! # }
//! let old = Dish { name: "Pizza" };
//! let new = Dish { name: "Pizza " };
//! let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
//! assert!(diff.is_empty());
//! ```
//!
//! # Which fields are compared
//!
//! The diff is driven by the left hand record: every comparable field of
//! `record` is looked up in `other` by display name.  Fields that only
//! `other` has are never reported.  Fields named in
//! [`Record::fields_to_ignore`] are never reported either, no matter how
//! much they differ.
//!
//! # Comparing against nothing
//!
//! Without an `other` record there are two modes.  By default every field
//! with a non-empty value is reported against `null`.  With
//! [`FieldDiffConfig::use_default_values_if_other_is_none`] the value is
//! instead compared with the field's default, which drops fields that
//! still hold what a brand new record would hold.
//!
//! # Caching
//!
//! [`FieldDiffer`] remembers the latest result.  The cache is never
//! invalidated implicitly: it does not notice changes to the records, and
//! [`FieldDiffer::latest_or_compare`] ignores arguments once a result is
//! cached.  Call [`FieldDiffer::compare`] when a fresh result is needed.
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};

use crate::record::{comparable_fields, Record, Snapshot};
use crate::{ApproxEqConfig, Error, Value};

/// A builder type config for [`FieldDiff`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDiffConfig {
    show_other_as_second_value: bool,
    use_default_values_if_other_is_none: bool,
}

impl Default for FieldDiffConfig {
    fn default() -> FieldDiffConfig {
        FieldDiffConfig {
            show_other_as_second_value: true,
            use_default_values_if_other_is_none: false,
        }
    }
}

impl FieldDiffConfig {
    /// Changes the order of the values in each change.
    ///
    /// When `true` (the default) changes are `(record, other)`, otherwise
    /// they are `(other, record)`.
    pub fn show_other_as_second_value(&mut self, yes: bool) -> &mut Self {
        self.show_other_as_second_value = yes;
        self
    }

    /// Compares against field defaults when there is no other record.
    ///
    /// The default is `false` in which case a missing other record is
    /// treated as all `null`.  This flag has no effect if there is an
    /// other record.
    ///
    /// The default takes the place of the other record, so with
    /// [`show_other_as_second_value`](Self::show_other_as_second_value)
    /// left at `true` changes come out as `(current, default)`.  Set it to
    /// `false` for `(default, current)` pairs, which is what
    /// [`diff_against_defaults`](crate::utils::diff_against_defaults) does.
    pub fn use_default_values_if_other_is_none(&mut self, yes: bool) -> &mut Self {
        self.use_default_values_if_other_is_none = yes;
        self
    }

    /// Creates a diff of two versions of a record.
    pub fn diff_records<R: Record + ?Sized>(
        &self,
        record: &R,
        other: Option<&R>,
    ) -> Result<FieldDiff, Error> {
        self.diff(record, other).map(|(diff, _)| diff)
    }

    fn diff<R: Record + ?Sized>(
        &self,
        record: &R,
        other: Option<&R>,
    ) -> Result<(FieldDiff, Snapshot), Error> {
        let config = record.approx_eq_config();
        let ignored = record.fields_to_ignore();
        let mine = Snapshot::of(record)?;
        let mut changes = BTreeMap::new();

        let candidates = mine.iter().filter(|(name, _)| {
            let skip = ignored.contains(&name.as_str());
            if skip {
                trace!("ignoring field {:?}", name);
            }
            !skip
        });

        match other {
            Some(other) => {
                let theirs = Snapshot::of(other)?;
                for (name, value) in candidates {
                    let other_value = theirs.get(name).cloned().unwrap_or_default();
                    if config.approx_equal(value, &other_value) {
                        trace!("field {:?} is unchanged", name);
                        continue;
                    }
                    trace!("field {:?} changed", name);
                    changes.insert(name.clone(), self.change(value.clone(), other_value));
                }
            }
            None if !self.use_default_values_if_other_is_none => {
                for (name, value) in candidates {
                    if !has_non_empty_value(&config, value) {
                        trace!("field {:?} is empty", name);
                        continue;
                    }
                    trace!("field {:?} changed", name);
                    changes.insert(name.clone(), self.change(value.clone(), Value::Null));
                }
            }
            None => {
                let defaults: BTreeMap<String, Value> = comparable_fields(record)
                    .into_iter()
                    .map(|field| (field.verbose_name().to_string(), field.default_value()))
                    .collect();
                for (name, value) in candidates {
                    if !has_non_empty_value(&config, value) {
                        trace!("field {:?} is empty", name);
                        continue;
                    }
                    let default = defaults.get(name).cloned().unwrap_or_default();
                    if config.approx_equal(&default, value) {
                        trace!("field {:?} still holds its default", name);
                        continue;
                    }
                    trace!("field {:?} changed", name);
                    changes.insert(name.clone(), self.change(value.clone(), default));
                }
            }
        }

        debug!(
            "compared {} fields ({}), {} differ",
            mine.len(),
            match (other.is_some(), self.use_default_values_if_other_is_none) {
                (true, _) => "against other record",
                (false, false) => "against nothing",
                (false, true) => "against defaults",
            },
            changes.len()
        );
        Ok((FieldDiff { changes }, mine))
    }

    fn change(&self, mine: Value, other: Value) -> FieldChange {
        if self.show_other_as_second_value {
            FieldChange::new(mine, other)
        } else {
            FieldChange::new(other, mine)
        }
    }
}

/// Checks if a value is worth reporting against a missing record.
///
/// Non-empty lists always are.  Everything else is unless it is
/// approximately equal to `null`.
fn has_non_empty_value(config: &ApproxEqConfig, value: &Value) -> bool {
    match *value {
        Value::Null => false,
        Value::List(ref items) if !items.is_empty() => true,
        _ => !config.approx_equal(&Value::Null, value),
    }
}

/// The two differing values of a changed field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldChange {
    first: Value,
    second: Value,
}

impl FieldChange {
    /// Creates a new change.
    pub fn new(first: Value, second: Value) -> FieldChange {
        FieldChange { first, second }
    }

    /// Returns the first value.
    pub fn first(&self) -> &Value {
        &self.first
    }

    /// Returns the second value.
    pub fn second(&self) -> &Value {
        &self.second
    }

    /// Returns both values as a tuple.
    pub fn as_pair(&self) -> (&Value, &Value) {
        (&self.first, &self.second)
    }

    /// Converts the change into a tuple of values.
    pub fn into_pair(self) -> (Value, Value) {
        (self.first, self.second)
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.first, self.second)
    }
}

/// The fields that differ between two versions of a record.
///
/// Changes are keyed by the display name of the field.  The order of the
/// keys carries no meaning.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct FieldDiff {
    changes: BTreeMap<String, FieldChange>,
}

impl FieldDiff {
    /// Configures a field diff.
    pub fn configure() -> FieldDiffConfig {
        FieldDiffConfig::default()
    }

    /// Creates a diff with the default config.
    ///
    /// Equivalent to `FieldDiff::configure().diff_records(record, other)`.
    pub fn from_records<R: Record + ?Sized>(
        record: &R,
        other: Option<&R>,
    ) -> Result<FieldDiff, Error> {
        FieldDiff::configure().diff_records(record, other)
    }

    /// Returns the change of a field by display name.
    pub fn get(&self, verbose_name: &str) -> Option<&FieldChange> {
        self.changes.get(verbose_name)
    }

    /// Returns `true` if the field changed.
    pub fn contains(&self, verbose_name: &str) -> bool {
        self.changes.contains_key(verbose_name)
    }

    /// Returns the number of changed fields.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterates over the display names of the changed fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(|name| name.as_str())
    }

    /// Iterates over all changes.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldChange> {
        self.changes.iter()
    }

    /// Converts the diff into a map of changes.
    pub fn into_changes(self) -> BTreeMap<String, FieldChange> {
        self.changes
    }
}

impl<'a> IntoIterator for &'a FieldDiff {
    type Item = (&'a String, &'a FieldChange);
    type IntoIter = btree_map::Iter<'a, String, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl fmt::Display for FieldDiff {
    /// Renders one `name: first -> second` line per change.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, change)) in self.changes.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", name, change)?;
        }
        Ok(())
    }
}

/// Computes field diffs and remembers the latest one.
///
/// The cache is not synchronized.  Use one differ per thread or wrap it
/// in a lock.
#[derive(Clone, Debug, Default)]
pub struct FieldDiffer {
    latest: Option<FieldDiff>,
    latest_snapshot: Option<Snapshot>,
}

impl FieldDiffer {
    /// Creates a differ with an empty cache.
    pub fn new() -> FieldDiffer {
        FieldDiffer::default()
    }

    /// Diffs `record` against `other` and caches the result.
    pub fn compare<R: Record + ?Sized>(
        &mut self,
        config: &FieldDiffConfig,
        record: &R,
        other: Option<&R>,
    ) -> Result<&FieldDiff, Error> {
        let (diff, snapshot) = config.diff(record, other)?;
        self.latest_snapshot = Some(snapshot);
        Ok(&*self.latest.insert(diff))
    }

    /// Returns the cached diff or computes one with the default config.
    ///
    /// Once a diff is cached the arguments are not looked at, so this is
    /// only useful for repeated reads of the same result.
    pub fn latest_or_compare<R: Record + ?Sized>(
        &mut self,
        record: &R,
        other: Option<&R>,
    ) -> Result<&FieldDiff, Error> {
        let diff = match self.latest.take() {
            Some(diff) => {
                debug!("using cached field diff with {} changes", diff.len());
                diff
            }
            None => {
                let (diff, snapshot) = FieldDiffConfig::default().diff(record, other)?;
                self.latest_snapshot = Some(snapshot);
                diff
            }
        };
        Ok(&*self.latest.insert(diff))
    }

    /// Returns the cached diff if there is one.
    pub fn latest(&self) -> Option<&FieldDiff> {
        self.latest.as_ref()
    }

    /// Returns the snapshot of `record` taken by the latest comparison.
    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.latest_snapshot.as_ref()
    }

    /// Drops the cached diff and snapshot.
    pub fn invalidate(&mut self) {
        self.latest = None;
        self.latest_snapshot = None;
    }
}

#[cfg(test)]
use crate::record::Person;

#[cfg(test)]
fn pair<A: Into<Value>, B: Into<Value>>(first: A, second: B) -> FieldChange {
    FieldChange::new(first.into(), second.into())
}

#[test]
fn test_against_other_record() {
    let old = Person {
        score: Some(1.5),
        ..Person::named("Bob")
    };
    let new = Person {
        score: Some(2.0),
        nickname: Some("  ".into()),
        ..Person::named("Alice ")
    };
    let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
    assert_eq!(diff.len(), 2);
    assert_eq!(diff.get("Name"), Some(&pair("Alice ", "Bob")));
    assert_eq!(diff.get("Score"), Some(&pair(2.0, 1.5)));
    insta::assert_snapshot!(diff.to_string(), @r###"
    Name: "Alice " -> "Bob"
    Score: 2.0 -> 1.5
    "###);
}

#[test]
fn test_equal_records() {
    let old = Person {
        status: Some("active".into()),
        ..Person::named("Alice")
    };
    let new = Person {
        status: Some(" active".into()),
        nickname: Some("".into()),
        ..Person::named("Alice ")
    };
    assert!(FieldDiff::from_records(&new, Some(&old)).unwrap().is_empty());
}

#[test]
fn test_ignored_fields_never_reported() {
    let old = Person {
        id: 1,
        last_edited: Some("2014-03-19".into()),
        ..Person::named("Alice")
    };
    let new = Person {
        id: 2,
        last_edited: Some("2014-03-20".into()),
        ..Person::named("Alice")
    };
    assert!(FieldDiff::from_records(&new, Some(&old)).unwrap().is_empty());
}

#[test]
fn test_custom_ignore_list() {
    let old = Person {
        nickname: Some("Al".into()),
        ignore_nickname: true,
        ..Person::named("Alice")
    };
    let new = Person {
        nickname: Some("Ally".into()),
        ignore_nickname: true,
        ..Person::named("Alicia")
    };
    let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
    assert_eq!(diff.field_names().collect::<Vec<_>>(), vec!["Name"]);
}

#[test]
fn test_relationships() {
    let old = Person {
        company_id: Some(1),
        ..Person::named("Alice")
    };
    let new = Person {
        company_id: Some(2),
        ..Person::named("Alice")
    };
    assert!(FieldDiff::from_records(&new, Some(&old)).unwrap().is_empty());

    let new = Person {
        include_company: true,
        ..new
    };
    let old = Person {
        include_company: true,
        ..old
    };
    let diff = FieldDiff::from_records(&new, Some(&old)).unwrap();
    assert_eq!(diff.get("Company"), Some(&pair(2, 1)));
}

#[test]
fn test_left_record_drives_fields() {
    // only the right side has the relationship in its snapshot
    let old = Person {
        company_id: Some(1),
        include_company: true,
        ..Person::named("Alice")
    };
    let new = Person::named("Alice");
    assert!(FieldDiff::from_records(&new, Some(&old)).unwrap().is_empty());

    // the left side has it and the right side does not
    let diff = FieldDiff::from_records(&old, Some(&new)).unwrap();
    assert_eq!(diff.get("Company"), Some(&pair(1, Value::Null)));
}

#[test]
fn test_against_nothing() {
    let person = Person::named("Alice");
    let diff = FieldDiff::from_records(&person, None).unwrap();
    assert_eq!(diff.len(), 1);
    assert_eq!(diff.get("Name"), Some(&pair("Alice", Value::Null)));
    insta::assert_snapshot!(diff.to_string(), @r###"Name: "Alice" -> null"###);
}

#[test]
fn test_against_nothing_skips_blanks() {
    let person = Person {
        nickname: Some("   ".into()),
        tags: Some(vec!["vip".into()]),
        score: Some(0.0),
        ..Person::default()
    };
    let diff = FieldDiff::from_records(&person, None).unwrap();
    assert_eq!(
        diff.field_names().collect::<Vec<_>>(),
        vec!["Score", "Tags"]
    );
    assert_eq!(diff.get("Tags"), Some(&pair(vec!["vip"], Value::Null)));
}

#[test]
fn test_against_nothing_blanks_distinct_from_null() {
    #[derive(Default)]
    struct Strict(Person);

    impl Record for Strict {
        fn fields(&self) -> Vec<crate::FieldDescriptor> {
            self.0.fields()
        }

        fn value_of(&self, field: &crate::FieldDescriptor) -> Option<Value> {
            self.0.value_of(field)
        }

        fn approx_eq_config(&self) -> ApproxEqConfig {
            let mut config = ApproxEqConfig::default();
            config.empty_strings_are_equal_to_null_strings(false);
            config
        }
    }

    let person = Strict(Person {
        nickname: Some("".into()),
        ..Person::default()
    });
    let diff = FieldDiff::from_records(&person, None).unwrap();
    assert_eq!(diff.get("Nickname"), Some(&pair("", Value::Null)));
}

#[test]
fn test_against_defaults() {
    let mut config = FieldDiff::configure();
    config
        .use_default_values_if_other_is_none(true)
        .show_other_as_second_value(false);

    let unchanged = Person {
        status: Some("active".into()),
        score: Some(0.0),
        nickname: Some(" ".into()),
        ..Person::default()
    };
    assert!(config.diff_records(&unchanged, None).unwrap().is_empty());

    let changed = Person {
        status: Some("inactive".into()),
        ..Person::named("Alice")
    };
    let diff = config.diff_records(&changed, None).unwrap();
    assert_eq!(diff.get("Status"), Some(&pair("active", "inactive")));
    assert_eq!(diff.get("Name"), Some(&pair(Value::Null, "Alice")));
    assert_eq!(diff.len(), 2);
}

#[test]
fn test_defaults_ignored_with_other_record() {
    let mut config = FieldDiff::configure();
    config.use_default_values_if_other_is_none(true);
    let old = Person::named("Alice");
    let new = Person {
        status: Some("active".into()),
        ..Person::named("Alice")
    };
    let diff = config.diff_records(&new, Some(&old)).unwrap();
    assert_eq!(diff.get("Status"), Some(&pair("active", Value::Null)));
}

#[test]
fn test_swapped_order() {
    let old = Person {
        score: Some(1.0),
        ..Person::named("Bob")
    };
    let new = Person {
        score: Some(3.25),
        ..Person::named("Alice")
    };
    let forward = FieldDiff::from_records(&new, Some(&old)).unwrap();
    let backward = FieldDiff::configure()
        .show_other_as_second_value(false)
        .diff_records(&new, Some(&old))
        .unwrap();
    assert_eq!(forward.len(), backward.len());
    for (name, change) in &forward {
        let (first, second) = change.as_pair();
        let (rev_first, rev_second) = backward.get(name).unwrap().as_pair();
        assert_eq!(first, rev_second);
        assert_eq!(second, rev_first);
    }
}

#[test]
fn test_swapped_order_against_nothing() {
    let person = Person {
        status: Some("inactive".into()),
        ..Person::named("Alice")
    };

    let mut config = FieldDiff::configure();
    let forward = config.diff_records(&person, None).unwrap();
    let backward = config
        .show_other_as_second_value(false)
        .diff_records(&person, None)
        .unwrap();
    assert_eq!(forward.get("Name"), Some(&pair("Alice", Value::Null)));
    assert_eq!(backward.get("Name"), Some(&pair(Value::Null, "Alice")));
    assert_eq!(forward.get("Status"), Some(&pair("inactive", Value::Null)));
    assert_eq!(backward.get("Status"), Some(&pair(Value::Null, "inactive")));
    assert_eq!(forward.len(), 2);
    assert_eq!(backward.len(), 2);
}

#[test]
fn test_swapped_order_against_defaults() {
    let person = Person {
        status: Some("inactive".into()),
        ..Person::named("Alice")
    };

    let mut config = FieldDiff::configure();
    config.use_default_values_if_other_is_none(true);
    let forward = config.diff_records(&person, None).unwrap();
    let backward = config
        .show_other_as_second_value(false)
        .diff_records(&person, None)
        .unwrap();
    assert_eq!(forward.get("Status"), Some(&pair("inactive", "active")));
    assert_eq!(backward.get("Status"), Some(&pair("active", "inactive")));
    assert_eq!(forward.get("Name"), Some(&pair("Alice", Value::Null)));
    assert_eq!(backward.get("Name"), Some(&pair(Value::Null, "Alice")));

    for (name, change) in forward.into_changes() {
        let (first, second) = change.into_pair();
        let reversed = backward.get(&name).unwrap();
        assert_eq!(reversed.first(), &second);
        assert_eq!(reversed.second(), &first);
    }
}

#[test]
fn test_nan_field_equals_itself() {
    let person = Person {
        score: Some(f64::NAN),
        ..Person::named("Alice")
    };
    assert!(FieldDiff::from_records(&person, Some(&person))
        .unwrap()
        .is_empty());

    let other = Person {
        score: Some(1.0),
        ..Person::named("Alice")
    };
    let diff = FieldDiff::from_records(&person, Some(&other)).unwrap();
    assert_eq!(diff.field_names().collect::<Vec<_>>(), vec!["Score"]);
    assert!(diff.get("Score").unwrap().first().as_f64().unwrap().is_nan());
}

#[test]
fn test_idempotent() {
    let old = Person::named("Bob");
    let new = Person::named("Alice");
    assert_eq!(
        FieldDiff::from_records(&new, Some(&old)).unwrap(),
        FieldDiff::from_records(&new, Some(&old)).unwrap()
    );
}

#[test]
fn test_missing_value_propagates() {
    struct Liar;

    impl Record for Liar {
        fn fields(&self) -> Vec<crate::FieldDescriptor> {
            vec![crate::FieldDescriptor::new("name", "Name")]
        }

        fn value_of(&self, _field: &crate::FieldDescriptor) -> Option<Value> {
            None
        }
    }

    assert_eq!(
        FieldDiff::from_records(&Liar, None).unwrap_err(),
        Error::MissingFieldValue {
            field: "name".into()
        }
    );
}

#[test]
fn test_differ_caches_latest() {
    let old = Person::named("Bob");
    let mut new = Person::named("Alice");
    let mut differ = FieldDiffer::new();
    assert!(differ.latest().is_none());

    let first = differ
        .compare(&FieldDiffConfig::default(), &new, Some(&old))
        .unwrap()
        .clone();
    assert_eq!(first.get("Name"), Some(&pair("Alice", "Bob")));
    assert_eq!(
        differ.latest_snapshot().and_then(|s| s.get("Name")),
        Some(&Value::from("Alice"))
    );

    // mutations are not noticed by the cache
    new.name = Some("Bob".into());
    assert_eq!(differ.latest_or_compare(&new, Some(&old)).unwrap(), &first);

    // neither are different arguments
    assert_eq!(differ.latest_or_compare(&new, None).unwrap(), &first);

    assert!(differ
        .compare(&FieldDiffConfig::default(), &new, Some(&old))
        .unwrap()
        .is_empty());
}

#[test]
fn test_differ_caches_empty_results() {
    let person = Person::named("Alice");
    let mut differ = FieldDiffer::new();
    assert!(differ
        .compare(&FieldDiffConfig::default(), &person, Some(&person))
        .unwrap()
        .is_empty());
    let other = Person::named("Bob");
    assert!(differ
        .latest_or_compare(&person, Some(&other))
        .unwrap()
        .is_empty());
}

#[test]
fn test_differ_computes_when_empty() {
    let person = Person::named("Alice");
    let mut differ = FieldDiffer::new();
    let diff = differ.latest_or_compare(&person, None).unwrap();
    assert_eq!(diff.get("Name"), Some(&pair("Alice", Value::Null)));
    assert!(differ.latest().is_some());

    differ.invalidate();
    assert!(differ.latest().is_none());
    assert!(differ.latest_snapshot().is_none());
}
