//! The capability a host record type provides to be diffable.
//!
//! The diffing code never knows what a record actually is.  It only asks
//! the record for its [`FieldDescriptor`]s and for the current value behind
//! each of them.  Everything else (persistence, schemas, relationships)
//! stays with the host.
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::{ApproxEqConfig, Error, Value};

/// Display names that are never reported as changed by default.
pub const DEFAULT_FIELDS_TO_IGNORE: &[&str] = &[
    "Date Last Edited",
    "Last Edited",
    "date_last_edited",
    "ID",
    "uuid",
];

/// Describes one field of a record type.
///
/// The `name` is what the host uses internally to look the value up, the
/// `verbose_name` is the human facing name and the key diffs are reported
/// under.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    verbose_name: String,
    is_relation: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    /// Creates a plain field without a default.
    pub fn new(name: &str, verbose_name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            verbose_name: verbose_name.to_string(),
            is_relation: false,
            default: None,
        }
    }

    /// Marks the field as a relationship to another record.
    pub fn relation(mut self) -> FieldDescriptor {
        self.is_relation = true;
        self
    }

    /// Sets the value a brand new record has for this field.
    pub fn with_default<V: Into<Value>>(mut self, value: V) -> FieldDescriptor {
        self.default = Some(value.into());
        self
    }

    /// Returns the internal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name.
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    /// Returns `true` if this field points at another record.
    pub fn is_relation(&self) -> bool {
        self.is_relation
    }

    /// Returns the configured default if there is one.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the configured default or `null`.
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or_default()
    }
}

/// A record that can be compared field by field.
///
/// Only [`Record::fields`] and [`Record::value_of`] must be implemented.
/// The remaining methods carry the per type configuration and can be
/// overridden.
///
/// ```rust
/// use fielddiff::{FieldDescriptor, Record, Value};
///
/// struct Dish {
///     name: String,
///     price: f64,
/// }
///
/// impl Record for Dish {
///     fn fields(&self) -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::new("name", "Name"),
///             FieldDescriptor::new("price", "Price").with_default(0.0),
///         ]
///     }
///
///     fn value_of(&self, field: &FieldDescriptor) -> Option<Value> {
///         match field.name() {
///             "name" => Some(self.name.as_str().into()),
///             "price" => Some(self.price.into()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Returns the descriptors of all fields of this record.
    fn fields(&self) -> Vec<FieldDescriptor>;

    /// Returns the current value of a field.
    ///
    /// Returning `None` for a field that [`Record::fields`] declared is a
    /// bug in the record and surfaces as [`Error::MissingFieldValue`].
    fn value_of(&self, field: &FieldDescriptor) -> Option<Value>;

    /// Display names that are never reported as changed.
    ///
    /// Defaults to [`DEFAULT_FIELDS_TO_IGNORE`].
    fn fields_to_ignore(&self) -> Vec<&str> {
        DEFAULT_FIELDS_TO_IGNORE.to_vec()
    }

    /// Internal names of relationship fields that take part in diffs.
    ///
    /// All relationships are excluded by default because only the host
    /// knows what it means for two relationships to be equal.  An included
    /// relationship is compared by the value [`Record::value_of`] returns
    /// for it, which is typically the key of the related record.
    fn relationships_to_include(&self) -> Vec<&str> {
        Vec::new()
    }

    /// The equality rules for values of this record type.
    fn approx_eq_config(&self) -> ApproxEqConfig {
        ApproxEqConfig::default()
    }
}

/// Returns the descriptors of the fields that take part in a diff.
///
/// These are all non relationship fields plus the relationships the
/// record opted into.
pub fn comparable_fields<R: Record + ?Sized>(record: &R) -> Vec<FieldDescriptor> {
    let included = record.relationships_to_include();
    record
        .fields()
        .into_iter()
        .filter(|field| !field.is_relation() || included.contains(&field.name()))
        .collect()
}

/// The comparable values of a record at one point in time.
///
/// Values are keyed by display name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Materializes the comparable fields of a record.
    pub fn of<R: Record + ?Sized>(record: &R) -> Result<Snapshot, Error> {
        let mut values = BTreeMap::new();
        for field in comparable_fields(record) {
            let value = record
                .value_of(&field)
                .ok_or_else(|| Error::MissingFieldValue {
                    field: field.name().to_string(),
                })?;
            values.insert(field.verbose_name, value);
        }
        Ok(Snapshot { values })
    }

    /// Looks up a value by display name.
    pub fn get(&self, verbose_name: &str) -> Option<&Value> {
        self.values.get(verbose_name)
    }

    /// Returns `true` if the snapshot has a field with this display name.
    pub fn contains(&self, verbose_name: &str) -> bool {
        self.values.contains_key(verbose_name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over display names and values.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct Person {
    pub id: i64,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub status: Option<String>,
    pub score: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub company_id: Option<i64>,
    pub last_edited: Option<String>,
    pub include_company: bool,
    pub ignore_nickname: bool,
}

#[cfg(test)]
impl Person {
    pub fn named(name: &str) -> Person {
        Person {
            name: Some(name.to_string()),
            ..Person::default()
        }
    }
}

#[cfg(test)]
impl Record for Person {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", "ID"),
            FieldDescriptor::new("name", "Name"),
            FieldDescriptor::new("nickname", "Nickname").with_default(""),
            FieldDescriptor::new("status", "Status").with_default("active"),
            FieldDescriptor::new("score", "Score").with_default(0.0),
            FieldDescriptor::new("tags", "Tags"),
            FieldDescriptor::new("company", "Company").relation(),
            FieldDescriptor::new("date_last_edited", "Date Last Edited"),
        ]
    }

    fn value_of(&self, field: &FieldDescriptor) -> Option<Value> {
        Some(match field.name() {
            "id" => self.id.into(),
            "name" => self.name.clone().into(),
            "nickname" => self.nickname.clone().into(),
            "status" => self.status.clone().into(),
            "score" => self.score.into(),
            "tags" => self.tags.clone().into(),
            "company" => self.company_id.into(),
            "date_last_edited" => self.last_edited.clone().into(),
            _ => return None,
        })
    }

    fn fields_to_ignore(&self) -> Vec<&str> {
        let mut rv = DEFAULT_FIELDS_TO_IGNORE.to_vec();
        if self.ignore_nickname {
            rv.push("Nickname");
        }
        rv
    }

    fn relationships_to_include(&self) -> Vec<&str> {
        if self.include_company {
            vec!["company"]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
struct Broken;

#[cfg(test)]
impl Record for Broken {
    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::new("ghost", "Ghost")]
    }

    fn value_of(&self, _field: &FieldDescriptor) -> Option<Value> {
        None
    }
}

#[test]
fn test_descriptor_builder() {
    let field = FieldDescriptor::new("status", "Status").with_default("active");
    assert_eq!(field.name(), "status");
    assert_eq!(field.verbose_name(), "Status");
    assert!(!field.is_relation());
    assert_eq!(field.default(), Some(&Value::from("active")));
    assert_eq!(FieldDescriptor::new("x", "X").default_value(), Value::Null);
    assert!(FieldDescriptor::new("owner", "Owner").relation().is_relation());
}

#[test]
fn test_snapshot_excludes_relationships() {
    let person = Person {
        company_id: Some(7),
        ..Person::named("Alice")
    };
    let snapshot = Snapshot::of(&person).unwrap();
    assert!(!snapshot.contains("Company"));
    assert_eq!(snapshot.get("Name"), Some(&Value::from("Alice")));
    assert_eq!(snapshot.get("ID"), Some(&Value::from(0)));
    assert_eq!(snapshot.len(), 7);
}

#[test]
fn test_snapshot_includes_opted_in_relationships() {
    let person = Person {
        company_id: Some(7),
        include_company: true,
        ..Person::named("Alice")
    };
    let snapshot = Snapshot::of(&person).unwrap();
    assert_eq!(snapshot.get("Company"), Some(&Value::from(7)));
    assert_eq!(snapshot.len(), 8);
}

#[test]
fn test_snapshot_keyed_by_display_name() {
    let snapshot = Snapshot::of(&Person::named("Alice")).unwrap();
    let names: Vec<&str> = snapshot.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Date Last Edited",
            "ID",
            "Name",
            "Nickname",
            "Score",
            "Status",
            "Tags"
        ]
    );
}

#[test]
fn test_snapshot_missing_value() {
    assert_eq!(
        Snapshot::of(&Broken).unwrap_err(),
        Error::MissingFieldValue {
            field: "ghost".into()
        }
    );
}
