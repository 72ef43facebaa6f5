//! Sort specifications and the record comparator.
//!
//! Provides [`Direction`] and [`SortKey`] for a single ordering, [`SortSpec`]
//! for the prioritized list the user builds by clicking column headers, and
//! [`sort_indices`] which applies a list of keys to a record set.

use std::cmp::Ordering;

use deunicode::deunicode;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, FieldContext, Result};
use crate::schema::{DataDomain, Schema};
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first.
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    /// Largest first.
    #[serde(alias = "desc")]
    Descending,
}

impl Direction {
    pub fn is_ascending(self) -> bool {
        matches!(self, Direction::Ascending)
    }

    pub fn is_descending(self) -> bool {
        matches!(self, Direction::Descending)
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Ascending`, returns the ordering unchanged.
    /// For `Descending`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// A single sort key: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        SortKey {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Descending)
    }
}

/// Prioritized sort keys. The first key is the primary one; a field appears
/// at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a spec from keys, rejecting duplicate fields.
    pub fn from_keys(keys: Vec<SortKey>) -> Result<Self> {
        let spec = SortSpec { keys };
        spec.check_unique()?;
        Ok(spec)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.field.as_str())
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.field == field)
    }

    /// Direction of `field`, if it is sorted on.
    pub fn direction_for(&self, field: &str) -> Option<Direction> {
        self.position(field).map(|i| self.keys[i].direction)
    }

    /// 1-based priority of `field`, as shown next to a column heading.
    pub fn order_for(&self, field: &str) -> Option<usize> {
        self.position(field).map(|i| i + 1)
    }

    /// Sets the direction for `field`, appending it if it is not present.
    pub fn set(&mut self, field: impl Into<String>, direction: Direction) {
        let field = field.into();
        match self.position(&field) {
            Some(i) => self.keys[i].direction = direction,
            None => self.keys.push(SortKey::new(field, direction)),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<SortKey> {
        self.position(field).map(|i| self.keys.remove(i))
    }

    /// Applies a column-header click.
    ///
    /// A plain click makes `field` the only key: ascending, or descending if
    /// it was already sorted ascending. A modified (`additive`) click edits
    /// the field's entry in place, cycling ascending → descending → removed;
    /// a field not yet sorted on is appended ascending.
    pub fn apply_click(&mut self, field: &str, additive: bool) {
        let current = self.direction_for(field);
        if additive {
            match current {
                None => self.keys.push(SortKey::asc(field)),
                Some(Direction::Ascending) => self.set(field, Direction::Descending),
                Some(Direction::Descending) => {
                    self.remove(field);
                }
            }
        } else {
            let direction = match current {
                Some(Direction::Ascending) => Direction::Descending,
                _ => Direction::Ascending,
            };
            self.keys = vec![SortKey::new(field, direction)];
        }
    }

    /// Checks that every key names a schema field and no field repeats.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for key in &self.keys {
            schema.require(&key.field, FieldContext::Sort)?;
        }
        self.check_unique()
    }

    fn check_unique(&self) -> Result<()> {
        for (i, key) in self.keys.iter().enumerate() {
            if self.keys[..i].iter().any(|k| k.field == key.field) {
                return Err(EngineError::DuplicateSortField {
                    field: key.field.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<SortKey> for SortSpec {
    fn from(key: SortKey) -> Self {
        SortSpec { keys: vec![key] }
    }
}

/// Normalized comparison key for one field value.
///
/// Grouping derives its group values from the same key, so two values share
/// a group exactly when their keys compare equal (dates: the same day).
/// Readable values sort first, then values unreadable in the field's domain,
/// then blank ones.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CmpKey {
    Number(f64),
    Time(i64),
    Bool(bool),
    Text(Collated),
    Collection(Vec<Collated>),
    /// Present, but not readable in the field's domain.
    Unreadable(Collated),
    /// Missing, whitespace-only or an empty collection.
    Empty,
}

impl CmpKey {
    fn rank(&self) -> u8 {
        match self {
            CmpKey::Unreadable(_) => 1,
            CmpKey::Empty => 2,
            _ => 0,
        }
    }
}

/// Collation key for locale-aware text ordering: transliterated and
/// case-folded first, trimmed raw text second so the order stays total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Collated {
    folded: String,
    pub(crate) raw: String,
}

impl Collated {
    fn new(s: &str) -> Self {
        let raw = s.trim();
        Collated {
            folded: deunicode(raw).to_lowercase(),
            raw: raw.to_string(),
        }
    }
}

pub(crate) fn cmp_key(value: &Value<'_>, domain: DataDomain) -> CmpKey {
    if value.is_blank() {
        return CmpKey::Empty;
    }
    let readable = match domain.comparison_class() {
        // `+ 0.0` folds -0.0 into 0.0.
        DataDomain::Number => value.as_number_lenient().map(|n| CmpKey::Number(n + 0.0)),
        DataDomain::Date => value
            .as_timestamp_lenient()
            .map(|t| CmpKey::Time(t.as_millis())),
        DataDomain::Boolean => value.as_bool_lenient().map(CmpKey::Bool),
        DataDomain::Collection => Some(CmpKey::Collection(match value.as_collection() {
            Some(items) => items.iter().map(|s| Collated::new(s)).collect(),
            None => vec![Collated::new(&value.to_text())],
        })),
        _ => Some(CmpKey::Text(Collated::new(&value.to_text()))),
    };
    readable.unwrap_or_else(|| CmpKey::Unreadable(Collated::new(&value.to_text())))
}

fn compare_keys(a: &CmpKey, b: &CmpKey) -> Ordering {
    a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
        // NaN never reaches here: lenient coercion maps it to None.
        (CmpKey::Number(a), CmpKey::Number(b)) => a.total_cmp(b),
        (CmpKey::Time(a), CmpKey::Time(b)) => a.cmp(b),
        (CmpKey::Bool(a), CmpKey::Bool(b)) => a.cmp(b),
        (CmpKey::Text(a), CmpKey::Text(b)) | (CmpKey::Unreadable(a), CmpKey::Unreadable(b)) => {
            a.cmp(b)
        }
        // Remaining items only break ties between equal first items.
        (CmpKey::Collection(a), CmpKey::Collection(b)) => {
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        _ => Ordering::Equal,
    })
}

/// Compares two values of a field in ascending order.
///
/// - strings: transliterated, case-insensitive, then by raw text
/// - number / currency: numerically
/// - date / datetime: by instant
/// - collection: by length, then by first element
/// - boolean: `false` before `true`
///
/// Values that cannot be read in the domain compare greater than every
/// readable value, and blank values greater still.
pub fn compare_field(a: &Value<'_>, b: &Value<'_>, domain: DataDomain) -> Ordering {
    compare_keys(&cmp_key(a, domain), &cmp_key(b, domain))
}

/// Sorts record indices by `keys`.
///
/// Records that compare equal on every key keep their relative order by
/// index, ascending, regardless of the keys' directions. Fields missing from
/// the schema compare as strings.
pub fn sort_indices<T, F>(
    records: &[T],
    indices: &mut Vec<usize>,
    keys: &[SortKey],
    schema: &Schema,
    accessor: &F,
) where
    for<'a> F: Fn(&'a T, &str) -> Value<'a>,
{
    if keys.is_empty() {
        indices.sort_unstable();
        return;
    }

    let domains: Vec<DataDomain> = keys
        .iter()
        .map(|k| schema.domain_of(&k.field).unwrap_or(DataDomain::String))
        .collect();

    let mut decorated: Vec<(usize, Vec<CmpKey>)> = indices
        .iter()
        .map(|&i| {
            let row = keys
                .iter()
                .zip(&domains)
                .map(|(key, domain)| cmp_key(&accessor(&records[i], &key.field), *domain))
                .collect();
            (i, row)
        })
        .collect();

    decorated.sort_by(|(ia, ka), (ib, kb)| {
        keys.iter()
            .enumerate()
            .map(|(k, key)| key.direction.apply(compare_keys(&ka[k], &kb[k])))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| ia.cmp(ib))
    });

    indices.clear();
    indices.extend(decorated.into_iter().map(|(i, _)| i));
}
