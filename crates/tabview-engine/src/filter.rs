//! Predicate evaluation.
//!
//! A [`FilterSpec`] is the structured form of one field's filter: an
//! operator, a value, and for range operators a second value. Filter values
//! are kept as text, exactly as the user entered them, and are interpreted in
//! the light of the field's [`DataDomain`] each time they are evaluated.
//!
//! A filter whose value is empty supplies no constraint. This keeps
//! half-typed input from hiding every row while the user is still typing.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, FieldContext, Result};
use crate::op::FilterOperator;
use crate::schema::{DataDomain, Schema};
use crate::value::{parse_number, parse_timestamp, Timestamp, Value};

/// Structured filter for one field.
///
/// # Example
///
/// ```
/// use tabview_engine::{evaluate, DataDomain, FilterOperator, FilterSpec, Value};
///
/// let spec = FilterSpec::new(FilterOperator::Contains, "ada");
/// assert!(evaluate(&Value::String("Ada Lovelace"), DataDomain::String, &spec));
///
/// // Empty value: inactive, everything passes.
/// let spec = FilterSpec::new(FilterOperator::Gt, "");
/// assert!(evaluate(&Value::None, DataDomain::Number, &spec));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
    /// Upper bound, used only by `between` and `dateRange`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<String>,
}

impl FilterSpec {
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        FilterSpec {
            operator,
            value: value.into(),
            second_value: None,
        }
    }

    /// Creates a range filter with both bounds.
    pub fn range(
        operator: FilterOperator,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        FilterSpec {
            operator,
            value: low.into(),
            second_value: Some(high.into()),
        }
    }

    /// Creates an `isEmpty` filter.
    pub fn is_empty_filter() -> Self {
        FilterSpec::new(FilterOperator::IsEmpty, "")
    }

    /// Returns `true` if this filter constrains anything.
    ///
    /// `isEmpty` is always active. Range operators are active when either
    /// bound is present; every other operator needs a non-blank value.
    pub fn is_active(&self) -> bool {
        match self.operator {
            FilterOperator::IsEmpty => true,
            op if op.is_range() => !is_blank(&self.value) || !is_blank(self.second_bound()),
            _ => !is_blank(&self.value),
        }
    }

    fn second_bound(&self) -> &str {
        self.second_value.as_deref().unwrap_or("")
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Evaluates a filter against one field value.
///
/// Inactive filters (see [`FilterSpec::is_active`]) return `true`. Values
/// that cannot be interpreted in the field's domain never match, except under
/// `isEmpty`. An operator that does not belong to the domain matches nothing.
pub fn evaluate(field_value: &Value<'_>, domain: DataDomain, filter: &FilterSpec) -> bool {
    if !filter.is_active() {
        return true;
    }
    if filter.operator == FilterOperator::IsEmpty {
        return field_value.is_blank();
    }
    match domain.comparison_class() {
        DataDomain::Number => match_number(field_value, filter),
        DataDomain::Date => match_temporal(field_value, domain, filter),
        DataDomain::Collection => match_collection(field_value, filter),
        DataDomain::Boolean => match_bool(field_value, filter),
        _ => match_string(field_value, filter),
    }
}

fn match_string(field_value: &Value<'_>, filter: &FilterSpec) -> bool {
    let haystack = field_value.to_text().to_lowercase();
    let needle = filter.value.to_lowercase();
    match filter.operator {
        FilterOperator::Contains => haystack.contains(&needle),
        FilterOperator::DoesNotContain => !haystack.contains(&needle),
        FilterOperator::Equals => haystack == needle,
        FilterOperator::StartsWith => haystack.starts_with(&needle),
        FilterOperator::EndsWith => haystack.ends_with(&needle),
        _ => false,
    }
}

/// Inclusive bounds of a range filter. A missing bound is open; a present
/// bound that does not parse makes the whole filter unsatisfiable.
fn bounds<T: PartialOrd + Copy>(
    filter: &FilterSpec,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<(Option<T>, Option<T>)> {
    let bound = |raw: &str| -> Option<Option<T>> {
        if is_blank(raw) {
            Some(None)
        } else {
            parse(raw).map(Some)
        }
    };
    let low = bound(&filter.value)?;
    let high = bound(filter.second_bound())?;
    Some(match (low, high) {
        (Some(a), Some(b)) if b < a => (Some(b), Some(a)),
        pair => pair,
    })
}

fn in_bounds<T: PartialOrd>(x: T, (low, high): (Option<T>, Option<T>)) -> bool {
    low.map_or(true, |low| x >= low) && high.map_or(true, |high| x <= high)
}

fn match_number(field_value: &Value<'_>, filter: &FilterSpec) -> bool {
    let Some(n) = field_value.as_number_lenient() else {
        return false;
    };
    match filter.operator {
        FilterOperator::Between => bounds(filter, parse_number).is_some_and(|b| in_bounds(n, b)),
        op @ (FilterOperator::Eq
        | FilterOperator::Neq
        | FilterOperator::Gt
        | FilterOperator::Lt
        | FilterOperator::Gte
        | FilterOperator::Lte) => parse_number(&filter.value)
            .and_then(|target| n.partial_cmp(&target))
            .is_some_and(|ordering| op.eval_ordering(ordering)),
        _ => false,
    }
}

fn match_temporal(field_value: &Value<'_>, domain: DataDomain, filter: &FilterSpec) -> bool {
    // Dates compare by calendar day, datetimes by instant.
    let key = |t: Timestamp| match domain {
        DataDomain::Date => t.day(),
        _ => t.as_millis(),
    };
    let Some(at) = field_value.as_timestamp_lenient().map(key) else {
        return false;
    };
    match filter.operator {
        FilterOperator::DateRange => bounds(filter, |raw| parse_timestamp(raw).map(key))
            .is_some_and(|b| in_bounds(at, b)),
        FilterOperator::Is
        | FilterOperator::IsNot
        | FilterOperator::IsBefore
        | FilterOperator::IsAfter => parse_timestamp(&filter.value)
            .map(key)
            .is_some_and(|target| filter.operator.eval_ordering(at.cmp(&target))),
        _ => false,
    }
}

fn match_collection(field_value: &Value<'_>, filter: &FilterSpec) -> bool {
    let items: Vec<String> = collection_items(field_value)
        .iter()
        .map(|item| item.trim().to_lowercase())
        .collect();
    let has = |wanted: &str| items.iter().any(|item| item == wanted);

    match filter.operator {
        FilterOperator::Contains => has(&filter.value.trim().to_lowercase()),
        FilterOperator::DoesNotContain => !has(&filter.value.trim().to_lowercase()),
        FilterOperator::ContainsAny | FilterOperator::ContainsAll => {
            let wanted = value_list(&filter.value);
            if wanted.is_empty() {
                return true;
            }
            if filter.operator == FilterOperator::ContainsAny {
                wanted.iter().any(|w| has(w))
            } else {
                wanted.iter().all(|w| has(w))
            }
        }
        _ => false,
    }
}

/// Items of a collection cell. A scalar is treated as a one-item collection.
fn collection_items<'v>(field_value: &'v Value<'_>) -> Vec<Cow<'v, str>> {
    match field_value {
        Value::Collection(items) => items.iter().map(|i| Cow::Borrowed(i.as_ref())).collect(),
        v if v.is_blank() => Vec::new(),
        v => vec![v.to_text()],
    }
}

/// Splits a comma-separated filter value into normalized items.
fn value_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn match_bool(field_value: &Value<'_>, filter: &FilterSpec) -> bool {
    if filter.operator != FilterOperator::Equals {
        return false;
    }
    let wanted = Value::String(&filter.value).as_bool_lenient();
    match (field_value.as_bool_lenient(), wanted) {
        (Some(actual), Some(wanted)) => actual == wanted,
        _ => false,
    }
}

/// Filters for a record set, keyed by field id.
///
/// A record passes when it satisfies every active filter. Fields without a
/// filter impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterSpec>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter for a field, replacing any previous one.
    pub fn insert(&mut self, field: impl Into<String>, spec: FilterSpec) {
        self.filters.insert(field.into(), spec);
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterSpec> {
        self.filters.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FilterSpec> {
        self.filters.get(field)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Filters that currently constrain the record set.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.iter().filter(|(_, spec)| spec.is_active())
    }

    /// Checks every filter against the schema.
    ///
    /// Fails on the first filter that names an unknown field or uses an
    /// operator outside its field's domain.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        for (field, spec) in self.iter() {
            validate_filter(schema, field, spec.operator)?;
        }
        Ok(())
    }

    /// Returns `true` if the record satisfies every active filter.
    pub fn matches<T, F>(&self, record: &T, schema: &Schema, accessor: &F) -> bool
    where
        for<'a> F: Fn(&'a T, &str) -> Value<'a>,
    {
        self.active().all(|(field, spec)| {
            let domain = schema.domain_of(field).unwrap_or(DataDomain::String);
            evaluate(&accessor(record, field), domain, spec)
        })
    }
}

impl FromIterator<(String, FilterSpec)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (String, FilterSpec)>>(iter: I) -> Self {
        FilterSet {
            filters: iter.into_iter().collect(),
        }
    }
}

/// Checks that `field` exists and that `operator` belongs to its domain.
pub(crate) fn validate_filter(schema: &Schema, field: &str, operator: FilterOperator) -> Result<()> {
    let descriptor = schema.require(field, FieldContext::Filter)?;
    if operator.supports(descriptor.data_domain) {
        Ok(())
    } else {
        Err(EngineError::UnsupportedOperator {
            field: field.to_string(),
            operator,
            domain: descriptor.data_domain,
        })
    }
}
