//! Group synthesis.
//!
//! Grouping turns a sorted run of records into a flat sequence of
//! [`DisplayRow`]s where synthesized [`GroupHeader`]s precede the records they
//! cover. Headers nest one level per group field. Each header is keyed by its
//! [`GroupPath`], which is also the key for collapse state.
//!
//! The walk is a single pass and relies on members of a group being
//! contiguous, which holds when the records are sorted by the group fields
//! first. [`GroupOrderMode`] decides whether that is the caller's job, is
//! checked, or is arranged by the engine.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::SecondsFormat;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, FieldContext, Result};
use crate::ordering::{cmp_key, CmpKey, SortKey, SortSpec};
use crate::schema::{DataDomain, Schema};
use crate::value::{Timestamp, Value};

/// Label shown for records whose group field is missing or blank.
pub const EMPTY_GROUP_LABEL: &str = "(empty)";

const PATH_SEPARATOR: &str = " / ";

/// The value a group is formed around.
///
/// Missing and blank values form their own group, distinct from any record
/// whose value is the literal text `(empty)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum GroupValue {
    Value(String),
    Empty,
}

impl GroupValue {
    /// Derives the group value of a field value.
    ///
    /// Built from the sort comparator's key, so values that sort as equal
    /// share a group. Dates group by calendar day, datetimes by instant,
    /// numbers and booleans by their canonical form, text by its trimmed
    /// form. Values unreadable in the domain keep their trimmed text.
    pub fn of(value: &Value<'_>, domain: DataDomain) -> GroupValue {
        let label = match cmp_key(value, domain) {
            CmpKey::Empty => return GroupValue::Empty,
            CmpKey::Number(n) => n.to_string(),
            CmpKey::Time(millis) => time_label(millis, domain),
            CmpKey::Bool(b) => b.to_string(),
            CmpKey::Text(text) | CmpKey::Unreadable(text) => text.raw,
            CmpKey::Collection(items) => items
                .iter()
                .map(|item| escape_item(&item.raw))
                .collect::<Vec<_>>()
                .join(", "),
        };
        GroupValue::Value(label)
    }

    pub fn label(&self) -> &str {
        match self {
            GroupValue::Value(s) => s,
            GroupValue::Empty => EMPTY_GROUP_LABEL,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GroupValue::Empty)
    }
}

fn time_label(millis: i64, domain: DataDomain) -> String {
    match Timestamp(millis).to_datetime() {
        Some(dt) if domain == DataDomain::Date => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => millis.to_string(),
    }
}

/// Escapes the item separator so distinct collections never share a label.
fn escape_item(item: &str) -> Cow<'_, str> {
    if item.contains([',', '\\']) {
        Cow::Owned(item.replace('\\', "\\\\").replace(',', "\\,"))
    } else {
        Cow::Borrowed(item)
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Option<String>> for GroupValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(GroupValue::Empty, GroupValue::Value)
    }
}

impl From<GroupValue> for Option<String> {
    fn from(value: GroupValue) -> Self {
        match value {
            GroupValue::Value(s) => Some(s),
            GroupValue::Empty => None,
        }
    }
}

impl From<&str> for GroupValue {
    fn from(s: &str) -> Self {
        GroupValue::Value(s.to_string())
    }
}

/// Chain of group values from the outermost group down to one header.
///
/// Paths compare structurally, so a value containing the display separator
/// never collides with a deeper path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupPath(Vec<GroupValue>);

impl GroupPath {
    pub fn new(values: Vec<GroupValue>) -> Self {
        GroupPath(values)
    }

    /// The path one level below this one.
    pub fn child(&self, value: GroupValue) -> GroupPath {
        let mut values = self.0.clone();
        values.push(value);
        GroupPath(values)
    }

    pub fn parent(&self) -> Option<GroupPath> {
        match self.0.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(GroupPath(rest.to_vec())),
            _ => None,
        }
    }

    pub fn values(&self) -> &[GroupValue] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&GroupValue> {
        self.0.last()
    }

    /// Returns `true` if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &GroupPath) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Parses the display form (`Eng / (empty)`), the inverse of `Display`
    /// for values that contain neither the separator nor the empty label.
    ///
    /// Each part is trimmed, matching [`GroupValue::of`], which never keeps
    /// surrounding whitespace.
    pub fn parse(s: &str) -> GroupPath {
        GroupPath(
            s.split(PATH_SEPARATOR)
                .map(|part| match part.trim() {
                    EMPTY_GROUP_LABEL => GroupValue::Empty,
                    other => GroupValue::Value(other.to_string()),
                })
                .collect(),
        )
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(PATH_SEPARATOR)?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl<V: Into<GroupValue>> FromIterator<V> for GroupPath {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        GroupPath(iter.into_iter().map(Into::into).collect())
    }
}

/// A synthesized row introducing one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHeader {
    pub path: GroupPath,
    /// Nesting level, 0 for the outermost group field.
    pub level: usize,
    pub group_field: String,
    pub group_value: GroupValue,
    /// Number of records under this header, including hidden ones.
    pub count: usize,
    /// Whether this header's own path is collapsed.
    pub collapsed: bool,
}

/// One row of computed output: a record or a group header.
#[derive(Debug)]
pub enum DisplayRow<'r, T> {
    Record {
        /// Position of the record in the input slice.
        index: usize,
        record: &'r T,
    },
    Header(GroupHeader),
}

impl<'r, T> DisplayRow<'r, T> {
    pub fn is_record(&self) -> bool {
        matches!(self, DisplayRow::Record { .. })
    }

    pub fn is_header(&self) -> bool {
        matches!(self, DisplayRow::Header(_))
    }

    pub fn record(&self) -> Option<&'r T> {
        match self {
            DisplayRow::Record { record, .. } => Some(*record),
            DisplayRow::Header(_) => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            DisplayRow::Record { index, .. } => Some(*index),
            DisplayRow::Header(_) => None,
        }
    }

    pub fn header(&self) -> Option<&GroupHeader> {
        match self {
            DisplayRow::Header(header) => Some(header),
            DisplayRow::Record { .. } => None,
        }
    }
}

impl<T> Clone for DisplayRow<'_, T> {
    fn clone(&self) -> Self {
        match self {
            DisplayRow::Record { index, record } => DisplayRow::Record {
                index: *index,
                record: *record,
            },
            DisplayRow::Header(header) => DisplayRow::Header(header.clone()),
        }
    }
}

/// Records compare by identity: same input position, same borrowed record.
impl<T> PartialEq for DisplayRow<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                DisplayRow::Record { index: a, record: ra },
                DisplayRow::Record { index: b, record: rb },
            ) => a == b && std::ptr::eq(*ra, *rb),
            (DisplayRow::Header(a), DisplayRow::Header(b)) => a == b,
            _ => false,
        }
    }
}

/// Group paths the user has collapsed. Paths not in the set are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapsedSet {
    paths: BTreeSet<GroupPath>,
}

impl CollapsedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the collapse state of `path`. Returns `true` if it is now collapsed.
    pub fn toggle(&mut self, path: &GroupPath) -> bool {
        if self.paths.remove(path) {
            false
        } else {
            self.paths.insert(path.clone());
            true
        }
    }

    pub fn collapse(&mut self, path: GroupPath) {
        self.paths.insert(path);
    }

    pub fn expand(&mut self, path: &GroupPath) {
        self.paths.remove(path);
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn contains(&self, path: &GroupPath) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<GroupPath> for CollapsedSet {
    fn from_iter<I: IntoIterator<Item = GroupPath>>(iter: I) -> Self {
        CollapsedSet {
            paths: iter.into_iter().collect(),
        }
    }
}

/// How grouping relates to the sort specification.
///
/// Groups are only contiguous when records are sorted by the group fields
/// first, in group order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupOrderMode {
    /// The caller orders the sort keys. Misordered keys split groups.
    #[default]
    Unchecked,
    /// Reject sort specifications that do not start with the group fields.
    Strict,
    /// Sort by the group fields first, then by the remaining keys.
    Prepend,
}

impl GroupOrderMode {
    /// The sort keys to apply for `group_fields` under this mode.
    ///
    /// `Prepend` keeps any direction the sort specification gives a group
    /// field and uses ascending otherwise.
    pub fn sort_keys(self, sort: &SortSpec, group_fields: &[String]) -> Result<Vec<SortKey>> {
        match self {
            GroupOrderMode::Unchecked => Ok(sort.keys().to_vec()),
            GroupOrderMode::Strict => {
                for (i, field) in group_fields.iter().enumerate() {
                    let found = sort.keys().get(i).map(|k| k.field.as_str());
                    if found != Some(field.as_str()) {
                        return Err(EngineError::GroupSortMismatch {
                            expected: field.clone(),
                            position: i + 1,
                            found: found.map_or_else(|| "no key".to_string(), |f| format!("'{f}'")),
                        });
                    }
                }
                Ok(sort.keys().to_vec())
            }
            GroupOrderMode::Prepend => {
                let mut keys: Vec<SortKey> = group_fields
                    .iter()
                    .map(|f| SortKey::new(f.clone(), sort.direction_for(f).unwrap_or_default()))
                    .collect();
                keys.extend(
                    sort.keys()
                        .iter()
                        .filter(|k| !group_fields.contains(&k.field))
                        .cloned(),
                );
                Ok(keys)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupOrderMode::Unchecked => "unchecked",
            GroupOrderMode::Strict => "strict",
            GroupOrderMode::Prepend => "prepend",
        }
    }
}

impl fmt::Display for GroupOrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GroupOrderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unchecked" => Ok(GroupOrderMode::Unchecked),
            "strict" => Ok(GroupOrderMode::Strict),
            "prepend" => Ok(GroupOrderMode::Prepend),
            other => Err(format!("unknown group order mode '{other}'")),
        }
    }
}

/// Checks that every group field exists in the schema.
pub fn validate_group_fields(group_fields: &[String], schema: &Schema) -> Result<()> {
    for field in group_fields {
        schema.require(field, FieldContext::Group)?;
    }
    Ok(())
}

struct OpenGroup {
    value: GroupValue,
    /// Position of the emitted header, if it is visible.
    header: Option<usize>,
    collapsed: bool,
}

/// Interleaves group headers with sorted records.
///
/// `sorted` holds indices into `records` in display order. Headers are
/// emitted in a single walk and their counts filled in as records are met.
/// A collapsed header stays in the output; its records and nested headers do
/// not. Without group fields the result is the records alone.
pub fn synthesize<'r, T, F>(
    records: &'r [T],
    sorted: &[usize],
    group_fields: &[String],
    schema: &Schema,
    collapsed: &CollapsedSet,
    accessor: &F,
) -> Vec<DisplayRow<'r, T>>
where
    for<'a> F: Fn(&'a T, &str) -> Value<'a>,
{
    let mut rows: Vec<DisplayRow<'r, T>> = Vec::with_capacity(sorted.len());
    if group_fields.is_empty() {
        rows.extend(sorted.iter().map(|&index| DisplayRow::Record {
            index,
            record: &records[index],
        }));
        return rows;
    }

    let domains: Vec<DataDomain> = group_fields
        .iter()
        .map(|f| schema.domain_of(f).unwrap_or(DataDomain::String))
        .collect();
    let mut open: Vec<OpenGroup> = Vec::with_capacity(group_fields.len());
    let mut seen: HashSet<GroupPath> = HashSet::new();

    for &index in sorted {
        let record = &records[index];
        let values: Vec<GroupValue> = group_fields
            .iter()
            .zip(&domains)
            .map(|(field, domain)| GroupValue::of(&accessor(record, field), *domain))
            .collect();

        let keep = open
            .iter()
            .zip(&values)
            .take_while(|(group, value)| group.value == **value)
            .count();
        open.truncate(keep);

        for level in keep..group_fields.len() {
            let path: GroupPath = open
                .iter()
                .map(|g| g.value.clone())
                .chain(std::iter::once(values[level].clone()))
                .collect();
            if !seen.insert(path.clone()) {
                warn!("group '{path}' appears more than once; records are not sorted by the group fields");
            }
            let hidden = open.iter().any(|g| g.collapsed);
            let is_collapsed = collapsed.contains(&path);
            let header = (!hidden).then(|| {
                rows.push(DisplayRow::Header(GroupHeader {
                    path,
                    level,
                    group_field: group_fields[level].clone(),
                    group_value: values[level].clone(),
                    count: 0,
                    collapsed: is_collapsed,
                }));
                rows.len() - 1
            });
            open.push(OpenGroup {
                value: values[level].clone(),
                header,
                collapsed: is_collapsed,
            });
        }

        for group in &open {
            if let Some(DisplayRow::Header(header)) = group.header.and_then(|pos| rows.get_mut(pos)) {
                header.count += 1;
            }
        }
        if !open.iter().any(|g| g.collapsed) {
            rows.push(DisplayRow::Record { index, record });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    fn accessor<'a>(r: &'a Json, f: &str) -> Value<'a> {
        crate::record::Record::field_value(r, f)
    }

    fn schema() -> Schema {
        Schema::default()
            .field("dept", DataDomain::String)
            .field("team", DataDomain::String)
            .field("hired", DataDomain::Date)
    }

    fn fields(f: &[&str]) -> Vec<String> {
        f.iter().map(|s| s.to_string()).collect()
    }

    fn shape(rows: &[DisplayRow<'_, Json>]) -> Vec<String> {
        rows.iter()
            .map(|row| match row {
                DisplayRow::Record { index, .. } => format!("r{index}"),
                DisplayRow::Header(h) => format!("{}:{}", h.path, h.count),
            })
            .collect()
    }

    #[test]
    fn single_level_groups() {
        let records = vec![
            json!({"dept": "A"}),
            json!({"dept": "A"}),
            json!({"dept": "B"}),
        ];
        let rows = synthesize(
            &records,
            &[0, 1, 2],
            &fields(&["dept"]),
            &schema(),
            &CollapsedSet::new(),
            &accessor,
        );
        assert_eq!(shape(&rows), vec!["A:2", "r0", "r1", "B:1", "r2"]);
    }

    #[test]
    fn nested_groups_and_empty_values() {
        let records = vec![
            json!({"dept": "A", "team": "x"}),
            json!({"dept": "A", "team": null}),
            json!({"dept": null, "team": "x"}),
            json!({"dept": "(empty)", "team": "x"}),
        ];
        let rows = synthesize(
            &records,
            &[0, 1, 2, 3],
            &fields(&["dept", "team"]),
            &schema(),
            &CollapsedSet::new(),
            &accessor,
        );
        assert_eq!(
            shape(&rows),
            vec![
                "A:2",
                "A / x:1",
                "r0",
                "A / (empty):1",
                "r1",
                "(empty):1",
                "(empty) / x:1",
                "r2",
                "(empty):1",
                "(empty) / x:1",
                "r3",
            ]
        );
        let empty = rows[5].header().unwrap();
        let literal = rows[8].header().unwrap();
        assert_eq!(empty.group_value, GroupValue::Empty);
        assert_eq!(literal.group_value, GroupValue::Value("(empty)".into()));
        assert_ne!(empty.path, literal.path);
    }

    #[test]
    fn collapsed_header_keeps_count_and_hides_descendants() {
        let records = vec![
            json!({"dept": "A", "team": "x"}),
            json!({"dept": "A", "team": "y"}),
            json!({"dept": "B", "team": "x"}),
        ];
        let mut collapsed = CollapsedSet::new();
        collapsed.toggle(&GroupPath::from_iter(["A"]));
        let rows = synthesize(
            &records,
            &[0, 1, 2],
            &fields(&["dept", "team"]),
            &schema(),
            &collapsed,
            &accessor,
        );
        assert_eq!(shape(&rows), vec!["A:2", "B:1", "B / x:1", "r2"]);
        assert!(rows[0].header().unwrap().collapsed);
    }

    #[test]
    fn dates_group_by_day() {
        let records = vec![
            json!({"hired": "2024-01-02T08:00:00Z"}),
            json!({"hired": "2024-01-02T17:00:00Z"}),
        ];
        let rows = synthesize(
            &records,
            &[0, 1],
            &fields(&["hired"]),
            &schema(),
            &CollapsedSet::new(),
            &accessor,
        );
        assert_eq!(shape(&rows), vec!["2024-01-02:2", "r0", "r1"]);
    }

    #[test]
    fn group_values_follow_the_sort_key() {
        let s = DataDomain::String;
        assert_eq!(GroupValue::of(&Value::String("  "), s), GroupValue::Empty);
        assert_eq!(GroupValue::of(&Value::String(" x "), s), GroupValue::from("x"));
        assert_eq!(
            GroupValue::of(&Value::String("yes"), DataDomain::Boolean),
            GroupValue::of(&Value::Bool(true), DataDomain::Boolean)
        );
        assert_eq!(
            GroupValue::of(&Value::String("n/a"), DataDomain::Number),
            GroupValue::from("n/a")
        );
        assert_eq!(
            GroupValue::of(&Value::String("5.0"), DataDomain::Currency),
            GroupValue::of(&Value::Number(crate::value::Number::I64(5)), DataDomain::Currency)
        );
        assert_eq!(
            GroupValue::of(&Value::String("2024-01-02 08:00"), DataDomain::Datetime),
            GroupValue::from("2024-01-02T08:00:00Z")
        );
        assert_eq!(
            GroupValue::of(&Value::Collection(vec![]), DataDomain::Collection),
            GroupValue::Empty
        );
    }

    #[test]
    fn collection_labels_do_not_collide() {
        let c = DataDomain::Collection;
        let one = Value::Collection(vec!["a, b".into()]);
        let two = Value::Collection(vec!["a".into(), "b".into()]);
        assert_eq!(GroupValue::of(&two, c), GroupValue::from("a, b"));
        assert_ne!(GroupValue::of(&one, c), GroupValue::of(&two, c));
    }

    #[test]
    fn out_of_range_dates_group_by_their_text() {
        let value = Value::Number(crate::value::Number::I64(i64::MIN));
        assert_eq!(
            GroupValue::of(&value, DataDomain::Date),
            GroupValue::Value(i64::MIN.to_string())
        );
    }

    #[test]
    fn padded_values_are_addressable() {
        let records = vec![json!({"dept": " x "}), json!({"dept": "x"})];
        let collapsed: CollapsedSet = [GroupPath::parse(" x ")].into_iter().collect();
        let rows = synthesize(
            &records,
            &[0, 1],
            &fields(&["dept"]),
            &schema(),
            &collapsed,
            &accessor,
        );
        assert_eq!(shape(&rows), vec!["x:2"]);
    }

    #[test]
    fn no_group_fields_yields_records() {
        let records = vec![json!({}), json!({})];
        let rows = synthesize(&records, &[1, 0], &[], &schema(), &CollapsedSet::new(), &accessor);
        assert_eq!(shape(&rows), vec!["r1", "r0"]);
    }

    #[test]
    fn path_display_and_parse() {
        let path = GroupPath::new(vec!["Eng".into(), GroupValue::Empty]);
        assert_eq!(path.to_string(), "Eng / (empty)");
        assert_eq!(GroupPath::parse("Eng / (empty)"), path);
        assert_eq!(path.parent(), Some(GroupPath::from_iter(["Eng"])));
        assert!(GroupPath::from_iter(["Eng"]).is_prefix_of(&path));
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["Eng",null]"#);
    }

    #[test]
    fn collapsed_set_toggle() {
        let mut set = CollapsedSet::new();
        let path = GroupPath::from_iter(["A"]);
        assert!(set.toggle(&path));
        assert!(set.contains(&path));
        assert!(!set.toggle(&path));
        assert!(set.is_empty());
    }

    #[test]
    fn group_order_modes() {
        let mut sort = SortSpec::new();
        sort.set("name", crate::ordering::Direction::Ascending);
        sort.set("dept", crate::ordering::Direction::Descending);
        let groups = fields(&["dept"]);

        assert_eq!(
            GroupOrderMode::Unchecked.sort_keys(&sort, &groups).unwrap(),
            sort.keys().to_vec()
        );
        assert_eq!(
            GroupOrderMode::Prepend.sort_keys(&sort, &groups).unwrap(),
            vec![SortKey::desc("dept"), SortKey::asc("name")]
        );
        let err = GroupOrderMode::Strict.sort_keys(&sort, &groups).unwrap_err();
        assert_eq!(
            err.to_string(),
            "group field 'dept' must be sort key #1, found 'name'"
        );
        let err = GroupOrderMode::Strict
            .sort_keys(&SortSpec::new(), &groups)
            .unwrap_err();
        assert_eq!(err.to_string(), "group field 'dept' must be sort key #1, found no key");
    }
}
