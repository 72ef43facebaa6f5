//! Field access on caller-owned records.
//!
//! The engine never inspects records directly. Every read goes through an
//! accessor of shape `for<'a> Fn(&'a T, &str) -> Value<'a>`. The [`Record`]
//! trait packages such an accessor with the type, and is implemented here for
//! JSON objects so that loosely structured data works out of the box.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value as Json};

use crate::schema::{DataDomain, FieldDescriptor, Schema};
use crate::value::{parse_timestamp, Number, Value};

/// Trait for types the engine can read fields from.
///
/// This trait is typically derived using `#[derive(Record)]` from the
/// `tabview-macros` crate, but can also be implemented manually.
///
/// # Manual Implementation
///
/// ```
/// use tabview_engine::{Record, Value, Number};
///
/// struct Employee {
///     name: String,
///     age: u8,
/// }
///
/// impl Record for Employee {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(&self.name),
///             "age" => Value::Number(Number::U64(self.age as u64)),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value of a field, or [`Value::None`] if the record has no
    /// such field.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns a static accessor function for APIs that take one.
    fn accessor<'a>(record: &'a Self, field: &str) -> Value<'a>
    where
        Self: Sized,
    {
        record.field_value(field)
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }
}

impl Record for Json {
    fn field_value(&self, field: &str) -> Value<'_> {
        match self {
            Json::Object(map) => map.field_value(field),
            _ => Value::None,
        }
    }
}

impl Record for Map<String, Json> {
    fn field_value(&self, field: &str) -> Value<'_> {
        lookup(field, |key| self.get(key))
    }
}

impl Record for HashMap<String, Json> {
    fn field_value(&self, field: &str) -> Value<'_> {
        lookup(field, |key| self.get(key))
    }
}

impl Record for BTreeMap<String, Json> {
    fn field_value(&self, field: &str) -> Value<'_> {
        lookup(field, |key| self.get(key))
    }
}

/// Resolves a possibly dotted field id (`owner.name`) against a JSON object.
///
/// An exact key match wins over path traversal, so keys that contain dots
/// still resolve.
fn lookup<'a>(field: &str, top: impl Fn(&str) -> Option<&'a Json>) -> Value<'a> {
    if let Some(json) = top(field) {
        return json_to_value(json);
    }
    let mut segments = field.split('.');
    let Some(first) = segments.next() else {
        return Value::None;
    };
    let mut current = match top(first) {
        Some(json) => json,
        None => return Value::None,
    };
    for segment in segments {
        current = match current.get(segment) {
            Some(json) => json,
            None => return Value::None,
        };
    }
    json_to_value(current)
}

/// Maps a JSON value onto the engine's runtime value.
pub fn json_to_value(json: &Json) -> Value<'_> {
    match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::I64(i))
            } else if let Some(u) = n.as_u64() {
                Value::Number(Number::U64(u))
            } else {
                n.as_f64()
                    .map(|f| Value::Number(Number::F64(f)))
                    .unwrap_or(Value::None)
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Collection(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Json::String(s) => Cow::Borrowed(s.as_str()),
                    other => Cow::Owned(other.to_string()),
                })
                .collect(),
        ),
        Json::Object(_) => Value::None,
    }
}

/// Builds a schema from JSON records.
///
/// Keys are taken in first-seen order across the records. Each field's
/// domain comes from the first non-null value seen for it: strings that parse
/// as dates become `date` (or `datetime` when they carry a time of day),
/// numbers become `number`, booleans `boolean`, and arrays `collection`.
/// Fields that are null everywhere default to `string`.
pub fn infer_fields(records: &[Json]) -> Schema {
    let mut order: Vec<String> = Vec::new();
    let mut domains: HashMap<String, DataDomain> = HashMap::new();

    for record in records {
        let Json::Object(map) = record else {
            continue;
        };
        for (key, value) in map {
            if !order.contains(key) {
                order.push(key.clone());
            }
            if domains.contains_key(key) {
                continue;
            }
            if let Some(domain) = infer_domain(value) {
                domains.insert(key.clone(), domain);
            }
        }
    }

    order
        .into_iter()
        .map(|key| {
            let domain = domains.get(&key).copied().unwrap_or(DataDomain::String);
            FieldDescriptor::new(key, domain)
        })
        .collect()
}

fn infer_domain(value: &Json) -> Option<DataDomain> {
    match value {
        Json::Null | Json::Object(_) => None,
        Json::Bool(_) => Some(DataDomain::Boolean),
        Json::Number(_) => Some(DataDomain::Number),
        Json::Array(_) => Some(DataDomain::Collection),
        Json::String(s) => match parse_timestamp(s) {
            Some(_) if s.trim().len() <= "YYYY-MM-DD".len() => Some(DataDomain::Date),
            Some(_) => Some(DataDomain::Datetime),
            None => Some(DataDomain::String),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Employee {
        name: String,
        age: i32,
    }

    impl Record for Employee {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "name" => Value::String(&self.name),
                "age" => Value::Number(Number::from(self.age)),
                _ => Value::None,
            }
        }
    }

    #[test]
    fn manual_impl_and_accessor() {
        let e = Employee {
            name: "Ada".to_string(),
            age: 36,
        };
        assert_eq!(e.field_value("name"), Value::String("Ada"));
        assert_eq!(Employee::accessor(&e, "age"), Value::Number(Number::I64(36)));
        assert_eq!(e.field_value("salary"), Value::None);
    }

    #[test]
    fn json_object_fields() {
        let row = json!({
            "name": "Ada",
            "age": 36,
            "ratio": 0.5,
            "active": true,
            "tags": ["x", "y", null, 3],
            "manager": null
        });
        assert_eq!(row.field_value("name"), Value::String("Ada"));
        assert_eq!(row.field_value("age"), Value::Number(Number::I64(36)));
        assert_eq!(row.field_value("ratio"), Value::Number(Number::F64(0.5)));
        assert_eq!(row.field_value("active"), Value::Bool(true));
        assert_eq!(
            row.field_value("tags"),
            Value::Collection(vec![
                Cow::Borrowed("x"),
                Cow::Borrowed("y"),
                Cow::Owned("3".to_string())
            ])
        );
        assert_eq!(row.field_value("manager"), Value::None);
        assert_eq!(row.field_value("missing"), Value::None);
    }

    #[test]
    fn dotted_paths() {
        let row = json!({"owner": {"name": "Lin"}, "a.b": 1});
        assert_eq!(row.field_value("owner.name"), Value::String("Lin"));
        assert_eq!(row.field_value("a.b"), Value::Number(Number::I64(1)));
        assert_eq!(row.field_value("owner.age"), Value::None);
        assert_eq!(row.field_value("owner"), Value::None);
    }

    #[test]
    fn non_object_json_has_no_fields() {
        assert_eq!(json!([1, 2]).field_value("0"), Value::None);
    }

    #[test]
    fn infer_fields_from_first_non_null() {
        let records = vec![
            json!({"name": "a", "hired": null, "score": 1}),
            json!({"name": "b", "hired": "2024-01-02", "tags": [], "at": "2024-01-02T10:00:00Z"}),
            json!({"flag": true, "nothing": null}),
        ];
        let schema = infer_fields(&records);
        let ids: Vec<&str> = schema.ids().collect();
        assert_eq!(ids, vec!["name", "hired", "score", "tags", "at", "flag", "nothing"]);
        assert_eq!(schema.domain_of("name"), Some(DataDomain::String));
        assert_eq!(schema.domain_of("hired"), Some(DataDomain::Date));
        assert_eq!(schema.domain_of("score"), Some(DataDomain::Number));
        assert_eq!(schema.domain_of("tags"), Some(DataDomain::Collection));
        assert_eq!(schema.domain_of("at"), Some(DataDomain::Datetime));
        assert_eq!(schema.domain_of("flag"), Some(DataDomain::Boolean));
        assert_eq!(schema.domain_of("nothing"), Some(DataDomain::String));
    }
}
