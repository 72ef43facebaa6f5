//! Runtime value types for field comparison.
//!
//! The [`Value`] enum represents the runtime value of a field extracted from a
//! record. Values are loosely typed on purpose: records often come from JSON
//! where a date is a string and a price may be a quoted number. The lenient
//! coercions at the bottom of [`Value`] interpret a value in the light of the
//! field's [`DataDomain`](crate::DataDomain) at evaluation time.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Runtime value of a field, borrowed from the source record where possible.
///
/// # Example
///
/// ```
/// use tabview_engine::{Value, Number};
///
/// struct Employee {
///     name: String,
///     salary: u32,
/// }
///
/// fn accessor<'a>(e: &'a Employee, field: &str) -> Value<'a> {
///     match field {
///         "name" => Value::String(&e.name),
///         "salary" => Value::Number(Number::U64(e.salary as u64)),
///         _ => Value::None,
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Point in time (milliseconds since Unix epoch, UTC).
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Multi-value cell: an ordered set of strings.
    Collection(Vec<Cow<'a, str>>),
    /// Field not present, null, or unsupported.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the collection items, if present.
    pub fn as_collection(&self) -> Option<&[Cow<'a, str>]> {
        match self {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for null, missing, the empty string and the empty collection.
    ///
    /// Whitespace-only strings count as empty as well.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::None => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Collection(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Interprets the value as a number.
    ///
    /// Numeric strings are accepted, including ones with thousands separators
    /// or a leading currency symbol. NaN is treated as "not a number".
    pub fn as_number_lenient(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => n.to_f64(),
            Value::String(s) => parse_number(s)?,
            _ => return None,
        };
        if n.is_nan() {
            None
        } else {
            Some(n)
        }
    }

    /// Interprets the value as a point in time.
    ///
    /// Strings are parsed with [`parse_timestamp`]; bare numbers are taken as
    /// milliseconds since the Unix epoch. Instants outside the calendar range
    /// (see [`Timestamp::to_datetime`]) are not readable.
    pub fn as_timestamp_lenient(&self) -> Option<Timestamp> {
        let t = match self {
            Value::Timestamp(t) => *t,
            Value::String(s) => parse_timestamp(s)?,
            Value::Number(Number::I64(n)) => Timestamp(*n),
            Value::Number(Number::U64(n)) => Timestamp(i64::try_from(*n).ok()?),
            _ => return None,
        };
        t.to_datetime().map(|_| t)
    }

    /// Interprets the value as a boolean (`true`/`false`, `yes`/`no`, `1`/`0`).
    pub fn as_bool_lenient(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            Value::Number(n) => match n.to_f64() {
                x if x == 1.0 => Some(true),
                x if x == 0.0 => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Display form of the value. Collections are joined with `", "`.
    pub fn to_text(&self) -> Cow<'a, str> {
        match self {
            Value::String(s) => Cow::Borrowed(*s),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Timestamp(t) => Cow::Owned(t.to_string()),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Collection(items) => Cow::Owned(items.join(", ")),
            Value::None => Cow::Borrowed(""),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Comparisons between different numeric types are handled by converting
/// to the appropriate common type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),

            // Mixed type comparisons - convert to f64
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($variant:ident, $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )+
    };
}

number_from!(I64, i64: i8, i16, i32, i64, isize);
number_from!(U64, u64: u8, u16, u32, u64, usize);
number_from!(F64, f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch (UTC).
///
/// ```
/// use tabview_engine::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(86_400).day(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1000))
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    pub fn as_secs(self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Whole days since the Unix epoch (UTC calendar day).
    pub fn day(self) -> i64 {
        self.0.div_euclid(MILLIS_PER_DAY)
    }

    /// Midnight UTC of the same day.
    pub fn start_of_day(self) -> Self {
        Timestamp(self.day().saturating_mul(MILLIS_PER_DAY))
    }

    /// The UTC date-time, or `None` outside chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) if self.0.rem_euclid(MILLIS_PER_DAY) == 0 => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Conversion into a [`Timestamp`], used by `#[derive(Record)]` for
/// date and datetime fields.
pub trait IntoTimestamp {
    fn to_timestamp(&self) -> Timestamp;
}

impl IntoTimestamp for i64 {
    fn to_timestamp(&self) -> Timestamp {
        Timestamp(*self)
    }
}

impl IntoTimestamp for Timestamp {
    fn to_timestamp(&self) -> Timestamp {
        *self
    }
}

impl IntoTimestamp for NaiveDate {
    fn to_timestamp(&self) -> Timestamp {
        self.and_time(NaiveTime::MIN).to_timestamp()
    }
}

impl IntoTimestamp for NaiveDateTime {
    fn to_timestamp(&self) -> Timestamp {
        Timestamp(self.and_utc().timestamp_millis())
    }
}

impl IntoTimestamp for DateTime<Utc> {
    fn to_timestamp(&self) -> Timestamp {
        Timestamp(self.timestamp_millis())
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses the date and datetime spellings the engine accepts.
///
/// Accepted: RFC 3339 (`2024-03-01T09:30:00Z`, with any offset),
/// `YYYY-MM-DD` (midnight UTC), and `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` read as UTC.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Timestamp(dt.timestamp_millis()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.to_timestamp());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.to_timestamp())
}

/// Parses a number, tolerating surrounding whitespace, thousands separators
/// and a leading currency symbol.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }
    let cleaned: String = s
        .trim_start_matches(['$', '€', '£', '¥'])
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
