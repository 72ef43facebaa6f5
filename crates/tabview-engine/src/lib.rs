//! Tabview engine - view computation for in-memory tabular data.
//!
//! The engine turns a slice of caller-owned records plus a declarative view
//! configuration into an ordered, optionally grouped, paginated sequence of
//! display rows. It supports:
//!
//! - Typed fields across string, number, currency, date, datetime, collection
//!   and boolean domains
//! - Per-field filters with domain-aware operators, and a shorthand parser
//!   for numeric input (`>=50`, `20><50`)
//! - Multi-key sorting with a stable tie-break on input order
//! - Nested grouping with per-group collapse state
//! - Pagination that counts records only, keeping group headers for context
//!
//! The engine is pure and synchronous: no I/O, no interior mutability.
//!
//! # Quick Start
//!
//! ```rust
//! use tabview_engine::{DataDomain, DisplayRow, Schema, Value, Number, ViewEngine};
//!
//! struct Employee {
//!     name: String,
//!     dept: String,
//!     salary: u32,
//! }
//!
//! fn accessor<'a>(e: &'a Employee, field: &str) -> Value<'a> {
//!     match field {
//!         "name" => Value::String(&e.name),
//!         "dept" => Value::String(&e.dept),
//!         "salary" => Value::Number(Number::from(e.salary)),
//!         _ => Value::None,
//!     }
//! }
//!
//! let staff = vec![
//!     Employee { name: "Ada".into(), dept: "Eng".into(), salary: 120 },
//!     Employee { name: "Bob".into(), dept: "Ops".into(), salary: 80 },
//!     Employee { name: "Cy".into(), dept: "Eng".into(), salary: 95 },
//! ];
//! let schema = Schema::default()
//!     .field("name", DataDomain::String)
//!     .field("dept", DataDomain::String)
//!     .field("salary", DataDomain::Currency);
//!
//! let mut engine = ViewEngine::new(&staff, schema, accessor).unwrap();
//! engine.set_sort("dept", false).unwrap();
//! engine.set_sort("salary", true).unwrap();
//! engine.set_group_fields(vec!["dept".into()]).unwrap();
//! engine.set_filter_text("salary", ">=90").unwrap();
//!
//! let rows = engine.paginated_rows();
//! assert!(matches!(&rows[0], DisplayRow::Header(h) if h.count == 2));
//! assert_eq!(rows[1].record().map(|e| e.name.as_str()), Some("Cy"));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! records ─ filter ─ sort ─ group ─ paginate ─ paginated_rows
//!                       │
//!                       └─ all_filtered_sorted_rows (export)
//! ```
//!
//! Filters with an empty value are inert, so half-typed input never hides
//! every row. Misconfiguration (an unknown field, an operator outside its
//! field's domain) is reported as an [`EngineError`] naming the field.
//!
//! # Field Domains and Operators
//!
//! | Domain | Operators |
//! |--------|-----------|
//! | string | `contains`, `doesNotContain`, `equals`, `startsWith`, `endsWith` |
//! | number, currency | `eq`, `neq`, `gt`, `lt`, `gte`, `lte`, `between` |
//! | date, datetime | `is`, `isNot`, `isBefore`, `isAfter`, `dateRange` |
//! | collection | `contains`, `doesNotContain`, `containsAny`, `containsAll` |
//! | boolean | `equals` |
//!
//! `isEmpty` applies to every domain.

mod config;
mod engine;
mod error;
mod filter;
mod group;
mod op;
mod ordering;
mod paginate;
mod parser;
mod record;
mod schema;
mod value;

// Re-export public API
pub use config::ViewConfig;
pub use engine::{compute_view, RecordAccessor, View, ViewEngine, ViewState};
pub use error::{EngineError, FieldContext, Result};
pub use filter::{evaluate, FilterSet, FilterSpec};
pub use group::{
    synthesize, validate_group_fields, CollapsedSet, DisplayRow, GroupHeader, GroupOrderMode,
    GroupPath, GroupValue, EMPTY_GROUP_LABEL,
};
pub use op::FilterOperator;
pub use ordering::{compare_field, sort_indices, Direction, SortKey, SortSpec};
pub use paginate::{paginate, PageInfo, PageWindow, DEFAULT_PAGE_SIZE};
pub use parser::{interpret_filter_input, parse_numeric_expression};
pub use record::{infer_fields, json_to_value, Record};
pub use schema::{DataDomain, FieldDescriptor, Schema};
pub use value::{parse_number, parse_timestamp, IntoTimestamp, Number, Timestamp, Value};

// Record derive macro (requires `features = ["derive"]`)
#[cfg(feature = "derive")]
pub use tabview_macros::Record;
