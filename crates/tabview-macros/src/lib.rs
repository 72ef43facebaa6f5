//! Proc macros for tabview.
//!
//! - [`Record`] - Generate a `Record` implementation, field id constants and
//!   a `Schema` from struct field annotations

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for structs shown in a view.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `String` | Text field, read as `&str` |
/// | `Number` | Numeric field, any primitive number type |
/// | `Currency` | Numeric field formatted as money |
/// | `Date` | Date field, any type implementing `IntoTimestamp` |
/// | `DateTime` | Date and time field, any type implementing `IntoTimestamp` |
/// | `Collection` | Iterable of items implementing `AsRef<str>` |
/// | `Bool` | Boolean field |
/// | `skip` | Exclude the field |
/// | `rename = "..."` | Field id used by views (default: the field name) |
/// | `label = "..."` | Column heading stored in the schema |
/// | `domain = "..."` | The domain as a string, e.g. `domain = "bool"` |
///
/// Fields without a `#[field(...)]` attribute are not part of the record.
///
/// # Generated Code
///
/// 1. Field id constants (e.g., `Employee::NAME`, `Employee::HIRED_ON`)
/// 2. `Employee::schema()` returning the annotated fields in declaration order
/// 3. Implementation of `Record::field_value()`
///
/// # Example
///
/// ```ignore
/// use tabview_engine::ViewEngine;
/// use tabview_macros::Record;
///
/// #[derive(Record)]
/// struct Employee {
///     #[field(String)]
///     name: String,
///
///     #[field(Currency, label = "Salary")]
///     salary: u32,
///
///     #[field(Collection)]
///     skills: Vec<String>,
///
///     #[field(skip)]
///     internal_id: u64,
/// }
///
/// let staff = vec![
///     Employee { name: "Ada".into(), salary: 120, skills: vec!["rust".into()], internal_id: 1 },
///     Employee { name: "Bob".into(), salary: 80, skills: vec![], internal_id: 2 },
/// ];
///
/// let mut engine = ViewEngine::from_records(&staff, Employee::schema()).unwrap();
/// engine.set_filter_text(Employee::SALARY, ">100").unwrap();
/// assert_eq!(engine.all_filtered_sorted_rows().len(), 1);
/// ```
#[proc_macro_derive(Record, attributes(field))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
