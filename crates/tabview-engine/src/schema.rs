//! Field descriptors: the typed shape of a record set.
//!
//! A [`Schema`] is supplied by the caller alongside the records. It tells the
//! engine which data domain each field belongs to, which in turn decides the
//! filter operators that apply and how values compare when sorting.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, FieldContext, Result};

/// Data domain of a field.
///
/// `Currency` behaves as `Number` and `DateTime` as `Date` for comparison
/// purposes; they exist so that presentation code can format them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataDomain {
    String,
    Number,
    Currency,
    Date,
    #[serde(alias = "dateTime")]
    Datetime,
    Collection,
    Boolean,
}

impl DataDomain {
    /// The domain whose comparison rules this domain follows.
    pub fn comparison_class(self) -> DataDomain {
        match self {
            DataDomain::Currency => DataDomain::Number,
            DataDomain::Datetime => DataDomain::Date,
            other => other,
        }
    }

    /// Returns `true` for number and currency fields.
    pub fn is_numeric(self) -> bool {
        self.comparison_class() == DataDomain::Number
    }

    /// Returns `true` for date and datetime fields.
    pub fn is_temporal(self) -> bool {
        self.comparison_class() == DataDomain::Date
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataDomain::String => "string",
            DataDomain::Number => "number",
            DataDomain::Currency => "currency",
            DataDomain::Date => "date",
            DataDomain::Datetime => "datetime",
            DataDomain::Collection => "collection",
            DataDomain::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for DataDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataDomain {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(DataDomain::String),
            "number" | "numeric" => Ok(DataDomain::Number),
            "currency" => Ok(DataDomain::Currency),
            "date" => Ok(DataDomain::Date),
            "datetime" => Ok(DataDomain::Datetime),
            "collection" | "tags" => Ok(DataDomain::Collection),
            "boolean" | "bool" => Ok(DataDomain::Boolean),
            other => Err(format!("unknown data domain '{other}'")),
        }
    }
}

/// A named, typed slot on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub data_domain: DataDomain,
    /// Column heading for presentation; defaults to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, data_domain: DataDomain) -> Self {
        FieldDescriptor {
            id: id.into(),
            data_domain,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Ordered list of field descriptors for one record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Schema { fields }
    }

    /// Adds a field, replacing any existing descriptor with the same id.
    pub fn field(mut self, id: impl Into<String>, data_domain: DataDomain) -> Self {
        let descriptor = FieldDescriptor::new(id, data_domain);
        match self.fields.iter_mut().find(|f| f.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn domain_of(&self, id: &str) -> Option<DataDomain> {
        self.get(id).map(|f| f.data_domain)
    }

    /// Looks up a field, failing with an error that names it.
    pub fn require(&self, id: &str, context: FieldContext) -> Result<&FieldDescriptor> {
        self.get(id)
            .ok_or_else(|| EngineError::unknown(id, context))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<FieldDescriptor> for Schema {
    fn from_iter<I: IntoIterator<Item = FieldDescriptor>>(iter: I) -> Self {
        Schema::new(iter.into_iter().collect())
    }
}
