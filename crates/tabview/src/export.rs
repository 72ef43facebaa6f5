//! Structured export of records.
//!
//! Exports are flat record lists: group headers never appear. When visible
//! columns are set, each record is projected onto them, in column order.

use serde_json::{Map, Value as Json};
use tabview_engine::{FieldDescriptor, Record};
use thiserror::Error;

use crate::cli::Format;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(String),

    #[error("Not a structured output format")]
    NotStructured,
}

/// Serializes `records` in `format`, keeping only `columns` when given.
pub fn export(
    records: &[&Json],
    columns: &[&FieldDescriptor],
    format: Format,
) -> Result<String, ExportError> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_string_pretty(&project_all(records, columns))?;
            out.push('\n');
            Ok(out)
        }
        Format::Yaml => Ok(serde_yaml::to_string(&project_all(records, columns))?),
        Format::Csv => to_csv(records, columns),
        Format::Table => Err(ExportError::NotStructured),
    }
}

fn project_all(records: &[&Json], columns: &[&FieldDescriptor]) -> Vec<Json> {
    records.iter().map(|r| project(r, columns)).collect()
}

/// Keeps only `columns` of a record. Dotted ids read nested values.
fn project(record: &Json, columns: &[&FieldDescriptor]) -> Json {
    if columns.is_empty() {
        return record.clone();
    }
    let map: Map<String, Json> = columns
        .iter()
        .map(|c| (c.id.clone(), lookup(record, &c.id).cloned().unwrap_or(Json::Null)))
        .collect();
    Json::Object(map)
}

fn lookup<'a>(record: &'a Json, id: &str) -> Option<&'a Json> {
    if let Some(value) = record.get(id) {
        return Some(value);
    }
    id.split('.').try_fold(record, |current, key| current.get(key))
}

/// One row per record, one column per field, with a heading row of ids.
///
/// Cells use the engine's text form, so collections are comma-joined.
fn to_csv(records: &[&Json], columns: &[&FieldDescriptor]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(columns.iter().map(|c| c.id.as_str()))
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| record.field_value(&c.id).to_text().into_owned())
            .collect();
        wtr.write_record(&row)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabview_engine::DataDomain;

    fn records() -> Vec<Json> {
        vec![
            json!({"name": "Ada", "tags": ["rust", "go"], "address": {"city": "Paris"}}),
            json!({"name": "Bob, Jr.", "tags": []}),
        ]
    }

    fn columns() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", DataDomain::String),
            FieldDescriptor::new("address.city", DataDomain::String),
            FieldDescriptor::new("tags", DataDomain::Collection),
        ]
    }

    #[test]
    fn test_json_projection_keeps_column_order() {
        let records = records();
        let refs: Vec<&Json> = records.iter().collect();
        let columns = columns();
        let cols: Vec<&FieldDescriptor> = columns.iter().collect();

        let out = export(&refs, &cols, Format::Json).unwrap();
        let parsed: Json = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"name": "Ada", "address.city": "Paris", "tags": ["rust", "go"]},
                {"name": "Bob, Jr.", "address.city": null, "tags": []}
            ])
        );
        let keys: Vec<&String> = parsed[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "address.city", "tags"]);
    }

    #[test]
    fn test_no_columns_exports_whole_records() {
        let records = records();
        let refs: Vec<&Json> = records.iter().collect();
        let out = export(&refs, &[], Format::Yaml).unwrap();
        let parsed: Json = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed, Json::Array(records));
    }

    #[test]
    fn test_csv() {
        let records = records();
        let refs: Vec<&Json> = records.iter().collect();
        let columns = columns();
        let cols: Vec<&FieldDescriptor> = columns.iter().collect();

        let out = export(&refs, &cols, Format::Csv).unwrap();
        assert_eq!(
            out,
            "name,address.city,tags\nAda,Paris,\"rust, go\"\n\"Bob, Jr.\",,\n"
        );
    }

    #[test]
    fn test_table_is_not_an_export_format() {
        assert!(matches!(
            export(&[], &[], Format::Table),
            Err(ExportError::NotStructured)
        ));
    }
}
