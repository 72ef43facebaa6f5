//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tabview_engine::{Direction, FilterOperator, GroupOrderMode, GroupPath, SortKey};

/// Filter, sort, group and page tabular data in the terminal.
///
/// Records are read from a JSON array, a JSON object with a `records` array,
/// JSON Lines (`.jsonl`), or YAML. Field types are inferred from the data
/// unless a descriptor file is given with `--fields`.
#[derive(Debug, Parser)]
#[command(name = "tabview")]
#[command(version)]
#[command(after_help = "Filter shorthand for number fields: `>=50`, `<10`, `!=3`, `20><50`, `20..50`.\n\
    Set TABVIEW_LOG=debug to see what the engine does.")]
pub struct Cli {
    /// Records file, or `-` for stdin (read as JSON)
    pub records: PathBuf,

    /// Field descriptors (JSON or YAML list of {id, dataDomain, label})
    #[arg(long, value_name = "PATH")]
    pub fields: Option<PathBuf>,

    /// Saved view to start from (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub view: Option<PathBuf>,

    /// Sort key, repeatable; the first is the primary key
    #[arg(short, long, value_name = "FIELD[:asc|desc]", value_parser = parse_sort_key)]
    pub sort: Vec<SortKey>,

    /// Filter, repeatable: `FIELD=TEXT` or `FIELD:OPERATOR=VALUE[..SECOND]`
    #[arg(short, long, value_name = "FILTER", value_parser = parse_filter)]
    pub filter: Vec<FilterArg>,

    /// Group by these fields, outermost first
    #[arg(short, long, value_name = "FIELD", value_delimiter = ',')]
    pub group_by: Vec<String>,

    /// How grouping relates to sorting: unchecked, strict or prepend
    #[arg(long, value_name = "MODE", value_parser = parse_group_order)]
    pub group_order: Option<GroupOrderMode>,

    /// Collapse a group, repeatable (`Eng`, `Eng / Backend`, `(empty)`)
    #[arg(long, value_name = "PATH", value_parser = parse_group_path)]
    pub collapse: Vec<GroupPath>,

    /// Page to show, starting at 1
    #[arg(short, long)]
    pub page: Option<usize>,

    /// Records per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Columns to show, in order
    #[arg(short, long, value_name = "FIELD", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Output every matching record instead of one page (json, yaml, csv)
    #[arg(long)]
    pub all: bool,

    /// Write the resulting view configuration to this file
    #[arg(long, value_name = "PATH")]
    pub save_view: Option<PathBuf>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Yaml,
    Csv,
}

/// A `--filter` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg {
    /// Raw text, interpreted like typed filter input.
    Text { field: String, raw: String },
    /// An explicit operator with its operands.
    Structured {
        field: String,
        operator: FilterOperator,
        value: String,
        second_value: Option<String>,
    },
}

impl FilterArg {
    pub fn field(&self) -> &str {
        match self {
            FilterArg::Text { field, .. } | FilterArg::Structured { field, .. } => field,
        }
    }
}

/// Parses `FIELD`, `FIELD:asc` or `FIELD:desc`.
pub fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    let (field, direction) = match s.rsplit_once(':') {
        Some((field, dir)) => (field, dir.parse::<Direction>()?),
        None => (s, Direction::Ascending),
    };
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok(SortKey::new(field, direction))
}

/// Parses `FIELD=TEXT` or `FIELD:OPERATOR=VALUE[..SECOND]`.
///
/// The second operand is only split off for range operators, so values of
/// other operators may contain `..`.
pub fn parse_filter(s: &str) -> Result<FilterArg, String> {
    let (lhs, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;

    let (field, operator) = match lhs.split_once(':') {
        Some((field, op)) => (field.trim(), Some(op.trim().parse::<FilterOperator>()?)),
        None => (lhs.trim(), None),
    };
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }

    Ok(match operator {
        None => FilterArg::Text {
            field: field.to_string(),
            raw: value.to_string(),
        },
        Some(operator) => {
            let (value, second_value) = match value.split_once("..") {
                Some((low, high)) if operator.is_range() => {
                    (low.to_string(), Some(high.to_string()))
                }
                _ => (value.to_string(), None),
            };
            FilterArg::Structured {
                field: field.to_string(),
                operator,
                value,
                second_value,
            }
        }
    })
}

fn parse_group_order(s: &str) -> Result<GroupOrderMode, String> {
    s.parse()
}

fn parse_group_path(s: &str) -> Result<GroupPath, String> {
    if s.trim().is_empty() {
        return Err("group path cannot be empty".to_string());
    }
    Ok(GroupPath::parse(s))
}
