//! tabview: filter, sort, group and page tabular data in the terminal.

mod cli;
mod export;
mod load;
mod logging;
mod render;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value as Json;
use tabview_engine::{infer_fields, RecordAccessor, SortSpec, ViewEngine};

use crate::cli::{Cli, FilterArg, Format};
use crate::render::{render_table, resolve_columns, TableOptions};

type JsonEngine<'r> = ViewEngine<'r, Json, RecordAccessor<Json>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init() {
        eprintln!("warning: {err:#}");
    }
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let records = load::load_records(&cli.records)?;
    let schema = match &cli.fields {
        Some(path) => load::load_fields(path)?,
        None => infer_fields(&records),
    };
    tracing::debug!(fields = schema.len(), "schema ready");

    let mut engine = ViewEngine::from_records(&records, schema)?;
    if let Some(path) = &cli.view {
        let config = load::load_view(path)?;
        engine
            .apply_config(&config)
            .with_context(|| format!("view '{}' does not fit these records", config.name))?;
    }
    apply_options(&mut engine, cli)?;

    if let Some(path) = &cli.save_view {
        let id = load::view_id(path);
        load::save_view(path, &engine.snapshot(&id, &id))?;
    }

    let output = match cli.format {
        Format::Table => {
            let columns = resolve_columns(engine.schema(), engine.state().visible_columns());
            let color = !cli.no_color && console::Term::stdout().features().colors_supported();
            let options = TableOptions {
                width: terminal_width(),
                color,
            };
            render_table(
                engine.paginated_rows(),
                &columns,
                engine.state().sort(),
                &engine.page_info(),
                options,
            )
        }
        format => {
            let rows: Vec<&Json> = if cli.all {
                engine.all_filtered_sorted_rows()
            } else {
                engine
                    .paginated_rows()
                    .iter()
                    .filter_map(|row| row.record())
                    .collect()
            };
            let visible = engine.state().visible_columns();
            let columns = if visible.is_empty() && format != Format::Csv {
                Vec::new()
            } else {
                resolve_columns(engine.schema(), visible)
            };
            export::export(&rows, &columns, format)?
        }
    };
    print!("{output}");
    Ok(())
}

/// Applies command-line options on top of the starting view.
///
/// Grouping order is set before sort and grouping so that strict mode checks
/// the final combination; the page is set last because filters reset it.
fn apply_options(engine: &mut JsonEngine<'_>, cli: &Cli) -> Result<()> {
    if let Some(mode) = cli.group_order {
        engine.set_group_order(mode)?;
    }
    if !cli.sort.is_empty() {
        let spec = SortSpec::from_keys(cli.sort.clone())?;
        engine.set_sort_spec(spec)?;
    }
    if !cli.group_by.is_empty() {
        engine.set_group_fields(cli.group_by.clone())?;
    }
    for filter in &cli.filter {
        apply_filter(engine, filter)
            .with_context(|| format!("invalid filter on '{}'", filter.field()))?;
    }
    for path in &cli.collapse {
        engine.set_group_collapsed(path, true)?;
    }
    if !cli.columns.is_empty() {
        engine.set_visible_columns(cli.columns.clone())?;
    }
    if let Some(size) = cli.page_size {
        engine.set_page_size(size)?;
    }
    if let Some(page) = cli.page {
        engine.set_page(page)?;
    }
    Ok(())
}

fn apply_filter(engine: &mut JsonEngine<'_>, filter: &FilterArg) -> Result<()> {
    match filter {
        FilterArg::Text { field, raw } => engine.set_filter_text(field, raw)?,
        FilterArg::Structured {
            field,
            operator,
            value,
            second_value,
        } => engine.set_filter(field, *operator, value, second_value.as_deref(), false)?,
    }
    Ok(())
}

fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(w, _)| w.0 as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabview_engine::{DataDomain, FilterOperator, GroupOrderMode, Record, Schema};

    fn records() -> Vec<Json> {
        vec![
            json!({"name": "Ada", "dept": "Eng", "salary": 120}),
            json!({"name": "Bob", "dept": "Ops", "salary": 80}),
            json!({"name": "Cy", "dept": "Eng", "salary": 95}),
        ]
    }

    fn schema() -> Schema {
        Schema::default()
            .field("name", DataDomain::String)
            .field("dept", DataDomain::String)
            .field("salary", DataDomain::Number)
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["tabview", "data.json"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn names(engine: &JsonEngine<'_>) -> Vec<String> {
        engine
            .all_filtered_sorted_rows()
            .iter()
            .map(|r| r.field_value("name").to_text().into_owned())
            .collect()
    }

    #[test]
    fn test_options_drive_the_engine() {
        let records = records();
        let mut engine = ViewEngine::from_records(&records, schema()).unwrap();
        let cli = cli(&[
            "--group-order",
            "strict",
            "--sort",
            "dept",
            "--sort",
            "salary:desc",
            "--group-by",
            "dept",
            "--filter",
            "salary=>=90",
            "--filter",
            "name:startsWith=a",
            "--page-size",
            "1",
            "--page",
            "1",
        ]);
        apply_options(&mut engine, &cli).unwrap();

        assert_eq!(names(&engine), vec!["Ada"]);
        assert_eq!(engine.state().group_order(), GroupOrderMode::Strict);
        assert_eq!(
            engine.state().filters().get("name").map(|f| f.operator),
            Some(FilterOperator::StartsWith)
        );
        assert_eq!(engine.page_info().page_size, 1);
    }

    #[test]
    fn test_invalid_filter_names_the_field() {
        let records = records();
        let mut engine = ViewEngine::from_records(&records, schema()).unwrap();
        let cli = cli(&["--filter", "salary:contains=9"]);
        let err = apply_options(&mut engine, &cli).unwrap_err();
        assert!(format!("{err:#}").contains("invalid filter on 'salary'"));
    }

    #[test]
    fn test_unknown_group_field_is_an_error() {
        let records = records();
        let mut engine = ViewEngine::from_records(&records, schema()).unwrap();
        let cli = cli(&["--group-by", "team"]);
        let err = apply_options(&mut engine, &cli).unwrap_err();
        assert!(err.to_string().contains("team"));
        assert!(engine.state().group_fields().is_empty());
    }
}
