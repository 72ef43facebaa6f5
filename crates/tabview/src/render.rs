//! Terminal table rendering.
//!
//! [`decide`] picks how a single cell is presented from its value and field
//! domain. [`render_table`] lays out one page of display rows: record rows as
//! aligned columns, group headers as indented full-width lines.

use console::Style;
use tabview_engine::{
    DataDomain, DisplayRow, FieldDescriptor, GroupHeader, PageInfo, Record, Schema, SortSpec,
    Value,
};
use unicode_width::UnicodeWidthStr;

/// Presentation of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellRender {
    Text(String),
    Collection(Vec<String>),
    Checkbox(bool),
    Empty,
}

impl CellRender {
    pub fn display(&self) -> String {
        match self {
            CellRender::Text(s) => s.clone(),
            CellRender::Collection(items) => items.join(", "),
            CellRender::Checkbox(true) => "[x]".to_string(),
            CellRender::Checkbox(false) => "[ ]".to_string(),
            CellRender::Empty => "-".to_string(),
        }
    }
}

/// Decides how to present `value` for a field of `domain`.
///
/// Blank values (absent, whitespace, empty collections) render as empty.
/// Values that do not read as their domain fall back to plain text.
pub fn decide(value: &Value<'_>, domain: DataDomain) -> CellRender {
    if value.is_blank() {
        return CellRender::Empty;
    }
    let text = || CellRender::Text(value.to_text().into_owned());
    match domain {
        DataDomain::Collection => CellRender::Collection(match value.as_collection() {
            Some(items) => items.iter().map(|item| item.to_string()).collect(),
            None => vec![value.to_text().into_owned()],
        }),
        DataDomain::Boolean => value
            .as_bool_lenient()
            .map(CellRender::Checkbox)
            .unwrap_or_else(text),
        DataDomain::Currency => value
            .as_number_lenient()
            .map(|n| CellRender::Text(format_currency(n)))
            .unwrap_or_else(text),
        DataDomain::Date => value
            .as_timestamp_lenient()
            .map(|t| CellRender::Text(t.start_of_day().to_string()))
            .unwrap_or_else(text),
        DataDomain::Datetime => value
            .as_timestamp_lenient()
            .map(|t| CellRender::Text(t.to_string()))
            .unwrap_or_else(text),
        DataDomain::String | DataDomain::Number => text(),
    }
}

/// Two decimals with thousands separators: `1234.5` → `1,234.50`.
fn format_currency(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

/// Truncates a string to fit within a display width, adding an ellipsis.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    // Reserve 1 column for the ellipsis
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    if max_width > 0 {
        result.push('…');
    }
    result
}

fn pad(s: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(s.width()));
    if right_align {
        format!("{fill}{s}")
    } else {
        format!("{s}{fill}")
    }
}

const COLUMN_GAP: &str = "  ";
const MAX_COLUMN_WIDTH: usize = 40;
const MIN_COLUMN_WIDTH: usize = 3;

/// Layout and styling options.
#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    /// Terminal width; `None` disables shrinking.
    pub width: Option<usize>,
    pub color: bool,
}

struct Styles {
    heading: Style,
    group: Style,
    empty: Style,
    footer: Style,
}

impl Styles {
    fn new(color: bool) -> Self {
        Styles {
            heading: Style::new().bold().force_styling(color),
            group: Style::new().cyan().bold().force_styling(color),
            empty: Style::new().dim().force_styling(color),
            footer: Style::new().dim().force_styling(color),
        }
    }
}

/// The descriptors for `visible`, or every schema field when it is empty.
pub fn resolve_columns<'s>(schema: &'s Schema, visible: &[String]) -> Vec<&'s FieldDescriptor> {
    if visible.is_empty() {
        schema.fields().iter().collect()
    } else {
        visible.iter().filter_map(|id| schema.get(id)).collect()
    }
}

/// Renders one page of rows with a heading line and a pager footer.
pub fn render_table<T: Record>(
    rows: &[DisplayRow<'_, T>],
    columns: &[&FieldDescriptor],
    sort: &SortSpec,
    info: &PageInfo,
    options: TableOptions,
) -> String {
    let styles = Styles::new(options.color);
    let indent = rows
        .iter()
        .filter_map(DisplayRow::header)
        .map(|h| (h.level + 1) * 2)
        .max()
        .unwrap_or(0);

    let headings: Vec<String> = columns
        .iter()
        .map(|column| heading(column, sort))
        .collect();
    let cells: Vec<Vec<CellRender>> = rows
        .iter()
        .filter_map(DisplayRow::record)
        .map(|record| {
            columns
                .iter()
                .map(|c| decide(&record.field_value(&c.id), c.data_domain))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headings
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].display().width())
                .chain(std::iter::once(h.width()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();
    if let Some(width) = options.width {
        shrink_to_fit(&mut widths, width.saturating_sub(indent));
    }

    let right_align: Vec<bool> = columns.iter().map(|c| c.data_domain.is_numeric()).collect();
    let mut out = String::new();

    let heading_line: Vec<String> = headings
        .iter()
        .enumerate()
        .map(|(i, h)| pad(&truncate_to_width(h, widths[i]), widths[i], right_align[i]))
        .collect();
    out.push_str(&" ".repeat(indent));
    out.push_str(&styles.heading.apply_to(heading_line.join(COLUMN_GAP)).to_string());
    out.push('\n');

    let mut record_cells = cells.iter();
    for row in rows {
        match row {
            DisplayRow::Header(header) => {
                out.push_str(&styles.group.apply_to(group_line(header, columns)).to_string());
            }
            DisplayRow::Record { .. } => {
                let Some(row_cells) = record_cells.next() else {
                    continue;
                };
                out.push_str(&" ".repeat(indent));
                let line: Vec<String> = row_cells
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let text = pad(
                            &truncate_to_width(&cell.display(), widths[i]),
                            widths[i],
                            right_align[i],
                        );
                        match cell {
                            CellRender::Empty => styles.empty.apply_to(text).to_string(),
                            _ => text,
                        }
                    })
                    .collect();
                out.push_str(line.join(COLUMN_GAP).trim_end());
            }
        }
        out.push('\n');
    }

    out.push_str(&styles.footer.apply_to(footer(info)).to_string());
    out.push('\n');
    out
}

fn heading(column: &FieldDescriptor, sort: &SortSpec) -> String {
    let label = column.label();
    match (sort.direction_for(&column.id), sort.order_for(&column.id)) {
        (Some(direction), Some(order)) => {
            let arrow = if direction.is_descending() { "▼" } else { "▲" };
            if sort.len() > 1 {
                format!("{label} {arrow}{order}")
            } else {
                format!("{label} {arrow}")
            }
        }
        _ => label.to_string(),
    }
}

fn group_line(header: &GroupHeader, columns: &[&FieldDescriptor]) -> String {
    let marker = if header.collapsed { "▸" } else { "▾" };
    let label = columns
        .iter()
        .find(|c| c.id == header.group_field)
        .map(|c| c.label())
        .unwrap_or(header.group_field.as_str());
    format!(
        "{}{marker} {label}: {} ({})",
        " ".repeat(header.level * 2),
        header.group_value,
        header.count
    )
}

fn footer(info: &PageInfo) -> String {
    if info.total_items == 0 {
        return "No matching records".to_string();
    }
    format!(
        "Showing {}–{} of {} · page {}/{}",
        info.first_item, info.last_item, info.total_items, info.page, info.total_pages
    )
}

/// Narrows the widest columns until the row fits in `available` columns.
fn shrink_to_fit(widths: &mut [usize], available: usize) {
    let gaps = COLUMN_GAP.len() * widths.len().saturating_sub(1);
    while widths.iter().sum::<usize>() + gaps > available {
        let Some(widest) = widths
            .iter_mut()
            .filter(|w| **w > MIN_COLUMN_WIDTH)
            .max_by_key(|w| **w)
        else {
            break;
        };
        *widest -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};
    use tabview_engine::{GroupPath, SortKey, ViewEngine};

    const PLAIN: TableOptions = TableOptions {
        width: None,
        color: false,
    };

    #[test]
    fn test_decide() {
        assert_eq!(decide(&Value::None, DataDomain::String), CellRender::Empty);
        assert_eq!(decide(&Value::String("  "), DataDomain::Number), CellRender::Empty);
        assert_eq!(
            decide(&Value::String("yes"), DataDomain::Boolean),
            CellRender::Checkbox(true)
        );
        assert_eq!(
            decide(&Value::String("maybe"), DataDomain::Boolean),
            CellRender::Text("maybe".into())
        );
        assert_eq!(
            decide(&Value::String("solo"), DataDomain::Collection),
            CellRender::Collection(vec!["solo".into()])
        );
        assert_eq!(
            decide(&Value::Collection(vec![]), DataDomain::Collection),
            CellRender::Empty
        );
        assert_eq!(
            decide(&Value::String("2024-03-01T09:30:00Z"), DataDomain::Date),
            CellRender::Text("2024-03-01".into())
        );
        assert_eq!(
            decide(&Value::String("2024-03-01T09:30:00Z"), DataDomain::Datetime),
            CellRender::Text("2024-03-01T09:30:00Z".into())
        );
        assert_eq!(
            decide(&Value::String("n/a"), DataDomain::Currency),
            CellRender::Text("n/a".into())
        );
        assert_eq!(
            decide(&Value::Number(tabview_engine::Number::I64(i64::MIN)), DataDomain::Date),
            CellRender::Text(i64::MIN.to_string())
        );
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1234567.5), "1,234,567.50");
        assert_eq!(format_currency(-42.1), "-42.10");
        assert_eq!(format_currency(-0.001), "0.00");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 8), "hello w…");
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut widths = vec![10, 4, 20];
        shrink_to_fit(&mut widths, 30);
        assert_eq!(widths, vec![10, 4, 12]);

        let mut tiny = vec![5, 5];
        shrink_to_fit(&mut tiny, 2);
        assert_eq!(tiny, vec![3, 3]);
    }

    fn staff() -> Vec<Json> {
        vec![
            json!({"name": "Ada", "dept": "Eng", "salary": 1200.5, "remote": true}),
            json!({"name": "Bob", "dept": "Ops", "salary": 80, "remote": false}),
            json!({"name": "Cy", "dept": "Eng", "salary": 95}),
        ]
    }

    fn schema() -> Schema {
        Schema::default()
            .field("name", DataDomain::String)
            .field("dept", DataDomain::String)
            .field("salary", DataDomain::Currency)
            .field("remote", DataDomain::Boolean)
    }

    #[test]
    fn test_flat_table() {
        let records = staff();
        let mut engine = ViewEngine::from_records(&records, schema()).unwrap();
        engine
            .set_sort_spec(SortSpec::from_keys(vec![SortKey::desc("salary")]).unwrap())
            .unwrap();
        let columns = resolve_columns(engine.schema(), &["name".into(), "salary".into(), "remote".into()]);
        let out = render_table(
            engine.paginated_rows(),
            &columns,
            engine.state().sort(),
            &engine.page_info(),
            PLAIN,
        );
        let expected = "\
name  salary ▼  remote
Ada   1,200.50  [x]
Cy       95.00  -
Bob      80.00  [ ]
Showing 1–3 of 3 · page 1/1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_grouped_table() {
        let records = staff();
        let mut engine = ViewEngine::from_records(&records, schema()).unwrap();
        engine.set_sort("dept", false).unwrap();
        engine.set_sort("name", true).unwrap();
        engine.set_group_fields(vec!["dept".into()]).unwrap();
        engine.toggle_group(&GroupPath::parse("Ops")).unwrap();

        let columns = resolve_columns(engine.schema(), &["name".into()]);
        let out = render_table(
            engine.paginated_rows(),
            &columns,
            engine.state().sort(),
            &engine.page_info(),
            PLAIN,
        );
        let expected = "  name ▲2
▾ dept: Eng (2)
  Ada
  Cy
▸ dept: Ops (1)
Showing 1–2 of 2 · page 1/1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_result() {
        let records: Vec<Json> = vec![];
        let engine = ViewEngine::from_records(&records, schema()).unwrap();
        let columns = resolve_columns(engine.schema(), &[]);
        let out = render_table(
            engine.paginated_rows(),
            &columns,
            engine.state().sort(),
            &engine.page_info(),
            PLAIN,
        );
        assert!(out.ends_with("No matching records\n"));
        assert!(out.starts_with("name  dept  salary  remote"));
    }
}
