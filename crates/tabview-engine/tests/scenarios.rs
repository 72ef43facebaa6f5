//! End-to-end scenarios through the public API.

use serde_json::{json, Value as Json};
use tabview_engine::{
    compute_view, interpret_filter_input, DataDomain, DisplayRow, Direction, FilterOperator,
    FilterSpec, GroupOrderMode, GroupPath, Record, Schema, SortKey, SortSpec, ViewConfig,
    ViewEngine, ViewState,
};

// ============================================================================
// Helpers
// ============================================================================

fn shape(rows: &[DisplayRow<'_, Json>]) -> Vec<String> {
    rows.iter()
        .map(|row| match row {
            DisplayRow::Record { index, .. } => format!("r{index}"),
            DisplayRow::Header(h) => format!("[{}:{}]", h.path, h.count),
        })
        .collect()
}

fn staff() -> Vec<Json> {
    vec![
        json!({"name": "Ada", "dept": "Eng", "salary": 120, "tags": ["rust", "go"], "hired": "2019-04-01", "remote": true}),
        json!({"name": "Bob", "dept": "Ops", "salary": 80, "tags": [], "hired": "2021-07-15", "remote": false}),
        json!({"name": "Cy", "dept": "Eng", "salary": 95, "tags": ["python"], "hired": "2020-01-10", "remote": true}),
        json!({"name": "Di", "dept": "Ops", "salary": 105, "hired": "2018-11-30", "remote": false}),
        json!({"name": "Émile", "dept": null, "salary": "n/a", "tags": ["rust"], "hired": null, "remote": null}),
    ]
}

fn staff_schema() -> Schema {
    Schema::default()
        .field("name", DataDomain::String)
        .field("dept", DataDomain::String)
        .field("salary", DataDomain::Currency)
        .field("tags", DataDomain::Collection)
        .field("hired", DataDomain::Date)
        .field("remote", DataDomain::Boolean)
}

fn names(rows: &[&Json]) -> Vec<String> {
    rows.iter()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_range_shorthand() {
    let records = vec![json!({"n": 5}), json!({"n": 50}), json!({"n": 100})];
    let schema = Schema::default().field("n", DataDomain::Number);

    let spec = interpret_filter_input("20><50", DataDomain::Number, FilterOperator::Eq);
    assert_eq!(spec, FilterSpec::range(FilterOperator::Between, "20", "50"));

    let mut engine = ViewEngine::from_records(&records, schema).unwrap();
    engine.set_filter_text("n", "20><50").unwrap();
    assert_eq!(engine.all_filtered_sorted_rows(), vec![&records[1]]);
}

#[test]
fn scenario_b_group_after_sort() {
    let records = vec![json!({"dept": "A"}), json!({"dept": "B"}), json!({"dept": "A"})];
    let schema = Schema::default().field("dept", DataDomain::String);

    let mut engine = ViewEngine::from_records(&records, schema).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();

    assert_eq!(
        shape(engine.paginated_rows()),
        vec!["[A:2]", "r0", "r2", "[B:1]", "r1"]
    );
}

#[test]
fn scenario_c_headers_excluded_from_page_size() {
    let records: Vec<Json> = ["A", "A", "B", "B", "B"]
        .iter()
        .map(|d| json!({"dept": d}))
        .collect();
    let schema = Schema::default().field("dept", DataDomain::String);

    let mut engine = ViewEngine::from_records(&records, schema).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    engine.set_page_size(2).unwrap();

    assert_eq!(shape(engine.paginated_rows()), vec!["[A:2]", "r0", "r1"]);
    let info = engine.page_info();
    assert_eq!(info.total_items, 5);
    assert_eq!(info.total_pages, 3);

    engine.set_page(2).unwrap();
    assert_eq!(shape(engine.paginated_rows()), vec!["[B:3]", "r2", "r3"]);
    engine.set_page(3).unwrap();
    assert_eq!(shape(engine.paginated_rows()), vec!["[B:3]", "r4"]);
}

#[test]
fn scenario_d_is_empty_on_collections_ignores_value() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine
        .set_filter("tags", FilterOperator::IsEmpty, "rust", None, false)
        .unwrap();
    assert_eq!(names(&engine.all_filtered_sorted_rows()), vec!["Bob", "Di"]);
}

#[test]
fn scenario_e_bare_operator_is_literal() {
    let spec = interpret_filter_input(">", DataDomain::Number, FilterOperator::Eq);
    assert_eq!(spec.operator, FilterOperator::Eq);
    assert_eq!(spec.value, ">");

    // As a literal numeric filter it matches nothing, but it is not an error.
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_filter_text("salary", ">").unwrap();
    assert_eq!(engine.view().filtered_count(), 0);
    engine.set_filter_text("salary", ">100").unwrap();
    assert_eq!(names(&engine.all_filtered_sorted_rows()), vec!["Ada", "Di"]);
}

// ============================================================================
// Domain behaviour through the engine
// ============================================================================

#[test]
fn partially_typed_filters_do_not_hide_rows() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine
        .set_filter("salary", FilterOperator::Between, "", Some(""), false)
        .unwrap();
    engine
        .set_filter("name", FilterOperator::Contains, "", None, false)
        .unwrap();
    assert_eq!(engine.view().filtered_count(), records.len());
    assert!(engine.active_filters().is_empty());
}

#[test]
fn filters_combine_with_and() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine
        .set_filter("remote", FilterOperator::Equals, "true", None, false)
        .unwrap();
    engine
        .set_filter("tags", FilterOperator::ContainsAny, "go, python", None, false)
        .unwrap();
    engine
        .set_filter("hired", FilterOperator::IsAfter, "2019-12-31", None, false)
        .unwrap();
    assert_eq!(names(&engine.all_filtered_sorted_rows()), vec!["Cy"]);
}

#[test]
fn unreadable_values_sort_as_greatest() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("salary", false).unwrap();
    assert_eq!(
        names(&engine.all_filtered_sorted_rows()),
        vec!["Bob", "Cy", "Di", "Ada", "Émile"]
    );
    // Descending negates the comparison, so the unreadable value comes first.
    engine.set_sort("salary", false).unwrap();
    assert_eq!(
        names(&engine.all_filtered_sorted_rows()),
        vec!["Émile", "Ada", "Di", "Cy", "Bob"]
    );
}

#[test]
fn accented_names_collate_with_their_base_letters() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("name", false).unwrap();
    assert_eq!(
        names(&engine.all_filtered_sorted_rows()),
        vec!["Ada", "Bob", "Cy", "Di", "Émile"]
    );
}

#[test]
fn null_group_values_form_their_own_group() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_sort("name", true).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[Eng:2]", "r0", "r2", "[Ops:2]", "r1", "r3", "[(empty):1]", "r4"]
    );
}

#[test]
fn blank_and_unreadable_values_each_form_one_group() {
    let records = vec![
        json!({"dept": null, "n": null}),
        json!({"dept": "", "n": "n/a"}),
        json!({"dept": "x", "n": null}),
        json!({"dept": "  ", "n": " n/a"}),
        json!({"dept": " x", "n": 5}),
    ];
    let schema = Schema::default()
        .field("dept", DataDomain::String)
        .field("n", DataDomain::Number);
    let mut engine = ViewEngine::from_records(&records, schema).unwrap();
    engine.set_group_order(GroupOrderMode::Prepend).unwrap();

    engine.set_group_fields(vec!["dept".into()]).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[x:2]", "r2", "r4", "[(empty):3]", "r0", "r1", "r3"]
    );

    engine.set_group_fields(vec!["n".into()]).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[5:1]", "r4", "[n/a:2]", "r1", "r3", "[(empty):2]", "r0", "r2"]
    );

    engine.toggle_group(&GroupPath::parse("(empty)")).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[5:1]", "r4", "[n/a:2]", "r1", "r3", "[(empty):2]"]
    );
}

#[test]
fn out_of_range_dates_group_without_overflow() {
    let records = vec![json!({"d": i64::MIN}), json!({"d": "2024-01-01"})];
    let schema = Schema::default().field("d", DataDomain::Date);
    let mut engine = ViewEngine::from_records(&records, schema).unwrap();
    engine.set_group_order(GroupOrderMode::Prepend).unwrap();
    engine.set_group_fields(vec!["d".into()]).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[2024-01-01:1]", "r1", "[-9223372036854775808:1]", "r0"]
    );
}

#[test]
fn collapse_changes_only_descendant_visibility() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    let sorted_before = engine.view().sorted_indices.clone();

    engine.toggle_group(&GroupPath::parse("Eng")).unwrap();
    assert_eq!(
        shape(engine.display_rows()),
        vec!["[Eng:2]", "[Ops:2]", "r1", "r3", "[(empty):1]", "r4"]
    );
    assert_eq!(engine.view().sorted_indices, sorted_before);

    engine.toggle_group(&GroupPath::parse("Eng")).unwrap();
    assert_eq!(engine.display_rows().len(), 8);
}

#[test]
fn collapsed_records_leave_the_page_sequence() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    engine.set_page_size(2).unwrap();
    assert_eq!(engine.page_info().total_items, 5);
    assert_eq!(shape(engine.paginated_rows()), vec!["[Eng:2]", "r0", "r2"]);

    engine.toggle_group(&GroupPath::parse("Eng")).unwrap();
    assert_eq!(engine.page_info().total_items, 3);
    assert_eq!(engine.page_info().total_pages, 2);
    assert_eq!(
        shape(engine.paginated_rows()),
        vec!["[Eng:2]", "[Ops:2]", "r1", "r3"]
    );
}

#[test]
fn misordered_sort_splits_groups_when_unchecked() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("name", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    // Ada(Eng) Bob(Ops) Cy(Eng) Di(Ops) Émile(empty): groups are not contiguous.
    let headers = engine
        .display_rows()
        .iter()
        .filter(|r| r.is_header())
        .count();
    assert_eq!(headers, 5);
}

#[test]
fn compute_view_is_a_pure_function_of_its_inputs() {
    let records = staff();
    let schema = staff_schema();
    let state = ViewState::new()
        .with_sort_spec(
            SortSpec::from_keys(vec![SortKey::desc("hired"), SortKey::asc("name")]).unwrap(),
            &schema,
        )
        .unwrap();
    let first = compute_view(&records, &schema, &state, &Json::accessor).unwrap();
    let second = compute_view(&records, &schema, &state, &Json::accessor).unwrap();
    assert_eq!(first.paginated_rows, second.paginated_rows);
    assert_eq!(
        names(&first.all_filtered_sorted_rows),
        vec!["Émile", "Bob", "Cy", "Ada", "Di"]
    );
}

#[test]
fn saved_view_restores_the_same_rows() {
    let records = staff();
    let mut engine = ViewEngine::from_records(&records, staff_schema()).unwrap();
    engine.set_sort("dept", false).unwrap();
    engine.set_group_fields(vec!["dept".into()]).unwrap();
    engine.set_filter_text("salary", ">=90").unwrap();
    engine.toggle_group(&GroupPath::parse("Ops")).unwrap();

    let yaml = serde_yaml::to_string(&engine.snapshot("v", "Saved")).unwrap();
    let config: ViewConfig = serde_yaml::from_str(&yaml).unwrap();

    let mut other = ViewEngine::from_records(&records, staff_schema()).unwrap();
    other.apply_config(&config).unwrap();
    assert_eq!(other.paginated_rows(), engine.paginated_rows());
    assert_eq!(other.sort_direction_for("dept"), Some(Direction::Ascending));
}
