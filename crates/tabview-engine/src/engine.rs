//! The view engine: filter → sort → group → paginate.
//!
//! [`ViewState`] is the engine-owned configuration. It is an ordinary value:
//! every change is a functional update that validates against the
//! [`Schema`] and returns a new state, leaving the old one untouched.
//!
//! [`compute_view`] runs the whole pipeline for one state over one record
//! slice. [`ViewEngine`] wraps the two for callers that prefer an imperative
//! API: each mutator recomputes eagerly and keeps the latest [`View`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tabview_engine::{DataDomain, FilterOperator, Schema, ViewEngine};
//!
//! let records = vec![json!({"n": 5}), json!({"n": 50}), json!({"n": 100})];
//! let schema = Schema::default().field("n", DataDomain::Number);
//!
//! let mut engine = ViewEngine::from_records(&records, schema).unwrap();
//! engine.set_filter_text("n", "20><50").unwrap();
//! assert_eq!(engine.all_filtered_sorted_rows(), vec![&records[1]]);
//! ```

use log::debug;

use crate::config::ViewConfig;
use crate::error::{FieldContext, Result};
use crate::filter::{validate_filter, FilterSet, FilterSpec};
use crate::group::{
    synthesize, validate_group_fields, CollapsedSet, DisplayRow, GroupOrderMode, GroupPath,
};
use crate::op::FilterOperator;
use crate::ordering::{sort_indices, Direction, SortSpec};
use crate::paginate::{paginate, PageInfo, PageWindow};
use crate::parser::interpret_filter_input;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

/// Accessor type used when records implement [`Record`].
pub type RecordAccessor<T> = for<'a> fn(&'a T, &str) -> Value<'a>;

/// Engine-owned view configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    sort: SortSpec,
    filters: FilterSet,
    group_fields: Vec<String>,
    collapsed: CollapsedSet,
    page: PageWindow,
    group_order: GroupOrderMode,
    visible_columns: Vec<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn group_fields(&self) -> &[String] {
        &self.group_fields
    }

    pub fn collapsed(&self) -> &CollapsedSet {
        &self.collapsed
    }

    pub fn page(&self) -> PageWindow {
        self.page
    }

    pub fn group_order(&self) -> GroupOrderMode {
        self.group_order
    }

    /// Columns to present, in order. Empty means every schema field.
    pub fn visible_columns(&self) -> &[String] {
        &self.visible_columns
    }

    /// Checks every part of the state against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        self.sort.validate(schema)?;
        self.filters.validate(schema)?;
        validate_group_fields(&self.group_fields, schema)?;
        for column in &self.visible_columns {
            schema.require(column, FieldContext::Column)?;
        }
        self.group_order.sort_keys(&self.sort, &self.group_fields)?;
        Ok(())
    }

    fn checked(self, schema: &Schema) -> Result<Self> {
        self.validate(schema)?;
        Ok(self)
    }

    /// Applies a column-header click (see [`SortSpec::apply_click`]).
    pub fn with_sort(&self, field: &str, additive: bool, schema: &Schema) -> Result<Self> {
        schema.require(field, FieldContext::Sort)?;
        let mut next = self.clone();
        next.sort.apply_click(field, additive);
        next.checked(schema)
    }

    /// Replaces the whole sort specification.
    pub fn with_sort_spec(&self, sort: SortSpec, schema: &Schema) -> Result<Self> {
        let mut next = self.clone();
        next.sort = sort;
        next.checked(schema)
    }

    /// Sets or, with `None`, removes the filter on `field`. Returns to page 1.
    pub fn with_filter(&self, field: &str, spec: Option<FilterSpec>, schema: &Schema) -> Result<Self> {
        let mut next = self.clone();
        match spec {
            Some(spec) => {
                validate_filter(schema, field, spec.operator)?;
                next.filters.insert(field, spec);
            }
            None => {
                schema.require(field, FieldContext::Filter)?;
                next.filters.remove(field);
            }
        }
        next.page = next.page.with_index(1);
        Ok(next)
    }

    /// Removes every filter. Returns to page 1.
    pub fn without_filters(&self) -> Self {
        let mut next = self.clone();
        next.filters.clear();
        next.page = next.page.with_index(1);
        next
    }

    /// Sets the group fields. Collapse state is reset when they change.
    pub fn with_group_fields(&self, fields: Vec<String>, schema: &Schema) -> Result<Self> {
        let mut next = self.clone();
        if next.group_fields != fields {
            next.collapsed.clear();
        }
        next.group_fields = fields;
        next.checked(schema)
    }

    pub fn with_group_order(&self, mode: GroupOrderMode, schema: &Schema) -> Result<Self> {
        let mut next = self.clone();
        next.group_order = mode;
        next.checked(schema)
    }

    /// Flips one group's collapse state. Nothing else changes.
    pub fn with_group_toggled(&self, path: &GroupPath) -> Self {
        let mut next = self.clone();
        next.collapsed.toggle(path);
        next
    }

    /// Sets one group's collapse state explicitly.
    pub fn with_group_collapsed(&self, path: &GroupPath, collapsed: bool) -> Self {
        let mut next = self.clone();
        if collapsed {
            next.collapsed.collapse(path.clone());
        } else {
            next.collapsed.expand(path);
        }
        next
    }

    pub fn with_collapsed(&self, collapsed: CollapsedSet) -> Self {
        let mut next = self.clone();
        next.collapsed = collapsed;
        next
    }

    pub fn with_all_groups_expanded(&self) -> Self {
        self.with_collapsed(CollapsedSet::new())
    }

    /// Moves to page `page`. The page is clamped when the view is computed.
    pub fn with_page(&self, page: usize) -> Self {
        let mut next = self.clone();
        next.page = next.page.with_index(page);
        next
    }

    pub fn with_page_size(&self, size: usize) -> Result<Self> {
        let mut next = self.clone();
        next.page = next.page.with_size(size)?;
        Ok(next)
    }

    pub fn with_visible_columns(&self, columns: Vec<String>, schema: &Schema) -> Result<Self> {
        let mut next = self.clone();
        next.visible_columns = columns;
        next.checked(schema)
    }
}

/// Output of one pipeline run.
#[derive(Debug)]
pub struct View<'r, T> {
    /// Rows of the current page, headers included.
    pub paginated_rows: Vec<DisplayRow<'r, T>>,
    /// Every record that passed the filters, in sort order. No headers.
    pub all_filtered_sorted_rows: Vec<&'r T>,
    /// Input positions of `all_filtered_sorted_rows`.
    pub sorted_indices: Vec<usize>,
    /// Grouped rows before paging, with collapsed groups folded away.
    pub display_rows: Vec<DisplayRow<'r, T>>,
    pub page_info: PageInfo,
}

impl<T> View<'_, T> {
    pub fn filtered_count(&self) -> usize {
        self.sorted_indices.len()
    }
}

/// Runs filter → sort → group → paginate over `records`.
///
/// The state is validated against the schema first; this is the only way the
/// computation can fail.
pub fn compute_view<'r, T, F>(
    records: &'r [T],
    schema: &Schema,
    state: &ViewState,
    accessor: &F,
) -> Result<View<'r, T>>
where
    for<'a> F: Fn(&'a T, &str) -> Value<'a>,
{
    state.validate(schema)?;
    let keys = state.group_order.sort_keys(&state.sort, &state.group_fields)?;

    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| state.filters.matches(*record, schema, accessor))
        .map(|(i, _)| i)
        .collect();
    sort_indices(records, &mut indices, &keys, schema, accessor);

    let display_rows = synthesize(
        records,
        &indices,
        &state.group_fields,
        schema,
        &state.collapsed,
        accessor,
    );
    let (paginated_rows, page_info) = paginate(&display_rows, state.page);

    debug!(
        "view: {} of {} records pass {} active filter(s), {} sort key(s), {} group field(s), page {}/{} ({} rows)",
        indices.len(),
        records.len(),
        state.filters.active().count(),
        keys.len(),
        state.group_fields.len(),
        page_info.page,
        page_info.total_pages,
        paginated_rows.len(),
    );

    Ok(View {
        all_filtered_sorted_rows: indices.iter().map(|&i| &records[i]).collect(),
        sorted_indices: indices,
        display_rows,
        paginated_rows,
        page_info,
    })
}

/// Stateful wrapper around [`ViewState`] and [`compute_view`].
///
/// Every mutator recomputes the view before returning. A mutator that fails
/// validation leaves the engine unchanged.
pub struct ViewEngine<'r, T, F> {
    records: &'r [T],
    schema: Schema,
    accessor: F,
    state: ViewState,
    view: View<'r, T>,
}

impl<'r, T: Record> ViewEngine<'r, T, RecordAccessor<T>> {
    /// Creates an engine over records that implement [`Record`].
    pub fn from_records(records: &'r [T], schema: Schema) -> Result<Self> {
        Self::new(records, schema, T::accessor as RecordAccessor<T>)
    }
}

impl<'r, T, F> ViewEngine<'r, T, F>
where
    for<'a> F: Fn(&'a T, &str) -> Value<'a>,
{
    /// Creates an engine with the default state.
    pub fn new(records: &'r [T], schema: Schema, accessor: F) -> Result<Self> {
        Self::with_state(records, schema, accessor, ViewState::default())
    }

    pub fn with_state(
        records: &'r [T],
        schema: Schema,
        accessor: F,
        state: ViewState,
    ) -> Result<Self> {
        let view = compute_view(records, &schema, &state, &accessor)?;
        let state = state.with_page(view.page_info.page);
        Ok(ViewEngine {
            records,
            schema,
            accessor,
            state,
            view,
        })
    }

    fn commit(&mut self, next: ViewState) -> Result<()> {
        let view = compute_view(self.records, &self.schema, &next, &self.accessor)?;
        self.state = next.with_page(view.page_info.page);
        self.view = view;
        Ok(())
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Column-header click: `additive` for a modified (e.g. shift) click.
    pub fn set_sort(&mut self, field: &str, additive: bool) -> Result<()> {
        let next = self.state.with_sort(field, additive, &self.schema)?;
        self.commit(next)
    }

    pub fn set_sort_spec(&mut self, sort: SortSpec) -> Result<()> {
        let next = self.state.with_sort_spec(sort, &self.schema)?;
        self.commit(next)
    }

    /// Sets the filter on `field`, or removes it when `clear` is set.
    pub fn set_filter(
        &mut self,
        field: &str,
        operator: FilterOperator,
        value: &str,
        second_value: Option<&str>,
        clear: bool,
    ) -> Result<()> {
        let spec = (!clear).then(|| FilterSpec {
            operator,
            value: value.to_string(),
            second_value: second_value.map(str::to_string),
        });
        let next = self.state.with_filter(field, spec, &self.schema)?;
        self.commit(next)
    }

    /// Sets the filter on `field` from raw typed text.
    ///
    /// Numeric fields understand comparison and range shorthand (`>=50`,
    /// `20><50`). Other text is kept under the field's current operator, or
    /// the domain's default operator when the field has no filter yet.
    pub fn set_filter_text(&mut self, field: &str, raw: &str) -> Result<()> {
        let domain = self.schema.require(field, FieldContext::Filter)?.data_domain;
        let current = self
            .state
            .filters
            .get(field)
            .map(|spec| spec.operator)
            .filter(|op| !op.is_range())
            .unwrap_or_else(|| FilterOperator::default_for(domain));
        let spec = interpret_filter_input(raw, domain, current);
        let next = self.state.with_filter(field, Some(spec), &self.schema)?;
        self.commit(next)
    }

    pub fn clear_filters(&mut self) -> Result<()> {
        let next = self.state.without_filters();
        self.commit(next)
    }

    pub fn set_group_fields(&mut self, fields: Vec<String>) -> Result<()> {
        let next = self.state.with_group_fields(fields, &self.schema)?;
        self.commit(next)
    }

    pub fn set_group_order(&mut self, mode: GroupOrderMode) -> Result<()> {
        let next = self.state.with_group_order(mode, &self.schema)?;
        self.commit(next)
    }

    pub fn toggle_group(&mut self, path: &GroupPath) -> Result<()> {
        let next = self.state.with_group_toggled(path);
        self.commit(next)
    }

    pub fn set_group_collapsed(&mut self, path: &GroupPath, collapsed: bool) -> Result<()> {
        let next = self.state.with_group_collapsed(path, collapsed);
        self.commit(next)
    }

    pub fn expand_all_groups(&mut self) -> Result<()> {
        let next = self.state.with_all_groups_expanded();
        self.commit(next)
    }

    /// Collapses every group the current records and grouping produce.
    pub fn collapse_all_groups(&mut self) -> Result<()> {
        let paths: CollapsedSet = synthesize(
            self.records,
            &self.view.sorted_indices,
            &self.state.group_fields,
            &self.schema,
            &CollapsedSet::new(),
            &self.accessor,
        )
        .into_iter()
        .filter_map(|row| match row {
            DisplayRow::Header(header) => Some(header.path),
            DisplayRow::Record { .. } => None,
        })
        .collect();
        let next = self.state.with_collapsed(paths);
        self.commit(next)
    }

    pub fn set_page(&mut self, page: usize) -> Result<()> {
        let next = self.state.with_page(page);
        self.commit(next)
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        let next = self.state.with_page_size(size)?;
        self.commit(next)
    }

    pub fn set_visible_columns(&mut self, columns: Vec<String>) -> Result<()> {
        let next = self.state.with_visible_columns(columns, &self.schema)?;
        self.commit(next)
    }

    /// Points the engine at a new record slice, keeping the configuration.
    pub fn replace_records(&mut self, records: &'r [T]) -> Result<()> {
        let view = compute_view(records, &self.schema, &self.state, &self.accessor)?;
        self.records = records;
        self.state = self.state.with_page(view.page_info.page);
        self.view = view;
        Ok(())
    }

    /// Replaces the whole configuration with a saved view.
    pub fn apply_config(&mut self, config: &ViewConfig) -> Result<()> {
        let next = config.to_state(&self.schema)?;
        self.commit(next)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn paginated_rows(&self) -> &[DisplayRow<'r, T>] {
        &self.view.paginated_rows
    }

    /// Filtered and sorted records before paging, for export.
    pub fn all_filtered_sorted_rows(&self) -> Vec<&'r T> {
        self.view.all_filtered_sorted_rows.clone()
    }

    pub fn display_rows(&self) -> &[DisplayRow<'r, T>] {
        &self.view.display_rows
    }

    pub fn sort_direction_for(&self, field: &str) -> Option<Direction> {
        self.state.sort.direction_for(field)
    }

    /// 1-based sort priority of `field`.
    pub fn sort_order_for(&self, field: &str) -> Option<usize> {
        self.state.sort.order_for(field)
    }

    /// Filters that currently constrain the view.
    pub fn active_filters(&self) -> Vec<(&str, &FilterSpec)> {
        self.state.filters.active().collect()
    }

    pub fn page_info(&self) -> PageInfo {
        self.view.page_info
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &'r [T] {
        self.records
    }

    pub fn view(&self) -> &View<'r, T> {
        &self.view
    }

    /// The current configuration as a saveable view.
    pub fn snapshot(&self, id: &str, name: &str) -> ViewConfig {
        ViewConfig::from_state(id, name, &self.state)
    }
}
