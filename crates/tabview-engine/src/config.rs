//! Saved views.
//!
//! A [`ViewConfig`] is the serializable snapshot of a [`ViewState`], in the
//! shape a view-management feature stores and restores:
//!
//! ```json
//! {
//!   "id": "eng-by-age",
//!   "name": "Engineering by age",
//!   "visibleColumns": ["name", "age"],
//!   "groupBy": ["dept"],
//!   "sortConfig": [{"field": "dept", "direction": "ascending"}],
//!   "filterConfig": {"age": {"operator": "gte", "value": "30"}},
//!   "pageSize": 25
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::ViewState;
use crate::error::Result;
use crate::filter::FilterSet;
use crate::group::{CollapsedSet, GroupOrderMode, GroupPath};
use crate::ordering::SortSpec;
use crate::schema::Schema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub visible_columns: Vec<String>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub sort_config: SortSpec,
    #[serde(default)]
    pub filter_config: FilterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collapsed_groups: Vec<GroupPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_order: Option<GroupOrderMode>,
}

impl ViewConfig {
    /// Captures every part of `state`.
    pub fn from_state(id: impl Into<String>, name: impl Into<String>, state: &ViewState) -> Self {
        ViewConfig {
            id: id.into(),
            name: name.into(),
            visible_columns: state.visible_columns().to_vec(),
            group_by: state.group_fields().to_vec(),
            sort_config: state.sort().clone(),
            filter_config: state.filters().clone(),
            page_size: Some(state.page().size()),
            page: Some(state.page().index()),
            collapsed_groups: state.collapsed().iter().cloned().collect(),
            group_order: Some(state.group_order()),
        }
    }

    /// Rebuilds a state, validating every field id against `schema`.
    ///
    /// Missing optional parts take their defaults.
    pub fn to_state(&self, schema: &Schema) -> Result<ViewState> {
        let mut state = ViewState::new()
            .with_group_order(self.group_order.unwrap_or_default(), schema)?
            .with_sort_spec(self.sort_config.clone(), schema)?
            .with_group_fields(self.group_by.clone(), schema)?
            .with_visible_columns(self.visible_columns.clone(), schema)?
            .with_collapsed(self.collapsed_groups.iter().cloned().collect::<CollapsedSet>());
        for (field, spec) in self.filter_config.iter() {
            state = state.with_filter(field, Some(spec.clone()), schema)?;
        }
        if let Some(size) = self.page_size {
            state = state.with_page_size(size)?;
        }
        Ok(state.with_page(self.page.unwrap_or(1)))
    }
}
