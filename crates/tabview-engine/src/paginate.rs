//! Page windowing over display rows.
//!
//! Only record rows count toward the page size. Group headers ride along:
//! a page repeats every header whose records it shows, so a page can hold
//! more than `size` rows in total.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::group::DisplayRow;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// The requested page: a 1-based index and a size of at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageWindow {
    index: usize,
    size: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        PageWindow {
            index: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    /// Creates a window. An index of 0 is read as 1; a size of 0 is an error.
    pub fn new(index: usize, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(EngineError::InvalidPageSize);
        }
        Ok(PageWindow {
            index: index.max(1),
            size,
        })
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn size(self) -> usize {
        self.size
    }

    pub fn with_index(self, index: usize) -> Self {
        PageWindow {
            index: index.max(1),
            ..self
        }
    }

    pub fn with_size(self, size: usize) -> Result<Self> {
        PageWindow::new(self.index, size)
    }

    /// Number of pages needed for `total_items` records; never less than one.
    pub fn total_pages(self, total_items: usize) -> usize {
        total_items.div_ceil(self.size).max(1)
    }

    /// The window with its index clamped to `[1, total_pages]`.
    pub fn clamp(self, total_items: usize) -> Self {
        self.with_index(self.index.min(self.total_pages(total_items)))
    }

    /// Page on which the record with 0-based ordinal `ordinal` appears.
    fn page_of(self, ordinal: usize) -> usize {
        ordinal / self.size + 1
    }
}

/// Summary of the current page, for "showing X–Y of N" style pagers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based ordinal of the first record on the page, 0 when there are none.
    pub first_item: usize,
    /// 1-based ordinal of the last record on the page, 0 when there are none.
    pub last_item: usize,
}

impl PageInfo {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slices one page out of `rows`.
///
/// The window is clamped first. A header appears on every page that shows
/// one of its records. A header with no visible records (a collapsed group)
/// appears on the page of the next record row, or on the last page when no
/// record follows it.
///
/// Only record rows present in `rows` are paged, so records hidden under a
/// collapsed header are not counted in `total_items`. Collapsing a group
/// shortens the page sequence and moves later groups to earlier pages; every
/// filtered record is reachable by paging only while all groups are expanded.
pub fn paginate<'r, T>(
    rows: &[DisplayRow<'r, T>],
    window: PageWindow,
) -> (Vec<DisplayRow<'r, T>>, PageInfo) {
    let total_items = rows.iter().filter(|r| r.is_record()).count();
    let window = window.clamp(total_items);
    let total_pages = window.total_pages(total_items);
    let start = (window.index - 1) * window.size;
    let end = start + window.size;

    let mut page = Vec::new();
    // Open headers by level: (position in `rows`, already on this page).
    let mut open: Vec<(usize, bool)> = Vec::new();
    let mut ordinal = 0;

    for (pos, row) in rows.iter().enumerate() {
        match row {
            DisplayRow::Header(header) => {
                open.truncate(header.level);
                open.push((pos, false));

                let childless = match rows.get(pos + 1) {
                    Some(DisplayRow::Header(next)) => next.level <= header.level,
                    Some(DisplayRow::Record { .. }) => false,
                    None => true,
                };
                if childless {
                    let anchor = if ordinal >= total_items {
                        total_pages
                    } else {
                        window.page_of(ordinal)
                    };
                    if anchor == window.index {
                        emit_open(rows, &mut open, &mut page);
                    }
                }
            }
            DisplayRow::Record { .. } => {
                if (start..end).contains(&ordinal) {
                    emit_open(rows, &mut open, &mut page);
                    page.push(row.clone());
                }
                ordinal += 1;
            }
        }
    }

    let info = PageInfo {
        page: window.index,
        page_size: window.size,
        total_items,
        total_pages,
        first_item: if total_items == 0 { 0 } else { start + 1 },
        last_item: end.min(total_items),
    };
    (page, info)
}

fn emit_open<'r, T>(
    rows: &[DisplayRow<'r, T>],
    open: &mut [(usize, bool)],
    page: &mut Vec<DisplayRow<'r, T>>,
) {
    for (pos, emitted) in open.iter_mut() {
        if !*emitted {
            page.push(rows[*pos].clone());
            *emitted = true;
        }
    }
}
