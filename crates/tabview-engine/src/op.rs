//! Filter operators.
//!
//! The [`FilterOperator`] enum defines every operator a filter can use,
//! organized by the data domains they apply to. Not all operators are valid
//! for all domains; [`FilterOperator::supports`] is the single source of truth.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::schema::DataDomain;

/// Comparison operator for a field filter.
///
/// Operators are grouped by the domains they support:
/// - **String**: `Contains`, `DoesNotContain`, `Equals`, `StartsWith`, `EndsWith`
/// - **Number / currency**: `Eq`, `Neq`, `Gt`, `Lt`, `Gte`, `Lte`, `Between`
/// - **Date / datetime**: `Is`, `IsNot`, `IsBefore`, `IsAfter`, `DateRange`
/// - **Collection**: `Contains`, `DoesNotContain`, `ContainsAny`, `ContainsAll`
/// - **Boolean**: `Equals`
/// - **Universal**: `IsEmpty`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    // Text and collection membership
    Contains,
    DoesNotContain,
    Equals,
    StartsWith,
    EndsWith,

    // Numeric comparison
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Inclusive on both bounds.
    Between,

    // Temporal comparison
    Is,
    IsNot,
    IsBefore,
    IsAfter,
    /// Inclusive on both bounds.
    DateRange,

    // Collection set operators
    ContainsAny,
    ContainsAll,

    /// Matches null, missing, empty-string and empty-collection values.
    IsEmpty,
}

const STRING_OPS: &[FilterOperator] = &[
    FilterOperator::Contains,
    FilterOperator::DoesNotContain,
    FilterOperator::Equals,
    FilterOperator::StartsWith,
    FilterOperator::EndsWith,
    FilterOperator::IsEmpty,
];

const NUMBER_OPS: &[FilterOperator] = &[
    FilterOperator::Eq,
    FilterOperator::Neq,
    FilterOperator::Gt,
    FilterOperator::Lt,
    FilterOperator::Gte,
    FilterOperator::Lte,
    FilterOperator::Between,
    FilterOperator::IsEmpty,
];

const DATE_OPS: &[FilterOperator] = &[
    FilterOperator::Is,
    FilterOperator::IsNot,
    FilterOperator::IsBefore,
    FilterOperator::IsAfter,
    FilterOperator::DateRange,
    FilterOperator::IsEmpty,
];

const COLLECTION_OPS: &[FilterOperator] = &[
    FilterOperator::Contains,
    FilterOperator::DoesNotContain,
    FilterOperator::ContainsAny,
    FilterOperator::ContainsAll,
    FilterOperator::IsEmpty,
];

const BOOLEAN_OPS: &[FilterOperator] = &[FilterOperator::Equals, FilterOperator::IsEmpty];

impl FilterOperator {
    /// The operators valid for a domain, in presentation order.
    pub fn operators_for(domain: DataDomain) -> &'static [FilterOperator] {
        match domain.comparison_class() {
            DataDomain::Number => NUMBER_OPS,
            DataDomain::Date => DATE_OPS,
            DataDomain::Collection => COLLECTION_OPS,
            DataDomain::Boolean => BOOLEAN_OPS,
            _ => STRING_OPS,
        }
    }

    /// The operator a fresh filter input starts with.
    pub fn default_for(domain: DataDomain) -> FilterOperator {
        Self::operators_for(domain)[0]
    }

    /// Returns `true` if this operator may be used on fields of `domain`.
    pub fn supports(self, domain: DataDomain) -> bool {
        Self::operators_for(domain).contains(&self)
    }

    /// Returns `true` for operators that take a second bound.
    pub fn is_range(self) -> bool {
        matches!(self, FilterOperator::Between | FilterOperator::DateRange)
    }

    /// Evaluates an ordering-based operator given the ordering of
    /// `field_value` relative to the filter value.
    ///
    /// Temporal operators map onto their numeric counterparts
    /// (`Is` → `Eq`, `IsBefore` → `Lt`, ...). Non-ordering operators return `false`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            FilterOperator::Eq | FilterOperator::Is => ordering == Ordering::Equal,
            FilterOperator::Neq | FilterOperator::IsNot => ordering != Ordering::Equal,
            FilterOperator::Gt | FilterOperator::IsAfter => ordering == Ordering::Greater,
            FilterOperator::Gte => ordering != Ordering::Less,
            FilterOperator::Lt | FilterOperator::IsBefore => ordering == Ordering::Less,
            FilterOperator::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::DoesNotContain => "doesNotContain",
            FilterOperator::Equals => "equals",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Between => "between",
            FilterOperator::Is => "is",
            FilterOperator::IsNot => "isNot",
            FilterOperator::IsBefore => "isBefore",
            FilterOperator::IsAfter => "isAfter",
            FilterOperator::DateRange => "dateRange",
            FilterOperator::ContainsAny => "containsAny",
            FilterOperator::ContainsAll => "containsAll",
            FilterOperator::IsEmpty => "isEmpty",
        }
    }
}

const ALL_OPS: &[FilterOperator] = &[
    FilterOperator::Contains,
    FilterOperator::DoesNotContain,
    FilterOperator::Equals,
    FilterOperator::StartsWith,
    FilterOperator::EndsWith,
    FilterOperator::Eq,
    FilterOperator::Neq,
    FilterOperator::Gt,
    FilterOperator::Lt,
    FilterOperator::Gte,
    FilterOperator::Lte,
    FilterOperator::Between,
    FilterOperator::Is,
    FilterOperator::IsNot,
    FilterOperator::IsBefore,
    FilterOperator::IsAfter,
    FilterOperator::DateRange,
    FilterOperator::ContainsAny,
    FilterOperator::ContainsAll,
    FilterOperator::IsEmpty,
];

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterOperator {
    type Err = String;

    /// Parses a wire name, case-insensitively (`isEmpty`, `isempty`, `ISEMPTY`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_OPS
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter operator '{s}'"))
    }
}
