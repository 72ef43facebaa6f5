//! Filter expression parser.
//!
//! Turns free-text filter input for numeric fields into a structured
//! [`FilterSpec`]. The grammar, in precedence order:
//!
//! | Input        | Result                                  |
//! |--------------|-----------------------------------------|
//! | `20><50`     | `between 20 and 50` (also `<>` and `..`) |
//! | `>=X`        | `gte X`                                 |
//! | `<=X`        | `lte X`                                 |
//! | `!=X`        | `neq X`                                 |
//! | `>X`         | `gt X`                                  |
//! | `<X`         | `lt X`                                  |
//! | `=X`         | `eq X`                                  |
//!
//! Anything else is kept verbatim under the caller's current operator. The
//! parser never fails: an incomplete expression such as a bare `>` is literal
//! text until a value follows it.

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::filter::FilterSpec;
use crate::op::FilterOperator;
use crate::schema::DataDomain;

static RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d+\.?\d*)\s*(><|<>|\.\.)\s*(\d+\.?\d*)\s*$").ok());

/// Prefix rules after the range rule. Two-character prefixes come first so
/// that `>=5` is never read as `> "=5"`.
const PREFIXES: &[(&str, FilterOperator)] = &[
    (">=", FilterOperator::Gte),
    ("<=", FilterOperator::Lte),
    ("!=", FilterOperator::Neq),
    (">", FilterOperator::Gt),
    ("<", FilterOperator::Lt),
    ("=", FilterOperator::Eq),
];

/// Parses a numeric filter expression.
///
/// Returns `None` when the input is not an expression, in which case the
/// caller keeps it as a literal value.
///
/// ```
/// use tabview_engine::{parse_numeric_expression, FilterOperator};
///
/// let spec = parse_numeric_expression("20><50").unwrap();
/// assert_eq!(spec.operator, FilterOperator::Between);
/// assert_eq!(spec.value, "20");
/// assert_eq!(spec.second_value.as_deref(), Some("50"));
///
/// assert!(parse_numeric_expression(">").is_none());
/// ```
pub fn parse_numeric_expression(raw: &str) -> Option<FilterSpec> {
    if let Some(caps) = RANGE.as_ref().and_then(|re| re.captures(raw)) {
        return Some(FilterSpec::range(FilterOperator::Between, &caps[1], &caps[3]));
    }

    let trimmed = raw.trim();
    PREFIXES.iter().find_map(|(prefix, operator)| {
        let rest = trimmed.strip_prefix(prefix)?.trim();
        if rest.is_empty() {
            return None;
        }
        // `>=5` must not fall through to `>` with "=5".
        if matches!(*prefix, ">" | "<") && rest.starts_with('=') {
            return None;
        }
        Some(FilterSpec::new(*operator, rest))
    })
}

/// Interprets raw filter text typed for a field of `domain`.
///
/// Number and currency fields go through [`parse_numeric_expression`];
/// everything else, and any numeric input that is not an expression, is
/// kept verbatim under `current_operator`.
pub fn interpret_filter_input(
    raw: &str,
    domain: DataDomain,
    current_operator: FilterOperator,
) -> FilterSpec {
    if domain.is_numeric() {
        if let Some(spec) = parse_numeric_expression(raw) {
            trace!(
                "filter input {raw:?} parsed as {} {:?}{}",
                spec.operator,
                spec.value,
                spec.second_value
                    .as_deref()
                    .map(|s| format!("..{s:?}"))
                    .unwrap_or_default()
            );
            return spec;
        }
    }
    trace!("filter input {raw:?} kept literal under {current_operator}");
    FilterSpec::new(current_operator, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Option<(FilterOperator, String, Option<String>)> {
        parse_numeric_expression(raw).map(|s| (s.operator, s.value, s.second_value))
    }

    #[test]
    fn range_separators() {
        for raw in ["20><50", "20<>50", "20..50", "20 >< 50", "20..50  "] {
            assert_eq!(
                parsed(raw),
                Some((
                    FilterOperator::Between,
                    "20".to_string(),
                    Some("50".to_string())
                )),
                "{raw}"
            );
        }
        let (_, low, high) = parsed("1.5..2.").unwrap();
        assert_eq!((low.as_str(), high.as_deref()), ("1.5", Some("2.")));
    }

    #[test]
    fn range_rejects_signs_and_missing_bounds() {
        // Negative numbers are outside the range grammar.
        assert_eq!(parsed("-5..10"), None);
        assert_eq!(parsed("20><"), None);
    }

    #[test]
    fn comparison_prefixes() {
        let cases = [
            (">=10", FilterOperator::Gte, "10"),
            ("<= 10", FilterOperator::Lte, "10"),
            ("!=3", FilterOperator::Neq, "3"),
            (">7", FilterOperator::Gt, "7"),
            ("< 7", FilterOperator::Lt, "7"),
            ("=42", FilterOperator::Eq, "42"),
            ("  >-1  ", FilterOperator::Gt, "-1"),
        ];
        for (raw, op, value) in cases {
            assert_eq!(parsed(raw), Some((op, value.to_string(), None)), "{raw}");
        }
    }

    #[test]
    fn bare_operators_are_not_expressions() {
        for raw in [">", ">=", "<", "<=", "!=", "=", "  >  ", ""] {
            assert_eq!(parsed(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn bare_gt_stays_literal_under_current_operator() {
        let spec = interpret_filter_input(">", DataDomain::Number, FilterOperator::Eq);
        assert_eq!(spec, FilterSpec::new(FilterOperator::Eq, ">"));
    }

    #[test]
    fn non_numeric_domains_pass_through() {
        let spec = interpret_filter_input(">=5", DataDomain::String, FilterOperator::Contains);
        assert_eq!(spec, FilterSpec::new(FilterOperator::Contains, ">=5"));
    }

    #[test]
    fn currency_uses_grammar() {
        let spec = interpret_filter_input("100..200", DataDomain::Currency, FilterOperator::Eq);
        assert_eq!(spec.operator, FilterOperator::Between);
    }

    #[test]
    fn plain_number_keeps_current_operator() {
        let spec = interpret_filter_input("42", DataDomain::Number, FilterOperator::Gte);
        assert_eq!(spec, FilterSpec::new(FilterOperator::Gte, "42"));
    }
}
