//! Translation of raw request parameters into typed store and index requests
//!
//! Everything here is pure. Query-string coercions are lenient: values that
//! do not parse fall back to defaults or drop the constraint. Mutation
//! payloads are strict and reject malformed input before the store is touched.

mod input;

pub use input::{draft_from_input, patch_from_input, MovieInput, Numeral};

use crate::models::{PageRequest, DEFAULT_PAGE_SIZE};
use crate::search::SearchRequest;
use crate::state::MovieFilter;
use serde::Deserialize;

/// Query parameters of the attribute browse endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseParams {
    pub is_hit: Option<String>,
    pub year: Option<String>,
    pub min_budget: Option<String>,
    pub max_budget: Option<String>,
    pub page: Option<String>,
}

/// Query parameters of the full-text search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// Build the store filter and pagination for a browse request.
///
/// Browse pages always hold [`DEFAULT_PAGE_SIZE`] movies.
pub fn plan_browse(params: &BrowseParams) -> (MovieFilter, PageRequest) {
    let mut filter = MovieFilter::default();

    // Any present value other than "true" means "not a hit"
    if let Some(raw) = params.is_hit.as_deref() {
        filter = filter.with_hit(raw.trim().eq_ignore_ascii_case("true"));
    }

    if let Some(year) = non_empty(params.year.as_deref()).and_then(parse_int) {
        if let Ok(year) = i32::try_from(year) {
            filter = filter.with_year(year);
        }
    }

    filter = filter.with_budget_range(
        non_empty(params.min_budget.as_deref()).and_then(parse_amount),
        non_empty(params.max_budget.as_deref()).and_then(parse_amount),
    );

    let page = PageRequest::new(
        positive_or(params.page.as_deref(), 1),
        DEFAULT_PAGE_SIZE as i64,
    );

    (filter, page)
}

/// Build an index request for a search.
///
/// A missing page size falls back to `default_page_size`.
pub fn plan_search(params: &SearchParams, default_page_size: u32) -> SearchRequest {
    let text = params.q.as_deref().unwrap_or_default().trim().to_string();

    let page = PageRequest::new(
        positive_or(params.page.as_deref(), 1),
        positive_or(params.page_size.as_deref(), default_page_size as i64),
    );

    SearchRequest::new(text).with_page(page)
}

/// Parse a path identifier; anything but a non-negative integer is absent
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Integer value of a numeric string, truncating any fractional part
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .map(|v| v.trunc() as i64)
}

fn parse_amount(raw: &str) -> Option<u64> {
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    parse_int(raw).and_then(|v| u64::try_from(v).ok())
}

/// The numeric value when it is strictly positive, otherwise `default`
fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    non_empty(raw)
        .and_then(parse_int)
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ReleaseWindow;
    use chrono::NaiveDate;

    fn browse(pairs: &[(&str, &str)]) -> BrowseParams {
        let mut params = BrowseParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "is_hit" => params.is_hit = value,
                "year" => params.year = value,
                "min_budget" => params.min_budget = value,
                "max_budget" => params.max_budget = value,
                "page" => params.page = value,
                _ => unreachable!(),
            }
        }
        params
    }

    #[test]
    fn test_empty_browse_is_unconstrained() {
        let (filter, page) = plan_browse(&BrowseParams::default());
        assert!(filter.is_unconstrained());
        assert_eq!(page, PageRequest::new(1, 25));
    }

    #[test]
    fn test_is_hit_coercion() {
        assert_eq!(plan_browse(&browse(&[("is_hit", "true")])).0.is_hit, Some(true));
        assert_eq!(plan_browse(&browse(&[("is_hit", "TRUE")])).0.is_hit, Some(true));
        assert_eq!(plan_browse(&browse(&[("is_hit", "yes")])).0.is_hit, Some(false));
        assert_eq!(plan_browse(&browse(&[("is_hit", "")])).0.is_hit, Some(false));
    }

    #[test]
    fn test_year_becomes_half_open_window() {
        let (filter, _) = plan_browse(&browse(&[("year", "2010")]));
        let window = filter.released.unwrap();

        assert_eq!(window, ReleaseWindow::year(2010).unwrap());
        assert!(window.contains(NaiveDate::from_ymd_opt(2010, 12, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2011, 1, 1).unwrap()));
    }

    #[test]
    fn test_unparseable_filters_are_dropped() {
        let (filter, _) = plan_browse(&browse(&[
            ("year", "nineteen"),
            ("min_budget", "lots"),
            ("max_budget", "-5"),
        ]));
        assert!(filter.is_unconstrained());
    }

    #[test]
    fn test_budget_bounds() {
        let (filter, _) = plan_browse(&browse(&[("min_budget", "1000"), ("max_budget", "5000")]));
        assert_eq!(filter.min_budget, Some(1000));
        assert_eq!(filter.max_budget, Some(5000));
    }

    #[test]
    fn test_browse_page_coercion() {
        assert_eq!(plan_browse(&browse(&[("page", "3")])).1.skip(), 50);
        assert_eq!(plan_browse(&browse(&[("page", "0")])).1.page, 1);
        assert_eq!(plan_browse(&browse(&[("page", "abc")])).1.page, 1);
        assert_eq!(plan_browse(&browse(&[("page", "2.7")])).1.page, 2);
    }

    #[test]
    fn test_plan_search_defaults() {
        let request = plan_search(&SearchParams::default(), 25);
        assert!(request.is_browse());
        assert_eq!(request.page, PageRequest::new(1, 25));

        let request = plan_search(
            &SearchParams {
                q: Some("  the dark knight ".to_string()),
                page: Some("2".to_string()),
                page_size: Some("-1".to_string()),
            },
            25,
        );
        assert_eq!(request.text, "the dark knight");
        assert_eq!(request.page, PageRequest::new(2, 25));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id(""), None);
    }
}
