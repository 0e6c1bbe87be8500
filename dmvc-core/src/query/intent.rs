//! Normalized list/count query derived from raw query parameters

use crate::schema::Record;
use serde_json::Value;
use std::collections::HashMap;

/// Raw query string parameters (first value wins for repeated keys)
pub type QueryParams = HashMap<String, String>;

/// Parameters that steer pagination, sorting and search rather than filter
pub const CONTROL_PARAMS: [&str; 10] =
    ["cursor", "pageSize", "limit", "page", "sortField", "sortDir", "q", "search", "sort", "dir"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Per-request query intent
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub cursor: Option<String>,
    /// Always greater than zero
    pub limit: usize,
    /// 1-based page for in-memory pagination
    pub page: usize,
    pub sort_field: Option<String>,
    pub sort_dir: SortDir,
    pub search: Option<String>,
    pub filters: Record,
}

impl QueryIntent {
    /// Parse controls out of `params`; everything else becomes a string filter
    pub fn parse(params: &QueryParams, default_page_size: usize) -> Self {
        let limit = leading_int(params, "limit")
            .or_else(|| leading_int(params, "pageSize"))
            .filter(|l| *l > 0)
            .map(|l| l as usize)
            .unwrap_or(default_page_size);
        let page = leading_int(params, "page").unwrap_or(1).max(1) as usize;

        let sort_dir = match first_present(params, &["sortDir", "dir"]) {
            Some("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        };

        let filters = params
            .iter()
            .filter(|(k, _)| !CONTROL_PARAMS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        Self {
            cursor: non_empty(params.get("cursor").map(String::as_str)),
            limit,
            page,
            sort_field: non_empty(first_present(params, &["sortField", "sort"])),
            sort_dir,
            search: non_empty(first_present(params, &["q", "search"])),
            filters,
        }
    }

    /// Sorting or search force a full drain and in-memory pagination
    pub fn needs_full_scan(&self) -> bool {
        self.sort_field.is_some() || self.search.is_some()
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

fn first_present<'a>(params: &'a QueryParams, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| params.get(*n)).map(String::as_str)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn leading_int(params: &QueryParams, name: &str) -> Option<i64> {
    params.get(name).and_then(|raw| parse_leading_int(raw))
}

/// Parse an optionally signed integer prefix, ignoring trailing garbage ("12abc" -> 12)
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
