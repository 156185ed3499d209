//! Search-parameter builder
//!
//! Accumulates `name[:modifier]=[comparator]value` pairs and the `_`-prefixed
//! control parameters, then renders them as a query string.
//!
//! ```rust
//! use ferrum_client::search::{SearchParams, SummaryMode};
//!
//! let params = SearchParams::new()
//!     .add("family", "Doe")
//!     .greater_or_equal("birthdate", "2000-01-01")
//!     .count(10)
//!     .summary(SummaryMode::Count);
//!
//! assert_eq!(
//!     params.encode(),
//!     "_count=10&_summary=count&birthdate=ge2000-01-01&family=Doe"
//! );
//! ```

use ferrum_models::FhirInstant;
use std::collections::BTreeMap;
use std::fmt;

/// Search modifier, appended to the parameter name after `:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Contains,
    Exact,
    Missing,
    Type,
    /// Hierarchy match upward (codes, URIs)
    Above,
    /// Hierarchy match downward
    Below,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Contains => "contains",
            Modifier::Exact => "exact",
            Modifier::Missing => "missing",
            Modifier::Type => "type",
            Modifier::Above => "above",
            Modifier::Below => "below",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value prefix for ordered and string comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Sw,
    Ew,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Ne => "ne",
            Comparator::Gt => "gt",
            Comparator::Lt => "lt",
            Comparator::Ge => "ge",
            Comparator::Le => "le",
            Comparator::Sw => "sw",
            Comparator::Ew => "ew",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of `_summary`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    True,
    Text,
    Data,
    Count,
    False,
}

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::True => "true",
            SummaryMode::Text => "text",
            SummaryMode::Data => "data",
            SummaryMode::Count => "count",
            SummaryMode::False => "false",
        }
    }
}

/// Value of `_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalMode {
    None,
    Estimate,
    Accurate,
}

impl TotalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TotalMode::None => "none",
            TotalMode::Estimate => "estimate",
            TotalMode::Accurate => "accurate",
        }
    }
}

/// Ordered multimap of search parameters.
///
/// `add`-style methods append another value for the key; `set`-style
/// methods (`count`, `elements`, `summary`, `total`, `format`, `since`, `at`)
/// replace whatever the key held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    params: BTreeMap<String, Vec<String>>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`
    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Replace all values of `name` with a single value
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), vec![value.into()]);
        self
    }

    /// Append `name:modifier=value`
    pub fn with_modifier(self, name: &str, modifier: Modifier, value: impl Into<String>) -> Self {
        self.add(format!("{name}:{modifier}"), value)
    }

    /// Append `name=<comparator><value>`
    pub fn with_prefix(self, name: &str, comparator: Comparator, value: &str) -> Self {
        self.add(name, format!("{comparator}{value}"))
    }

    pub fn contains(self, name: &str, value: impl Into<String>) -> Self {
        self.with_modifier(name, Modifier::Contains, value)
    }

    pub fn exact(self, name: &str, value: impl Into<String>) -> Self {
        self.with_modifier(name, Modifier::Exact, value)
    }

    pub fn missing(self, name: &str, is_missing: bool) -> Self {
        self.with_modifier(name, Modifier::Missing, is_missing.to_string())
    }

    /// Restrict a reference parameter to one target type (`name:type=Patient`)
    pub fn of_type(self, name: &str, resource_type: impl Into<String>) -> Self {
        self.with_modifier(name, Modifier::Type, resource_type)
    }

    pub fn above(self, name: &str, value: impl Into<String>) -> Self {
        self.with_modifier(name, Modifier::Above, value)
    }

    pub fn below(self, name: &str, value: impl Into<String>) -> Self {
        self.with_modifier(name, Modifier::Below, value)
    }

    pub fn equal_to(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Eq, value)
    }

    pub fn not_equal_to(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Ne, value)
    }

    pub fn greater_than(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Gt, value)
    }

    pub fn less_than(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Lt, value)
    }

    pub fn greater_or_equal(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Ge, value)
    }

    pub fn less_or_equal(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Le, value)
    }

    pub fn starts_with(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Sw, value)
    }

    pub fn ends_with(self, name: &str, value: &str) -> Self {
        self.with_prefix(name, Comparator::Ew, value)
    }

    /// Page size
    pub fn count(self, count: u32) -> Self {
        self.set("_count", count.to_string())
    }

    /// Sort key, a leading `-` marks descending order
    pub fn sort(self, field: &str, descending: bool) -> Self {
        let key = if descending {
            format!("-{field}")
        } else {
            field.to_string()
        };
        self.add("_sort", key)
    }

    pub fn include(self, resource_type: &str, search_param: &str) -> Self {
        self.add("_include", format!("{resource_type}:{search_param}"))
    }

    pub fn revinclude(self, resource_type: &str, search_param: &str) -> Self {
        self.add("_revinclude", format!("{resource_type}:{search_param}"))
    }

    pub fn elements(self, fields: &[&str]) -> Self {
        self.set("_elements", fields.join(","))
    }

    pub fn summary(self, mode: SummaryMode) -> Self {
        self.set("_summary", mode.as_str())
    }

    pub fn total(self, mode: TotalMode) -> Self {
        self.set("_total", mode.as_str())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.set("_format", format)
    }

    /// Only changes after the given instant (history)
    pub fn since(self, instant: FhirInstant) -> Self {
        self.set("_since", instant.to_string())
    }

    /// State as of the given instant (history)
    pub fn at(self, instant: FhirInstant) -> Self {
        self.set("_at", instant.to_string())
    }

    pub fn profile(self, url: impl Into<String>) -> Self {
        self.add("_profile", url)
    }

    pub fn security(self, system: &str, code: &str) -> Self {
        self.add("_security", format!("{system}|{code}"))
    }

    pub fn tag(self, system: &str, code: &str) -> Self {
        self.add("_tag", format!("{system}|{code}"))
    }

    pub fn filter(self, expression: impl Into<String>) -> Self {
        self.add("_filter", expression)
    }

    /// Values recorded for `name`, in insertion order
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.params.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// All `(name, value)` pairs, names sorted, values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Percent-encoded query string, without the leading `?`
    pub fn encode(&self) -> String {
        self.iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Unencoded `name=value` pairs joined by `&`, for logging and display
    pub fn to_raw_query(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (name, value)| params.add(name, value))
    }
}
