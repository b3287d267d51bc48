//! Query state and backend request construction.
//!
//! [`QueryState`] holds the bounded term set, category, filters and page.
//! [`SearchRequest`] is the immutable snapshot sent to `GET /api/search`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Fixed page size used for every search request.
pub const PAGE_SIZE: u32 = 10;

/// Upper bound on simultaneously active terms.
pub const MAX_TERMS: usize = 3;

/// Logical join between terms in the `q` parameter.
pub const TERM_JOIN: &str = " OR ";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Studies,
    Indications,
    Procedures,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::All,
        Category::Studies,
        Category::Indications,
        Category::Procedures,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Studies => "studies",
            Category::Indications => "indications",
            Category::Procedures => "procedures",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Studies => "Studies",
            Category::Indications => "Indications",
            Category::Procedures => "Procedures",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Category::All => Category::Studies,
            Category::Studies => Category::Indications,
            Category::Indications => Category::Procedures,
            Category::Procedures => Category::All,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

/// Filter panels; each category shows a subset of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterGroup {
    Study,
    Indication,
    Procedure,
}

impl FilterGroup {
    pub fn visible_for(self, category: Category) -> bool {
        match (self, category) {
            (_, Category::All) => true,
            (FilterGroup::Study, Category::Studies) => true,
            (FilterGroup::Indication, Category::Indications) => true,
            (FilterGroup::Procedure, Category::Procedures) => true,
            _ => false,
        }
    }
}

/// Recognized filter parameters. Declaration order is the order in which
/// they are appended to the request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Status,
    Phase,
    StartDate,
    EndDate,
    IndicationCategory,
    Severity,
    ProcedureCategory,
    RiskLevel,
    MinDuration,
    MaxDuration,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        FilterField::Status,
        FilterField::Phase,
        FilterField::StartDate,
        FilterField::EndDate,
        FilterField::IndicationCategory,
        FilterField::Severity,
        FilterField::ProcedureCategory,
        FilterField::RiskLevel,
        FilterField::MinDuration,
        FilterField::MaxDuration,
    ];

    /// Query parameter name.
    pub fn param(self) -> &'static str {
        match self {
            FilterField::Status => "status",
            FilterField::Phase => "phase",
            FilterField::StartDate => "start_date",
            FilterField::EndDate => "end_date",
            FilterField::IndicationCategory => "indication_category",
            FilterField::Severity => "severity",
            FilterField::ProcedureCategory => "procedure_category",
            FilterField::RiskLevel => "risk_level",
            FilterField::MinDuration => "min_duration",
            FilterField::MaxDuration => "max_duration",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterField::Status => "Status",
            FilterField::Phase => "Phase",
            FilterField::StartDate => "Start date",
            FilterField::EndDate => "End date",
            FilterField::IndicationCategory => "Indication",
            FilterField::Severity => "Severity",
            FilterField::ProcedureCategory => "Procedure",
            FilterField::RiskLevel => "Risk level",
            FilterField::MinDuration => "Min duration",
            FilterField::MaxDuration => "Max duration",
        }
    }

    pub fn group(self) -> FilterGroup {
        match self {
            FilterField::Status
            | FilterField::Phase
            | FilterField::StartDate
            | FilterField::EndDate
            | FilterField::MinDuration
            | FilterField::MaxDuration => FilterGroup::Study,
            FilterField::IndicationCategory | FilterField::Severity => FilterGroup::Indication,
            FilterField::ProcedureCategory | FilterField::RiskLevel => FilterGroup::Procedure,
        }
    }

    /// Fields whose panel is shown for `category`.
    pub fn visible_for(category: Category) -> Vec<FilterField> {
        FilterField::ALL
            .into_iter()
            .filter(|f| f.group().visible_for(category))
            .collect()
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

impl FromStr for FilterField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        FilterField::ALL
            .into_iter()
            .find(|f| f.param().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ValidationError::UnknownFilter(s.to_string()))
    }
}

/// Active filter values. Empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilters {
    values: BTreeMap<FilterField, String>,
}

impl SearchFilters {
    /// Set or clear one filter; returns true when the stored value changed.
    pub fn set(&mut self, field: FilterField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return self.values.remove(&field).is_some();
        }
        match self.values.get(&field) {
            Some(existing) if existing == value => false,
            _ => {
                self.values.insert(field, value.to_string());
                true
            }
        }
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Applied filters in request order.
    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Mutable search state owned by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    terms: Vec<String>,
    category: Category,
    filters: SearchFilters,
    page: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            category: Category::default(),
            filters: SearchFilters::default(),
            page: 1,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trimmed term. The state is untouched on error.
    pub fn add_term(&mut self, term: &str) -> Result<&str, ValidationError> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTerm);
        }
        if self.terms.iter().any(|t| t == trimmed) {
            return Err(ValidationError::DuplicateTerm(trimmed.to_string()));
        }
        if self.terms.len() >= MAX_TERMS {
            return Err(ValidationError::TooManyTerms);
        }
        self.terms.push(trimmed.to_string());
        Ok(self.terms.last().map(String::as_str).unwrap_or_default())
    }

    /// Remove a term if present.
    pub fn remove_term(&mut self, term: &str) -> bool {
        let before = self.terms.len();
        self.terms.retain(|t| t != term.trim());
        self.terms.len() != before
    }

    pub fn clear_terms(&mut self) {
        self.terms.clear();
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn has_terms(&self) -> bool {
        !self.terms.is_empty()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut SearchFilters {
        &mut self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Pages below 1 are ignored; returns whether the page was accepted.
    pub fn set_page(&mut self, page: u32) -> bool {
        if page < 1 {
            return false;
        }
        self.page = page;
        true
    }

    /// Terms joined for the `q` parameter.
    pub fn joined_terms(&self) -> String {
        self.terms.join(TERM_JOIN)
    }

    /// Load a previously saved `q` value, keeping at most [`MAX_TERMS`]
    /// distinct non-empty terms.
    pub fn load_joined(&mut self, joined: &str) {
        self.terms.clear();
        for term in joined.split(TERM_JOIN) {
            if self.add_term(term).is_err() && self.terms.len() >= MAX_TERMS {
                break;
            }
        }
        self.page = 1;
    }
}

/// Snapshot of everything sent to `GET /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub per_page: u32,
    pub category: Category,
    pub filters: Vec<(FilterField, String)>,
}

impl SearchRequest {
    /// `None` when there is nothing to search for.
    pub fn from_state(state: &QueryState) -> Option<Self> {
        if !state.has_terms() {
            return None;
        }
        Some(Self {
            query: state.joined_terms(),
            page: state.page(),
            per_page: PAGE_SIZE,
            category: state.category(),
            filters: state
                .filters()
                .active()
                .map(|(f, v)| (f, v.to_string()))
                .collect(),
        })
    }

    /// Query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("category", self.category.as_str().to_string()),
        ];
        pairs.extend(self.filters.iter().map(|(f, v)| (f.param(), v.clone())));
        pairs
    }
}

/// Navigation metadata derived from a response total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: u64,
    pub page_size: u32,
}

impl PageInfo {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            page_size: PAGE_SIZE,
        }
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(self.total.div_ceil(size)).unwrap_or(u32::MAX)
    }
}
