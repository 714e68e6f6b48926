//! List filters for the REST list endpoints
//!
//! Search, region and salesman are sent to the server on every request, for
//! both the list and the search endpoints. The backend only understands
//! `show_all` for status, so the inactive view fetches everything in one
//! large page and keeps rows whose `is_active` is false.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record status selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl StatusFilter {
    /// Cycle order used by the status toggle
    pub fn next(self) -> Self {
        match self {
            StatusFilter::Active => StatusFilter::Inactive,
            StatusFilter::Inactive => StatusFilter::All,
            StatusFilter::All => StatusFilter::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Inactive => "inactive",
            StatusFilter::All => "all",
        }
    }

    /// Query parameters for this status
    ///
    /// The backend hides inactive records unless `show_all` is set.
    fn query_pairs(self) -> Vec<(&'static str, String)> {
        match self {
            StatusFilter::Active => Vec::new(),
            StatusFilter::Inactive | StatusFilter::All => {
                vec![("show_all", "true".to_string())]
            }
        }
    }

    /// Whether a raw row returned by the backend belongs in this view
    pub fn keeps(self, row: &Value) -> bool {
        match self {
            StatusFilter::Inactive => {
                row.get("is_active").and_then(Value::as_bool) == Some(false)
            }
            StatusFilter::Active | StatusFilter::All => true,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            "all" => Ok(StatusFilter::All),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Filter bundle for one list view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    pub status: StatusFilter,
    pub region: Option<String>,
    pub salesman: Option<String>,
    pub search: Option<String>,
}

impl ListFilter {
    pub fn with_status(status: StatusFilter) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn salesman(mut self, salesman: impl Into<String>) -> Self {
        self.salesman = Some(salesman.into());
        self
    }

    /// Trimmed search term, if any
    pub fn search_term(&self) -> Option<&str> {
        non_blank(&self.search)
    }

    /// Search, filter and inactive results come back as one large page
    pub fn is_single_page(&self) -> bool {
        self.status == StatusFilter::Inactive
            || self.search_term().is_some()
            || non_blank(&self.region).is_some()
            || non_blank(&self.salesman).is_some()
    }

    /// Query parameters, excluding `page` and `per_page`
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.status.query_pairs();
        if let Some(term) = self.search_term() {
            pairs.push(("q", term.to_string()));
        }
        if let Some(region) = non_blank(&self.region) {
            pairs.push(("region", region.to_string()));
        }
        if let Some(salesman) = non_blank(&self.salesman) {
            pairs.push(("salesman", salesman.to_string()));
        }
        pairs
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(term) = self.search_term() {
            write!(f, " \"{}\"", term)?;
        }
        if let Some(region) = non_blank(&self.region) {
            write!(f, " region={}", region)?;
        }
        if let Some(salesman) = non_blank(&self.salesman) {
            write!(f, " salesman={}", salesman)?;
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
