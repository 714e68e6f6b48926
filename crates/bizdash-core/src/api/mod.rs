//! REST client for the dashboard backend
//!
//! Only the list endpoints are covered. Each list response is normalized into
//! a [`PageResult`](crate::pagination::PageResult) so the paginated list never
//! sees the raw body shape.

mod client;
mod list;

use std::fmt;

pub use client::ApiClient;
pub use list::{build_list_url, normalize_page, ListClient};

use crate::config::PageSizes;

/// Backend collection with a paged list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Clients,
    Products,
    Reports,
}

impl Entity {
    pub const ALL: [Entity; 3] = [Entity::Clients, Entity::Products, Entity::Reports];

    /// URL path segment, also the key holding the rows in a list body
    pub fn key(self) -> &'static str {
        match self {
            Entity::Clients => "clients",
            Entity::Products => "products",
            Entity::Reports => "reports",
        }
    }

    /// Page size while browsing
    pub fn page_size(self, sizes: &PageSizes) -> u32 {
        match self {
            Entity::Clients => sizes.clients,
            Entity::Products => sizes.products,
            Entity::Reports => sizes.reports,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Entity::Clients => "Clients",
            Entity::Products => "Products",
            Entity::Reports => "Visit Reports",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .into_iter()
            .find(|entity| entity.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown list '{}'", s))
    }
}
