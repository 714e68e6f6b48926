//! List endpoints as a page fetcher

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{ApiClient, Entity};
use crate::config::PageSizes;
use crate::error::FetchError;
use crate::filter::ListFilter;
use crate::pagination::{PageFetcher, PageResult};

/// Page fetcher for one entity's list/search endpoints
pub struct ListClient<T> {
    api: Arc<ApiClient>,
    entity: Entity,
    page_sizes: PageSizes,
    _rows: PhantomData<fn() -> T>,
}

impl<T> ListClient<T> {
    pub fn new(api: Arc<ApiClient>, entity: Entity, page_sizes: PageSizes) -> Self {
        Self {
            api,
            entity,
            page_sizes,
            _rows: PhantomData,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// `per_page` for a filter: large single pages for search/filter results
    pub fn per_page(&self, filter: &ListFilter) -> u32 {
        if filter.is_single_page() {
            self.page_sizes.single_page
        } else {
            self.entity.page_size(&self.page_sizes)
        }
    }
}

#[async_trait]
impl<T> PageFetcher<T, ListFilter> for ListClient<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, page: u32, filter: &ListFilter) -> Result<PageResult<T>, FetchError> {
        let url = build_list_url(
            self.api.base_url(),
            self.entity,
            page,
            self.per_page(filter),
            filter,
        )?;
        let body = self.api.get_json(url).await?;
        normalize_page(self.entity, page, body, filter)
    }
}

/// URL for one page: `/search` when a term is present, `/list` otherwise
pub fn build_list_url(
    base: &Url,
    entity: Entity,
    page: u32,
    per_page: u32,
    filter: &ListFilter,
) -> Result<Url, FetchError> {
    let mut url = base.clone();
    {
        let endpoint = if filter.search_term().is_some() {
            "search"
        } else {
            "list"
        };
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base", base)))?;
        segments.pop_if_empty().extend([entity.key(), endpoint]);
    }
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("page", &page.max(1).to_string());
        query.append_pair("per_page", &per_page.to_string());
        for (key, value) in filter.query_pairs() {
            query.append_pair(key, &value);
        }
    }
    Ok(url)
}

/// Turn a list body into a page
///
/// The rows must be under the entity key; `page`, `has_more` and `total`
/// default to the requested page, `false`, and the row count. Rows the
/// status filter rejects are dropped and taken off the total.
pub fn normalize_page<T: DeserializeOwned>(
    entity: Entity,
    requested_page: u32,
    mut body: Value,
    filter: &ListFilter,
) -> Result<PageResult<T>, FetchError> {
    let rows = body
        .get_mut(entity.key())
        .map(Value::take)
        .ok_or_else(|| FetchError::Decode(format!("missing '{}' in list body", entity.key())))?;
    let Value::Array(mut rows) = rows else {
        return Err(FetchError::Decode(format!(
            "'{}' is not an array",
            entity.key()
        )));
    };
    let received = rows.len();
    rows.retain(|row| filter.status.keeps(row));
    let dropped = (received - rows.len()) as u64;

    let items: Vec<T> = serde_json::from_value(Value::Array(rows))
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    let page = body
        .get("page")
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(requested_page);
    let has_more = body
        .get("has_more")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let total = body
        .get("total")
        .and_then(Value::as_u64)
        .map(|total| total.saturating_sub(dropped))
        .unwrap_or(items.len() as u64);

    Ok(PageResult {
        items,
        page,
        has_more,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StatusFilter;
    use crate::record::Record;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://localhost:5009/api").unwrap()
    }

    #[test]
    fn test_list_url_for_plain_browsing() {
        let url = build_list_url(&base(), Entity::Reports, 3, 15, &ListFilter::default()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5009/api/reports/list?page=3&per_page=15"
        );
    }

    #[test]
    fn test_search_url_carries_every_filter() {
        let filter = ListFilter::with_status(StatusFilter::All)
            .search("al noor")
            .region("East");
        let url = build_list_url(&base(), Entity::Clients, 1, 500, &filter).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5009/api/clients/search?page=1&per_page=500&show_all=true&q=al+noor&region=East"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let base = Url::parse("https://dash.example.com/api/").unwrap();
        let url = build_list_url(&base, Entity::Products, 1, 20, &ListFilter::default()).unwrap();
        assert_eq!(url.path(), "/api/products/list");
    }

    #[test]
    fn test_per_page_switches_for_single_page_filters() {
        let config = crate::config::DashboardConfig::default();
        let api = Arc::new(ApiClient::new(&config).unwrap());
        let client: ListClient<Record> = ListClient::new(api, Entity::Reports, config.page_sizes);
        assert_eq!(client.per_page(&ListFilter::default()), 15);
        assert_eq!(client.per_page(&ListFilter::default().salesman("Ali")), 500);
    }

    #[test]
    fn test_normalize_each_entity_key() {
        for entity in Entity::ALL {
            let mut body = json!({
                "page": 2,
                "per_page": 2,
                "total": 9,
                "has_more": true
            });
            body[entity.key()] = json!([{"id": 1, "name": "one"}, {"id": 2, "name": "two"}]);
            let page: PageResult<Record> =
                normalize_page(entity, 2, body, &ListFilter::default()).unwrap();
            assert_eq!(page.items.len(), 2);
            assert_eq!(page.items[1].title(), "two");
            assert_eq!(page.page, 2);
            assert!(page.has_more);
            assert_eq!(page.total, 9);
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let body = json!({"products": [{"id": 5}]});
        let page: PageResult<Record> =
            normalize_page(Entity::Products, 4, body, &ListFilter::default()).unwrap();
        assert_eq!(page.page, 4);
        assert!(!page.has_more);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_inactive_view_returns_only_inactive_rows() {
        let filter = ListFilter::with_status(StatusFilter::Inactive);
        let url = build_list_url(&base(), Entity::Clients, 1, 500, &filter).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5009/api/clients/list?page=1&per_page=500&show_all=true"
        );

        // show_all brings back every client; only the disabled ones remain
        let body = json!({
            "clients": [
                {"id": 1, "name": "Open", "is_active": true},
                {"id": 2, "name": "Closed", "is_active": false},
                {"id": 3, "name": "Legacy"},
                {"id": 4, "name": "Dormant", "is_active": false}
            ],
            "page": 1,
            "has_more": false,
            "total": 4
        });
        let page: PageResult<Record> =
            normalize_page(Entity::Clients, 1, body, &filter).unwrap();
        let titles: Vec<_> = page.items.iter().map(Record::title).collect();
        assert_eq!(titles, vec!["Closed", "Dormant"]);
        assert!(page.items.iter().all(|r| !r.is_active()));
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_normalize_rejects_other_shapes() {
        let any = ListFilter::default();
        // A bare array is not part of the contract
        let bare = json!([{"id": 1}]);
        assert!(matches!(
            normalize_page::<Record>(Entity::Clients, 1, bare, &any),
            Err(FetchError::Decode(_))
        ));

        let wrong_key = json!({"reports": []});
        assert!(normalize_page::<Record>(Entity::Clients, 1, wrong_key, &any).is_err());

        let not_array = json!({"clients": {"id": 1}});
        assert!(normalize_page::<Record>(Entity::Clients, 1, not_array, &any).is_err());
    }
}
