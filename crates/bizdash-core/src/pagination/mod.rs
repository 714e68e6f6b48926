//! Paginated list controller
//!
//! Loads page 1 of a list endpoint, renders it, and extends the list on demand
//! through a load-more control that can be clicked or auto-triggered when it
//! scrolls into view. The controller does not know what a record looks like,
//! how a page is fetched, or how rows are drawn; those are collaborators.

mod controller;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::observer::ControlId;

pub use controller::PaginatedList;

/// One page of records as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Page number the backend says it returned
    pub page: u32,
    pub has_more: bool,
    /// Total records matching the filter
    pub total: u64,
}

impl<T> PageResult<T> {
    /// A final page holding `items`
    pub fn last(items: Vec<T>, page: u32, total: u64) -> Self {
        Self {
            items,
            page,
            has_more: false,
            total,
        }
    }
}

/// How `render_page` should treat existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Clear prior content first
    Replace,
    /// Add after existing content
    Append,
}

/// Fetches one page of records for a filter
#[async_trait]
pub trait PageFetcher<T, F>: Send + Sync {
    async fn fetch_page(&self, page: u32, filter: &F) -> Result<PageResult<T>, FetchError>;
}

/// Draws the list and its load-more control
///
/// Called with the controller's state locked: implementations must not call
/// back into the same controller.
pub trait ListRenderer<T>: Send + Sync {
    fn render_page(&self, items: &[T], mode: RenderMode);

    /// Page 1 is in flight
    fn render_loading(&self);

    /// Page 1 returned no records
    fn render_empty(&self);

    /// A fetch failed; the controller does not retry
    fn on_error(&self, error: &FetchError);

    /// Put a load-more control at the end of the list
    fn show_load_more(&self, _control: ControlId) {}

    /// Disable while a page is loading, re-enable after a failure
    fn set_load_more_enabled(&self, _control: ControlId, _enabled: bool) {}

    /// Take the load-more control away
    fn remove_load_more(&self) {}
}
