//! List view model
//!
//! The paginated list renders into this model from background tasks; the
//! event loop draws from it. A dirty flag tells the loop to redraw.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bizdash_core::{ControlId, FetchError, ListRenderer, Record, RenderMode};
use parking_lot::Mutex;

/// What the list area shows besides rows
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Page 1 in flight
    Loading,
    /// Page 1 had no rows
    Empty,
    Ready,
}

/// The load-more row at the bottom of the list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadMoreRow {
    pub control: ControlId,
    pub enabled: bool,
}

#[derive(Debug)]
pub struct ListModel {
    pub rows: Vec<Record>,
    pub status: ViewStatus,
    pub load_more: Option<LoadMoreRow>,
    /// Last fetch failure, cleared by the next successful render
    pub error: Option<String>,
    pub retryable: bool,
}

impl Default for ListModel {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            status: ViewStatus::Loading,
            load_more: None,
            error: None,
            retryable: false,
        }
    }
}

impl ListModel {
    /// Rows plus the load-more row, if shown
    pub fn row_count(&self) -> usize {
        self.rows.len() + usize::from(self.load_more.is_some())
    }

    /// Index of the load-more row
    pub fn load_more_index(&self) -> Option<usize> {
        self.load_more.map(|_| self.rows.len())
    }
}

/// Shared handle to the model plus its dirty flag
#[derive(Debug, Clone, Default)]
pub struct SharedModel {
    model: Arc<Mutex<ListModel>>,
    dirty: Arc<AtomicBool>,
}

impl SharedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&ListModel) -> R) -> R {
        f(&self.model.lock())
    }

    fn update(&self, f: impl FnOnce(&mut ListModel)) {
        f(&mut self.model.lock());
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns true once per batch of changes
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

/// Renders list updates into a [`SharedModel`]
pub struct TuiRenderer {
    model: SharedModel,
}

impl TuiRenderer {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }
}

impl ListRenderer<Record> for TuiRenderer {
    fn render_page(&self, items: &[Record], mode: RenderMode) {
        self.model.update(|m| {
            if mode == RenderMode::Replace {
                m.rows.clear();
            }
            m.rows.extend_from_slice(items);
            m.status = ViewStatus::Ready;
            m.error = None;
        });
    }

    fn render_loading(&self) {
        self.model.update(|m| {
            m.rows.clear();
            m.load_more = None;
            m.status = ViewStatus::Loading;
            m.error = None;
        });
    }

    fn render_empty(&self) {
        self.model.update(|m| {
            m.rows.clear();
            m.status = ViewStatus::Empty;
            m.error = None;
        });
    }

    fn on_error(&self, error: &FetchError) {
        self.model.update(|m| {
            m.error = Some(error.to_string());
            m.retryable = error.is_retryable();
        });
    }

    fn show_load_more(&self, control: ControlId) {
        self.model.update(|m| {
            m.load_more = Some(LoadMoreRow {
                control,
                enabled: true,
            })
        });
    }

    fn set_load_more_enabled(&self, control: ControlId, enabled: bool) {
        self.model.update(|m| {
            if let Some(row) = m.load_more.as_mut().filter(|row| row.control == control) {
                row.enabled = enabled;
            }
        });
    }

    fn remove_load_more(&self) {
        self.model.update(|m| m.load_more = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> Record {
        serde_json::from_value(json!({ "name": name })).unwrap()
    }

    #[test]
    fn test_replace_then_append() {
        let model = SharedModel::new();
        let renderer = TuiRenderer::new(model.clone());

        renderer.render_loading();
        assert!(model.take_dirty());
        assert!(!model.take_dirty());

        renderer.render_page(&[record("a"), record("b")], RenderMode::Replace);
        renderer.render_page(&[record("c")], RenderMode::Append);
        let titles = model.read(|m| m.rows.iter().map(Record::title).collect::<Vec<_>>());
        assert_eq!(titles, vec!["a", "b", "c"]);

        renderer.render_page(&[record("z")], RenderMode::Replace);
        assert_eq!(model.read(|m| m.rows.len()), 1);
    }

    #[test]
    fn test_load_more_row_tracks_control() {
        let model = SharedModel::new();
        let renderer = TuiRenderer::new(model.clone());
        renderer.render_page(&[record("a")], RenderMode::Replace);

        let control = ControlId::next();
        renderer.show_load_more(control);
        assert_eq!(model.read(|m| m.load_more_index()), Some(1));
        assert_eq!(model.read(ListModel::row_count), 2);

        // Updates for another control are ignored
        renderer.set_load_more_enabled(ControlId::next(), false);
        assert!(model.read(|m| m.load_more.unwrap().enabled));
        renderer.set_load_more_enabled(control, false);
        assert!(!model.read(|m| m.load_more.unwrap().enabled));

        renderer.remove_load_more();
        assert_eq!(model.read(|m| m.load_more_index()), None);
    }

    #[test]
    fn test_error_keeps_rows() {
        let model = SharedModel::new();
        let renderer = TuiRenderer::new(model.clone());
        renderer.render_page(&[record("a")], RenderMode::Replace);
        renderer.on_error(&FetchError::Network("offline".into()));

        model.read(|m| {
            assert_eq!(m.rows.len(), 1);
            assert_eq!(m.error.as_deref(), Some("network error: offline"));
            assert!(m.retryable);
        });
    }
}
