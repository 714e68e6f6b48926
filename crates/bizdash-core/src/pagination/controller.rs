//! Controller state machine
//!
//! State lives behind a mutex that is never held across a fetch. Each
//! `load()` starts a new epoch; a response is applied only if it still belongs
//! to the current epoch (and, for load-more, to the page that comes next).

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ListRenderer, PageFetcher, PageResult, RenderMode};
use crate::observer::{ControlId, ObserverOptions, ViewportObserver};

/// The load-more control currently on screen
#[derive(Debug, Clone, Copy)]
struct LoadMoreControl {
    id: ControlId,
    enabled: bool,
}

struct ListState<T, F> {
    items: Vec<T>,
    current_page: u32,
    has_more: bool,
    total_count: u64,
    filter: Option<F>,
    /// Bumped by every `load()` and by `shutdown()`
    epoch: u64,
    /// Page 1 of the current epoch has been applied
    loaded: bool,
    loading_more: bool,
    /// Set by `disable_auto_load()` until the next `load()`
    paging_disabled: bool,
    /// The active result set was loaded with `load_single_page()`
    single_page: bool,
    control: Option<LoadMoreControl>,
    auto_load: Option<CancellationToken>,
}

impl<T, F> ListState<T, F> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            has_more: false,
            total_count: 0,
            filter: None,
            epoch: 0,
            loaded: false,
            loading_more: false,
            paging_disabled: false,
            single_page: false,
            control: None,
            auto_load: None,
        }
    }

    /// Record the backend total, keeping `items.len() <= total_count`
    fn set_total(&mut self, reported: u64) {
        let loaded = self.items.len() as u64;
        if reported < loaded {
            warn!(
                "Backend reported total {} but {} records are loaded",
                reported, loaded
            );
        }
        self.total_count = reported.max(loaded);
    }
}

struct Inner<T, F> {
    name: String,
    fetcher: Arc<dyn PageFetcher<T, F>>,
    renderer: Arc<dyn ListRenderer<T>>,
    observer: Option<Arc<dyn ViewportObserver>>,
    options: ObserverOptions,
    state: Mutex<ListState<T, F>>,
}

impl<T, F> Inner<T, F> {
    /// Disconnect the observer and take the control off screen
    fn drop_control(&self, state: &mut ListState<T, F>) {
        if let Some(token) = state.auto_load.take() {
            token.cancel();
        }
        if state.control.take().is_some() {
            self.renderer.remove_load_more();
        }
    }
}

impl<T, F> Drop for Inner<T, F> {
    fn drop(&mut self) {
        if let Some(token) = self.state.get_mut().auto_load.take() {
            token.cancel();
        }
    }
}

/// Paginated list controller
///
/// A cheap handle: clones drive the same list. The auto-load task holds only
/// a weak reference, so dropping every handle tears the list down.
pub struct PaginatedList<T, F> {
    inner: Arc<Inner<T, F>>,
}

impl<T, F> Clone for PaginatedList<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> fmt::Debug for PaginatedList<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PaginatedList")
            .field("name", &self.inner.name)
            .field("items", &state.items.len())
            .field("current_page", &state.current_page)
            .field("has_more", &state.has_more)
            .field("total_count", &state.total_count)
            .finish()
    }
}

impl<T, F> PaginatedList<T, F>
where
    T: Send + 'static,
    F: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Manual-only list: the load-more control must be clicked
    pub fn new(
        name: impl Into<String>,
        fetcher: Arc<dyn PageFetcher<T, F>>,
        renderer: Arc<dyn ListRenderer<T>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher,
                renderer,
                observer: None,
                options: ObserverOptions::default(),
                state: Mutex::new(ListState::new()),
            }),
        }
    }

    /// List that also auto-loads when the control scrolls into view
    pub fn with_observer(
        name: impl Into<String>,
        fetcher: Arc<dyn PageFetcher<T, F>>,
        renderer: Arc<dyn ListRenderer<T>>,
        observer: Arc<dyn ViewportObserver>,
        options: ObserverOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher,
                renderer,
                observer: Some(observer),
                options,
                state: Mutex::new(ListState::new()),
            }),
        }
    }

    /// Reset and load page 1 for `filter`
    ///
    /// Supersedes any in-flight load-more, whose result will be discarded.
    pub async fn load(&self, filter: F) {
        self.load_first_page(filter, false).await;
    }

    /// Like `load()`, but the result is never paged
    ///
    /// No load-more control is shown and `load_more()` stays a no-op until the
    /// next `load()`, even if the backend reports more rows.
    pub async fn load_single_page(&self, filter: F) {
        self.load_first_page(filter, true).await;
    }

    async fn load_first_page(&self, filter: F, single_page: bool) {
        let epoch = {
            let mut state = self.inner.state.lock();
            state.epoch += 1;
            state.items.clear();
            state.current_page = 0;
            state.has_more = false;
            state.total_count = 0;
            state.loaded = false;
            state.loading_more = false;
            state.paging_disabled = single_page;
            state.single_page = single_page;
            state.filter = Some(filter.clone());
            self.inner.drop_control(&mut state);
            self.inner.renderer.render_loading();
            state.epoch
        };
        debug!("[{}] loading page 1 with {:?}", self.inner.name, filter);

        let result = self.inner.fetcher.fetch_page(1, &filter).await;

        let mut state = self.inner.state.lock();
        if state.epoch != epoch {
            debug!("[{}] discarding superseded page 1", self.inner.name);
            return;
        }
        match result {
            Ok(page) => {
                if page.page != 1 {
                    warn!("[{}] asked for page 1, got page {}", self.inner.name, page.page);
                }
                state.items = page.items;
                state.current_page = 1;
                state.has_more = page.has_more;
                state.set_total(page.total);
                state.loaded = true;

                if state.items.is_empty() {
                    self.inner.renderer.render_empty();
                } else {
                    self.inner
                        .renderer
                        .render_page(&state.items, RenderMode::Replace);
                }
                if state.has_more && !state.paging_disabled {
                    self.install_control(&mut state);
                }
                info!(
                    "[{}] loaded {} of {} (more: {})",
                    self.inner.name,
                    state.items.len(),
                    state.total_count,
                    state.has_more
                );
            }
            Err(e) => {
                warn!("[{}] failed to load page 1: {}", self.inner.name, e);
                self.inner.renderer.on_error(&e);
            }
        }
    }

    /// Reload page 1 with the active filter; no-op before the first `load()`
    pub async fn reload(&self) {
        let (filter, single_page) = {
            let state = self.inner.state.lock();
            (state.filter.clone(), state.single_page)
        };
        if let Some(filter) = filter {
            self.load_first_page(filter, single_page).await;
        }
    }

    /// Fetch and append the next page
    ///
    /// Ignored when there is nothing more, when paging is disabled, or when a
    /// load-more is already in flight.
    pub async fn load_more(&self) {
        let (epoch, page, filter) = {
            let mut state = self.inner.state.lock();
            if !state.loaded || !state.has_more || state.paging_disabled {
                debug!("[{}] load more: nothing to load", self.inner.name);
                return;
            }
            if state.loading_more {
                debug!("[{}] load more already in flight", self.inner.name);
                return;
            }
            let Some(filter) = state.filter.clone() else {
                return;
            };
            state.loading_more = true;
            if let Some(control) = state.control.as_mut() {
                control.enabled = false;
                self.inner.renderer.set_load_more_enabled(control.id, false);
            }
            (state.epoch, state.current_page + 1, filter)
        };
        debug!("[{}] loading page {}", self.inner.name, page);

        let mut in_flight = InFlight {
            inner: &self.inner,
            epoch,
            page,
            armed: true,
        };
        let result = self.inner.fetcher.fetch_page(page, &filter).await;
        in_flight.armed = false;

        let mut state = self.inner.state.lock();
        if state.epoch != epoch || state.current_page + 1 != page {
            debug!("[{}] discarding stale page {}", self.inner.name, page);
            return;
        }
        state.loading_more = false;
        match result {
            Ok(result) => self.append_page(&mut state, page, result),
            Err(e) => {
                warn!("[{}] failed to load page {}: {}", self.inner.name, page, e);
                self.inner.renderer.on_error(&e);
                if let Some(control) = state.control.as_mut() {
                    control.enabled = true;
                    self.inner.renderer.set_load_more_enabled(control.id, true);
                }
            }
        }
    }

    fn append_page(&self, state: &mut ListState<T, F>, page: u32, result: PageResult<T>) {
        if result.page != page {
            warn!(
                "[{}] asked for page {}, got page {}",
                self.inner.name, page, result.page
            );
        }
        let start = state.items.len();
        state.items.extend(result.items);
        state.current_page = page;
        state.has_more = result.has_more;
        state.set_total(result.total);

        self.inner
            .renderer
            .render_page(&state.items[start..], RenderMode::Append);

        // The control moves below the new rows: replace it and re-arm
        self.inner.drop_control(state);
        if state.has_more && !state.paging_disabled {
            self.install_control(state);
        }
        debug!(
            "[{}] page {} appended, {} of {} loaded",
            self.inner.name,
            page,
            state.items.len(),
            state.total_count
        );
    }

    /// Remove the load-more control and stop paging the current result set
    ///
    /// Loaded items stay as they are. The next `load()` re-enables paging.
    pub fn disable_auto_load(&self) {
        let mut state = self.inner.state.lock();
        state.paging_disabled = true;
        self.inner.drop_control(&mut state);
        debug!("[{}] paging disabled for this result set", self.inner.name);
    }

    /// Tear the list down: disconnect the observer and ignore pending fetches
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.epoch += 1;
        state.loading_more = false;
        self.inner.drop_control(&mut state);
        debug!("[{}] shut down", self.inner.name);
    }

    fn install_control(&self, state: &mut ListState<T, F>) {
        let id = ControlId::next();
        state.control = Some(LoadMoreControl { id, enabled: true });
        self.inner.renderer.show_load_more(id);
        self.arm_observer(state, id);
    }

    /// Watch `control` for visibility; failure leaves the list manual-only
    fn arm_observer(&self, state: &mut ListState<T, F>, control: ControlId) {
        let Some(observer) = self.inner.observer.as_ref() else {
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("[{}] no async runtime, auto-load off", self.inner.name);
                return;
            }
        };
        let rx = match observer.observe(control, &self.inner.options) {
            Ok(rx) => rx,
            Err(e) => {
                warn!(
                    "[{}] auto-load observer failed, load more works manually only: {}",
                    self.inner.name, e
                );
                return;
            }
        };

        let token = CancellationToken::new();
        state.auto_load = Some(token.clone());
        runtime.spawn(watch_control(
            Arc::downgrade(&self.inner),
            control,
            rx,
            token,
            self.inner.options.clone(),
        ));
        debug!(
            "[{}] auto-load armed on control {}",
            self.inner.name,
            control.as_u64()
        );
    }

    /// Auto-load entry: same path as a click, if `control` is still live
    async fn trigger_auto_load(&self, control: ControlId) {
        {
            let state = self.inner.state.lock();
            let live = matches!(state.control, Some(c) if c.id == control && c.enabled);
            if !live || state.loading_more {
                return;
            }
        }
        debug!("[{}] load more control visible, auto-loading", self.inner.name);
        self.load_more().await;
    }
}

impl<T: Clone, F: Clone> PaginatedList<T, F> {
    /// Snapshot of every loaded record in load order
    pub fn items(&self) -> Vec<T> {
        self.inner.state.lock().items.clone()
    }

    pub fn active_filter(&self) -> Option<F> {
        self.inner.state.lock().filter.clone()
    }
}

impl<T, F> PaginatedList<T, F> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last page applied; 0 before page 1 arrives
    pub fn current_page(&self) -> u32 {
        self.inner.state.lock().current_page
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().has_more
    }

    pub fn total_count(&self) -> u64 {
        self.inner.state.lock().total_count
    }

    pub fn is_loading_more(&self) -> bool {
        self.inner.state.lock().loading_more
    }

    /// The load-more control on screen, if any
    pub fn load_more_control(&self) -> Option<ControlId> {
        self.inner.state.lock().control.map(|c| c.id)
    }

    pub fn is_auto_load_armed(&self) -> bool {
        self.inner
            .state
            .lock()
            .auto_load
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

/// Undoes a load-more whose future was dropped before the fetch returned
///
/// Only acts while the same result set is still active and no newer page has
/// been applied.
struct InFlight<'a, T, F> {
    inner: &'a Inner<T, F>,
    epoch: u64,
    page: u32,
    armed: bool,
}

impl<T, F> Drop for InFlight<'_, T, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        if state.epoch != self.epoch || state.current_page + 1 != self.page {
            return;
        }
        state.loading_more = false;
        if let Some(control) = state.control.as_mut() {
            control.enabled = true;
            self.inner.renderer.set_load_more_enabled(control.id, true);
        }
        debug!(
            "[{}] load of page {} cancelled",
            self.inner.name, self.page
        );
    }
}

/// Auto-load task for one control
///
/// Exits when the control is replaced or removed (token cancelled), when the
/// observer drops its sender, or when the list is gone.
async fn watch_control<T, F>(
    inner: Weak<Inner<T, F>>,
    control: ControlId,
    mut rx: mpsc::UnboundedReceiver<f32>,
    token: CancellationToken,
    options: ObserverOptions,
) where
    T: Send + 'static,
    F: Clone + fmt::Debug + Send + Sync + 'static,
{
    loop {
        let ratio = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            ratio = rx.recv() => match ratio {
                Some(ratio) => ratio,
                None => break,
            },
        };
        if !options.is_in_view(ratio) {
            continue;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(options.debounce) => {}
        }
        // Reports during the debounce collapse into this trigger
        while rx.try_recv().is_ok() {}

        let Some(inner) = inner.upgrade() else {
            break;
        };
        PaginatedList { inner }.trigger_auto_load(control).await;

        while rx.try_recv().is_ok() {}
    }
}
