//! Tests for the paginated list controller
//!
//! These tests verify that:
//! - Pages accumulate in order and the page counter follows them
//! - A new `load()` replaces everything, even with a load-more in flight
//! - Only one next-page fetch runs at a time
//! - Failures keep loaded rows and re-enable the control
//! - Auto-load goes through the same path as a click and is optional

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::{ListRenderer, PageFetcher, PageResult, PaginatedList, RenderMode};
use crate::error::FetchError;
use crate::observer::{ChannelObserver, ControlId, NoViewport, ObserverOptions};

type Item = &'static str;
type Filter = &'static str;
type Response = Result<PageResult<Item>, FetchError>;

enum Scripted {
    Ready(Response),
    Gated(oneshot::Receiver<Response>),
}

/// Fetcher answering from per-(page, filter) scripts
#[derive(Default)]
struct ScriptedFetcher {
    scripts: Mutex<HashMap<(u32, Filter), VecDeque<Scripted>>>,
    calls: Mutex<Vec<(u32, Filter)>>,
}

impl ScriptedFetcher {
    fn respond(&self, page: u32, filter: Filter, response: Response) {
        self.scripts
            .lock()
            .entry((page, filter))
            .or_default()
            .push_back(Scripted::Ready(response));
    }

    fn page(&self, page: u32, filter: Filter, items: &[Item], has_more: bool, total: u64) {
        self.respond(
            page,
            filter,
            Ok(PageResult {
                items: items.to_vec(),
                page,
                has_more,
                total,
            }),
        );
    }

    /// Response held back until the returned sender fires
    fn gate(&self, page: u32, filter: Filter) -> oneshot::Sender<Response> {
        let (tx, rx) = oneshot::channel();
        self.scripts
            .lock()
            .entry((page, filter))
            .or_default()
            .push_back(Scripted::Gated(rx));
        tx
    }

    fn calls(&self) -> Vec<(u32, Filter)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PageFetcher<Item, Filter> for ScriptedFetcher {
    async fn fetch_page(&self, page: u32, filter: &Filter) -> Result<PageResult<Item>, FetchError> {
        self.calls.lock().push((page, *filter));
        let scripted = self
            .scripts
            .lock()
            .get_mut(&(page, *filter))
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(Scripted::Ready(response)) => response,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".into()))),
            None => Err(FetchError::Http {
                status: 404,
                body: format!("no script for page {} / {}", page, filter),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Loading,
    Empty,
    Page(Vec<Item>, RenderMode),
    Error(String),
    ShowControl(ControlId),
    ControlEnabled(ControlId, bool),
    RemoveControl,
}

#[derive(Default)]
struct RecordingRenderer {
    events: Mutex<Vec<Event>>,
}

impl RecordingRenderer {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl ListRenderer<Item> for RecordingRenderer {
    fn render_page(&self, items: &[Item], mode: RenderMode) {
        self.events.lock().push(Event::Page(items.to_vec(), mode));
    }

    fn render_loading(&self) {
        self.events.lock().push(Event::Loading);
    }

    fn render_empty(&self) {
        self.events.lock().push(Event::Empty);
    }

    fn on_error(&self, error: &FetchError) {
        self.events.lock().push(Event::Error(error.to_string()));
    }

    fn show_load_more(&self, control: ControlId) {
        self.events.lock().push(Event::ShowControl(control));
    }

    fn set_load_more_enabled(&self, control: ControlId, enabled: bool) {
        self.events
            .lock()
            .push(Event::ControlEnabled(control, enabled));
    }

    fn remove_load_more(&self) {
        self.events.lock().push(Event::RemoveControl);
    }
}

fn manual_list() -> (
    PaginatedList<Item, Filter>,
    Arc<ScriptedFetcher>,
    Arc<RecordingRenderer>,
) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let renderer = Arc::new(RecordingRenderer::default());
    let list = PaginatedList::new("test", fetcher.clone(), renderer.clone());
    (list, fetcher, renderer)
}

fn observed_list() -> (
    PaginatedList<Item, Filter>,
    Arc<ScriptedFetcher>,
    Arc<RecordingRenderer>,
    ChannelObserver,
) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let renderer = Arc::new(RecordingRenderer::default());
    let observer = ChannelObserver::new();
    let list = PaginatedList::with_observer(
        "test",
        fetcher.clone(),
        renderer.clone(),
        Arc::new(observer.clone()),
        ObserverOptions::default(),
    );
    (list, fetcher, renderer, observer)
}

/// Let spawned tasks run until the fetcher has seen `count` calls
async fn wait_for_calls(fetcher: &ScriptedFetcher, count: usize) {
    for _ in 0..100 {
        if fetcher.calls().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {} fetch calls, saw {:?}",
        count,
        fetcher.calls()
    );
}

#[tokio::test]
async fn test_end_to_end_two_pages() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["a", "b"], true, 5);
    fetcher.page(2, "active", &["c", "d", "e"], false, 5);

    list.load("active").await;

    let control = list.load_more_control().expect("control after page 1");
    assert_eq!(
        renderer.take(),
        vec![
            Event::Loading,
            Event::Page(vec!["a", "b"], RenderMode::Replace),
            Event::ShowControl(control),
        ]
    );
    assert_eq!(list.current_page(), 1);
    assert_eq!(list.total_count(), 5);

    list.load_more().await;

    assert_eq!(
        renderer.take(),
        vec![
            Event::ControlEnabled(control, false),
            Event::Page(vec!["c", "d", "e"], RenderMode::Append),
            Event::RemoveControl,
        ]
    );
    assert_eq!(list.items(), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(list.current_page(), 2);
    assert!(!list.has_more());
    assert_eq!(list.load_more_control(), None);
    assert_eq!(fetcher.calls(), vec![(1, "active"), (2, "active")]);
}

#[tokio::test]
async fn test_pages_accumulate_in_order() {
    let (list, fetcher, _renderer) = manual_list();
    fetcher.page(1, "all", &["p1a", "p1b"], true, 7);
    fetcher.page(2, "all", &["p2a"], true, 7);
    fetcher.page(3, "all", &["p3a", "p3b", "p3c"], true, 7);
    fetcher.page(4, "all", &["p4a"], false, 7);

    list.load("all").await;
    for _ in 0..3 {
        list.load_more().await;
    }

    assert_eq!(list.current_page(), 4);
    assert_eq!(list.len(), 7);
    assert_eq!(
        list.items(),
        vec!["p1a", "p1b", "p2a", "p3a", "p3b", "p3c", "p4a"]
    );
    // Every page after the first went out with the same filter
    assert!(fetcher.calls().iter().all(|(_, filter)| *filter == "all"));
}

#[tokio::test]
async fn test_no_more_pages_means_no_fetch() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["only"], false, 1);

    list.load("active").await;
    assert_eq!(list.load_more_control(), None);
    assert!(!renderer.events().iter().any(|e| matches!(e, Event::ShowControl(_))));

    list.load_more().await;
    list.load_more().await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_load_more_before_load_is_noop() {
    let (list, fetcher, renderer) = manual_list();
    list.load_more().await;
    assert!(fetcher.calls().is_empty());
    assert!(renderer.events().is_empty());
}

#[tokio::test]
async fn test_empty_first_page_renders_empty() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "inactive", &[], false, 0);

    list.load("inactive").await;
    assert_eq!(renderer.take(), vec![Event::Loading, Event::Empty]);
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_concurrent_load_more_fetches_once() {
    let (list, fetcher, _renderer) = manual_list();
    fetcher.page(1, "active", &["a"], true, 3);
    let gate = fetcher.gate(2, "active");

    list.load("active").await;

    let first = {
        let list = list.clone();
        tokio::spawn(async move { list.load_more().await })
    };
    wait_for_calls(&fetcher, 2).await;
    assert!(list.is_loading_more());

    // A click arriving while the observer-triggered load is pending
    list.load_more().await;
    assert_eq!(fetcher.calls().len(), 2);

    gate.send(Ok(PageResult {
        items: vec!["b"],
        page: 2,
        has_more: true,
        total: 3,
    }))
    .unwrap();
    first.await.unwrap();

    assert!(!list.is_loading_more());
    assert_eq!(list.items(), vec!["a", "b"]);
    assert_eq!(fetcher.calls(), vec![(1, "active"), (2, "active")]);
}

#[tokio::test]
async fn test_filter_switch_discards_stale_load_more() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "region-a", &["a1", "a2"], true, 4);
    let stale = fetcher.gate(2, "region-a");
    fetcher.page(1, "region-b", &["b1"], true, 9);
    fetcher.page(2, "region-b", &["b2"], false, 9);

    list.load("region-a").await;
    let pending = {
        let list = list.clone();
        tokio::spawn(async move { list.load_more().await })
    };
    wait_for_calls(&fetcher, 2).await;

    list.load("region-b").await;
    renderer.take();

    // The old page 2 resolves after the switch
    stale
        .send(Ok(PageResult {
            items: vec!["a3", "a4"],
            page: 2,
            has_more: false,
            total: 4,
        }))
        .unwrap();
    pending.await.unwrap();

    assert_eq!(list.items(), vec!["b1"]);
    assert_eq!(list.current_page(), 1);
    assert_eq!(list.total_count(), 9);
    assert!(renderer.events().is_empty(), "stale page must not render");

    // The new filter's in-flight guard was not disturbed
    assert!(!list.is_loading_more());
    list.load_more().await;
    assert_eq!(list.items(), vec!["b1", "b2"]);
}

#[tokio::test]
async fn test_filter_switch_always_replaces() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "x", &["x1"], true, 2);
    fetcher.page(2, "x", &["x2"], false, 2);
    fetcher.page(1, "y", &["y1"], false, 1);

    list.load("x").await;
    list.load_more().await;
    renderer.take();

    list.load("y").await;
    let pages: Vec<_> = renderer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Page(items, mode) => Some((items, mode)),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![(vec!["y1"], RenderMode::Replace)]);
    assert_eq!(list.items(), vec!["y1"]);
    assert_eq!(list.active_filter(), Some("y"));
}

#[tokio::test]
async fn test_superseded_first_page_is_discarded() {
    let (list, fetcher, _renderer) = manual_list();
    let slow = fetcher.gate(1, "old");
    fetcher.page(1, "new", &["n1"], false, 1);

    let pending = {
        let list = list.clone();
        tokio::spawn(async move { list.load("old").await })
    };
    wait_for_calls(&fetcher, 1).await;
    list.load("new").await;

    slow.send(Ok(PageResult::last(vec!["o1", "o2"], 1, 2)))
        .unwrap();
    pending.await.unwrap();

    assert_eq!(list.items(), vec!["n1"]);
}

#[tokio::test]
async fn test_failed_load_more_keeps_items_and_reenables() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["a", "b"], true, 4);
    fetcher.respond(2, "active", Err(FetchError::Network("offline".into())));
    fetcher.page(2, "active", &["c", "d"], false, 4);

    list.load("active").await;
    let control = list.load_more_control().unwrap();
    renderer.take();

    list.load_more().await;
    assert_eq!(
        renderer.take(),
        vec![
            Event::ControlEnabled(control, false),
            Event::Error("network error: offline".into()),
            Event::ControlEnabled(control, true),
        ]
    );
    assert_eq!(list.items(), vec!["a", "b"]);
    assert_eq!(list.current_page(), 1);
    assert!(!list.is_loading_more());
    assert_eq!(list.load_more_control(), Some(control));

    // Manual retry
    list.load_more().await;
    assert_eq!(list.items(), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_failed_first_page_stays_loading() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.respond(
        1,
        "active",
        Err(FetchError::Http {
            status: 500,
            body: "boom".into(),
        }),
    );

    list.load("active").await;
    assert_eq!(
        renderer.take(),
        vec![Event::Loading, Event::Error("http error 500: boom".into())]
    );
    assert_eq!(list.current_page(), 0);

    list.load_more().await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_total_never_below_loaded_count() {
    let (list, fetcher, _renderer) = manual_list();
    fetcher.page(1, "active", &["a", "b", "c"], false, 2);

    list.load("active").await;
    assert_eq!(list.total_count(), 3);
}

#[tokio::test]
async fn test_disable_auto_load_keeps_items() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "search:acme", &["acme-1", "acme-2"], true, 800);

    list.load("search:acme").await;
    renderer.take();

    list.disable_auto_load();
    assert_eq!(renderer.take(), vec![Event::RemoveControl]);
    assert_eq!(list.items(), vec!["acme-1", "acme-2"]);

    list.load_more().await;
    assert_eq!(fetcher.calls().len(), 1);

    // A fresh load pages again
    fetcher.page(1, "active", &["a"], true, 2);
    list.load("active").await;
    assert!(list.load_more_control().is_some());
}

#[tokio::test]
async fn test_single_page_load_never_pages() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "search:acme", &["acme-1", "acme-2"], true, 800);

    list.load_single_page("search:acme").await;
    assert_eq!(
        renderer.take(),
        vec![
            Event::Loading,
            Event::Page(vec!["acme-1", "acme-2"], RenderMode::Replace),
        ]
    );
    assert_eq!(list.load_more_control(), None);

    list.load_more().await;
    assert_eq!(fetcher.calls(), vec![(1, "search:acme")]);

    // Reload keeps the result set unpaged
    fetcher.page(1, "search:acme", &["acme-1"], true, 800);
    list.reload().await;
    assert_eq!(list.load_more_control(), None);
    assert!(!renderer
        .events()
        .iter()
        .any(|e| matches!(e, Event::ShowControl(_))));
}

#[tokio::test]
async fn test_cancelled_load_more_can_be_retried() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["a"], true, 2);
    let _never_answered = fetcher.gate(2, "active");
    fetcher.page(2, "active", &["b"], false, 2);

    list.load("active").await;
    let control = list.load_more_control().unwrap();
    renderer.take();

    let outcome = tokio::time::timeout(Duration::from_millis(10), list.load_more()).await;
    assert!(outcome.is_err());
    assert!(!list.is_loading_more());
    assert_eq!(
        renderer.take(),
        vec![
            Event::ControlEnabled(control, false),
            Event::ControlEnabled(control, true),
        ]
    );

    list.load_more().await;
    assert_eq!(list.items(), vec!["a", "b"]);
    assert_eq!(
        fetcher.calls(),
        vec![(1, "active"), (2, "active"), (2, "active")]
    );
}

#[tokio::test]
async fn test_cancelled_load_more_after_new_load_leaves_state_alone() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["a"], true, 2);
    let _never_answered = fetcher.gate(2, "active");
    fetcher.page(1, "all", &["x"], true, 9);

    list.load("active").await;
    let pending = {
        let list = list.clone();
        tokio::spawn(async move { list.load_more().await })
    };
    wait_for_calls(&fetcher, 2).await;

    list.load("all").await;
    let control = list.load_more_control().unwrap();
    renderer.take();

    pending.abort();
    let _ = pending.await;

    // The new result set's control is untouched by the aborted fetch
    assert!(renderer.events().is_empty());
    assert_eq!(list.load_more_control(), Some(control));
    assert_eq!(list.items(), vec!["x"]);
}

#[tokio::test]
async fn test_reload_uses_active_filter() {
    let (list, fetcher, _renderer) = manual_list();
    fetcher.page(1, "active", &["a"], false, 1);
    fetcher.page(1, "active", &["a", "b"], false, 2);

    list.reload().await;
    assert!(fetcher.calls().is_empty());

    list.load("active").await;
    list.reload().await;
    assert_eq!(list.items(), vec!["a", "b"]);
    assert_eq!(fetcher.calls(), vec![(1, "active"), (1, "active")]);
}

#[tokio::test]
async fn test_shutdown_discards_pending_and_removes_control() {
    let (list, fetcher, renderer) = manual_list();
    fetcher.page(1, "active", &["a"], true, 2);
    let gate = fetcher.gate(2, "active");

    list.load("active").await;
    let pending = {
        let list = list.clone();
        tokio::spawn(async move { list.load_more().await })
    };
    wait_for_calls(&fetcher, 2).await;

    list.shutdown();
    gate.send(Ok(PageResult::last(vec!["b"], 2, 2))).unwrap();
    pending.await.unwrap();

    assert_eq!(list.items(), vec!["a"]);
    assert_eq!(list.load_more_control(), None);
    assert_eq!(renderer.events().last(), Some(&Event::RemoveControl));
}

#[tokio::test(start_paused = true)]
async fn test_visible_control_auto_loads_after_debounce() {
    let (list, fetcher, _renderer, observer) = observed_list();
    fetcher.page(1, "active", &["a"], true, 3);
    fetcher.page(2, "active", &["b"], true, 3);

    list.load("active").await;
    let control = list.load_more_control().unwrap();
    assert!(list.is_auto_load_armed());

    // Several reports during a fast scroll
    assert!(observer.report(control, 0.4));
    assert!(observer.report(control, 0.8));
    assert!(observer.report(control, 1.0));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.calls().len(), 1, "debounce not yet elapsed");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetcher.calls(), vec![(1, "active"), (2, "active")]);
    assert_eq!(list.items(), vec!["a", "b"]);

    // The control was re-rendered; the old one is no longer watched
    let next = list.load_more_control().unwrap();
    assert_ne!(next, control);
    assert!(!observer.report(control, 1.0));
    assert!(observer.is_watching(next));
}

#[tokio::test(start_paused = true)]
async fn test_below_threshold_does_not_load() {
    let (list, fetcher, _renderer, observer) = observed_list();
    fetcher.page(1, "active", &["a"], true, 2);

    list.load("active").await;
    let control = list.load_more_control().unwrap();
    observer.report(control, 0.05);
    observer.report(control, 0.0);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_last_page_disconnects_observer() {
    let (list, fetcher, _renderer, observer) = observed_list();
    fetcher.page(1, "active", &["a"], true, 2);
    fetcher.page(2, "active", &["b"], false, 2);

    list.load("active").await;
    let control = list.load_more_control().unwrap();
    observer.report(control, 1.0);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!list.has_more());
    assert!(!list.is_auto_load_armed());
    assert!(observer.watched_controls().is_empty());
}

#[tokio::test]
async fn test_unsupported_observer_still_reaches_the_end() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let renderer = Arc::new(RecordingRenderer::default());
    let list = PaginatedList::with_observer(
        "headless",
        fetcher.clone(),
        renderer.clone(),
        Arc::new(NoViewport),
        ObserverOptions::default(),
    );
    fetcher.page(1, "active", &["a"], true, 3);
    fetcher.page(2, "active", &["b"], true, 3);
    fetcher.page(3, "active", &["c"], false, 3);

    list.load("active").await;
    assert!(list.load_more_control().is_some());
    assert!(!list.is_auto_load_armed());

    while list.has_more() {
        list.load_more().await;
    }
    assert_eq!(list.items(), vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_switch_disconnects_old_observer() {
    let (list, fetcher, _renderer, observer) = observed_list();
    fetcher.page(1, "x", &["x1"], true, 2);
    fetcher.page(1, "y", &["y1"], true, 2);

    list.load("x").await;
    let old = list.load_more_control().unwrap();
    list.load("y").await;
    let new = list.load_more_control().unwrap();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(observer.watched_controls(), vec![new]);
    assert!(!observer.report(old, 1.0));
}
