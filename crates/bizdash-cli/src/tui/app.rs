//! Main application state and event loop

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bizdash_core::constants::scroll::OVERFLOW_HIDDEN;
use bizdash_core::observer::intersection_ratio;
use bizdash_core::{
    ApiClient, ChannelObserver, ControlId, DashboardConfig, Entity, ListClient, ListFilter,
    PaginatedList, Record, ScrollLockManager, ScrollRoot,
};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::tui::model::{SharedModel, TuiRenderer};
use crate::tui::overlay::{OverlayKind, OverlayStack};
use crate::tui::scroll::ListScroll;
use crate::tui::theme::Theme;

/// Pixels per terminal row when converting the observer root margin
const PIXELS_PER_ROW: u16 = 20;

/// Frame interval for polling model updates
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Keyboard input mode
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    /// Editing the search term
    Search(String),
}

/// One list view: the controller and the model it renders into
pub struct ListSession {
    pub entity: Entity,
    pub list: PaginatedList<Record, ListFilter>,
    pub model: SharedModel,
}

impl ListSession {
    fn new(
        config: &DashboardConfig,
        api: Arc<ApiClient>,
        entity: Entity,
        observer: &ChannelObserver,
    ) -> Self {
        let model = SharedModel::new();
        let fetcher = Arc::new(ListClient::<Record>::new(
            api,
            entity,
            config.page_sizes.clone(),
        ));
        let renderer = Arc::new(TuiRenderer::new(model.clone()));
        let list: PaginatedList<Record, ListFilter> = if config.auto_load.enabled {
            PaginatedList::with_observer(
                entity.key(),
                fetcher,
                renderer,
                Arc::new(observer.clone()),
                config.auto_load.observer_options(),
            )
        } else {
            PaginatedList::new(entity.key(), fetcher, renderer)
        };
        Self {
            entity,
            list,
            model,
        }
    }
}

pub struct App {
    pub config: DashboardConfig,
    pub theme: Theme,
    pub scroll_lock: ScrollLockManager,
    pub session: ListSession,
    pub filter: ListFilter,
    pub scroll: ListScroll,
    pub overlays: OverlayStack,
    pub input: InputMode,
    api: Arc<ApiClient>,
    observer: ChannelObserver,
    last_report: Option<(ControlId, f32)>,
    needs_redraw: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: DashboardConfig, entity: Entity, theme: Theme) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config)?);
        let observer = ChannelObserver::new();
        let scroll_lock = ScrollLockManager::default();
        let session = ListSession::new(&config, api.clone(), entity, &observer);

        Ok(Self {
            config,
            theme,
            overlays: OverlayStack::new(scroll_lock.clone()),
            scroll_lock,
            session,
            filter: ListFilter::default(),
            scroll: ListScroll::default(),
            input: InputMode::Normal,
            api,
            observer,
            last_report: None,
            needs_redraw: true,
            should_quit: false,
        })
    }

    /// Replace the current list view with a fresh one for `entity`
    pub fn open_list(&mut self, entity: Entity) {
        self.overlays.close_all();
        self.session.list.shutdown();
        self.session = ListSession::new(&self.config, self.api.clone(), entity, &self.observer);
        self.filter = ListFilter::default();
        self.scroll.reset();
        self.last_report = None;
        self.spawn_load();
    }

    /// Load page 1 for the current filter in the background
    ///
    /// Search, filter and inactive results arrive as one page that is never
    /// paged.
    pub fn spawn_load(&mut self) {
        self.scroll.reset();
        self.last_report = None;
        let list = self.session.list.clone();
        let filter = self.filter.clone();
        tracing::info!("Loading {} with filter: {}", self.session.entity, filter);
        tokio::spawn(async move {
            if filter.is_single_page() {
                list.load_single_page(filter).await;
            } else {
                list.load(filter).await;
            }
        });
    }

    /// Manual load-more, same entry point the observer uses
    pub fn spawn_load_more(&self) {
        let list = self.session.list.clone();
        tokio::spawn(async move { list.load_more().await });
    }

    /// Whether the list pane may scroll (overlays hide its overflow)
    pub fn list_scroll_enabled(&self) -> bool {
        self.scroll_lock.overflow(ScrollRoot::Primary) != OVERFLOW_HIDDEN
    }

    /// Pull model changes into the scroll state
    fn sync_model(&mut self) {
        if self.session.model.take_dirty() {
            let total = self.session.model.read(|m| m.row_count());
            self.scroll.set_total(total);
            self.needs_redraw = true;
        }
    }

    /// Tell the observer how much of the load-more row is on screen
    pub fn report_visibility(&mut self) {
        let margin = (self.config.auto_load.root_margin / PIXELS_PER_ROW) as usize;
        let report = self.session.model.read(|m| {
            let row = m.load_more?;
            let index = m.load_more_index()?;
            let ratio = intersection_ratio(index..index + 1, self.scroll.visible_range(), margin);
            Some((row.control, ratio))
        });
        let Some((control, ratio)) = report else {
            return;
        };
        if self.last_report == Some((control, ratio)) {
            return;
        }
        self.observer.report(control, ratio);
        self.last_report = Some((control, ratio));
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }
        if let InputMode::Search(_) = self.input {
            self.handle_search_key(code);
            return;
        }
        if code == KeyCode::Char('!') {
            self.scroll_lock.force_reset();
            return;
        }
        if !self.overlays.is_empty() {
            self.handle_overlay_key(code);
            return;
        }
        self.handle_list_key(code);
    }

    fn handle_overlay_key(&mut self, code: KeyCode) {
        let body_height = self.overlay_body_height();
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.overlays.close_top();
            }
            KeyCode::Char('i') => {
                let raw = match self.overlays.top().map(|o| &o.kind) {
                    Some(OverlayKind::Details(record)) => Some(record.clone()),
                    _ => None,
                };
                if let Some(record) = raw {
                    self.overlays.open(OverlayKind::Raw(record));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(top) = self.overlays.top_mut() {
                    top.scroll(1, body_height);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(top) = self.overlays.top_mut() {
                    top.scroll(-1, body_height);
                }
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('?') => self.overlays.open(OverlayKind::Help),
            KeyCode::Char('m') => self.spawn_load_more(),
            KeyCode::Char('r') => self.spawn_load(),
            KeyCode::Char('s') => {
                self.filter.status = self.filter.status.next();
                self.spawn_load();
            }
            KeyCode::Char('/') => {
                let current = self.filter.search.clone().unwrap_or_default();
                self.input = InputMode::Search(current);
            }
            KeyCode::Tab => {
                let next = Entity::ALL
                    .iter()
                    .position(|e| *e == self.session.entity)
                    .map(|i| Entity::ALL[(i + 1) % Entity::ALL.len()])
                    .unwrap_or(Entity::Clients);
                self.open_list(next);
            }
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Down | KeyCode::Char('j') if self.list_scroll_enabled() => self.scroll.next(),
            KeyCode::Up | KeyCode::Char('k') if self.list_scroll_enabled() => self.scroll.prev(),
            KeyCode::PageDown if self.list_scroll_enabled() => self.scroll.page_down(),
            KeyCode::PageUp if self.list_scroll_enabled() => self.scroll.page_up(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let InputMode::Search(ref mut term) = self.input else {
            return;
        };
        match code {
            KeyCode::Esc => self.input = InputMode::Normal,
            KeyCode::Enter => {
                let term = std::mem::take(term);
                self.input = InputMode::Normal;
                self.filter.search = Some(term).filter(|t| !t.trim().is_empty());
                self.spawn_load();
            }
            KeyCode::Backspace => {
                term.pop();
            }
            KeyCode::Char(c) => term.push(c),
            _ => {}
        }
    }

    /// Enter on a row: open its details, or load more on the load-more row
    fn activate_selected(&mut self) {
        let selected = self.scroll.selected;
        let action = self.session.model.read(|m| {
            if m.load_more_index() == Some(selected) {
                m.load_more.filter(|row| row.enabled).map(|_| None)
            } else {
                m.rows.get(selected).cloned().map(Some)
            }
        });
        match action {
            Some(Some(record)) => self.overlays.open(OverlayKind::Details(record)),
            Some(None) => self.spawn_load_more(),
            None => {}
        }
    }

    fn overlay_body_height(&self) -> usize {
        crossterm::terminal::size()
            .map(|(_, h)| crate::tui::ui::overlay_body_height(h))
            .unwrap_or(10)
    }

    fn quit(&mut self) {
        self.overlays.close_all();
        self.session.list.shutdown();
        self.should_quit = true;
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.spawn_load();
        let result = self.main_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    /// Main event loop
    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        loop {
            self.sync_model();

            if self.needs_redraw {
                terminal.draw(|f| crate::tui::ui::draw(f, self))?;
                self.needs_redraw = false;
                self.report_visibility();
            }

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key.code, key.modifiers);
                            self.needs_redraw = true;
                        }
                        Some(Ok(Event::Resize(_, _))) => self.needs_redraw = true,
                        Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                        None => self.quit(),
                        _ => {}
                    }
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }
}
