//! Modal overlays
//!
//! Each open overlay owns a scroll lock guard. Every way of closing an overlay
//! (Esc, q, switching lists, quitting) pops it off the stack, and popping drops
//! the guard, so each overlay releases the lock exactly once.

use bizdash_core::{Record, ScrollLockGuard, ScrollLockManager};

/// What an overlay shows
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayKind {
    /// Field list for one record
    Details(Record),
    /// Pretty-printed JSON, opened from the details overlay
    Raw(Record),
    /// Key bindings
    Help,
}

impl OverlayKind {
    fn tag(&self) -> String {
        match self {
            OverlayKind::Details(record) => format!("details:{}", record.title()),
            OverlayKind::Raw(record) => format!("raw:{}", record.title()),
            OverlayKind::Help => "help".to_string(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            OverlayKind::Details(record) => record.title(),
            OverlayKind::Raw(record) => format!("{} (json)", record.title()),
            OverlayKind::Help => "Keys".to_string(),
        }
    }

    /// Lines of body text
    pub fn lines(&self) -> Vec<String> {
        match self {
            OverlayKind::Details(record) => record
                .scalar_fields()
                .into_iter()
                .map(|(key, value)| format!("{:<20} {}", key, value))
                .collect(),
            OverlayKind::Raw(record) => serde_json::to_string_pretty(record.fields())
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect(),
            OverlayKind::Help => HELP_LINES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

const HELP_LINES: &[&str] = &[
    "j/k, arrows     move",
    "PgUp/PgDn       page",
    "Enter           open row / load more",
    "m               load more",
    "/               search",
    "s               cycle status",
    "Tab             next list",
    "r               reload",
    "i               raw json (in details)",
    "!               reset scroll lock",
    "Esc             close overlay",
    "q               close overlay / quit",
];

/// An open overlay and the lock it holds
#[derive(Debug)]
pub struct Overlay {
    pub kind: OverlayKind,
    /// Body scroll offset
    pub offset: usize,
    _lock: ScrollLockGuard,
}

impl Overlay {
    pub fn scroll(&mut self, delta: isize, body_height: usize) {
        let max = self.kind.lines().len().saturating_sub(body_height);
        let target = (self.offset as isize + delta).clamp(0, max as isize);
        self.offset = target as usize;
    }
}

/// Stack of open overlays, topmost last
#[derive(Debug)]
pub struct OverlayStack {
    scroll_lock: ScrollLockManager,
    stack: Vec<Overlay>,
}

impl OverlayStack {
    pub fn new(scroll_lock: ScrollLockManager) -> Self {
        Self {
            scroll_lock,
            stack: Vec::new(),
        }
    }

    pub fn open(&mut self, kind: OverlayKind) {
        let lock = self.scroll_lock.guard(kind.tag());
        self.stack.push(Overlay {
            kind,
            offset: 0,
            _lock: lock,
        });
    }

    /// Close the topmost overlay; false if none was open
    pub fn close_top(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    pub fn close_all(&mut self) {
        while self.close_top() {}
    }

    pub fn top(&self) -> Option<&Overlay> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Overlay> {
        self.stack.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.stack.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
