//! Scroll Lock - reference-counted background scroll gate
//!
//! Any number of overlays (stacked modals, fullscreen viewers) can ask for
//! background scrolling to be disabled. The first request saves the overflow
//! of both scroll roots and hides them; the last release restores exactly what
//! was saved. Releases without a matching acquire are ignored.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::constants::scroll::OVERFLOW_HIDDEN;

/// The two elements whose overflow controls page scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRoot {
    /// Document root
    Primary,
    /// Body / content root
    Secondary,
}

/// Style surface the lock mutates
pub trait ScrollRoots: Send {
    /// Current overflow value ("" when unset)
    fn overflow(&self, root: ScrollRoot) -> String;

    /// Set the overflow value
    fn set_overflow(&mut self, root: ScrollRoot, value: &str);
}

/// In-memory scroll roots for hosts without a style system, and for tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryScrollRoots {
    pub primary: String,
    pub secondary: String,
}

impl MemoryScrollRoots {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

impl ScrollRoots for MemoryScrollRoots {
    fn overflow(&self, root: ScrollRoot) -> String {
        match root {
            ScrollRoot::Primary => self.primary.clone(),
            ScrollRoot::Secondary => self.secondary.clone(),
        }
    }

    fn set_overflow(&mut self, root: ScrollRoot, value: &str) {
        match root {
            ScrollRoot::Primary => self.primary = value.to_string(),
            ScrollRoot::Secondary => self.secondary = value.to_string(),
        }
    }
}

/// Overflow values captured on the first acquire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SavedOverflow {
    primary: String,
    secondary: String,
}

struct LockState {
    count: usize,
    saved: Option<SavedOverflow>,
    roots: Box<dyn ScrollRoots>,
}

/// Reference-counted scroll lock service
///
/// Cheap to clone; clones share the same count and roots.
#[derive(Clone)]
pub struct ScrollLockManager {
    state: Arc<Mutex<LockState>>,
}

impl fmt::Debug for ScrollLockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLockManager")
            .field("lock_count", &self.lock_count())
            .finish()
    }
}

impl Default for ScrollLockManager {
    fn default() -> Self {
        Self::new(MemoryScrollRoots::default())
    }
}

impl ScrollLockManager {
    pub fn new(roots: impl ScrollRoots + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(LockState {
                count: 0,
                saved: None,
                roots: Box::new(roots),
            })),
        }
    }

    /// Request that background scrolling stay disabled
    pub fn acquire(&self, tag: &str) {
        let mut state = self.state.lock();
        if state.count == 0 {
            let saved = SavedOverflow {
                primary: state.roots.overflow(ScrollRoot::Primary),
                secondary: state.roots.overflow(ScrollRoot::Secondary),
            };
            state.saved = Some(saved);
            state.roots.set_overflow(ScrollRoot::Primary, OVERFLOW_HIDDEN);
            state.roots.set_overflow(ScrollRoot::Secondary, OVERFLOW_HIDDEN);
        }
        state.count += 1;
        debug!("Scroll disabled by: {}. Count: {}", tag, state.count);
    }

    /// Drop one request; the last one restores the saved overflow
    pub fn release(&self, tag: &str) {
        let mut state = self.state.lock();
        if state.count == 0 {
            warn!("Scroll release by {} without a matching acquire", tag);
            return;
        }
        state.count -= 1;
        if state.count > 0 {
            debug!("Scroll still disabled after release by: {}. Count: {}", tag, state.count);
            return;
        }

        let saved = state.saved.take().unwrap_or_default();
        state.roots.set_overflow(ScrollRoot::Primary, &saved.primary);
        state.roots.set_overflow(ScrollRoot::Secondary, &saved.secondary);
        debug!("Scroll enabled by: {}. Count is zero", tag);
    }

    /// Clear both roots and zero the count, discarding saved values
    ///
    /// Recovery path for an unpaired acquire. Not used by normal overlays.
    pub fn force_reset(&self) {
        let mut state = self.state.lock();
        state.roots.set_overflow(ScrollRoot::Primary, "");
        state.roots.set_overflow(ScrollRoot::Secondary, "");
        let dropped = std::mem::take(&mut state.count);
        state.saved = None;
        warn!("Scroll lock force reset ({} outstanding)", dropped);
    }

    /// Acquire and return a guard that releases exactly once
    pub fn guard(&self, tag: impl Into<String>) -> ScrollLockGuard {
        let tag = tag.into();
        self.acquire(&tag);
        ScrollLockGuard {
            manager: self.clone(),
            tag,
            released: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().count > 0
    }

    pub fn lock_count(&self) -> usize {
        self.state.lock().count
    }

    /// Current overflow of a root
    pub fn overflow(&self, root: ScrollRoot) -> String {
        self.state.lock().roots.overflow(root)
    }
}

/// Holds one scroll lock acquisition
///
/// Every dismissal path of an overlay should end in dropping (or explicitly
/// releasing) its guard; a second release is impossible.
#[must_use = "dropping the guard releases the scroll lock immediately"]
pub struct ScrollLockGuard {
    manager: ScrollLockManager,
    tag: String,
    released: bool,
}

impl ScrollLockGuard {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Release now instead of on drop
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.manager.release(&self.tag);
        }
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for ScrollLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLockGuard")
            .field("tag", &self.tag)
            .field("released", &self.released)
            .finish()
    }
}
