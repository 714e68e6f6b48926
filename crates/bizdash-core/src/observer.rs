//! Viewport observation for auto-load
//!
//! The paginated list asks an observer to watch its load-more control and
//! receives intersection ratios on a channel. Observation is optional: a list
//! without an observer (or whose observer refuses to start) is manual-only.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::constants;
use crate::error::ObserverError;

static NEXT_CONTROL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one rendered load-more control
///
/// Re-rendering the control produces a new id, so an observer armed on an old
/// position can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

impl ControlId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// When a visibility report counts as "in view"
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Minimum visible fraction, 0.0..=1.0
    pub threshold: f32,
    /// Extra distance around the viewport that counts as visible
    pub root_margin: u16,
    /// Wait between the signal and the load-more call
    pub debounce: Duration,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: constants::observer::THRESHOLD,
            root_margin: constants::observer::ROOT_MARGIN,
            debounce: constants::observer::DEBOUNCE,
        }
    }
}

impl ObserverOptions {
    pub fn is_in_view(&self, ratio: f32) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }
}

/// Source of intersection reports for a control
pub trait ViewportObserver: Send + Sync {
    /// Start watching `control`; ratios arrive on the returned receiver
    ///
    /// Dropping the receiver stops the observation.
    fn observe(
        &self,
        control: ControlId,
        options: &ObserverOptions,
    ) -> Result<mpsc::UnboundedReceiver<f32>, ObserverError>;
}

/// Observer driven by the host's layout pass
///
/// After laying out, the host calls [`ChannelObserver::report`] with how much
/// of each control is visible.
#[derive(Debug, Clone, Default)]
pub struct ChannelObserver {
    watched: Arc<Mutex<HashMap<ControlId, mpsc::UnboundedSender<f32>>>>,
}

impl ChannelObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an intersection ratio; returns false if nobody watches `control`
    pub fn report(&self, control: ControlId, ratio: f32) -> bool {
        let mut watched = self.watched.lock();
        let Some(tx) = watched.get(&control) else {
            return false;
        };
        if tx.send(ratio).is_err() {
            debug!("Observer for control {} disconnected", control.as_u64());
            watched.remove(&control);
            return false;
        }
        true
    }

    /// Whether `control` currently has a live watcher
    pub fn is_watching(&self, control: ControlId) -> bool {
        let mut watched = self.watched.lock();
        watched.retain(|_, tx| !tx.is_closed());
        watched.contains_key(&control)
    }

    /// Controls with a live watcher
    pub fn watched_controls(&self) -> Vec<ControlId> {
        let mut watched = self.watched.lock();
        watched.retain(|_, tx| !tx.is_closed());
        let mut ids: Vec<_> = watched.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl ViewportObserver for ChannelObserver {
    fn observe(
        &self,
        control: ControlId,
        _options: &ObserverOptions,
    ) -> Result<mpsc::UnboundedReceiver<f32>, ObserverError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watched = self.watched.lock();
        watched.retain(|_, tx| !tx.is_closed());
        watched.insert(control, tx);
        Ok(rx)
    }
}

/// Observer for hosts that cannot report visibility
#[derive(Debug, Clone, Copy, Default)]
pub struct NoViewport;

impl ViewportObserver for NoViewport {
    fn observe(
        &self,
        _control: ControlId,
        _options: &ObserverOptions,
    ) -> Result<mpsc::UnboundedReceiver<f32>, ObserverError> {
        Err(ObserverError::Unsupported("no viewport".into()))
    }
}

/// Fraction of `target` inside `viewport` grown by `margin` on both ends
///
/// Units are whatever the host lays out in (rows, pixels).
pub fn intersection_ratio(target: Range<usize>, viewport: Range<usize>, margin: usize) -> f32 {
    if target.is_empty() {
        return 0.0;
    }
    let start = viewport.start.saturating_sub(margin);
    let end = viewport.end.saturating_add(margin);
    let overlap_start = target.start.max(start);
    let overlap_end = target.end.min(end);
    if overlap_end <= overlap_start {
        return 0.0;
    }
    (overlap_end - overlap_start) as f32 / target.len() as f32
}
