//! bizdash core - shared library for the business dashboard front ends
//!
//! This crate provides:
//! - A reference-counted scroll lock for stacked overlays
//! - A paginated list controller with manual and viewport-triggered load-more
//! - A REST client for the backend's clients/products/reports list endpoints
//! - Configuration and filesystem layout

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod observer;
pub mod pagination;
pub mod paths;
pub mod record;
pub mod scroll_lock;

// Re-exports for convenience
pub use api::{ApiClient, Entity, ListClient};
pub use config::DashboardConfig;
pub use error::{ConfigError, FetchError, ObserverError};
pub use filter::{ListFilter, StatusFilter};
pub use observer::{ChannelObserver, ControlId, ObserverOptions, ViewportObserver};
pub use pagination::{ListRenderer, PageFetcher, PageResult, PaginatedList, RenderMode};
pub use record::Record;
pub use scroll_lock::{MemoryScrollRoots, ScrollLockGuard, ScrollLockManager, ScrollRoot, ScrollRoots};
