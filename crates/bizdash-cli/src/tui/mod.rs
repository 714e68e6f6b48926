//! Terminal browser for the dashboard lists

pub mod app;
pub mod model;
pub mod overlay;
pub mod scroll;
pub mod theme;
pub mod ui;

// Re-exports
pub use app::App;
pub use theme::Theme;
