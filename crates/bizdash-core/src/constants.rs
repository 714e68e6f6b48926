//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Whole-request timeout for list fetches
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default backend base URL (the dashboard backend listens on 5009)
    pub const DEFAULT_API_URL: &str = "http://localhost:5009/api";

    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("bizdash/", env!("CARGO_PKG_VERSION"));
}

/// Pagination defaults
pub mod pagination {
    /// Page size for clients and products while browsing
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Visit reports are heavier and use smaller pages
    pub const REPORT_PAGE_SIZE: u32 = 15;

    /// Page size for search and filter results, which are fetched as one page
    pub const SINGLE_PAGE_SIZE: u32 = 500;
}

/// Viewport observer defaults for auto-load
pub mod observer {
    use super::*;

    /// Minimum visible fraction of the load-more control that triggers auto-load
    pub const THRESHOLD: f32 = 0.1;

    /// Distance outside the viewport at which the control counts as visible
    pub const ROOT_MARGIN: u16 = 100;

    /// Delay between the visibility signal and the load-more call
    pub const DEBOUNCE: Duration = Duration::from_millis(100);
}

/// Scroll lock values
pub mod scroll {
    /// Overflow value applied to both scroll roots while locked
    pub const OVERFLOW_HIDDEN: &str = "hidden";
}

/// Filesystem layout
pub mod fs {
    /// Config directory name (under the home directory)
    pub const CONFIG_DIR_NAME: &str = ".bizdash";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Logs subdirectory name
    pub const LOGS_DIR_NAME: &str = "logs";
}

/// Environment variable names
pub mod env {
    /// Overrides the configured API base URL
    pub const API_URL: &str = "BIZDASH_API_URL";

    /// Overrides the configured bearer token
    pub const TOKEN: &str = "BIZDASH_TOKEN";
}
