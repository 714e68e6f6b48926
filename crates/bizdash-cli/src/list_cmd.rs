//! Non-interactive `bizdash list`

use std::sync::Arc;

use anyhow::{bail, Result};
use bizdash_core::{
    ApiClient, DashboardConfig, Entity, FetchError, ListClient, ListFilter, ListRenderer,
    PaginatedList, Record, RenderMode,
};
use parking_lot::Mutex;

/// Prints pages to stdout as they arrive and remembers the last error
struct PrintRenderer {
    quiet: bool,
    error: Mutex<Option<String>>,
}

impl PrintRenderer {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            error: Mutex::new(None),
        }
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}

impl ListRenderer<Record> for PrintRenderer {
    fn render_page(&self, items: &[Record], _mode: RenderMode) {
        if self.quiet {
            return;
        }
        for record in items {
            let id = record.id().map(|id| format!("#{}", id)).unwrap_or_default();
            println!("{:>6}  {}", id, record.title());
        }
    }

    fn render_loading(&self) {}

    fn render_empty(&self) {
        if !self.quiet {
            println!("No records");
        }
    }

    fn on_error(&self, error: &FetchError) {
        *self.error.lock() = Some(error.to_string());
    }
}

/// Options for one `list` run
pub struct ListArgs {
    pub entity: Entity,
    pub filter: ListFilter,
    pub all: bool,
    pub json: bool,
}

pub async fn run(config: &DashboardConfig, args: ListArgs) -> Result<()> {
    let api = Arc::new(ApiClient::new(config)?);
    let fetcher = Arc::new(ListClient::<Record>::new(
        api,
        args.entity,
        config.page_sizes.clone(),
    ));
    let renderer = Arc::new(PrintRenderer::new(args.json));
    let list: PaginatedList<Record, ListFilter> =
        PaginatedList::new(args.entity.key(), fetcher, renderer.clone());

    tracing::info!("Listing {} with filter: {}", args.entity, args.filter);
    let single_page = args.filter.is_single_page();
    if single_page {
        list.load_single_page(args.filter.clone()).await;
    } else {
        list.load(args.filter.clone()).await;
    }
    if let Some(error) = renderer.take_error() {
        bail!("failed to load {}: {}", args.entity, error);
    }

    if args.all && !single_page {
        while list.has_more() {
            let before = list.len();
            list.load_more().await;
            if let Some(error) = renderer.take_error() {
                bail!(
                    "failed to load page {} of {}: {}",
                    list.current_page() + 1,
                    args.entity,
                    error
                );
            }
            if list.len() == before {
                tracing::warn!("Server reported more {} but sent none", args.entity);
                break;
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&list.items())?);
    } else {
        eprintln!(
            "{} of {} {}{}",
            list.len(),
            list.total_count(),
            args.entity,
            if list.has_more() && !single_page {
                " (--all for the rest)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
