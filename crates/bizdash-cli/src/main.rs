//! bizdash - terminal front end for the business dashboard
//!
//! Browses the clients, products and reports lists of the dashboard backend:
//! - Interactive list browser with infinite scroll and detail overlays
//! - Scriptable `list` command with plain or JSON output

use anyhow::Result;
use clap::{Parser, Subcommand};

use bizdash_core::{paths, DashboardConfig, Entity, ListFilter, StatusFilter};

mod list_cmd;
mod tui;

/// bizdash - business dashboard in the terminal
#[derive(Parser)]
#[command(name = "bizdash")]
#[command(about = "Browse the business dashboard from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides config and BIZDASH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (overrides config and BIZDASH_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Theme name
    #[arg(long, default_value = "dashboard", global = true)]
    theme: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse a list interactively
    Browse {
        /// clients, products or reports
        #[arg(default_value = "clients")]
        entity: Entity,
    },

    /// Print a list
    List {
        /// clients, products or reports
        entity: Entity,

        /// active, inactive or all
        #[arg(long, default_value = "active")]
        status: StatusFilter,

        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        salesman: Option<String>,

        #[arg(long)]
        search: Option<String>,

        /// Keep loading pages until the list is exhausted
        #[arg(long)]
        all: bool,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it (including --api-url/--token overrides) to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Restore terminal state - called on panic or unexpected exit
fn restore_terminal() {
    use crossterm::{
        execute,
        terminal::{disable_raw_mode, LeaveAlternateScreen},
    };
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
}

/// Log to a file; stdout belongs to the TUI and to `list` output
fn init_logging() {
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let Ok(log_file) = std::fs::File::create(log_dir.join("bizdash.log")) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to restore terminal state
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    init_logging();

    let cli = Cli::parse();

    let mut config = DashboardConfig::load()?;
    config.apply_overrides(cli.api_url, cli.token);
    tracing::info!("Using backend {}", config.api_url);

    match cli.command {
        Some(Commands::List {
            entity,
            status,
            region,
            salesman,
            search,
            all,
            json,
        }) => {
            let mut filter = ListFilter::with_status(status);
            if let Some(region) = region {
                filter = filter.region(region);
            }
            if let Some(salesman) = salesman {
                filter = filter.salesman(salesman);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }
            let args = list_cmd::ListArgs {
                entity,
                filter,
                all,
                json,
            };
            list_cmd::run(&config, args).await?;
        }
        Some(Commands::Config { save }) => {
            let path = paths::config_file();
            if save {
                config.save_to(&path)?;
                tracing::info!("Saved config to {}", path.display());
            }
            println!("# {}", path.display());
            let mut shown = config.clone();
            if shown.token.is_some() {
                shown.token = Some("********".to_string());
            }
            print!("{}", toml::to_string_pretty(&shown)?);
        }
        Some(Commands::Browse { entity }) => {
            let theme = tui::Theme::by_name(&cli.theme);
            tracing::info!("Using theme: {}", theme.name);
            let mut app = tui::App::new(config, entity, theme)?;
            app.run().await?;
        }
        None => {
            let theme = tui::Theme::by_name(&cli.theme);
            let mut app = tui::App::new(config, Entity::Clients, theme)?;
            app.run().await?;
        }
    }

    Ok(())
}
