//! Wildenflower CLI - drive the cart session from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart (recovering it if Shopify expired it)
//! wf-cli cart show
//!
//! # Add two of a variant, then change a line's quantity
//! wf-cli cart add gid://shopify/ProductVariant/123 -q 2
//! wf-cli cart update gid://shopify/CartLine/abc 1
//!
//! # Save a product by handle
//! wf-cli favorites toggle wild-violet-print
//!
//! # Browse the catalog
//! wf-cli products --first 10
//! wf-cli collections show prints
//! ```
//!
//! State is stored under `WILDENFLOWER_DATA_DIR` (default `.wildenflower`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wildenflower_storefront::config::{CheckoutMode, ConfigError, StorefrontConfig};
use wildenflower_storefront::shopify::ShopifyError;
use wildenflower_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "wf-cli")]
#[command(author, version, about = "Wildenflower storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage saved products
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List catalog products
    Products {
        /// Page size
        #[arg(long, default_value_t = 20)]
        first: i64,

        /// Cursor from a previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// Browse catalog collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    /// List collections
    List {
        /// Page size
        #[arg(long, default_value_t = 20)]
        first: i64,

        /// Cursor from a previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// Show a collection's products
    Show {
        /// Collection handle
        handle: String,

        /// Products per page
        #[arg(long, default_value_t = 20)]
        first: i64,

        /// Cursor from a previous page
        #[arg(long)]
        after: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product variant
    Add {
        /// Variant GID (gid://shopify/ProductVariant/...)
        variant: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line GID (gid://shopify/CartLine/...)
        line: String,
    },
    /// Set a cart line's quantity (0 removes it)
    Update {
        /// Cart line GID
        line: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Forget the local cart
    Clear,
    /// Open hosted checkout
    Checkout,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List saved products
    List,
    /// Save or unsave a product by handle
    Toggle {
        /// Product handle
        handle: String,
    },
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} failed, cart left unchanged")]
    Rejected(&'static str),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wildenflower_storefront=info,wildenflower_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// A terminal has no page to replace, so checkout always opens externally.
fn terminal_config(mut config: StorefrontConfig) -> StorefrontConfig {
    if config.checkout_mode == CheckoutMode::Redirect {
        tracing::warn!("CHECKOUT_MODE=redirect needs an embedding shell, opening checkout externally");
        config.checkout_mode = CheckoutMode::External;
    }
    config
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let state = AppState::new(terminal_config(config))?;

    match cli.command {
        Commands::Cart { action } => {
            let session = state.cart();
            session.hydrate().await;

            match action {
                CartAction::Show => commands::cart::show(session),
                CartAction::Add { variant, quantity } => {
                    commands::cart::add(session, variant, quantity).await?;
                }
                CartAction::Remove { line } => commands::cart::remove(session, line).await?,
                CartAction::Update { line, quantity } => {
                    commands::cart::update(session, line, quantity).await?;
                }
                CartAction::Clear => commands::cart::clear(session).await,
                CartAction::Checkout => commands::cart::checkout(session)?,
            }
        }
        Commands::Favorites { action } => {
            state.favorites().load().await;

            match action {
                FavoritesAction::List => commands::favorites::list(state.favorites()).await,
                FavoritesAction::Toggle { handle } => {
                    commands::favorites::toggle(state.storefront(), state.favorites(), &handle)
                        .await?;
                }
            }
        }
        Commands::Products { first, after } => {
            commands::products::list(state.storefront(), first, after).await?;
        }
        Commands::Collections { action } => match action {
            CollectionsAction::List { first, after } => {
                commands::collections::list(state.storefront(), first, after).await?;
            }
            CollectionsAction::Show {
                handle,
                first,
                after,
            } => {
                commands::collections::show(state.storefront(), &handle, first, after).await?;
            }
        },
    }
    Ok(())
}
