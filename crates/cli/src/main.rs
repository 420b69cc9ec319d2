//! Campick CLI - storefront and shop-owner console in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Store a token issued by the auth backend
//! campick login eyJhbGciOi...
//!
//! # Browse and fill the cart
//! campick shops
//! campick menu 12 --category Snacks
//! campick cart add 12 301 --quantity 2
//!
//! # Pay and place the order
//! campick checkout --screenshot ./payment.png
//!
//! # Owner console: follow incoming orders live
//! campick watch
//! campick orders status 88 preparing
//! campick orders payment-proof 88
//! campick stats
//! ```
//!
//! # Environment Variables
//!
//! See `campick_storefront::config` for the full list. `RUST_LOG` overrides
//! the default `campick=info` log filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use campick_core::{MenuItemId, OrderId, OrderStatus, PaymentStatus, ShopId};
use campick_storefront::api::{ProfileUpdate, ShopUpdate};
use campick_storefront::config::ClientConfig;
use campick_storefront::state::ClientState;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "campick")]
#[command(author, version, about = "Campus food ordering from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a token issued by the auth backend
    Login {
        /// Bearer token
        token: String,
    },
    /// Sign out and clear local state
    Logout,
    /// Show the current session
    Whoami,
    /// List shops
    Shops,
    /// Show a shop's menu
    Menu {
        /// Shop ID
        shop: ShopId,

        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Pay for the cart and place the order
    Checkout {
        /// Payment screenshot to upload
        #[arg(short, long, conflicts_with = "screenshot_url")]
        screenshot: Option<PathBuf>,

        /// Already-uploaded payment screenshot
        #[arg(long)]
        screenshot_url: Option<String>,

        /// Payment method (defaults to the shop's first method)
        #[arg(short, long)]
        method: Option<String>,
    },
    /// List and manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage your shop's menu
    MenuItem {
        #[command(subcommand)]
        action: MenuItemAction,
    },
    /// Open or close your shop
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
    /// Edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Sales dashboard (owners) or order history summary (shoppers)
    Stats {
        /// Shop to report on (owners; defaults to your own)
        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Follow order notifications live
    Watch {
        /// Shop to watch (owners; defaults to your own)
        #[arg(long)]
        shop: Option<ShopId>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a menu item
    Add {
        /// Shop ID
        shop: ShopId,

        /// Menu item ID
        item: MenuItemId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove one unit of an item
    Remove {
        /// Menu item ID
        item: MenuItemId,
    },
    /// Remove everything
    Empty,
    /// Empty the cart and start over with an item from another shop
    Replace {
        /// Shop ID
        shop: ShopId,

        /// Menu item ID
        item: MenuItemId,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders
    List {
        /// Only show orders with this status
        #[arg(short, long)]
        status: Option<OrderStatus>,

        /// Shop whose orders to list (owners; defaults to your own)
        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Show one order with its items
    Show {
        /// Order ID
        order: OrderId,
    },
    /// Set an order's status (`pending`, `preparing`, `accepted`, `delivered`, `rejected`, `discarded`)
    Status {
        /// Order ID
        order: OrderId,

        /// New status
        status: OrderStatus,

        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Set an order's payment status (`pending`, `verified`, `failed`)
    Payment {
        /// Order ID
        order: OrderId,

        /// New payment status
        status: PaymentStatus,

        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Show the payment screenshot and payer behind an order
    PaymentProof {
        /// Order ID
        order: OrderId,
    },
    /// Put a past order's items back in the cart
    Reorder {
        /// Order ID
        order: OrderId,
    },
}

#[derive(Subcommand)]
enum MenuItemAction {
    /// Add an item to the menu
    Add {
        #[command(flatten)]
        fields: MenuItemFields,

        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Edit a menu item; omitted fields keep their current value
    Update {
        /// Menu item ID
        item: MenuItemId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        image_url: Option<String>,

        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Remove an item from the menu
    Delete {
        /// Menu item ID
        item: MenuItemId,

        #[arg(long)]
        shop: Option<ShopId>,
    },
}

#[derive(clap::Args)]
struct MenuItemFields {
    /// Item name
    #[arg(short, long)]
    name: String,

    /// Item description
    #[arg(short, long)]
    description: String,

    /// Price, e.g. 45 or 45.50
    #[arg(short, long)]
    price: String,

    /// Menu category
    #[arg(short, long, default_value = "")]
    category: String,

    /// Image URL
    #[arg(long, default_value = "")]
    image_url: String,
}

#[derive(Subcommand)]
enum ShopAction {
    /// Start accepting orders
    Open {
        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Stop accepting orders
    Close {
        #[arg(long)]
        shop: Option<ShopId>,
    },
    /// Edit the shop profile and payout details; omitted fields are unchanged
    Edit {
        #[command(flatten)]
        fields: ShopFields,

        #[arg(long)]
        shop: Option<ShopId>,
    },
}

#[derive(clap::Args)]
struct ShopFields {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    image_url: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    contact_number: Option<String>,

    /// Account holder's full name
    #[arg(long)]
    full_name: Option<String>,

    #[arg(long)]
    account_title: Option<String>,

    /// Wallet the shop is paid through (`jazzcash`, `easypaisa`, `sadapay`, `nayapay`)
    #[arg(long)]
    payment_method: Option<String>,

    /// Account number or handle for the payment method
    #[arg(long)]
    payment_details: Option<String>,
}

impl From<ShopFields> for ShopUpdate {
    fn from(fields: ShopFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            image_url: fields.image_url,
            email: fields.email,
            contact_number: fields.contact_number,
            full_name: fields.full_name,
            account_title: fields.account_title,
            payment_method: fields.payment_method,
            payment_details: fields.payment_details,
        }
    }
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change your name, email or avatar
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        image_url: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Prefix match: covers campick_cli and campick_storefront
    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campick=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = match ClientState::open(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, state: &ClientState) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { token } => commands::session::login(state, &token)?,
        Commands::Logout => commands::session::logout(state),
        Commands::Whoami => commands::session::whoami(state).await?,
        Commands::Shops => commands::browse::shops(state).await?,
        Commands::Menu { shop, category } => {
            commands::browse::menu(state, &shop, category.as_deref()).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Add {
                shop,
                item,
                quantity,
            } => commands::cart::add(state, &shop, &item, quantity).await?,
            CartAction::Remove { item } => commands::cart::remove(state, &item),
            CartAction::Empty => commands::cart::empty(state),
            CartAction::Replace { shop, item } => {
                commands::cart::replace(state, &shop, &item).await?;
            }
        },
        Commands::Checkout {
            screenshot,
            screenshot_url,
            method,
        } => {
            let proof = match (screenshot, screenshot_url) {
                (Some(path), _) => commands::checkout::Proof::File(path),
                (None, Some(url)) => commands::checkout::Proof::Url(url),
                (None, None) => commands::checkout::Proof::None,
            };
            commands::checkout::checkout(state, proof, method).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status, shop } => {
                commands::orders::list(state, status, shop).await?;
            }
            OrdersAction::Show { order } => commands::orders::show(state, &order).await?,
            OrdersAction::Status {
                order,
                status,
                shop,
            } => commands::orders::set_status(state, &order, status, shop).await?,
            OrdersAction::Payment {
                order,
                status,
                shop,
            } => commands::orders::set_payment_status(state, &order, status, shop).await?,
            OrdersAction::PaymentProof { order } => {
                commands::orders::payment_proof(state, &order).await?;
            }
            OrdersAction::Reorder { order } => commands::orders::reorder(state, &order).await?,
        },
        Commands::MenuItem { action } => match action {
            MenuItemAction::Add { fields, shop } => {
                let draft = commands::owner::Draft {
                    name: Some(fields.name),
                    description: Some(fields.description),
                    price: Some(fields.price),
                    category: Some(fields.category),
                    image_url: Some(fields.image_url),
                };
                commands::owner::add_item(state, shop, draft).await?;
            }
            MenuItemAction::Update {
                item,
                name,
                description,
                price,
                category,
                image_url,
                shop,
            } => {
                let draft = commands::owner::Draft {
                    name,
                    description,
                    price,
                    category,
                    image_url,
                };
                commands::owner::update_item(state, shop, &item, draft).await?;
            }
            MenuItemAction::Delete { item, shop } => {
                commands::owner::delete_item(state, shop, &item).await?;
            }
        },
        Commands::Shop { action } => match action {
            ShopAction::Open { shop } => commands::owner::set_open(state, shop, true).await?,
            ShopAction::Close { shop } => commands::owner::set_open(state, shop, false).await?,
            ShopAction::Edit { fields, shop } => {
                commands::owner::edit_shop(state, shop, fields.into()).await?;
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                name,
                email,
                image_url,
            } => {
                let update = ProfileUpdate {
                    user_name: name,
                    email,
                    image_url,
                };
                commands::session::update_profile(state, update).await?;
            }
        },
        Commands::Stats { shop } => commands::stats::stats(state, shop).await?,
        Commands::Watch { shop } => commands::watch::watch(state, shop).await?,
    }
    Ok(())
}
