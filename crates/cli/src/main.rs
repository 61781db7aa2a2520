//! HerOol CLI - Command-line front end for the service marketplace.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the session is kept under HEROOL_SESSION_DIR
//! herool login -e ana@example.com -p secreto --as customer
//!
//! # Post a request and follow the offers that come in
//! herool request create -s 1 -d "Fuga en el lavamanos" -l "Calle 10 #5-20"
//! herool watch customer
//!
//! # As a technician, bid on an open request
//! herool offer create -r 7 --price 50
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami`, `user` - Accounts
//! - `services` - Service catalog
//! - `request create|mine|open|by-service|show` - Requests
//! - `offer create|list|accept|reject` - Offers
//! - `watch customer|technician|request` - Poll a view and log every change

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use herool_client::controllers::{RequestDraft, TechnicianTab};
use herool_core::{OfferId, Price, RequestId, ServiceId, UserId, UserRole};

mod commands;
mod telemetry;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "herool")]
#[command(author, version, about = "HerOol service marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "HEROOL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Fail unless the account has this role (`customer` or `technician`)
        #[arg(long = "as")]
        role: Option<UserRole>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(short, long, env = "HEROOL_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation
        #[arg(long)]
        confirm: String,

        /// `customer` or `technician`
        #[arg(short, long, default_value = "customer")]
        role: UserRole,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show any user by id
    User { id: UserId },
    /// List the service catalog
    Services,
    /// Work with requests
    Request {
        #[command(subcommand)]
        action: RequestAction,
    },
    /// Work with offers
    Offer {
        #[command(subcommand)]
        action: OfferAction,
    },
    /// Poll a view and log every change until Ctrl-C
    Watch {
        #[command(subcommand)]
        view: WatchView,
    },
}

#[derive(Subcommand)]
enum RequestAction {
    /// Post a new request (customers)
    Create {
        #[arg(short, long)]
        service: ServiceId,

        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        location: String,

        #[arg(long, requires = "longitude")]
        latitude: Option<f64>,

        #[arg(long, requires = "latitude")]
        longitude: Option<f64>,
    },
    /// List my requests (customers)
    Mine,
    /// List every open request
    Open,
    /// List open requests for one service
    ByService { service: ServiceId },
    /// Show one request and its offers
    Show { id: RequestId },
}

#[derive(Subcommand)]
enum OfferAction {
    /// Bid on an open request (technicians)
    Create {
        #[arg(short, long)]
        request: RequestId,

        #[arg(long)]
        price: Price,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List offers on a request, or my own offers without `--request`
    List {
        #[arg(short, long)]
        request: Option<RequestId>,
    },
    /// Accept an offer (customers)
    Accept { id: OfferId },
    /// Reject an offer (customers)
    Reject { id: OfferId },
}

#[derive(Subcommand)]
enum WatchView {
    /// My requests and their offers
    Customer,
    /// Open requests or my offers
    Technician {
        #[arg(long, value_enum, default_value_t = TechnicianList::Requests)]
        list: TechnicianList,
    },
    /// One request and its offers
    Request { id: RequestId },
}

#[derive(Clone, Copy, ValueEnum)]
enum TechnicianList {
    Requests,
    Offers,
}

impl From<TechnicianList> for TechnicianTab {
    fn from(list: TechnicianList) -> Self {
        match list {
            TechnicianList::Requests => Self::Requests,
            TechnicianList::Offers => Self::Offers,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    let _sentry_guard = telemetry::init_sentry();
    telemetry::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::load()?;

    match cli.command {
        Commands::Login {
            email,
            password,
            role,
        } => commands::account::login(&ctx, &email, &password, role).await?,
        Commands::Register {
            name,
            email,
            phone,
            password,
            confirm,
            role,
        } => {
            commands::account::register(&ctx, name, email, phone, password, confirm, role).await?;
        }
        Commands::Logout => commands::account::logout(&ctx)?,
        Commands::Whoami => commands::account::whoami(&ctx)?,
        Commands::User { id } => commands::account::show_user(&ctx, id).await?,
        Commands::Services => commands::requests::services(&ctx).await?,
        Commands::Request { action } => match action {
            RequestAction::Create {
                service,
                description,
                location,
                latitude,
                longitude,
            } => {
                let draft = RequestDraft {
                    service_id: Some(service),
                    description,
                    location,
                    latitude,
                    longitude,
                };
                commands::requests::create(&ctx, draft).await?;
            }
            RequestAction::Mine => commands::requests::mine(&ctx).await?,
            RequestAction::Open => commands::requests::open(&ctx).await?,
            RequestAction::ByService { service } => {
                commands::requests::by_service(&ctx, service).await?;
            }
            RequestAction::Show { id } => commands::requests::show(&ctx, id).await?,
        },
        Commands::Offer { action } => match action {
            OfferAction::Create {
                request,
                price,
                description,
            } => commands::offers::create(&ctx, request, price, description).await?,
            OfferAction::List { request } => commands::offers::list(&ctx, request).await?,
            OfferAction::Accept { id } => commands::offers::accept(&ctx, id).await?,
            OfferAction::Reject { id } => commands::offers::reject(&ctx, id).await?,
        },
        Commands::Watch { view } => match view {
            WatchView::Customer => commands::watch::customer(&ctx).await?,
            WatchView::Technician { list } => {
                commands::watch::technician(&ctx, list.into()).await?;
            }
            WatchView::Request { id } => commands::watch::request(&ctx, id).await?,
        },
    }
    Ok(())
}
