use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use decor_booking::application::Marketplace;
use decor_booking::application::gateway::Gateway;
use decor_booking::config::Settings;
use decor_booking::domain::booking::{BookingFilter, BookingPatch, BookingStatus, NewBooking, PaymentStatus};
use decor_booking::domain::ports::RecordStoreRef;
use decor_booking::domain::record::RecordId;
use decor_booking::domain::user::{AccountStatus, Role};
use decor_booking::infrastructure::identity::StaticTokenVerifier;
use decor_booking::infrastructure::in_memory::InMemoryRecordStore;
use decor_booking::infrastructure::payment::SimulatedProcessor;
use decor_booking::interfaces::seed::SeedData;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(long, env = "DECOR_BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file of users, decorators, services and bookings loaded before the command runs
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Path to persistent database. If omitted, records live in memory.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List users, newest first
    Users {
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// List decorator profiles
    Decorators {
        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// Active decorators ranked by rating
    TopDecorators {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List catalog services
    Services {
        #[arg(long)]
        category: Option<String>,
    },
    /// List bookings, newest first
    Bookings {
        /// Requester email
        #[arg(long)]
        user: Option<String>,
        /// Assigned decorator profile id
        #[arg(long)]
        decorator: Option<RecordId>,
    },
    /// List recorded payments
    Payments {
        #[arg(long)]
        user: Option<String>,
    },
    /// Change a user's role and provision their decorator profile
    SetRole { user_id: RecordId, role: Role },
    /// Create a pending booking
    Book {
        #[arg(long)]
        user: String,
        #[arg(long)]
        service: RecordId,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        mobile: String,
    },
    /// Apply a partial update to a booking
    UpdateBooking {
        booking_id: RecordId,
        #[arg(long)]
        status: Option<BookingStatus>,
        #[arg(long)]
        payment_status: Option<PaymentStatus>,
        #[arg(long)]
        decorator: Option<RecordId>,
        #[arg(long)]
        transaction_id: Option<String>,
    },
    /// Open a payment intent for an amount in major units
    InitiatePayment { amount: Decimal },
    /// Create and confirm a charge with a payment method reference
    Charge {
        #[arg(long)]
        method: String,
        amount: Decimal,
    },
    /// Create missing decorator profiles for decorator-role users
    Reconcile,
    /// Register or log in the account behind a configured credential
    SignIn {
        #[arg(long, env = "DECOR_BOOKING_TOKEN")]
        token: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let store = open_store(&cli)?;
    let market = Marketplace::new(store, Arc::new(SimulatedProcessor::new()), &settings);

    if let Some(seed) = &cli.seed {
        let file = File::open(seed).into_diagnostic()?;
        SeedData::from_reader(file)?.load_into(&market.records).await?;
    }

    match cli.command {
        Command::Users { role, status } => emit(&market.queries.list_users(role, status).await?),
        Command::Decorators { status } => emit(&market.queries.list_decorators(status).await?),
        Command::TopDecorators { limit } => emit(&market.queries.top_decorators(limit).await?),
        Command::Services { category } => {
            emit(&market.catalog.list_services(category.as_deref()).await?)
        }
        Command::Bookings { user, decorator } => {
            let filter = BookingFilter {
                user_id: user,
                assigned_decorator_id: decorator,
            };
            emit(&market.bookings.list_bookings(&filter).await?)
        }
        Command::Payments { user } => emit(&market.queries.list_payments(user.as_deref()).await?),
        Command::SetRole { user_id, role } => {
            emit(&market.provisioning.set_user_role(user_id, role).await?)
        }
        Command::Book {
            user,
            service,
            date,
            location,
            mobile,
        } => {
            let request = NewBooking {
                user_id: user,
                service_id: service,
                booking_date: date,
                event_location: location,
                mobile_number: mobile,
            };
            emit(&market.bookings.create_booking(request).await?)
        }
        Command::UpdateBooking {
            booking_id,
            status,
            payment_status,
            decorator,
            transaction_id,
        } => {
            let patch = BookingPatch {
                status,
                payment_status,
                assigned_decorator_id: decorator,
                transaction_id,
                ..Default::default()
            };
            emit(&market.bookings.update_booking(booking_id, patch).await?)
        }
        Command::InitiatePayment { amount } => {
            emit(&market.bookings.initiate_payment(amount).await?)
        }
        Command::Charge { method, amount } => {
            emit(&market.bookings.charge_and_record(&method, amount).await?)
        }
        Command::Reconcile => emit(&market.provisioning.reconcile_decorator_profiles().await?),
        Command::SignIn { token, name } => {
            let verifier = StaticTokenVerifier::from_credentials(&settings.credentials);
            let gateway = Gateway::new(market, Arc::new(verifier));
            emit(&gateway.sign_in(&token, name, None).await?)
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(cli: &Cli) -> Result<RecordStoreRef> {
    use decor_booking::infrastructure::rocksdb::RocksDbRecordStore;

    match &cli.db_path {
        Some(path) => Ok(Arc::new(RocksDbRecordStore::open(path)?)),
        None => Ok(Arc::new(InMemoryRecordStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(_cli: &Cli) -> Result<RecordStoreRef> {
    Ok(Arc::new(InMemoryRecordStore::new()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value).into_diagnostic()?;
    println!();
    Ok(())
}
