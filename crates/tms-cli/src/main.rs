mod approve;
mod display;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tms_core::TmsConfig;
use tms_engine::{
    Actor, PaymentDesk, PaymentRequest, StatusGuard, StatusRequest, UploadedFile, attach,
    record_call, seed,
};
use tms_store::{FileStore, KvStore, Repository};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "tms",
    version,
    about = "Contract ledger: payments, monthly receipts, and approved status changes"
)]
struct Cli {
    /// Directory (or database file) holding the store.
    #[arg(long, env = "TMS_DATA_DIR", default_value = ".tms", global = true)]
    data_dir: PathBuf,

    #[arg(long, value_enum, env = "TMS_BACKEND", default_value_t = Backend::Files, global = true)]
    backend: Backend,

    /// JSON config file; absent keys keep their defaults.
    #[arg(long, env = "TMS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Overrides `receipt_prefix` from the config.
    #[arg(long, env = "TMS_RECEIPT_PREFIX", global = true)]
    receipt_prefix: Option<String>,

    /// Overrides `approver_password` from the config.
    #[arg(long, env = "TMS_APPROVER_PASSWORD", hide_env_values = true, global = true)]
    approver_password: Option<String>,

    /// Name recorded in the status change log.
    #[arg(long, env = "TMS_ACTOR", default_value = "operator", global = true)]
    actor: String,

    /// Act as administrator: status changes skip the approval prompt.
    #[arg(long, global = true)]
    admin: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// One JSON file per key under the data directory.
    Files,
    /// A DuckDB database file at the data directory path.
    #[cfg(feature = "duckdb")]
    Duckdb,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write demo contracts into an empty store.
    Init {
        /// Replace existing contracts.
        #[arg(long)]
        force: bool,
    },
    /// List contracts.
    Contracts,
    /// Show one contract with its payments and attachments.
    Show { id: String },
    /// Record a payment, optionally issuing a receipt.
    Pay {
        id: String,
        #[arg(long)]
        amount: f64,
        #[arg(long = "type", default_value = "bill")]
        kind: String,
        /// Issue a receipt number for this payment.
        #[arg(long)]
        receipt: bool,
    },
    /// Change a contract's status (asks for the approver password unless --admin).
    Status { id: String, status: String },
    /// Attach a file already stored by the upload service.
    Attach {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        size: u64,
    },
    /// Log a call to the contract's customer.
    Call { id: String },
    /// Show the status change log.
    Log,
    /// List registered assets.
    Assets,
    /// Show receipt counters per month.
    Receipts,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("tms v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    match cli.backend {
        Backend::Files => {
            let store = FileStore::open(&cli.data_dir)
                .with_context(|| format!("opening store at {}", cli.data_dir.display()))?;
            run(&cli, &config, Repository::new(store))
        }
        #[cfg(feature = "duckdb")]
        Backend::Duckdb => {
            let store = tms_store::DuckStore::open_persistent(&cli.data_dir)
                .with_context(|| format!("opening duckdb at {}", cli.data_dir.display()))?;
            run(&cli, &config, Repository::new(store))
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TmsConfig> {
    let mut config = match &cli.config {
        Some(path) => TmsConfig::from_json_file(path)?,
        None => TmsConfig::default(),
    };
    if let Some(prefix) = &cli.receipt_prefix {
        config.receipt_prefix = prefix.clone();
    }
    if let Some(password) = &cli.approver_password {
        config.approver_password = password.clone();
    }
    Ok(config)
}

fn run<S: KvStore>(cli: &Cli, config: &TmsConfig, repo: Repository<S>) -> anyhow::Result<()> {
    match &cli.command {
        Command::Init { force } => match seed(&repo, *force)? {
            0 => println!("Store already has contracts; use --force to replace them."),
            n => println!("Seeded {n} demo contracts."),
        },
        Command::Contracts => display::print_contract_table(&repo.contracts()?),
        Command::Show { id } => {
            let contract = repo
                .find_contract(id)?
                .with_context(|| format!("contract {id} not found"))?;
            display::print_contract_card(&contract);
        }
        Command::Pay {
            id,
            amount,
            kind,
            receipt,
        } => {
            let desk = PaymentDesk::new(&repo, config.receipt_prefix.as_str());
            let request = PaymentRequest {
                amount: *amount,
                kind: kind.clone(),
                request_receipt: *receipt,
            };
            // Receipt months follow the operator's local calendar.
            let payment = desk.submit(id, &request, &Local::now())?;
            match payment.receipt {
                Some(no) => println!("Recorded {:.2} on {id}, receipt {no}", payment.amount),
                None => println!("Recorded {:.2} on {id}", payment.amount),
            }
        }
        Command::Status { id, status } => {
            let actor = if cli.admin {
                Actor::admin(cli.actor.as_str())
            } else {
                Actor::staff(cli.actor.as_str())
            };
            let guard = StatusGuard::new(&repo, config.approver_secret());
            match guard.request_status_change(id, status, &actor, Utc::now())? {
                StatusRequest::Unchanged(current) => println!("{id} is already {current}"),
                StatusRequest::Applied(change) => display::print_status_change(&change),
                StatusRequest::AwaitingApproval(mut pending) => {
                    let stdin = std::io::stdin();
                    let approved = approve::prompt(
                        &guard,
                        &mut pending,
                        config.max_attempts,
                        stdin.lock(),
                        std::io::stderr(),
                    )?;
                    if let Some(change) = approved {
                        display::print_status_change(&change);
                    }
                }
            }
        }
        Command::Attach {
            id,
            name,
            url,
            size,
        } => {
            let file = UploadedFile {
                name: name.clone(),
                url: url.clone(),
                size: *size,
            };
            let attachment = attach(&repo, id, file, Utc::now())?;
            println!("Attached {} to {id}", attachment.name);
        }
        Command::Call { id } => {
            let entry = record_call(&repo, id, Utc::now())?;
            println!("Logged call to {} ({})", entry.customer, entry.phone);
        }
        Command::Log => display::print_status_log(&repo.status_log()?),
        Command::Assets => display::print_assets(&repo.assets()?),
        Command::Receipts => display::print_counters(&config.receipt_prefix, &repo.counters()?),
    }
    Ok(())
}
