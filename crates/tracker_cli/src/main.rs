//! Parcel tracker command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, open the tracker database and build the service.
//! - Map subcommands onto `ParcelService` actions and print notifications.

use clap::{Parser, Subcommand};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracker_core::db::open_db;
use tracker_core::{
    init_logging, ClientId, LogNotifier, ParcelEvent, ParcelNotifier, ParcelNumber,
    ParcelService, ParcelStore, RepoError, SqliteParcelStore, TrackerConfig,
};

const DEMO_CLIENT: ClientId = 1;
const DEMO_ADDRESS: &str = "Pskov, Pushkina st., Kolotushkina bld. 5";
const DEMO_NEW_ADDRESS: &str = "Saratov, Verkhnie Zori, Kozlova st., bld. 25";

#[derive(Debug, Parser)]
#[command(name = "parcel-tracker", version, about = "Track shipped parcels")]
struct Cli {
    /// SQLite database file (env: PARCEL_TRACKER_DB).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error (env: PARCEL_TRACKER_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (env: PARCEL_TRACKER_LOG_DIR).
    /// Without it, log events go to stderr.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new parcel.
    Register {
        #[arg(long)]
        client: ClientId,
        #[arg(long)]
        address: String,
    },
    /// List the parcels of a client.
    List {
        #[arg(long)]
        client: ClientId,
    },
    /// Show one parcel.
    Show { number: ParcelNumber },
    /// Advance a parcel to its next status.
    NextStatus { number: ParcelNumber },
    /// Change the address of a registered parcel.
    ChangeAddress {
        number: ParcelNumber,
        address: String,
    },
    /// Delete a registered parcel.
    Delete { number: ParcelNumber },
    /// Run the register / re-address / send / delete walkthrough.
    Demo,
}

/// Prints every event to stdout and forwards it to the log.
struct ConsoleNotifier;

impl ParcelNotifier for ConsoleNotifier {
    fn notify(&self, event: &ParcelEvent) {
        LogNotifier.notify(event);
        println!("{event}");
        if matches!(event, ParcelEvent::ClientListing { .. }) {
            println!();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = resolve_config(&cli).map_err(|err| err.to_string())?;
    init_logging(config.log_level(), config.log_sink.clone())?;

    let conn = open_db(&config.db_path).map_err(|err| {
        format!(
            "failed to open database `{}`: {err}",
            config.db_path.display()
        )
    })?;
    let service = ParcelService::with_notifier(SqliteParcelStore::new(&conn), ConsoleNotifier);

    execute(&service, cli.command.unwrap_or(Command::Demo)).map_err(|err| {
        error!("event=cli_command module=cli status=error error={err}");
        err.to_string()
    })
}

fn execute<S: ParcelStore, N: ParcelNotifier>(
    service: &ParcelService<S, N>,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Register { client, address } => {
            service.register(client, address)?;
        }
        Command::List { client } => {
            service.print_client_parcels(client)?;
        }
        Command::Show { number } => {
            let parcel = service.parcel(number)?;
            println!(
                "Parcel #{} to {} from client {} registered at {}, status {}",
                parcel.number, parcel.address, parcel.client, parcel.created_at, parcel.status
            );
        }
        Command::NextStatus { number } => {
            service.next_status(number)?;
        }
        Command::ChangeAddress { number, address } => service.change_address(number, &address)?,
        Command::Delete { number } => service.delete(number)?,
        Command::Demo => run_demo(service)?,
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<TrackerConfig, tracker_core::ConfigError> {
    let mut config = TrackerConfig::from_env()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone())?;
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir)?;
    }
    Ok(config)
}

fn run_demo<S: ParcelStore, N: ParcelNotifier>(
    service: &ParcelService<S, N>,
) -> Result<(), Box<dyn Error>> {
    let parcel = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    service.change_address(parcel.number, DEMO_NEW_ADDRESS)?;
    service.next_status(parcel.number)?;
    service.print_client_parcels(DEMO_CLIENT)?;

    // A sent parcel must stay in place.
    match service.delete(parcel.number) {
        Err(err @ RepoError::NotRegistered { .. }) => println!("{err}"),
        Err(err) => return Err(err.into()),
        Ok(()) => {
            return Err(format!("sent parcel #{} was deleted", parcel.number).into());
        }
    }
    service.print_client_parcels(DEMO_CLIENT)?;

    let parcel = service.register(DEMO_CLIENT, DEMO_ADDRESS)?;
    service.delete(parcel.number)?;
    service.print_client_parcels(DEMO_CLIENT)?;
    Ok(())
}
