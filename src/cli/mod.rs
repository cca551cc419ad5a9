pub mod dedup;
pub mod record;
pub mod summary;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use dedup::{process_dedup_command, DedupCommand};
use record::{
    process_add_command, process_delay_command, process_records_command, AddCommand, DelayCommand,
    RecordsCommand,
};
use summary::{process_details_command, process_summary_command, DetailsCommand, SummaryCommand};
use tokio::io;
use tracing::level_filters::LevelFilter;

use crate::{storage::store::JsonStore, utils::logging::enable_logging};

#[derive(Parser, Debug)]
#[command(name = "Perftrack", version, long_about = None)]
#[command(about = "Track task durations against target times", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Add a performance record for today")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Record a delay for today's task")]
    Delay {
        #[command(flatten)]
        command: DelayCommand,
    },
    #[command(about = "List stored performance records")]
    Records {
        #[command(flatten)]
        command: RecordsCommand,
    },
    #[command(about = "Show average performance over a day, week or month")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "Break a period down into its records, days or weeks")]
    Details {
        #[command(flatten)]
        command: DetailsCommand,
    },
    #[command(about = "Find and optionally remove duplicate records")]
    Dedup {
        #[command(flatten)]
        command: DedupCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let application_path = create_application_default_path()?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&application_path, logging_level, args.log)?;

    let store = JsonStore::new(application_path.join("store"))?;

    match args.commands {
        Commands::Add { command } => process_add_command(&store, command).await,
        Commands::Delay { command } => process_delay_command(&store, command).await,
        Commands::Records { command } => process_records_command(&store, command).await,
        Commands::Summary { command } => process_summary_command(&store, command).await,
        Commands::Details { command } => process_details_command(&store, command).await,
        Commands::Dedup { command } => process_dedup_command(&store, command).await,
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("perftrack");
            path
        }
        #[cfg(target_os = "linux")]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("perftrack");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
