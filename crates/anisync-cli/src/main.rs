use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, ids, mapping, resolve};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "anisync")]
#[command(about = "anisync - Keep anime tracking lists in step with what you watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a library item to its AniDB id
    #[command(long_about = "Run identity resolution for a library item described as JSON (use '-' to read stdin) against the cached mapping table. With --bridge, also expand the AniDB id into ids for every catalog.")]
    Resolve {
        /// Path to the item JSON, or '-' for stdin
        #[arg(long, value_name = "FILE")]
        item: PathBuf,

        /// Also query the cross-catalog id bridge
        #[arg(long, action = ArgAction::SetTrue)]
        bridge: bool,
    },
    /// Look up the ids of an anime in every catalog
    Ids {
        #[arg(value_enum)]
        source: ids::SourceArg,

        id: u64,
    },
    /// Manage the AniDB to TVDB mapping table
    Mapping {
        #[command(subcommand)]
        cmd: MappingCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Keep the mapping table fresh in the background
    #[command(long_about = "Run in the foreground and refresh the mapping table every mapping.refresh_interval_hours. Stops on Ctrl-C.")]
    Daemon {
        /// Skip the refresh check on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_refresh: bool,

        /// Write logs to the rotating daemon log file instead of stderr
        #[arg(long, action = ArgAction::SetTrue)]
        log_to_file: bool,
    },
}

#[derive(Subcommand)]
enum MappingCommands {
    /// Download the mapping table now
    Refresh,
    /// Print the rows for an AniDB id
    Show { anidb_id: u32 },
    /// Print counts for the cached table
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon { log_to_file: true, .. } => {
            Some(anisync_config::PathManager::default().daemon_log_file())
        }
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Resolve { item, bridge } => resolve::run_resolve(item, bridge, &output).await,
        Commands::Ids { source, id } => ids::run_ids(source, id, &output).await,
        Commands::Mapping { cmd } => mapping::run_mapping(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
        Commands::Daemon {
            no_startup_refresh, ..
        } => daemon::run_daemon(no_startup_refresh, &output).await,
    };

    // Json consumers get a single error line instead of a report
    if let Err(e) = &result {
        if !output.is_human() {
            output.error(format!("{:#}", e));
            std::process::exit(1);
        }
    }
    result
}
