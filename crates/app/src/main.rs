//! hardd - Hard money market host

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use hard_app::{module_bank, query, AppConfig, AppContext, AppError, AppGenesis};
use hard_core::FixedPriceFeed;
use hard_incentive::RewardsRequest;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "hardd")]
#[command(about = "Hard - money market and incentive host", long_about = None)]
struct Cli {
    /// JSON config file; defaults apply to anything it omits
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a genesis file and report every problem
    ValidateGenesis {
        /// Genesis JSON file
        file: PathBuf,
    },

    /// Import, export and re-import a genesis file, comparing state hashes
    Roundtrip {
        /// Genesis JSON file
        file: PathBuf,
        /// Export time (RFC 3339); defaults to the genesis time
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Read-only queries against a genesis file
    Query {
        #[command(subcommand)]
        query: QueryCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum QueryCommands {
    /// Money market and incentive params
    Params {
        /// Genesis JSON file
        file: PathBuf,
    },

    /// Reward claims, optionally filtered
    Rewards {
        /// Genesis JSON file
        file: PathBuf,
        /// Claim owner (bech32)
        #[arg(long)]
        owner: Option<String>,
        /// Reward type (hard, usdx-minting)
        #[arg(long = "type")]
        reward_type: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size; 0 uses the configured default
        #[arg(long, default_value = "0")]
        limit: u64,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let fatal = err
                .downcast_ref::<AppError>()
                .is_some_and(AppError::is_fatal);
            if fatal {
                error!(error = %err, "fatal error");
                ExitCode::from(2)
            } else {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::ValidateGenesis { file } => {
            let genesis = AppGenesis::from_file(&file)?;
            if let Err(err) = genesis.validate() {
                for problem in &err.problems {
                    println!("  - {problem}");
                }
                return Err(AppError::from(err).into());
            }
            import(&config, genesis)?;
            println!("✓ Genesis is valid");
        }

        Commands::Roundtrip { file, at } => {
            let genesis = AppGenesis::from_file(&file)?;
            let now = at.unwrap_or(genesis.genesis_time);

            let first = import(&config, genesis)?;
            let exported = first.export_genesis(now);
            let first_hash = first.state_hash(now)?;

            let second = import(&config, exported)?;
            let second_hash = second.state_hash(now)?;
            if first_hash != second_hash {
                return Err(AppError::RoundTripMismatch {
                    first: first_hash,
                    second: second_hash,
                }
                .into());
            }
            println!("✓ Round trip reproduces state {first_hash}");
        }

        Commands::Query { query: q } => match q {
            QueryCommands::Params { file } => {
                let ctx = load(&config, &file)?;
                println!("{}", query::to_json(&query::get_params(&ctx))?);
            }
            QueryCommands::Rewards {
                file,
                owner,
                reward_type,
                page,
                limit,
            } => {
                let ctx = load(&config, &file)?;
                let request = RewardsRequest {
                    owner,
                    reward_type,
                    page,
                    limit,
                };
                println!("{}", query::to_json(&query::get_rewards(&ctx, &request)?)?);
            }
        },

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn import(config: &AppConfig, genesis: AppGenesis) -> Result<AppContext, AppError> {
    AppContext::import_genesis(
        config.clone(),
        genesis,
        module_bank(config),
        FixedPriceFeed::new(),
    )
}

fn load(config: &AppConfig, file: &Path) -> anyhow::Result<AppContext> {
    let genesis = AppGenesis::from_file(file)?;
    Ok(import(config, genesis)?)
}
