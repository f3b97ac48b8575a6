use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use judge_desk::config::{load_config, validate_config, Config};
use judge_desk::credentials::{resolve_session, Session};
use judge_desk::lifecycle::{Decision, MarkLedger};
use judge_desk::marks::{EditRequestStatus, PerformanceTier, Rounds};
use judge_desk::notify::ConfiguredNotifier;
use judge_desk::output::{self, Names};
use judge_desk::qualify::{select_top_k, select_top_k_by_pair};
use judge_desk::results::tier_results;
use judge_desk::scoring::{score_breakdown, validate_rounds};
use judge_desk::store::{FileStore, HttpStore, MarkStore};
use judge_desk::JudgeError;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_INVALID: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a rounds file without saving it
    Score {
        /// JSON file with "round1" and optional "round2"
        file: PathBuf,
    },
    /// Save marks for a student at an event
    Save {
        #[arg(long)]
        student: String,
        #[arg(long)]
        event: String,
        /// Competition tier (1 or 2)
        #[arg(long)]
        tier: PerformanceTier,
        /// JSON file with "round1" and optional "round2"
        file: PathBuf,
    },
    /// List the tier-1 entries that qualify for tier 2
    Qualify {
        /// Number of qualifiers (defaults to qualification.top_k)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        top: Option<u64>,
        /// Look records up one (student, event) pair at a time
        #[arg(long)]
        by_pair: bool,
    },
    /// Ranked final scores per event
    Results {
        #[arg(long)]
        tier: PerformanceTier,
        #[arg(long)]
        event: Option<String>,
    },
    /// List edit requests
    Requests {
        #[arg(long)]
        status: Option<EditRequestStatus>,
    },
    /// Approve or reject the pending edit request for a mark
    Review {
        mark_id: String,
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        #[arg(long, required_unless_present = "approve")]
        reject: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "judge-desk")]
#[command(about = "Competition scoring and qualification", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file (defaults to <config dir>/judge-desk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Store access token (or JUDGE_DESK_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Acting user id (or JUDGE_DESK_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("judge_desk={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code_for(error: &JudgeError) -> i32 {
    match error {
        JudgeError::Auth(_) => EXIT_AUTH,
        JudgeError::Transient(_) | JudgeError::Io(_) => EXIT_NETWORK,
        JudgeError::Validation(_)
        | JudgeError::Json(_)
        | JudgeError::Store(_)
        | JudgeError::NotFound(_)
        | JudgeError::InvalidTransition { .. } => EXIT_INVALID,
    }
}

fn read_rounds(path: &Path) -> Result<Rounds, JudgeError> {
    let content = std::fs::read_to_string(path)?;
    let rounds: Rounds = serde_json::from_str(&content)?;
    Ok(rounds)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.map(PathBuf::from);
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let code = match run(cli.command, &config, cli.token, cli.user).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(
    command: Commands,
    config: &Config,
    token: Option<String>,
    user: Option<String>,
) -> Result<(), JudgeError> {
    // Scoring a file is pure and needs neither a session nor a store.
    if let Commands::Score { file } = &command {
        let rounds = read_rounds(file)?;
        validate_rounds(&rounds).map_err(JudgeError::Validation)?;
        let breakdown = score_breakdown(&rounds);
        println!(
            "{}",
            output::format_breakdown(&breakdown, output::should_use_colors())
        );
        return Ok(());
    }

    let session = resolve_session(token, user)?;

    match &config.store.url {
        Some(url) => {
            debug!(%url, "using remote store");
            let store = HttpStore::new(
                url,
                &session,
                config.store.timeout(),
                config.store.retries(),
            )?;
            execute(command, store, &session, config).await
        }
        None => {
            let path = config.store.local_path();
            debug!(path = %path.display(), "using local store");
            let store = FileStore::open(&path)?;
            execute(command, store, &session, config).await
        }
    }
}

async fn execute<S: MarkStore>(
    command: Commands,
    store: S,
    session: &Session,
    config: &Config,
) -> Result<(), JudgeError> {
    let use_colors = output::should_use_colors();

    match command {
        // Handled in run before a store is opened.
        Commands::Score { .. } => Ok(()),
        Commands::Save {
            student,
            event,
            tier,
            file,
        } => {
            let rounds = read_rounds(&file)?;
            let notifier = ConfiguredNotifier::from_webhook(
                config.notifications.webhook.as_deref(),
                config.store.timeout(),
            )?;
            let ledger = MarkLedger::new(store, notifier);
            let outcome = ledger
                .save_marks(session, &student, &event, tier, rounds)
                .await?;
            println!("{}", output::format_outcome(&outcome));
            Ok(())
        }
        Commands::Qualify { top, by_pair } => {
            let k = top.map_or(config.qualification.top_k, |top| top as usize);
            let students = store.list_students().await?;
            let events = store.list_events().await?;
            let selection = if by_pair {
                select_top_k_by_pair(session, &students, &events, &store, k).await?
            } else {
                select_top_k(session, &students, &events, &store, k).await?
            };
            let names = Names::new(&students, &events);
            println!("{}", output::format_qualifiers(&selection, &names, use_colors));
            Ok(())
        }
        Commands::Results { tier, event } => {
            let students = store.list_students().await?;
            let events = store.list_events().await?;
            let results = tier_results(session, &store, tier, event.as_deref()).await?;
            let names = Names::new(&students, &events);
            println!("{}", output::format_results(&results, &names, use_colors));
            Ok(())
        }
        Commands::Requests { status } => {
            let ledger = MarkLedger::new(store, judge_desk::notify::LogNotifier);
            let requests = ledger.list_requests(session, status).await?;
            println!("{}", output::format_requests(&requests, use_colors));
            Ok(())
        }
        Commands::Review {
            mark_id, approve, ..
        } => {
            let decision = if approve {
                Decision::Approve
            } else {
                Decision::Reject
            };
            let ledger = MarkLedger::new(store, judge_desk::notify::LogNotifier);
            let request = ledger
                .review_edit_request(session, &mark_id, decision)
                .await?;
            println!("Edit request {} is now {}", request.id, request.status);
            Ok(())
        }
    }
}
