//! BETSIM: simulated single-bet sportsbook
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the book from disk (or creates a fresh one), and either runs
//! a one-shot command or the poll → settle → render loop with graceful
//! shutdown.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use betsim::config::AppConfig;
use betsim::engine::cycle::Poller;
use betsim::engine::placement::{BetSlip, Selection};
use betsim::engine::settlement::SettlementEngine;
use betsim::feed::{self, MatchSource};
use betsim::odds::OddsPolicy;
use betsim::render::{Board, Renderer, TextRenderer};
use betsim::storage::{self, JsonFileStore};
use betsim::types::{BetsimError, Book, Pick};

const USAGE: &str =
    "usage: betsim [watch | board [league] | bets | reset | place <match_id> <home|draw|away> <stake>]";

#[derive(Debug, PartialEq)]
enum Command {
    Watch,
    Board(Option<String>),
    Bets,
    Reset,
    Place {
        match_id: String,
        pick: Pick,
        stake: Decimal,
    },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["watch"] => Ok(Command::Watch),
        ["board"] => Ok(Command::Board(None)),
        ["board", league @ ..] => Ok(Command::Board(Some(league.join(" ")))),
        ["bets"] => Ok(Command::Bets),
        ["reset"] => Ok(Command::Reset),
        ["place", match_id, pick, stake] => Ok(Command::Place {
            match_id: match_id.to_string(),
            pick: pick.parse()?,
            stake: Decimal::from_str(stake)
                .with_context(|| format!("Invalid stake: {stake}"))?,
        }),
        _ => anyhow::bail!("{USAGE}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("BETSIM_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let mut store = JsonFileStore::open(&cfg.storage.path)?;
    if command == Command::Reset {
        storage::reset_book(&mut store)?;
        info!(path = %cfg.storage.path, "Saved book cleared");
    }
    let mut book = storage::load_book(&store, cfg.wallet.initial_balance)?;
    info!(balance = %book.wallet, bets = book.bets.len(), "Book restored");

    let source = feed::build_source(&cfg.feed)?;
    let policy = cfg.odds.policy();
    let mut renderer = TextRenderer::new(std::io::stdout(), cfg.wallet.currency.clone());

    match command {
        Command::Bets | Command::Reset => renderer.render_book(&book)?,
        Command::Board(league) => {
            let feed = source.fetch().await?;
            let league = league.or_else(|| cfg.feed.league.clone());
            let board = Board::build(&feed.upcoming, &policy, league.as_deref());
            renderer.render_board(&board)?;
        }
        Command::Place { match_id, pick, stake } => {
            place(&*source, &policy, &mut store, &mut book, &mut renderer, &match_id, pick, stake)
                .await?;
        }
        Command::Watch => {
            let poller = Poller::new(
                source,
                Box::new(store),
                Box::new(renderer),
                policy,
                cfg.feed.league.clone(),
            );
            watch(poller, &mut book, cfg.feed.poll_interval_secs).await?;
        }
    }

    Ok(())
}

/// Fetch the board, settle anything already decided, then place one bet.
#[allow(clippy::too_many_arguments)]
async fn place(
    source: &dyn MatchSource,
    policy: &OddsPolicy,
    store: &mut JsonFileStore,
    book: &mut Book,
    renderer: &mut dyn Renderer,
    match_id: &str,
    pick: Pick,
    stake: Decimal,
) -> Result<()> {
    let feed = source.fetch().await?;

    let settlement = SettlementEngine::settle(&book.bets, &feed.finished, &book.wallet);
    if settlement.changed {
        book.bets = settlement.bets;
        book.wallet = settlement.wallet;
        renderer.notify_settled(&settlement.settled, &book.wallet)?;
    }

    let m = feed
        .find_upcoming(match_id)
        .ok_or_else(|| BetsimError::MatchNotFound(match_id.to_string()))?;

    let mut slip = BetSlip::new();
    slip.select(Selection::from_match(m, pick, policy)?);
    let bet = slip.place(book, stake, Utc::now())?;

    storage::save_book(store, book)?;
    println!("Bet placed: {bet}");
    renderer.render_book(book)?;
    Ok(())
}

/// Poll until Ctrl+C, then persist the book one last time.
async fn watch(mut poller: Poller, book: &mut Book, interval_secs: u64) -> Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval_secs, "Entering poll loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = poller.run_cycle(book).await {
                    error!(error = %e, "Cycle failed, continuing to next");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    storage::save_book(poller.store_mut(), book)?;
    info!(
        balance = %book.wallet,
        cycles = poller.cycles(),
        bets = book.bets.len(),
        "BETSIM shut down cleanly."
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betsim=info"));

    let json_logging = std::env::var("BETSIM_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
