//! Converter Binary
//!
//! Terminal front end for the conversion engine. Loads the rates written by
//! the refresher and reads commands from stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use converter_common::{format_amount, CurrencyCatalog};
use converter_engine::{
    CurrencySearch, EngineConfig, EngineEvent, EngineHandle, EngineService, FavoritesEvent,
    FavoritesStore, FormEvent, JsonFavoritesStore, MemoryFavoritesStore, UiState,
};
use converter_rates::{JsonFileRateStore, RateFeed, RatePublisher};

const HELP: &str = "commands: from <CODE> | to <CODE> | amount <n> | to-amount <n> | \
fav+ <CODE> | fav- <CODE> | search <query> | show | quit";

/// Currency converter
#[derive(Parser, Debug)]
#[command(name = "converter")]
#[command(about = "Convert between currencies using the latest stored rates")]
struct Args {
    /// Rate file written by rate-refresher (overrides RATES_PATH)
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Favorites file (overrides FAVORITES_PATH)
    #[arg(long)]
    favorites: Option<PathBuf>,
}

enum Command {
    Event(EngineEvent),
    Search(String),
    Show,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = EngineConfig::from_env();
    if let Some(rates) = args.rates {
        config.rates_path = rates;
    }
    if let Some(favorites) = args.favorites {
        config.favorites_path = Some(favorites);
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let catalog = CurrencyCatalog::supported();
    if let Err(e) = config.validate(&catalog) {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let feed = RateFeed::new(catalog.clone());
    match JsonFileRateStore::new(config.rates_path.clone()).load().await {
        Ok(Some(publication)) => feed.publish(&publication).await?,
        Ok(None) => warn!(
            path = %config.rates_path.display(),
            "No stored rates yet, run rate-refresher first"
        ),
        Err(e) => warn!(error = %e, "Could not load stored rates"),
    }

    let store: Arc<dyn FavoritesStore> = match &config.favorites_path {
        Some(path) => Arc::new(
            JsonFavoritesStore::open(path.clone())
                .await
                .context("opening favorites store")?,
        ),
        None => Arc::new(MemoryFavoritesStore::new()),
    };

    let debounce = config.search_debounce;
    let search = CurrencySearch::spawn(catalog.clone(), debounce);
    let handle = EngineService::spawn(config, catalog.clone(), feed.subscribe(), store);
    info!("Converter ready");

    println!("{}", HELP);
    handle.flush().await?;
    print_state(&handle);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_command(line, &catalog) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Event(event) => {
                let favorites_change = matches!(event, EngineEvent::Favorites(_));
                handle.send(event).await?;
                handle.flush().await?;
                if favorites_change {
                    wait_for_favorites(&handle).await;
                }
                print_state(&handle);
            }
            Command::Search(query) => {
                let mut results = search.results();
                results.borrow_and_update();
                search.set_query(query);
                // An unchanged query is not re-evaluated; show the last results.
                let _ = tokio::time::timeout(debounce * 2, results.changed()).await;
                let matches: Vec<String> = results
                    .borrow()
                    .iter()
                    .map(|c| format!("{} ({})", c.code, c.name))
                    .collect();
                println!("{}", matches.join(", "));
            }
            Command::Show => print_state(&handle),
            Command::Quit => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn parse_command(line: &str, catalog: &CurrencyCatalog) -> Result<Command, String> {
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    let currency = |code: &str| {
        catalog
            .lookup(code)
            .ok_or_else(|| format!("unknown currency {:?}", code))
    };

    let command = match verb {
        "from" => Command::Event(FormEvent::FromCurrencyChanged(currency(arg)?).into()),
        "to" => Command::Event(FormEvent::ToCurrencyChanged(currency(arg)?).into()),
        "amount" => Command::Event(FormEvent::FromAmountChanged(arg.to_string()).into()),
        "to-amount" => Command::Event(FormEvent::ToAmountChanged(arg.to_string()).into()),
        "fav+" => Command::Event(FavoritesEvent::FavoriteAdded(currency(arg)?).into()),
        "fav-" => Command::Event(FavoritesEvent::FavoriteRemoved(currency(arg)?).into()),
        "search" => Command::Search(arg.to_string()),
        "show" => Command::Show,
        "quit" | "exit" => Command::Quit,
        _ => return Err(HELP.to_string()),
    };

    Ok(command)
}

/// Favorites reach the engine through the store, so give the change a moment
/// to come back around before printing.
async fn wait_for_favorites(handle: &EngineHandle) {
    let mut ui = handle.ui_state();
    ui.borrow_and_update();
    let _ = tokio::time::timeout(std::time::Duration::from_millis(200), ui.changed()).await;
}

fn print_state(handle: &EngineHandle) {
    let form = handle.current_form();
    println!(
        "{} {}  =  {} {}",
        display_amount(&form.from_amount),
        form.from_currency.code,
        display_amount(&form.to_amount),
        form.to_currency.code,
    );

    match handle.current_ui() {
        UiState::Loading => println!("  (waiting for rates)"),
        UiState::Ready { rates, favorites, .. } => {
            if let Some(updated) = rates.last_updated() {
                println!("  rates as of {}", updated.format("%Y-%m-%d %H:%M UTC"));
            }
            for favorite in favorites {
                println!(
                    "  * {} {}  (1 {} = {} {})",
                    format_amount(favorite.result_amount),
                    favorite.favorite_currency.code,
                    favorite.base_currency.code,
                    format_amount(favorite.exchange_rate),
                    favorite.favorite_currency.code,
                );
            }
        }
    }
}

fn display_amount(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}
