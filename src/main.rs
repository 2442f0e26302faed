use anyhow::Result;
use dotenvy::dotenv;
use popcorn::app::Session;
use popcorn::config::Config;
use popcorn::controller::{FetchStatus, MIN_QUERY_CHARS};
use popcorn::omdb::{CatalogApi, OmdbClient};
use popcorn::watched::{JsonFileStore, WatchedList, WatchedStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  search <query>   search the catalog (at least 3 characters)
  select <id>      open a movie, or close it if already open
  close            close the open movie
  rate <1-10>      rate the open movie
  add              keep the open movie with its rating
  remove <id>      drop a movie from the watched list
  watched          show the watched list
  help             show this text
  quit             exit";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let config = Config::from_env()?;
    let catalog: Arc<dyn CatalogApi> = Arc::new(OmdbClient::from_config(&config)?);
    let store = JsonFileStore::new(&config.data_dir);
    info!("Watched list at {}", store.path().display());
    let mut session = Session::new(catalog, WatchedList::open(store)?);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received (Ctrl+C)");
                None
            }
        };
        let Some(line) = line else { break };
        let (command, arg) = match line.trim().split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line.trim(), ""),
        };
        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "search" => search(&session, arg).await,
            "select" => select(&mut session, arg).await,
            "close" => session.close(),
            "rate" => rate(&mut session, arg),
            "add" => match session.add_watched().await {
                Ok(Some(entry)) => println!(
                    "added {} ({}) rated {}",
                    entry.movie.title(),
                    entry.id(),
                    entry.user_rating
                ),
                Ok(None) => println!("rate the movie first"),
                Err(e) => println!("error: {:#}", e),
            },
            "remove" => match session.remove(arg) {
                Ok(true) => println!("removed {arg}"),
                Ok(false) => println!("{arg} is not on the watched list"),
                Err(e) => println!("error: {:#}", e),
            },
            "watched" => print_watched(&session),
            other => println!("unknown command '{other}', try 'help'"),
        }
    }

    session.shutdown();
    Ok(())
}

async fn search<S: WatchedStore>(session: &Session<S>, query: &str) {
    session.set_query(query);
    let state = session.search().settled().await;
    match state.status {
        FetchStatus::Idle => println!("type at least {MIN_QUERY_CHARS} characters"),
        FetchStatus::Failed => println!("error: {}", state.error),
        FetchStatus::Loaded | FetchStatus::Loading => {
            println!("found {} results", state.results.len());
            for r in &state.results {
                println!("  {}  {} ({})", r.id, r.title, r.year);
            }
        }
    }
}

async fn select<S: WatchedStore>(session: &mut Session<S>, id: &str) {
    if id.is_empty() {
        println!("usage: select <id>");
        return;
    }
    if session.select(id).is_none() {
        println!("closed {id}");
        return;
    }
    let state = session.detail().settled().await;
    if !state.error.is_empty() {
        println!("error: {}", state.error);
        return;
    }
    let movie = &state.movie;
    println!("{} ({})", movie.title(), movie.summary.year);
    println!("  {} | {}", movie.released, movie.runtime);
    println!("  {}", movie.genre);
    if let Some(rating) = movie.rating {
        println!("  {rating} IMDb rating");
    }
    println!("  {}", movie.plot);
    println!("  Starring {}", movie.actors);
    println!("  Directed by {}", movie.director);
    match session.watched_rating(id) {
        Some(rating) => println!("  you rated this movie {rating}"),
        None => println!("  not rated yet, use 'rate <1-10>'"),
    }
}

fn rate<S: WatchedStore>(session: &mut Session<S>, arg: &str) {
    let Some(id) = session.selected().map(str::to_string) else {
        println!("select a movie first");
        return;
    };
    let value = match arg.parse::<u8>() {
        Ok(v) => v,
        Err(_) => {
            println!("usage: rate <1-10>");
            return;
        }
    };
    match session.rate(&id, value) {
        Ok(()) => println!("rating {value}, type 'add' to keep it"),
        Err(e) => println!("error: {e}"),
    }
}

fn print_watched<S: WatchedStore>(session: &Session<S>) {
    let summary = session.watched().summary();
    println!(
        "{} movies | imdb {:.2} | you {:.2} | {:.0} min",
        summary.count, summary.avg_imdb_rating, summary.avg_user_rating, summary.avg_runtime
    );
    for entry in session.watched().entries() {
        let imdb = entry
            .movie
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {}  imdb {}  you {}  {} min",
            entry.id(),
            entry.movie.title(),
            imdb,
            entry.user_rating,
            entry.runtime_minutes()
        );
    }
}
