use std::fs::File;
use std::sync::Arc;

use cinemahub::catalog::Catalog;
use cinemahub::config::{self, Config};
use cinemahub::console;
use cinemahub::history::{FileStore, MemoryStore, WatchStore};
use cinemahub::server;
use cinemahub::tui::{self, VideoCard};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: cinemahub [browse | serve | history stats | history clear]";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let is_browse = matches!(args.as_slice(), [] | ["browse"]);
    init_tracing(is_browse);

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            if let config::ConfigError::ValidationError(_) | config::ConfigError::ParseError(_) = &e
                && let Ok(path) = Config::config_path()
            {
                eprintln!("\nCheck the config file at: {}", path.display());
            }
            std::process::exit(1);
        }
    };

    let result = match args.as_slice() {
        [] | ["browse"] => tui::run(config.clone(), open_store(&config)).await,
        ["serve"] => server::serve(config.server.bind, Catalog::seeded()).await,
        ["history", "stats"] => {
            let stats = console::history_stats(open_store(&config).as_ref());
            match serde_json::to_string_pretty(&stats) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to format stats: {}", e),
            }
            Ok(())
        }
        ["history", "clear"] => {
            console::clear_history::<VideoCard>(open_store(&config).as_ref(), &mut []);
            println!("Watch history cleared");
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(is_browse: bool) {
    // The browsing client logs to a file so it does not interfere with the TUI
    let log_file = if is_browse {
        File::create(std::env::temp_dir().join("cinemahub.log")).ok()
    } else {
        None
    };

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(false)
            .with_writer(file)
            .init();
    } else if is_browse {
        // Without a log file, stay quiet rather than draw over the TUI
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("off"))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn open_store(config: &Config) -> Arc<dyn WatchStore> {
    match config.history.path() {
        Some(path) => Arc::new(FileStore::new(path)),
        None => {
            warn!("no data directory available, watch history will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}
