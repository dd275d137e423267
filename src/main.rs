use clap::{Parser, Subcommand};
use maps_unshort::config::Config;
use maps_unshort::maps::{ExpandErrorBody, Language, MapsResolver, Mode, SearchErrorBody};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Maps Unshort — expand Google Maps short links
///
/// Follows redirects on a Maps link, pulls the coordinates out of the
/// expanded URL and, unless told otherwise, looks up the street address.
///
/// Examples:
///   unshort expand https://maps.app.goo.gl/c17dx6XJYHhbS3pq9
///   unshort expand --mode coordinates https://maps.app.goo.gl/c17dx6XJYHhbS3pq9
///   unshort expand --lang hi https://maps.app.goo.gl/c17dx6XJYHhbS3pq9
///   unshort search "rudra"
///   unshort serve --port 3000
#[derive(Parser)]
#[command(name = "unshort", version, about, long_about = None)]
struct Cli {
    /// Config file. Defaults to ~/.maps-unshort/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Expand a Maps link into coordinates or an address.
    Expand {
        url: String,

        /// "coordinates", "address" or "search". Defaults to the config value.
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Locality language for the address (e.g. en, hi, zh-CN).
        #[arg(long, default_value = "en")]
        lang: Language,
    },
    /// Search places by free text.
    Search { query: String },
    /// Run the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "maps_unshort=debug,unshort=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, String> {
    let mut config = match path {
        Some(p) => Config::load_from(p).map_err(|e| e.to_string())?,
        None => return Config::load().map_err(|e| e.to_string()),
    };
    config
        .apply_env(|var| std::env::var(var).ok())
        .map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: cannot encode output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn fail_json<T: Serialize>(value: &T) -> ExitCode {
    print_json(value);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Expand { url, mode, lang } => {
            if let Some(mode) = mode {
                config.mode = mode;
            }
            let resolver = MapsResolver::from_config(&config);
            match resolver.expand(&url, &lang) {
                Ok(expansion) => print_json(&expansion),
                Err(e) => fail_json(&ExpandErrorBody::from(&e)),
            }
        }
        Command::Search { query } => {
            // Search only exists in the full mode; the subcommand implies it.
            config.mode = Mode::WithSearch;
            let resolver = MapsResolver::from_config(&config);
            match resolver.search(&query) {
                Ok(hits) => print_json(&hits),
                Err(e) => fail_json(&SearchErrorBody::from(&e)),
            }
        }
        Command::Serve { host, port } => {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: cannot start runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match runtime.block_on(maps_unshort::server::start(&host, port, &config)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
