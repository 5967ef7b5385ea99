//! fediboat - a newsboat-style terminal reader for Mastodon timelines
#![allow(clippy::uninlined_format_args)]

use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fediboat::api::{FetchPage, MastodonClient};
use fediboat::models::{PageRequest, TimelineIdentity};

fn main() -> Result<()> {
    match parse_args()? {
        Command::Run { start } => {
            init_logging(true)?;
            fediboat::app::run(start)
        }
        Command::Timeline { identity, limit } => {
            init_logging(false)?;
            timeline_cli(&identity, limit)
        }
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Logs go to a file while the TUI owns the terminal (RUST_LOG=debug for verbose output)
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_file {
        let path = fediboat::paths::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// CLI commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run { start: TimelineIdentity },
    Timeline { identity: TimelineIdentity, limit: usize },
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_command(&args)
}

fn parse_command(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Run {
            start: TimelineIdentity::Home,
        });
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "timeline" | "tl" => {
            let identity = match args.get(1) {
                Some(arg) if !arg.starts_with('-') => arg.parse()?,
                _ => TimelineIdentity::Home,
            };
            let limit = match args.iter().position(|a| a == "--limit" || a == "-l") {
                Some(i) => args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("Missing value for --limit"))?
                    .parse()
                    .context("--limit expects a number")?,
                None => 20,
            };
            Ok(Command::Timeline { identity, limit })
        }

        other if other.starts_with('-') => Err(anyhow::anyhow!(
            "Unknown option: {other}\nRun 'fediboat --help' for usage"
        )),

        timeline => Ok(Command::Run {
            start: timeline.parse()?,
        }),
    }
}

fn print_help() {
    let config_path = fediboat::Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r"fediboat {} - read Mastodon timelines like RSS feeds

USAGE:
    fediboat [TIMELINE]                  Launch the TUI at TIMELINE (default: home)
    fediboat timeline [TIMELINE] [-l N]  Print the latest page of TIMELINE

TIMELINES:
    home, notifications, local, public, bookmarks,
    account:<id>, list:<id>, thread:<status id>

OPTIONS:
    -h, --help       Print help
    -v, --version    Print version

CONFIG:
    {}

Log in with the companion login flow first; it writes auth.json next to the config.",
        fediboat::VERSION,
        config_path
    );
}

fn print_version() {
    println!("fediboat {}", fediboat::VERSION);
}

fn timeline_cli(identity: &TimelineIdentity, limit: usize) -> Result<()> {
    let credentials = fediboat::auth::load_credentials()?;
    let config = fediboat::Config::load()?;
    let client = MastodonClient::new(&credentials)
        .with_page_limit(limit)
        .with_notification_types(config.notifications.show.clone())
        .with_timeout(config.request_timeout());

    let rt = tokio::runtime::Runtime::new()?;
    let page = rt
        .block_on(client.fetch_page(identity, &PageRequest::latest()))
        .with_context(|| format!("Failed to fetch {identity}"))?;

    println!("{}", identity.title());
    println!("{}", "─".repeat(60));

    for item in page.items {
        let sign = item
            .notification
            .and_then(|kind| config.notifications.sign(kind))
            .unwrap_or_default();
        println!("\n{} {} · {}", sign, item.author, item.short_date());
        if !item.body.is_empty() {
            println!("{}", item.body);
        }
    }

    Ok(())
}
