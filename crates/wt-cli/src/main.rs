use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::segments::SegmentFilter;
use wt_cli::commands::util::{parse_id_range, parse_timestamp};
use wt_cli::commands::{check, history, segments, session, status};
use wt_cli::{Cli, Commands, Config};
use wt_db::Database;
use wt_tracker::{SessionManager, StateFile};

/// Load config and open database, ensuring the parent directory exists.
///
/// A database that cannot be opened is logged and replaced by an unavailable
/// handle; commands that need it then fail with a storage error.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open_or_unavailable(&config.database_path);
    Ok((db, config))
}

/// Open the database and restore the persisted session.
fn open_tracker(config_path: Option<&Path>) -> Result<SessionManager> {
    let (db, config) = open_database(config_path)?;
    SessionManager::new(db, StateFile::new(&config.state_path))
        .context("failed to load session state")
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn timestamp_or_now(at: Option<&str>) -> Result<i64> {
    at.map_or_else(|| Ok(now()), parse_timestamp)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: a subscriber may already be installed in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Some(Commands::Start { at }) => {
            let at = timestamp_or_now(at.as_deref())?;
            let mut manager = open_tracker(config_path)?;
            session::start(&mut stdout, &mut manager, at)?;
        }
        Some(Commands::Stop { at }) => {
            let at = timestamp_or_now(at.as_deref())?;
            let mut manager = open_tracker(config_path)?;
            session::stop(&mut stdout, &mut manager, at)?;
        }
        Some(Commands::Status { json, average }) => {
            let manager = open_tracker(config_path)?;
            let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
            status::run(&mut stdout, &manager, now(), &timezone, *json, *average)?;
        }
        Some(Commands::History { json }) => {
            let (db, _config) = open_database(config_path)?;
            history::run(&mut stdout, &db, *json)?;
        }
        Some(Commands::Segments { since, ids }) => {
            let filter = match (since, ids) {
                (Some(since), _) => SegmentFilter::Since(parse_timestamp(since)?),
                (None, Some(ids)) => {
                    let (first, last) = parse_id_range(ids)?;
                    SegmentFilter::Ids(first, last)
                }
                (None, None) => SegmentFilter::All,
            };
            let (db, _config) = open_database(config_path)?;
            segments::list(&mut stdout, &db, &chrono::Local, filter)?;
        }
        Some(Commands::Edit {
            id,
            start,
            stop,
            day,
        }) => {
            let start = parse_timestamp(start)?;
            let stop = parse_timestamp(stop)?;
            let (mut db, _config) = open_database(config_path)?;
            segments::edit(&mut stdout, &mut db, &chrono::Local, *id, start, stop, *day)?;
        }
        Some(Commands::Delete { id }) => {
            let (mut db, _config) = open_database(config_path)?;
            segments::delete(&mut stdout, &mut db, *id)?;
        }
        Some(Commands::Check) => {
            let (db, _config) = open_database(config_path)?;
            let report = check::run(&mut stdout, &db)?;
            if !report.is_consistent() {
                anyhow::bail!(
                    "{} day total(s) do not match their segments",
                    report.mismatches.len()
                );
            }
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
