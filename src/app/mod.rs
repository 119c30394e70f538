mod format;
pub(crate) mod input;


use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::cli::{Cli, Command, HistoryArgs, RecordArgs};
use crate::config::resolve_database_path;
use crate::db::{AddOutcome, Database};

use self::format::Printer;
use self::input::{history_filter, parse_record_args};

/// Per-invocation settings shared by every command.
pub(crate) struct Context {
    pub(crate) now: DateTime<Utc>,
    pub(crate) printer: Printer,
}

impl Context {
    pub(crate) fn new(verbose: bool, colored: bool) -> Self {
        Self {
            now: Utc::now(),
            printer: Printer {
                colored,
                exact_times: verbose,
            },
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Command::Version = cli.command {
        return run_version(&mut out);
    }

    let colored =
        !cli.no_color && std::env::var_os("NO_COLOR").is_none() && stdout.is_terminal();
    let ctx = Context::new(cli.verbose, colored);
    let db = open_db(cli.database)?;

    dispatch(&db, &ctx, cli.command, &mut out)
}

pub(crate) fn dispatch(
    db: &Database,
    ctx: &Context,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::History(args) => run_history(db, ctx, args, out),
        Command::Record(args) => run_record(db, ctx, args),
        Command::Add { names } => run_add(db, &names),
        Command::Shows {
            short_format,
            extra,
        } => run_shows(db, ctx, short_format, &extra, out),
        Command::Exists { name } => run_exists(db, name.as_deref(), out),
        Command::Search { pattern } => run_search(db, pattern.as_deref(), out),
        Command::Next { episode, names } => run_next(db, ctx, episode, &names, out),
        Command::Version => run_version(out),
    }
}

fn run_history(
    db: &Database,
    ctx: &Context,
    args: HistoryArgs,
    out: &mut impl Write,
) -> Result<()> {
    log::info!("Fetching the {} last entries...", args.count);
    let filter = history_filter(args.name, args.season, args.episode);
    let rows = db.query_history(&filter, args.count)?;

    log::info!("Printing found rows...");
    for entry in &rows {
        writeln!(out, "{}", ctx.printer.history_line(entry, ctx.now))?;
    }
    Ok(())
}

fn run_record(db: &Database, ctx: &Context, args: RecordArgs) -> Result<()> {
    if args.triples.is_empty() {
        log::warn!("Nothing to record. Usage: seen record <name> <season> <episode>...");
        return Ok(());
    }

    log::info!("Appending history...");
    let batch = parse_record_args(&args.triples);
    if let Some(warning) = &batch.orphaned {
        log::warn!("{warning}");
    }

    let added = ctx.now + args.delay;
    let mut recorded = 0;
    for item in batch.items {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                log::warn!("{err}. Skipping...");
                continue;
            }
        };
        if log::log_enabled!(log::Level::Info) && !db.show_exists(&item.name)? {
            log::info!("\"{}\" is not in the show catalog", item.name);
        }
        db.record_history(&item.name, item.season, item.episode, added)?;
        recorded += 1;
    }
    log::info!("{recorded} episode(s) recorded");
    Ok(())
}

fn run_add(db: &Database, names: &[String]) -> Result<()> {
    if names.is_empty() {
        log::warn!("No shows given. Usage: seen add <name>...");
        return Ok(());
    }

    log::info!("Preparing to add {} new shows", names.len());
    for name in names {
        match db.add_show(name)? {
            AddOutcome::Added => log::info!("Added \"{name}\""),
            AddOutcome::AlreadyExists => log::warn!("\"{name}\" already exists. Skipping..."),
        }
    }
    Ok(())
}

fn run_shows(
    db: &Database,
    ctx: &Context,
    short_format: bool,
    extra: &[String],
    out: &mut impl Write,
) -> Result<()> {
    log::info!("Preparing to list all shows");
    if !extra.is_empty() {
        log::info!("Ignoring {} argument(s)", extra.len());
    }

    let shows = db.list_shows()?;
    for show in &shows {
        if short_format {
            writeln!(out, "{}", show.name)?;
        } else {
            writeln!(out, "{}", ctx.printer.show_line(show, ctx.now))?;
        }
    }
    log::info!("{} shows listed", shows.len());
    Ok(())
}

fn run_exists(db: &Database, name: Option<&str>, out: &mut impl Write) -> Result<()> {
    let Some(name) = name else {
        log::warn!("No show given. Usage: seen exists <name>");
        return Ok(());
    };
    writeln!(out, "{}", db.show_exists(name)?)?;
    Ok(())
}

fn run_search(db: &Database, pattern: Option<&str>, out: &mut impl Write) -> Result<()> {
    let Some(pattern) = pattern.filter(|pattern| !pattern.trim().is_empty()) else {
        log::warn!("No search pattern given. Usage: seen search <name>");
        return Ok(());
    };
    match db.search(pattern)? {
        Some(name) => writeln!(out, "{name}")?,
        None => log::warn!("No show matching \"{pattern}\""),
    }
    Ok(())
}

fn run_next(
    db: &Database,
    ctx: &Context,
    episode_only: bool,
    names: &[String],
    out: &mut impl Write,
) -> Result<()> {
    if names.is_empty() {
        log::warn!("No shows given. Usage: seen next <name>...");
        return Ok(());
    }

    for name in names {
        match db.next_episode(name)? {
            Some((_, episode)) if episode_only => writeln!(out, "{episode}")?,
            Some((season, episode)) => {
                writeln!(out, "{}", ctx.printer.next_line(name, season, episode))?
            }
            None => log::warn!("\"{name}\" not found"),
        }
    }
    Ok(())
}

fn run_version(out: &mut impl Write) -> Result<()> {
    writeln!(out, "seen {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

fn open_db(flag: Option<PathBuf>) -> Result<Database> {
    let db_path = resolve_database_path(flag)?;
    log::info!("Using database {}", db_path.display());
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
