use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use quicksearch::{
    Database, IconResolver, QuickSearchConfig, ResultView, Row, SearchController, SearchOptions,
    SearchStats,
};
use std::{num::NonZeroUsize, path::PathBuf, sync::Arc, time::Duration};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchArgs {
    /// Search text
    query: String,

    /// Entry database (JSON)
    #[arg(short, long)]
    db: PathBuf,

    /// Configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Match case exactly
    #[arg(short = 'c', long)]
    case_sensitive: bool,

    /// Treat the query as a regular expression
    #[arg(short = 'r', long)]
    regex: bool,

    /// Also search passwords
    #[arg(long)]
    passwords: bool,

    /// Also search entry UUIDs
    #[arg(long)]
    uuids: bool,

    /// Skip entries whose expiry time has passed
    #[arg(short = 'x', long)]
    exclude_expired: bool,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Print rows and status as JSON
    #[arg(long)]
    json: bool,

    /// Seconds to wait for the search to finish
    #[arg(long, default_value = "30")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query
    Search(Box<CliSearchArgs>),

    /// Feed the query one keystroke at a time, as typing would
    Type(Box<CliSearchArgs>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run(&args, false),
        Commands::Type(args) => run(&args, true),
    }
}

fn run(args: &CliSearchArgs, keystrokes: bool) -> anyhow::Result<()> {
    let config = load_config(args)?;
    init_logging(&config.log_level);

    let database = Database::load(&args.db)
        .with_context(|| format!("Failed to load database {}", args.db.display()))?;
    let icons = IconResolver::new(&database.custom_icons);
    let (mut controller, mut presenter) =
        SearchController::new(&config, Arc::new(database), icons)?;
    let mut view = ResultView::new();

    if keystrokes {
        // every prefix is its own input event
        for (end, _) in args.query.char_indices().skip(1) {
            controller.on_text_changed(&args.query[..end]);
            presenter.pump(&mut view);
        }
    }
    controller.on_text_changed(&args.query);

    if !presenter.settle(&mut view, Duration::from_secs(args.timeout)) {
        bail!("Search did not finish within {} seconds", args.timeout);
    }
    if let Some(error) = presenter.last_error() {
        bail!("Search failed: {}", error);
    }

    let stats = controller.metrics().get_stats();
    controller.metrics().log_stats();
    if args.json {
        print_json(&view, &stats)?;
    } else {
        print_rows(&view);
        if keystrokes {
            print_stats(&stats);
        }
    }
    Ok(())
}

fn load_config(args: &CliSearchArgs) -> anyhow::Result<QuickSearchConfig> {
    let file_config = QuickSearchConfig::load_from(args.config.as_deref())?;

    let defaults = QuickSearchConfig::default();
    let options = SearchOptions {
        case_sensitive: args.case_sensitive,
        regex: args.regex,
        search_in_password: args.passwords,
        search_in_uuid: args.uuids,
        exclude_expired: args.exclude_expired,
        ..SearchOptions::default()
    };
    let cli_config = QuickSearchConfig {
        options,
        thread_count: args.threads.unwrap_or(defaults.thread_count),
        ..defaults
    };

    Ok(file_config.merge_with_cli(cli_config))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    debug!("Logging initialized at {}", level);
}

fn paint(row: &Row, text: &str) -> ColoredString {
    let mut painted = text.normal();
    if let Some(fg) = row.foreground {
        painted = painted.truecolor(fg.r, fg.g, fg.b);
    }
    if let Some(bg) = row.background {
        painted = painted.on_truecolor(bg.r, bg.g, bg.b);
    }
    painted
}

fn print_rows(view: &ResultView) {
    for (index, row) in view.rows().iter().enumerate() {
        let marker = if view.selected() == Some(index) { ">" } else { " " };
        let rest = row
            .cells
            .iter()
            .skip(1)
            .filter(|cell| !cell.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" | ");
        if rest.is_empty() {
            println!("{} {}", marker, paint(row, row.label()).bold());
        } else {
            println!("{} {}  {}", marker, paint(row, row.label()).bold(), rest.dimmed());
        }
    }

    let summary = format!("Status: {} ({} rows)", view.status(), view.rows().len());
    if view.rows().is_empty() {
        println!("\n{}", summary.yellow());
    } else {
        println!("\n{}", summary.green());
    }
}

fn print_stats(stats: &SearchStats) {
    println!(
        "Scans (exact/refined/base): {}/{}/{}",
        stats.exact_hits, stats.refined_scans, stats.base_scans
    );
    println!("Entries scanned: {}", stats.entries_scanned);
    println!(
        "Generations (completed/canceled/faulted): {}/{}/{}",
        stats.completed, stats.canceled, stats.faulted
    );
}

fn print_json(view: &ResultView, stats: &SearchStats) -> anyhow::Result<()> {
    let rows: Vec<_> = view
        .rows()
        .iter()
        .map(|row| {
            serde_json::json!({
                "uuid": row.entry.uuid,
                "cells": row.cells,
                "icon": row.icon_index,
            })
        })
        .collect();
    let output = serde_json::json!({
        "status": view.status(),
        "rows": rows,
        "stats": {
            "exact_hits": stats.exact_hits,
            "refined_scans": stats.refined_scans,
            "base_scans": stats.base_scans,
            "entries_scanned": stats.entries_scanned,
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
