use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bikeshare::schema::format;
use bikeshare::{render, City, DayFilter, MonthFilter, Selection, Session, Summary, TripLoader};

#[derive(Parser)]
#[command(name = "bikeshare")]
#[command(about = "Explore US bikeshare trip data by city, month and day")]
#[command(version)]
struct Cli {
    /// Directory containing chicago.csv, new_york_city.csv and washington.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// strftime-style format of the Start Time and End Time columns
    #[arg(long, default_value = format::DEFAULT_TIMESTAMP)]
    timestamp_format: String,

    /// Raw rows shown per page
    #[arg(long, default_value_t = bikeshare::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Run once for this city instead of prompting
    #[arg(long)]
    city: Option<String>,

    /// Month filter for a one-shot run (all, january..june)
    #[arg(long, default_value = "all", requires = "city")]
    month: String,

    /// Day filter for a one-shot run (all, sunday..saturday)
    #[arg(long, default_value = "all", requires = "city")]
    day: String,

    /// Print the one-shot summary as JSON
    #[arg(long, requires = "city")]
    json: bool,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,
}

fn run_once(loader: &TripLoader, cli: &Cli, city: &str) -> Result<()> {
    let selection = Selection {
        city: city.parse::<City>()?,
        month: cli.month.parse::<MonthFilter>()?,
        day: cli.day.parse::<DayFilter>()?,
    };

    let table = loader
        .load(selection.city, selection.month, selection.day)
        .with_context(|| format!("failed to load data for {}", selection.city))?;
    let summary = Summary::compute(&table, selection).context("failed to compute statistics")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        render(&summary, &mut io::stdout().lock())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let loader = TripLoader::new(&cli.data_dir).with_timestamp_format(cli.timestamp_format.clone());
    info!(data_dir = %cli.data_dir.display(), "starting");

    if let Some(city) = cli.city.as_deref() {
        return run_once(&loader, &cli, city);
    }

    let stdin = io::stdin();
    let mut session =
        Session::new(loader, stdin.lock(), io::stdout()).with_page_size(cli.page_size);
    session.run().context("interactive session failed")?;
    Ok(())
}
