//! `hours` — resolve and summarize opening hours from JSON period files.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use hours_engine::{fingerprint, period_as_text, resolve, state_at, Period, ResolveOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hours")]
#[command(about = "Resolve opening-hours periods into concrete daily hours", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve periods into intervals for every date in a range (JSON output)
    Resolve {
        #[command(flatten)]
        input: PeriodsArg,
        /// First date of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last date of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print a text summary of each period
    Summary {
        #[command(flatten)]
        input: PeriodsArg,
    },
    /// Print the interval in effect at a moment, or null (JSON output)
    State {
        #[command(flatten)]
        input: PeriodsArg,
        /// Local date and time (YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        at: NaiveDateTime,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Print the digest of the period data
    Fingerprint {
        #[command(flatten)]
        input: PeriodsArg,
    },
}

#[derive(Args)]
struct PeriodsArg {
    /// JSON file holding an array of periods ("-" reads stdin)
    #[arg(long)]
    periods: PathBuf,
}

#[derive(Args)]
struct ContextArgs {
    /// IANA timezone the period data is expressed in
    #[arg(long, env = "HOURS_TIMEZONE", default_value = "UTC")]
    timezone: String,
    /// Longest accepted range in days (0 for no limit)
    #[arg(long, env = "HOURS_MAX_DAYS")]
    max_days: Option<u32>,
}

impl ContextArgs {
    fn options(&self) -> Result<ResolveOptions> {
        let mut options = ResolveOptions::default().with_timezone(&self.timezone)?;
        if let Some(max_days) = self.max_days {
            options = options.with_max_range_days((max_days > 0).then_some(max_days));
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            input,
            from,
            to,
            context,
        } => cmd_resolve(&input.periods, from, to, &context),
        Commands::Summary { input } => cmd_summary(&input.periods),
        Commands::State { input, at, context } => cmd_state(&input.periods, at, &context),
        Commands::Fingerprint { input } => cmd_fingerprint(&input.periods),
    }
}

fn cmd_resolve(path: &Path, from: NaiveDate, to: NaiveDate, context: &ContextArgs) -> Result<()> {
    let periods = read_periods(path)?;
    let options = context.options()?;
    let resolution = resolve(&periods, from, to, &options)
        .with_context(|| format!("Failed to resolve {from} to {to}"))?;
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

fn cmd_summary(path: &Path) -> Result<()> {
    let periods = read_periods(path)?;
    let mut blocks = Vec::with_capacity(periods.len());
    for period in &periods {
        let text = period_as_text(period)
            .with_context(|| format!("Failed to summarize period {}", period.id))?;
        blocks.push(text);
    }
    print!("{}", blocks.join("\n"));
    Ok(())
}

fn cmd_state(path: &Path, at: NaiveDateTime, context: &ContextArgs) -> Result<()> {
    let periods = read_periods(path)?;
    let options = context.options()?;
    let interval = state_at(&periods, at, &options)
        .with_context(|| format!("Failed to resolve state at {at}"))?;
    println!("{}", serde_json::to_string_pretty(&interval)?);
    Ok(())
}

fn cmd_fingerprint(path: &Path) -> Result<()> {
    let periods = read_periods(path)?;
    println!("{}", fingerprint(&periods));
    Ok(())
}

fn read_periods(path: &Path) -> Result<Vec<Period>> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    let periods: Vec<Period> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse periods from {}", path.display()))?;
    tracing::debug!(count = periods.len(), "loaded periods");
    Ok(periods)
}
