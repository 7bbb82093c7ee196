use std::process::ExitCode;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use date_resolver::{reference_in_timezone, DateResolver, ResolveOptions, TripDates};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "resolve-date",
    version,
    about = "Resolve free-text date expressions to ISO dates"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve one or more date expressions
    Resolve(ResolveArgs),
    /// Resolve a departure date and an optional return date
    Trip(TripArgs),
}

#[derive(Debug, Args, Clone)]
struct ReferenceArgs {
    /// Reference "now" as YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (default: current time)
    #[arg(long)]
    reference: Option<String>,
    /// IANA timezone used to read the current time when --reference is absent
    #[arg(long, env = "RESOLVE_DATE_TZ", default_value = "UTC")]
    timezone: String,
    /// Months a bare day-of-month ("the 31st") may scan forward
    #[arg(long, default_value_t = 12)]
    scan_months: u32,
    /// Keep year-less dates in the past instead of moving them to next year
    #[arg(long)]
    no_roll_forward: bool,
    /// Emit one JSON object per result
    #[arg(long)]
    json: bool,
    /// Log resolution details to stderr
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Args, Clone)]
struct ResolveArgs {
    #[command(flatten)]
    common: ReferenceArgs,
    #[arg(value_name = "EXPRESSION", required = true)]
    expressions: Vec<String>,
}

#[derive(Debug, Args, Clone)]
struct TripArgs {
    #[command(flatten)]
    common: ReferenceArgs,
    /// Departure date expression
    #[arg(long)]
    depart: String,
    /// Return date expression
    #[arg(long = "return")]
    return_expr: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResolveLine<'a> {
    expression: &'a str,
    date: Option<NaiveDate>,
    rule: Option<&'static str>,
    interpretation: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TripLine {
    #[serde(flatten)]
    dates: TripDates,
    nights: Option<i64>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Resolve(args) => {
                init_logging(args.common.verbose);
                run_resolve(&args)
            }
            Command::Trip(args) => {
                init_logging(args.common.verbose);
                run_trip(&args)
            }
        }
    }
}

fn run_resolve(args: &ResolveArgs) -> anyhow::Result<ExitCode> {
    let reference = reference_from(&args.common)?;
    let resolver = resolver_from(&args.common);
    debug!(%reference, "resolving against reference");

    let mut all_resolved = true;
    for expression in args.expressions.iter().map(String::as_str) {
        let line = match resolver.resolve_detailed(expression, reference) {
            Ok(resolved) => ResolveLine {
                expression,
                date: Some(resolved.date),
                rule: Some(resolved.rule.as_str()),
                interpretation: Some(resolved.interpretation),
                error: None,
            },
            Err(e) => {
                all_resolved = false;
                ResolveLine {
                    expression,
                    date: None,
                    rule: None,
                    interpretation: None,
                    error: Some(e.to_string()),
                }
            }
        };

        if args.common.json {
            println!("{}", serde_json::to_string(&line)?);
        } else {
            match line.date {
                Some(date) => println!("{}\t{}", expression, date.format("%Y-%m-%d")),
                None => println!("{}\tunparseable", expression),
            }
        }
    }

    Ok(if all_resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_trip(args: &TripArgs) -> anyhow::Result<ExitCode> {
    let reference = reference_from(&args.common)?;
    let resolver = resolver_from(&args.common);

    let dates = match resolver.resolve_trip(&args.depart, args.return_expr.as_deref(), reference) {
        Ok(dates) => dates,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.common.json {
        let line = TripLine {
            dates,
            nights: dates.nights(),
        };
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("departure\t{}", dates.departure.format("%Y-%m-%d"));
        if let Some(return_date) = dates.return_date {
            println!("return\t{}", return_date.format("%Y-%m-%d"));
        }
        if let Some(nights) = dates.nights() {
            println!("nights\t{nights}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn resolver_from(args: &ReferenceArgs) -> DateResolver {
    DateResolver::new(ResolveOptions {
        ordinal_scan_months: args.scan_months,
        roll_past_dates_forward: !args.no_roll_forward,
    })
}

fn reference_from(args: &ReferenceArgs) -> anyhow::Result<NaiveDateTime> {
    match args.reference.as_deref() {
        Some(s) => parse_reference(s),
        None => reference_in_timezone(Utc::now(), &args.timezone)
            .with_context(|| format!("cannot read current time in '{}'", args.timezone)),
    }
}

fn parse_reference(s: &str) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    bail!("invalid --reference '{s}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")
}

fn init_logging(verbose: bool) {
    let fallback_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
