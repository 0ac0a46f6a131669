//! One-shot command line front end.
//!
//! Loads a catalog (enrollment CSV export or catalog JSON), refuses to go on
//! if any section conflicts with itself, applies the requested filters in
//! order and lists every conflict-free schedule for the requested courses.
//!
//! `RUST_LOG` sets the log level (default: info). Logs go to stderr.

use anyhow::{Context, bail};
use schedule_assistant::{
    Catalog, PlannerConfig, SessionFilter, apply_filters, combinations_after_filter,
    load_catalog_from_csv, load_catalog_from_json, save_catalog_to_json, save_schedules_to_csv,
    save_schedules_to_json, search_schedules, validate_catalog,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "Usage: cli <catalog.csv|catalog.json> [options]\n\
Options:\n  \
  --config FILE            TOML planner configuration\n  \
  --courses A,B,...        Course codes to combine (in this order)\n  \
  --instructor TEXT        Keep sections with a session taught by TEXT\n  \
  --min-start H            Keep sections whose sessions all start at or after H\n  \
  --max-end H              Keep sections whose sessions all end at or before H\n  \
  --duration H             Keep sections whose sessions all last H hours\n  \
  --parallel               Check combinations on all cores\n  \
  --deadline-ms N          Give up after N milliseconds\n  \
  --output FILE            Write schedules as JSON\n  \
  --csv-output FILE        Write schedules as CSV\n  \
  --export-catalog FILE    Write the filtered catalog as JSON";

#[derive(Debug, Default)]
struct CliArgs {
    catalog: PathBuf,
    config: Option<PathBuf>,
    courses: Vec<String>,
    filters: Vec<SessionFilter>,
    parallel: bool,
    deadline_ms: Option<u64>,
    output: Option<PathBuf>,
    csv_output: Option<PathBuf>,
    export_catalog: Option<PathBuf>,
}

fn parse_hour(flag: &str, value: &str) -> anyhow::Result<u8> {
    let hour: u8 = value
        .parse()
        .with_context(|| format!("{flag} expects an hour between 0 and 24, got '{value}'"))?;
    if hour > 24 {
        bail!("{flag} expects an hour between 0 and 24, got '{value}'");
    }
    Ok(hour)
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut catalog = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--courses" => {
                parsed.courses = value("--courses")?
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
            }
            "--instructor" => parsed
                .filters
                .push(SessionFilter::Instructor(value("--instructor")?)),
            "--min-start" => {
                let hour = parse_hour("--min-start", &value("--min-start")?)?;
                parsed.filters.push(SessionFilter::MinStart(hour));
            }
            "--max-end" => {
                let hour = parse_hour("--max-end", &value("--max-end")?)?;
                parsed.filters.push(SessionFilter::MaxEnd(hour));
            }
            "--duration" => {
                let hours = parse_hour("--duration", &value("--duration")?)?;
                parsed.filters.push(SessionFilter::Duration(hours));
            }
            "--parallel" => parsed.parallel = true,
            "--deadline-ms" => {
                let raw = value("--deadline-ms")?;
                parsed.deadline_ms = Some(
                    raw.parse()
                        .with_context(|| format!("invalid --deadline-ms '{raw}'"))?,
                );
            }
            "--output" => parsed.output = Some(PathBuf::from(value("--output")?)),
            "--csv-output" => parsed.csv_output = Some(PathBuf::from(value("--csv-output")?)),
            "--export-catalog" => {
                parsed.export_catalog = Some(PathBuf::from(value("--export-catalog")?))
            }
            flag if flag.starts_with("--") => bail!("unknown option '{flag}'\n{USAGE}"),
            path => {
                if catalog.is_some() {
                    bail!("unexpected argument '{path}'\n{USAGE}");
                }
                catalog = Some(PathBuf::from(path));
            }
        }
    }

    parsed.catalog = catalog.with_context(|| format!("missing catalog path\n{USAGE}"))?;
    Ok(parsed)
}

fn load_catalog(path: &Path, config: &PlannerConfig) -> anyhow::Result<Catalog> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let catalog = if is_json {
        load_catalog_from_json(path)
    } else {
        load_catalog_from_csv(path, &config.ingest)
    };
    catalog.with_context(|| format!("failed to load catalog from {}", path.display()))
}

fn print_catalog(catalog: &Catalog) {
    for course in catalog.courses.values() {
        let sections = course
            .sections
            .values()
            .map(|s| format!("{} ({}/{})", s.id, s.enrolled, s.capacity))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}  {}  [{}]", course.code, course.name, sections);
    }
}

fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if args.parallel {
        config.search.parallel = true;
    }
    if args.deadline_ms.is_some() {
        config.search.deadline_ms = args.deadline_ms;
    }

    let catalog = load_catalog(&args.catalog, &config)?;
    println!(
        "Loaded {} course(s), {} section(s) from {}",
        catalog.len(),
        catalog.section_count(),
        catalog.metadata.source
    );

    if let Err(err) = validate_catalog(&catalog).into_result() {
        println!("Catalog failed validation: {err}");
        return Ok(ExitCode::from(2));
    }

    let filtered = apply_filters(&catalog, &args.filters);
    if !args.filters.is_empty() {
        info!("{} filter(s) applied", args.filters.len());
        println!(
            "Filtered catalog: {} course(s), {} section(s)",
            filtered.len(),
            filtered.section_count()
        );
    }

    if let Some(path) = &args.export_catalog {
        save_catalog_to_json(&filtered, path)?;
        println!("Catalog written to {}", path.display());
    }

    if args.courses.is_empty() {
        print_catalog(&filtered);
        return Ok(ExitCode::SUCCESS);
    }

    let combos = combinations_after_filter(&catalog, &filtered, &args.courses)?;
    let total = combos.total();
    let schedules = search_schedules(combos, &config.search_options())?;
    println!(
        "Found {} schedule(s) out of {} combination(s)",
        schedules.len(),
        total
    );
    for (idx, schedule) in schedules.iter().enumerate() {
        let chosen = schedule
            .sections()
            .iter()
            .map(|s| format!("{}-{}", s.course_code, s.section_id))
            .collect::<Vec<_>>()
            .join(", ");
        println!("#{}: {}", idx + 1, chosen);
    }

    if let Some(path) = &args.output {
        save_schedules_to_json(&schedules, path)?;
        println!("Schedules written to {}", path.display());
    }
    if let Some(path) = &args.csv_output {
        save_schedules_to_csv(&schedules, path)?;
        println!("Schedules written to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;
    run(args)
}
