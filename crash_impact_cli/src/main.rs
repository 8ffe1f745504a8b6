use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use crash_impact::{
    default_race, filter_crashes, group_by_rider, races_in, rank_riders, rank_teams,
    report_file_name, search_riders, severity_counts, sort_crashes, team_statistics,
    write_team_report, CrashError, CrashEvent, CrashFilter, Dataset, DatasetStore,
    GeneratorConfig, Phase, RiderSummary, Severity, SortDirection, SortKey, TeamStats,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod chart;

#[derive(Parser, Debug)]
#[command(author, version, about = "Cycling crash-impact telemetry dashboard", long_about = None)]
struct Cli {
    /// Seed for a reproducible dataset
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Timestamp (RFC 3339) the 30-day crash window ends at
    #[arg(long, global = true)]
    anchor: Option<DateTime<Utc>>,

    /// Generator config JSON (flags override its fields)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Severity overview for the selected race
    Summary(FilterArgs),
    /// Crash table, filtered and sorted
    Crashes(CrashesArgs),
    /// Per-rider aggregates, most severe first
    Riders(RidersArgs),
    /// Per-team statistics, most crashes first
    Teams(TeamsArgs),
    /// Write a team's crash report as CSV
    Report(ReportArgs),
    /// Details for one crash
    Show(ShowArgs),
    /// Render SVG charts
    Plot(PlotArgs),
    /// Dump the dataset as JSON
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct FilterArgs {
    /// Race to show (defaults to the first race in the dataset)
    #[arg(long, conflicts_with = "all_races")]
    race: Option<String>,

    /// Ignore the race selection
    #[arg(long, action = ArgAction::SetTrue)]
    all_races: bool,

    /// Case-insensitive match on rider, location, team or race
    #[arg(long, short)]
    search: Option<String>,
}

#[derive(Parser, Debug)]
struct CrashesArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Sort column: rider, team, hic, bric, acceleration, location, km, race or date
    #[arg(long, default_value_t = SortKey::Hic, value_parser = str::parse::<SortKey>)]
    sort: SortKey,

    /// Sort ascending instead of descending
    #[arg(long, action = ArgAction::SetTrue)]
    asc: bool,
}

#[derive(Parser, Debug)]
struct RidersArgs {
    /// Case-insensitive match on rider or team name
    #[arg(long, short)]
    search: Option<String>,

    /// List each rider's crashes, most severe first
    #[arg(long, action = ArgAction::SetTrue)]
    details: bool,
}

#[derive(Parser, Debug)]
struct TeamsArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// List each team's crashes with location, km and recovery time
    #[arg(long, action = ArgAction::SetTrue)]
    details: bool,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Team name as listed by `teams`
    #[arg(long)]
    team: String,

    /// Restrict the report to one race
    #[arg(long)]
    race: Option<String>,

    /// Output CSV path (`-` for stdout, default `<team>_crash_report.csv`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Crash id, e.g. crash-3
    id: String,
}

#[derive(Parser, Debug)]
struct PlotArgs {
    #[command(subcommand)]
    target: PlotTarget,
}

#[derive(Subcommand, Debug)]
enum PlotTarget {
    /// Acceleration waveform of one crash
    Waveform {
        /// Crash id, e.g. crash-3
        #[arg(required_unless_present = "rider", conflicts_with = "rider")]
        id: Option<String>,

        /// Plot the most severe crash of this rider (name or rider id)
        #[arg(long)]
        rider: Option<String>,

        /// Output SVG path (default `<crash id>_waveform.svg`)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// HIC, BRIC and acceleration across crashes
    Metrics {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output SVG path
        #[arg(short, long, default_value = "crash_metrics.svg", value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Output JSON path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = resolve_config(&cli)?;
    let store = DatasetStore::new(config);

    match cli.command {
        Command::Summary(args) => handle_summary(&store, &args),
        Command::Crashes(args) => handle_crashes(&store, &args),
        Command::Riders(args) => handle_riders(&store, &args),
        Command::Teams(args) => handle_teams(&store, &args),
        Command::Report(args) => handle_report(&store, &args),
        Command::Show(args) => handle_show(&store, &args),
        Command::Plot(args) => handle_plot(&store, args),
        Command::Dump(args) => handle_dump(&store, &args),
    }
}

fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => load_generator_config(path)?,
        None => GeneratorConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.anchor.is_some() {
        config.anchor = cli.anchor;
    }
    debug!(?config, "Resolved generator config");
    Ok(config)
}

fn load_generator_config(path: &Path) -> Result<GeneratorConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid config", path.display()))
}

/// Build the dashboard filter: an explicit race wins, `--all-races` clears the
/// selection, otherwise the first race in the dataset is selected.
fn resolve_filter(args: &FilterArgs, dataset: &Dataset) -> CrashFilter {
    let race = if args.all_races {
        None
    } else {
        args.race
            .clone()
            .or_else(|| default_race(&dataset.crashes).map(str::to_string))
    };
    CrashFilter {
        race,
        search: args.search.clone().unwrap_or_default(),
    }
}

fn race_caption(filter: &CrashFilter) -> &str {
    filter.race.as_deref().unwrap_or("All Races")
}

fn handle_summary(store: &DatasetStore, args: &FilterArgs) -> Result<()> {
    let dataset = store.get();
    let filter = resolve_filter(args, &dataset);
    let crashes = filter_crashes(&dataset.crashes, &filter);
    let counts = severity_counts(crashes.iter().copied());

    println!("Crash Impact Dashboard");
    println!(
        "{} teams, {} riders, {} crashes generated",
        dataset.teams.len(),
        dataset.rider_count(),
        dataset.crashes.len()
    );
    println!("Races: {}", races_in(&dataset.crashes).join(", "));
    println!();
    println!("Total crashes      {:>4}  in {}", counts.total(), race_caption(&filter));
    for severity in [Severity::Critical, Severity::HighRisk, Severity::Moderate] {
        println!(
            "{:<18} {:>4}  {}",
            severity.label(),
            counts.get(severity),
            severity.hic_band()
        );
    }
    println!();
    println!("Fingerprint: {}", dataset.fingerprint()?);
    Ok(())
}

fn handle_crashes(store: &DatasetStore, args: &CrashesArgs) -> Result<()> {
    let dataset = store.get();
    let filter = resolve_filter(&args.filter, &dataset);
    let mut crashes = filter_crashes(&dataset.crashes, &filter);
    let direction = if args.asc {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };
    let key = args.sort;
    sort_crashes(&mut crashes, key, direction);
    info!(
        "{} crashes in {}, sorted by {} {:?}",
        crashes.len(),
        race_caption(&filter),
        key,
        direction
    );

    println!(
        "{:<10} {:<9} {:<20} {:>3} {:<18} {:>5} {:>5} {:>7} {:<28} {:>6} {:<10}",
        "Severity", "ID", "Cyclist", "#", "Team", "HIC", "BRIC", "Accel", "Location", "KM", "Date"
    );
    for crash in &crashes {
        println!(
            "{:<10} {:<9} {:<20} {:>3} {:<18} {:>5} {:>5} {:>7.1} {:<28} {:>6.1} {:<10}",
            crash.severity().label(),
            crash.id,
            crash.rider.name,
            crash.rider.number,
            crash.team,
            crash.hic,
            crash.bric,
            crash.acceleration,
            crash.location,
            crash.km,
            crash.date.format("%Y-%m-%d")
        );
    }
    if crashes.is_empty() {
        warn!("No crashes match the current filter");
    }
    Ok(())
}

fn handle_riders(store: &DatasetStore, args: &RidersArgs) -> Result<()> {
    let dataset = store.get();
    let riders = rank_riders(group_by_rider(&dataset.crashes));
    let riders = search_riders(riders, args.search.as_deref().unwrap_or(""));

    println!(
        "{:<20} {:>3} {:<18} {:>7} {:>7} {:>8} {:>9}  {:<10}",
        "Cyclist", "#", "Team", "Crashes", "Max HIC", "Max BRIC", "Max Accel", "Severity"
    );
    for summary in &riders {
        println!(
            "{:<20} {:>3} {:<18} {:>7} {:>7} {:>8} {:>9.1}  {:<10}",
            summary.rider.name,
            summary.rider.number,
            summary.team,
            summary.total_crashes,
            summary.max_hic,
            summary.max_bric,
            summary.max_acceleration,
            summary.severity().label()
        );
        if args.details {
            for line in rider_crash_lines(summary) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn rider_crash_lines(summary: &RiderSummary<'_>) -> Vec<String> {
    summary
        .crashes_by_hic()
        .into_iter()
        .map(|crash| {
            format!(
                "    {:<9} {:<10} {:<22} {}, km {:.1}  HIC {}  {:.1}g",
                crash.id,
                crash.severity().label(),
                crash.race,
                crash.location,
                crash.km,
                crash.hic,
                crash.acceleration
            )
        })
        .collect()
}

fn team_crash_lines(stats: &TeamStats<'_>) -> Vec<String> {
    if stats.crashes.is_empty() {
        return vec!["    No crashes recorded for this team.".to_string()];
    }
    stats
        .crashes
        .iter()
        .map(|crash| {
            format!(
                "    {:<9} {:<10} {:<20} {}, km {:.1}  HIC {}  recovery {}",
                crash.id,
                crash.severity().label(),
                crash.rider.name,
                crash.location,
                crash.km,
                crash.hic,
                crash.recovery_time()
            )
        })
        .collect()
}

fn handle_teams(store: &DatasetStore, args: &TeamsArgs) -> Result<()> {
    let dataset = store.get();
    let filter = resolve_filter(&args.filter, &dataset);
    let crashes = filter_crashes(&dataset.crashes, &filter);
    let stats = rank_teams(team_statistics(&dataset.teams, crashes.iter().copied()));

    println!("Teams in {}", race_caption(&filter));
    println!(
        "{:<18} {:<15} {:>6} {:>7} {:>7} {:>7} {:>8}",
        "Team", "Country", "Riders", "Crashes", "Avg HIC", "Max HIC", "Critical"
    );
    for team in &stats {
        println!(
            "{:<18} {:<15} {:>6} {:>7} {:>7.1} {:>7} {:>8}",
            team.team.name,
            team.team.country,
            team.team.riders.len(),
            team.crash_count,
            team.avg_hic,
            team.max_hic,
            team.critical_crashes
        );
        if args.details {
            for line in team_crash_lines(team) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn handle_report(store: &DatasetStore, args: &ReportArgs) -> Result<()> {
    let dataset = store.get();
    let team = dataset
        .team(&args.team)
        .ok_or_else(|| CrashError::UnknownTeam(args.team.clone()))?;
    let filter = CrashFilter {
        race: args.race.clone(),
        search: String::new(),
    };
    let crashes = filter_crashes(&dataset.crashes, &filter);
    let stats = team_statistics(std::slice::from_ref(team), crashes.iter().copied());
    let team_crashes = stats
        .first()
        .map(|s| s.crashes.clone())
        .unwrap_or_default();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report_file_name(&team.name)));
    if output.as_os_str() == "-" {
        let stdout = io::stdout();
        write_team_report(stdout.lock(), team_crashes.iter().copied())?;
    } else {
        let file = File::create(&output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        write_team_report(file, team_crashes.iter().copied())?;
        info!(
            "Wrote {} report rows for {}: {}",
            team_crashes.len(),
            team.name,
            output.display()
        );
    }
    Ok(())
}

fn find_crash<'a>(dataset: &'a Dataset, id: &str) -> Result<&'a CrashEvent> {
    dataset
        .crash(id)
        .ok_or_else(|| CrashError::UnknownCrash(id.to_string()).into())
}

/// The most severe crash of a rider, matched by rider id or exact name.
fn find_worst_crash<'a>(dataset: &'a Dataset, rider: &str) -> Result<&'a CrashEvent> {
    group_by_rider(&dataset.crashes)
        .into_iter()
        .find(|summary| summary.rider.id == rider || summary.rider.name == rider)
        .and_then(|summary| summary.worst_crash())
        .ok_or_else(|| CrashError::UnknownRider(rider.to_string()).into())
}

fn handle_show(store: &DatasetStore, args: &ShowArgs) -> Result<()> {
    let dataset = store.get();
    let crash = find_crash(&dataset, &args.id)?;
    let severity = crash.severity();

    println!("{} #{} ({})", crash.rider.name, crash.rider.number, crash.team);
    println!("{} at {}, km {:.1}", crash.race, crash.location, crash.km);
    println!("{}", crash.date.format("%A, %B %-d, %Y"));
    println!();
    println!(
        "HIC           {:>7}  {} ({})",
        crash.hic,
        severity.label(),
        severity.hic_band()
    );
    println!("BRIC          {:>7}  {} risk", crash.bric, crash.bric_risk().label());
    println!(
        "Acceleration  {:>7.1}  {} impact",
        crash.acceleration,
        crash.impact_class().label()
    );
    println!("Recovery      {:>7}", crash.recovery_time());

    match crash.realized_peak() {
        Some(peak) => {
            let phase = Phase::of((peak.time / crash_impact::waveform::SAMPLE_INTERVAL_MS) as usize);
            println!(
                "Recorded peak {:>7.1}  at {} ms ({} phase)",
                peak.value,
                peak.time,
                phase.label()
            );
        }
        None => warn!("Crash {} has no waveform samples", crash.id),
    }
    Ok(())
}

fn handle_plot(store: &DatasetStore, args: PlotArgs) -> Result<()> {
    let dataset = store.get();
    match args.target {
        PlotTarget::Waveform { id, rider, output } => {
            let crash = match (id, rider) {
                (Some(id), _) => find_crash(&dataset, &id)?,
                (None, Some(rider)) => find_worst_crash(&dataset, &rider)?,
                (None, None) => return Err(anyhow!("a crash id or --rider is required")),
            };
            let path =
                output.unwrap_or_else(|| PathBuf::from(format!("{}_waveform.svg", crash.id)));
            chart::render_guard(|| chart::render_waveform(crash, &path)).map_err(|e| anyhow!(e))?;
            info!("Wrote plot: {}", path.display());
        }
        PlotTarget::Metrics { filter, output } => {
            let filter = resolve_filter(&filter, &dataset);
            let crashes = filter_crashes(&dataset.crashes, &filter);
            if crashes.is_empty() {
                warn!("No crashes match the current filter; writing an empty chart");
            }
            chart::render_guard(|| chart::render_metrics(&crashes, &output))
                .map_err(|e| anyhow!(e))?;
            info!("Wrote plot: {}", output.display());
        }
    }
    Ok(())
}

fn handle_dump(store: &DatasetStore, args: &DumpArgs) -> Result<()> {
    let dataset = store.get();
    if args.output.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, dataset.as_ref())?;
        writeln!(handle)?;
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        serde_json::to_writer_pretty(file, dataset.as_ref())?;
        info!("Wrote dataset JSON: {}", args.output.display());
    }
    Ok(())
}
