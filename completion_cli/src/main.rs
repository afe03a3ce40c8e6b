use clap::{Args, Parser, Subcommand};
use completion_core::report::{ProgressReporter, WeekReport};
use completion_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "progtrack")]
#[command(about = "Training program completion tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

/// Where the program definition and completion rows come from
#[derive(Args)]
struct SourceArgs {
    /// Program definition JSON (program_data or a program row)
    #[arg(long)]
    program: PathBuf,

    /// Program id completion rows are matched against
    #[arg(long)]
    program_id: ProgramId,

    /// Directory with exercise_logs, metcon_completions and engine_sessions exports
    #[arg(long)]
    rows: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Program summary: current day, month progress, task totals
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Generated weeks to include (defaults to every week)
        #[arg(long, value_delimiter = ',')]
        weeks: Vec<u32>,
    },

    /// Day-by-day completion for one week
    Week {
        week: u32,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Block completion for one day
    Day {
        week: u32,
        day: u32,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    completion_core::logging::init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Report { source, weeks } => {
            let scope = if weeks.is_empty() {
                AggregationScope::program(source.program_id)
            } else {
                AggregationScope::generated(source.program_id, weeks)
            };
            let reporter = build_reporter(&source, &scope, &config)?;
            cmd_report(&reporter, cli.json)
        }
        Commands::Week { week, source } => {
            let scope = AggregationScope::week(source.program_id, week);
            let reporter = build_reporter(&source, &scope, &config)?;
            cmd_week(&reporter, week, cli.json)
        }
        Commands::Day { week, day, source } => {
            let scope = AggregationScope::week(source.program_id, week);
            let reporter = build_reporter(&source, &scope, &config)?;
            cmd_day(&reporter, week, day, cli.json)
        }
    }
}

/// Load the definition and all rows once, then aggregate
fn build_reporter(
    source: &SourceArgs,
    scope: &AggregationScope,
    config: &Config,
) -> Result<ProgressReporter> {
    let tree = program::load_file(&source.program)?;
    let rows_dir: &Path = source
        .rows
        .as_deref()
        .unwrap_or(config.data.rows_dir.as_path());
    let rows = CompletionRows::load_dir(rows_dir)?;
    let index = rows.index_for(source.program_id);
    tracing::debug!(
        "Indexed {} exercise keys for program {}",
        index.exercise_key_count(),
        source.program_id
    );

    Ok(report(&tree, &index, scope, &config.schedule))
}

fn cmd_report(reporter: &ProgressReporter, json: bool) -> Result<()> {
    let summary = reporter.program_progress();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let current = reporter.current_day_report();
    let totals = reporter.task_totals();

    println!("Program {}", reporter.completion().program_id);
    match (current.week, current.day) {
        (Some(week), Some(day)) => println!(
            "  Current day:    {} of {} (week {}, day {})",
            current.current_day, current.total_program_days, week, day
        ),
        _ => println!(
            "  Current day:    {} of {}",
            current.current_day, current.total_program_days
        ),
    }
    println!("  Month progress: {}%", current.month_progress_percent);
    println!(
        "  Tasks:          {}/{} ({}%)",
        totals.total_tasks_completed,
        totals.total_tasks_assigned,
        totals.percent()
    );
    println!(
        "  Blocks:         {}/{}",
        summary.completed_blocks, summary.total_blocks
    );

    Ok(())
}

fn cmd_week(reporter: &ProgressReporter, week: u32, json: bool) -> Result<()> {
    let Some(report) = reporter.week_report(week) else {
        println!("No data for week {}", week);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    display_week(&report);
    Ok(())
}

fn display_week(report: &WeekReport) {
    println!("Week {}", report.week);
    for day in &report.days {
        let mut tags = Vec::new();
        if day.is_deload {
            tags.push("deload");
        }
        if day.is_test_week {
            tags.push("test");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };

        println!(
            "  Day {}  {:<24} {:>3}%{}",
            day.day, day.day_name, day.completion_percentage, tags
        );
    }
    if let Some(day) = report.upcoming_day {
        println!("  Upcoming: day {}", day);
    }
}

fn cmd_day(reporter: &ProgressReporter, week: u32, day: u32, json: bool) -> Result<()> {
    let Some(progress) = reporter.day_percentage(week, day) else {
        println!("No data for week {}, day {}", week, day);
        return Ok(());
    };
    let blocks = reporter.block_completions(week, day);

    if json {
        let value = serde_json::json!({
            "day": serde_json::to_value(&progress)?,
            "blocks": serde_json::to_value(&blocks)?,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "Week {}, day {}: {}% complete",
        week, day, progress.completion_percentage
    );
    for block in blocks.iter().filter(|b| b.total_count > 0) {
        let mark = if block.is_complete { "✓" } else { " " };
        println!(
            "  {} {:<24} {}/{}",
            mark, block.block_name, block.completed_count, block.total_count
        );
    }

    Ok(())
}
