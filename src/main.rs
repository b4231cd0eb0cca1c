//! ab-testing: CLI entry point.
//!
//! Runs the hypothesis-test analyses declared in YAML files.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use tracing::Level;

use ab_testing::report::{check_line, finding_lines, interval_line, ReportConfig};
use ab_testing::runner::{run_analysis, RunConfig};
use ab_testing::types::{load_analysis_dir, Analysis, Outcome};

#[derive(Parser)]
#[command(name = "ab-testing")]
#[command(about = "Assumption-driven hypothesis tests for A/B comparisons")]
#[command(version)]
struct Cli {
    /// Run all analyses.
    #[arg(long)]
    all: bool,

    /// Run a single analysis by name.
    #[arg(short, long, conflicts_with = "all")]
    name: Option<String>,

    /// Path to the analyses directory.
    #[arg(short, long, default_value = "analyses")]
    analyses: PathBuf,

    /// Significance level. Overrides a file's `_alpha` header but not an
    /// analysis's own `alpha` (default 0.05).
    #[arg(long)]
    alpha: Option<f64>,

    /// Decimal places in the report.
    #[arg(short, long, default_value_t = 4)]
    precision: usize,

    /// Print outcomes as JSON instead of the coloured report.
    #[arg(long)]
    json: bool,

    /// Log each decision step to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging to stderr
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Load analyses
    let analyses = load_analysis_dir(&cli.analyses)?;

    // Select analyses
    let selected: Vec<&Analysis> = match (&cli.name, cli.all) {
        (Some(name), _) => {
            let found: Vec<_> = analyses.iter().filter(|a| &a.name == name).collect();
            if found.is_empty() {
                anyhow::bail!("Analysis not found: {name}");
            }
            found
        }
        (None, true) => analyses.iter().collect(),
        (None, false) => {
            println!("{}", "ab-testing".bold());
            println!("  Analyses: {}", cli.analyses.display());
            println!("Loaded {} analyses", analyses.len());
            println!();
            println!("Use --all to run all analyses, or --name NAME to run one");
            return Ok(());
        }
    };

    // Run
    let run_config = RunConfig { alpha: cli.alpha };
    let report_config = ReportConfig {
        precision: cli.precision,
    };

    let start = Instant::now();
    let outcomes: Vec<Outcome> = selected
        .iter()
        .map(|a| run_analysis(a, &run_config))
        .collect();

    // Report
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        println!("{}", "Running analyses...".cyan());
        for outcome in &outcomes {
            print_outcome(outcome, &report_config);
        }
        print_summary(&outcomes, start.elapsed().as_secs_f64());
    }

    // Any error fails the run
    if outcomes.iter().any(Outcome::is_error) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(outcomes: &[Outcome], elapsed: f64) {
    let significant = outcomes.iter().filter(|o| o.is_significant()).count();
    let errors = outcomes.iter().filter(|o| o.is_error()).count();
    let other = outcomes.len() - significant - errors;

    // Summary
    println!();
    println!("{}", "=".repeat(60));
    if errors == 0 {
        println!(
            "  {} {} significant, {} other in {:.2}s",
            "DONE".green(),
            significant.to_string().green(),
            other,
            elapsed
        );
    } else {
        println!(
            "  {} {} significant, {} other, {} errors in {:.2}s",
            "ERROR".red(),
            significant,
            other,
            errors.to_string().red(),
            elapsed
        );
    }
    println!("{}", "=".repeat(60));
}

fn print_outcome(outcome: &Outcome, config: &ReportConfig) {
    match outcome {
        Outcome::Significant { name, finding } => {
            println!("  {} {} (significant)", "✓".green(), name.bold());
            for line in finding_lines(finding, config) {
                println!("      {line}");
            }
        }
        Outcome::NotSignificant { name, finding } => {
            println!("  {} {} (not significant)", "○".yellow(), name);
            for line in finding_lines(finding, config) {
                println!("      {}", line.dimmed());
            }
        }
        Outcome::Checked { name, checks, .. } => {
            let marker = if checks.iter().all(|c| c.passed) {
                "✓".green()
            } else {
                "○".yellow()
            };
            println!("  {marker} {name} (assumptions)");
            for check in checks {
                println!("      {}", check_line(check, config));
            }
        }
        Outcome::Estimate { name, interval } => {
            println!("  {} {} (estimate)", "✓".green(), name);
            println!("      {}", interval_line(interval, config));
        }
        Outcome::Error { name, error } => {
            println!("  {} {} (error)", "✗".red(), name.red());
            println!("      {error}");
        }
    }
}
