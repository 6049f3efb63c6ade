use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{normalize_ones, normalize_tens, Combination, DigitPattern, Vocabulary};
use orchestrator::{
    Activation, ActivationOrder, FilterSummary, PairingOrchestrator, RunConfig, RunInputs, RunReport,
};
use pipeline::{AuditRow, FilterRegistry, LoadReport};
use sources::PairingSource;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Filter files picked up from the working directory when present
const DEFAULT_FILTER_FILES: [&str; 2] = [
    "pb_final_foundational_filters.csv",
    "pb_final_percentile_filters.csv",
];

/// final-pairing - Tens x Ones pairing with manual elimination filters
#[derive(Parser)]
#[command(name = "final-pairing")]
#[command(about = "Pair tens and ones patterns into 5-number sets and filter them", long_about = None)]
struct Cli {
    /// Additional filter CSV file (repeatable)
    #[arg(long = "filters", value_name = "PATH", global = true)]
    filters: Vec<PathBuf>,

    /// Do not load the default filter files
    #[arg(long, global = true)]
    no_default_filters: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PatternFiles {
    /// File with tens patterns (5 digits 0-6 per token)
    #[arg(long)]
    tens_file: PathBuf,

    /// File with ones patterns (5 digits 0-9 per token)
    #[arg(long)]
    ones_file: PathBuf,
}

#[derive(Args)]
struct Seeds {
    /// Seed draw, e.g. "01-16-21-47-60"
    #[arg(long, default_value = "")]
    seed: String,

    /// Previous seed draw
    #[arg(long, default_value = "")]
    prev_seed: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every combination a single tens/ones pair expands to
    Expand {
        #[arg(long)]
        tens: String,

        #[arg(long)]
        ones: String,
    },

    /// Generate the candidate pool from pattern files
    Generate {
        #[command(flatten)]
        patterns: PatternFiles,

        /// Print every candidate, not just the count
        #[arg(long)]
        list: bool,
    },

    /// List filters ranked by initial eliminations
    Filters {
        #[command(flatten)]
        patterns: PatternFiles,

        #[command(flatten)]
        seeds: Seeds,

        /// Include filters that eliminate nothing
        #[arg(long)]
        show_zero: bool,
    },

    /// Generate, filter, and audit
    Run {
        #[command(flatten)]
        patterns: PatternFiles,

        #[command(flatten)]
        seeds: Seeds,

        /// File with tracked 5-number sets
        #[arg(long)]
        tracked_file: Option<PathBuf>,

        /// Activate this filter id (repeatable, applied in the order given)
        #[arg(long = "filter", value_name = "ID")]
        filter_ids: Vec<String>,

        /// Activate every listed filter marked enabled
        #[arg(long, conflicts_with_all = ["filter_ids", "all"])]
        select_all: bool,

        /// Activate every listed filter
        #[arg(long, conflicts_with = "filter_ids")]
        all: bool,

        /// Apply bulk-activated filters by initial eliminations instead of load order
        #[arg(long)]
        rank: bool,

        /// Include zero-cut filters when bulk activating
        #[arg(long)]
        show_zero: bool,

        /// Let filters remove tracked combinations
        #[arg(long)]
        no_preserve: bool,

        /// Add tracked combinations that were not generated
        #[arg(long)]
        inject: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Write survivors to this file (.txt for plain lines, CSV otherwise)
        #[arg(long)]
        survivors_out: Option<PathBuf>,

        /// Write the tracked audit table as CSV
        #[arg(long)]
        audit_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Expand { tens, ones } => handle_expand(tens, ones)?,
        Commands::Generate { patterns, list } => handle_generate(patterns, *list)?,
        Commands::Filters {
            patterns,
            seeds,
            show_zero,
        } => {
            let config = RunConfig::default().with_hide_zero_cuts(!show_zero);
            let orchestrator = build_orchestrator(&cli, config)?;
            handle_filters(&orchestrator, &read_inputs(patterns, seeds, None)?)?
        }
        Commands::Run {
            patterns,
            seeds,
            tracked_file,
            filter_ids,
            select_all,
            all,
            rank,
            show_zero,
            no_preserve,
            inject,
            json,
            survivors_out,
            audit_out,
        } => {
            let activation = if !filter_ids.is_empty() {
                Activation::Ids(filter_ids.clone())
            } else if *select_all {
                Activation::EnabledByDefault
            } else if *all {
                Activation::All
            } else {
                Activation::None
            };
            let order = if *rank {
                ActivationOrder::InitialCuts
            } else {
                ActivationOrder::Registry
            };
            let config = RunConfig::default()
                .with_activation(activation)
                .with_order(order)
                .with_hide_zero_cuts(!show_zero)
                .with_preserve_tracked(!no_preserve)
                .with_inject_tracked(*inject);

            let orchestrator = build_orchestrator(&cli, config)?;
            let inputs = read_inputs(patterns, seeds, tracked_file.as_deref())?;
            let report = orchestrator.run(&inputs)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if let Some(path) = survivors_out {
                write_survivors(path, &report.survivor_combos())?;
                println!("{} Survivors written to {}", "✓".green(), path.display());
            }
            if let Some(path) = audit_out {
                write_audit(path, &report.audit)?;
                println!("{} Audit written to {}", "✓".green(), path.display());
            }
        }
    }

    Ok(())
}

/// Handle the 'expand' command
fn handle_expand(tens: &str, ones: &str) -> Result<()> {
    let tens = DigitPattern::parse(tens, Vocabulary::Tens).context("Invalid tens pattern")?;
    let ones = DigitPattern::parse(ones, Vocabulary::Ones).context("Invalid ones pattern")?;

    let combos = PairingSource::new().expand_pair(&tens, &ones);
    println!(
        "{}",
        format!("{} x {}: {} combinations", tens, ones, combos.len()).bold().blue()
    );
    for combo in &combos {
        println!("  {}", combo);
    }
    Ok(())
}

/// Handle the 'generate' command
fn handle_generate(patterns: &PatternFiles, list: bool) -> Result<()> {
    let start = Instant::now();
    let tens = normalize_tens(&read_text(&patterns.tens_file)?);
    let ones = normalize_ones(&read_text(&patterns.ones_file)?);
    warn_rejected("tens", &tens.rejected_tokens());
    warn_rejected("ones", &ones.rejected_tokens());

    let candidates = PairingSource::new().get_candidates(&tens.accepted, &ones.accepted);
    println!("{}Tens combos: {}", "• ".cyan(), tens.accepted.len());
    println!("{}Ones combos: {}", "• ".cyan(), ones.accepted.len());
    println!(
        "{} Generated candidates (pre-filter): {} in {:?}",
        "✓".green(),
        candidates.len(),
        start.elapsed()
    );
    if list {
        for combo in &candidates {
            println!("{}", combo);
        }
    }
    Ok(())
}

/// Handle the 'filters' command
fn handle_filters(orchestrator: &PairingOrchestrator, inputs: &RunInputs) -> Result<()> {
    let (prepared, listing) = orchestrator.survey(inputs);
    println!(
        "{}",
        format!(
            "{} filters against {} candidates:",
            listing.len(),
            prepared.pool.len()
        )
        .bold()
        .blue()
    );
    print_filters(&listing);
    Ok(())
}

fn build_orchestrator(cli: &Cli, config: RunConfig) -> Result<PairingOrchestrator> {
    let mut paths: Vec<PathBuf> = Vec::new();
    if !cli.no_default_filters {
        paths.extend(
            DEFAULT_FILTER_FILES
                .iter()
                .map(PathBuf::from)
                .filter(|p| p.exists()),
        );
    }
    paths.extend(cli.filters.iter().cloned());

    if paths.is_empty() {
        eprintln!("{} No filter files found; running without filters", "!".yellow());
        return Ok(PairingOrchestrator::new(Arc::new(FilterRegistry::new()), config));
    }

    tracing::info!("Loading filters from {} files", paths.len());
    let (orchestrator, report) = PairingOrchestrator::from_filter_paths(&paths, config)?;
    print_load_report(&report);
    Ok(orchestrator)
}

fn read_inputs(patterns: &PatternFiles, seeds: &Seeds, tracked: Option<&Path>) -> Result<RunInputs> {
    let mut inputs = RunInputs::new(
        read_text(&patterns.tens_file)?,
        read_text(&patterns.ones_file)?,
    )
    .with_seed(seeds.seed.clone())
    .with_prev_seed(seeds.prev_seed.clone());
    if let Some(path) = tracked {
        inputs = inputs.with_tracked(read_text(path)?);
    }
    Ok(inputs)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn warn_rejected(input: &str, tokens: &[&str]) {
    if tokens.is_empty() {
        return;
    }
    let shown: Vec<&str> = tokens.iter().take(5).copied().collect();
    let more = if tokens.len() > shown.len() { " ..." } else { "" };
    eprintln!(
        "{} Ignored invalid {} entries: {}{}",
        "!".yellow(),
        input,
        shown.join(", "),
        more
    );
}

fn print_load_report(report: &LoadReport) {
    for rejected in &report.rejected {
        eprintln!(
            "{} Skipped filter {} ({}:{}): {}",
            "!".yellow(),
            rejected.id,
            rejected.source,
            rejected.line,
            rejected.reason
        );
    }
    for (id, names) in &report.unknown_names {
        eprintln!(
            "{} Filter {} references unknown names: {}",
            "!".yellow(),
            id,
            names.join(", ")
        );
    }
}

fn print_filters(filters: &[FilterSummary]) {
    for filter in filters {
        let step = filter
            .step
            .map(|s| format!("[{:>2}] ", s))
            .unwrap_or_else(|| "     ".to_string());
        let mut line = format!(
            "{}{}: {} (init cuts {})",
            step, filter.id, filter.name, filter.initial_cuts
        );
        if let Some(eliminated) = filter.eliminated {
            line.push_str(&format!(", eliminated {}", eliminated));
        }
        if let Some(preserved) = filter.preserved.filter(|&p| p > 0) {
            line.push_str(&format!(", preserved {}", preserved));
        }
        if filter.step.is_some() {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
}

/// Helper function to format and print a run report
fn print_report(report: &RunReport) {
    let totals = &report.totals;
    for issue in &report.input_issues {
        eprintln!("{} Ignored {} input: {}", "!".yellow(), issue.input, issue.reason);
    }

    println!("{}", "Final Pairing".bold().blue());
    println!("{}Tens combos: {}", "• ".cyan(), totals.tens_patterns);
    println!("{}Ones combos: {}", "• ".cyan(), totals.ones_patterns);
    println!("{}Generated candidates (pre-filter): {}", "• ".cyan(), totals.generated);
    if totals.injected > 0 {
        println!("{}Injected tracked: {}", "• ".cyan(), totals.injected);
    }

    println!("\n{}", "Filters".bold().blue());
    print_filters(&report.filters);

    println!(
        "\n{}",
        format!("Remaining after manual filters: {}", totals.survivors).bold().blue()
    );

    if !report.audit.is_empty() {
        println!("\n{}", "Tracked sets".bold().blue());
        for row in &report.audit {
            println!("  {}", audit_line(row));
        }
    }

    let mut printed_tracked = false;
    for line in &report.survivors {
        if line.tracked {
            printed_tracked = true;
            let text = line.to_string();
            if line.would_eliminate.is_some() {
                println!("{}", text.yellow());
            } else {
                println!("{}", text);
            }
        } else {
            if printed_tracked {
                println!("---");
                printed_tracked = false;
            }
            println!("{}", line.combo);
        }
    }
}

fn audit_line(row: &AuditRow) -> String {
    let status = if row.survived {
        "survived".green()
    } else {
        "removed".red()
    };
    let mut line = format!(
        "{} {} (generated: {}, injected: {})",
        row.combo, status, row.generated, row.injected
    );
    if let (Some(id), Some(order)) = (&row.eliminated_by, row.eliminated_order) {
        line.push_str(&format!(", eliminated by {} at step {}", id, order));
    }
    if let (Some(id), Some(order)) = (&row.would_eliminate_by, row.would_eliminate_order) {
        line.push_str(&format!(", would be eliminated by {} at step {}", id, order));
    }
    line
}

/// Survivors as plain lines for `.txt`, otherwise a CSV `numbers` column.
fn write_survivors(path: &Path, survivors: &[Combination]) -> Result<()> {
    let is_txt = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_txt {
        let lines: Vec<String> = survivors.iter().map(Combination::to_string).collect();
        fs::write(path, lines.join("\n"))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["numbers"])?;
    for combo in survivors {
        writer.write_record([combo.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_audit(path: &Path, rows: &[AuditRow]) -> Result<()> {
    if rows.is_empty() {
        bail!("No tracked sets to audit; pass --tracked-file");
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combos() -> Vec<Combination> {
        vec![
            Combination::new([1, 16, 21, 47, 60]).unwrap(),
            Combination::new([2, 3, 4, 5, 6]).unwrap(),
        ]
    }

    #[test]
    fn test_write_survivors_txt_and_csv() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("survivors.txt");
        write_survivors(&txt, &combos()).unwrap();
        assert_eq!(fs::read_to_string(&txt).unwrap(), "01-16-21-47-60\n02-03-04-05-06");

        let csv_path = dir.path().join("survivors.csv");
        write_survivors(&csv_path, &combos()).unwrap();
        assert_eq!(
            fs::read_to_string(&csv_path).unwrap(),
            "numbers\n01-16-21-47-60\n02-03-04-05-06\n"
        );
    }

    #[test]
    fn test_write_audit_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        let row = AuditRow {
            combo: combos()[0],
            generated: true,
            survived: false,
            eliminated: true,
            eliminated_by: Some("F1".into()),
            eliminated_order: Some(2),
            eliminated_name: Some("High sum".into()),
            would_eliminate_by: None,
            would_eliminate_order: None,
            would_eliminate_name: None,
            injected: false,
            preserved: false,
        };
        write_audit(&path, &[row]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("combo,generated,survived,eliminated,eliminated_by,eliminated_order,eliminated_name,would_eliminate_by,would_eliminate_order,would_eliminate_name,injected,preserved")
        );
        assert_eq!(
            lines.next(),
            Some("01-16-21-47-60,true,false,true,F1,2,High sum,,,,false,false")
        );
        assert!(write_audit(&path, &[]).is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "final-pairing",
            "--no-default-filters",
            "run",
            "--tens-file",
            "t.txt",
            "--ones-file",
            "o.txt",
            "--filter",
            "F2",
            "--filter",
            "F1",
            "--no-preserve",
            "--filters",
            "extra.csv",
        ])
        .unwrap();
        assert!(cli.no_default_filters);
        assert_eq!(cli.filters, vec![PathBuf::from("extra.csv")]);
        match cli.command {
            Commands::Run {
                filter_ids,
                no_preserve,
                inject,
                ..
            } => {
                assert_eq!(filter_ids, vec!["F2", "F1"]);
                assert!(no_preserve);
                assert!(!inject);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_activation() {
        let parsed = Cli::try_parse_from([
            "final-pairing",
            "run",
            "--tens-file",
            "t.txt",
            "--ones-file",
            "o.txt",
            "--filter",
            "F1",
            "--all",
        ]);
        assert!(parsed.is_err());
    }
}
