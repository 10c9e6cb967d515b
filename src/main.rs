//! docdiff command-line interface.
//!
//! Parses both inputs, applies normalizer rules, compares, filters and
//! renders the report. Exit code 0 means no differences, 1 means differences
//! were found, 2 means an error occurred.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use docdiff::{
    compare_input_files, filter_report, format_report, normalize_stream, parse_file, parse_stdin,
    CompareSettings, ConfigFile, DocumentStream, FilterConfig, FormatHint, IgnoreNormalizer,
    OutputFormat, OutputOptions,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// docdiff - structural diff for YAML, JSON and TOML documents
///
/// Compares two document streams document by document, correlating list
/// entries by identifier and reporting additions, removals, modifications
/// and order changes per path.
#[derive(Parser)]
#[command(name = "docdiff")]
#[command(version)]
#[command(about = "Structural diff for YAML, JSON and TOML documents", long_about = None)]
struct Cli {
    /// Original input ("-" reads standard input)
    #[arg(value_name = "FROM")]
    from: PathBuf,

    /// Changed input ("-" reads standard input)
    #[arg(value_name = "TO")]
    to: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormatArg,

    /// Do not report entries that only moved within a list
    #[arg(short = 'i', long)]
    ignore_order_changes: bool,

    /// Do not report the appearance of this path (repeatable)
    #[arg(long, value_name = "PATH")]
    ignore_addition: Vec<String>,

    /// Do not report the disappearance of this path (repeatable)
    #[arg(long, value_name = "PATH")]
    ignore_removal: Vec<String>,

    /// A guessed list identifier needs more distinct values than this
    #[arg(long, value_name = "COUNT")]
    identifier_threshold: Option<usize>,

    /// JSON pointer removed from every document before comparing (repeatable)
    #[arg(long, value_name = "POINTER")]
    normalize_path: Vec<String>,

    /// Only report diffs whose path matches this pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    filter: Vec<String>,

    /// Drop diffs whose path matches this pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Render paths with dots instead of slashes
    #[arg(long)]
    dot_paths: bool,

    /// Skip the header line
    #[arg(long)]
    omit_header: bool,

    /// Show full values instead of previews
    #[arg(long)]
    show_values: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (print nothing, only set the exit code)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Coloured narrative
    Human,
    /// Narrative without colours
    Plain,
    /// Raw diff list as JSON
    Json,
    /// Raw diff list as YAML
    Yaml,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Plain => OutputFormat::Plain,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug and the
/// default is warnings only.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    if cli.from.as_os_str() == "-" && cli.to.as_os_str() == "-" {
        anyhow::bail!("only one of FROM and TO can read standard input");
    }

    let config = match &cli.config {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ConfigFile::default(),
    };

    let mut from = read_input(&cli.from)
        .with_context(|| format!("Failed to parse first input: {}", cli.from.display()))?;
    let mut to = read_input(&cli.to)
        .with_context(|| format!("Failed to parse second input: {}", cli.to.display()))?;

    let normalizer = IgnoreNormalizer::from_paths(&cli.normalize_path)
        .context("Invalid --normalize-path")?
        .merge(
            IgnoreNormalizer::from_config_rules(&config.normalize)
                .context("Invalid normalize rule in config")?,
        );
    if !normalizer.is_empty() {
        normalize_stream(&normalizer, &mut from)?;
        normalize_stream(&normalizer, &mut to)?;
    }

    let settings = compare_settings(&cli, &config);
    debug!(?settings, "comparing");
    let report = compare_input_files(from, to, &settings).context("Failed to compare inputs")?;

    let filters = filter_config(&cli, &config);
    let report = filter_report(report, &filters);

    if !cli.quiet {
        let options = OutputOptions {
            omit_header: cli.omit_header,
            dot_paths: cli.dot_paths,
            show_values: cli.show_values,
            max_value_length: cli.max_value_length,
        };
        let output = format_report(&report, &cli.output.into(), &options)
            .context("Failed to format report")?;
        println!("{}", output);
    }

    if report.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn read_input(path: &Path) -> Result<DocumentStream> {
    if path.as_os_str() == "-" {
        Ok(parse_stdin(FormatHint::Auto)?)
    } else {
        Ok(parse_file(path)?)
    }
}

/// Config file values first, command-line flags on top.
fn compare_settings(cli: &Cli, config: &ConfigFile) -> CompareSettings {
    let mut settings = config
        .apply(CompareSettings::default())
        .paths_to_ignore_addition(cli.ignore_addition.iter().cloned())
        .paths_to_ignore_removal(cli.ignore_removal.iter().cloned());
    if cli.ignore_order_changes {
        settings = settings.ignore_order_changes(true);
    }
    if let Some(threshold) = cli.identifier_threshold {
        settings = settings.non_standard_identifier_guess_count_threshold(threshold);
    }
    settings
}

fn filter_config(cli: &Cli, config: &ConfigFile) -> FilterConfig {
    let only = config.filter.iter().chain(&cli.filter);
    let ignore = config.exclude.iter().chain(&cli.exclude);
    let filters = only.fold(FilterConfig::new(), |filters, pattern| filters.only(pattern));
    ignore.fold(filters, |filters, pattern| filters.ignore(pattern))
}
