//! metapower - Metabolomics effect size and power projection CLI
//!
//! Command-line interface for projecting follow-up sample sizes from a pilot
//! LC-MS intensity table.

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use metapower::data::{reshape, RawTable, ReshapeOptions};
use metapower::error::Result;
use metapower::pipeline::{AnalysisConfig, Delimiter, Pipeline};
use metapower::power::{sample_size_table, TwoSampleTTest, DEFAULT_ALPHA};
use metapower::profile::profile_intensity;
use metapower::report::{write_profile_tsv, write_report, OutputFormat};
use std::path::{Path, PathBuf};

/// CLI-friendly output format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Human-readable summary
    Text,
    /// Tab-separated tables (one file per table for `run`)
    Tsv,
    /// Pretty-printed JSON
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Tsv => OutputFormat::Tsv,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// Metabolomics effect size and power projection
#[derive(Parser)]
#[command(name = "metapower")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on an intensity table
    Run {
        /// Path to the intensity table (features x samples, CSV or TSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Path to an analysis configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Case group label
        #[arg(long)]
        case: Option<String>,

        /// Control group label
        #[arg(long)]
        control: Option<String>,

        /// Name of the row holding group labels
        #[arg(long)]
        label_row: Option<String>,

        /// Name of the column holding group labels (samples already in rows)
        #[arg(long, conflicts_with = "label_row")]
        label_column: Option<String>,

        /// Target power of the follow-up study
        #[arg(long)]
        power: Option<f64>,

        /// Significance level
        #[arg(long)]
        alpha: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliFormat,

        /// Output file (text, json) or directory (tsv); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Power of a two-sample t-test for a given effect size and group size
    Power {
        /// Cohen's d
        #[arg(short = 'd', long)]
        effect_size: f64,

        /// Samples per group
        #[arg(short, long)]
        n: usize,

        /// Significance level (default: 0.05)
        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,
    },

    /// Samples per group needed to reach a target power
    SampleSize {
        /// Cohen's d; repeat or separate with commas for a table
        #[arg(short = 'd', long, value_delimiter = ',', required = true)]
        effect_size: Vec<f64>,

        /// Target power (default: 0.8)
        #[arg(short, long, default_value = "0.8")]
        power: f64,

        /// Significance level (default: 0.05)
        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,
    },

    /// Write an example analysis configuration
    Example {
        /// Output path for the YAML file
        #[arg(short, long, default_value = "metapower.yaml")]
        output: PathBuf,
    },

    /// Profile the intensity distributions of a table
    Profile {
        /// Path to the intensity table (features x samples, CSV or TSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the row holding group labels
        #[arg(long, default_value = "Label")]
        label_row: String,

        /// Output format (tsv is written to stdout)
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            case,
            control,
            label_row,
            label_column,
            power,
            alpha,
            format,
            output,
        } => cmd_run(
            &input,
            config.as_deref(),
            RunOverrides {
                case,
                control,
                label_row,
                label_column,
                power,
                alpha,
            },
            format.into(),
            output.as_deref(),
        ),

        Commands::Power {
            effect_size,
            n,
            alpha,
        } => cmd_power(effect_size, n, alpha),

        Commands::SampleSize {
            effect_size,
            power,
            alpha,
        } => cmd_sample_size(&effect_size, power, alpha),

        Commands::Example { output } => cmd_example(&output),

        Commands::Profile {
            input,
            label_row,
            format,
        } => cmd_profile(&input, &label_row, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Command-line values that take precedence over the configuration file.
struct RunOverrides {
    case: Option<String>,
    control: Option<String>,
    label_row: Option<String>,
    label_column: Option<String>,
    power: Option<f64>,
    alpha: Option<f64>,
}

/// Run the full analysis
fn cmd_run(
    input: &Path,
    config_path: Option<&Path>,
    overrides: RunOverrides,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            AnalysisConfig::from_file(path)?
        }
        None => AnalysisConfig::default(),
    };

    let mut pipeline = Pipeline::from_config(&config);
    if let Some(name) = overrides.label_row {
        pipeline = pipeline.label_row(&name);
    }
    if let Some(name) = overrides.label_column {
        pipeline = pipeline.label_column(&name);
    }
    if let Some(case) = overrides.case {
        pipeline = pipeline.case(&case);
    }
    if let Some(control) = overrides.control {
        pipeline = pipeline.control(&control);
    }
    if let Some(power) = overrides.power {
        pipeline = pipeline.power_target(power);
    }
    if let Some(alpha) = overrides.alpha {
        pipeline = pipeline.alpha(alpha);
    }

    eprintln!("Running analysis '{}' on {:?}...", pipeline.config().name, input);
    let report = pipeline.run_path(input)?;

    eprintln!(
        "Done! {} samples x {} features, {} effect sizes ({} skipped)",
        report.n_samples,
        report.n_features,
        report.effects.len(),
        report.effects.skipped.len()
    );
    if let Some(observed) = &report.observed {
        eprintln!(
            "  Mean |d| = {:.3}: {} samples per group for power {:.2}",
            observed.effect_size, observed.n_per_group, observed.power_target
        );
    }

    write_report(&report, format, output)?;
    if let Some(path) = output {
        eprintln!("Wrote report to {:?}", path);
    }
    Ok(())
}

/// Achieved power for one design
fn cmd_power(effect_size: f64, n: usize, alpha: f64) -> Result<()> {
    let test = TwoSampleTTest::new(alpha)?;
    let power = test.achieved_power(effect_size, n)?;
    println!(
        "d = {}, n = {} per group, alpha = {}: power = {:.4}",
        effect_size, n, alpha, power
    );
    Ok(())
}

/// Required samples per group
fn cmd_sample_size(effect_sizes: &[f64], power: f64, alpha: f64) -> Result<()> {
    let test = TwoSampleTTest::new(alpha)?;
    if let [effect_size] = effect_sizes {
        let n = test.required_n(*effect_size, power)?;
        let exact = test.solve_n(*effect_size, power)?;
        println!(
            "d = {}, power = {}, alpha = {}: n = {} per group ({:.4} exact)",
            effect_size, power, alpha, n, exact
        );
        return Ok(());
    }
    let table = sample_size_table(&test, effect_sizes, power)?;
    print!("{}", table);
    Ok(())
}

/// Generate an example configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let config = AnalysisConfig::example();
    let yaml = format!(
        "# metapower analysis configuration\n\
         # input.label: {{row: <name>}} when samples are columns, {{column: <name>}} when samples are rows\n\
         # effect.correction: none | hedges\n\
         # effect.on_insufficient: skip_and_warn | fail\n\
         {}",
        config.to_yaml()?
    );

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}

/// Profile an intensity table
fn cmd_profile(input: &Path, label_row: &str, format: CliFormat) -> Result<()> {
    eprintln!("Loading intensity table...");
    let table = RawTable::from_path(input, Delimiter::from_path(input).as_byte())?;
    let matrix = reshape(&table, &ReshapeOptions::label_row(label_row))?;
    let profile = profile_intensity(&matrix);

    match format {
        CliFormat::Text => print!("{}", profile),
        CliFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        CliFormat::Tsv => write_profile_tsv(std::io::stdout().lock(), &[("raw", &profile)])?,
    }
    Ok(())
}
