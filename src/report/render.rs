//! Writing reports as text, TSV tables or JSON.

use super::AnalysisReport;
use crate::data::FeatureId;
use crate::error::{MetaPowerError, Result};
use crate::profile::IntensityProfile;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// One tab-separated file per table, written into a directory.
    Tsv,
    /// The whole report as pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = MetaPowerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            other => Err(MetaPowerError::InvalidParameter(format!(
                "unknown output format '{}' (expected text, tsv or json)",
                other
            ))),
        }
    }
}

/// Write `report` in `format`.
///
/// Text and JSON go to `output` (a file) or stdout when it is `None`. TSV
/// needs an output directory.
pub fn write_report(report: &AnalysisReport, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Tsv => {
            let dir = output.ok_or_else(|| {
                MetaPowerError::InvalidParameter("TSV output needs an output directory".to_string())
            })?;
            write_tsv_dir(report, dir)?;
        }
        OutputFormat::Text => write_to(output, report.to_string().as_bytes())?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            write_to(output, json.as_bytes())?;
        }
    }
    Ok(())
}

fn write_to(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => fs::write(path, bytes)?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(bytes)?;
            lock.flush()?;
        }
    }
    Ok(())
}

/// Write every table of the report into `dir`, returning the created files.
///
/// Files: `effect_sizes.tsv`, `sample_sizes.tsv`, `power_curve.tsv`,
/// `intensity_profile.tsv`.
pub fn write_tsv_dir(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let files = vec![
        write_effect_sizes(report, &dir.join("effect_sizes.tsv"))?,
        write_sample_sizes(report, &dir.join("sample_sizes.tsv"))?,
        write_power_curve(report, &dir.join("power_curve.tsv"))?,
        write_intensity_profile(report, &dir.join("intensity_profile.tsv"))?,
    ];
    log::info!("Wrote {} tables to {}", files.len(), dir.display());
    Ok(files)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())
}

fn write_effect_sizes(report: &AnalysisReport, path: &Path) -> Result<PathBuf> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(
        writer,
        "feature_id\tmz\trt\td\tmagnitude\tn_case\tmean_case\tsd_case\tn_control\tmean_control\tsd_control\tpooled_sd"
    )?;
    for e in &report.effects.effects {
        let id = FeatureId::parse(&e.feature_id);
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.6}\t{}\t{}\t{:.6}\t{:.6}\t{}\t{:.6}\t{:.6}\t{:.6}",
            e.feature_id,
            optional(id.mz),
            optional(id.rt),
            e.d,
            e.magnitude.name(),
            e.case.n,
            e.case.mean,
            e.case.sd,
            e.control.n,
            e.control.mean,
            e.control.sd,
            e.pooled_sd
        )?;
    }
    for s in &report.effects.skipped {
        let id = FeatureId::parse(&s.feature_id);
        writeln!(
            writer,
            "{}\t{}\t{}\tNA\tskipped\tNA\tNA\tNA\tNA\tNA\tNA\tNA",
            s.feature_id,
            optional(id.mz),
            optional(id.rt)
        )?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_sample_sizes(report: &AnalysisReport, path: &Path) -> Result<PathBuf> {
    let table = &report.sample_size_table;
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "effect_size\talpha\tpower_target\tn_per_group\tn_total\tachieved_power")?;
    for row in &table.rows {
        writeln!(
            writer,
            "{:.6}\t{}\t{}\t{}\t{}\t{:.6}",
            row.effect_size, table.alpha, table.power_target, row.n_per_group, row.n_total, row.achieved_power
        )?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_power_curve(report: &AnalysisReport, path: &Path) -> Result<PathBuf> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "effect_size\tn_per_group\tpower")?;
    for p in &report.power_curve.points {
        writeln!(writer, "{:.6}\t{}\t{:.6}", p.effect_size, p.n_per_group, p.power)?;
    }
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn write_intensity_profile(report: &AnalysisReport, path: &Path) -> Result<PathBuf> {
    let writer = BufWriter::new(File::create(path)?);
    write_profile_tsv(
        writer,
        &[("raw", &report.raw_profile), ("normalized", &report.normalized_profile)],
    )?;
    Ok(path.to_path_buf())
}

/// Write per-sample distributions as TSV, one block of rows per labelled stage.
pub fn write_profile_tsv<W: Write>(mut writer: W, stages: &[(&str, &IntensityProfile)]) -> Result<()> {
    writeln!(
        writer,
        "stage\tsample_id\tlabel\tn_observed\tn_missing\tmin\tq1\tmedian\tq3\tmax\tmean"
    )?;
    for (stage, profile) in stages {
        for s in &profile.samples {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                stage, s.sample_id, s.label, s.n_observed, s.n_missing, s.min, s.q1, s.median, s.q3, s.max, s.mean
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
