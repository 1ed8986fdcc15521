//! Report export.
//!
//! Writes one timestamped artifact directory per run:
//! - `manifest.json` — seed, fold count, roster, cache provenance
//! - `results_table.csv` — the full confusion table
//! - one tidy CSV per metric view

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::metrics::{AccuracyGap, MetricSeries};
use crate::runner::EvaluationReport;

#[derive(Debug, Serialize)]
struct ReportManifest<'a> {
    generated_at: String,
    seed: u64,
    n_folds: usize,
    from_cache: bool,
    submissions: Vec<&'a str>,
}

/// Tidy CSV for one metric series: `submission,sex,fold,value`.
pub fn metric_series_csv(series: &MetricSeries) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["submission", "sex", "fold", "value"])?;
    for point in &series.points {
        let sex = point.sex.map(|s| s.to_string()).unwrap_or_default();
        writer.write_record([
            point.submission.as_str(),
            &sex,
            &point.fold.to_string(),
            &point.value.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("flush metric csv")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Tidy CSV for the accuracy gap view: `submission,fold,gap,sign`.
pub fn accuracy_gap_csv(gaps: &[AccuracyGap]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["submission", "fold", "gap", "sign"])?;
    for gap in gaps {
        writer.write_record([
            gap.submission.as_str(),
            &gap.fold.to_string(),
            &gap.gap.to_string(),
            &gap.sign.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("flush gap csv")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write every artifact of one report under
/// `<output_dir>/run_<seed>_<timestamp>/` and return the directory.
pub fn save_report(report: &EvaluationReport, output_dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dir = output_dir.join(format!("run_{}_{stamp}", report.seed));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create artifact directory '{}'", dir.display()))?;

    let manifest = ReportManifest {
        generated_at: Local::now().to_rfc3339(),
        seed: report.seed,
        n_folds: report.n_folds,
        from_cache: report.from_cache,
        submissions: report.table.submissions(),
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("failed to encode manifest")?;
    write_artifact(&dir, "manifest.json", &manifest_json)?;

    let table_csv = report
        .table
        .to_csv_string()
        .context("failed to encode results table")?;
    write_artifact(&dir, "results_table.csv", &table_csv)?;

    write_artifact(&dir, "auc_roc.csv", &metric_series_csv(&report.auc_roc)?)?;
    write_artifact(
        &dir,
        "general_accuracy.csv",
        &metric_series_csv(&report.general_accuracy)?,
    )?;
    write_artifact(
        &dir,
        "accuracy_gap.csv",
        &accuracy_gap_csv(&report.accuracy_gap)?,
    )?;
    write_artifact(
        &dir,
        "equal_opportunity.csv",
        &metric_series_csv(&report.equal_opportunity)?,
    )?;

    log::info!("report artifacts written to {}", dir.display());
    Ok(dir)
}

fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, content).with_context(|| format!("failed to write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricPoint;
    use neurofair_core::domain::Sex;

    #[test]
    fn metric_csv_is_tidy_with_blank_sex_for_overall_points() {
        let series = MetricSeries {
            metric: "equal_opportunity",
            points: vec![
                MetricPoint {
                    submission: "baseline".to_string(),
                    sex: None,
                    fold: 1,
                    value: 12.5,
                },
                MetricPoint {
                    submission: "baseline".to_string(),
                    sex: Some(Sex::Female),
                    fold: 2,
                    value: -3.0,
                },
            ],
        };
        let raw = metric_series_csv(&series).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines[0], "submission,sex,fold,value");
        assert_eq!(lines[1], "baseline,,1,12.5");
        assert_eq!(lines[2], "baseline,female,2,-3");
    }

    #[test]
    fn gap_csv_carries_sign_column() {
        let gaps = vec![AccuracyGap {
            submission: "baseline".to_string(),
            fold: 1,
            gap: 25.0,
            sign: -1,
        }];
        let raw = accuracy_gap_csv(&gaps).unwrap();
        assert_eq!(raw.lines().nth(1).unwrap(), "baseline,1,25,-1");
    }
}
