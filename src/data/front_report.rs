use super::result_log::METRIC_PREFIX;
use crate::engines::generation::pareto::FrontRanking;
use crate::error::Result;
use crate::types::EvaluationRecord;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

/// `ndf-epoch<N>.csv` inside the run directory.
pub fn front_report_path(run_dir: &Path, epoch: usize) -> PathBuf {
    run_dir.join(format!("ndf-epoch{}.csv", epoch))
}

/// Write the non-dominated members of `records` as one CSV row each.
pub fn write_front_report(
    path: &Path,
    records: &[&EvaluationRecord],
    ranking: &FrontRanking,
) -> Result<()> {
    let front: Vec<&EvaluationRecord> = ranking.non_dominated.iter().map(|&i| records[i]).collect();

    let metric_names: BTreeSet<&str> = front
        .iter()
        .flat_map(|r| r.raw_metrics.keys().map(String::as_str))
        .collect();

    let keys: Vec<&str> = front.iter().map(|r| r.decision_vector_key.as_str()).collect();
    let neg_scores: Vec<f64> = front.iter().map(|r| r.objectives.neg_score).collect();
    let neg_ratios: Vec<f64> = front
        .iter()
        .map(|r| r.objectives.neg_compression_ratio)
        .collect();

    let mut columns = vec![
        Column::new("decision_vector".into(), keys),
        Column::new("neg_score".into(), neg_scores),
        Column::new("neg_compression_ratio".into(), neg_ratios),
        Column::new("crowding_distance".into(), ranking.crowding_distances.clone()),
    ];
    for name in metric_names {
        let values: Vec<Option<f64>> = front.iter().map(|r| r.raw_metrics.get(name).copied()).collect();
        columns.push(Column::new(
            format!("{}{}", METRIC_PREFIX, name).as_str().into(),
            values,
        ));
    }

    let mut df = DataFrame::new(columns)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    file.sync_data()?;

    log::info!("Wrote {} non-dominated vectors to {}", df.height(), path.display());
    Ok(())
}
