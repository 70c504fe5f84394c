use crate::error::{Result, SweetspotError};
use crate::types::{EvaluationRecord, ObjectiveVector, RawMetrics};
use polars::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Prefix of the raw scoring-metric columns.
pub const METRIC_PREFIX: &str = "metric_";

/// Append-only CSV log of every fitness call of a run.
///
/// The metric columns are fixed by the existing header, or by the first appended
/// record of a new log. Later rows write null for absent metrics and drop unknown ones.
pub struct ResultLog {
    path: PathBuf,
    metric_names: Option<Vec<String>>,
}

impl ResultLog {
    pub const FILE_NAME: &'static str = "data.csv";

    pub fn open<P: AsRef<Path>>(run_dir: P) -> Result<Self> {
        std::fs::create_dir_all(run_dir.as_ref())?;
        let path = run_dir.as_ref().join(Self::FILE_NAME);
        let metric_names = header_metrics(&path)?;
        Ok(Self { path, metric_names })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metric columns of this log, once known.
    pub fn metric_names(&self) -> Option<&[String]> {
        self.metric_names.as_deref()
    }

    /// Append one row; the header is written only when the file is new.
    pub fn append(&mut self, record: &EvaluationRecord) -> Result<()> {
        let metric_names = self
            .metric_names
            .get_or_insert_with(|| record.raw_metrics.keys().cloned().collect());

        let dropped: Vec<&String> = record
            .raw_metrics
            .keys()
            .filter(|name| !metric_names.contains(*name))
            .collect();
        if !dropped.is_empty() {
            log::warn!(
                "Dropping metrics {:?} of call {}: not among the columns of {}",
                dropped,
                record.call_index,
                self.path.display()
            );
        }

        let mut df = record_frame(record, metric_names)?;
        let write_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        CsvWriter::new(&mut file)
            .include_header(write_header)
            .finish(&mut df)?;
        file.sync_data()?;
        Ok(())
    }

    /// Read every record back; a missing log reads as empty.
    pub fn load(&self) -> Result<Vec<EvaluationRecord>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()
            .map_err(|e| {
                SweetspotError::Checkpoint(format!(
                    "Failed to read result log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        frame_records(&df)
    }
}

/// Metric names in the header of an existing, non-empty log.
fn header_metrics(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;
    if header.trim().is_empty() {
        return Ok(None);
    }

    let names = header
        .trim_end()
        .split(',')
        .map(|column| column.trim_matches('"'))
        .filter_map(|column| column.strip_prefix(METRIC_PREFIX))
        .map(str::to_string)
        .collect();
    Ok(Some(names))
}

fn record_frame(record: &EvaluationRecord, metric_names: &[String]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new("epoch".into(), [record.epoch as u64]),
        Column::new("call_index".into(), [record.call_index as u64]),
        Column::new("encoder".into(), [record.encoder_id.as_str()]),
        Column::new("algorithm".into(), [record.algorithm_id.as_str()]),
        Column::new("decision_vector".into(), [record.decision_vector_key.as_str()]),
        Column::new("cost_seconds".into(), [record.cost_seconds]),
        Column::new("cached".into(), [record.cached]),
        Column::new("neg_score".into(), [record.objectives.neg_score]),
        Column::new(
            "neg_compression_ratio".into(),
            [record.objectives.neg_compression_ratio],
        ),
    ];
    for name in metric_names {
        columns.push(Column::new(
            format!("{}{}", METRIC_PREFIX, name).as_str().into(),
            [record.raw_metrics.get(name).copied()],
        ));
    }
    Ok(DataFrame::new(columns)?)
}

fn frame_records(df: &DataFrame) -> Result<Vec<EvaluationRecord>> {
    let epoch = df.column("epoch")?.cast(&DataType::UInt64)?;
    let call_index = df.column("call_index")?.cast(&DataType::UInt64)?;
    let encoder = df.column("encoder")?.cast(&DataType::String)?;
    let algorithm = df.column("algorithm")?.cast(&DataType::String)?;
    let key = df.column("decision_vector")?.cast(&DataType::String)?;
    let cost = df.column("cost_seconds")?.cast(&DataType::Float64)?;
    let cached = df.column("cached")?.cast(&DataType::Boolean)?;
    let neg_score = df.column("neg_score")?.cast(&DataType::Float64)?;
    let neg_ratio = df.column("neg_compression_ratio")?.cast(&DataType::Float64)?;

    let (epoch, call_index) = (epoch.u64()?, call_index.u64()?);
    let (encoder, algorithm, key) = (encoder.str()?, algorithm.str()?, key.str()?);
    let (cost, cached) = (cost.f64()?, cached.bool()?);
    let (neg_score, neg_ratio) = (neg_score.f64()?, neg_ratio.f64()?);

    let mut metric_columns = Vec::new();
    for name in df.get_column_names() {
        if let Some(metric) = name.strip_prefix(METRIC_PREFIX) {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            metric_columns.push((metric.to_string(), column));
        }
    }

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let missing = || {
            SweetspotError::Checkpoint(format!("Result log row {} has missing fields", i + 1))
        };

        let mut raw_metrics = RawMetrics::new();
        for (metric, column) in &metric_columns {
            if let Some(v) = column.f64()?.get(i) {
                raw_metrics.insert(metric.clone(), v);
            }
        }

        records.push(EvaluationRecord {
            epoch: epoch.get(i).ok_or_else(missing)? as usize,
            call_index: call_index.get(i).ok_or_else(missing)? as usize,
            encoder_id: encoder.get(i).ok_or_else(missing)?.to_string(),
            algorithm_id: algorithm.get(i).ok_or_else(missing)?.to_string(),
            decision_vector_key: key.get(i).ok_or_else(missing)?.to_string(),
            objectives: ObjectiveVector {
                neg_score: neg_score.get(i).ok_or_else(missing)?,
                neg_compression_ratio: neg_ratio.get(i).ok_or_else(missing)?,
            },
            cost_seconds: cost.get(i).unwrap_or(0.0),
            cached: cached.get(i).unwrap_or(false),
            raw_metrics,
        });
    }
    Ok(records)
}
