use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::controller::FinishEvent;
use crate::error::Result;

/// One finished test as stored in `results.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub finished_at: DateTime<Local>,
    pub difficulty: String,
    pub total_duration_secs: u32,
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: u32,
}

impl ResultRecord {
    pub fn from_event(event: &FinishEvent, finished_at: DateTime<Local>) -> Self {
        Self {
            finished_at,
            difficulty: event.difficulty.clone(),
            total_duration_secs: event.total_duration_secs,
            wpm: event.wpm,
            cpm: event.cpm,
            accuracy: event.accuracy,
        }
    }
}

/// Personal best and averages over stored results
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub runs: usize,
    pub best_wpm: u32,
    pub best_accuracy: u32,
    pub mean_wpm: f64,
    pub wpm_std_dev: f64,
}

impl HistorySummary {
    pub fn from_records(records: &[ResultRecord]) -> Option<Self> {
        // highest wpm wins, accuracy breaks ties
        let best = records.iter().max_by_key(|r| (r.wpm, r.accuracy))?;

        let count = records.len() as f64;
        let mean_wpm = records.iter().map(|r| f64::from(r.wpm)).sum::<f64>() / count;
        let variance = records
            .iter()
            .map(|r| {
                let diff = mean_wpm - f64::from(r.wpm);
                diff * diff
            })
            .sum::<f64>()
            / count;

        Some(Self {
            runs: records.len(),
            best_wpm: best.wpm,
            best_accuracy: best.accuracy,
            mean_wpm,
            wpm_std_dev: variance.sqrt(),
        })
    }
}

/// Append-only CSV log of finished tests
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new() -> Option<Self> {
        AppDirs::results_path().map(|path| Self { path })
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &FinishEvent) -> Result<ResultRecord> {
        let record = ResultRecord::from_event(event, Local::now());
        self.append_record(&record)?;
        Ok(record)
    }

    pub fn append_record(&self, record: &ResultRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // A missing or empty log still needs its header
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All stored results, oldest first. A missing log is empty.
    pub fn load(&self) -> Result<Vec<ResultRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            match row {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(%err, "skipping unreadable result row"),
            }
        }
        Ok(records)
    }

    /// Summary over every run, or only runs at `difficulty`.
    pub fn summary(&self, difficulty: Option<&str>) -> Result<Option<HistorySummary>> {
        let records: Vec<ResultRecord> = self
            .load()?
            .into_iter()
            .filter(|r| difficulty.map_or(true, |d| r.difficulty == d))
            .collect();
        Ok(HistorySummary::from_records(&records))
    }
}
