// ============================================================
// Layer 6 — Experiment Ledger
// ============================================================
// The append-only CSV record of every completed run.
//
// File format (pandas-compatible):
//   ,iterations,num_topics,execution_time,perplexity,coherence
//   0,10,10,0:00:05,1234.56,0.41
//   1,10,20,0:00:09,1100.23,0.43
//
// The unnamed first column is the integer row index. Row order is
// completion order. At most one row per (iterations, num_topics)
// pair; the dispatcher and the worker both consult contains()
// before running a pair.
//
// A missing or unreadable ledger at startup is the one recovered
// failure in the system: it is replaced by a fresh file holding
// only the header.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::experiment::ExperimentRecord;

/// CSV header, leading comma = the unnamed index column
const HEADER: &str = ",iterations,num_topics,execution_time,perplexity,coherence";

/// File name inside the results directory
const LEDGER_FILE: &str = "experiments.csv";

/// The experiments CSV. All reads parse the file fresh so the
/// ledger itself stays the single source of truth; nothing here
/// caches records or tracks a separate "best so far".
pub struct ExperimentLedger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl ExperimentLedger {
    /// Open the ledger in `dir`, creating the directory and a
    /// header-only file if nothing usable is there yet. An existing
    /// file that cannot be parsed is replaced the same way and the
    /// replacement is logged.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create results directory '{}'", dir.display()))?;

        let ledger = Self {
            csv_path: dir.join(LEDGER_FILE),
        };

        if !ledger.csv_path.exists() {
            ledger.write_header()?;
            tracing::debug!("Created experiment ledger '{}'", ledger.csv_path.display());
        } else if let Err(e) = ledger.records() {
            tracing::warn!(
                "Ledger '{}' is unreadable ({e:#}); starting from an empty ledger",
                ledger.csv_path.display(),
            );
            ledger.write_header()?;
        }

        Ok(ledger)
    }

    /// Parse every record currently in the ledger, in file order.
    pub fn records(&self) -> Result<Vec<ExperimentRecord>> {
        let text = fs::read_to_string(&self.csv_path)
            .with_context(|| format!("Cannot read ledger '{}'", self.csv_path.display()))?;

        let mut records = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if lineno == 0 || line.trim().is_empty() {
                continue;
            }
            records.push(parse_row(line).with_context(|| {
                format!(
                    "Malformed ledger row {} in '{}'",
                    lineno,
                    self.csv_path.display()
                )
            })?);
        }
        Ok(records)
    }

    /// True if a run with this exact pair is already recorded.
    pub fn contains(&self, iterations: u64, num_topics: u64) -> Result<bool> {
        Ok(self
            .records()?
            .iter()
            .any(|r| r.iterations == iterations && r.num_topics == num_topics))
    }

    /// Append one record and persist it. The row index is the
    /// current record count.
    pub fn append(&self, record: &ExperimentRecord) -> Result<()> {
        let index = self.records()?.len();

        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open ledger '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{},{},{}",
            index,
            record.iterations,
            record.num_topics,
            record.execution_time,
            record.perplexity,
            record.coherence,
        )?;

        tracing::debug!(
            "Ledger row {}: i={} k={} cv={:.4}",
            index,
            record.iterations,
            record.num_topics,
            record.coherence,
        );
        Ok(())
    }

    /// The record with the highest coherence, computed as a fold
    /// over the coherence column. Strictly-greater comparison keeps
    /// the earliest record on ties. None if the ledger is empty.
    pub fn best(&self) -> Result<Option<ExperimentRecord>> {
        Ok(self.records()?.into_iter().fold(None, |best, r| match best {
            Some(b) if !r.is_improvement(b.coherence) => Some(b),
            _ => Some(r),
        }))
    }

    /// Full path to the CSV file.
    pub fn path(&self) -> &Path {
        &self.csv_path
    }

    fn write_header(&self) -> Result<()> {
        let mut f = fs::File::create(&self.csv_path)
            .with_context(|| format!("Cannot create ledger '{}'", self.csv_path.display()))?;
        writeln!(f, "{HEADER}")?;
        Ok(())
    }
}

/// Parse one data row: index,iterations,num_topics,execution_time,
/// perplexity,coherence. The index column is checked for shape but
/// otherwise ignored.
fn parse_row(line: &str) -> Result<ExperimentRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 6 {
        anyhow::bail!("expected 6 fields, found {}", fields.len());
    }
    let _index: usize = fields[0].trim().parse().context("row index")?;
    Ok(ExperimentRecord {
        iterations: fields[1].trim().parse().context("iterations")?,
        num_topics: fields[2].trim().parse().context("num_topics")?,
        execution_time: fields[3].trim().to_string(),
        perplexity: fields[4].trim().parse().context("perplexity")?,
        coherence: fields[5].trim().parse().context("coherence")?,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(iterations: u64, num_topics: u64, coherence: f64) -> ExperimentRecord {
        ExperimentRecord {
            iterations,
            num_topics,
            execution_time: "0:00:01".to_string(),
            perplexity: 100.0,
            coherence,
        }
    }

    #[test]
    fn test_open_creates_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        let text = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(text, format!("{HEADER}\n"));
        assert!(ledger.records().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_reload_preserves_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        ledger.append(&record(10, 10, 0.41)).unwrap();
        ledger.append(&record(10, 20, 0.43)).unwrap();

        let records = ledger.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record(10, 10, 0.41));
        assert_eq!(records[1], record(10, 20, 0.43));

        // Row indices are sequential
        let text = fs::read_to_string(ledger.path()).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert!(rows[0].starts_with("0,"));
        assert!(rows[1].starts_with("1,"));
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        {
            let ledger = ExperimentLedger::open(dir.path()).unwrap();
            ledger.append(&record(10, 10, 0.41)).unwrap();
        }
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        assert_eq!(ledger.records().unwrap().len(), 1);
    }

    #[test]
    fn test_contains_matches_exact_pair() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        ledger.append(&record(10, 10, 0.41)).unwrap();

        assert!(ledger.contains(10, 10).unwrap());
        assert!(!ledger.contains(10, 20).unwrap());
        assert!(!ledger.contains(20, 10).unwrap());
    }

    #[test]
    fn test_best_folds_to_maximum_coherence() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        assert!(ledger.best().unwrap().is_none());

        ledger.append(&record(10, 10, 0.41)).unwrap();
        ledger.append(&record(10, 20, 0.47)).unwrap();
        ledger.append(&record(20, 10, 0.43)).unwrap();

        let best = ledger.best().unwrap().unwrap();
        assert_eq!((best.iterations, best.num_topics), (10, 20));
    }

    #[test]
    fn test_best_keeps_earliest_record_on_ties() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        ledger.append(&record(10, 10, 0.47)).unwrap();
        ledger.append(&record(10, 20, 0.47)).unwrap();

        let best = ledger.best().unwrap().unwrap();
        assert_eq!((best.iterations, best.num_topics), (10, 10));
    }

    #[test]
    fn test_unreadable_ledger_is_replaced_with_empty_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        fs::write(&path, "this is not a ledger\nnot,even,close\n").unwrap();

        let ledger = ExperimentLedger::open(dir.path()).unwrap();
        assert!(ledger.records().unwrap().is_empty());
        let text = fs::read_to_string(ledger.path()).unwrap();
        assert!(text.starts_with(HEADER));
    }
}
