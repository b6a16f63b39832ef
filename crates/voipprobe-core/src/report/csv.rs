//! CSV time-series sink
//!
//! Appends one row per resolved probe: a UTC timestamp plus the rounded
//! metric set. The MOS-family columns are written as empty strings while
//! the estimate is withheld during warm-up, so downstream tooling sees a
//! stable ten-column schema from the first row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ProbeError;
use crate::metrics::mos::MosEstimate;

/// Column header, kept stable for downstream tooling
pub const CSV_HEADER: &str =
    "ts_utc,seq,rtt_ms,oneway_ms_est,jitter_ms,loss_pct_window,mos,r_factor,Id,Ie_eff";

/// Per-sample record appended to the sink
#[derive(Debug, Clone)]
pub struct SampleRow {
    pub seq: u32,
    pub rtt_ms: f64,
    pub oneway_ms: f64,
    pub jitter_ms: f64,
    pub loss_pct_window: f64,
    /// `None` while the estimate is withheld (warm-up or too few samples)
    pub mos: Option<MosEstimate>,
}

/// Buffered CSV file sink
///
/// Flushed explicitly by the session on close and defensively on drop, so
/// rows survive every exit path including cancellation.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    /// Create the sink, truncating any existing file, and write the header
    pub fn create(path: &Path) -> Result<Self, ProbeError> {
        let file = File::create(path).map_err(|source| ProbeError::CsvOpen {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self { writer })
    }

    /// Append one sample row stamped with the current UTC time
    pub fn append(&mut self, row: &SampleRow) -> Result<(), ProbeError> {
        self.append_at(Utc::now(), row)
    }

    /// Append one sample row with an explicit timestamp
    pub fn append_at(&mut self, ts: DateTime<Utc>, row: &SampleRow) -> Result<(), ProbeError> {
        write!(
            self.writer,
            "{},{},{:.3},{:.3},{:.3},{:.3},",
            ts.to_rfc3339_opts(SecondsFormat::Micros, true),
            row.seq,
            row.rtt_ms,
            row.oneway_ms,
            row.jitter_ms,
            row.loss_pct_window,
        )?;
        match &row.mos {
            Some(est) => writeln!(
                self.writer,
                "{:.3},{:.1},{:.3},{:.3}",
                est.mos, est.r_factor, est.id, est.ie_eff
            )?,
            None => writeln!(self.writer, ",,,")?,
        }
        Ok(())
    }

    /// Flush buffered rows to disk
    pub fn flush(&mut self) -> Result<(), ProbeError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::codec::profile_for;
    use crate::metrics::mos;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_header_written_on_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines, vec![CSV_HEADER.to_string()]);
    }

    #[test]
    fn test_withheld_mos_leaves_blank_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        sink.append(&SampleRow {
            seq: 3,
            rtt_ms: 12.3456,
            oneway_ms: 6.1728,
            jitter_ms: 0.5,
            loss_pct_window: 0.0,
            mos: None,
        })
        .unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[1], "3");
        assert_eq!(fields[2], "12.346");
        assert_eq!(fields[3], "6.173");
        assert_eq!(&fields[6..10], &["", "", "", ""]);
    }

    #[test]
    fn test_mos_fields_rounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        let est = mos::estimate(150.0, 0.0, profile_for("g711"), 1.0);
        sink.append(&SampleRow {
            seq: 0,
            rtt_ms: 300.0,
            oneway_ms: 150.0,
            jitter_ms: 1.25,
            loss_pct_window: 0.333333,
            mos: Some(est),
        })
        .unwrap();
        sink.flush().unwrap();

        let lines = read_lines(&path);
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[5], "0.333");
        assert_eq!(fields[6], "4.353");
        assert_eq!(fields[7], "90.6"); // R-factor keeps one decimal
        assert_eq!(fields[8], "3.600");
        assert_eq!(fields[9], "0.000");
    }

    #[test]
    fn test_rows_survive_drop_without_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.csv");
        {
            let mut sink = CsvSink::create(&path).unwrap();
            sink.append(&SampleRow {
                seq: 1,
                rtt_ms: 1.0,
                oneway_ms: 0.5,
                jitter_ms: 0.0,
                loss_pct_window: 0.0,
                mos: None,
            })
            .unwrap();
        }
        assert_eq!(read_lines(&path).len(), 2);
    }
}
