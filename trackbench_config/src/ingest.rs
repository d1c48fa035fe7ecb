//! CSV ingestion for bench logs.
//!
//! Sample logs carry `T,ENC,IMU,Lag` (extra columns such as `ENC_RAW` are
//! ignored). Level logs carry `T` plus any of `accel,gyro,mag`. Columns are
//! located by header name. Every field is parsed strictly: a blank,
//! non-numeric or non-finite value is an `InvalidRecord` naming its line.
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trackbench_traits::Channel;

/// One logged observation, field-for-field as written by the bench.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    /// `T`: milliseconds since the run started.
    pub time_ms: u64,
    /// `ENC`: encoder angle in degrees (reference).
    pub enc_deg: f64,
    /// `IMU`: fused IMU angle in degrees (measured).
    pub imu_deg: f64,
    /// `Lag`: age of the IMU report when consumed, in ms.
    pub lag_ms: f64,
}

/// One logged accuracy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRow {
    pub time_ms: u64,
    pub levels: Vec<(Channel, u8)>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("read CSV headers: {0}")]
    Header(#[source] csv::Error),
    #[error("CSV is missing required column '{column}'")]
    MissingColumn { column: String },
    #[error("invalid record at line {row}: {reason}")]
    InvalidRecord { row: u64, reason: String },
}

pub fn load_samples_csv(path: &Path) -> Result<Vec<SampleRow>, IngestError> {
    let rdr = open(path)?;
    samples_from(rdr)
}

pub fn read_samples_csv<R: Read>(reader: R) -> Result<Vec<SampleRow>, IngestError> {
    samples_from(builder().from_reader(reader))
}

pub fn load_levels_csv(path: &Path) -> Result<Vec<LevelRow>, IngestError> {
    let rdr = open(path)?;
    levels_from(rdr)
}

pub fn read_levels_csv<R: Read>(reader: R) -> Result<Vec<LevelRow>, IngestError> {
    levels_from(builder().from_reader(reader))
}

fn builder() -> csv::ReaderBuilder {
    let mut b = csv::ReaderBuilder::new();
    b.has_headers(true).trim(csv::Trim::All);
    b
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, IngestError> {
    builder().from_path(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
        })
}

/// Line of a record in the file; header is line 1.
fn line_of(rec: &csv::StringRecord, idx: usize) -> u64 {
    rec.position().map_or(idx as u64 + 2, csv::Position::line)
}

fn field<'r>(
    rec: &'r csv::StringRecord,
    col: usize,
    name: &str,
    row: u64,
) -> Result<&'r str, IngestError> {
    match rec.get(col) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(IngestError::InvalidRecord {
            row,
            reason: format!("missing value for '{name}'"),
        }),
    }
}

fn parse_time(rec: &csv::StringRecord, col: usize, row: u64) -> Result<u64, IngestError> {
    let s = field(rec, col, "T", row)?;
    s.parse::<u64>().map_err(|e| IngestError::InvalidRecord {
        row,
        reason: format!("'T' must be integer milliseconds, got '{s}' ({e})"),
    })
}

fn parse_f64(
    rec: &csv::StringRecord,
    col: usize,
    name: &str,
    row: u64,
) -> Result<f64, IngestError> {
    let s = field(rec, col, name, row)?;
    let v = s.parse::<f64>().map_err(|e| IngestError::InvalidRecord {
        row,
        reason: format!("'{name}' is not a number: '{s}' ({e})"),
    })?;
    if !v.is_finite() {
        return Err(IngestError::InvalidRecord {
            row,
            reason: format!("'{name}' must be finite, got '{s}'"),
        });
    }
    Ok(v)
}

fn parse_level(
    rec: &csv::StringRecord,
    col: usize,
    name: &str,
    row: u64,
) -> Result<u8, IngestError> {
    let s = field(rec, col, name, row)?;
    s.parse::<u8>().map_err(|e| IngestError::InvalidRecord {
        row,
        reason: format!("'{name}' must be a non-negative integer level, got '{s}' ({e})"),
    })
}

fn samples_from<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<SampleRow>, IngestError> {
    let headers = rdr.headers().map_err(IngestError::Header)?.clone();
    let t = column(&headers, "T")?;
    let enc = column(&headers, "ENC")?;
    let imu = column(&headers, "IMU")?;
    let lag = column(&headers, "Lag")?;

    let mut rows = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| IngestError::InvalidRecord {
            row: e.position().map_or(idx as u64 + 2, csv::Position::line),
            reason: e.to_string(),
        })?;
        let row = line_of(&rec, idx);
        rows.push(SampleRow {
            time_ms: parse_time(&rec, t, row)?,
            enc_deg: parse_f64(&rec, enc, "ENC", row)?,
            imu_deg: parse_f64(&rec, imu, "IMU", row)?,
            lag_ms: parse_f64(&rec, lag, "Lag", row)?,
        });
    }
    Ok(rows)
}

fn levels_from<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<LevelRow>, IngestError> {
    let headers = rdr.headers().map_err(IngestError::Header)?.clone();
    let t = column(&headers, "T")?;
    let channels: Vec<(Channel, usize)> = Channel::ALL
        .iter()
        .filter_map(|ch| {
            headers
                .iter()
                .position(|h| h == ch.as_str())
                .map(|col| (*ch, col))
        })
        .collect();
    if channels.is_empty() {
        return Err(IngestError::MissingColumn {
            column: "accel|gyro|mag".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| IngestError::InvalidRecord {
            row: e.position().map_or(idx as u64 + 2, csv::Position::line),
            reason: e.to_string(),
        })?;
        let row = line_of(&rec, idx);
        let time_ms = parse_time(&rec, t, row)?;
        let levels = channels
            .iter()
            .map(|&(ch, col)| parse_level(&rec, col, ch.as_str(), row).map(|l| (ch, l)))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(LevelRow { time_ms, levels });
    }
    Ok(rows)
}
