use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::prelude::*;
use tracing::{debug, info};

use crate::config::InputConfig;
use crate::error::{Error, Result};
use crate::parse_timestamp;

/// The speed-test log: one entry per run, sorted by time.
/// Speeds are in Mbps.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedLog {
    time: Vec<DateTime<Utc>>,
    download: Vec<f64>,
    upload: Vec<f64>,
}

/// position of the required columns in the header row
struct Columns {
    time: usize,
    download: usize,
    upload: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, cfg: &InputConfig, fin: &Path) -> Result<Columns> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::parse(fin, 1, format!("missing required column {:?}", name)))
        };
        Ok(Columns {
            time: find(cfg.timestamp_column.as_str())?,
            download: find(cfg.download_column.as_str())?,
            upload: find(cfg.upload_column.as_str())?,
        })
    }
}

impl SpeedLog {
    pub fn new(capacity: usize) -> SpeedLog {
        SpeedLog {
            time: Vec::with_capacity(capacity),
            download: Vec::with_capacity(capacity),
            upload: Vec::with_capacity(capacity),
        }
    }

    /// Builds a log from (time, download, upload) rows, sorting them by time.
    /// The sort is stable, rows with equal times keep their order.
    pub fn from_rows(mut rows: Vec<(DateTime<Utc>, f64, f64)>) -> SpeedLog {
        rows.sort_by_key(|r| r.0);
        let mut speedlog = SpeedLog::new(rows.len());
        for (t, d, u) in rows {
            speedlog.time.push(t);
            speedlog.download.push(d);
            speedlog.upload.push(u);
        }
        speedlog
    }

    /// Init a SpeedLog from the csv written by the speed-test tool.
    /// Columns are found by header name, other columns are ignored.
    /// Any unreadable cell fails the whole load.
    pub fn from_csv(fin: &Path, cfg: &InputConfig) -> Result<SpeedLog> {
        let file = File::open(fin).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: fin.to_path_buf(),
            },
            _ => Error::io(fin, e),
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr
            .headers()
            .map_err(|e| Error::parse(fin, 1, e.to_string()))?
            .clone();
        let cols = Columns::locate(&headers, cfg, fin)?;
        debug!(
            "columns {:?}/{:?}/{:?} at {}/{}/{}",
            cfg.timestamp_column,
            cfg.download_column,
            cfg.upload_column,
            cols.time,
            cols.download,
            cols.upload
        );

        let mut rows: Vec<(DateTime<Utc>, f64, f64)> = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                Error::parse(fin, line, e.to_string())
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let cell = |i: usize, name: &str| {
                record
                    .get(i)
                    .ok_or_else(|| Error::parse(fin, line, format!("missing {} cell", name)))
            };

            let raw_time = cell(cols.time, cfg.timestamp_column.as_str())?;
            let t = parse_timestamp(raw_time).ok_or_else(|| {
                Error::parse(fin, line, format!("invalid timestamp {:?}", raw_time))
            })?;
            let d = parse_speed(cell(cols.download, cfg.download_column.as_str())?)
                .map_err(|m| Error::parse(fin, line, format!("{}: {}", cfg.download_column, m)))?;
            let u = parse_speed(cell(cols.upload, cfg.upload_column.as_str())?)
                .map_err(|m| Error::parse(fin, line, format!("{}: {}", cfg.upload_column, m)))?;
            rows.push((t, cfg.unit.to_mbps(d), cfg.unit.to_mbps(u)));
        }

        if rows.is_empty() {
            return Err(Error::EmptyDataset {
                path: fin.to_path_buf(),
            });
        }
        let speedlog = SpeedLog::from_rows(rows);
        info!("loaded {} measurements from {}", speedlog.len(), fin.display());
        Ok(speedlog)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn download(&self) -> &[f64] {
        &self.download
    }

    pub fn upload(&self) -> &[f64] {
        &self.upload
    }

    /// first and last measurement time
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.time.first()?, *self.time.last()?))
    }

    #[cfg(test)]
    fn is_ordered(&self) -> bool {
        self.time.windows(2).all(|w| w[0] <= w[1])
    }
}

fn parse_speed(raw: &str) -> std::result::Result<f64, String> {
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("invalid speed {:?}", raw))?;
    if !v.is_finite() || v < 0. {
        return Err(format!("speed {} is not a non-negative finite number", v));
    }
    Ok(v)
}

impl std::fmt::Display for SpeedLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "datetime, download [Mbps], upload [Mbps]")?;
        for ((t, d), u) in self.time.iter().zip(self.download.iter()).zip(self.upload.iter()) {
            writeln!(f, "{},{},{}", t.to_rfc3339(), d, u)?
        }
        Ok(())
    }
}
