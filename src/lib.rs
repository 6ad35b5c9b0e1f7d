use chrono::prelude::*;
pub mod cli;
pub mod config;
pub mod error;
pub mod figure;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod render;
pub mod speedlog;
pub mod stats;

pub use config::{Config, InputConfig, RenderConfig, SpeedUnit};
pub use error::{Error, PipelineError, Result, Stage};
pub use figure::Figure;
pub use speedlog::SpeedLog;
pub use stats::{median, Spread, Summary};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset-aware formats tried after RFC 3339
const DT_FORMATS_OFFSET: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Naive formats, read as UTC
const DT_FORMATS_NAIVE: [&str; 4] = [
    DT_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "StartedAt";
pub const DEFAULT_DOWNLOAD_COLUMN: &str = "DownloadedSpeed";
pub const DEFAULT_UPLOAD_COLUMN: &str = "UploadedSpeed";

pub const DEFAULT_INPUT_PATH: &str = "data/sampling.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "dist/index.html";
pub const DEFAULT_CONFIG_PATH: &str = "speedchart.toml";
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_LOCALE: &str = "ja";

/// Parses the timestamp cell of a speed-test log into a UTC instant.
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DT_FORMATS_OFFSET.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DT_FORMATS_NAIVE.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(TimeZone::from_utc_datetime(&Utc, &ndt));
        }
    }
    None
}

/// min and max of a slice, None when the slice is empty
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::weeks(1) {
        "%y-%m-%d"
    } else if d > chrono::Duration::days(1) {
        "%m-%d %H"
    } else {
        "%d %H:%M"
    }
}
