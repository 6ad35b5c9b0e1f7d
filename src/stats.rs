use serde::Serialize;
use tracing::info;

use crate::speedlog::SpeedLog;

/// Standard median: the middle value for odd lengths,
/// the mean of the two middle values for even lengths.
/// None for an empty slice.
pub fn median(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.)
    } else {
        Some(sorted[mid])
    }
}

/// Linear-interpolated percentile (0..=100) of an ascending slice
fn percentile_of_sorted(sorted: &[f64], pct: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100. * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Distribution of a group of runs: five-number summary plus mean and
/// sample standard deviation (0 for a single run)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub sd: f64,
}

impl Spread {
    pub fn of(v: &[f64]) -> Option<Spread> {
        let median = median(v)?;
        let mut sorted = v.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let sd = if sorted.len() > 1 {
            (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.)).sqrt()
        } else {
            0.
        };
        Some(Spread {
            min: sorted[0],
            q1: percentile_of_sorted(&sorted, 25.),
            median,
            q3: percentile_of_sorted(&sorted, 75.),
            max: sorted[sorted.len() - 1],
            mean,
            sd,
        })
    }
}

/// Medians of the whole log, recomputed on every run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub download_median: f64,
    pub upload_median: f64,
    pub count: usize,
}

impl Summary {
    /// None when the log is empty and the medians are undefined
    pub fn from_log(speedlog: &SpeedLog) -> Option<Summary> {
        let summary = Summary {
            download_median: median(speedlog.download())?,
            upload_median: median(speedlog.upload())?,
            count: speedlog.len(),
        };
        info!(
            "median download {:.2} Mbps, median upload {:.2} Mbps over {} runs",
            summary.download_median, summary.upload_median, summary.count
        );
        Some(summary)
    }
}
