use chrono::prelude::*;
use serde::Serialize;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::profile::Slot;
use crate::speedlog::SpeedLog;
use crate::stats::Summary;

/// One line of the time plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<DateTime<Utc>>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Horizontal line across the whole time axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub name: String,
    pub y: f64,
}

/// Everything the renderer draws, independent of the drawing backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub locale: String,
    pub timezone: String,
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<Slot>>,
}

impl Figure {
    /// Download and upload series with their medians as reference lines
    pub fn build(
        speedlog: &SpeedLog,
        summary: &Summary,
        cfg: &RenderConfig,
        timezone: &str,
    ) -> Result<Figure> {
        if speedlog.is_empty() {
            return Err(Error::Render("no measurements to plot".to_string()));
        }
        let labels = cfg.labels();
        let time = speedlog.time();
        let series = vec![
            series_of(labels.download, time, speedlog.download())?,
            series_of(labels.upload, time, speedlog.upload())?,
        ];
        let reference_lines = vec![
            ReferenceLine {
                name: labels.download_median.to_string(),
                y: summary.download_median,
            },
            ReferenceLine {
                name: labels.upload_median.to_string(),
                y: summary.upload_median,
            },
        ];
        Ok(Figure {
            title: cfg.title().to_string(),
            x_label: cfg.x_label().to_string(),
            y_label: cfg.y_label().to_string(),
            locale: cfg.locale.clone(),
            timezone: timezone.to_string(),
            series,
            reference_lines,
            summary: *summary,
            profile: None,
        })
    }

    pub fn with_profile(mut self, slots: Vec<Slot>) -> Figure {
        self.profile = Some(slots);
        self
    }

    /// first and last time over all series
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.series.iter().filter_map(|s| s.x.first()).min()?;
        let last = self.series.iter().filter_map(|s| s.x.last()).max()?;
        Some((*first, *last))
    }

    /// min and max of every series value and reference line
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.y.iter().copied())
            .chain(self.reference_lines.iter().map(|r| r.y))
            .collect();
        crate::min_and_max(&values)
    }
}

fn series_of(name: &str, x: &[DateTime<Utc>], y: &[f64]) -> Result<Series> {
    if x.len() != y.len() {
        return Err(Error::Render(format!(
            "series {} has {} times but {} values",
            name,
            x.len(),
            y.len()
        )));
    }
    Ok(Series {
        name: name.to_string(),
        x: x.to_vec(),
        y: y.to_vec(),
    })
}
