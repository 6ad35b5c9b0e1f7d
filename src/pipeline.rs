use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use tracing::info;

use crate::config::{Config, InputConfig, RenderConfig};
use crate::error::{Error, PipelineError, Result, Stage};
use crate::figure::Figure;
use crate::output::write_atomic;
use crate::profile::weekday_hour_profile;
use crate::render::render_document;
use crate::speedlog::SpeedLog;
use crate::stats::Summary;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct Report {
    pub figure: Figure,
    pub output_path: PathBuf,
    pub bytes: usize,
}

/// Reads the speed-test log and computes its medians
pub fn load(input: &InputConfig) -> Result<(SpeedLog, Summary)> {
    let speedlog = SpeedLog::from_csv(&input.path, input)?;
    let summary = Summary::from_log(&speedlog).ok_or_else(|| Error::EmptyDataset {
        path: input.path.clone(),
    })?;
    Ok((speedlog, summary))
}

/// Builds the chart for the log and writes it to the configured output path
pub fn render(
    speedlog: &SpeedLog,
    summary: &Summary,
    cfg: &RenderConfig,
    tz: Tz,
) -> Result<(Figure, usize)> {
    let mut figure = Figure::build(speedlog, summary, cfg, tz.name())?;
    if cfg.profile {
        figure = figure.with_profile(weekday_hour_profile(speedlog, tz, cfg.labels()));
    }
    let doc = render_document(&figure, cfg, tz)?;
    write_atomic(&cfg.output_path, doc.as_bytes())?;
    Ok((figure, doc.len()))
}

/// load, then render; the error names the stage that failed
pub fn run(cfg: &Config) -> std::result::Result<Report, PipelineError> {
    let tz = cfg
        .input
        .tz()
        .map_err(|e| PipelineError::new(Stage::Config, e))?;
    let (speedlog, summary) =
        load(&cfg.input).map_err(|e| PipelineError::new(Stage::Load, e))?;
    let (figure, bytes) = render(&speedlog, &summary, &cfg.render, tz)
        .map_err(|e| PipelineError::new(Stage::Render, e))?;
    info!(
        "chart of {} measurements written to {}",
        summary.count,
        cfg.render.output_path.display()
    );
    Ok(Report {
        figure,
        output_path: cfg.render.output_path.clone(),
        bytes,
    })
}

/// Config from the optional file, with command line overrides applied
pub fn configure(
    config: Option<&Path>,
    csvin: Option<PathBuf>,
    htmlout: Option<PathBuf>,
) -> std::result::Result<Config, PipelineError> {
    let mut cfg = Config::load(config).map_err(|e| PipelineError::new(Stage::Config, e))?;
    if let Some(p) = csvin {
        cfg.input.path = p;
    }
    if let Some(p) = htmlout {
        cfg.render.output_path = p;
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_timezone_fails_in_config_stage() {
        let mut cfg = Config::default();
        cfg.input.timezone = "Nowhere/Special".to_string();
        let err = run(&cfg).unwrap_err();
        assert_eq!(err.stage, Stage::Config);
    }

    #[test]
    fn overrides_replace_config_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedchart.toml");
        std::fs::write(&path, "[input]\npath = \"a.csv\"\n").unwrap();
        let cfg = configure(Some(path.as_path()), None, Some(PathBuf::from("out/b.html"))).unwrap();
        assert_eq!(cfg.input.path, PathBuf::from("a.csv"));
        assert_eq!(cfg.render.output_path, PathBuf::from("out/b.html"));

        let cfg = configure(Some(path.as_path()), Some(PathBuf::from("c.csv")), None).unwrap();
        assert_eq!(cfg.input.path, PathBuf::from("c.csv"));
        assert_eq!(cfg.render.output_path, PathBuf::from("dist/index.html"));
    }
}
