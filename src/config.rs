use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::{
    DEFAULT_CONFIG_PATH, DEFAULT_DOWNLOAD_COLUMN, DEFAULT_INPUT_PATH, DEFAULT_LOCALE,
    DEFAULT_OUTPUT_PATH, DEFAULT_TIMESTAMP_COLUMN, DEFAULT_TIMEZONE, DEFAULT_UPLOAD_COLUMN,
};

/// Unit of the speed columns in the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    /// bits per second, converted to Mbps on load
    Bps,
    Mbps,
}

impl SpeedUnit {
    pub fn to_mbps(self, v: f64) -> f64 {
        match self {
            SpeedUnit::Bps => v / 1000. / 1000.,
            SpeedUnit::Mbps => v,
        }
    }
}

impl Default for SpeedUnit {
    fn default() -> Self {
        SpeedUnit::Bps
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    pub timestamp_column: String,
    pub download_column: String,
    pub upload_column: String,
    pub unit: SpeedUnit,
    pub timezone: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path: PathBuf::from(DEFAULT_INPUT_PATH),
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            download_column: DEFAULT_DOWNLOAD_COLUMN.to_string(),
            upload_column: DEFAULT_UPLOAD_COLUMN.to_string(),
            unit: SpeedUnit::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl InputConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::Config(format!("unknown timezone {:?}", self.timezone)))
    }
}

/// Labels, locale and destination of the rendered chart.
/// Label fields left out of the config file fall back to the locale defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_profile")]
    pub profile: bool,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_width() -> u32 {
    1600
}

fn default_height() -> u32 {
    800
}

fn default_profile() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            title: None,
            x_label: None,
            y_label: None,
            locale: default_locale(),
            output_path: default_output_path(),
            width: default_width(),
            height: default_height(),
            profile: default_profile(),
        }
    }
}

/// Localized strings used in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Labels {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub profile_title: &'static str,
    pub profile_x_label: &'static str,
    pub download: &'static str,
    pub upload: &'static str,
    pub download_median: &'static str,
    pub upload_median: &'static str,
    pub samples: &'static str,
    pub period: &'static str,
    pub as_of: &'static str,
    pub timezone: &'static str,
    pub weekdays: [&'static str; 7],
}

const LABELS_JA: Labels = Labels {
    title: "ダウンロード・アップロード速度の推移 (中央値付き)",
    x_label: "日時",
    y_label: "速度 (Mbps)",
    profile_title: "曜日・時間帯別の分布 (箱ひげ図と中央値)",
    profile_x_label: "曜日-時",
    download: "ダウンロード",
    upload: "アップロード",
    download_median: "ダウンロード中央値",
    upload_median: "アップロード中央値",
    samples: "測定回数",
    period: "期間",
    as_of: "最終測定",
    timezone: "タイムゾーン",
    weekdays: ["月", "火", "水", "木", "金", "土", "日"],
};

const LABELS_EN: Labels = Labels {
    title: "Download & Upload Speed over Time (with Medians)",
    x_label: "Time",
    y_label: "Speed (Mbps)",
    profile_title: "Speed by Day and Hour (Box Plots with Medians)",
    profile_x_label: "Day - Hour",
    download: "Download",
    upload: "Upload",
    download_median: "Download Median",
    upload_median: "Upload Median",
    samples: "Samples",
    period: "Period",
    as_of: "Latest measurement",
    timezone: "Time zone",
    weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
};

impl Labels {
    pub fn for_locale(locale: &str) -> &'static Labels {
        let lang = locale.split(|c| c == '-' || c == '_').next().unwrap_or("");
        if lang.eq_ignore_ascii_case("ja") {
            &LABELS_JA
        } else {
            &LABELS_EN
        }
    }
}

impl RenderConfig {
    pub fn labels(&self) -> &'static Labels {
        Labels::for_locale(&self.locale)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.labels().title)
    }

    pub fn x_label(&self) -> &str {
        self.x_label.as_deref().unwrap_or(self.labels().x_label)
    }

    pub fn y_label(&self) -> &str {
        self.y_label.as_deref().unwrap_or(self.labels().y_label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: InputConfig,
    pub render: RenderConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads the config file at the given path.
    /// Without a path, reads speedchart.toml from the working directory
    /// if it exists and otherwise uses the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !path.exists() {
            if explicit {
                return Err(Error::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            warn!(
                "no config file {} found, using defaults",
                path.display()
            );
            return Ok(Config::default());
        }
        debug!("reading config from {}", path.display());
        let raw = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.input.path, PathBuf::from("data/sampling.csv"));
        assert_eq!(cfg.input.unit, SpeedUnit::Bps);
        assert_eq!(cfg.render.output_path, PathBuf::from("dist/index.html"));
        assert_eq!(cfg.render.locale, "ja");
        assert!(cfg.render.profile);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [input]
            path = "runs.csv"
            unit = "mbps"
            timezone = "Europe/Rome"

            [render]
            title = "Home line"
            locale = "en"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.input.path, PathBuf::from("runs.csv"));
        assert_eq!(cfg.input.unit, SpeedUnit::Mbps);
        assert_eq!(cfg.input.timestamp_column, "StartedAt");
        assert_eq!(cfg.input.tz().unwrap(), chrono_tz::Europe::Rome);
        assert_eq!(cfg.render.title(), "Home line");
        assert_eq!(cfg.render.x_label(), "Time");
        assert_eq!(cfg.render.width, 1600);
    }

    #[test]
    fn labels_follow_locale() {
        let mut render = RenderConfig::default();
        assert_eq!(render.y_label(), "速度 (Mbps)");
        assert_eq!(render.labels().weekdays[0], "月");
        render.locale = "en-US".to_string();
        assert_eq!(render.y_label(), "Speed (Mbps)");
        render.locale = "ja_JP".to_string();
        assert_eq!(render.labels().weekdays[6], "日");
    }

    #[test]
    fn unknown_keys_and_timezones_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("[render]\ncolour = \"red\"\n"),
            Err(Error::Config(_))
        ));
        let mut input = InputConfig::default();
        input.timezone = "Mars/Olympus".to_string();
        assert!(matches!(input.tz(), Err(Error::Config(_))));
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(Some(missing.as_path())), Err(Error::Config(_))));
    }

    #[test]
    fn load_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedchart.toml");
        std::fs::write(&path, "[render]\noutput_path = \"public/speed.html\"\n").unwrap();
        let cfg = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.render.output_path, PathBuf::from("public/speed.html"));
    }

    #[test]
    fn bad_config_file_names_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speedchart.toml");
        std::fs::write(&path, "[render
").unwrap();
        let msg = Config::load(Some(path.as_path())).unwrap_err().to_string();
        assert!(msg.starts_with("invalid configuration: "));
        assert_eq!(msg.matches("invalid configuration").count(), 1);
        assert!(msg.contains(&path.display().to_string()));
    }
}
