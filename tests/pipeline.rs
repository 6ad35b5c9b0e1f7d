use std::fs;
use std::path::{Path, PathBuf};

use speedchart::pipeline::{load, run};
use speedchart::{Config, Error, InputConfig, SpeedUnit, Stage};

const HEADER: &str = "StartedAt,DownloadedSpeed,UploadedSpeed\n";

fn config_for(dir: &Path, csv_body: &str) -> Config {
    let fin = dir.join("sampling.csv");
    fs::write(&fin, csv_body).unwrap();
    let mut cfg = Config::default();
    cfg.input.path = fin;
    cfg.input.unit = SpeedUnit::Mbps;
    cfg.render.output_path = dir.join("dist").join("index.html");
    cfg.render.width = 800;
    cfg.render.height = 400;
    cfg
}

fn chart_data(doc: &str) -> serde_json::Value {
    let open = "<script type=\"application/json\" id=\"chart-data\">";
    let start = doc.find(open).unwrap() + open.len();
    let end = doc[start..].find("</script>").unwrap() + start;
    serde_json::from_str(&doc[start..end]).unwrap()
}

#[test]
fn three_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(
        dir.path(),
        &format!(
            "{}2024-05-01T12:00:00Z,30,6\n2024-05-01T10:00:00Z,10,2\n2024-05-01T11:00:00Z,20,4\n",
            HEADER
        ),
    );
    let report = run(&cfg).unwrap();
    assert_eq!(report.figure.summary.download_median, 20.);
    assert_eq!(report.figure.summary.upload_median, 4.);

    let doc = fs::read_to_string(&cfg.render.output_path).unwrap();
    assert_eq!(doc.len(), report.bytes);
    let data = chart_data(&doc);
    let series = data["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    for s in series {
        assert_eq!(s["x"].as_array().unwrap().len(), 3);
        assert_eq!(s["y"].as_array().unwrap().len(), 3);
    }
    assert_eq!(data["series"][0]["y"], serde_json::json!([10.0, 20.0, 30.0]));
    let lines = data["reference_lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["y"], 20.0);
    assert_eq!(lines[1]["y"], 4.0);
}

#[test]
fn reruns_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(
        dir.path(),
        &format!(
            "{}2024-05-01T10:00:00Z,95.5,12.25\n2024-05-02T22:30:00Z,80,10\n2024-05-04T07:15:00Z,101,14\n2024-05-04T07:15:00Z,99,13\n",
            HEADER
        ),
    );
    run(&cfg).unwrap();
    let first = fs::read(&cfg.render.output_path).unwrap();
    run(&cfg).unwrap();
    let second = fs::read(&cfg.render.output_path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn extra_columns_do_not_change_medians() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(
        dir.path(),
        "Ping,StartedAt,Jitter,UploadedSpeed,DownloadedSpeed,Server\n\
         11,2024-05-01T10:00:00Z,1.5,2,10,tokyo\n\
         12,2024-05-01T11:00:00Z,1.7,8,40,tokyo\n",
    );
    let (log, summary) = load(&cfg.input).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(summary.download_median, 25.);
    assert_eq!(summary.upload_median, 5.);
}

#[test]
fn missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.input.path = dir.path().join("absent.csv");
    cfg.render.output_path = dir.path().join("dist").join("index.html");

    let err = run(&cfg).unwrap_err();
    assert_eq!(err.stage, Stage::Load);
    assert!(matches!(err.source, Error::FileNotFound { .. }));
    assert!(err.to_string().starts_with("load stage failed"));
    assert!(!cfg.render.output_path.exists());
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn missing_input_leaves_previous_artifact_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.input.path = dir.path().join("absent.csv");
    cfg.render.output_path = dir.path().join("index.html");
    fs::write(&cfg.render.output_path, "previous").unwrap();

    assert!(run(&cfg).is_err());
    assert_eq!(fs::read_to_string(&cfg.render.output_path).unwrap(), "previous");
}

#[test]
fn missing_speed_columns_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), "StartedAt,Ping\n2024-05-01T10:00:00Z,11\n");
    let err = run(&cfg).unwrap_err();
    assert_eq!(err.stage, Stage::Load);
    assert!(matches!(err.source, Error::Parse { .. }));
    assert!(!cfg.render.output_path.exists());
}

#[test]
fn header_only_is_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), HEADER);
    let err = run(&cfg).unwrap_err();
    assert!(matches!(err.source, Error::EmptyDataset { .. }));
    assert!(!cfg.render.output_path.exists());
}

#[test]
fn bits_per_second_are_charted_in_mbps() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_for(
        dir.path(),
        &format!(
            "{}2024-05-01T10:00:00Z,100000000,20000000\n2024-05-01T11:00:00Z,300000000,40000000\n",
            HEADER
        ),
    );
    cfg.input.unit = SpeedUnit::Bps;
    let report = run(&cfg).unwrap();
    assert!((report.figure.summary.download_median - 200.).abs() < 1e-9);
    assert!((report.figure.summary.upload_median - 30.).abs() < 1e-9);
}

#[test]
fn custom_column_names_and_labels() {
    let dir = tempfile::tempdir().unwrap();
    let fin = dir.path().join("runs.csv");
    fs::write(
        &fin,
        "when,down_mbps,up_mbps\n2024-05-01 10:00:00,50,5\n2024-05-01 11:00:00,70,9\n",
    )
    .unwrap();
    let toml = format!(
        r#"
[input]
path = {:?}
timestamp_column = "when"
download_column = "down_mbps"
upload_column = "up_mbps"
unit = "mbps"
timezone = "UTC"

[render]
title = "Fiber at home"
locale = "en"
output_path = {:?}
profile = false
"#,
        fin.to_string_lossy(),
        dir.path().join("public").join("speed.html").to_string_lossy()
    );
    let cfg = Config::from_toml_str(&toml).unwrap();
    assert_eq!(
        cfg.input,
        InputConfig {
            path: fin.clone(),
            timestamp_column: "when".to_string(),
            download_column: "down_mbps".to_string(),
            upload_column: "up_mbps".to_string(),
            unit: SpeedUnit::Mbps,
            timezone: "UTC".to_string(),
        }
    );

    let report = run(&cfg).unwrap();
    assert_eq!(
        report.output_path,
        PathBuf::from(dir.path().join("public").join("speed.html"))
    );
    let doc = fs::read_to_string(&report.output_path).unwrap();
    assert!(doc.contains("<title>Fiber at home</title>"));
    assert!(doc.contains("<html lang=\"en\">"));
    assert!(!doc.contains("id=\"profile\""));
    assert_eq!(report.figure.summary.download_median, 60.);
    assert!(chart_data(&doc).get("profile").is_none());
}

#[test]
fn bundled_sample_renders() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.input.path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("sampling.csv");
    cfg.render.output_path = dir.path().join("index.html");
    let report = run(&cfg).unwrap();
    assert!(report.figure.summary.count > 0);
    assert!(report.figure.profile.as_ref().map_or(false, |p| !p.is_empty()));
}
