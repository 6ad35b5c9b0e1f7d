use super::VERSION;
use clap::{App, Arg};
use std::ffi::OsString;
use std::path::PathBuf;

/// Takes the CLI arguments that control the speed chart.
/// All of them are optional, the config file and its defaults cover the rest.
pub fn parse_cli() -> (Option<PathBuf>, Option<PathBuf>, Option<PathBuf>, bool) {
    parse_cli_from(std::env::args_os())
}

pub fn parse_cli_from<I, T>(args: I) -> (Option<PathBuf>, Option<PathBuf>, Option<PathBuf>, bool)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_config = Arg::with_name("config")
        .help("toml config file, speedchart.toml is used when present")
        .short("c")
        .long("config")
        .takes_value(true);
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("speed-test log to read, overrides input.path")
        .short("f")
        .long("csvfile")
        .takes_value(true);
    let arg_htmlout = Arg::with_name("output_htmlfile")
        .help("html document to write, overrides render.output_path")
        .short("o")
        .long("output")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print debug information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    let cli_args = App::new("speedchart")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to chart download and upload speeds with their medians")
        .arg(arg_config)
        .arg(arg_csvin)
        .arg(arg_htmlout)
        .arg(arg_verbose)
        .get_matches_from(args);
    let config = cli_args.value_of("config").map(PathBuf::from);
    let csvin = cli_args.value_of("input_csvfile").map(PathBuf::from);
    let htmlout = cli_args.value_of("output_htmlfile").map(PathBuf::from);
    let verbose = cli_args.is_present("verbose");
    (config, csvin, htmlout, verbose)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_are_required() {
        let (config, csvin, htmlout, verbose) = parse_cli_from(vec!["speedchart"]);
        assert!(config.is_none());
        assert!(csvin.is_none());
        assert!(htmlout.is_none());
        assert!(!verbose);
    }

    #[test]
    fn short_and_long_flags() {
        let (config, csvin, htmlout, verbose) = parse_cli_from(vec![
            "speedchart",
            "--config",
            "site.toml",
            "-f",
            "data/sampling.csv",
            "-o",
            "public/index.html",
            "-v",
        ]);
        assert_eq!(config, Some(PathBuf::from("site.toml")));
        assert_eq!(csvin, Some(PathBuf::from("data/sampling.csv")));
        assert_eq!(htmlout, Some(PathBuf::from("public/index.html")));
        assert!(verbose);
    }
}
