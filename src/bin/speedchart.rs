use anyhow::Result;
use speedchart::cli::parse_cli;
use speedchart::pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let (config, csvin, htmlout, verbose) = parse_cli();
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = pipeline::configure(config.as_deref(), csvin, htmlout)?;
    info!(
        "read data from {} and chart to {}",
        cfg.input.path.display(),
        cfg.render.output_path.display()
    );
    let report = pipeline::run(&cfg)?;
    info!(
        "done, {} bytes in {}",
        report.bytes,
        report.output_path.display()
    );
    Ok(())
}
