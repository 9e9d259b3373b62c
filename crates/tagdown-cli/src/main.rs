use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tagdown_config::Config;
use tagdown_engine::Converter;
use tagdown_live::LiveEditor;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagdown", version, about = "Tag-annotated text to HTML converter")]
struct Cli {
    /// Input text file to convert
    input: PathBuf,

    /// Output HTML file
    output: PathBuf,

    /// Configuration file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// File containing a log filter directive, e.g. "tagdown_engine=trace"
    #[arg(long)]
    log_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Copy the configured asset sources next to the output file
    #[arg(long)]
    prepare_assets: bool,

    /// Watch the input and serve a self-reloading preview
    #[arg(long)]
    live: bool,

    /// Preview server port (overrides the configured port)
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("cannot load configuration from '{}'", path.display()))?,
        None => Config::default(),
    };

    init_logging(&cli, &config)?;

    if let Some(parent) = cli.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create output directory '{}'", parent.display()))?;
    }

    let port = cli.port.unwrap_or(config.server.port);
    let converter = Converter::new(config).context("converter setup failed")?;

    if cli.prepare_assets {
        let output_dir = cli
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        converter
            .prepare_assets(output_dir)
            .context("asset preparation failed")?;
    }

    if cli.live {
        let runtime = tokio::runtime::Runtime::new().context("cannot start async runtime")?;
        runtime
            .block_on(LiveEditor::new(converter, cli.input, cli.output, port).start())
            .context("live session failed")?;
    } else {
        converter
            .convert(&cli.input, &cli.output)
            .context("conversion failed")?;
    }

    Ok(())
}

/// Filter precedence: explicit log config file, then the --debug flag or
/// the configured debug setting, then info.
fn init_logging(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let filter = match &cli.log_config {
        Some(path) => {
            let directive = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read log config '{}'", path.display()))?;
            EnvFilter::try_new(directive.trim())
                .with_context(|| format!("invalid log filter in '{}'", path.display()))?
        }
        None if cli.debug || config.general.debug => EnvFilter::new("debug"),
        None => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
