use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use snowpit_converter::{ConversionConfig, SnowpitConverter, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "snowpit-convert")]
#[command(about = "Convert MOSAiC snowpit workbooks into gridded NetCDF files", long_about = None)]
struct Cli {
    /// SnowObs database directory containing MOSAiC/snowpit (overrides SNOWOBS_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory for the snow1_<measurement>.nc files (overrides SNOWPIT_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Source to convert: 'temperature' or 'density' (repeatable, default: all)
    #[arg(long = "source")]
    sources: Vec<SourceKind>,

    /// Print a JSON summary for each converted file
    #[arg(long)]
    summary: bool,
}

#[instrument]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,snowpit_converter=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ConversionConfig::from_env();
    if let Some(root) = cli.root {
        config = config.with_root_dir(root);
    }
    if let Some(output_dir) = cli.output_dir {
        config = config.with_output_dir(output_dir);
    }
    info!("Starting snowpit conversion with config: {:?}", config);

    let sources = if cli.sources.is_empty() {
        SourceKind::ALL.to_vec()
    } else {
        cli.sources
    };

    let converter = SnowpitConverter::new(config);
    let summaries = converter.run(&sources)?;

    if cli.summary {
        for summary in &summaries {
            println!("{}", serde_json::to_string(summary)?);
        }
    }

    info!("Converted {} source files", summaries.len());
    Ok(())
}
