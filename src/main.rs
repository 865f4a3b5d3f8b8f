use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trustengine_forensics::{
    ForensicConfig, ForensicSuite,
    report::{JsonReport, SuiteReport},
    storage::{ArtifactFormat, ArtifactNaming, ArtifactStore, FsStore},
};

#[derive(Parser)]
#[command(name = "trustengine-forensics")]
#[command(about = "Error-level, noise-residual and focus-heatmap filters for an uploaded image")]
struct Cli {
    /// Image to analyze
    image: PathBuf,

    /// Directory the derived artifacts are written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JPEG quality of the recompression proxy
    #[arg(long)]
    quality: Option<u8>,

    /// Brightness multiplier applied to ELA differences
    #[arg(long)]
    amplification: Option<f64>,

    /// Encoding of the written artifacts
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Run the filters one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Prefix prepended to artifact paths in the printed report
    #[arg(long, default_value = "/")]
    prefix: String,

    /// Also print summary statistics of the artifacts
    #[arg(long)]
    stats: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Jpeg,
    Png,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "trustengine_forensics=debug"
    } else {
        "trustengine_forensics=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ForensicConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ForensicConfig::default(),
    };
    if let Some(quality) = cli.quality {
        config = config.with_ela_quality(quality);
    }
    if let Some(amplification) = cli.amplification {
        config = config.with_ela_amplification(amplification);
    }
    match cli.format {
        Some(OutputFormat::Png) => config = config.with_artifact_format(ArtifactFormat::Png),
        Some(OutputFormat::Jpeg)
            if !matches!(config.artifact_format, ArtifactFormat::Jpeg { .. }) =>
        {
            config = config.with_artifact_format(ArtifactFormat::default());
        }
        _ => {}
    }
    if cli.sequential {
        config = config.with_parallel(false);
    }

    let suite = ForensicSuite::new(config).context("invalid configuration")?;
    let store = FsStore;

    let source = store
        .load(&cli.image)
        .with_context(|| format!("decoding {}", cli.image.display()))?;
    let naming =
        ArtifactNaming::for_source(&cli.output_dir, &source, suite.config().artifact_format);

    let (result, artifacts) = suite.run_with_artifacts(&source, &naming, &store);

    println!("{}", JsonReport::new(&result, &cli.prefix).to_json()?);
    if cli.stats {
        println!("{}", SuiteReport::from(&artifacts).to_json()?);
    }

    Ok(())
}
