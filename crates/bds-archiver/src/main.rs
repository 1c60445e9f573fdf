use bds_archiver::{
    ArchiverConfig,
    cli::{Cli, Command},
    pipeline,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bds_archiver=info".parse()?)
                .add_directive("bds_packets=info".parse()?)
                .add_directive("bds_palette=info".parse()?)
                .add_directive("bds_server=info".parse()?),
        )
        .init();

    let cli = Cli::parse(std::env::args().skip(1))?;
    let config = ArchiverConfig::load(cli.config.as_deref())?;
    info!("Exporting to {}", config.export_dir.display());

    let output = match cli.command {
        Command::Harvest => {
            pipeline::harvest(&config).await?;
            return Ok(());
        }
        Command::Palette { data } => {
            pipeline::palette_from_file(&config, &data).await?;
            return Ok(());
        }
        Command::Capture => pipeline::capture(&config).await?,
        Command::Replay { recording } => pipeline::replay(&config, &recording).await?,
        Command::Run => pipeline::run(&config).await?,
    };

    if output.report.failed > 0 {
        warn!("{} packet types failed to decode, see report.json", output.report.failed);
    }
    Ok(())
}
