//! The CLI commands, each a full run against one config.

use std::path::Path;

use bds_palette::{HarvestedData, Palette};
use tracing::info;

use crate::{
    Result,
    archive::FrameRecording,
    config::ArchiverConfig,
    handoff::HandOffReceiver,
    server::ServerProcess,
    session::{CaptureOutput, CaptureSession},
    transport::{RelaySource, ReplaySource},
};

pub const DATA_FILE: &str = "data.json";
pub const PALETTE_FILE: &str = "block_palette.nbt";

/// Start the server, take the harvested data it posts, then build the
/// palette. The server is stopped whether or not the hand-off arrives.
pub async fn harvest(config: &ArchiverConfig) -> Result<Palette> {
    std::fs::create_dir_all(&config.export_dir)?;
    let receiver = HandOffReceiver::bind(config.handoff_addr).await?;
    let mut server = ServerProcess::spawn(config).await?;

    let body = receiver.receive(config.handoff_timeout()).await;
    server.shutdown().await?;
    let body = body?;

    std::fs::write(config.export_path(DATA_FILE), &body)?;
    let data = HarvestedData::from_slice(&body)?;
    write_palette(config, data).await
}

/// Offline palette build from a saved hand-off.
pub async fn palette_from_file(config: &ArchiverConfig, path: &Path) -> Result<Palette> {
    let bytes = std::fs::read(path)?;
    let data = HarvestedData::from_slice(&bytes)?;
    std::fs::create_dir_all(&config.export_dir)?;
    write_palette(config, data).await
}

async fn write_palette(config: &ArchiverConfig, data: HarvestedData) -> Result<Palette> {
    let policy = config.palette.clone();
    let palette =
        tokio::task::spawn_blocking(move || bds_palette::build_palette(&data, &policy)).await??;

    let path = config.export_path(PALETTE_FILE);
    std::fs::write(&path, palette.to_bytes())?;
    info!("Wrote {} palette entries to {}", palette.len(), path.display());
    Ok(palette)
}

pub async fn capture(config: &ArchiverConfig) -> Result<CaptureOutput> {
    let mut server = ServerProcess::spawn(config).await?;
    let output = capture_from_relay(config).await;
    server.shutdown().await?;
    output
}

async fn capture_from_relay(config: &ArchiverConfig) -> Result<CaptureOutput> {
    let mut source = RelaySource::connect(config.relay_addr).await?;
    CaptureSession::new(&config.export_dir, &config.level_name, config.capture_timeout())?
        .run(&mut source)
        .await
}

pub async fn replay(config: &ArchiverConfig, recording: &Path) -> Result<CaptureOutput> {
    let recording = FrameRecording::load(recording)?;
    let mut source = ReplaySource::new(recording);
    CaptureSession::new(&config.export_dir, &config.level_name, config.capture_timeout())?
        .run(&mut source)
        .await
}

pub async fn run(config: &ArchiverConfig) -> Result<CaptureOutput> {
    harvest(config).await?;
    capture(config).await
}
