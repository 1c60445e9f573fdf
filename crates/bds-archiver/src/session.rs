//! A capture session: frames in, archive and report out.
//!
//! Frames are handled strictly one at a time off a single source. The
//! session ends when the source is exhausted, the transport or the archive
//! fails, or the wall-clock timeout expires. Every ending still writes the
//! report.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::Duration,
};

use bds_packets::{DecodeContext, Dispatcher, Report, SchemaRegistry};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    Result,
    archive::{FrameArchive, FrameRecording},
    artifacts::write_artifacts,
    transport::FrameSource,
};

pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EndReason {
    Exhausted,
    Timeout,
    Transport(String),
    /// A frame could not be written to the archive.
    Archive(String),
}

#[derive(Debug)]
pub struct CaptureOutput {
    pub report: Report,
    pub recording: FrameRecording,
    pub ended_by: EndReason,
    pub artifacts: Vec<PathBuf>,
}

pub struct CaptureSession {
    dispatcher: Dispatcher,
    archive: FrameArchive,
    timeout: Duration,
}

impl CaptureSession {
    /// Standard schemas, resyncing StartGame on `level_name`.
    pub fn new(export_dir: &Path, level_name: &str, timeout: Duration) -> Result<Self> {
        let dispatcher = Dispatcher::new(SchemaRegistry::standard(), DecodeContext::new(level_name));
        Ok(Self::with_dispatcher(
            dispatcher,
            FrameArchive::create(export_dir)?,
            timeout,
        ))
    }

    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher, archive: FrameArchive, timeout: Duration) -> Self {
        Self {
            dispatcher,
            archive,
            timeout,
        }
    }

    pub async fn run(mut self, source: &mut dyn FrameSource) -> Result<CaptureOutput> {
        info!("Capturing from {} for up to {:?}", source.describe(), self.timeout);
        let deadline = Instant::now() + self.timeout;
        let mut sequence = 0u64;

        let ended_by = loop {
            match tokio::time::timeout_at(deadline, source.next_frame()).await {
                Err(_) => break EndReason::Timeout,
                Ok(Ok(None)) => break EndReason::Exhausted,
                Ok(Ok(Some(frame))) => {
                    let outcome = self.dispatcher.handle(sequence, &frame);
                    if let Err(e) = self.archive.record(sequence, &frame, outcome.is_first()) {
                        warn!("Archiving frame {} failed: {}", sequence, e);
                        break EndReason::Archive(e.to_string());
                    }
                    sequence += 1;
                }
                Ok(Err(e)) => {
                    warn!("Transport failed: {}", e);
                    break EndReason::Transport(e.to_string());
                }
            }
        };

        self.finish(ended_by)
    }

    fn finish(self, ended_by: EndReason) -> Result<CaptureOutput> {
        let dir = self.archive.dir().to_path_buf();
        let recording = self.archive.finish()?;
        let report = self.dispatcher.into_report();

        let writer = BufWriter::new(File::create(dir.join(REPORT_FILE))?);
        serde_json::to_writer_pretty(writer, &report)?;
        let artifacts = write_artifacts(&report, &dir)?;

        info!(
            "Session ended ({:?}): {} frames, {} ids, {} decoded, {} failed, {} unattempted",
            ended_by,
            report.frames,
            report.entries.len(),
            report.decoded,
            report.failed,
            report.unattempted().count()
        );
        for failure in report.failures() {
            if let Some(error) = &failure.error {
                warn!(
                    "  {} (0x{:03X}): {} at offset {}",
                    failure.display_name, failure.packet_id, error.kind, error.offset
                );
            }
        }

        Ok(CaptureOutput {
            report,
            recording,
            ended_by,
            artifacts,
        })
    }
}
