//! Raw frame archive.
//!
//! Every frame lands in `frames.json` in arrival order. The first frame of
//! each packet id is also written on its own under `packets/`.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use bds_packets::{
    Dispatcher,
    ids::{archive_file_name, display_name},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;

pub const RECORDING_FILE: &str = "frames.json";
pub const PACKETS_DIR: &str = "packets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub sequence: u64,
    /// Milliseconds since the recording started.
    pub timestamp_ms: u64,
    /// `None` when the header could not be read.
    pub packet_id: Option<u16>,
    pub packet_name: String,
    pub file_name: String,
    pub raw_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecording {
    /// Unix time in milliseconds.
    pub start_time: u64,
    pub frames: Vec<RecordedFrame>,
}

impl FrameRecording {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let recording: Self = serde_json::from_reader(reader)?;
        info!(
            "Loaded {} frames from {}",
            recording.frames.len(),
            path.display()
        );
        Ok(recording)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Saved {} frames to {}", self.frames.len(), path.display());
        Ok(())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Writes frames under one export directory.
#[derive(Debug)]
pub struct FrameArchive {
    dir: PathBuf,
    started: Instant,
    recording: FrameRecording,
}

impl FrameArchive {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir.join(PACKETS_DIR))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            started: Instant::now(),
            recording: FrameRecording {
                start_time: unix_millis(),
                frames: Vec::new(),
            },
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record `frame`; `first` also writes it to its own file.
    pub fn record(&mut self, sequence: u64, frame: &[u8], first: bool) -> Result<()> {
        let header = Dispatcher::peek_header(frame);
        let (packet_id, packet_name, file_name) = match header {
            Some(header) => (
                Some(header.packet_id),
                display_name(header.packet_id),
                archive_file_name(sequence, header.packet_id),
            ),
            None => (None, "Malformed", format!("{sequence:05}_Malformed.bin")),
        };

        if first {
            std::fs::write(self.dir.join(PACKETS_DIR).join(&file_name), frame)?;
        }

        self.recording.frames.push(RecordedFrame {
            sequence,
            timestamp_ms: self.started.elapsed().as_millis() as u64,
            packet_id,
            packet_name: packet_name.to_owned(),
            file_name,
            raw_data: frame.to_vec(),
        });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recording.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recording.frames.is_empty()
    }

    /// Write `frames.json` and hand back the recording.
    pub fn finish(self) -> Result<FrameRecording> {
        self.recording.save(&self.dir.join(RECORDING_FILE))?;
        Ok(self.recording)
    }
}
