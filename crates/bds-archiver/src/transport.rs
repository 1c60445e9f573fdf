//! Where capture frames come from.
//!
//! Framing, compression and encryption belong to the external transport. A
//! [`FrameSource`] only ever yields decompressed game packets, one per frame,
//! in arrival order.

use std::{future::Future, net::SocketAddr, pin::Pin};

use bds_protocol::varint::{VarIntStep, VarU32Decoder};
use tokio::{
    io::{AsyncRead, AsyncReadExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};
use tracing::{debug, info};

use crate::{ArchiverError, Result, archive::FrameRecording};

/// Largest relay frame accepted.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

pub type FrameFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>>;

pub trait FrameSource: Send {
    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> FrameFuture<'_>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Frames relayed over a byte stream, each prefixed by its length as an
/// unsigned varint.
pub struct RelaySource {
    reader: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
    peer: String,
}

impl RelaySource {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ArchiverError::Transport(format!("connect {addr}: {e}")))?;
        info!("Connected to frame relay at {}", addr);
        Ok(Self::new(stream, addr.to_string()))
    }

    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, peer: impl Into<String>) -> Self {
        Self {
            reader: BufReader::new(Box::new(reader)),
            peer: peer.into(),
        }
    }

    /// `None` on a clean end of stream between frames.
    async fn read_len(&mut self) -> Result<Option<u32>> {
        let mut decoder = VarU32Decoder::default();
        loop {
            let mut byte = [0u8; 1];
            if self.reader.read(&mut byte).await? == 0 {
                if decoder.is_empty() {
                    return Ok(None);
                }
                return Err(ArchiverError::Transport(
                    "stream ended inside a frame length".to_owned(),
                ));
            }
            match decoder.push(byte[0]) {
                VarIntStep::NeedMore => {}
                VarIntStep::Done(len) => return Ok(Some(len)),
                VarIntStep::Malformed => {
                    return Err(ArchiverError::Transport(
                        "malformed frame length varint".to_owned(),
                    ));
                }
            }
        }
    }

    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(len) = self.read_len().await? else {
            debug!("Relay {} closed", self.peer);
            return Ok(None);
        };
        if len > MAX_FRAME_LEN {
            return Err(ArchiverError::Transport(format!(
                "frame of {len} bytes exceeds {MAX_FRAME_LEN}"
            )));
        }
        let mut frame = vec![0u8; len as usize];
        self.reader.read_exact(&mut frame).await?;
        Ok(Some(frame))
    }
}

impl FrameSource for RelaySource {
    fn next_frame(&mut self) -> FrameFuture<'_> {
        Box::pin(self.read_frame())
    }

    fn describe(&self) -> String {
        format!("relay {}", self.peer)
    }
}

/// Frames from an earlier recording.
pub struct ReplaySource {
    frames: std::vec::IntoIter<Vec<u8>>,
    len: usize,
}

impl ReplaySource {
    #[must_use]
    pub fn new(recording: FrameRecording) -> Self {
        let frames: Vec<_> = recording.frames.into_iter().map(|f| f.raw_data).collect();
        Self {
            len: frames.len(),
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> FrameFuture<'_> {
        let frame = self.frames.next();
        Box::pin(async move { Ok(frame) })
    }

    fn describe(&self) -> String {
        format!("replay of {} frames", self.len)
    }
}

/// Frames pushed by an in-process transport.
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelSource {
    /// The source ends once every sender is dropped.
    #[must_use]
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> FrameFuture<'_> {
        Box::pin(async move { Ok(self.rx.recv().await) })
    }

    fn describe(&self) -> String {
        "in-process channel".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use bds_protocol::varint::write_var_u32;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncWriteExt;

    use super::*;

    fn framed(frames: &[&[u8]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for frame in frames {
            write_var_u32(&mut bytes, frame.len() as u32);
            bytes.extend_from_slice(frame);
        }
        bytes
    }

    #[tokio::test]
    async fn test_relay_splits_frames() {
        let big = vec![7u8; 300];
        let bytes = framed(&[&[0x0A, 0x02], &big, &[]]);
        let (mut writer, reader) = tokio::io::duplex(64);
        tokio::spawn(async move {
            writer.write_all(&bytes).await.unwrap();
        });

        let mut source = RelaySource::new(reader, "test");
        assert_eq!(source.next_frame().await.unwrap(), Some(vec![0x0A, 0x02]));
        assert_eq!(source.next_frame().await.unwrap(), Some(big));
        assert_eq!(source.next_frame().await.unwrap(), Some(Vec::new()));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_relay_truncated_frame_is_an_error() {
        let mut bytes = framed(&[&[1, 2, 3, 4]]);
        bytes.truncate(3);
        let mut source = RelaySource::new(std::io::Cursor::new(bytes), "test");
        assert!(source.next_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_relay_rejects_oversized_length() {
        let mut bytes = Vec::new();
        write_var_u32(&mut bytes, MAX_FRAME_LEN + 1);
        let mut source = RelaySource::new(std::io::Cursor::new(bytes), "test");
        assert!(matches!(
            source.next_frame().await,
            Err(ArchiverError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_relay_rejects_wide_length_varint() {
        // Fifth byte 0x10 sets bit 32.
        let bytes = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x10, 0x00];
        let mut source = RelaySource::new(std::io::Cursor::new(bytes), "test");
        assert!(matches!(
            source.next_frame().await,
            Err(ArchiverError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_channel_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::channel(4);
        tx.send(vec![1]).await.unwrap();
        drop(tx);
        assert_eq!(source.next_frame().await.unwrap(), Some(vec![1]));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }
}
