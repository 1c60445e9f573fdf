//! Decode failures and their diagnostics.

use std::{error::Error as _, fmt};

use serde::Serialize;
use thiserror::Error;

use crate::{hexdump::HexDump, nbt::NbtError};

/// What went wrong while decoding.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A read needed more bytes than the frame has left.
    #[error("buffer overrun reading {what}: needed {needed} bytes, {available} available")]
    BufferOverrun {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// A varint kept its continuation bit set past the format's maximum length.
    #[error("malformed varint: no terminating byte within {max_len} bytes")]
    MalformedVarInt { max_len: usize },

    /// A tag or type byte selected no known payload shape.
    #[error("unrecognized {field} discriminant {value}")]
    UnrecognizedDiscriminant { field: &'static str, value: i64 },

    /// The schema decoder returned but bytes remain in the frame.
    #[error("decode finished with {remaining} bytes unconsumed")]
    IncompleteConsumption { remaining: usize },

    /// An embedded NBT document failed to decode.
    #[error("embedded NBT document failed to decode")]
    SubDocument(#[source] NbtError),

    /// A length prefix that cannot describe a real collection.
    #[error("invalid {what} length {value}")]
    InvalidLength { what: &'static str, value: i128 },

    #[error("offset {requested} is outside a buffer of {len} bytes")]
    OffsetOutOfBounds { requested: usize, len: usize },

    /// `resync_after` scanned to the end without finding its marker.
    #[error("resync marker of {marker_len} bytes not found")]
    MarkerNotFound { marker_len: usize },
}

impl ErrorKind {
    /// Stable name of the variant, used in reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BufferOverrun { .. } => "BufferOverrun",
            Self::MalformedVarInt { .. } => "MalformedVarInt",
            Self::UnrecognizedDiscriminant { .. } => "UnrecognizedDiscriminant",
            Self::IncompleteConsumption { .. } => "IncompleteConsumption",
            Self::SubDocument(_) => "SubDocumentDecodeFailure",
            Self::InvalidLength { .. } => "InvalidLength",
            Self::OffsetOutOfBounds { .. } => "OffsetOutOfBounds",
            Self::MarkerNotFound { .. } => "MarkerNotFound",
        }
    }
}

/// A decode failure pinned to a position in the frame it happened in.
///
/// Carries the offset, the number of unread bytes at that offset and a hex
/// dump of the surrounding window. Boxed so `Result<T, DecodeError>` stays one
/// pointer wide on the hot path.
pub struct DecodeError(Box<Inner>);

#[derive(Debug)]
struct Inner {
    kind: ErrorKind,
    offset: usize,
    remaining: usize,
    dump: HexDump,
}

impl DecodeError {
    /// Capture `kind` at `offset` within `buf`.
    #[must_use]
    pub fn new(kind: ErrorKind, buf: &[u8], offset: usize) -> Self {
        Self(Box::new(Inner {
            kind,
            offset,
            remaining: buf.len().saturating_sub(offset),
            dump: HexDump::capture(buf, offset),
        }))
    }

    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Offset within the frame at failure time.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.0.offset
    }

    /// Unread bytes in the frame at failure time.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.0.remaining
    }

    #[must_use]
    pub fn dump(&self) -> &HexDump {
        &self.0.dump
    }

    /// Messages of every error below this one, outermost first.
    #[must_use]
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut next = self.0.kind.source();
        while let Some(err) = next {
            causes.push(err.to_string());
            next = err.source();
        }
        causes
    }

    /// Serializable snapshot for reports.
    #[must_use]
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            kind: self.0.kind.name(),
            message: self.0.kind.to_string(),
            offset: self.0.offset,
            remaining: self.0.remaining,
            dump: self.0.dump.to_string(),
            causes: self.causes(),
        }
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.0.kind)
            .field("offset", &self.0.offset)
            .field("remaining", &self.0.remaining)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at offset {} ({} bytes remaining)",
            self.0.kind, self.0.offset, self.0.remaining
        )?;
        if f.alternate() {
            write!(f, "\n{:#}", self.0.dump)?;
            for cause in self.causes() {
                write!(f, "\nCaused by: {cause}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.kind.source()
    }
}

/// Report-friendly rendering of a [`DecodeError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: &'static str,
    pub message: String,
    pub offset: usize,
    pub remaining: usize,
    pub dump: String,
    pub causes: Vec<String>,
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_counts_from_offset() {
        let buf = [0u8; 10];
        let err = DecodeError::new(ErrorKind::MalformedVarInt { max_len: 5 }, &buf, 7);
        assert_eq!(err.offset(), 7);
        assert_eq!(err.remaining(), 3);
        assert_eq!(err.dump().cursor(), 7);
    }

    #[test]
    fn test_sub_document_keeps_cause_chain() {
        let err = DecodeError::new(
            ErrorKind::SubDocument(NbtError::UnknownTag { tag: 0x42, at: 1 }),
            &[0x0A, 0x42],
            0,
        );
        let diagnostic = err.diagnostic();
        assert_eq!(diagnostic.kind, "SubDocumentDecodeFailure");
        assert_eq!(diagnostic.causes.len(), 1);
        assert!(diagnostic.causes[0].contains("66"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_alternate_display_includes_dump() {
        let err = DecodeError::new(
            ErrorKind::IncompleteConsumption { remaining: 2 },
            &[1, 2, 3, 4],
            2,
        );
        let plain = err.to_string();
        assert!(plain.contains("2 bytes unconsumed"));
        assert!(!plain.contains('\n'));
        assert!(format!("{err:#}").contains("0x00000000"));
    }
}
