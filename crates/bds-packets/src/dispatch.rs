//! First-occurrence packet dispatch and the session report.
//!
//! The dispatcher is the one place decode failures are caught. A failure is
//! recorded against its packet id and the session carries on with the next
//! frame.

use std::collections::HashSet;

use bds_protocol::{Cursor, Decode, Diagnostic, PacketHeader};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    ids::{archive_file_name, display_name},
    registry::{DecodeContext, FieldSet, SchemaRegistry},
};

/// One line of the report: the first frame seen for a packet id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub packet_id: u16,
    pub display_name: &'static str,
    pub archived_file_name: String,
    pub sequence: u64,
    pub attempted: bool,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldSet>,
}

/// Everything a capture session learned, in first-arrival order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub frames: u64,
    pub decoded: u64,
    pub failed: u64,
    /// Repeat occurrences of an id that already has an entry.
    pub skipped: u64,
    pub malformed_headers: u64,
}

impl Report {
    #[must_use]
    pub fn entry(&self, packet_id: u16) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.packet_id == packet_id)
    }

    /// Decoded fields of the first frame with this id, if it decoded.
    #[must_use]
    pub fn fields(&self, packet_id: u16) -> Option<&FieldSet> {
        self.entry(packet_id).and_then(|e| e.fields.as_ref())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.attempted && !e.succeeded)
    }

    /// Ids seen with no schema to decode them.
    pub fn unattempted(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.attempted)
    }
}

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Decoded,
    Failed,
    /// First occurrence of an id with no schema.
    NotAttempted,
    /// The id already has a report entry.
    Repeat,
    MalformedHeader,
}

impl Outcome {
    /// True when the frame was the first of its id.
    #[must_use]
    pub const fn is_first(self) -> bool {
        matches!(self, Self::Decoded | Self::Failed | Self::NotAttempted)
    }
}

/// Routes frames to their schema, once per packet id.
#[derive(Debug)]
pub struct Dispatcher {
    registry: SchemaRegistry,
    context: DecodeContext,
    seen: HashSet<u16>,
    report: Report,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(SchemaRegistry::standard(), DecodeContext::default())
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: SchemaRegistry, context: DecodeContext) -> Self {
        Self {
            registry,
            context,
            seen: HashSet::new(),
            report: Report::default(),
        }
    }

    /// Header of a frame, if it has a readable one.
    #[must_use]
    pub fn peek_header(frame: &[u8]) -> Option<PacketHeader> {
        PacketHeader::decode(&mut Cursor::new(frame)).ok()
    }

    /// Process one frame. `sequence` is its arrival index in the session.
    pub fn handle(&mut self, sequence: u64, frame: &[u8]) -> Outcome {
        self.report.frames += 1;
        let mut cursor = Cursor::new(frame);

        let header = match PacketHeader::decode(&mut cursor) {
            Ok(header) => header,
            Err(e) => {
                warn!("#{} unreadable packet header: {}", sequence, e);
                self.report.malformed_headers += 1;
                return Outcome::MalformedHeader;
            }
        };
        let id = header.packet_id;
        debug!(
            "#{} 0x{:03X} {} ({} bytes)",
            sequence,
            id,
            display_name(id),
            frame.len()
        );

        if !self.seen.insert(id) {
            self.report.skipped += 1;
            return Outcome::Repeat;
        }

        let mut entry = ReportEntry {
            packet_id: id,
            display_name: display_name(id),
            archived_file_name: archive_file_name(sequence, id),
            sequence,
            attempted: false,
            succeeded: false,
            error: None,
            fields: None,
        };

        let outcome = if self.registry.contains(id) {
            entry.attempted = true;
            self.decode_first(&mut cursor, &mut entry)
        } else {
            debug!("  no schema for 0x{:03X}", id);
            Outcome::NotAttempted
        };

        self.report.entries.push(entry);
        outcome
    }

    /// Run the schema for `entry` over the rest of the frame and require
    /// every byte to be consumed.
    fn decode_first(&mut self, cursor: &mut Cursor<'_>, entry: &mut ReportEntry) -> Outcome {
        let Some(schema) = self.registry.get(entry.packet_id) else {
            return Outcome::NotAttempted;
        };
        let decoded = schema
            .decode(cursor, &self.context)
            .and_then(|fields| cursor.finish().map(|()| fields));
        match decoded {
            Ok(fields) => {
                info!("Decoded {} (0x{:03X})", entry.display_name, entry.packet_id);
                entry.succeeded = true;
                entry.fields = Some(fields);
                self.report.decoded += 1;
                Outcome::Decoded
            }
            Err(e) => {
                warn!(
                    "Failed to decode {} (0x{:03X}): {}",
                    entry.display_name, entry.packet_id, e
                );
                debug!("{:#}", e);
                entry.error = Some(e.diagnostic());
                self.report.failed += 1;
                Outcome::Failed
            }
        }
    }

    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub fn into_report(self) -> Report {
        self.report
    }

    #[must_use]
    pub const fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}
