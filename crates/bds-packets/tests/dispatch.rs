use bds_packets::{
    DecodeContext, Dispatcher, FieldSet, Outcome, SchemaRegistry,
    ids::{
        CRAFTING_DATA_ID, LEVEL_CHUNK_ID, PLAY_STATUS_ID, SET_TIME_ID, START_GAME_ID,
        TRIM_DATA_ID,
    },
};
use bds_protocol::{PacketHeader, varint::write_var_u32};
use pretty_assertions::assert_eq;

/// Builds a frame: header varint, then body fields.
struct Frame(Vec<u8>);

impl Frame {
    fn new(packet_id: u16) -> Self {
        let header = PacketHeader {
            packet_id,
            sender_sub_id: 0,
            recipient_sub_id: 0,
        };
        let mut bytes = Vec::new();
        write_var_u32(&mut bytes, header.to_raw());
        Self(bytes)
    }

    fn var_u32(mut self, v: u32) -> Self {
        write_var_u32(&mut self.0, v);
        self
    }

    fn string(self, s: &str) -> Self {
        let mut frame = self.var_u32(s.len() as u32);
        frame.0.extend_from_slice(s.as_bytes());
        frame
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn build(self) -> Vec<u8> {
        self.0
    }
}

fn trim_data() -> Frame {
    Frame::new(TRIM_DATA_ID)
        .var_u32(1)
        .string("minecraft:coast_armor_trim_smithing_template")
        .string("coast")
        .var_u32(1)
        .string("quartz")
        .string("§h")
        .string("minecraft:quartz")
}

#[test]
fn decodes_first_occurrence() {
    let mut dispatcher = Dispatcher::default();
    let outcome = dispatcher.handle(0, &trim_data().build());
    assert_eq!(outcome, Outcome::Decoded);

    let report = dispatcher.report();
    let entry = report.entry(TRIM_DATA_ID).unwrap();
    assert!(entry.attempted && entry.succeeded);
    assert_eq!(entry.display_name, "TrimData");
    assert_eq!(entry.archived_file_name, "00000_302_0x12E_TrimData.bin");
    let Some(FieldSet::TrimData(trim)) = &entry.fields else {
        panic!("expected TrimData fields, got {:?}", entry.fields);
    };
    assert_eq!(trim.materials[0].color, "§h");
}

#[test]
fn truncated_frame_reports_remaining_bytes() {
    let full = trim_data().build();
    // cut in the middle of the last string
    let truncated = &full[..full.len() - 4];

    let mut dispatcher = Dispatcher::default();
    assert_eq!(dispatcher.handle(3, truncated), Outcome::Failed);

    let entry = dispatcher.report().entry(TRIM_DATA_ID).unwrap();
    assert!(entry.attempted);
    assert!(!entry.succeeded);
    assert!(entry.fields.is_none());
    let diagnostic = entry.error.as_ref().unwrap();
    assert_eq!(diagnostic.kind, "BufferOverrun");
    // "minecraft:quartz" is 16 bytes; its length prefix has been read
    let string_start = full.len() - 16;
    assert_eq!(diagnostic.offset, string_start);
    assert_eq!(diagnostic.remaining, truncated.len() - string_start);
    assert!(!diagnostic.dump.is_empty());
}

#[test]
fn leftover_bytes_are_incomplete_consumption() {
    let frame = Frame::new(SET_TIME_ID).var_u32(4).raw(&[0xAA, 0xBB]).build();
    let mut dispatcher = Dispatcher::default();
    assert_eq!(dispatcher.handle(0, &frame), Outcome::Failed);

    let diagnostic = dispatcher.report().entry(SET_TIME_ID).unwrap().error.clone().unwrap();
    assert_eq!(diagnostic.kind, "IncompleteConsumption");
    assert_eq!(diagnostic.remaining, 2);
    assert_eq!(diagnostic.offset, frame.len() - 2);
}

#[test]
fn repeats_are_skipped() {
    let mut dispatcher = Dispatcher::default();
    let status = Frame::new(PLAY_STATUS_ID).raw(&[0, 0, 0, 0]).build();
    // the second frame would fail, but it is never decoded
    let broken = Frame::new(PLAY_STATUS_ID).raw(&[0]).build();

    assert_eq!(dispatcher.handle(0, &status), Outcome::Decoded);
    assert_eq!(dispatcher.handle(1, &broken), Outcome::Repeat);
    assert_eq!(dispatcher.handle(2, &status), Outcome::Repeat);

    let report = dispatcher.report();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.frames, 3);
    assert_eq!(report.decoded, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failures().count(), 0);
}

#[test]
fn failure_does_not_stop_the_session() {
    let mut dispatcher = Dispatcher::default();
    // unknown crafting type 10
    let crafting = Frame::new(CRAFTING_DATA_ID).var_u32(1).raw(&[0x14]).build();

    assert_eq!(dispatcher.handle(0, &crafting), Outcome::Failed);
    assert_eq!(dispatcher.handle(1, &trim_data().build()), Outcome::Decoded);

    let report = dispatcher.report();
    assert_eq!(report.failed, 1);
    assert_eq!(report.decoded, 1);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.packet_id, CRAFTING_DATA_ID);
    assert_eq!(
        failure.error.as_ref().unwrap().kind,
        "UnrecognizedDiscriminant"
    );
}

#[test]
fn unknown_ids_are_not_attempted() {
    let mut dispatcher = Dispatcher::default();
    let chunk = Frame::new(LEVEL_CHUNK_ID).raw(&[1, 2, 3]).build();
    let unnamed = Frame::new(0x3FF).build();

    assert_eq!(dispatcher.handle(0, &chunk), Outcome::NotAttempted);
    assert_eq!(dispatcher.handle(1, &unnamed), Outcome::NotAttempted);

    let report = dispatcher.report();
    assert_eq!(report.unattempted().count(), 2);
    let unnamed = report.entry(0x3FF).unwrap();
    assert_eq!(unnamed.display_name, "Unknown");
    assert!(!unnamed.succeeded);
    assert!(unnamed.error.is_none());
}

#[test]
fn malformed_header_is_counted() {
    let mut dispatcher = Dispatcher::default();
    assert_eq!(dispatcher.handle(0, &[0x80]), Outcome::MalformedHeader);
    assert_eq!(dispatcher.report().malformed_headers, 1);
    assert!(dispatcher.report().entries.is_empty());
}

#[test]
fn sub_ids_do_not_change_the_packet_id() {
    let mut frame = Vec::new();
    let header = PacketHeader {
        packet_id: SET_TIME_ID,
        sender_sub_id: 1,
        recipient_sub_id: 2,
    };
    write_var_u32(&mut frame, header.to_raw());
    frame.push(0x02);

    assert_eq!(Dispatcher::peek_header(&frame), Some(header));
    let mut dispatcher = Dispatcher::default();
    assert_eq!(dispatcher.handle(0, &frame), Outcome::Decoded);
}

#[test]
fn start_game_uses_session_level_name() {
    let context = DecodeContext::new("Archive");
    let body = Frame::new(START_GAME_ID)
        .raw(&[0x01, 0x02, 0x03])
        .string("Archive")
        .string("Archive")
        .string("") // template content identity
        .raw(&[0, 0x00, 0x00, 0])
        .raw(&0u64.to_le_bytes())
        .raw(&[0x00, 0, 0])
        .build();

    let mut dispatcher = Dispatcher::new(SchemaRegistry::standard(), context);
    assert_eq!(dispatcher.handle(0, &body), Outcome::Decoded);

    // the default level name never matches
    let mut default = Dispatcher::default();
    assert_eq!(default.handle(0, &body), Outcome::Failed);
    assert_eq!(
        default.report().entry(START_GAME_ID).unwrap().error.as_ref().unwrap().kind,
        "MarkerNotFound"
    );
}

#[test]
fn report_serializes() {
    let mut dispatcher = Dispatcher::default();
    dispatcher.handle(0, &Frame::new(PLAY_STATUS_ID).raw(&[0, 0, 0, 2]).build());
    let json = serde_json::to_value(dispatcher.report()).unwrap();
    assert_eq!(json["entries"][0]["fields"]["status"], 2);
    assert_eq!(json["entries"][0]["display_name"], "PlayStatus");
    assert_eq!(json["decoded"], 1);
}
