use serde::Serialize;

use crate::{Cursor, Decode, Result};

const PACKET_ID_MASK: u32 = 0x3FF;
const SUB_ID_MASK: u32 = 0x3;
const SENDER_SHIFT: u32 = 10;
const RECIPIENT_SHIFT: u32 = 12;

/// The varint every game packet starts with.
///
/// Bits 0-9 carry the packet id, bits 10-11 the sender sub-client and bits
/// 12-13 the recipient sub-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PacketHeader {
    pub packet_id: u16,
    pub sender_sub_id: u8,
    pub recipient_sub_id: u8,
}

impl PacketHeader {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            packet_id: (raw & PACKET_ID_MASK) as u16,
            sender_sub_id: ((raw >> SENDER_SHIFT) & SUB_ID_MASK) as u8,
            recipient_sub_id: ((raw >> RECIPIENT_SHIFT) & SUB_ID_MASK) as u8,
        }
    }

    #[must_use]
    pub const fn to_raw(self) -> u32 {
        (self.packet_id as u32 & PACKET_ID_MASK)
            | ((self.sender_sub_id as u32 & SUB_ID_MASK) << SENDER_SHIFT)
            | ((self.recipient_sub_id as u32 & SUB_ID_MASK) << RECIPIENT_SHIFT)
    }
}

impl Decode for PacketHeader {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_var_u32().map(Self::from_raw)
    }
}
