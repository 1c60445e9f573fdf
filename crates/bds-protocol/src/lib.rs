//! Read-side building blocks for the Bedrock game protocol.
//!
//! [`Cursor`] is the bounds-checked read head every decoder threads through,
//! [`Decode`] is the uniform "read this type from the cursor" contract, and
//! [`DecodeError`] pins failures to a frame offset with a hex dump attached.

// Lets `#[derive(Decode)]` output resolve `bds_protocol::` in the unit tests.
#[cfg(test)]
extern crate self as bds_protocol;

use std::fmt;

use byteorder::LittleEndian;
use serde::{Serialize, Serializer};

pub use bds_protocol_derive::Decode;

// Re-export serde for use by generated code
pub use serde;

mod cursor;
pub mod error;
mod header;
pub mod hexdump;
pub mod nbt;
pub mod varint;

pub use cursor::Cursor;
pub use error::{DecodeError, Diagnostic, ErrorKind, Result};
pub use header::PacketHeader;
pub use nbt::{NbtCompound, NbtFlavor, NbtList, NbtValue};

/// Marker trait for packets
pub trait Packet {
    /// The packet ID
    const ID: u16;
    /// The packet name (e.g., "StartGame")
    const NAME: &'static str;
}

/// Read a value of this type from the cursor.
pub trait Decode: Sized {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self>;
}

/// Fixed-width primitives are little-endian on the wire.
macro_rules! decode_le {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
                    cursor.$read::<LittleEndian>()
                }
            }
        )*
    };
}

decode_le! {
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
}

impl Decode for bool {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_bool()
    }
}

impl Decode for u8 {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_u8()
    }
}

impl Decode for i8 {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_i8()
    }
}

impl Decode for String {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_string()
    }
}

// Option<T> (bool prefix)
impl<T: Decode> Decode for Option<T> {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_optional(T::decode)
    }
}

// Vec<T> (unsigned varint count)
impl<T: Decode> Decode for Vec<T> {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_var_array(T::decode)
    }
}

// Fixed-size arrays carry no count
impl<T: Decode + Default + Copy, const N: usize> Decode for [T; N] {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let mut out = [T::default(); N];
            for slot in &mut out {
                *slot = T::decode(c)?;
            }
            Ok(out)
        })
    }
}

macro_rules! var_wrapper {
    ($(#[$meta:meta])* $name:ident($inner:ty) => $read:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl Decode for $name {
            fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
                cursor.$read().map(Self)
            }
        }

        impl From<$name> for $inner {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

var_wrapper!(
    /// Unsigned 32-bit varint.
    VarU32(u32) => read_var_u32
);
var_wrapper!(
    /// Zig-zag 32-bit varint.
    VarI32(i32) => read_var_i32
);
var_wrapper!(
    /// Unsigned 64-bit varint.
    VarU64(u64) => read_var_u64
);
var_wrapper!(
    /// Zig-zag 64-bit varint.
    VarI64(i64) => read_var_i64
);

/// List whose count is a little-endian `u32` rather than a varint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct U32Vec<T>(pub Vec<T>);

impl<T: Decode> Decode for U32Vec<T> {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor
            .read_array(Cursor::read_u32::<LittleEndian>, T::decode)
            .map(Self)
    }
}

/// Varint-length raw bytes, rendered as hex in reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteArray(pub Vec<u8>);

impl Decode for ByteArray {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_byte_array().map(|bytes| Self(bytes.to_vec()))
    }
}

impl Serialize for ByteArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&HexBytes(&self.0))
    }
}

struct HexBytes<'a>(&'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

// UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uuid(pub u128);

impl Decode for Uuid {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_uuid().map(Self)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Decode for Vec2 {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [x, y] = cursor.read_vec2()?;
        Ok(Self { x, y })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Decode for Vec3 {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [x, y, z] = cursor.read_vec3()?;
        Ok(Self { x, y, z })
    }
}

/// Block coordinates: zig-zag x and z, unsigned y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Decode for BlockPos {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [x, y, z] = cursor.read_block_pos()?;
        Ok(Self { x, y, z })
    }
}

/// Signed block coordinates, zig-zag on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SignedBlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Decode for SignedBlockPos {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(Self {
                x: c.read_var_i32()?,
                y: c.read_var_i32()?,
                z: c.read_var_i32()?,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl Decode for ChunkPos {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let [x, z] = cursor.read_chunk_pos()?;
        Ok(Self { x, z })
    }
}

/// Network-flavor NBT document; a lone END byte decodes to `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NetworkNbt(pub Option<NbtCompound>);

impl Decode for NetworkNbt {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.read_nbt(NbtFlavor::Network).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, PartialEq, Decode)]
    struct Sample {
        id: VarU32,
        flag: bool,
        name: String,
        scale: f32,
        tags: Vec<String>,
        pos: Option<BlockPos>,
    }

    #[derive(Debug, PartialEq, Decode)]
    struct Pair(u8, VarI32);

    #[test]
    fn test_derive_named_fields() {
        let mut bytes = vec![0x96, 0x01, 1, 2, b'o', b'k'];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&[1, 1, b't', 1, 0x03, 0x10, 0x04]);
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(
            Sample::decode(&mut cursor).unwrap(),
            Sample {
                id: VarU32(150),
                flag: true,
                name: "ok".into(),
                scale: 1.5,
                tags: vec!["t".into()],
                pos: Some(BlockPos { x: -2, y: 16, z: 2 }),
            }
        );
        cursor.finish().unwrap();
    }

    #[test]
    fn test_derive_tuple_struct() {
        let mut cursor = Cursor::new(&[7, 0x03]);
        assert_eq!(Pair::decode(&mut cursor).unwrap(), Pair(7, VarI32(-2)));
    }

    #[test]
    fn test_u32_counted_list() {
        let mut cursor = Cursor::new(&[2, 0, 0, 0, 5, 6]);
        assert_eq!(U32Vec::<u8>::decode(&mut cursor).unwrap().0, vec![5, 6]);
    }

    #[test]
    fn test_fixed_array() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        assert_eq!(<[u8; 3]>::decode(&mut cursor).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_json_wrappers() {
        assert_eq!(
            serde_json::to_string(&ByteArray(vec![0x0A, 0xFF])).unwrap(),
            r#""0aff""#
        );
        assert_eq!(
            serde_json::to_string(&Uuid(1)).unwrap(),
            format!("\"{}1\"", "0".repeat(31))
        );
        assert_eq!(serde_json::to_string(&VarI32(-3)).unwrap(), "-3");
    }
}
