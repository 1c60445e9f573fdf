use byteorder::{BigEndian, ByteOrder, LittleEndian};
use thiserror::Error;

use super::{NbtCompound, NbtFlavor, NbtList, NbtValue, tag};
use crate::varint::{self, ContinuationOrder, MAX_VARINT_LEN, MAX_VARLONG_LEN, Scan};

/// Deepest compound/list nesting accepted before giving up.
pub const MAX_DEPTH: usize = 512;

/// Failure inside an NBT document. Offsets are relative to the document start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NbtError {
    #[error("unexpected end of document at byte {0}")]
    UnexpectedEof(usize),
    #[error("unknown tag type {tag} at byte {at}")]
    UnknownTag { tag: u8, at: usize },
    #[error("malformed varint at byte {0}")]
    MalformedVarInt(usize),
    #[error("negative length {len} at byte {at}")]
    NegativeLength { len: i64, at: usize },
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    DepthLimit,
    #[error("root tag is {0}, expected a compound")]
    RootNotCompound(u8),
}

type Result<T> = std::result::Result<T, NbtError>;

/// Decode a root compound (tag id, name, body).
///
/// Returns the compound and the number of bytes it occupied.
pub fn read_root(bytes: &[u8], flavor: NbtFlavor) -> Result<(NbtCompound, usize)> {
    let mut reader = Reader::new(bytes, flavor);
    let root = reader.u8()?;
    if root != tag::COMPOUND {
        return Err(NbtError::RootNotCompound(root));
    }
    reader.string()?;
    let compound = reader.compound()?;
    Ok((compound, reader.pos))
}

/// Decode a compound body with no leading tag id or name.
pub fn read_compound_body(bytes: &[u8], flavor: NbtFlavor) -> Result<(NbtCompound, usize)> {
    let mut reader = Reader::new(bytes, flavor);
    let compound = reader.compound()?;
    Ok((compound, reader.pos))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    flavor: NbtFlavor,
    depth: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8], flavor: NbtFlavor) -> Self {
        Self {
            bytes,
            pos: 0,
            flavor,
            depth: 0,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(NbtError::UnexpectedEof(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn varint(&mut self, max_len: usize) -> Result<u64> {
        match varint::scan(&self.bytes[self.pos..], max_len, ContinuationOrder::default()) {
            Scan::Complete { value, len } => {
                self.pos += len;
                Ok(value)
            }
            Scan::Truncated => Err(NbtError::UnexpectedEof(self.pos)),
            Scan::TooLong => Err(NbtError::MalformedVarInt(self.pos)),
        }
    }

    fn i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(match self.flavor {
            NbtFlavor::BigEndian => BigEndian::read_i16(bytes),
            NbtFlavor::LittleEndian | NbtFlavor::Network => LittleEndian::read_i16(bytes),
        })
    }

    fn i32(&mut self) -> Result<i32> {
        match self.flavor {
            NbtFlavor::BigEndian => Ok(BigEndian::read_i32(self.take(4)?)),
            NbtFlavor::LittleEndian => Ok(LittleEndian::read_i32(self.take(4)?)),
            NbtFlavor::Network => {
                let raw = self.varint(MAX_VARINT_LEN)? as u32;
                Ok(varint::zigzag_decode32(raw))
            }
        }
    }

    fn i64(&mut self) -> Result<i64> {
        match self.flavor {
            NbtFlavor::BigEndian => Ok(BigEndian::read_i64(self.take(8)?)),
            NbtFlavor::LittleEndian => Ok(LittleEndian::read_i64(self.take(8)?)),
            NbtFlavor::Network => self.varint(MAX_VARLONG_LEN).map(varint::zigzag_decode64),
        }
    }

    fn f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(match self.flavor {
            NbtFlavor::BigEndian => BigEndian::read_f32(bytes),
            NbtFlavor::LittleEndian | NbtFlavor::Network => LittleEndian::read_f32(bytes),
        })
    }

    fn f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(match self.flavor {
            NbtFlavor::BigEndian => BigEndian::read_f64(bytes),
            NbtFlavor::LittleEndian | NbtFlavor::Network => LittleEndian::read_f64(bytes),
        })
    }

    fn len(&mut self) -> Result<usize> {
        let at = self.pos;
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| NbtError::NegativeLength {
            len: len.into(),
            at,
        })
    }

    fn string(&mut self) -> Result<String> {
        let len = match self.flavor {
            NbtFlavor::BigEndian => BigEndian::read_u16(self.take(2)?) as usize,
            NbtFlavor::LittleEndian => LittleEndian::read_u16(self.take(2)?) as usize,
            NbtFlavor::Network => self.varint(MAX_VARINT_LEN)? as u32 as usize,
        };
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read `count` elements, bounding preallocation by the bytes left.
    fn many<T>(&mut self, count: usize, mut read: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(count.min(self.bytes.len() - self.pos));
        for _ in 0..count {
            items.push(read(self)?);
        }
        Ok(items)
    }

    fn byte_array(&mut self) -> Result<Vec<i8>> {
        let len = self.len()?;
        Ok(self.take(len)?.iter().map(|b| *b as i8).collect())
    }

    fn int_array(&mut self) -> Result<Vec<i32>> {
        let len = self.len()?;
        self.many(len, Self::i32)
    }

    fn long_array(&mut self) -> Result<Vec<i64>> {
        let len = self.len()?;
        self.many(len, Self::i64)
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(NbtError::DepthLimit);
        }
        Ok(())
    }

    fn compound(&mut self) -> Result<NbtCompound> {
        self.descend()?;
        let mut entries = Vec::new();
        loop {
            let at = self.pos;
            let id = self.u8()?;
            if id == tag::END {
                break;
            }
            let name = self.string()?;
            let value = self.value(id, at)?;
            entries.push((name, value));
        }
        self.depth -= 1;
        Ok(NbtCompound::from_entries(entries))
    }

    fn value(&mut self, id: u8, at: usize) -> Result<NbtValue> {
        Ok(match id {
            tag::BYTE => NbtValue::Byte(self.u8()? as i8),
            tag::SHORT => NbtValue::Short(self.i16()?),
            tag::INT => NbtValue::Int(self.i32()?),
            tag::LONG => NbtValue::Long(self.i64()?),
            tag::FLOAT => NbtValue::Float(self.f32()?),
            tag::DOUBLE => NbtValue::Double(self.f64()?),
            tag::BYTE_ARRAY => NbtValue::ByteArray(self.byte_array()?),
            tag::STRING => NbtValue::String(self.string()?),
            tag::LIST => NbtValue::List(self.list()?),
            tag::COMPOUND => NbtValue::Compound(self.compound()?),
            tag::INT_ARRAY => NbtValue::IntArray(self.int_array()?),
            tag::LONG_ARRAY => NbtValue::LongArray(self.long_array()?),
            tag => return Err(NbtError::UnknownTag { tag, at }),
        })
    }

    fn list(&mut self) -> Result<NbtList> {
        self.descend()?;
        let at = self.pos;
        let element = self.u8()?;
        let len = self.len()?;

        let list = match element {
            tag::END => NbtList::Empty,
            tag::BYTE => NbtList::Byte(self.take(len)?.iter().map(|b| *b as i8).collect()),
            tag::SHORT => NbtList::Short(self.many(len, Self::i16)?),
            tag::INT => NbtList::Int(self.many(len, Self::i32)?),
            tag::LONG => NbtList::Long(self.many(len, Self::i64)?),
            tag::FLOAT => NbtList::Float(self.many(len, Self::f32)?),
            tag::DOUBLE => NbtList::Double(self.many(len, Self::f64)?),
            tag::BYTE_ARRAY => NbtList::ByteArray(self.many(len, Self::byte_array)?),
            tag::STRING => NbtList::String(self.many(len, Self::string)?),
            tag::LIST => NbtList::List(self.many(len, Self::list)?),
            tag::COMPOUND => NbtList::Compound(self.many(len, Self::compound)?),
            tag::INT_ARRAY => NbtList::IntArray(self.many(len, Self::int_array)?),
            tag::LONG_ARRAY => NbtList::LongArray(self.many(len, Self::long_array)?),
            tag => return Err(NbtError::UnknownTag { tag, at }),
        };
        self.depth -= 1;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::nbt;

    fn sample() -> NbtCompound {
        nbt! {
            "name" => "minecraft:oak_door",
            "version" => 18_100_737i32,
            "hash" => -7_i64,
            "scale" => 0.5f32,
            "states" => nbt! {
                "open_bit" => 1i8,
                "direction" => 3i32,
            },
            "ids" => NbtList::Short(vec![1, -2]),
            "bytes" => NbtValue::ByteArray(vec![1, -1]),
            "longs" => NbtValue::LongArray(vec![i64::MIN, 0]),
            "nested" => NbtList::List(vec![NbtList::Empty, NbtList::String(vec!["x".into()])]),
            "children" => NbtList::Compound(vec![nbt! {}, nbt! { "d" => 1.25f64 }]),
        }
    }

    #[test]
    fn test_every_flavor_reads_back() {
        for flavor in [NbtFlavor::BigEndian, NbtFlavor::LittleEndian, NbtFlavor::Network] {
            let bytes = sample().to_bytes(flavor);
            let (decoded, consumed) = read_root(&bytes, flavor).unwrap();
            assert_eq!(consumed, bytes.len(), "{flavor:?}");
            assert_eq!(decoded, sample(), "{flavor:?}");
        }
    }

    #[test]
    fn test_trailing_bytes_not_consumed() {
        let mut bytes = sample().to_bytes(NbtFlavor::LittleEndian);
        let len = bytes.len();
        bytes.extend_from_slice(&[0xDE, 0xAD]);
        let (_, consumed) = read_root(&bytes, NbtFlavor::LittleEndian).unwrap();
        assert_eq!(consumed, len);
    }

    #[test]
    fn test_root_must_be_compound() {
        assert_eq!(
            read_root(&[tag::LIST, 0, 0], NbtFlavor::LittleEndian),
            Err(NbtError::RootNotCompound(tag::LIST))
        );
    }

    #[test]
    fn test_unknown_tag() {
        let bytes = [tag::COMPOUND, 0, 0, 0x20, 0, 0];
        assert_eq!(
            read_root(&bytes, NbtFlavor::LittleEndian),
            Err(NbtError::UnknownTag { tag: 0x20, at: 3 })
        );
    }

    #[test]
    fn test_truncated() {
        let bytes = sample().to_bytes(NbtFlavor::Network);
        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(
            read_root(cut, NbtFlavor::Network),
            Err(NbtError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_negative_list_length() {
        // list of ints, zig-zag length -1
        let bytes = [tag::COMPOUND, 0, tag::LIST, 1, b'l', tag::INT, 0x01];
        assert_eq!(
            read_root(&bytes, NbtFlavor::Network),
            Err(NbtError::NegativeLength { len: -1, at: 6 })
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut bytes = vec![tag::COMPOUND, 0, 0];
        for _ in 0..=MAX_DEPTH {
            bytes.extend_from_slice(&[tag::COMPOUND, 0, 0]);
        }
        assert_eq!(
            read_root(&bytes, NbtFlavor::LittleEndian),
            Err(NbtError::DepthLimit)
        );
    }

    #[test]
    fn test_compound_body() {
        let bytes = [tag::BYTE, 1, 0, b'b', 7, tag::END, 0xFF];
        let (compound, consumed) = read_compound_body(&bytes, NbtFlavor::LittleEndian).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(compound.get("b"), Some(&NbtValue::Byte(7)));
    }
}
