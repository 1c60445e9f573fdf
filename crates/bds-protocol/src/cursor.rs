//! Forward-only, bounds-checked read head over a borrowed frame.
//!
//! Every read either advances the offset by exactly the bytes it consumed or
//! fails and leaves the offset where it was. Composite reads (`read_optional`,
//! `read_array`, `transaction`) restore the offset if any nested read fails, so
//! a failed read can always be retried or reported from a known position.

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    error::{DecodeError, ErrorKind, Result},
    nbt::{self, NbtCompound, NbtFlavor},
    varint::{self, ContinuationOrder, MAX_VARINT_LEN, MAX_VARLONG_LEN, Scan},
};

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying frame.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// True once every byte has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail of the frame.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }

    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn set_offset(&mut self, offset: usize) -> Result<()> {
        if offset > self.buf.len() {
            return Err(self.error(ErrorKind::OffsetOutOfBounds {
                requested: offset,
                len: self.buf.len(),
            }));
        }
        self.offset = offset;
        Ok(())
    }

    /// Build an error positioned at the current offset.
    #[must_use]
    pub fn error(&self, kind: ErrorKind) -> DecodeError {
        DecodeError::new(kind, self.buf, self.offset)
    }

    /// Error for a discriminant no decoder knows.
    #[must_use]
    pub fn unrecognized(&self, field: &'static str, value: impl Into<i64>) -> DecodeError {
        self.error(ErrorKind::UnrecognizedDiscriminant {
            field,
            value: value.into(),
        })
    }

    /// Run `read`, rewinding to the starting offset if it fails.
    pub fn transaction<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.offset;
        let result = read(self);
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.error(ErrorKind::BufferOverrun {
                what,
                needed: n,
                available: self.remaining(),
            }));
        }
        let bytes = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n, "bytes")
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.rest().first().copied().ok_or_else(|| {
            self.error(ErrorKind::BufferOverrun {
                what: "u8",
                needed: 1,
                available: 0,
            })
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Any nonzero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1, "bool")?[0] != 0)
    }

    pub fn read_u16<E: ByteOrder>(&mut self) -> Result<u16> {
        Ok(E::read_u16(self.take(2, "u16")?))
    }

    pub fn read_i16<E: ByteOrder>(&mut self) -> Result<i16> {
        Ok(E::read_i16(self.take(2, "i16")?))
    }

    pub fn read_u32<E: ByteOrder>(&mut self) -> Result<u32> {
        Ok(E::read_u32(self.take(4, "u32")?))
    }

    pub fn read_i32<E: ByteOrder>(&mut self) -> Result<i32> {
        Ok(E::read_i32(self.take(4, "i32")?))
    }

    pub fn read_u64<E: ByteOrder>(&mut self) -> Result<u64> {
        Ok(E::read_u64(self.take(8, "u64")?))
    }

    pub fn read_i64<E: ByteOrder>(&mut self) -> Result<i64> {
        Ok(E::read_i64(self.take(8, "i64")?))
    }

    pub fn read_f32<E: ByteOrder>(&mut self) -> Result<f32> {
        Ok(E::read_f32(self.take(4, "f32")?))
    }

    pub fn read_f64<E: ByteOrder>(&mut self) -> Result<f64> {
        Ok(E::read_f64(self.take(8, "f64")?))
    }

    fn read_varint_raw(&mut self, max_len: usize, order: ContinuationOrder) -> Result<u64> {
        match varint::scan(self.rest(), max_len, order) {
            Scan::Complete { value, len } => {
                self.offset += len;
                Ok(value)
            }
            Scan::TooLong => Err(self.error(ErrorKind::MalformedVarInt { max_len })),
            Scan::Truncated => Err(self.error(ErrorKind::BufferOverrun {
                what: "varint",
                needed: self.remaining() + 1,
                available: self.remaining(),
            })),
        }
    }

    pub fn read_var_u32_ordered(&mut self, order: ContinuationOrder) -> Result<u32> {
        // Five 7-bit groups carry 35 bits; the excess is dropped.
        Ok(self.read_varint_raw(MAX_VARINT_LEN, order)? as u32)
    }

    pub fn read_var_u32(&mut self) -> Result<u32> {
        self.read_var_u32_ordered(ContinuationOrder::default())
    }

    pub fn read_var_i32_ordered(&mut self, order: ContinuationOrder) -> Result<i32> {
        self.read_var_u32_ordered(order)
            .map(varint::zigzag_decode32)
    }

    pub fn read_var_i32(&mut self) -> Result<i32> {
        self.read_var_i32_ordered(ContinuationOrder::default())
    }

    pub fn read_var_u64_ordered(&mut self, order: ContinuationOrder) -> Result<u64> {
        self.read_varint_raw(MAX_VARLONG_LEN, order)
    }

    pub fn read_var_u64(&mut self) -> Result<u64> {
        self.read_var_u64_ordered(ContinuationOrder::default())
    }

    pub fn read_var_i64_ordered(&mut self, order: ContinuationOrder) -> Result<i64> {
        self.read_var_u64_ordered(order)
            .map(varint::zigzag_decode64)
    }

    pub fn read_var_i64(&mut self) -> Result<i64> {
        self.read_var_i64_ordered(ContinuationOrder::default())
    }

    /// Unsigned-varint length followed by that many raw bytes.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8]> {
        self.transaction(|c| {
            let len = c.read_var_u32()? as usize;
            c.take(len, "byte array")
        })
    }

    /// Length-prefixed text. Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&mut self) -> Result<String> {
        self.transaction(|c| {
            let len = c.read_var_u32()? as usize;
            let bytes = c.take(len, "string")?;
            Ok(String::from_utf8_lossy(bytes).into_owned())
        })
    }

    /// A nested cursor over a length-prefixed inner buffer.
    pub fn read_sub_cursor(&mut self) -> Result<Self> {
        self.read_byte_array().map(Cursor::new)
    }

    /// Two little-endian u64 halves, most significant half first.
    pub fn read_uuid(&mut self) -> Result<u128> {
        let bytes = self.take(16, "uuid")?;
        let high = LittleEndian::read_u64(&bytes[..8]);
        let low = LittleEndian::read_u64(&bytes[8..]);
        Ok((u128::from(high) << 64) | u128::from(low))
    }

    pub fn read_vec2(&mut self) -> Result<[f32; 2]> {
        let bytes = self.take(8, "vec2")?;
        let mut out = [0.0; 2];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        let bytes = self.take(12, "vec3")?;
        let mut out = [0.0; 3];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    /// Zig-zag x, unsigned y, zig-zag z.
    pub fn read_block_pos(&mut self) -> Result<[i32; 3]> {
        self.transaction(|c| {
            let x = c.read_var_i32()?;
            let y = c.read_var_u32()? as i32;
            let z = c.read_var_i32()?;
            Ok([x, y, z])
        })
    }

    pub fn read_chunk_pos(&mut self) -> Result<[i32; 2]> {
        self.transaction(|c| Ok([c.read_var_i32()?, c.read_var_i32()?]))
    }

    /// A bool flag byte, then the value if the flag is set.
    pub fn read_optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        self.transaction(|c| if c.read_bool()? { read(c).map(Some) } else { Ok(None) })
    }

    /// A count read by `size`, then exactly that many elements.
    ///
    /// Negative counts are rejected; the preallocation is bounded by the bytes
    /// left so a corrupt count cannot request a huge buffer.
    pub fn read_array<N, T>(
        &mut self,
        size: impl FnOnce(&mut Self) -> Result<N>,
        mut element: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>>
    where
        N: Into<i128>,
    {
        self.transaction(|c| {
            let count = c.read_count(size)?;
            let mut items = Vec::with_capacity(count.min(c.remaining()));
            for _ in 0..count {
                items.push(element(c)?);
            }
            Ok(items)
        })
    }

    /// Read a count with `size` and validate it as a collection length.
    pub fn read_count<N: Into<i128>>(
        &mut self,
        size: impl FnOnce(&mut Self) -> Result<N>,
    ) -> Result<usize> {
        let start = self.offset;
        let raw: i128 = size(self)?.into();
        usize::try_from(raw).map_err(|_| {
            self.offset = start;
            self.error(ErrorKind::InvalidLength {
                what: "array",
                value: raw,
            })
        })
    }

    /// Array whose count is an unsigned varint.
    pub fn read_var_array<T>(
        &mut self,
        element: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.read_array(Self::read_var_u32, element)
    }

    /// Embedded NBT document with a root tag.
    ///
    /// A lone END byte stands for "no document" and yields `None`. On failure
    /// the offset is left at the start of the document.
    pub fn read_nbt(&mut self, flavor: NbtFlavor) -> Result<Option<NbtCompound>> {
        if self.peek_u8()? == nbt::tag::END {
            self.offset += 1;
            return Ok(None);
        }
        let (compound, consumed) =
            nbt::read_root(self.rest(), flavor).map_err(|e| self.error(ErrorKind::SubDocument(e)))?;
        self.offset += consumed;
        Ok(Some(compound))
    }

    /// Compound payload without the leading tag id and root name.
    pub fn read_rootless_compound(&mut self, flavor: NbtFlavor) -> Result<NbtCompound> {
        let (compound, consumed) = nbt::read_compound_body(self.rest(), flavor)
            .map_err(|e| self.error(ErrorKind::SubDocument(e)))?;
        self.offset += consumed;
        Ok(compound)
    }

    /// Skip forward to just past the next occurrence of `marker`.
    ///
    /// Returns how many bytes were skipped, marker included.
    pub fn resync_after(&mut self, marker: &[u8]) -> Result<usize> {
        let found = if marker.is_empty() {
            Some(0)
        } else {
            self.rest()
                .windows(marker.len())
                .position(|window| window == marker)
        };
        match found {
            Some(position) => {
                let skipped = position + marker.len();
                self.offset += skipped;
                Ok(skipped)
            }
            None => Err(self.error(ErrorKind::MarkerNotFound {
                marker_len: marker.len(),
            })),
        }
    }

    /// Fail unless every byte of the frame was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.error(ErrorKind::IncompleteConsumption {
                remaining: self.remaining(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use byteorder::BigEndian;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{nbt, nbt::NbtValue, varint::write_var_u32};

    fn overrun(err: &DecodeError) -> bool {
        matches!(err.kind(), ErrorKind::BufferOverrun { .. })
    }

    #[test]
    fn test_fixed_width_endianness() {
        let bytes = [0x01, 0x02, 0x01, 0x02];
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 0x0201);
        assert_eq!(cursor.read_u16::<BigEndian>().unwrap(), 0x0102);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_signed_fixed_width() {
        let mut cursor = Cursor::new(&[0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(cursor.read_i16::<LittleEndian>().unwrap(), -1);
        assert_eq!(cursor.read_i32::<LittleEndian>().unwrap(), -2);
    }

    #[test]
    fn test_overrun_leaves_offset() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        cursor.read_u8().unwrap();
        let err = cursor.read_u32::<LittleEndian>().unwrap_err();
        assert!(overrun(&err));
        assert_eq!(cursor.offset(), 1);
        assert_eq!(err.remaining(), 2);
    }

    #[test]
    fn test_varint_overlong_is_malformed() {
        let mut cursor = Cursor::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        let err = cursor.read_var_u32().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedVarInt { max_len: 5 }));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_varlong_accepts_ten_bytes() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x01);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_var_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_varint_truncated_is_overrun() {
        let mut cursor = Cursor::new(&[0x80, 0x80]);
        assert!(overrun(&cursor.read_var_u32().unwrap_err()));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_zigzag_read() {
        let mut cursor = Cursor::new(&[0x01, 0x02, 0x03]);
        assert_eq!(cursor.read_var_i32().unwrap(), -1);
        assert_eq!(cursor.read_var_i32().unwrap(), 1);
        assert_eq!(cursor.read_var_i64().unwrap(), -2);
    }

    #[test]
    fn test_string_is_lossy() {
        let mut cursor = Cursor::new(&[0x03, b'a', 0xFF, b'b']);
        assert_eq!(cursor.read_string().unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_string_overrun_rewinds_length() {
        let mut cursor = Cursor::new(&[0x05, b'a', b'b']);
        assert!(overrun(&cursor.read_string().unwrap_err()));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_uuid_halves() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0123_4567_89AB_CDEFu64.to_le_bytes());
        bytes.extend_from_slice(&0x1111_2222_3333_4444u64.to_le_bytes());
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(
            format!("{:032x}", cursor.read_uuid().unwrap()),
            "0123456789abcdef1111222233334444"
        );
    }

    #[test]
    fn test_block_pos_mixed_encoding() {
        // x = -1 (zig-zag), y = 64 (unsigned), z = 2 (zig-zag)
        let mut cursor = Cursor::new(&[0x01, 0x40, 0x04]);
        assert_eq!(cursor.read_block_pos().unwrap(), [-1, 64, 2]);
    }

    #[test]
    fn test_optional() {
        let mut cursor = Cursor::new(&[0x00, 0x01, 0x2A]);
        assert_eq!(cursor.read_optional(Cursor::read_u8).unwrap(), None);
        assert_eq!(cursor.read_optional(Cursor::read_u8).unwrap(), Some(42));
    }

    #[test]
    fn test_optional_failure_rewinds_flag() {
        let mut cursor = Cursor::new(&[0x01]);
        assert!(cursor.read_optional(Cursor::read_u8).is_err());
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_array_with_u32_count() {
        let mut cursor = Cursor::new(&[2, 0, 0, 0, 7, 9]);
        let items = cursor
            .read_array(Cursor::read_u32::<LittleEndian>, Cursor::read_u8)
            .unwrap();
        assert_eq!(items, vec![7, 9]);
    }

    #[test]
    fn test_array_failure_rewinds_whole_array() {
        let mut cursor = Cursor::new(&[3, 7, 9]);
        assert!(cursor.read_var_array(Cursor::read_u8).is_err());
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut cursor = Cursor::new(&[0x01]);
        let err = cursor
            .read_array(Cursor::read_var_i32, Cursor::read_u8)
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidLength { value: -1, .. }
        ));
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_nested_arrays() {
        // [[1], [2, 3]]
        let mut cursor = Cursor::new(&[2, 1, 1, 2, 2, 3]);
        let grid = cursor
            .read_var_array(|c| c.read_var_array(Cursor::read_u8))
            .unwrap();
        assert_eq!(grid, vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_read_nbt_end_is_none() {
        let mut cursor = Cursor::new(&[0x00, 0xAA]);
        assert_eq!(cursor.read_nbt(NbtFlavor::Network).unwrap(), None);
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn test_read_nbt_advances_by_consumed() {
        let compound = nbt! { "a" => 1i32 };
        let mut bytes = compound.to_bytes(NbtFlavor::Network);
        bytes.push(0xEE);
        let mut cursor = Cursor::new(&bytes);
        let decoded = cursor.read_nbt(NbtFlavor::Network).unwrap().unwrap();
        assert_eq!(decoded.get("a"), Some(&NbtValue::Int(1)));
        assert_eq!(cursor.rest(), &[0xEE]);
    }

    #[test]
    fn test_read_nbt_failure_restores_offset() {
        let bytes = [0x07, 0x0A, 0x00, 0x63];
        let mut cursor = Cursor::new(&bytes);
        cursor.read_u8().unwrap();
        let err = cursor.read_nbt(NbtFlavor::LittleEndian).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::SubDocument(_)));
        assert_eq!(cursor.offset(), 1);
        assert_eq!(err.causes().len(), 1);
    }

    #[test]
    fn test_rootless_compound() {
        let compound = nbt! { "n" => "x" };
        let bytes = compound.to_bytes(NbtFlavor::Network);
        // Drop the tag id and the empty root name
        let mut cursor = Cursor::new(&bytes[2..]);
        let decoded = cursor.read_rootless_compound(NbtFlavor::Network).unwrap();
        assert_eq!(decoded, compound);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_resync_after() {
        let mut cursor = Cursor::new(b"junk--MARK--tail");
        assert_eq!(cursor.resync_after(b"MARK").unwrap(), 10);
        assert_eq!(cursor.rest(), b"--tail");
        let err = cursor.resync_after(b"MARK").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MarkerNotFound { marker_len: 4 }));
        assert_eq!(cursor.offset(), 10);
    }

    #[test]
    fn test_finish_reports_leftover() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        cursor.read_u8().unwrap();
        let err = cursor.finish().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::IncompleteConsumption { remaining: 2 }
        ));
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn test_sub_cursor_is_independent() {
        let mut bytes = Vec::new();
        write_var_u32(&mut bytes, 2);
        bytes.extend_from_slice(&[0xAB, 0xCD, 0xEF]);
        let mut cursor = Cursor::new(&bytes);
        let mut inner = cursor.read_sub_cursor().unwrap();
        assert_eq!(inner.read_u16::<BigEndian>().unwrap(), 0xABCD);
        assert!(inner.is_empty());
        assert_eq!(cursor.rest(), &[0xEF]);
    }

    #[test]
    fn test_set_offset_bounds() {
        let mut cursor = Cursor::new(&[0; 4]);
        cursor.set_offset(4).unwrap();
        assert!(cursor.is_empty());
        assert!(cursor.set_offset(5).is_err());
    }
}
