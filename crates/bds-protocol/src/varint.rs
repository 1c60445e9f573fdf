//! Variable-length integer codecs.
//!
//! Seven payload bits per byte; every byte except the last has its high bit
//! set. Signed values go through zig-zag so small negatives stay short.

/// Maximum encoded length of a 32-bit varint.
pub const MAX_VARINT_LEN: usize = 5;

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARLONG_LEN: usize = 10;

/// Which end of the value the first continuation byte carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationOrder {
    /// First byte holds the lowest seven bits (LEB128, the wire default).
    #[default]
    LeastSignificantFirst,
    /// First byte holds the highest seven bits.
    MostSignificantFirst,
}

/// Result of scanning a varint out of a byte slice without consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    Complete { value: u64, len: usize },
    Truncated,
    TooLong,
}

pub(crate) fn scan(bytes: &[u8], max_len: usize, order: ContinuationOrder) -> Scan {
    for (i, &byte) in bytes.iter().enumerate() {
        if i == max_len {
            return Scan::TooLong;
        }
        if byte & 0x80 == 0 {
            let len = i + 1;
            return Scan::Complete {
                value: assemble(&bytes[..len], order),
                len,
            };
        }
    }

    if bytes.len() >= max_len {
        Scan::TooLong
    } else {
        Scan::Truncated
    }
}

fn assemble(bytes: &[u8], order: ContinuationOrder) -> u64 {
    match order {
        ContinuationOrder::LeastSignificantFirst => bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(b & 0x7F) << (7 * i))),
        ContinuationOrder::MostSignificantFirst => bytes
            .iter()
            .fold(0u64, |acc, b| (acc << 7) | u64::from(b & 0x7F)),
    }
}

/// Progress of a [`VarU32Decoder`] after one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarIntStep {
    NeedMore,
    Done(u32),
    /// The fifth byte carried bits that do not fit in 32 bits.
    Malformed,
}

/// Byte-at-a-time unsigned 32-bit varint decoder for stream sources.
///
/// Unlike the slice reader it rejects a fifth byte above `0x0F`, which would
/// either overflow or keep the continuation bit set.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarU32Decoder {
    value: u32,
    len: usize,
}

impl VarU32Decoder {
    /// True until the first byte has been pushed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, byte: u8) -> VarIntStep {
        if self.len == MAX_VARINT_LEN - 1 && byte > 0x0F {
            return VarIntStep::Malformed;
        }
        self.value |= u32::from(byte & 0x7F) << (7 * self.len);
        self.len += 1;
        if byte & 0x80 == 0 {
            VarIntStep::Done(self.value)
        } else {
            VarIntStep::NeedMore
        }
    }
}

#[inline]
#[must_use]
pub const fn zigzag_decode32(raw: u32) -> i32 {
    ((raw >> 1) as i32) ^ -((raw & 1) as i32)
}

#[inline]
#[must_use]
pub const fn zigzag_decode64(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

#[inline]
#[must_use]
pub const fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
#[must_use]
pub const fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn write_var_u64(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn write_var_u32(buf: &mut Vec<u8>, value: u32) {
    write_var_u64(buf, u64::from(value));
}

pub fn write_var_i32(buf: &mut Vec<u8>, value: i32) {
    write_var_u32(buf, zigzag_encode32(value));
}

pub fn write_var_i64(buf: &mut Vec<u8>, value: i64) {
    write_var_u64(buf, zigzag_encode64(value));
}

/// Encoded length of `value` as an unsigned varint.
#[must_use]
pub const fn var_u64_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 { 1 } else { bits.div_ceil(7) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_single_byte() {
        assert_eq!(
            scan(&[0x7F], MAX_VARINT_LEN, ContinuationOrder::default()),
            Scan::Complete { value: 127, len: 1 }
        );
    }

    #[test]
    fn test_scan_two_bytes() {
        assert_eq!(
            scan(&[0x80, 0x01], MAX_VARINT_LEN, ContinuationOrder::default()),
            Scan::Complete { value: 128, len: 2 }
        );
    }

    #[test]
    fn test_scan_most_significant_first() {
        // 0x81 0x00 => (1 << 7) | 0
        assert_eq!(
            scan(
                &[0x81, 0x00],
                MAX_VARINT_LEN,
                ContinuationOrder::MostSignificantFirst
            ),
            Scan::Complete { value: 128, len: 2 }
        );
    }

    #[test]
    fn test_scan_truncated() {
        assert_eq!(
            scan(&[0x80, 0x80], MAX_VARINT_LEN, ContinuationOrder::default()),
            Scan::Truncated
        );
    }

    #[test]
    fn test_scan_too_long() {
        let bytes = [0xFF; 6];
        assert_eq!(
            scan(&bytes, MAX_VARINT_LEN, ContinuationOrder::default()),
            Scan::TooLong
        );
        // Exactly five continuation bytes is already malformed.
        assert_eq!(
            scan(&bytes[..5], MAX_VARINT_LEN, ContinuationOrder::default()),
            Scan::TooLong
        );
    }

    fn push_all(bytes: &[u8]) -> VarIntStep {
        let mut decoder = VarU32Decoder::default();
        let mut step = VarIntStep::NeedMore;
        for &b in bytes {
            step = decoder.push(b);
            if step != VarIntStep::NeedMore {
                break;
            }
        }
        step
    }

    #[test]
    fn test_stream_decoder() {
        assert_eq!(push_all(&[0x96, 0x01]), VarIntStep::Done(150));
        assert_eq!(push_all(&[0x80, 0x80]), VarIntStep::NeedMore);

        let mut max = Vec::new();
        write_var_u32(&mut max, u32::MAX);
        assert_eq!(max[4], 0x0F);
        assert_eq!(push_all(&max), VarIntStep::Done(u32::MAX));
    }

    #[test]
    fn test_stream_decoder_rejects_wide_fifth_byte() {
        assert_eq!(push_all(&[0xFF, 0xFF, 0xFF, 0xFF, 0x10]), VarIntStep::Malformed);
        assert_eq!(push_all(&[0x80, 0x80, 0x80, 0x80, 0x80]), VarIntStep::Malformed);
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode32(0), 0);
        assert_eq!(zigzag_encode32(-1), 1);
        assert_eq!(zigzag_encode32(1), 2);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_decode32(u32::MAX), i32::MIN);
        assert_eq!(zigzag_decode64(zigzag_encode64(i64::MIN)), i64::MIN);
    }

    #[test]
    fn test_var_len() {
        assert_eq!(var_u64_len(0), 1);
        assert_eq!(var_u64_len(127), 1);
        assert_eq!(var_u64_len(128), 2);
        assert_eq!(var_u64_len(u64::MAX), MAX_VARLONG_LEN);
    }
}
