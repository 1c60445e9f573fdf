//! FNV hashes used for palette ordering and network ids.

const FNV1_64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1_64_PRIME: u64 = 0x0000_0100_0000_01b3;

const FNV1A_32_OFFSET: u32 = 0x811c_9dc5;
const FNV1A_32_PRIME: u32 = 0x0100_0193;

/// 64-bit FNV-1 (multiply, then xor). Only used as a sort key.
#[must_use]
pub fn fnv1_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV1_64_OFFSET, |hash, &b| {
        hash.wrapping_mul(FNV1_64_PRIME) ^ u64::from(b)
    })
}

/// 32-bit FNV-1a (xor, then multiply).
#[must_use]
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV1A_32_OFFSET, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV1A_32_PRIME)
    })
}
