//! NBT (Named Binary Tag) documents.
//!
//! Bedrock uses three encodings of the same tag tree:
//!
//! - [`NbtFlavor::BigEndian`]: the Java layout, fixed-width big-endian numbers
//!   with `u16` string lengths.
//! - [`NbtFlavor::LittleEndian`]: the same layout in little-endian. Used on
//!   disk and for the block palette.
//! - [`NbtFlavor::Network`]: little-endian, except ints, longs and every
//!   list/array length are zig-zag varints and string lengths are unsigned
//!   varints. Used inside game packets.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::varint::{write_var_i32, write_var_i64, write_var_u32};

mod read;

pub use read::{MAX_DEPTH, NbtError, read_compound_body, read_root};

/// NBT tag type IDs
pub mod tag {
    pub const END: u8 = 0;
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const BYTE_ARRAY: u8 = 7;
    pub const STRING: u8 = 8;
    pub const LIST: u8 = 9;
    pub const COMPOUND: u8 = 10;
    pub const INT_ARRAY: u8 = 11;
    pub const LONG_ARRAY: u8 = 12;
}

/// Byte layout of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NbtFlavor {
    BigEndian,
    #[default]
    LittleEndian,
    Network,
}

/// An NBT value
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// An NBT list (all elements must be same type)
#[derive(Debug, Clone, PartialEq)]
pub enum NbtList {
    Empty,
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<Vec<i8>>),
    String(Vec<String>),
    List(Vec<NbtList>),
    Compound(Vec<NbtCompound>),
    IntArray(Vec<Vec<i32>>),
    LongArray(Vec<Vec<i64>>),
}

/// An NBT compound. Entries keep insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NbtCompound {
    entries: Vec<(String, NbtValue)>,
}

impl NbtCompound {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. Keys are not deduplicated.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NbtValue>) {
        self.entries.push((key.into(), value.into()));
    }

    #[must_use]
    pub fn from_entries(entries: Vec<(String, NbtValue)>) -> Self {
        Self { entries }
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        self.entries
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorder entries by key, byte-wise. Stable for duplicate keys.
    pub fn sort_keys(&mut self) {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    /// Encode as a root compound with an empty name.
    #[must_use]
    pub fn to_bytes(&self, flavor: NbtFlavor) -> Vec<u8> {
        self.to_named_bytes("", flavor)
    }

    /// Encode as a root compound named `name`.
    #[must_use]
    pub fn to_named_bytes(&self, name: &str, flavor: NbtFlavor) -> Vec<u8> {
        let mut out = Writer {
            buf: Vec::new(),
            flavor,
        };
        out.buf.push(tag::COMPOUND);
        out.string(name);
        out.compound(self);
        out.buf
    }
}

impl NbtValue {
    /// Get the type ID for this value
    #[must_use]
    pub const fn type_id(&self) -> u8 {
        match self {
            Self::Byte(_) => tag::BYTE,
            Self::Short(_) => tag::SHORT,
            Self::Int(_) => tag::INT,
            Self::Long(_) => tag::LONG,
            Self::Float(_) => tag::FLOAT,
            Self::Double(_) => tag::DOUBLE,
            Self::ByteArray(_) => tag::BYTE_ARRAY,
            Self::String(_) => tag::STRING,
            Self::List(_) => tag::LIST,
            Self::Compound(_) => tag::COMPOUND,
            Self::IntArray(_) => tag::INT_ARRAY,
            Self::LongArray(_) => tag::LONG_ARRAY,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&NbtList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Integer payloads widened to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v.into()),
            Self::Short(v) => Some(v.into()),
            Self::Int(v) => Some(v.into()),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }
}

impl NbtList {
    /// Get the element type ID
    #[must_use]
    pub const fn element_type_id(&self) -> u8 {
        match self {
            Self::Empty => tag::END,
            Self::Byte(_) => tag::BYTE,
            Self::Short(_) => tag::SHORT,
            Self::Int(_) => tag::INT,
            Self::Long(_) => tag::LONG,
            Self::Float(_) => tag::FLOAT,
            Self::Double(_) => tag::DOUBLE,
            Self::ByteArray(_) => tag::BYTE_ARRAY,
            Self::String(_) => tag::STRING,
            Self::List(_) => tag::LIST,
            Self::Compound(_) => tag::COMPOUND,
            Self::IntArray(_) => tag::INT_ARRAY,
            Self::LongArray(_) => tag::LONG_ARRAY,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::ByteArray(v) => v.len(),
            Self::String(v) => v.len(),
            Self::List(v) => v.len(),
            Self::Compound(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::LongArray(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn compounds(&self) -> &[NbtCompound] {
        match self {
            Self::Compound(v) => v,
            _ => &[],
        }
    }
}

/// Infallible encoder into a growable buffer.
struct Writer {
    buf: Vec<u8>,
    flavor: NbtFlavor,
}

impl Writer {
    fn fixed<const N: usize>(&mut self, write: impl FnOnce(&mut [u8])) {
        let mut bytes = [0u8; N];
        write(&mut bytes);
        self.buf.extend_from_slice(&bytes);
    }

    fn i16(&mut self, v: i16) {
        match self.flavor {
            NbtFlavor::BigEndian => self.fixed::<2>(|b| BigEndian::write_i16(b, v)),
            NbtFlavor::LittleEndian | NbtFlavor::Network => {
                self.fixed::<2>(|b| LittleEndian::write_i16(b, v));
            }
        }
    }

    fn i32(&mut self, v: i32) {
        match self.flavor {
            NbtFlavor::BigEndian => self.fixed::<4>(|b| BigEndian::write_i32(b, v)),
            NbtFlavor::LittleEndian => self.fixed::<4>(|b| LittleEndian::write_i32(b, v)),
            NbtFlavor::Network => write_var_i32(&mut self.buf, v),
        }
    }

    fn i64(&mut self, v: i64) {
        match self.flavor {
            NbtFlavor::BigEndian => self.fixed::<8>(|b| BigEndian::write_i64(b, v)),
            NbtFlavor::LittleEndian => self.fixed::<8>(|b| LittleEndian::write_i64(b, v)),
            NbtFlavor::Network => write_var_i64(&mut self.buf, v),
        }
    }

    fn f32(&mut self, v: f32) {
        match self.flavor {
            NbtFlavor::BigEndian => self.fixed::<4>(|b| BigEndian::write_f32(b, v)),
            NbtFlavor::LittleEndian | NbtFlavor::Network => {
                self.fixed::<4>(|b| LittleEndian::write_f32(b, v));
            }
        }
    }

    fn f64(&mut self, v: f64) {
        match self.flavor {
            NbtFlavor::BigEndian => self.fixed::<8>(|b| BigEndian::write_f64(b, v)),
            NbtFlavor::LittleEndian | NbtFlavor::Network => {
                self.fixed::<8>(|b| LittleEndian::write_f64(b, v));
            }
        }
    }

    /// List and array lengths share the int encoding.
    fn len(&mut self, len: usize) {
        self.i32(len as i32);
    }

    fn string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        match self.flavor {
            NbtFlavor::BigEndian => {
                self.fixed::<2>(|b| BigEndian::write_u16(b, bytes.len() as u16));
            }
            NbtFlavor::LittleEndian => {
                self.fixed::<2>(|b| LittleEndian::write_u16(b, bytes.len() as u16));
            }
            NbtFlavor::Network => write_var_u32(&mut self.buf, bytes.len() as u32),
        }
        self.buf.extend_from_slice(bytes);
    }

    fn compound(&mut self, compound: &NbtCompound) {
        for (name, value) in &compound.entries {
            self.buf.push(value.type_id());
            self.string(name);
            self.value(value);
        }
        self.buf.push(tag::END);
    }

    fn value(&mut self, value: &NbtValue) {
        match value {
            NbtValue::Byte(v) => self.buf.push(*v as u8),
            NbtValue::Short(v) => self.i16(*v),
            NbtValue::Int(v) => self.i32(*v),
            NbtValue::Long(v) => self.i64(*v),
            NbtValue::Float(v) => self.f32(*v),
            NbtValue::Double(v) => self.f64(*v),
            NbtValue::ByteArray(v) => self.byte_array(v),
            NbtValue::String(v) => self.string(v),
            NbtValue::List(list) => self.list(list),
            NbtValue::Compound(compound) => self.compound(compound),
            NbtValue::IntArray(v) => self.int_array(v),
            NbtValue::LongArray(v) => self.long_array(v),
        }
    }

    fn byte_array(&mut self, v: &[i8]) {
        self.len(v.len());
        self.buf.extend(v.iter().map(|b| *b as u8));
    }

    fn int_array(&mut self, v: &[i32]) {
        self.len(v.len());
        v.iter().for_each(|i| self.i32(*i));
    }

    fn long_array(&mut self, v: &[i64]) {
        self.len(v.len());
        v.iter().for_each(|l| self.i64(*l));
    }

    fn list(&mut self, list: &NbtList) {
        self.buf.push(list.element_type_id());
        self.len(list.len());

        match list {
            NbtList::Empty => {}
            NbtList::Byte(v) => self.buf.extend(v.iter().map(|b| *b as u8)),
            NbtList::Short(v) => v.iter().for_each(|s| self.i16(*s)),
            NbtList::Int(v) => v.iter().for_each(|i| self.i32(*i)),
            NbtList::Long(v) => v.iter().for_each(|l| self.i64(*l)),
            NbtList::Float(v) => v.iter().for_each(|f| self.f32(*f)),
            NbtList::Double(v) => v.iter().for_each(|d| self.f64(*d)),
            NbtList::ByteArray(v) => v.iter().for_each(|a| self.byte_array(a)),
            NbtList::String(v) => v.iter().for_each(|s| self.string(s)),
            NbtList::List(v) => v.iter().for_each(|l| self.list(l)),
            NbtList::Compound(v) => v.iter().for_each(|c| self.compound(c)),
            NbtList::IntArray(v) => v.iter().for_each(|a| self.int_array(a)),
            NbtList::LongArray(v) => v.iter().for_each(|a| self.long_array(a)),
        }
    }
}

impl Serialize for NbtCompound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for NbtValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Byte(v) => serializer.serialize_i8(*v),
            Self::Short(v) => serializer.serialize_i16(*v),
            Self::Int(v) => serializer.serialize_i32(*v),
            Self::Long(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f32(*v),
            Self::Double(v) => serializer.serialize_f64(*v),
            Self::ByteArray(v) => v.serialize(serializer),
            Self::String(v) => serializer.serialize_str(v),
            Self::List(v) => v.serialize(serializer),
            Self::Compound(v) => v.serialize(serializer),
            Self::IntArray(v) => v.serialize(serializer),
            Self::LongArray(v) => v.serialize(serializer),
        }
    }
}

impl Serialize for NbtList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.collect_seq(std::iter::empty::<()>()),
            Self::Byte(v) => v.serialize(serializer),
            Self::Short(v) => v.serialize(serializer),
            Self::Int(v) => v.serialize(serializer),
            Self::Long(v) => v.serialize(serializer),
            Self::Float(v) => v.serialize(serializer),
            Self::Double(v) => v.serialize(serializer),
            Self::ByteArray(v) => v.serialize(serializer),
            Self::String(v) => v.serialize(serializer),
            Self::List(v) => v.serialize(serializer),
            Self::Compound(v) => v.serialize(serializer),
            Self::IntArray(v) => v.serialize(serializer),
            Self::LongArray(v) => v.serialize(serializer),
        }
    }
}

// Convenient From implementations
impl From<bool> for NbtValue {
    fn from(v: bool) -> Self {
        Self::Byte(i8::from(v))
    }
}

impl From<i8> for NbtValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for NbtValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for NbtValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for NbtValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for NbtValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for NbtValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for NbtValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for NbtValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NbtCompound> for NbtValue {
    fn from(v: NbtCompound) -> Self {
        Self::Compound(v)
    }
}

impl From<NbtList> for NbtValue {
    fn from(v: NbtList) -> Self {
        Self::List(v)
    }
}

impl From<Vec<NbtCompound>> for NbtList {
    fn from(v: Vec<NbtCompound>) -> Self {
        if v.is_empty() { Self::Empty } else { Self::Compound(v) }
    }
}

/// Macro for building NBT compounds ergonomically
///
/// # Example
/// ```
/// use bds_protocol::nbt;
///
/// let compound = nbt! {
///     "name" => "minecraft:stone",
///     "version" => 18_100_737i32,
///     "states" => nbt! {
///         "stone_type" => "granite",
///     },
/// };
/// assert_eq!(compound.len(), 3);
/// ```
#[macro_export]
macro_rules! nbt {
    // Empty compound
    () => {
        $crate::nbt::NbtCompound::new()
    };

    // Compound with entries
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut compound = $crate::nbt::NbtCompound::new();
        $(
            compound.insert($key, $value);
        )*
        compound
    }};
}
