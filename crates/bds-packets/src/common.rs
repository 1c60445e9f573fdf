//! Structures shared by several packet schemas.

use bds_protocol::{
    BlockPos, Cursor, Decode, NbtCompound, NbtFlavor, Result, VarI32, VarU32, Vec3,
};
use byteorder::LittleEndian;
use serde::Serialize;

/// An item slot. Id 0 is the empty slot and carries nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStack {
    pub id: u32,
    #[serde(flatten)]
    pub details: Option<ItemDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetails {
    pub stack_size: u16,
    pub aux_value: u32,
    pub block_hash: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<ItemUserData>,
}

impl ItemStack {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.details.is_none()
    }
}

impl Decode for ItemStack {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let id = c.read_var_u32()?;
            if id == 0 {
                return Ok(Self { id, details: None });
            }
            let stack_size = c.read_u16::<LittleEndian>()?;
            let aux_value = c.read_var_u32()?;
            let block_hash = c.read_var_i32()?;
            let user_data = ItemUserData::parse(c.read_byte_array()?);
            Ok(Self {
                id,
                details: Some(ItemDetails {
                    stack_size,
                    aux_value,
                    block_hash,
                    user_data,
                }),
            })
        })
    }
}

/// Extra data serialized inside an item stack.
///
/// The game client stops reading this blob at the first field it cannot
/// parse and keeps whatever it got so far. Parsing here does the same, and
/// records where it stopped in `stopped_early` instead of failing the stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ItemUserData {
    pub serialization_marker: Option<i16>,
    pub serialization_version: Option<u8>,
    pub compound_tag: Option<NbtCompound>,
    pub can_place_on: Option<Vec<String>>,
    pub can_destroy: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_early: Option<String>,
}

impl ItemUserData {
    /// `None` for an empty blob.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let mut data = Self::default();
        if let Err(err) = data.fill(&mut Cursor::new(bytes)) {
            data.stopped_early = Some(err.to_string());
        }
        Some(data)
    }

    fn fill(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        self.serialization_marker = Some(cursor.read_i16::<LittleEndian>()?);
        self.serialization_version = Some(cursor.read_u8()?);
        self.compound_tag = cursor.read_nbt(NbtFlavor::LittleEndian)?;
        self.can_place_on = Some(read_u32_strings(cursor)?);
        self.can_destroy = Some(read_u32_strings(cursor)?);
        Ok(())
    }
}

fn read_u32_strings(cursor: &mut Cursor<'_>) -> Result<Vec<String>> {
    cursor.read_array(Cursor::read_u32::<LittleEndian>, Cursor::read_string)
}

/// One entity metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataItem {
    pub id: u32,
    #[serde(flatten)]
    pub value: DataValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum DataValue {
    Byte(u8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    Compound(Option<NbtCompound>),
    BlockPos(BlockPos),
    Long(i64),
    Vec3(Vec3),
}

impl Decode for DataItem {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let id = c.read_var_u32()?;
            let value = match c.read_var_u32()? {
                0 => DataValue::Byte(c.read_u8()?),
                1 => DataValue::Short(c.read_i16::<LittleEndian>()?),
                2 => DataValue::Int(c.read_var_i32()?),
                3 => DataValue::Float(c.read_f32::<LittleEndian>()?),
                4 => DataValue::String(c.read_string()?),
                5 => DataValue::Compound(c.read_nbt(NbtFlavor::Network)?),
                6 => DataValue::BlockPos(BlockPos::decode(c)?),
                7 => DataValue::Long(c.read_var_i64()?),
                8 => DataValue::Vec3(Vec3::decode(c)?),
                other => return Err(c.unrecognized("data item type", other)),
            };
            Ok(Self { id, value })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct IntProperty {
    pub index: VarU32,
    pub value: VarI32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct FloatProperty {
    pub index: VarU32,
    pub value: f32,
}

/// Actor property values keyed by property index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Decode)]
pub struct PropertySyncData {
    pub ints: Vec<IntProperty>,
    pub floats: Vec<FloatProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct AttributeModifier {
    pub id: String,
    pub name: String,
    pub amount: f32,
    pub operation: i32,
    pub operand: i32,
    pub serializable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct Attribute {
    pub min: f32,
    pub max: f32,
    pub current: f32,
    pub default_min: f32,
    pub default_max: f32,
    pub default: f32,
    pub name: String,
    pub modifiers: Vec<AttributeModifier>,
}

#[cfg(test)]
mod tests {
    use bds_protocol::{ErrorKind, nbt, varint::write_var_u32};
    use pretty_assertions::assert_eq;

    use super::*;

    fn user_data_blob(tag: &NbtCompound) -> Vec<u8> {
        let mut blob = (-1i16).to_le_bytes().to_vec();
        blob.push(1);
        blob.extend(tag.to_bytes(NbtFlavor::LittleEndian));
        blob.extend_from_slice(&1u32.to_le_bytes());
        blob.extend_from_slice(&[5, b's', b't', b'o', b'n', b'e']);
        blob.extend_from_slice(&0u32.to_le_bytes());
        blob
    }

    #[test]
    fn test_empty_item_stack() {
        let mut cursor = Cursor::new(&[0x00]);
        let stack = ItemStack::decode(&mut cursor).unwrap();
        assert!(stack.is_empty());
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_item_stack_with_user_data() {
        let tag = nbt! { "Damage" => 3i32 };
        let blob = user_data_blob(&tag);
        let mut bytes = vec![0x05, 0x01, 0x00, 0x00, 0x02];
        write_var_u32(&mut bytes, blob.len() as u32);
        bytes.extend(&blob);

        let mut cursor = Cursor::new(&bytes);
        let stack = ItemStack::decode(&mut cursor).unwrap();
        cursor.finish().unwrap();

        let details = stack.details.unwrap();
        assert_eq!(details.stack_size, 1);
        assert_eq!(details.block_hash, 1);
        let user_data = details.user_data.unwrap();
        assert_eq!(user_data.serialization_marker, Some(-1));
        assert_eq!(user_data.compound_tag, Some(tag));
        assert_eq!(user_data.can_place_on, Some(vec!["stone".to_string()]));
        assert_eq!(user_data.can_destroy, Some(vec![]));
        assert_eq!(user_data.stopped_early, None);
    }

    #[test]
    fn test_truncated_user_data_keeps_prefix() {
        let data = ItemUserData::parse(&[0xFF, 0xFF, 0x01]).unwrap();
        assert_eq!(data.serialization_marker, Some(-1));
        assert_eq!(data.serialization_version, Some(1));
        assert_eq!(data.compound_tag, None);
        assert!(data.stopped_early.is_some());
    }

    #[test]
    fn test_data_item_types() {
        // id 4, type 7 (long), zig-zag -2
        let mut cursor = Cursor::new(&[0x04, 0x07, 0x03]);
        assert_eq!(
            DataItem::decode(&mut cursor).unwrap(),
            DataItem {
                id: 4,
                value: DataValue::Long(-2),
            }
        );
    }

    #[test]
    fn test_unknown_data_item_type() {
        let mut cursor = Cursor::new(&[0x04, 0x09, 0x00]);
        let err = DataItem::decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnrecognizedDiscriminant { value: 9, .. }
        ));
        assert_eq!(cursor.offset(), 0);
    }
}
