//! Clientbound packets seen while joining a world.
//!
//! Most shapes decode through `#[derive(Decode)]`. The ones with tagged
//! payloads, header-bit conditional fields or a resync step implement
//! `Decode` by hand.

use bds_protocol::{
    ChunkPos, Cursor, Decode, NbtCompound, NbtFlavor, NetworkNbt, Result, SignedBlockPos,
    U32Vec, Uuid, VarI32, VarU32, VarU64, Vec2, Vec3,
};
use byteorder::LittleEndian;
use serde::Serialize;

use crate::{
    common::{Attribute, DataItem, ItemStack, PropertySyncData},
    registry::DecodeContext,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct MovementSettings {
    pub authority_mode: VarI32,
    pub rewind_history_size: VarI32,
    pub server_authoritative_block_breaking: bool,
}

/// A custom block definition.
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct BlockProperty {
    pub name: String,
    pub definition: NetworkNbt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct ItemEntry {
    pub name: String,
    pub id: i16,
    pub component_based: bool,
}

/// Fields newer servers append after the item list.
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct StartGameTrailer {
    pub multiplayer_correlation_id: String,
    pub server_authoritative_inventory: bool,
    pub server_engine: String,
    pub player_property_data: NetworkNbt,
    pub block_registry_checksum: u64,
    pub world_template_id: Uuid,
    pub client_side_generation: bool,
    pub block_network_ids_are_hashes: bool,
    pub server_authoritative_sound: bool,
}

/// StartGame (ID: 11)
///
/// Everything before the level id / level name pair is skipped by resyncing
/// on that pair; `skipped` records how many bytes that was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartGame {
    pub skipped: usize,
    pub template_content_identity: String,
    pub is_trial: bool,
    pub movement: MovementSettings,
    pub current_level_time: u64,
    pub enchantment_seed: VarI32,
    pub block_properties: Vec<BlockProperty>,
    pub items: Vec<ItemEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<StartGameTrailer>,
}

impl StartGame {
    pub fn decode_with(cursor: &mut Cursor<'_>, context: &DecodeContext) -> Result<Self> {
        cursor.transaction(|c| {
            let skipped = c.resync_after(context.level_marker())?;
            Ok(Self {
                skipped,
                template_content_identity: c.read_string()?,
                is_trial: c.read_bool()?,
                movement: MovementSettings::decode(c)?,
                current_level_time: c.read_u64::<LittleEndian>()?,
                enchantment_seed: VarI32::decode(c)?,
                block_properties: Vec::decode(c)?,
                items: Vec::decode(c)?,
                trailer: if c.is_empty() {
                    None
                } else {
                    Some(StartGameTrailer::decode(c)?)
                },
            })
        })
    }
}

/// UpdateAttributes (ID: 29)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct UpdateAttributes {
    pub runtime_id: VarU64,
    pub attributes: Vec<Attribute>,
    pub tick: VarU64,
}

/// SetActorData (ID: 39)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct SetActorData {
    pub runtime_id: VarU64,
    pub metadata: Vec<DataItem>,
    pub properties: PropertySyncData,
    pub tick: VarU64,
}

/// Skin animation frame strip.
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct AnimatedImage {
    pub width: u32,
    pub height: u32,
    pub image: String,
    pub animation_type: u32,
    pub frame_count: f32,
    pub expression: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct PersonaPiece {
    pub piece_id: String,
    pub piece_type: String,
    pub pack_id: String,
    pub is_default: bool,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct TintColor {
    pub tint_type: String,
    pub colors: U32Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct SerializedSkin {
    pub skin_id: String,
    pub play_fab_id: String,
    pub resource_patch: String,
    pub image_width: u32,
    pub image_height: u32,
    pub image: String,
    pub animations: U32Vec<AnimatedImage>,
    pub cape_width: u32,
    pub cape_height: u32,
    pub cape_image: String,
    pub geometry_data: String,
    pub geometry_engine_version: String,
    pub animation_data: String,
    pub cape_id: String,
    pub full_id: String,
    pub arm_size: String,
    pub skin_color: String,
    pub persona_pieces: U32Vec<PersonaPiece>,
    pub tint_colors: U32Vec<TintColor>,
    pub premium: bool,
    pub persona: bool,
    pub persona_cape_on_classic: bool,
    pub primary_user: bool,
    pub overrides_player_appearance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct PlayerListEntry {
    pub uuid: Uuid,
    pub unique_id: VarU64,
    pub name: String,
    pub xuid: String,
    pub platform_chat_id: String,
    pub build_platform: i32,
    pub skin: SerializedSkin,
    pub is_teacher: bool,
    pub is_host: bool,
    pub is_sub_client: bool,
}

/// PlayerList (ID: 63)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum PlayerList {
    Add {
        entries: Vec<PlayerListEntry>,
        trusted_skins: bool,
    },
    Remove {
        uuids: Vec<Uuid>,
    },
}

impl Decode for PlayerList {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(match c.read_u8()? {
                0 => Self::Add {
                    entries: Vec::decode(c)?,
                    trusted_skins: c.read_bool()?,
                },
                1 => Self::Remove {
                    uuids: Vec::decode(c)?,
                },
                other => return Err(c.unrecognized("player list action", other)),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameRuleValue {
    Bool(bool),
    Int(u32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRule {
    pub name: String,
    pub editable: bool,
    pub value: GameRuleValue,
}

impl Decode for GameRule {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let name = c.read_string()?;
            let editable = c.read_bool()?;
            let value = match c.read_var_u32()? {
                1 => GameRuleValue::Bool(c.read_bool()?),
                2 => GameRuleValue::Int(c.read_var_u32()?),
                3 => GameRuleValue::Float(c.read_f32::<LittleEndian>()?),
                other => return Err(c.unrecognized("game rule type", other)),
            };
            Ok(Self {
                name,
                editable,
                value,
            })
        })
    }
}

/// GameRulesChanged (ID: 72)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct GameRulesChanged {
    pub rules: Vec<GameRule>,
}

const HAS_X: u16 = 1 << 0;
const HAS_Y: u16 = 1 << 1;
const HAS_Z: u16 = 1 << 2;
const HAS_ROT_X: u16 = 1 << 3;
const HAS_ROT_Y: u16 = 1 << 4;
const HAS_ROT_Y_HEAD: u16 = 1 << 5;
const ON_GROUND: u16 = 1 << 6;
const TELEPORT: u16 = 1 << 7;
const FORCE_MOVE: u16 = 1 << 8;

/// MoveActorDelta (ID: 111)
///
/// Each of the low six header bits gates one field; the rest are flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveActorDelta {
    pub runtime_id: u64,
    pub header: u16,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub rot_x: Option<u8>,
    pub rot_y: Option<u8>,
    pub rot_y_head: Option<u8>,
}

impl MoveActorDelta {
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.header & ON_GROUND != 0
    }

    #[must_use]
    pub const fn teleport(&self) -> bool {
        self.header & TELEPORT != 0
    }

    #[must_use]
    pub const fn force_move(&self) -> bool {
        self.header & FORCE_MOVE != 0
    }
}

fn read_if<'a, T>(
    c: &mut Cursor<'a>,
    header: u16,
    bit: u16,
    read: impl FnOnce(&mut Cursor<'a>) -> Result<T>,
) -> Result<Option<T>> {
    if header & bit == 0 { Ok(None) } else { read(c).map(Some) }
}

impl Decode for MoveActorDelta {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let runtime_id = c.read_var_u64()?;
            let header = c.read_u16::<LittleEndian>()?;
            let float = Cursor::read_f32::<LittleEndian>;
            Ok(Self {
                runtime_id,
                header,
                x: read_if(c, header, HAS_X, float)?,
                y: read_if(c, header, HAS_Y, float)?,
                z: read_if(c, header, HAS_Z, float)?,
                rot_x: read_if(c, header, HAS_ROT_X, Cursor::read_u8)?,
                rot_y: read_if(c, header, HAS_ROT_Y, Cursor::read_u8)?,
                rot_y_head: read_if(c, header, HAS_ROT_Y_HEAD, Cursor::read_u8)?,
            })
        })
    }
}

/// AvailableActorIdentifiers (ID: 119)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct AvailableActorIdentifiers {
    pub identifiers: NetworkNbt,
}

/// NetworkChunkPublisherUpdate (ID: 121)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct NetworkChunkPublisherUpdate {
    pub position: SignedBlockPos,
    pub radius: VarU32,
    pub saved_chunks: U32Vec<ChunkPos>,
}

/// BiomeDefinitionList (ID: 122)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct BiomeDefinitionList {
    pub definitions: NetworkNbt,
}

/// LevelEventGeneric (ID: 124)
///
/// The event data is a compound body with no root tag or name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelEventGeneric {
    pub event_id: VarI32,
    pub data: NbtCompound,
}

impl Decode for LevelEventGeneric {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(Self {
                event_id: VarI32::decode(c)?,
                data: c.read_rootless_compound(NbtFlavor::Network)?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct CreativeItem {
    pub net_id: VarU32,
    pub item: ItemStack,
}

/// CreativeContent (ID: 145)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct CreativeContent {
    pub items: Vec<CreativeItem>,
}

/// PlayerFog (ID: 160)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct PlayerFog {
    pub stack: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct ItemRegistryEntry {
    pub name: String,
    pub id: i16,
    pub component_based: bool,
    pub version: VarI32,
    pub components: NetworkNbt,
}

/// ItemRegistry (ID: 162)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct ItemRegistry {
    pub items: Vec<ItemRegistryEntry>,
}

/// SyncActorProperty (ID: 165)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct SyncActorProperty {
    pub properties: NetworkNbt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct AbilityLayer {
    pub layer: u16,
    pub abilities_set: u32,
    pub ability_values: u32,
    pub fly_speed: f32,
    pub walk_speed: f32,
}

/// UpdateAbilities (ID: 187)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateAbilities {
    pub unique_id: i64,
    pub player_permissions: u8,
    pub command_permissions: u8,
    pub layers: Vec<AbilityLayer>,
}

impl Decode for UpdateAbilities {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(Self {
                unique_id: c.read_i64::<LittleEndian>()?,
                player_permissions: c.read_u8()?,
                command_permissions: c.read_u8()?,
                // u8 layer count
                layers: c.read_array(Cursor::read_u8, AbilityLayer::decode)?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct CameraPreset {
    pub name: String,
    pub inherit_from: String,
    pub pos_x: Option<f32>,
    pub pos_y: Option<f32>,
    pub pos_z: Option<f32>,
    pub rot_x: Option<f32>,
    pub rot_y: Option<f32>,
    pub rotation_speed: Option<f32>,
    pub snap_to_target: Option<bool>,
    pub horizontal_rotation_limit: Option<Vec2>,
    pub vertical_rotation_limit: Option<Vec2>,
    pub continue_targeting: Option<bool>,
    pub view_offset: Option<Vec2>,
    pub entity_offset: Option<Vec3>,
    pub radius: Option<f32>,
    pub audio_listener: Option<u8>,
    pub player_effects: Option<bool>,
    pub align_target_and_camera_forward: Option<bool>,
    pub trailing: Option<u8>,
}

/// CameraPresets (ID: 198)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct CameraPresets {
    pub presets: Vec<CameraPreset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct TrimPattern {
    pub item_name: String,
    pub pattern_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct TrimMaterial {
    pub material_id: String,
    pub color: String,
    pub item_name: String,
}

/// TrimData (ID: 302)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct TrimData {
    pub patterns: Vec<TrimPattern>,
    pub materials: Vec<TrimMaterial>,
}
