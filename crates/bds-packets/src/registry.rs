//! Packet id -> decoder table.
//!
//! A [`SchemaEntry`] either points at a typed decoder (a struct implementing
//! [`Decode`]) or carries a flat list of scalar fields for shapes that are not
//! worth a struct. Either way the result is a [`FieldSet`].

use std::collections::BTreeMap;

use bds_protocol::{
    BlockPos, Cursor, Decode, Packet, Result, SignedBlockPos, Uuid, Vec3, varint::write_var_u32,
};
use byteorder::{BigEndian, LittleEndian};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    commands::AvailableCommands,
    ids::{self, display_name},
    play::{
        AvailableActorIdentifiers, BiomeDefinitionList, CameraPresets, CreativeContent,
        GameRulesChanged, ItemRegistry, LevelEventGeneric, MoveActorDelta,
        NetworkChunkPublisherUpdate, PlayerFog, PlayerList, SetActorData, StartGame,
        SyncActorProperty, TrimData, UpdateAbilities, UpdateAttributes,
    },
    recipe::CraftingData,
};

/// Level name most dedicated servers start with.
pub const DEFAULT_LEVEL_NAME: &str = "Bedrock level";

/// Per-session inputs some decoders need besides the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeContext {
    level_marker: Vec<u8>,
}

impl DecodeContext {
    /// StartGame carries the level id and the level name back to back, and
    /// both equal the level name on a fresh server.
    #[must_use]
    pub fn new(level_name: &str) -> Self {
        let mut one = Vec::with_capacity(level_name.len() + 1);
        write_var_u32(&mut one, level_name.len() as u32);
        one.extend_from_slice(level_name.as_bytes());
        Self {
            level_marker: one.repeat(2),
        }
    }

    #[must_use]
    pub fn level_marker(&self) -> &[u8] {
        &self.level_marker
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_NAME)
    }
}

/// Wire type of one field in a flat schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    Bool,
    U16,
    I16,
    I32,
    I32Be,
    U32,
    U64,
    F32,
    VarU32,
    VarI32,
    VarU64,
    VarI64,
    String,
    BlockPos,
    SignedBlockPos,
    Vec3,
    Uuid,
}

/// A decoded flat field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Unsigned(u64),
    Float(f32),
    String(String),
    BlockPos(BlockPos),
    SignedBlockPos(SignedBlockPos),
    Vec3(Vec3),
    Uuid(Uuid),
}

impl Scalar {
    pub fn read(self, cursor: &mut Cursor<'_>) -> Result<FieldValue> {
        Ok(match self {
            Self::U8 => FieldValue::Unsigned(cursor.read_u8()?.into()),
            Self::Bool => FieldValue::Bool(cursor.read_bool()?),
            Self::U16 => FieldValue::Unsigned(cursor.read_u16::<LittleEndian>()?.into()),
            Self::I16 => FieldValue::Int(cursor.read_i16::<LittleEndian>()?.into()),
            Self::I32 => FieldValue::Int(cursor.read_i32::<LittleEndian>()?.into()),
            Self::I32Be => FieldValue::Int(cursor.read_i32::<BigEndian>()?.into()),
            Self::U32 => FieldValue::Unsigned(cursor.read_u32::<LittleEndian>()?.into()),
            Self::U64 => FieldValue::Unsigned(cursor.read_u64::<LittleEndian>()?),
            Self::F32 => FieldValue::Float(cursor.read_f32::<LittleEndian>()?),
            Self::VarU32 => FieldValue::Unsigned(cursor.read_var_u32()?.into()),
            Self::VarI32 => FieldValue::Int(cursor.read_var_i32()?.into()),
            Self::VarU64 => FieldValue::Unsigned(cursor.read_var_u64()?),
            Self::VarI64 => FieldValue::Int(cursor.read_var_i64()?),
            Self::String => FieldValue::String(cursor.read_string()?),
            Self::BlockPos => FieldValue::BlockPos(BlockPos::decode(cursor)?),
            Self::SignedBlockPos => FieldValue::SignedBlockPos(SignedBlockPos::decode(cursor)?),
            Self::Vec3 => FieldValue::Vec3(Vec3::decode(cursor)?),
            Self::Uuid => FieldValue::Uuid(Uuid::decode(cursor)?),
        })
    }
}

/// Ordered name/value pairs, serialized as a JSON object in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldList(pub Vec<(&'static str, FieldValue)>);

impl FieldList {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

impl Serialize for FieldList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decoded fields of one packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldSet {
    Fields(FieldList),
    StartGame(Box<StartGame>),
    UpdateAttributes(Box<UpdateAttributes>),
    SetActorData(Box<SetActorData>),
    CraftingData(Box<CraftingData>),
    PlayerList(Box<PlayerList>),
    GameRulesChanged(Box<GameRulesChanged>),
    AvailableCommands(Box<AvailableCommands>),
    MoveActorDelta(Box<MoveActorDelta>),
    AvailableActorIdentifiers(Box<AvailableActorIdentifiers>),
    NetworkChunkPublisherUpdate(Box<NetworkChunkPublisherUpdate>),
    BiomeDefinitionList(Box<BiomeDefinitionList>),
    LevelEventGeneric(Box<LevelEventGeneric>),
    CreativeContent(Box<CreativeContent>),
    PlayerFog(Box<PlayerFog>),
    ItemRegistry(Box<ItemRegistry>),
    SyncActorProperty(Box<SyncActorProperty>),
    UpdateAbilities(Box<UpdateAbilities>),
    CameraPresets(Box<CameraPresets>),
    TrimData(Box<TrimData>),
}

/// Ties a typed packet to its id, name and [`FieldSet`] variant.
pub trait TypedPacket: Packet + Decode {
    fn into_fields(self) -> FieldSet;
}

macro_rules! typed_packets {
    ($($ty:ident => $id:path),* $(,)?) => {
        $(
            impl Packet for $ty {
                const ID: u16 = $id;
                const NAME: &'static str = display_name($id);
            }

            impl TypedPacket for $ty {
                fn into_fields(self) -> FieldSet {
                    FieldSet::$ty(Box::new(self))
                }
            }
        )*
    };
}

typed_packets! {
    StartGame => ids::START_GAME_ID,
    UpdateAttributes => ids::UPDATE_ATTRIBUTES_ID,
    SetActorData => ids::SET_ACTOR_DATA_ID,
    CraftingData => ids::CRAFTING_DATA_ID,
    PlayerList => ids::PLAYER_LIST_ID,
    GameRulesChanged => ids::GAME_RULES_CHANGED_ID,
    AvailableCommands => ids::AVAILABLE_COMMANDS_ID,
    MoveActorDelta => ids::MOVE_ACTOR_DELTA_ID,
    AvailableActorIdentifiers => ids::AVAILABLE_ACTOR_IDENTIFIERS_ID,
    NetworkChunkPublisherUpdate => ids::NETWORK_CHUNK_PUBLISHER_UPDATE_ID,
    BiomeDefinitionList => ids::BIOME_DEFINITION_LIST_ID,
    LevelEventGeneric => ids::LEVEL_EVENT_GENERIC_ID,
    CreativeContent => ids::CREATIVE_CONTENT_ID,
    PlayerFog => ids::PLAYER_FOG_ID,
    ItemRegistry => ids::ITEM_REGISTRY_ID,
    SyncActorProperty => ids::SYNC_ACTOR_PROPERTY_ID,
    UpdateAbilities => ids::UPDATE_ABILITIES_ID,
    CameraPresets => ids::CAMERA_PRESETS_ID,
    TrimData => ids::TRIM_DATA_ID,
}

impl Decode for StartGame {
    /// Resyncs on the default level name; use [`StartGame::decode_with`] for
    /// anything else.
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        Self::decode_with(cursor, &DecodeContext::default())
    }
}

pub type TypedDecoder = fn(&mut Cursor<'_>, &DecodeContext) -> Result<FieldSet>;

/// How a packet body is decoded.
#[derive(Clone, Copy)]
pub enum Decoder {
    Typed(TypedDecoder),
    Flat(&'static [(&'static str, Scalar)]),
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Typed(_) => f.write_str("Typed"),
            Self::Flat(fields) => f.debug_tuple("Flat").field(fields).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub name: &'static str,
    pub decoder: Decoder,
}

impl SchemaEntry {
    /// Decode a packet body. Does not check for leftover bytes.
    pub fn decode(&self, cursor: &mut Cursor<'_>, context: &DecodeContext) -> Result<FieldSet> {
        match self.decoder {
            Decoder::Typed(decode) => decode(cursor, context),
            Decoder::Flat(fields) => cursor.transaction(|c| {
                fields
                    .iter()
                    .map(|&(name, scalar)| scalar.read(c).map(|value| (name, value)))
                    .collect::<Result<Vec<_>>>()
                    .map(|list| FieldSet::Fields(FieldList(list)))
            }),
        }
    }
}

fn decode_typed<P: TypedPacket>(cursor: &mut Cursor<'_>, _: &DecodeContext) -> Result<FieldSet> {
    P::decode(cursor).map(TypedPacket::into_fields)
}

fn decode_start_game(cursor: &mut Cursor<'_>, context: &DecodeContext) -> Result<FieldSet> {
    StartGame::decode_with(cursor, context).map(TypedPacket::into_fields)
}

const PLAY_STATUS: &[(&str, Scalar)] = &[("status", Scalar::I32Be)];
const SET_TIME: &[(&str, Scalar)] = &[("time", Scalar::VarI32)];
const UPDATE_BLOCK: &[(&str, Scalar)] = &[
    ("position", Scalar::BlockPos),
    ("runtime_id", Scalar::VarU32),
    ("flags", Scalar::VarU32),
    ("layer", Scalar::VarU32),
];
const SET_SPAWN_POSITION: &[(&str, Scalar)] = &[
    ("spawn_type", Scalar::VarI32),
    ("position", Scalar::BlockPos),
    ("dimension", Scalar::VarI32),
    ("spawn_position", Scalar::BlockPos),
];
const SET_DIFFICULTY: &[(&str, Scalar)] = &[("difficulty", Scalar::VarU32)];
const CHUNK_RADIUS_UPDATED: &[(&str, Scalar)] = &[("radius", Scalar::VarI32)];
const NETWORK_SETTINGS: &[(&str, Scalar)] = &[
    ("compression_threshold", Scalar::U16),
    ("compression_algorithm", Scalar::U16),
    ("client_throttle", Scalar::Bool),
    ("client_throttle_threshold", Scalar::U8),
    ("client_throttle_scalar", Scalar::F32),
];

/// Every packet the dispatcher knows how to decode.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: BTreeMap<u16, SchemaEntry>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in schema.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register_flat(ids::PLAY_STATUS_ID, PLAY_STATUS);
        registry.register_flat(ids::SET_TIME_ID, SET_TIME);
        registry.register_flat(ids::UPDATE_BLOCK_ID, UPDATE_BLOCK);
        registry.register_flat(ids::SET_SPAWN_POSITION_ID, SET_SPAWN_POSITION);
        registry.register_flat(ids::SET_DIFFICULTY_ID, SET_DIFFICULTY);
        registry.register_flat(ids::CHUNK_RADIUS_UPDATED_ID, CHUNK_RADIUS_UPDATED);
        registry.register_flat(ids::NETWORK_SETTINGS_ID, NETWORK_SETTINGS);

        registry.register_with(
            StartGame::ID,
            SchemaEntry {
                name: StartGame::NAME,
                decoder: Decoder::Typed(decode_start_game),
            },
        );
        registry.register::<UpdateAttributes>();
        registry.register::<SetActorData>();
        registry.register::<CraftingData>();
        registry.register::<PlayerList>();
        registry.register::<GameRulesChanged>();
        registry.register::<AvailableCommands>();
        registry.register::<MoveActorDelta>();
        registry.register::<AvailableActorIdentifiers>();
        registry.register::<NetworkChunkPublisherUpdate>();
        registry.register::<BiomeDefinitionList>();
        registry.register::<LevelEventGeneric>();
        registry.register::<CreativeContent>();
        registry.register::<PlayerFog>();
        registry.register::<ItemRegistry>();
        registry.register::<SyncActorProperty>();
        registry.register::<UpdateAbilities>();
        registry.register::<CameraPresets>();
        registry.register::<TrimData>();

        registry
    }

    pub fn register<P: TypedPacket>(&mut self) {
        self.register_with(
            P::ID,
            SchemaEntry {
                name: P::NAME,
                decoder: Decoder::Typed(decode_typed::<P>),
            },
        );
    }

    pub fn register_flat(&mut self, id: u16, fields: &'static [(&'static str, Scalar)]) {
        self.register_with(
            id,
            SchemaEntry {
                name: display_name(id),
                decoder: Decoder::Flat(fields),
            },
        );
    }

    /// Replaces any schema already registered for `id`.
    pub fn register_with(&mut self, id: u16, entry: SchemaEntry) {
        self.entries.insert(id, entry);
    }

    #[must_use]
    pub fn get(&self, id: u16) -> Option<&SchemaEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: u16) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
