//! Packet ids and their display names.
//!
//! Only ids with a schema get a constant; [`packet_name`] covers every id
//! commonly seen during a session so archives stay readable.

/// PlayStatus (ID: 2)
pub const PLAY_STATUS_ID: u16 = 0x02;
/// SetTime (ID: 10)
pub const SET_TIME_ID: u16 = 0x0A;
/// StartGame (ID: 11)
pub const START_GAME_ID: u16 = 0x0B;
/// UpdateBlock (ID: 21)
pub const UPDATE_BLOCK_ID: u16 = 0x15;
/// UpdateAttributes (ID: 29)
pub const UPDATE_ATTRIBUTES_ID: u16 = 0x1D;
/// SetActorData (ID: 39)
pub const SET_ACTOR_DATA_ID: u16 = 0x27;
/// SetSpawnPosition (ID: 43)
pub const SET_SPAWN_POSITION_ID: u16 = 0x2B;
/// CraftingData (ID: 52)
pub const CRAFTING_DATA_ID: u16 = 0x34;
/// LevelChunk (ID: 58)
pub const LEVEL_CHUNK_ID: u16 = 0x3A;
/// SetDifficulty (ID: 60)
pub const SET_DIFFICULTY_ID: u16 = 0x3C;
/// PlayerList (ID: 63)
pub const PLAYER_LIST_ID: u16 = 0x3F;
/// ChunkRadiusUpdated (ID: 70)
pub const CHUNK_RADIUS_UPDATED_ID: u16 = 0x46;
/// GameRulesChanged (ID: 72)
pub const GAME_RULES_CHANGED_ID: u16 = 0x48;
/// AvailableCommands (ID: 76)
pub const AVAILABLE_COMMANDS_ID: u16 = 0x4C;
/// MoveActorDelta (ID: 111)
pub const MOVE_ACTOR_DELTA_ID: u16 = 0x6F;
/// AvailableActorIdentifiers (ID: 119)
pub const AVAILABLE_ACTOR_IDENTIFIERS_ID: u16 = 0x77;
/// NetworkChunkPublisherUpdate (ID: 121)
pub const NETWORK_CHUNK_PUBLISHER_UPDATE_ID: u16 = 0x79;
/// BiomeDefinitionList (ID: 122)
pub const BIOME_DEFINITION_LIST_ID: u16 = 0x7A;
/// LevelEventGeneric (ID: 124)
pub const LEVEL_EVENT_GENERIC_ID: u16 = 0x7C;
/// NetworkSettings (ID: 143)
pub const NETWORK_SETTINGS_ID: u16 = 0x8F;
/// CreativeContent (ID: 145)
pub const CREATIVE_CONTENT_ID: u16 = 0x91;
/// PlayerFog (ID: 160)
pub const PLAYER_FOG_ID: u16 = 0xA0;
/// ItemRegistry (ID: 162)
pub const ITEM_REGISTRY_ID: u16 = 0xA2;
/// SyncActorProperty (ID: 165)
pub const SYNC_ACTOR_PROPERTY_ID: u16 = 0xA5;
/// UpdateAbilities (ID: 187)
pub const UPDATE_ABILITIES_ID: u16 = 0xBB;
/// CameraPresets (ID: 198)
pub const CAMERA_PRESETS_ID: u16 = 0xC6;
/// TrimData (ID: 302)
pub const TRIM_DATA_ID: u16 = 0x12E;

/// Name of a known packet id.
#[must_use]
pub const fn packet_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x01 => "Login",
        0x02 => "PlayStatus",
        0x03 => "ServerToClientHandshake",
        0x04 => "ClientToServerHandshake",
        0x05 => "Disconnect",
        0x06 => "ResourcePacksInfo",
        0x07 => "ResourcePackStack",
        0x08 => "ResourcePackClientResponse",
        0x09 => "Text",
        0x0A => "SetTime",
        0x0B => "StartGame",
        0x0C => "AddPlayer",
        0x0D => "AddActor",
        0x0E => "RemoveActor",
        0x0F => "AddItemActor",
        0x11 => "TakeItemActor",
        0x12 => "MoveActorAbsolute",
        0x13 => "MovePlayer",
        0x15 => "UpdateBlock",
        0x16 => "AddPainting",
        0x19 => "LevelEvent",
        0x1A => "BlockEvent",
        0x1B => "ActorEvent",
        0x1C => "MobEffect",
        0x1D => "UpdateAttributes",
        0x1E => "InventoryTransaction",
        0x1F => "MobEquipment",
        0x20 => "MobArmorEquipment",
        0x21 => "Interact",
        0x24 => "PlayerAction",
        0x27 => "SetActorData",
        0x28 => "SetActorMotion",
        0x29 => "SetActorLink",
        0x2A => "SetHealth",
        0x2B => "SetSpawnPosition",
        0x2C => "Animate",
        0x2D => "Respawn",
        0x2E => "ContainerOpen",
        0x2F => "ContainerClose",
        0x30 => "PlayerHotbar",
        0x31 => "InventoryContent",
        0x32 => "InventorySlot",
        0x33 => "ContainerSetData",
        0x34 => "CraftingData",
        0x38 => "BlockActorData",
        0x3A => "LevelChunk",
        0x3B => "SetCommandsEnabled",
        0x3C => "SetDifficulty",
        0x3D => "ChangeDimension",
        0x3E => "SetPlayerGameType",
        0x3F => "PlayerList",
        0x40 => "SimpleEvent",
        0x41 => "LegacyTelemetryEvent",
        0x43 => "ClientboundMapItemData",
        0x45 => "RequestChunkRadius",
        0x46 => "ChunkRadiusUpdated",
        0x48 => "GameRulesChanged",
        0x49 => "Camera",
        0x4A => "BossEvent",
        0x4C => "AvailableCommands",
        0x4D => "CommandRequest",
        0x4F => "CommandOutput",
        0x52 => "ResourcePackDataInfo",
        0x53 => "ResourcePackChunkData",
        0x56 => "PlaySound",
        0x57 => "StopSound",
        0x58 => "SetTitle",
        0x5D => "PlayerSkin",
        0x64 => "ModalFormRequest",
        0x65 => "ModalFormResponse",
        0x69 => "SetDefaultGameType",
        0x6B => "SetDisplayObjective",
        0x6C => "SetScore",
        0x6F => "MoveActorDelta",
        0x71 => "SetLocalPlayerAsInitialized",
        0x72 => "UpdateSoftEnum",
        0x73 => "NetworkStackLatency",
        0x76 => "SpawnParticleEffect",
        0x77 => "AvailableActorIdentifiers",
        0x79 => "NetworkChunkPublisherUpdate",
        0x7A => "BiomeDefinitionList",
        0x7B => "LevelSoundEvent",
        0x7C => "LevelEventGeneric",
        0x81 => "ClientCacheStatus",
        0x8A => "Emote",
        0x8F => "NetworkSettings",
        0x90 => "PlayerAuthInput",
        0x91 => "CreativeContent",
        0x92 => "PlayerEnchantOptions",
        0x93 => "ItemStackRequest",
        0x94 => "ItemStackResponse",
        0x98 => "EmoteList",
        0x9C => "PacketViolationWarning",
        0x9E => "AnimateEntity",
        0xA0 => "PlayerFog",
        0xA1 => "CorrectPlayerMovePrediction",
        0xA2 => "ItemRegistry",
        0xA5 => "SyncActorProperty",
        0xAC => "UpdateSubChunkBlocks",
        0xAE => "SubChunk",
        0xAF => "SubChunkRequest",
        0xB4 => "DimensionData",
        0xB8 => "RequestAbility",
        0xBB => "UpdateAbilities",
        0xBC => "UpdateAdventureSettings",
        0xBD => "DeathInfo",
        0xC1 => "RequestNetworkSettings",
        0xC4 => "UpdateClientInputLocks",
        0xC6 => "CameraPresets",
        0xC7 => "UnlockedRecipes",
        0x12C => "CameraInstruction",
        0x12D => "CompressedBiomeDefinitionList",
        0x12E => "TrimData",
        0x12F => "OpenSign",
        0x133 => "SetPlayerInventoryOptions",
        0x134 => "SetHud",
        0x136 => "ClientboundCloseForm",
        0x138 => "ServerboundLoadingScreen",
        0x139 => "JigsawStructureData",
        0x13A => "CurrentStructureFeature",
        0x13C => "CameraAimAssist",
        0x13D => "ContainerRegistryCleanup",
        0x13E => "MovementEffect",
        0x141 => "CameraAimAssistPresets",
        0x143 => "ClientMovementPredictionSync",
        _ => return None,
    })
}

/// Name used in archives and reports; unknown ids render as `Unknown`.
#[must_use]
pub const fn display_name(id: u16) -> &'static str {
    match packet_name(id) {
        Some(name) => name,
        None => "Unknown",
    }
}

/// File name for the raw archive of a frame.
#[must_use]
pub fn archive_file_name(sequence: u64, id: u16) -> String {
    format!("{sequence:05}_{id}_0x{id:03X}_{}.bin", display_name(id))
}
