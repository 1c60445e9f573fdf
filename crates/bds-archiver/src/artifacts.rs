//! Content tables rendered from the first decoded instance of a packet.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use bds_packets::{
    FieldSet, Report,
    ids::{
        AVAILABLE_ACTOR_IDENTIFIERS_ID, AVAILABLE_COMMANDS_ID, BIOME_DEFINITION_LIST_ID,
        CRAFTING_DATA_ID, CREATIVE_CONTENT_ID, ITEM_REGISTRY_ID, START_GAME_ID,
    },
};
use bds_protocol::{NbtCompound, NbtFlavor, NetworkNbt};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::Result;

#[derive(Debug, Serialize)]
struct ItemSummary<'a> {
    name: &'a str,
    id: i16,
    component_based: bool,
}

fn write_json(dir: &Path, file: &str, value: &impl Serialize) -> Result<PathBuf> {
    let path = dir.join(file);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(path)
}

fn write_nbt(dir: &Path, file: &str, nbt: &NetworkNbt) -> Result<Option<PathBuf>> {
    let Some(compound) = &nbt.0 else {
        debug!("{} skipped, document is empty", file);
        return Ok(None);
    };
    let path = dir.join(file);
    std::fs::write(&path, compound.to_bytes(NbtFlavor::LittleEndian))?;
    Ok(Some(path))
}

/// Item list from ItemRegistry, else from StartGame.
fn items(report: &Report) -> Option<Vec<ItemSummary<'_>>> {
    if let Some(FieldSet::ItemRegistry(registry)) = report.fields(ITEM_REGISTRY_ID) {
        return Some(
            registry
                .items
                .iter()
                .map(|i| ItemSummary {
                    name: &i.name,
                    id: i.id,
                    component_based: i.component_based,
                })
                .collect(),
        );
    }
    match report.fields(START_GAME_ID) {
        Some(FieldSet::StartGame(start)) if !start.items.is_empty() => Some(
            start
                .items
                .iter()
                .map(|i| ItemSummary {
                    name: &i.name,
                    id: i.id,
                    component_based: i.component_based,
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Component documents by item name.
fn item_components(report: &Report) -> Option<IndexMap<&str, &NbtCompound>> {
    let Some(FieldSet::ItemRegistry(registry)) = report.fields(ITEM_REGISTRY_ID) else {
        return None;
    };
    Some(
        registry
            .items
            .iter()
            .filter_map(|i| i.components.0.as_ref().map(|c| (i.name.as_str(), c)))
            .collect(),
    )
}

fn json_artifacts(report: &Report, dir: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
    if let Some(FieldSet::AvailableCommands(commands)) = report.fields(AVAILABLE_COMMANDS_ID) {
        written.push(write_json(dir, "commands.json", commands)?);
    }
    if let Some(items) = items(report) {
        written.push(write_json(dir, "items.json", &items)?);
    }
    if let Some(FieldSet::CreativeContent(creative)) = report.fields(CREATIVE_CONTENT_ID) {
        written.push(write_json(dir, "creative_content.json", &creative.items)?);
    }
    if let Some(FieldSet::CraftingData(crafting)) = report.fields(CRAFTING_DATA_ID) {
        written.push(write_json(dir, "crafting_data.json", crafting)?);
    }
    if let Some(components) = item_components(report) {
        written.push(write_json(dir, "item_components.json", &components)?);
    }
    Ok(())
}

fn nbt_artifacts(report: &Report, dir: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
    if let Some(FieldSet::BiomeDefinitionList(biomes)) = report.fields(BIOME_DEFINITION_LIST_ID) {
        written.extend(write_nbt(dir, "biome_definitions.nbt", &biomes.definitions)?);
    }
    if let Some(FieldSet::AvailableActorIdentifiers(actors)) =
        report.fields(AVAILABLE_ACTOR_IDENTIFIERS_ID)
    {
        written.extend(write_nbt(dir, "entity_identifiers.nbt", &actors.identifiers)?);
    }
    Ok(())
}

/// Write every artifact the report has data for. Returns the paths written.
pub fn write_artifacts(report: &Report, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    json_artifacts(report, dir, &mut written)?;
    nbt_artifacts(report, dir, &mut written)?;
    info!("Wrote {} artifacts to {}", written.len(), dir.display());
    Ok(written)
}
