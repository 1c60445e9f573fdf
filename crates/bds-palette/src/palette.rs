//! Hash-addressed block palette.

use bds_protocol::{NbtCompound, NbtFlavor, NbtList, NbtValue};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    canonical::BlockVariant,
    enumerate::Permutations,
    harvest::StateValue,
    hash::{fnv1_64, fnv1a_32},
};

/// One block state: a block id and one value per canonical dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub name: String,
    /// Sort key only.
    pub name_hash: u64,
    pub network_id: i32,
    /// Keys sorted byte-wise.
    pub states: NbtCompound,
}

impl PaletteEntry {
    /// Sorts `states` and derives both hashes.
    #[must_use]
    pub fn new(name: &str, states: NbtCompound) -> Self {
        Self::with_name_hash(name, fnv1_64(name.as_bytes()), states)
    }

    fn with_name_hash(name: &str, name_hash: u64, mut states: NbtCompound) -> Self {
        states.sort_keys();
        Self {
            network_id: network_id(name, &states),
            name: name.to_owned(),
            name_hash,
            states,
        }
    }

    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let mut entry = NbtCompound::new();
        entry.insert("name", self.name.as_str());
        entry.insert("name_hash", self.name_hash as i64);
        entry.insert("network_id", self.network_id);
        entry.insert("states", self.states.clone());
        entry
    }
}

/// FNV-1a of the little-endian document `{name, states}`, read as signed.
#[must_use]
pub fn network_id(name: &str, sorted_states: &NbtCompound) -> i32 {
    let mut key = NbtCompound::new();
    key.insert("name", name);
    key.insert("states", sorted_states.clone());
    fnv1a_32(&key.to_bytes(NbtFlavor::LittleEndian)) as i32
}

/// The states compound for one combination, in combination order.
pub fn states_compound<'a>(
    combination: impl IntoIterator<Item = (&'a str, &'a StateValue)>,
) -> NbtCompound {
    let mut states = NbtCompound::new();
    for (name, value) in combination {
        states.insert(name, value.to_nbt());
    }
    states
}

fn expand(name_hash: u64, variant: &BlockVariant) -> Vec<PaletteEntry> {
    let entries: Vec<_> = Permutations::new(&variant.canonical)
        .map(|combination| {
            PaletteEntry::with_name_hash(&variant.block_id, name_hash, states_compound(combination))
        })
        .collect();
    if entries.is_empty() {
        warn!("{} has an empty state domain, no entries", variant.block_id);
    }
    entries
}

/// Every block state, ascending by block-id hash. States of one block keep
/// enumeration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    #[must_use]
    pub fn build(variants: &[BlockVariant]) -> Self {
        let mut blocks: Vec<(u64, &BlockVariant)> = variants
            .iter()
            .map(|v| (fnv1_64(v.block_id.as_bytes()), v))
            .collect();
        blocks.sort_by_key(|(hash, _)| *hash);

        let expanded: Vec<Vec<PaletteEntry>> = blocks
            .par_iter()
            .map(|&(hash, variant)| expand(hash, variant))
            .collect();
        let entries: Vec<_> = expanded.into_iter().flatten().collect();

        info!(
            "Built palette: {} entries from {} blocks",
            entries.len(),
            variants.len()
        );
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with this block id and exactly these state values.
    #[must_use]
    pub fn find(&self, name: &str, states: &[(&str, StateValue)]) -> Option<&PaletteEntry> {
        let mut wanted = states_compound(states.iter().map(|(n, v)| (*n, v)));
        wanted.sort_keys();
        self.entries
            .iter()
            .find(|e| e.name == name && e.states == wanted)
    }

    /// `{blocks: [entry...]}`
    #[must_use]
    pub fn to_nbt(&self) -> NbtCompound {
        let blocks: Vec<NbtCompound> = self.entries.iter().map(PaletteEntry::to_nbt).collect();
        let mut root = NbtCompound::new();
        root.insert("blocks", NbtValue::List(NbtList::from(blocks)));
        root
    }

    /// Little-endian, uncompressed.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_nbt().to_bytes(NbtFlavor::LittleEndian)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn test_states_are_sorted_before_hashing() {
        let mut forward = NbtCompound::new();
        forward.insert("b", 1);
        forward.insert("a", "x");
        let mut backward = NbtCompound::new();
        backward.insert("a", "x");
        backward.insert("b", 1);

        let one = PaletteEntry::new("minecraft:test", forward);
        let two = PaletteEntry::new("minecraft:test", backward);
        assert_eq!(one, two);
        assert_eq!(one.states.iter().next().map(|(k, _)| k), Some("a"));
    }

    #[test]
    fn test_network_id_depends_on_name_and_states() {
        let empty = NbtCompound::new();
        let mut lit = NbtCompound::new();
        lit.insert("lit", 1i8);
        assert_ne!(network_id("minecraft:a", &empty), network_id("minecraft:b", &empty));
        assert_ne!(network_id("minecraft:a", &empty), network_id("minecraft:a", &lit));
    }

    #[test]
    fn test_empty_domain_block_contributes_nothing() {
        let broken = BlockVariant {
            block_id: "minecraft:broken".to_owned(),
            canonical: IndexMap::from([("age".to_owned(), Vec::new())]),
            possibly_aliased: Vec::new(),
        };
        assert!(Palette::build(&[broken]).is_empty());
    }
}
