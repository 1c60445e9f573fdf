//! Data harvested from the running game through its scripting API.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use bds_protocol::NbtValue;

use crate::{PaletteError, Result};

/// One value of a block state dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i32),
    String(String),
}

impl StateValue {
    /// Palette encoding: strings stay strings, integers become ints and
    /// booleans become bytes.
    #[must_use]
    pub fn to_nbt(&self) -> NbtValue {
        match self {
            Self::Bool(b) => NbtValue::Byte(i8::from(*b)),
            Self::Int(i) => NbtValue::Int(*i),
            Self::String(s) => NbtValue::String(s.clone()),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Per-dimension value domains, in declaration order.
pub type StateDomains = IndexMap<String, Vec<StateValue>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    #[serde(default)]
    pub block_id: String,
    #[serde(default)]
    pub possible_properties: Vec<String>,
    #[serde(default)]
    pub default_permutation: IndexMap<String, StateValue>,
    #[serde(default)]
    pub states: StateDomains,
    /// Domains left after alias detection on the harvesting side.
    #[serde(default, rename = "palleteStates")]
    pub palette_states: StateDomains,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Dimensions the harvesting side could not resolve in isolation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possibly_aliased: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarvestedBlocks {
    pub data: IndexMap<String, BlockData>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default, rename = "palleteProperties")]
    pub palette_properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// The whole hand-off document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedData {
    pub blocks: HarvestedBlocks,
    #[serde(default)]
    pub dimensions: Vec<serde_json::Value>,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub enchantments: Vec<serde_json::Value>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub items: Vec<HarvestedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets: Option<serde_json::Value>,
}

impl HarvestedData {
    /// Parse the hand-off body and check that every block is usable.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut data: Self = serde_json::from_slice(bytes)?;
        data.normalize()?;
        Ok(data)
    }

    /// Fill in missing block ids from their map keys and reject blocks
    /// whose default permutation does not cover their own dimensions.
    fn normalize(&mut self) -> Result<()> {
        if self.blocks.data.is_empty() {
            return Err(PaletteError::NoBlocks);
        }
        for (key, block) in &mut self.blocks.data {
            if block.block_id.is_empty() {
                block.block_id.clone_from(key);
            }
            if let Some(state) = block
                .states
                .keys()
                .find(|state| !block.default_permutation.contains_key(*state))
            {
                return Err(PaletteError::MissingDefault {
                    block: block.block_id.clone(),
                    state: state.clone(),
                });
            }
        }
        Ok(())
    }

    /// Names of every state dimension still present in some palette domain,
    /// in first-seen order.
    #[must_use]
    pub fn palette_property_names(&self) -> Vec<String> {
        let names: IndexSet<&str> = self
            .blocks
            .data
            .values()
            .flat_map(|block| block.palette_states.keys().map(String::as_str))
            .collect();
        names.into_iter().map(str::to_owned).collect()
    }
}
