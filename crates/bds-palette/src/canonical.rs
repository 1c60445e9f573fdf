//! Reduce harvested state domains to the dimensions the engine actually
//! distinguishes.
//!
//! Runs per block:
//! 1. Reachability probe: a dimension that fails to resolve back to its own
//!    block for some value is flagged as possibly aliased.
//! 2. Alias detection: two dimensions of equal cardinality that fail to
//!    distinguish some non-default value pair are aliases; one is dropped.
//! 3. Policy: supersession rules and per-block overrides.
//!
//! Then across blocks: a dimension flagged by two or more blocks is removed
//! unless allow-listed.
//!
//! Steps 1 and 2 need the engine's permutation matcher. Without one the
//! harvested `palleteStates` and `possiblyAliased` lists stand in for them.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    PaletteError, Result,
    harvest::{BlockData, HarvestedBlocks, StateDomains, StateValue},
};

/// The engine's permutation matching, as seen by the harvesting script.
pub trait PermutationOracle {
    /// Resolving `block` with `state = value` (everything else default)
    /// still matches `block`.
    fn resolves(&self, block: &str, state: &str, value: &StateValue) -> bool;

    /// Resolving `block` with only `set` applied also matches `block` with
    /// `expect` applied.
    fn matches(
        &self,
        block: &str,
        set: (&str, &StateValue),
        expect: (&str, &StateValue),
    ) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supersession {
    /// Present in the canonical set...
    pub state: String,
    /// ...so this one is removed.
    pub supersedes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockOverride {
    pub blocks: Vec<String>,
    #[serde(default)]
    pub drop: Vec<String>,
    /// Replacement domains, inserted when the dimension is missing.
    #[serde(default)]
    pub domains: IndexMap<String, Vec<StateValue>>,
}

/// Which blocks lose a dimension flagged by several blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// Every block that has the dimension.
    #[default]
    AllBlocks,
    /// Only the blocks that flagged it.
    FlaggedBlocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalPolicy {
    /// Dimensions never removed by cross-block dedup.
    pub allow_list: Vec<String>,
    pub supersedes: Vec<Supersession>,
    pub overrides: Vec<BlockOverride>,
    pub dedup_scope: DedupScope,
}

fn drop_states(blocks: &[&str], states: &[&str]) -> BlockOverride {
    BlockOverride {
        blocks: blocks.iter().map(|b| format!("minecraft:{b}")).collect(),
        drop: states.iter().map(|s| (*s).to_owned()).collect(),
        domains: IndexMap::new(),
    }
}

fn int_domain(blocks: &[&str], state: &str, max: i32) -> BlockOverride {
    BlockOverride {
        blocks: blocks.iter().map(|b| format!("minecraft:{b}")).collect(),
        drop: Vec::new(),
        domains: IndexMap::from([(
            state.to_owned(),
            (0..=max).map(StateValue::Int).collect(),
        )]),
    }
}

impl Default for CanonicalPolicy {
    /// Legacy dimensions the engine still reports but no longer encodes.
    fn default() -> Self {
        Self {
            allow_list: Vec::new(),
            supersedes: vec![Supersession {
                state: "minecraft:cardinal_direction".to_owned(),
                supersedes: "facing_direction".to_owned(),
            }],
            overrides: vec![
                drop_states(&["cobblestone_wall"], &["wall_block_type"]),
                int_domain(&["nether_wart", "frosted_ice"], "age", 3),
                drop_states(&["sandstone", "red_sandstone"], &["sand_stone_type"]),
                int_domain(&["cocoa"], "age", 2),
                drop_states(&["prismarine"], &["prismarine_block_type"]),
                drop_states(&["sculk_sensor"], &["powered_bit"]),
                drop_states(&["structure_void"], &["structure_void_type"]),
                int_domain(&["chorus_flower"], "age", 5),
                drop_states(&["quartz_block", "purpur_block"], &["chisel_type"]),
                drop_states(&["dirt", "coarse_dirt"], &["dirt_type"]),
                drop_states(&["anvil"], &["damage"]),
                int_domain(
                    &["golden_rail", "detector_rail", "activator_rail"],
                    "rail_direction",
                    5,
                ),
                drop_states(
                    &["dead_horn_coral_wall_fan", "horn_coral_wall_fan"],
                    &["coral_hang_type_bit"],
                ),
                drop_states(&["sponge", "wet_sponge"], &["sponge_type"]),
                drop_states(&["sand", "red_sand"], &["sand_type"]),
                drop_states(&["tnt", "underwater_tnt"], &["allow_underwater_bit"]),
                drop_states(&["stone"], &["stone_type"]),
            ],
            dedup_scope: DedupScope::AllBlocks,
        }
    }
}

impl CanonicalPolicy {
    /// Policy with no legacy cases at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            allow_list: Vec::new(),
            supersedes: Vec::new(),
            overrides: Vec::new(),
            dedup_scope: DedupScope::AllBlocks,
        }
    }

    /// Apply supersession rules, then the overrides naming `block_id`.
    pub fn apply(&self, block_id: &str, domains: &mut StateDomains) {
        for rule in &self.supersedes {
            if domains.contains_key(&rule.state) && domains.shift_remove(&rule.supersedes).is_some()
            {
                debug!("{}: {} supersedes {}", block_id, rule.state, rule.supersedes);
            }
        }

        for o in self.overrides.iter().filter(|o| o.blocks.iter().any(|b| b == block_id)) {
            for state in &o.drop {
                domains.shift_remove(state);
            }
            for (state, values) in &o.domains {
                domains.insert(state.clone(), values.clone());
            }
        }
    }

    fn allows(&self, state: &str) -> bool {
        self.allow_list.iter().any(|s| s == state)
    }
}

/// One block after canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockVariant {
    pub block_id: String,
    /// Dimensions to enumerate, in declaration order.
    pub canonical: StateDomains,
    pub possibly_aliased: Vec<String>,
}

/// Step 1. Bounded by each domain's size: the first failing value flags the
/// dimension and ends its probe.
pub fn probe(oracle: &dyn PermutationOracle, block: &BlockData) -> Vec<String> {
    block
        .states
        .iter()
        .filter(|(state, values)| {
            values
                .iter()
                .any(|value| !oracle.resolves(&block.block_id, state, value))
        })
        .map(|(state, _)| state.clone())
        .collect()
}

fn default_of<'a>(block: &'a BlockData, state: &str) -> Result<&'a StateValue> {
    block
        .default_permutation
        .get(state)
        .ok_or_else(|| PaletteError::MissingDefault {
            block: block.block_id.clone(),
            state: state.to_owned(),
        })
}

/// Whether applying `first` fails to tell apart some non-default pair.
fn indistinguishable(
    oracle: &dyn PermutationOracle,
    block: &BlockData,
    first: &str,
    second: &str,
) -> Result<bool> {
    let (d1, d2) = (default_of(block, first)?, default_of(block, second)?);
    let mut sampled = 0usize;
    let mut unique = 0usize;
    for v1 in block.states[first].iter().filter(|v| *v != d1) {
        for v2 in block.states[second].iter().filter(|v| *v != d2) {
            sampled += 1;
            if !oracle.matches(&block.block_id, (first, v1), (second, v2)) {
                unique += 1;
            }
        }
    }
    Ok(unique < sampled)
}

/// The member of an alias pair to drop: keep a namespaced name, otherwise
/// keep whichever was declared first.
fn alias_to_drop<'a>(block: &BlockData, first: &'a str, second: &'a str) -> &'a str {
    if first.starts_with("minecraft:") {
        return second;
    }
    if second.starts_with("minecraft:") {
        return first;
    }
    let position = |s: &str| block.possible_properties.iter().position(|p| p == s);
    if position(first) > position(second) {
        first
    } else {
        second
    }
}

/// Step 2. Returns the dimensions to drop, in declaration order.
pub fn find_aliases(oracle: &dyn PermutationOracle, block: &BlockData) -> Result<Vec<String>> {
    let names: Vec<&str> = block.states.keys().map(String::as_str).collect();
    let mut dropped: HashSet<&str> = HashSet::new();

    for (i, &first) in names.iter().enumerate() {
        for &second in &names[i + 1..] {
            if block.states[first].len() != block.states[second].len() {
                continue;
            }
            if indistinguishable(oracle, block, first, second)?
                || indistinguishable(oracle, block, second, first)?
            {
                let drop = alias_to_drop(block, first, second);
                debug!("{}: {} aliases {}, dropping {}", block.block_id, first, second, drop);
                dropped.insert(drop);
            }
        }
    }

    Ok(names
        .into_iter()
        .filter(|n| dropped.contains(n))
        .map(str::to_owned)
        .collect())
}

/// Runs the per-block steps and cross-block dedup over harvested blocks.
pub struct Canonicalizer<'a> {
    policy: &'a CanonicalPolicy,
    oracle: Option<&'a dyn PermutationOracle>,
}

impl<'a> Canonicalizer<'a> {
    #[must_use]
    pub fn new(policy: &'a CanonicalPolicy) -> Self {
        Self {
            policy,
            oracle: None,
        }
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: &'a dyn PermutationOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn run(&self, blocks: &HarvestedBlocks) -> Result<Vec<BlockVariant>> {
        let mut variants = blocks
            .data
            .values()
            .map(|block| self.canonicalize_block(block))
            .collect::<Result<Vec<_>>>()?;
        cross_dedup(&mut variants, self.policy);

        let dims: usize = variants.iter().map(|v| v.canonical.len()).sum();
        info!(
            "Canonicalized {} blocks ({} state dimensions kept)",
            variants.len(),
            dims
        );
        Ok(variants)
    }

    fn canonicalize_block(&self, block: &BlockData) -> Result<BlockVariant> {
        let (mut canonical, possibly_aliased) = match self.oracle {
            Some(oracle) => {
                let flagged = probe(oracle, block);
                let mut canonical = block.states.clone();
                for state in find_aliases(oracle, block)? {
                    canonical.shift_remove(&state);
                }
                (canonical, flagged)
            }
            None => (
                block.palette_states.clone(),
                block.possibly_aliased.clone().unwrap_or_default(),
            ),
        };
        self.policy.apply(&block.block_id, &mut canonical);

        Ok(BlockVariant {
            block_id: block.block_id.clone(),
            canonical,
            possibly_aliased,
        })
    }
}

/// Step 3: remove dimensions flagged by at least two distinct blocks.
fn cross_dedup(variants: &mut [BlockVariant], policy: &CanonicalPolicy) {
    let mut flagged_by: HashMap<String, usize> = HashMap::new();
    for variant in variants.iter() {
        let unique: HashSet<&String> = variant.possibly_aliased.iter().collect();
        for state in unique {
            *flagged_by.entry(state.clone()).or_default() += 1;
        }
    }

    let deprecated: HashSet<&str> = flagged_by
        .iter()
        .filter(|(state, count)| **count >= 2 && !policy.allows(state))
        .map(|(state, _)| state.as_str())
        .collect();
    if deprecated.is_empty() {
        return;
    }

    for variant in variants.iter_mut() {
        let BlockVariant {
            block_id,
            canonical,
            possibly_aliased,
        } = variant;
        canonical.retain(|state, _| {
            let remove = deprecated.contains(state.as_str())
                && (policy.dedup_scope == DedupScope::AllBlocks
                    || possibly_aliased.contains(state));
            if remove {
                debug!("{}: {} deprecated across blocks", block_id, state);
            }
            !remove
        });
    }
}
