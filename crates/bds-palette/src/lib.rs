//! Canonical block palette derived from harvested block state domains.
//!
//! [`canonical`] reduces each block's dimensions, [`enumerate`] expands them
//! and [`palette`] assigns each combination its hashed network id.

pub mod canonical;
pub mod enumerate;
mod error;
pub mod harvest;
pub mod hash;
pub mod palette;

pub use canonical::{BlockVariant, CanonicalPolicy, Canonicalizer, DedupScope, PermutationOracle};
pub use error::{PaletteError, Result};
pub use harvest::{BlockData, HarvestedData, StateValue};
pub use palette::{Palette, PaletteEntry};

/// Canonicalize harvested blocks without an oracle and build the palette.
pub fn build_palette(data: &HarvestedData, policy: &CanonicalPolicy) -> Result<Palette> {
    let variants = Canonicalizer::new(policy).run(&data.blocks)?;
    Ok(Palette::build(&variants))
}
