//! CraftingData and the recipe shapes it carries.

use bds_protocol::{Cursor, Decode, ErrorKind, Result, Uuid, VarI32, VarU32};
use byteorder::LittleEndian;
use serde::Serialize;

use crate::common::ItemStack;

/// What an ingredient slot accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum IngredientDescriptor {
    Invalid,
    /// Legacy numeric id; aux value only present for a nonzero id.
    IntId { network_id: i16, aux_value: Option<i16> },
    Molang { expression: String, version: u8 },
    Tag { tag: String },
    StringIdMeta { name: String, aux_value: i16 },
    ComplexAlias { alias: String },
}

impl Decode for IngredientDescriptor {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(match c.read_u8()? {
                0 => Self::Invalid,
                1 => {
                    let network_id = c.read_i16::<LittleEndian>()?;
                    let aux_value = if network_id == 0 {
                        None
                    } else {
                        Some(c.read_i16::<LittleEndian>()?)
                    };
                    Self::IntId {
                        network_id,
                        aux_value,
                    }
                }
                2 => Self::Molang {
                    expression: c.read_string()?,
                    version: c.read_u8()?,
                },
                3 => Self::Tag {
                    tag: c.read_string()?,
                },
                4 => Self::StringIdMeta {
                    name: c.read_string()?,
                    aux_value: c.read_i16::<LittleEndian>()?,
                },
                5 => Self::ComplexAlias {
                    alias: c.read_string()?,
                },
                other => return Err(c.unrecognized("recipe ingredient type", other)),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct RecipeIngredient {
    pub descriptor: IngredientDescriptor,
    pub count: VarI32,
}

/// When a recipe shows up in the recipe book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "context")]
pub enum UnlockingRequirement {
    Ingredients { ingredients: Vec<RecipeIngredient> },
    AlwaysUnlocked,
    PlayerInWater,
    PlayerHasManyItems,
}

impl Decode for UnlockingRequirement {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(match c.read_u8()? {
                0 => Self::Ingredients {
                    ingredients: Vec::decode(c)?,
                },
                1 => Self::AlwaysUnlocked,
                2 => Self::PlayerInWater,
                3 => Self::PlayerHasManyItems,
                other => return Err(c.unrecognized("unlocking context", other)),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct ShapelessRecipe {
    pub recipe_id: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub results: Vec<ItemStack>,
    pub uuid: Uuid,
    pub tag: String,
    pub priority: VarI32,
    pub unlocking: UnlockingRequirement,
    pub net_id: VarU32,
}

/// A shaped recipe. `ingredients` is `width` columns of `height` slots each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapedRecipe {
    pub recipe_id: String,
    pub width: i32,
    pub height: i32,
    pub ingredients: Vec<Vec<RecipeIngredient>>,
    pub results: Vec<ItemStack>,
    pub uuid: Uuid,
    pub tag: String,
    pub priority: VarI32,
    pub assume_symmetry: bool,
    pub unlocking: UnlockingRequirement,
    pub net_id: VarU32,
}

/// Read a `width` x `height` ingredient grid; both sizes come before it.
///
/// Every slot takes at least one byte, so a grid with more slots than the
/// frame has bytes left is rejected before anything is allocated. A zero
/// height with a nonzero width would loop without consuming input.
fn read_grid(cursor: &mut Cursor<'_>, width: i32, height: i32) -> Result<Vec<Vec<RecipeIngredient>>> {
    let slots = i128::from(width) * i128::from(height);
    let fits = usize::try_from(slots).is_ok_and(|n| n <= cursor.remaining());
    if width < 0 || height < 0 || !fits || (height == 0 && width > 0) {
        return Err(cursor.error(ErrorKind::InvalidLength {
            what: "shaped recipe grid",
            value: slots,
        }));
    }
    cursor.read_array(
        |_| Ok(width),
        |c| c.read_array(|_| Ok(height), RecipeIngredient::decode),
    )
}

impl Decode for ShapedRecipe {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let recipe_id = c.read_string()?;
            let width = c.read_var_i32()?;
            let height = c.read_var_i32()?;
            Ok(Self {
                recipe_id,
                width,
                height,
                ingredients: read_grid(c, width, height)?,
                results: Vec::decode(c)?,
                uuid: Uuid::decode(c)?,
                tag: c.read_string()?,
                priority: VarI32::decode(c)?,
                assume_symmetry: c.read_bool()?,
                unlocking: UnlockingRequirement::decode(c)?,
                net_id: VarU32::decode(c)?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct FurnaceRecipe {
    pub input_id: VarI32,
    pub result: ItemStack,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct FurnaceAuxRecipe {
    pub input_id: VarI32,
    pub input_aux: VarI32,
    pub result: ItemStack,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct MultiRecipe {
    pub uuid: Uuid,
    pub net_id: VarU32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct ShapelessChemistryRecipe {
    pub recipe_id: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub results: Vec<ItemStack>,
    pub uuid: Uuid,
    pub tag: String,
    pub priority: VarI32,
    pub net_id: VarU32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct ShapedChemistryRecipe {
    pub recipe_id: String,
    pub width: VarI32,
    pub height: VarI32,
    pub ingredient: RecipeIngredient,
    pub results: Vec<ItemStack>,
    pub uuid: Uuid,
    pub tag: String,
    pub priority: VarI32,
    pub assume_symmetry: bool,
    pub net_id: VarU32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct SmithingTransformRecipe {
    pub recipe_id: String,
    pub template: RecipeIngredient,
    pub base: RecipeIngredient,
    pub addition: RecipeIngredient,
    pub result: ItemStack,
    pub tag: String,
    pub net_id: VarU32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct SmithingTrimRecipe {
    pub recipe_id: String,
    pub template: RecipeIngredient,
    pub base: RecipeIngredient,
    pub addition: RecipeIngredient,
    pub tag: String,
    pub net_id: VarU32,
}

/// One entry of the recipe list, selected by a zig-zag crafting type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "recipe")]
pub enum CraftingEntry {
    Shapeless(ShapelessRecipe),
    Shaped(ShapedRecipe),
    Furnace(FurnaceRecipe),
    FurnaceAux(FurnaceAuxRecipe),
    Multi(MultiRecipe),
    ShulkerBox(ShapelessRecipe),
    ShapelessChemistry(ShapelessChemistryRecipe),
    ShapedChemistry(ShapedChemistryRecipe),
    SmithingTransform(SmithingTransformRecipe),
    SmithingTrim(SmithingTrimRecipe),
}

impl Decode for CraftingEntry {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            Ok(match c.read_var_i32()? {
                0 => Self::Shapeless(Decode::decode(c)?),
                1 => Self::Shaped(Decode::decode(c)?),
                2 => Self::Furnace(Decode::decode(c)?),
                3 => Self::FurnaceAux(Decode::decode(c)?),
                4 => Self::Multi(Decode::decode(c)?),
                5 => Self::ShulkerBox(Decode::decode(c)?),
                6 => Self::ShapelessChemistry(Decode::decode(c)?),
                7 => Self::ShapedChemistry(Decode::decode(c)?),
                8 => Self::SmithingTransform(Decode::decode(c)?),
                9 => Self::SmithingTrim(Decode::decode(c)?),
                other => return Err(c.unrecognized("crafting type", other)),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct PotionMix {
    pub from_potion_id: VarI32,
    pub from_item_aux: VarI32,
    pub reagent_item_id: VarI32,
    pub reagent_item_aux: VarI32,
    pub to_potion_id: VarI32,
    pub to_item_aux: VarI32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct ContainerMix {
    pub from_item_id: VarI32,
    pub reagent_item_id: VarI32,
    pub to_item_id: VarI32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct ItemIdAndCount {
    pub item_id: VarI32,
    pub count: VarI32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct MaterialReducer {
    pub input: VarI32,
    pub outputs: Vec<ItemIdAndCount>,
}

/// CraftingData (ID: 52)
#[derive(Debug, Clone, PartialEq, Serialize, Decode)]
pub struct CraftingData {
    pub recipes: Vec<CraftingEntry>,
    pub potion_mixes: Vec<PotionMix>,
    pub container_mixes: Vec<ContainerMix>,
    pub material_reducers: Vec<MaterialReducer>,
    pub clear_recipes: bool,
}
