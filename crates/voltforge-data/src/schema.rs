//! Serde data file structs for machine content definitions.
//!
//! These structs define the on-disk format for items, world tags, recipes,
//! and structure shapes. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into kernel types by the loader. Energy values
//! are plain `f64` on disk; conversion to fixed-point happens once at load.

use serde::Deserialize;

// ===========================================================================
// Items and tags
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

/// A world tag definition (block kinds structure rules can require).
#[derive(Debug, Clone, Deserialize)]
pub struct TagData {
    pub name: String,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file.
///
/// `energy_per_tick` follows the kernel's sign convention: negative draws
/// energy while running, positive generates it.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub inputs: Vec<(String, u32)>,
    pub output: (String, u32),
    pub tick_time: u64,
    pub energy_per_tick: f64,
    #[serde(default)]
    pub start_energy: f64,
}

// ===========================================================================
// Structure shapes
// ===========================================================================

/// A region within a structure rule.
#[derive(Debug, Clone, Deserialize)]
pub enum RegionData {
    RectY {
        half_x: i32,
        half_z: i32,
        offset: (i32, i32, i32),
    },
    RingY {
        half_x: i32,
        half_z: i32,
        offset: (i32, i32, i32),
    },
    Column {
        offset: (i32, i32, i32),
        height: u32,
    },
    At {
        offset: (i32, i32, i32),
    },
}

/// Tag condition a region's cells must satisfy, by tag name.
#[derive(Debug, Clone, Deserialize)]
pub enum PredicateData {
    Exact(String),
    AnyOf(Vec<String>),
    Empty,
    EmptyOr(Vec<String>),
}

/// A multiblock structure rule definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeData {
    pub name: String,
    pub regions: Vec<(RegionData, PredicateData)>,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================
//
// TOML has no top-level arrays, so list files wrap their entries in a table
// keyed by the file's base name.

#[derive(Debug, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

#[derive(Debug, Deserialize)]
pub struct TomlTags {
    pub tags: Vec<TagData>,
}

#[derive(Debug, Deserialize)]
pub struct TomlRecipes {
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Deserialize)]
pub struct TomlShapes {
    pub shapes: Vec<ShapeData>,
}
