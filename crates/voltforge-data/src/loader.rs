//! Resolution pipeline: reads data files, resolves name references, builds
//! the frozen content set.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_content`] which ties them together:
//! items and tags are registered first, then recipes and shapes resolve
//! their names against those tables. Registration order on disk becomes
//! id order in the kernel, so recipe files double as match-priority lists.

use crate::schema::{
    ItemData, PredicateData, RecipeData, RegionData, ShapeData, TagData, TomlItems, TomlRecipes,
    TomlShapes, TomlTags,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use voltforge_core::fixed::f64_to_fixed64;
use voltforge_core::id::{ItemTypeId, RecipeId, ShapeRuleId, TagId};
use voltforge_core::item::ItemStack;
use voltforge_core::recipe::{Recipe, RecipeBook, RecipeInput};
use voltforge_spatial::{
    BlockPos, ShapeRegion, ShapeRuleSet, StructureRule, TagPredicate,
};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A definition failed kernel-side validation.
    #[error("invalid definition '{name}' in {file}: {detail}")]
    Invalid {
        file: PathBuf,
        name: String,
        detail: String,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without
/// extension). Returns `Ok(None)` if no file is found, or
/// `Err(ConflictingFormats)` if multiple formats exist for the same base.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its detected format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

/// Deserialize a list file. RON and JSON files are top-level arrays; TOML
/// files wrap their entries in a table, extracted via the wrapper type `W`.
fn deserialize_list<T, W>(
    path: &Path,
    unwrap: impl FnOnce(W) -> Vec<T>,
) -> Result<Vec<T>, DataLoadError>
where
    T: DeserializeOwned,
    W: DeserializeOwned,
{
    match detect_format(path)? {
        Format::Toml => Ok(unwrap(deserialize_file::<W>(path)?)),
        _ => deserialize_file::<Vec<T>>(path),
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

fn resolve_name<V: Copy>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<V, DataLoadError> {
    map.get(name)
        .copied()
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        })
}

fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Content set
// ===========================================================================

/// A fully-resolved content set: the frozen tables the kernel runs against,
/// plus name maps so hosts can address content by string.
#[derive(Debug, Default)]
pub struct Content {
    pub book: RecipeBook,
    pub shapes: ShapeRuleSet,
    pub items: HashMap<String, ItemTypeId>,
    pub tags: HashMap<String, TagId>,
}

impl Content {
    pub fn item(&self, name: &str) -> Option<ItemTypeId> {
        self.items.get(name).copied()
    }

    pub fn tag(&self, name: &str) -> Option<TagId> {
        self.tags.get(name).copied()
    }

    pub fn recipe(&self, name: &str) -> Option<RecipeId> {
        self.book.id_by_name(name)
    }

    pub fn shape(&self, name: &str) -> Option<ShapeRuleId> {
        self.shapes.id_by_name(name)
    }
}

/// Load a content directory into a frozen [`Content`] set.
///
/// `items` and `recipes` files are required; `tags` and `shapes` are
/// optional (a plant of freestanding machines needs neither).
pub fn load_content(dir: &Path) -> Result<Content, DataLoadError> {
    let mut content = Content::default();

    // Items first: everything else references them by name.
    let items_path = find_data_file(dir, "items")?.ok_or(DataLoadError::MissingRequired {
        file: "items",
        dir: dir.to_path_buf(),
    })?;
    let items: Vec<ItemData> = deserialize_list(&items_path, |w: TomlItems| w.items)?;
    for (index, item) in items.iter().enumerate() {
        check_duplicate(&content.items, &item.name, &items_path)?;
        content
            .items
            .insert(item.name.clone(), ItemTypeId(index as u32));
    }

    if let Some(tags_path) = find_data_file(dir, "tags")? {
        let tags: Vec<TagData> = deserialize_list(&tags_path, |w: TomlTags| w.tags)?;
        for (index, tag) in tags.iter().enumerate() {
            check_duplicate(&content.tags, &tag.name, &tags_path)?;
            content.tags.insert(tag.name.clone(), TagId(index as u32));
        }
    }

    let recipes_path = find_data_file(dir, "recipes")?.ok_or(DataLoadError::MissingRequired {
        file: "recipes",
        dir: dir.to_path_buf(),
    })?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, |w: TomlRecipes| w.recipes)?;
    let mut seen_recipes: HashMap<String, ()> = HashMap::new();
    for data in recipes {
        check_duplicate(&seen_recipes, &data.name, &recipes_path)?;
        seen_recipes.insert(data.name.clone(), ());
        let recipe = resolve_recipe(&data, &content.items, &recipes_path)?;
        content.book.register(recipe);
    }

    if let Some(shapes_path) = find_data_file(dir, "shapes")? {
        let shapes: Vec<ShapeData> = deserialize_list(&shapes_path, |w: TomlShapes| w.shapes)?;
        let mut seen_shapes: HashMap<String, ()> = HashMap::new();
        for data in shapes {
            check_duplicate(&seen_shapes, &data.name, &shapes_path)?;
            seen_shapes.insert(data.name.clone(), ());
            let rule = resolve_shape(&data, &content.tags, &shapes_path)?;
            content.shapes.register(rule);
        }
    }

    Ok(content)
}

fn resolve_recipe(
    data: &RecipeData,
    items: &HashMap<String, ItemTypeId>,
    file: &Path,
) -> Result<Recipe, DataLoadError> {
    let inputs = data
        .inputs
        .iter()
        .map(|(name, count)| {
            Ok(RecipeInput {
                item: resolve_name(items, name, file, "item")?,
                count: *count,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;
    let output_item = resolve_name(items, &data.output.0, file, "item")?;

    Ok(Recipe {
        name: data.name.clone(),
        inputs,
        output: ItemStack::new(output_item, data.output.1),
        tick_time: data.tick_time,
        energy_per_tick: f64_to_fixed64(data.energy_per_tick),
        start_energy: f64_to_fixed64(data.start_energy),
    })
}

fn resolve_shape(
    data: &ShapeData,
    tags: &HashMap<String, TagId>,
    file: &Path,
) -> Result<StructureRule, DataLoadError> {
    let mut regions = Vec::with_capacity(data.regions.len());
    for (region, predicate) in &data.regions {
        let region = match region {
            RegionData::RectY {
                half_x,
                half_z,
                offset,
            } => ShapeRegion::RectY {
                half_x: *half_x,
                half_z: *half_z,
                offset: block_pos(*offset),
            },
            RegionData::RingY {
                half_x,
                half_z,
                offset,
            } => ShapeRegion::RingY {
                half_x: *half_x,
                half_z: *half_z,
                offset: block_pos(*offset),
            },
            RegionData::Column { offset, height } => ShapeRegion::Column {
                offset: block_pos(*offset),
                height: *height,
            },
            RegionData::At { offset } => ShapeRegion::At {
                offset: block_pos(*offset),
            },
        };
        let predicate = match predicate {
            PredicateData::Exact(name) => {
                TagPredicate::Exact(resolve_name(tags, name, file, "tag")?)
            }
            PredicateData::AnyOf(names) => TagPredicate::AnyOf(
                names
                    .iter()
                    .map(|n| resolve_name(tags, n, file, "tag"))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            PredicateData::Empty => TagPredicate::Empty,
            PredicateData::EmptyOr(names) => TagPredicate::EmptyOr(
                names
                    .iter()
                    .map(|n| resolve_name(tags, n, file, "tag"))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        regions.push((region, predicate));
    }

    StructureRule::new(data.name.clone(), regions).map_err(|e| DataLoadError::Invalid {
        file: file.to_path_buf(),
        name: data.name.clone(),
        detail: e.to_string(),
    })
}

fn block_pos((x, y, z): (i32, i32, i32)) -> BlockPos {
    BlockPos::new(x, y, z)
}

// ===========================================================================
// Tests
// ===========================================================================
