//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::fixed::Fixed64;
use crate::id::ItemTypeId;
use crate::item::ItemStack;
use crate::machine::{MachineConfig, MachineController};
use crate::recipe::{Recipe, RecipeInput};
use voltforge_spatial::{BlockPos, ShapeRegion, StructureRule, TagId, TagPredicate};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Item types
// ===========================================================================

pub fn iron_ore() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn coal() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn iron_ingot() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn steel_ingot() -> ItemTypeId {
    ItemTypeId(3)
}
pub fn biofuel() -> ItemTypeId {
    ItemTypeId(4)
}

// ===========================================================================
// World tags
// ===========================================================================

pub fn casing() -> TagId {
    TagId(0)
}
pub fn coil() -> TagId {
    TagId(1)
}
pub fn lava() -> TagId {
    TagId(2)
}

// ===========================================================================
// Recipe constructors
// ===========================================================================

/// Consumer recipe drawing energy per tick, with an optional ignition cost.
pub fn smelting_recipe(
    name: &str,
    inputs: Vec<(ItemTypeId, u32)>,
    output: (ItemTypeId, u32),
    tick_time: u64,
    energy_per_tick: f64,
    start_energy: f64,
) -> Recipe {
    Recipe {
        name: name.to_string(),
        inputs: inputs
            .into_iter()
            .map(|(item, count)| RecipeInput { item, count })
            .collect(),
        output: ItemStack::new(output.0, output.1),
        tick_time,
        energy_per_tick: fixed(-energy_per_tick),
        start_energy: fixed(start_energy),
    }
}

/// Generator recipe feeding the machine's own buffer while it burns.
pub fn generator_recipe(
    name: &str,
    fuel: (ItemTypeId, u32),
    tick_time: u64,
    energy_per_tick: f64,
) -> Recipe {
    Recipe {
        name: name.to_string(),
        inputs: vec![RecipeInput {
            item: fuel.0,
            count: fuel.1,
        }],
        // Generators emit nothing; an ash-style byproduct would go here.
        output: ItemStack::new(fuel.0, 0),
        tick_time,
        energy_per_tick: fixed(energy_per_tick),
        start_energy: fixed(0.0),
    }
}

// ===========================================================================
// Machine constructors
// ===========================================================================

/// Freestanding 3-slot machine: slot 0 input, slots 1-2 output.
pub fn basic_machine(capacity: f64, max_io: f64) -> MachineController {
    MachineController::new(
        MachineConfig {
            capacity: fixed(capacity),
            max_input: fixed(max_io),
            max_output: fixed(max_io),
            ..MachineConfig::default()
        },
        vec![0],
        vec![1, 2],
        vec![],
        None,
        BlockPos::ZERO,
    )
    .expect("default layout is valid")
}

// ===========================================================================
// Structure rules
// ===========================================================================

/// Blast-furnace style rule: two casing rings stacked above the anchor with
/// an interior column that must be empty or lava.
pub fn furnace_rule() -> StructureRule {
    StructureRule::new(
        "blast_furnace",
        vec![
            (
                ShapeRegion::RingY {
                    half_x: 1,
                    half_z: 1,
                    offset: BlockPos::new(0, 1, 0),
                },
                TagPredicate::Exact(casing()),
            ),
            (
                ShapeRegion::RingY {
                    half_x: 1,
                    half_z: 1,
                    offset: BlockPos::new(0, 2, 0),
                },
                TagPredicate::Exact(casing()),
            ),
            (
                ShapeRegion::Column {
                    offset: BlockPos::new(0, 1, 0),
                    height: 2,
                },
                TagPredicate::EmptyOr(vec![lava()]),
            ),
        ],
    )
    .expect("rule regions are non-degenerate")
}
