//! Recipe definitions and the first-match recipe book.
//!
//! Recipes are immutable once registered. Lookup is a linear scan in
//! registration order and the first fully-satisfiable recipe wins; this is
//! a deliberate first-match policy, so content authors order their recipe
//! tables to resolve any overlap. Failing to match is a normal `None`, not
//! an error.

use crate::fixed::{Fixed64, Ticks};
use crate::id::{ItemTypeId, RecipeId};
use crate::item::{ItemStack, SlotInventory, SlotLayout};
use serde::{Deserialize, Serialize};

/// One input requirement: an item type and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub item: ItemTypeId,
    pub count: u32,
}

/// A processing recipe.
///
/// `energy_per_tick > 0` is a generator-style recipe that feeds the
/// machine's own buffer while running; `<= 0` is a consumer-style recipe
/// that draws `|energy_per_tick|` per tick of progress. `start_energy` is
/// the one-time ignition cost paid when the craft commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub inputs: Vec<RecipeInput>,
    pub output: ItemStack,
    pub tick_time: Ticks,
    pub energy_per_tick: Fixed64,
    pub start_energy: Fixed64,
}

impl Recipe {
    /// Per-tick running cost for consumer-style recipes; zero for generators.
    pub fn running_cost(&self) -> Fixed64 {
        if self.energy_per_tick < Fixed64::ZERO {
            -self.energy_per_tick
        } else {
            Fixed64::ZERO
        }
    }

    /// Required count per distinct input item, duplicates folded together.
    fn requirements(&self) -> Vec<(ItemTypeId, u32)> {
        let mut needs: Vec<(ItemTypeId, u32)> = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            match needs.iter_mut().find(|(item, _)| *item == input.item) {
                Some((_, count)) => *count += input.count,
                None => needs.push((input.item, input.count)),
            }
        }
        needs
    }

    /// Whether the input role slots currently hold every requirement.
    pub fn is_satisfied_by(&self, slots: &SlotInventory, layout: &SlotLayout) -> bool {
        self.requirements()
            .iter()
            .all(|&(item, count)| slots.count_of(item, layout.inputs()) >= count)
    }

    /// Deduct this recipe's inputs from the input role slots. Callers check
    /// [`Self::is_satisfied_by`] first; short inventories deduct what is
    /// there and return false.
    pub fn deduct_inputs(&self, slots: &mut SlotInventory, layout: &SlotLayout) -> bool {
        let mut complete = true;
        for (item, mut count) in self.requirements() {
            for &slot in layout.inputs() {
                if count == 0 {
                    break;
                }
                if slots.get(slot).is_some_and(|s| s.item == item) {
                    count -= slots.shrink(slot, count);
                }
            }
            if count > 0 {
                complete = false;
            }
        }
        complete
    }
}

// ---------------------------------------------------------------------------
// Recipe book
// ---------------------------------------------------------------------------

/// Registration-order recipe table with name lookup. Frozen by ownership:
/// hosts build it once at startup and hand out shared references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, recipe: Recipe) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(recipe);
        id
    }

    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.0 as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<RecipeId> {
        self.recipes
            .iter()
            .position(|r| r.name == name)
            .map(|i| RecipeId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    /// First recipe (in registration order) whose inputs are satisfied by
    /// the current input slots. `None` when nothing matches.
    pub fn match_inputs(&self, slots: &SlotInventory, layout: &SlotLayout) -> Option<RecipeId> {
        self.iter()
            .find(|(_, recipe)| recipe.is_satisfied_by(slots, layout))
            .map(|(id, _)| id)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
