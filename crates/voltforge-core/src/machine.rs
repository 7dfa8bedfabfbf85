//! The machine controller: one energy buffer, one crafter, one slot array,
//! and an optional structure requirement, glued together once per tick.
//!
//! Structure validation is throttled: the rule is re-checked on the first
//! tick and then every `structure_interval` ticks, so a structure broken
//! mid-interval is detected at most one interval late. Detection forces an
//! uncommitted craft back to `Idle`; a craft whose inputs and ignition
//! energy are already spent is left to finish (and only finish -- no new
//! cycle starts inside a broken structure).
//!
//! Events are emitted on transitions only, never repeated per tick.

use crate::crafter::{ConsumePolicy, CraftPhase, ProcessCrafter, StallReason};
use crate::energy::EnergyBuffer;
use crate::fixed::{Fixed64, Ticks};
use crate::id::{RecipeId, ShapeRuleId};
use crate::item::{LayoutError, SlotInventory, SlotLayout};
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use voltforge_spatial::{validate, BlockPos, ShapeRuleSet, WorldAccessor};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables fixed per machine type, passed at construction. The host keeps
/// these in content data rather than global statics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub capacity: Fixed64,
    pub max_input: Fixed64,
    pub max_output: Fixed64,
    pub slot_count: usize,
    pub max_stack: u32,
    /// Ticks between structure re-checks; 0 re-checks every tick.
    pub structure_interval: Ticks,
    pub consume_policy: ConsumePolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            capacity: Fixed64::from_num(10_000),
            max_input: Fixed64::from_num(128),
            max_output: Fixed64::from_num(128),
            slot_count: 3,
            max_stack: 64,
            structure_interval: 20,
            consume_policy: ConsumePolicy::AtIgnition,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted by [`MachineController::tick`] on state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEvent {
    /// Ignition energy was paid and a craft committed.
    CraftStarted { recipe: RecipeId },
    /// A craft's output was emitted.
    CraftCompleted { recipe: RecipeId },
    /// A craft fell back to `Idle` without completing.
    CraftAborted,
    /// The required structure stopped validating.
    StructureBroken,
    /// The required structure validates again.
    StructureRestored,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineController {
    config: MachineConfig,
    energy: EnergyBuffer,
    crafter: ProcessCrafter,
    slots: SlotInventory,
    layout: SlotLayout,
    /// Structure requirement; `None` means the machine is freestanding.
    shape: Option<ShapeRuleId>,
    /// World position the shape rule is anchored at.
    anchor: BlockPos,
    structure_ok: bool,
    ticks: Ticks,
}

impl MachineController {
    pub fn new(
        config: MachineConfig,
        inputs: Vec<usize>,
        outputs: Vec<usize>,
        fuel: Vec<usize>,
        shape: Option<ShapeRuleId>,
        anchor: BlockPos,
    ) -> Result<Self, LayoutError> {
        let layout = SlotLayout::new(config.slot_count, inputs, outputs, fuel)?;
        let energy = EnergyBuffer::new(config.capacity, config.max_input, config.max_output);
        let crafter = ProcessCrafter::new(config.consume_policy);
        let slots = SlotInventory::new(config.slot_count, config.max_stack);
        Ok(Self {
            config,
            energy,
            crafter,
            slots,
            layout,
            shape,
            anchor,
            structure_ok: true,
            ticks: 0,
        })
    }

    /// Advance one tick: throttled structure re-check, then the crafter.
    pub fn tick(
        &mut self,
        world: &impl WorldAccessor,
        shapes: &ShapeRuleSet,
        book: &RecipeBook,
    ) -> Vec<MachineEvent> {
        let mut events = Vec::new();

        if self.structure_due() {
            let ok = self.check_structure(world, shapes);
            if ok != self.structure_ok {
                events.push(if ok {
                    MachineEvent::StructureRestored
                } else {
                    MachineEvent::StructureBroken
                });
                self.structure_ok = ok;
            }
        }

        // Idle machines with an unchanged inventory have nothing to do;
        // skipping the recipe scan keeps large plants cheap. A structure
        // transition still forces a scan: restoration is what lets a
        // waiting batch start again.
        let idle_and_unchanged = self.crafter.phase() == CraftPhase::Idle
            && !self.slots.has_changed()
            && events.is_empty();

        if !idle_and_unchanged {
            let result = if self.structure_ok {
                self.crafter
                    .advance(&mut self.energy, book, &mut self.slots, &self.layout)
            } else {
                self.crafter.advance_to_completion(
                    &mut self.energy,
                    book,
                    &mut self.slots,
                    &self.layout,
                )
            };

            if let Some(recipe) = result.started {
                events.push(MachineEvent::CraftStarted { recipe });
            }
            if let Some(recipe) = result.completed {
                events.push(MachineEvent::CraftCompleted { recipe });
            }
            if result.reset {
                events.push(MachineEvent::CraftAborted);
            }
        }

        self.slots.reset_changed();
        self.ticks += 1;
        events
    }

    fn structure_due(&self) -> bool {
        self.shape.is_some()
            && (self.ticks == 0
                || self.config.structure_interval == 0
                || self.ticks % self.config.structure_interval == 0)
    }

    fn check_structure(&self, world: &impl WorldAccessor, shapes: &ShapeRuleSet) -> bool {
        match self.shape.and_then(|id| shapes.get(id)) {
            Some(rule) => validate(world, self.anchor, rule),
            // Freestanding, or a dangling rule id: treat as valid rather
            // than wedging the machine forever.
            None => true,
        }
    }

    // -- queries ------------------------------------------------------------

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn energy(&self) -> &EnergyBuffer {
        &self.energy
    }

    /// External charge/discharge access for cables and adjacent storage.
    pub fn energy_mut(&mut self) -> &mut EnergyBuffer {
        &mut self.energy
    }

    pub fn slots(&self) -> &SlotInventory {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotInventory {
        &mut self.slots
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn phase(&self) -> CraftPhase {
        self.crafter.phase()
    }

    pub fn stall_reason(&self) -> Option<StallReason> {
        self.crafter.stall_reason()
    }

    /// Craft progress scaled to `[0, scale]` for progress bars.
    pub fn progress_scaled(&self, scale: u32) -> u32 {
        self.crafter.progress_scaled(scale)
    }

    /// Result of the most recent (throttled) structure check.
    pub fn structure_valid(&self) -> bool {
        self.structure_ok
    }

    pub fn anchor(&self) -> BlockPos {
        self.anchor
    }

    pub fn ticks(&self) -> Ticks {
        self.ticks
    }
}

// ===========================================================================
// Tests
// ===========================================================================
