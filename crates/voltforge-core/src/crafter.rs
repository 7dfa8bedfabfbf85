//! The tick-driven crafting state machine.
//!
//! Phases: `Idle` (no recipe) -> `Matched` (recipe found, ignition energy
//! not yet paid) -> `Running` (inputs and ignition energy committed,
//! ticking) -> `Completing` (progress at total, output emission pending) ->
//! back to `Running` (re-arm) or `Idle`.
//!
//! Nothing in here raises an error. Every unmet precondition is either a
//! silent stall (tick skipped, state kept, retried next tick) or a reset to
//! `Idle`, and both are observable only through the query accessors. Once a
//! craft ignites it is committed: inputs are deducted exactly once and the
//! craft runs to completion even if the inputs' source or the surrounding
//! structure disappears afterwards.

use crate::energy::EnergyBuffer;
use crate::fixed::{Fixed64, Ticks};
use crate::id::RecipeId;
use crate::item::{SlotInventory, SlotLayout};
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phases and policies
// ---------------------------------------------------------------------------

/// Observable phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CraftPhase {
    #[default]
    Idle,
    Matched,
    Running,
    Completing,
}

/// When a recipe's inputs are deducted from the slots.
///
/// The host machines this kernel abstracts disagree on this point, so it is
/// a per-machine policy rather than a hard rule. `AtIgnition` is the
/// default: inputs commit when ignition energy is paid, and removing them
/// afterwards cannot stop the craft. `AtCompletion` defers the deduction to
/// emission time, which means a craft whose inputs vanish mid-run quietly
/// resets instead of completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsumePolicy {
    #[default]
    AtIgnition,
    AtCompletion,
}

/// Why the crafter made no progress this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallReason {
    InsufficientEnergy,
    OutputBlocked,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Persistent craft progress. Saved and restored with the owning machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CraftState {
    pub recipe: Option<RecipeId>,
    pub progress: Ticks,
    pub total: Ticks,
    pub ignited: bool,
}

/// What happened during one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CraftTickResult {
    /// Ignition energy was paid and the craft committed this tick.
    pub started: Option<RecipeId>,
    /// The output was emitted this tick.
    pub completed: Option<RecipeId>,
    /// A completed craft immediately re-armed for another cycle.
    pub rearmed: bool,
    /// The crafter fell back to `Idle` without completing.
    pub reset: bool,
    /// Progress was withheld this tick and why.
    pub stall: Option<StallReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCrafter {
    state: CraftState,
    policy: ConsumePolicy,
    #[serde(skip)]
    stall: Option<StallReason>,
}

impl ProcessCrafter {
    pub fn new(policy: ConsumePolicy) -> Self {
        Self {
            state: CraftState::default(),
            policy,
            stall: None,
        }
    }

    pub fn phase(&self) -> CraftPhase {
        match (self.state.recipe, self.state.ignited) {
            (None, _) => CraftPhase::Idle,
            (Some(_), false) => CraftPhase::Matched,
            (Some(_), true) if self.state.progress >= self.state.total => CraftPhase::Completing,
            (Some(_), true) => CraftPhase::Running,
        }
    }

    pub fn state(&self) -> &CraftState {
        &self.state
    }

    pub fn policy(&self) -> ConsumePolicy {
        self.policy
    }

    /// The stall recorded by the most recent `advance`, if any.
    pub fn stall_reason(&self) -> Option<StallReason> {
        self.stall
    }

    /// Progress scaled to `[0, scale]` for progress bars and telemetry.
    pub fn progress_scaled(&self, scale: u32) -> u32 {
        if self.state.total == 0 || self.state.progress == 0 {
            return 0;
        }
        ((self.state.progress.min(self.state.total) as u128 * scale as u128)
            / self.state.total as u128) as u32
    }

    /// Drop everything and return to `Idle`. Used by the machine layer when
    /// a required structure breaks before the craft has committed.
    pub fn reset(&mut self) {
        self.state = CraftState::default();
        self.stall = None;
    }

    /// Reset only if no craft has committed. A `Running` or `Completing`
    /// craft already consumed its inputs and ignition energy; aborting it
    /// would destroy them for nothing, so it is left to finish.
    pub fn reset_unless_committed(&mut self) -> bool {
        if self.state.ignited {
            false
        } else if self.state.recipe.is_some() {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Advance by one tick. See the module docs for the transition table.
    pub fn advance(
        &mut self,
        buffer: &mut EnergyBuffer,
        book: &RecipeBook,
        slots: &mut SlotInventory,
        layout: &SlotLayout,
    ) -> CraftTickResult {
        self.advance_inner(buffer, book, slots, layout, true)
    }

    /// Advance while new work is forbidden (the machine's structure is
    /// broken). A committed craft still runs to completion and emits, but
    /// nothing matches, ignites, or re-arms; an uncommitted match resets.
    pub fn advance_to_completion(
        &mut self,
        buffer: &mut EnergyBuffer,
        book: &RecipeBook,
        slots: &mut SlotInventory,
        layout: &SlotLayout,
    ) -> CraftTickResult {
        self.advance_inner(buffer, book, slots, layout, false)
    }

    fn advance_inner(
        &mut self,
        buffer: &mut EnergyBuffer,
        book: &RecipeBook,
        slots: &mut SlotInventory,
        layout: &SlotLayout,
        allow_new: bool,
    ) -> CraftTickResult {
        let mut result = CraftTickResult::default();
        self.stall = None;

        // Idle: look for a recipe. A match falls straight through to the
        // ignition attempt below so a fully-fueled machine starts in one tick.
        if self.state.recipe.is_none() {
            if !allow_new {
                return result;
            }
            match book.match_inputs(slots, layout) {
                Some(id) => {
                    let recipe = book.get(id).expect("matched id comes from this book");
                    self.state = CraftState {
                        recipe: Some(id),
                        progress: 0,
                        total: recipe.tick_time,
                        ignited: false,
                    };
                }
                None => return result,
            }
        }

        let id = self.state.recipe.expect("checked above");
        let Some(recipe) = book.get(id) else {
            // Recipe table changed under us (content reload). Self-heal.
            self.reset();
            result.reset = true;
            return result;
        };

        // Matched: wait for ignition energy, re-checking that the inputs are
        // still there each tick.
        if !self.state.ignited {
            if !allow_new || !recipe.is_satisfied_by(slots, layout) {
                self.reset();
                result.reset = true;
                return result;
            }
            if buffer.can_supply(recipe.start_energy) {
                buffer.consume(recipe.start_energy);
                if self.policy == ConsumePolicy::AtIgnition {
                    recipe.deduct_inputs(slots, layout);
                }
                self.state.ignited = true;
                result.started = Some(id);
            } else {
                self.stall = Some(StallReason::InsufficientEnergy);
                result.stall = self.stall;
            }
            // Ignition (or waiting for it) consumes the tick.
            return result;
        }

        // Running: pay or generate the per-tick energy, then progress.
        if self.state.progress < self.state.total {
            if recipe.energy_per_tick > Fixed64::ZERO {
                // Generator: overflow beyond capacity is wasted, never an error.
                buffer.fill(recipe.energy_per_tick);
            } else if !buffer.consume(recipe.running_cost()) {
                self.stall = Some(StallReason::InsufficientEnergy);
                result.stall = self.stall;
                return result;
            }
            self.state.progress += 1;
            if self.state.progress < self.state.total {
                return result;
            }
        }

        // Completing: emit the output, stall on backpressure, then re-arm
        // or fall back to Idle.
        self.try_complete(book, slots, layout, allow_new, &mut result);
        result
    }

    fn try_complete(
        &mut self,
        book: &RecipeBook,
        slots: &mut SlotInventory,
        layout: &SlotLayout,
        allow_new: bool,
        result: &mut CraftTickResult,
    ) {
        let id = self.state.recipe.expect("completing requires a recipe");
        let recipe = book.get(id).expect("recipe resolved by advance").clone();

        if self.policy == ConsumePolicy::AtCompletion {
            // Deferred-consumption crafts abort if the inputs went away.
            if !recipe.is_satisfied_by(slots, layout) {
                self.reset();
                result.reset = true;
                return;
            }
        }

        if !Self::output_fits(slots, layout, &recipe) {
            // Hold at total and retry next tick. The crafted output is never
            // dropped; this is backpressure, not failure.
            self.state.progress = self.state.total;
            self.stall = Some(StallReason::OutputBlocked);
            result.stall = self.stall;
            return;
        }

        if self.policy == ConsumePolicy::AtCompletion {
            recipe.deduct_inputs(slots, layout);
        }
        Self::emit_output(slots, layout, &recipe);
        result.completed = Some(id);

        // Re-arm for continuous operation. Ignition energy is a one-time
        // cost; a re-armed craft keeps burning without paying it again.
        if allow_new && recipe.is_satisfied_by(slots, layout) {
            self.state.progress = 0;
            if self.policy == ConsumePolicy::AtIgnition {
                recipe.deduct_inputs(slots, layout);
            }
            result.rearmed = true;
        } else {
            self.reset();
        }
    }

    /// Whether the full output count fits across the output role slots.
    fn output_fits(slots: &SlotInventory, layout: &SlotLayout, recipe: &crate::recipe::Recipe) -> bool {
        let mut room = 0u32;
        for &slot in layout.outputs() {
            room += match slots.get(slot) {
                None => slots.max_stack(),
                Some(stack) if stack.item == recipe.output.item => {
                    slots.max_stack().saturating_sub(stack.count)
                }
                Some(_) => 0,
            };
            if room >= recipe.output.count {
                return true;
            }
        }
        room >= recipe.output.count
    }

    /// Place the output across the output role slots. Callers check
    /// [`Self::output_fits`] first, so nothing is left over.
    fn emit_output(slots: &mut SlotInventory, layout: &SlotLayout, recipe: &crate::recipe::Recipe) {
        let mut remaining = recipe.output.count;
        for &slot in layout.outputs() {
            if remaining == 0 {
                break;
            }
            remaining = slots.insert_at(
                slot,
                crate::item::ItemStack::new(recipe.output.item, remaining),
            );
        }
        debug_assert_eq!(remaining, 0, "output_fits guaranteed room");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
