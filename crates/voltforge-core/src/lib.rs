//! Voltforge Core -- the simulation kernel for energy-driven processing
//! machines.
//!
//! A machine is an energy buffer, a slot inventory with role layout, and a
//! crafting state machine, optionally gated behind a multiblock structure
//! rule. Each tick a machine matches recipes against its input slots, pays
//! a one-time ignition cost to commit, burns or generates energy per tick
//! of progress, and emits its output with backpressure when the output
//! slots are full. Shortage is a stall, never an error: the craft holds and
//! resumes when energy or output room returns.
//!
//! # Tick Flow
//!
//! [`machine::MachineController::tick`] advances one machine:
//!
//! 1. Re-validate the structure rule (throttled, default every 20 ticks).
//! 2. Advance the crafter: match, ignite, progress, complete, re-arm.
//! 3. Map the crafter's transitions to [`machine::MachineEvent`]s.
//!
//! [`plant::Plant::step`] does this for every machine against one world
//! snapshot and one frozen content set.
//!
//! # Key Types
//!
//! - [`energy::EnergyBuffer`] -- Bounded store with per-tick transfer caps.
//! - [`recipe::RecipeBook`] -- Registration-order recipe table, first match
//!   wins.
//! - [`crafter::ProcessCrafter`] -- The Idle/Matched/Running/Completing
//!   state machine with commit-once input consumption.
//! - [`machine::MachineController`] -- One machine: buffer + slots +
//!   crafter + structure gate.
//! - [`plant::Plant`] -- Slotmap of machines stepped deterministically.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`serialize`] -- Versioned snapshot support via bitcode.
//!
//! Structure rules and world access live in `voltforge-spatial`; data-file
//! loading lives in `voltforge-data`.

pub mod crafter;
pub mod energy;
pub mod fixed;
pub mod id;
pub mod item;
pub mod machine;
pub mod plant;
pub mod recipe;
pub mod serialize;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
