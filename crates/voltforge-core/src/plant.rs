//! Top-level plant: a slotmap of machine controllers stepped in insertion
//! order against one recipe book and one shape rule set.
//!
//! Machines are independent; a step collects per-machine events into one
//! flat list so the host can route them (sounds, chunk saves, telemetry)
//! without holding borrows into the plant.

use crate::fixed::Ticks;
use crate::id::MachineId;
use crate::machine::{MachineController, MachineEvent};
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use voltforge_spatial::{ShapeRuleSet, WorldAccessor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    machines: SlotMap<MachineId, MachineController>,
    book: RecipeBook,
    shapes: ShapeRuleSet,
    tick: Ticks,
}

impl Plant {
    pub fn new(book: RecipeBook, shapes: ShapeRuleSet) -> Self {
        Self {
            machines: SlotMap::with_key(),
            book,
            shapes,
            tick: 0,
        }
    }

    pub fn add_machine(&mut self, machine: MachineController) -> MachineId {
        self.machines.insert(machine)
    }

    pub fn remove_machine(&mut self, id: MachineId) -> Option<MachineController> {
        self.machines.remove(id)
    }

    pub fn machine(&self, id: MachineId) -> Option<&MachineController> {
        self.machines.get(id)
    }

    pub fn machine_mut(&mut self, id: MachineId) -> Option<&mut MachineController> {
        self.machines.get_mut(id)
    }

    pub fn machines(&self) -> impl Iterator<Item = (MachineId, &MachineController)> {
        self.machines.iter()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn book(&self) -> &RecipeBook {
        &self.book
    }

    pub fn shapes(&self) -> &ShapeRuleSet {
        &self.shapes
    }

    /// Plant-global tick counter, advanced once per [`Self::step`].
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Advance every machine by one tick against a world snapshot.
    pub fn step(&mut self, world: &impl WorldAccessor) -> Vec<(MachineId, MachineEvent)> {
        // Split borrows: machines mutate while book/shapes stay shared.
        let Plant {
            machines,
            book,
            shapes,
            tick,
        } = self;

        let mut events = Vec::new();
        for (id, machine) in machines.iter_mut() {
            for event in machine.tick(world, shapes, book) {
                events.push((id, event));
            }
        }
        *tick += 1;
        events
    }

    pub(crate) fn parts(
        &self,
    ) -> (&SlotMap<MachineId, MachineController>, Ticks) {
        (&self.machines, self.tick)
    }

    pub(crate) fn from_parts(
        machines: SlotMap<MachineId, MachineController>,
        book: RecipeBook,
        shapes: ShapeRuleSet,
        tick: Ticks,
    ) -> Self {
        Self {
            machines,
            book,
            shapes,
            tick,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64 as fixed;
    use crate::id::ItemTypeId;
    use crate::item::ItemStack;
    use crate::machine::MachineConfig;
    use crate::recipe::{Recipe, RecipeInput};
    use voltforge_spatial::{BlockPos, GridWorld};

    fn ore() -> ItemTypeId {
        ItemTypeId(0)
    }
    fn ingot() -> ItemTypeId {
        ItemTypeId(1)
    }

    fn book() -> RecipeBook {
        let mut book = RecipeBook::new();
        book.register(Recipe {
            name: "smelt".to_string(),
            inputs: vec![RecipeInput {
                item: ore(),
                count: 1,
            }],
            output: ItemStack::new(ingot(), 1),
            tick_time: 5,
            energy_per_tick: fixed(-2.0),
            start_energy: fixed(0.0),
        });
        book
    }

    fn furnace() -> MachineController {
        MachineController::new(
            MachineConfig {
                capacity: fixed(500.0),
                max_input: fixed(500.0),
                max_output: fixed(500.0),
                ..MachineConfig::default()
            },
            vec![0],
            vec![1, 2],
            vec![],
            None,
            BlockPos::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn add_remove_lookup() {
        let mut plant = Plant::new(book(), ShapeRuleSet::new());
        let id = plant.add_machine(furnace());
        assert_eq!(plant.machine_count(), 1);
        assert!(plant.machine(id).is_some());

        let removed = plant.remove_machine(id);
        assert!(removed.is_some());
        assert!(plant.machine(id).is_none());
        // Stale ids stay dead even after new insertions.
        plant.add_machine(furnace());
        assert!(plant.machine(id).is_none());
    }

    #[test]
    fn step_drives_all_machines_and_tags_events() {
        let world = GridWorld::new();
        let mut plant = Plant::new(book(), ShapeRuleSet::new());
        let a = plant.add_machine(furnace());
        let b = plant.add_machine(furnace());

        for id in [a, b] {
            let m = plant.machine_mut(id).unwrap();
            m.slots_mut().set(0, Some(ItemStack::new(ore(), 1)));
            m.energy_mut().try_add(fixed(100.0));
        }

        let events = plant.step(&world);
        let started: Vec<MachineId> = events
            .iter()
            .filter(|(_, e)| matches!(e, MachineEvent::CraftStarted { .. }))
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(started, vec![a, b]);
        assert_eq!(plant.tick(), 1);

        let mut completed = Vec::new();
        for _ in 0..6 {
            for (id, event) in plant.step(&world) {
                if matches!(event, MachineEvent::CraftCompleted { .. }) {
                    completed.push(id);
                }
            }
        }
        assert_eq!(completed, vec![a, b]);
        for id in [a, b] {
            let m = plant.machine(id).unwrap();
            assert_eq!(m.slots().get(1), Some(&ItemStack::new(ingot(), 1)));
        }
    }

    #[test]
    fn empty_plant_steps_quietly() {
        let world = GridWorld::new();
        let mut plant = Plant::new(RecipeBook::new(), ShapeRuleSet::new());
        assert!(plant.step(&world).is_empty());
        assert_eq!(plant.tick(), 1);
    }
}
