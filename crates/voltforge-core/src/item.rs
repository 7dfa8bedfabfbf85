//! Item stacks, the fixed-size slot inventory, and slot role layouts.
//!
//! The inventory is a flat array of optional stacks with a shared max stack
//! size. Roles (input/output/fuel) are index arrays over that array,
//! validated so that no two roles alias the same slot. Change tracking
//! mirrors the host pattern of only re-matching recipes after the inventory
//! actually changed.

use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// A stack of identical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemTypeId,
    pub count: u32,
}

impl ItemStack {
    pub fn new(item: ItemTypeId, count: u32) -> Self {
        Self { item, count }
    }
}

// ---------------------------------------------------------------------------
// Slot layout
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("slot {0} is assigned to more than one role")]
    AliasedSlot(usize),
    #[error("slot {slot} is out of bounds for an inventory of {len} slots")]
    OutOfBounds { slot: usize, len: usize },
}

/// Role assignment over an inventory's slot indices. Fixed per machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    fuel: Vec<usize>,
}

impl SlotLayout {
    /// Build a layout, rejecting aliased or out-of-range indices.
    pub fn new(
        slot_count: usize,
        inputs: Vec<usize>,
        outputs: Vec<usize>,
        fuel: Vec<usize>,
    ) -> Result<Self, LayoutError> {
        let mut seen = vec![false; slot_count];
        for &slot in inputs.iter().chain(&outputs).chain(&fuel) {
            if slot >= slot_count {
                return Err(LayoutError::OutOfBounds {
                    slot,
                    len: slot_count,
                });
            }
            if seen[slot] {
                return Err(LayoutError::AliasedSlot(slot));
            }
            seen[slot] = true;
        }
        Ok(Self {
            inputs,
            outputs,
            fuel,
        })
    }

    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    pub fn fuel(&self) -> &[usize] {
        &self.fuel
    }
}

// ---------------------------------------------------------------------------
// Slot inventory
// ---------------------------------------------------------------------------

/// Fixed-size inventory with a shared per-slot stack limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInventory {
    slots: Vec<Option<ItemStack>>,
    max_stack: u32,
    changed: bool,
}

impl SlotInventory {
    pub fn new(slot_count: usize, max_stack: u32) -> Self {
        Self {
            slots: vec![None; slot_count],
            max_stack,
            changed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Replace a slot's contents. Counts above `max_stack` are truncated.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) {
        if slot >= self.slots.len() {
            return;
        }
        self.slots[slot] = stack
            .map(|s| ItemStack::new(s.item, s.count.min(self.max_stack)))
            .filter(|s| s.count > 0);
        self.changed = true;
    }

    /// Remove up to `amount` items from a slot; the slot empties at zero.
    /// Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn shrink(&mut self, slot: usize, amount: u32) -> u32 {
        let Some(Some(stack)) = self.slots.get_mut(slot) else {
            return 0;
        };
        let removed = amount.min(stack.count);
        stack.count -= removed;
        if stack.count == 0 {
            self.slots[slot] = None;
        }
        if removed > 0 {
            self.changed = true;
        }
        removed
    }

    /// Whether the whole stack would fit into the slot (empty, or same item
    /// with room under the stack limit).
    pub fn can_accept(&self, slot: usize, stack: ItemStack) -> bool {
        match self.slots.get(slot) {
            Some(None) => stack.count <= self.max_stack,
            Some(Some(existing)) => {
                existing.item == stack.item && existing.count + stack.count <= self.max_stack
            }
            None => false,
        }
    }

    /// Merge a stack into a slot up to the stack limit. Returns the leftover
    /// count that did not fit.
    #[must_use = "leftover count indicates items that did not fit"]
    pub fn insert_at(&mut self, slot: usize, stack: ItemStack) -> u32 {
        let Some(cell) = self.slots.get_mut(slot) else {
            return stack.count;
        };
        match cell {
            None => {
                let placed = stack.count.min(self.max_stack);
                if placed > 0 {
                    *cell = Some(ItemStack::new(stack.item, placed));
                    self.changed = true;
                }
                stack.count - placed
            }
            Some(existing) if existing.item == stack.item => {
                let placed = stack.count.min(self.max_stack - existing.count);
                existing.count += placed;
                if placed > 0 {
                    self.changed = true;
                }
                stack.count - placed
            }
            Some(_) => stack.count,
        }
    }

    /// Total count of an item type across the given slot indices.
    pub fn count_of(&self, item: ItemTypeId, slots: &[usize]) -> u32 {
        slots
            .iter()
            .filter_map(|&i| self.get(i))
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }

    /// Whether any mutation happened since the last [`Self::reset_changed`].
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn reset_changed(&mut self) {
        self.changed = false;
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn iron() -> ItemTypeId {
        ItemTypeId(0)
    }
    fn copper() -> ItemTypeId {
        ItemTypeId(1)
    }

    // -----------------------------------------------------------------------
    // Layout validation
    // -----------------------------------------------------------------------

    #[test]
    fn layout_accepts_disjoint_roles() {
        let layout = SlotLayout::new(5, vec![0, 1], vec![2, 3], vec![4]).unwrap();
        assert_eq!(layout.inputs(), &[0, 1]);
        assert_eq!(layout.outputs(), &[2, 3]);
        assert_eq!(layout.fuel(), &[4]);
    }

    #[test]
    fn layout_rejects_aliased_slot() {
        let err = SlotLayout::new(4, vec![0, 1], vec![1, 2], vec![]);
        assert!(matches!(err, Err(LayoutError::AliasedSlot(1))));
    }

    #[test]
    fn layout_rejects_alias_within_role() {
        let err = SlotLayout::new(4, vec![0, 0], vec![], vec![]);
        assert!(matches!(err, Err(LayoutError::AliasedSlot(0))));
    }

    #[test]
    fn layout_rejects_out_of_bounds() {
        let err = SlotLayout::new(2, vec![0], vec![5], vec![]);
        assert!(matches!(
            err,
            Err(LayoutError::OutOfBounds { slot: 5, len: 2 })
        ));
    }

    // -----------------------------------------------------------------------
    // Inventory operations
    // -----------------------------------------------------------------------

    #[test]
    fn set_get_shrink() {
        let mut inv = SlotInventory::new(3, 64);
        inv.set(0, Some(ItemStack::new(iron(), 10)));
        assert_eq!(inv.get(0), Some(&ItemStack::new(iron(), 10)));

        assert_eq!(inv.shrink(0, 4), 4);
        assert_eq!(inv.get(0).map(|s| s.count), Some(6));

        // Shrinking past zero empties the slot.
        assert_eq!(inv.shrink(0, 10), 6);
        assert!(inv.get(0).is_none());
    }

    #[test]
    fn shrink_empty_slot_removes_nothing() {
        let mut inv = SlotInventory::new(2, 64);
        assert_eq!(inv.shrink(1, 5), 0);
        assert_eq!(inv.shrink(99, 5), 0);
    }

    #[test]
    fn set_truncates_to_max_stack() {
        let mut inv = SlotInventory::new(1, 16);
        inv.set(0, Some(ItemStack::new(iron(), 100)));
        assert_eq!(inv.get(0).map(|s| s.count), Some(16));
    }

    #[test]
    fn insert_into_empty_slot() {
        let mut inv = SlotInventory::new(2, 64);
        assert_eq!(inv.insert_at(0, ItemStack::new(iron(), 30)), 0);
        assert_eq!(inv.get(0), Some(&ItemStack::new(iron(), 30)));
    }

    #[test]
    fn insert_merges_same_item() {
        let mut inv = SlotInventory::new(1, 64);
        let _ = inv.insert_at(0, ItemStack::new(iron(), 60));
        // Only 4 of 10 fit.
        assert_eq!(inv.insert_at(0, ItemStack::new(iron(), 10)), 6);
        assert_eq!(inv.get(0).map(|s| s.count), Some(64));
    }

    #[test]
    fn insert_rejects_different_item() {
        let mut inv = SlotInventory::new(1, 64);
        let _ = inv.insert_at(0, ItemStack::new(iron(), 1));
        assert_eq!(inv.insert_at(0, ItemStack::new(copper(), 5)), 5);
        assert_eq!(inv.get(0).map(|s| s.item), Some(iron()));
    }

    #[test]
    fn can_accept_respects_stack_limit() {
        let mut inv = SlotInventory::new(2, 10);
        assert!(inv.can_accept(0, ItemStack::new(iron(), 10)));
        assert!(!inv.can_accept(0, ItemStack::new(iron(), 11)));

        inv.set(0, Some(ItemStack::new(iron(), 8)));
        assert!(inv.can_accept(0, ItemStack::new(iron(), 2)));
        assert!(!inv.can_accept(0, ItemStack::new(iron(), 3)));
        assert!(!inv.can_accept(0, ItemStack::new(copper(), 1)));
    }

    #[test]
    fn count_of_sums_matching_slots() {
        let mut inv = SlotInventory::new(4, 64);
        inv.set(0, Some(ItemStack::new(iron(), 5)));
        inv.set(1, Some(ItemStack::new(copper(), 3)));
        inv.set(2, Some(ItemStack::new(iron(), 7)));
        assert_eq!(inv.count_of(iron(), &[0, 1, 2]), 12);
        assert_eq!(inv.count_of(iron(), &[0]), 5);
        assert_eq!(inv.count_of(copper(), &[0, 2]), 0);
    }

    #[test]
    fn change_tracking() {
        let mut inv = SlotInventory::new(2, 64);
        // Fresh inventories start dirty so the first tick matches recipes.
        assert!(inv.has_changed());
        inv.reset_changed();
        assert!(!inv.has_changed());

        inv.set(0, Some(ItemStack::new(iron(), 1)));
        assert!(inv.has_changed());
        inv.reset_changed();

        // A no-op shrink does not mark the inventory changed.
        assert_eq!(inv.shrink(1, 5), 0);
        assert!(!inv.has_changed());

        assert_eq!(inv.shrink(0, 1), 1);
        assert!(inv.has_changed());
    }
}
