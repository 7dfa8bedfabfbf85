use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a live machine instance inside a [`crate::plant::Plant`].
    pub struct MachineId;
}

/// Identifies an item type in the content registry. Cheap to copy and
/// compare; names live in the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Identifies a recipe by its registration order in the [`crate::recipe::RecipeBook`].
/// Stable across save/load as long as the content set is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

pub use voltforge_spatial::{ShapeRuleId, TagId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_and_hash() {
        use std::collections::HashMap;
        assert_eq!(ItemTypeId(3), ItemTypeId(3));
        assert_ne!(RecipeId(0), RecipeId(1));
        let mut map = HashMap::new();
        map.insert(ItemTypeId(0), "iron_ingot");
        assert_eq!(map[&ItemTypeId(0)], "iron_ingot");
    }
}
