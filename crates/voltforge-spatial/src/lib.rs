//! Multiblock structure rules and the validator that evaluates them.
//!
//! A machine that requires a physical structure around it declares a
//! [`StructureRule`]: a list of named regions (plates, rings, columns,
//! single cells) paired with tag predicates. [`validate`] evaluates the
//! rule against a [`WorldAccessor`] snapshot anchored at the machine's
//! position. Evaluation is pure and short-circuits on the first failing
//! cell; the result is identical to evaluating every region and ANDing.
//!
//! Validation never mutates the world and raises no errors: a broken
//! structure is an ordinary `false`, and the machine layer decides what
//! to do with it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Positions and tags
// ---------------------------------------------------------------------------

/// A block position or relative offset on the 3D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise translation.
    pub fn offset(&self, other: BlockPos) -> BlockPos {
        BlockPos::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Shift along the Y axis.
    pub fn up(&self, dy: i32) -> BlockPos {
        BlockPos::new(self.x, self.y + dy, self.z)
    }
}

/// Classification label attached to a block type (e.g. casing, coil, lava).
/// Cheap to copy and compare. Names live in the content registry, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(pub u32);

/// Read-only view of the world surrounding a machine.
///
/// `None` means the cell is empty (air). The kernel never writes through
/// this interface; all block mutation belongs to the host.
pub trait WorldAccessor {
    fn tag_at(&self, pos: BlockPos) -> Option<TagId>;
}

/// Map-backed world for tests, examples, and standalone hosts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridWorld {
    cells: HashMap<BlockPos, TagId>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: BlockPos, tag: TagId) {
        self.cells.insert(pos, tag);
    }

    /// Remove a block, leaving the cell empty.
    pub fn clear(&mut self, pos: BlockPos) {
        self.cells.remove(&pos);
    }

    /// Fill a full horizontal plate centered on `center`.
    pub fn fill_rect_y(&mut self, center: BlockPos, half_x: i32, half_z: i32, tag: TagId) {
        for dx in -half_x..=half_x {
            for dz in -half_z..=half_z {
                self.set(center.offset(BlockPos::new(dx, 0, dz)), tag);
            }
        }
    }

    /// Fill only the perimeter of a horizontal plate centered on `center`.
    pub fn fill_ring_y(&mut self, center: BlockPos, half_x: i32, half_z: i32, tag: TagId) {
        for dx in -half_x..=half_x {
            for dz in -half_z..=half_z {
                if dx.abs() == half_x || dz.abs() == half_z {
                    self.set(center.offset(BlockPos::new(dx, 0, dz)), tag);
                }
            }
        }
    }
}

impl WorldAccessor for GridWorld {
    fn tag_at(&self, pos: BlockPos) -> Option<TagId> {
        self.cells.get(&pos).copied()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Condition a region's cells must satisfy. Pure and side-effect-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagPredicate {
    /// Cell must carry exactly this tag.
    Exact(TagId),
    /// Cell must carry one of these tags.
    AnyOf(Vec<TagId>),
    /// Cell must be empty.
    Empty,
    /// Cell must be empty or carry one of these tags (e.g. air-or-lava
    /// interior of a blast furnace).
    EmptyOr(Vec<TagId>),
}

impl TagPredicate {
    pub fn matches(&self, cell: Option<TagId>) -> bool {
        match self {
            TagPredicate::Exact(tag) => cell == Some(*tag),
            TagPredicate::AnyOf(tags) => cell.is_some_and(|t| tags.contains(&t)),
            TagPredicate::Empty => cell.is_none(),
            TagPredicate::EmptyOr(tags) => match cell {
                None => true,
                Some(t) => tags.contains(&t),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// A named set of offsets relative to the rule's anchor.
///
/// `RectY` and `RingY` mirror the plate/ring layers multiblock machines are
/// built from; `Column` and `At` cover interiors and single cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeRegion {
    /// Full (2*half_x+1) x (2*half_z+1) horizontal plate at `offset`.
    RectY {
        half_x: i32,
        half_z: i32,
        offset: BlockPos,
    },
    /// Perimeter of the plate only; the interior is not constrained.
    RingY {
        half_x: i32,
        half_z: i32,
        offset: BlockPos,
    },
    /// Vertical run of `height` cells starting at `offset`, going up.
    Column { offset: BlockPos, height: u32 },
    /// A single cell at `offset`.
    At { offset: BlockPos },
}

impl ShapeRegion {
    /// Enumerate the region's offsets in a fixed declared order.
    pub fn offsets(&self) -> Vec<BlockPos> {
        match self {
            ShapeRegion::RectY {
                half_x,
                half_z,
                offset,
            } => {
                let mut cells = Vec::new();
                for dx in -half_x..=*half_x {
                    for dz in -half_z..=*half_z {
                        cells.push(offset.offset(BlockPos::new(dx, 0, dz)));
                    }
                }
                cells
            }
            ShapeRegion::RingY {
                half_x,
                half_z,
                offset,
            } => {
                let mut cells = Vec::new();
                for dx in -half_x..=*half_x {
                    for dz in -half_z..=*half_z {
                        if dx.abs() == *half_x || dz.abs() == *half_z {
                            cells.push(offset.offset(BlockPos::new(dx, 0, dz)));
                        }
                    }
                }
                cells
            }
            ShapeRegion::Column { offset, height } => {
                (0..*height as i32).map(|dy| offset.up(dy)).collect()
            }
            ShapeRegion::At { offset } => vec![*offset],
        }
    }

    fn is_degenerate(&self) -> bool {
        match self {
            ShapeRegion::RectY { half_x, half_z, .. }
            | ShapeRegion::RingY { half_x, half_z, .. } => *half_x < 0 || *half_z < 0,
            ShapeRegion::Column { height, .. } => *height == 0,
            ShapeRegion::At { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StructureRuleError {
    #[error("rule '{rule}' region {index} has no cells")]
    DegenerateRegion { rule: String, index: usize },
}

/// A complete multiblock shape: regions evaluated in declared order, all of
/// which must pass. Static per machine type, defined once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRule {
    pub name: String,
    pub regions: Vec<(ShapeRegion, TagPredicate)>,
}

impl StructureRule {
    pub fn new(
        name: impl Into<String>,
        regions: Vec<(ShapeRegion, TagPredicate)>,
    ) -> Result<Self, StructureRuleError> {
        let name = name.into();
        for (index, (region, _)) in regions.iter().enumerate() {
            if region.is_degenerate() {
                return Err(StructureRuleError::DegenerateRegion {
                    rule: name,
                    index,
                });
            }
        }
        Ok(Self { name, regions })
    }
}

/// Evaluate a rule against the world, anchored at `anchor`.
///
/// Short-circuits on the first failing cell. Re-running over an unchanged
/// world always yields the same result.
pub fn validate(world: &impl WorldAccessor, anchor: BlockPos, rule: &StructureRule) -> bool {
    first_failure(world, anchor, rule).is_none()
}

/// Like [`validate`] but reports which region and cell failed first, for
/// telemetry and structure-assembly feedback.
pub fn first_failure(
    world: &impl WorldAccessor,
    anchor: BlockPos,
    rule: &StructureRule,
) -> Option<(usize, BlockPos)> {
    for (index, (region, predicate)) in rule.regions.iter().enumerate() {
        for offset in region.offsets() {
            let pos = anchor.offset(offset);
            if !predicate.matches(world.tag_at(pos)) {
                return Some((index, pos));
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Identifies a registered structure rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeRuleId(pub u32);

/// Registration-order store of structure rules with name lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeRuleSet {
    rules: Vec<StructureRule>,
}

impl ShapeRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: StructureRule) -> ShapeRuleId {
        let id = ShapeRuleId(self.rules.len() as u32);
        self.rules.push(rule);
        id
    }

    pub fn get(&self, id: ShapeRuleId) -> Option<&StructureRule> {
        self.rules.get(id.0 as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<ShapeRuleId> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .map(|i| ShapeRuleId(i as u32))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
