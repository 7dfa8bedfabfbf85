//! Binary snapshot support for the plant.
//!
//! Snapshots are `bitcode` blobs with a versioned header validated before
//! the payload is trusted. Machine ids survive the round-trip because the
//! slotmap is serialized whole. The recipe book and shape rule set are
//! content, not state: they are not stored in the snapshot and the caller
//! supplies them again at restore time.

use crate::fixed::Ticks;
use crate::id::MachineId;
use crate::machine::MachineController;
use crate::plant::Plant;
use crate::recipe::RecipeBook;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use voltforge_spatial::ShapeRuleSet;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a plant snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5F0C_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot, checked before the payload is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Plant tick at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

/// The serializable portion of a plant: machine state and the tick counter.
#[derive(Debug, Serialize, Deserialize)]
struct PlantSnapshot {
    header: SnapshotHeader,
    machines: SlotMap<MachineId, MachineController>,
}

/// Serialize a plant to a binary blob.
pub fn snapshot(plant: &Plant) -> Result<Vec<u8>, SerializeError> {
    let (machines, tick) = plant.parts();
    let snapshot = PlantSnapshot {
        header: SnapshotHeader::new(tick),
        machines: machines.clone(),
    };
    bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Restore a plant from a binary blob, re-attaching the content tables.
///
/// The header is validated before any state is accepted; a snapshot from a
/// newer build fails with [`DeserializeError::FutureVersion`] rather than
/// decoding garbage.
pub fn restore(
    data: &[u8],
    book: RecipeBook,
    shapes: ShapeRuleSet,
) -> Result<Plant, DeserializeError> {
    let snapshot: PlantSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    Ok(Plant::from_parts(
        snapshot.machines,
        book,
        shapes,
        snapshot.header.tick,
    ))
}

// ===========================================================================
// Tests
// ===========================================================================
