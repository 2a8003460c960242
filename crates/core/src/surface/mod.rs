pub mod assets;
pub mod manager;
pub mod memory;

pub use manager::{PageContent, SurfaceManager, SurfaceSlot};
pub use memory::{MemorySurface, Snapshot, SnapshotNode, SnapshotRule};
