//! Live-preview synchronization engine.
//!
//! The engine lets a host load an external page into one or more sandboxed
//! rendering surfaces, layer non-destructive style overrides on top, and
//! inspect the result across simulated devices and a before/after pair.
//!
//! ```text
//!   fetch collaborator ─▶ SurfaceManager ─▶ StylePipeline ─▶ surface head
//!        { html, url }      (ledger,          (ordered          (one
//!                            asset repair)     layers)           element)
//!                               │
//!                               ▼
//!                           StyleProbe ──▶ StyleReport ──▶ ColorRemapper
//!                           (read-only)      (palette)      (greedy assign,
//!                                                            feeds pipeline)
//! ```
//!
//! Everything runs single-threaded on the host's UI loop. Deferred work —
//! camera commits, staggered asset repair, deferred extraction, scroll
//! mirroring, attach retries — lives as data on a [`timeline::Timeline`]
//! the host drives with frame ticks and clock advances. The [`engine::Engine`]
//! store owns all state explicitly; there are no ambient globals.

pub mod camera;
pub mod config;
pub mod engine;
pub mod extract;
pub mod remap;
pub mod session;
pub mod style;
pub mod surface;
pub mod sync;
pub mod timeline;

pub use camera::{CameraState, ViewportCamera};
pub use config::EngineConfig;
pub use engine::{Engine, EngineError, PageContent, PreferenceStore};
pub use session::ComparisonSession;
pub use style::StyleSources;
pub use surface::{MemorySurface, Snapshot, SnapshotNode, SnapshotRule, SurfaceManager};
pub use sync::{ScrollSync, SyncPhase};
pub use timeline::{Task, TaskHandle, Timeline};
