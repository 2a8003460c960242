//! The coordinator store.
//!
//! `Engine` owns every piece of engine state explicitly — camera, surface
//! slots, style sources, the persistent color mapping, the comparison
//! session, and the task timeline — and exposes the operations the UI chrome
//! calls. Components receive what they need by reference; nothing lives in
//! ambient globals.

use restyle_protocol::{
    ColorMapping, DeviceProfile, Point, Rgb, StyleReport, SurfaceHandle, SurfaceRole,
    TypographySettings,
};
use thiserror::Error;

use crate::camera::{CameraState, ViewportCamera};
use crate::config::EngineConfig;
use crate::extract;
use crate::remap;
use crate::session::ComparisonSession;
use crate::style::{self, StyleSources};
use crate::surface::SurfaceManager;
use crate::sync::{ScrollSync, SyncPhase};
use crate::timeline::{Task, Timeline};

pub use crate::surface::PageContent;

/// Preference key the color mapping persists under.
const MAPPING_KEY: &str = "restyle.color-mapping";

/// Preference key the device-profile catalog persists under.
const DEVICES_KEY: &str = "restyle.devices";

/// Opaque key-value persistence collaborator.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), String>;
}

/// Engine-level failures. Everything here is degradable or caller-visible;
/// nothing aborts the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Human-readable load failure from the fetch collaborator.
    #[error("page load failed: {0}")]
    Load(String),
    #[error("no page content loaded")]
    NoContent,
    #[error("unknown surface slot {0}")]
    UnknownSlot(usize),
    /// The surface cannot be introspected; the feature narrows to other
    /// surfaces instead of failing the operation chain.
    #[error("surface {0} is cross-origin restricted")]
    RestrictedSurface(usize),
}

/// The live-preview engine over one host surface type.
pub struct Engine<H: SurfaceHandle> {
    config: EngineConfig,
    camera: ViewportCamera,
    manager: SurfaceManager<H>,
    sources: StyleSources,
    mapping: ColorMapping,
    /// css rendition of the last remap's stylesheet rewrites — the
    /// color-remap style layer.
    remap_css: String,
    last_report: Option<StyleReport>,
    /// Device catalog: the built-in presets plus user-defined profiles.
    devices: Vec<DeviceProfile>,
    session: ComparisonSession,
    sync: ScrollSync,
    timeline: Timeline,
}

impl<H: SurfaceHandle> Engine<H> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            camera: ViewportCamera::new(),
            manager: SurfaceManager::new(),
            sources: StyleSources::default(),
            mapping: ColorMapping::new(),
            remap_css: String::new(),
            last_report: None,
            devices: DeviceProfile::builtin(),
            session: ComparisonSession::new(),
            sync: ScrollSync::new(),
            timeline: Timeline::new(),
        }
    }

    // --- Surfaces ---

    /// Register a new surface. If content is already loaded it is delivered
    /// (once) right away.
    pub fn add_surface(&mut self, handle: H, role: SurfaceRole, device: DeviceProfile) -> usize {
        let slot = self.manager.add_surface(handle, role, device);
        self.deliver();
        slot
    }

    pub fn surface(&self, slot: usize) -> Option<&H> {
        self.manager.slot(slot).map(|s| &s.handle)
    }

    pub fn surface_mut(&mut self, slot: usize) -> Option<&mut H> {
        self.manager.slot_mut(slot).map(|s| &mut s.handle)
    }

    pub fn surface_count(&self) -> usize {
        self.manager.len()
    }

    /// Whether a surface has received its content for the current load.
    pub fn is_initialized(&self, slot: usize) -> bool {
        self.manager.slot(slot).is_some_and(|s| s.initialized)
    }

    /// Switch a surface's simulated device. Content is already in place, so
    /// the ledger guarantees this only re-runs style injection — never a
    /// second content write.
    pub fn select_device(&mut self, slot: usize, device: DeviceProfile) -> Result<(), EngineError> {
        let Some(s) = self.manager.slot_mut(slot) else {
            return Err(EngineError::UnknownSlot(slot));
        };
        s.device = device;
        self.inject_slot(slot);
        Ok(())
    }

    /// The selectable device catalog.
    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    /// Register a user-defined profile (replacing any with the same id).
    pub fn add_device(&mut self, device: DeviceProfile) {
        self.devices.retain(|d| d.id != device.id);
        self.devices.push(device);
    }

    // --- Content ---

    /// Accept the fetch collaborator's result: deliver content on success,
    /// propagate its human-readable message on failure.
    pub fn load_result(&mut self, result: Result<PageContent, String>) -> Result<(), EngineError> {
        match result {
            Ok(content) => {
                self.load_page(content.html, &content.url);
                Ok(())
            }
            Err(message) => Err(EngineError::Load(message)),
        }
    }

    /// Deliver freshly fetched markup. A changed URL tears down surface
    /// state: the ledger clears, pending surface-bound work is cancelled,
    /// and comparison pairs detach (to re-attach after the reload).
    pub fn load_page(&mut self, html: impl Into<String>, url: &str) {
        let url_changed = self
            .manager
            .content()
            .is_none_or(|current| current.url != url);
        if url_changed {
            self.timeline.cancel_matching(|task| {
                matches!(
                    task,
                    Task::RepairAssets { .. } | Task::Reinject { .. } | Task::Extract { .. }
                )
            });
            self.sync.detach_all(&mut self.timeline);
            self.last_report = None;
        }
        self.manager.set_content(html, url);
        self.deliver();
    }

    /// Push content into every uninitialized surface and style it.
    fn deliver(&mut self) {
        let initialized = self.manager.sync_surfaces(
            &self.config.proxy_base,
            &self.config.repair_delays_ms,
            &mut self.timeline,
        );
        for slot in initialized {
            self.inject_slot(slot);
        }
        if self.session.active {
            self.begin_sync();
        }
    }

    // --- Camera ---

    pub fn camera(&self) -> CameraState {
        self.camera.committed()
    }

    /// The un-committed input buffer (what the canvas shows mid-gesture).
    pub fn camera_live(&self) -> CameraState {
        self.camera.local()
    }

    pub fn begin_interaction(&mut self) {
        self.camera.begin_interaction();
    }

    pub fn end_interaction(&mut self) {
        self.camera.end_interaction();
        self.timeline.cancel_matching(|task| *task == Task::CommitCamera);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.camera.set_zoom(zoom);
        self.queue_camera_commit();
    }

    pub fn zoom_at(&mut self, cursor: Point, delta_factor: f64) {
        self.camera.zoom_at(cursor, delta_factor);
        self.queue_camera_commit();
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.camera.pan_by(delta);
        self.queue_camera_commit();
    }

    /// At most one commit per frame, however many input events arrive.
    fn queue_camera_commit(&mut self) {
        if !self.timeline.has_pending(|task| *task == Task::CommitCamera) {
            self.timeline.schedule_frame(Task::CommitCamera);
        }
    }

    // --- Style sources ---

    pub fn set_custom_css(&mut self, css: impl Into<String>) {
        self.sources.custom_css = css.into();
        self.reinject_all();
    }

    pub fn set_typography(&mut self, typography: TypographySettings) {
        self.sources.typography = typography;
        self.reinject_all();
    }

    pub fn set_active_effects(&mut self, ids: Vec<String>) {
        self.sources.active_effects = ids;
        self.reinject_all();
    }

    pub fn style_sources(&self) -> &StyleSources {
        &self.sources
    }

    /// Re-run the injection pipeline on every live surface.
    pub fn reinject_all(&mut self) {
        for slot in 0..self.manager.len() {
            self.inject_slot(slot);
        }
    }

    fn inject_slot(&mut self, index: usize) {
        let layers = style::compose_layers(&self.sources, &self.remap_css);
        let Some(slot) = self.manager.slot_mut(index) else {
            return;
        };
        // Injection only ever follows content delivery.
        if !slot.initialized {
            return;
        }
        if slot.handle.is_restricted() {
            if !slot.restricted {
                slot.restricted = true;
                tracing::warn!(slot = index, "surface is cross-origin restricted");
            }
        }
        style::inject(&mut slot.handle, slot.role, slot.restricted, &layers);
    }

    // --- Comparison ---

    pub fn session(&self) -> &ComparisonSession {
        &self.session
    }

    pub fn set_split(&mut self, ratio: f64) {
        self.session.set_split(ratio);
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.session.sync_enabled = enabled;
    }

    /// Scroll-sync phase of a comparison pair, for chrome display.
    pub fn sync_phase(&self, pair: usize) -> Option<SyncPhase> {
        self.sync.phase(pair)
    }

    pub fn toggle_comparison(&mut self, active: bool) {
        if self.session.active == active {
            return;
        }
        self.session.active = active;
        if active {
            self.deliver();
            self.begin_sync();
        } else {
            self.sync.detach_all(&mut self.timeline);
        }
    }

    /// Pair modified surfaces with original surfaces in slot order.
    fn comparison_pairs(&self) -> Vec<(usize, usize)> {
        let modified = self
            .manager
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == SurfaceRole::Modified)
            .map(|(i, _)| i);
        let original: Vec<usize> = self
            .manager
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == SurfaceRole::Original)
            .map(|(i, _)| i)
            .collect();
        modified.zip(original).collect()
    }

    fn begin_sync(&mut self) {
        let pairs = self.comparison_pairs();
        let delays = if pairs.len() <= 1 {
            &self.config.attach_delays_pair_ms
        } else {
            &self.config.attach_delays_multi_ms
        };
        self.sync
            .begin(pairs, &self.manager, delays, &mut self.timeline);
    }

    // --- Extraction & remapping ---

    /// Schedule the deferred extraction pass for a surface.
    pub fn request_extract(&mut self, slot: usize) -> Result<(), EngineError> {
        if self.manager.slot(slot).is_none() {
            return Err(EngineError::UnknownSlot(slot));
        }
        if !self.is_initialized(slot) {
            return Err(EngineError::NoContent);
        }
        self.timeline
            .schedule_after(self.config.extract_delay_ms, Task::Extract { slot });
        Ok(())
    }

    /// Run the extraction pass immediately and keep the report.
    pub fn extract_now(&mut self, slot: usize) -> Result<StyleReport, EngineError> {
        let Some(s) = self.manager.slot_mut(slot) else {
            return Err(EngineError::UnknownSlot(slot));
        };
        if !s.initialized {
            return Err(EngineError::NoContent);
        }
        if s.handle.is_restricted() {
            s.restricted = true;
            return Err(EngineError::RestrictedSurface(slot));
        }
        let report = extract::extract(&s.handle);
        self.last_report = Some(report.clone());
        Ok(report)
    }

    pub fn report(&self) -> Option<&StyleReport> {
        self.last_report.as_ref()
    }

    pub fn mapping(&self) -> &ColorMapping {
        &self.mapping
    }

    /// Assign `selected` source colors onto `targets` and apply the merged
    /// mapping to every modified surface. An empty target palette falls back
    /// to the built-in set — the remap flow never blocks on a missing
    /// palette source.
    pub fn apply_mapping(&mut self, selected: &[Rgb], targets: &[Rgb]) -> usize {
        let targets = if targets.is_empty() {
            tracing::warn!("replacement palette unavailable, using built-in fallback");
            remap::BUILTIN_PALETTE
        } else {
            targets
        };
        let pairs = remap::assign(selected, targets);
        self.mapping.merge(pairs);
        self.apply_current_mapping()
    }

    /// Re-apply the persistent mapping (idempotent per surface).
    fn apply_current_mapping(&mut self) -> usize {
        let mut applied = 0;
        let mut remap_css = String::new();
        for index in 0..self.manager.len() {
            let Some(slot) = self.manager.slot_mut(index) else {
                continue;
            };
            if slot.role != SurfaceRole::Modified || !slot.initialized {
                continue;
            }
            if slot.handle.is_restricted() {
                slot.restricted = true;
                continue;
            }
            let outcome = remap::apply(&mut slot.handle, &self.mapping);
            if remap_css.is_empty() {
                remap_css = outcome.css;
            }
            applied += 1;
        }
        self.remap_css = remap_css;
        self.reinject_all();
        applied
    }

    /// Clear the mapping and restore pristine visuals by re-delivering
    /// content to modified surfaces (their ledger is reset, so the next
    /// delivery is a fresh write with no override residue).
    pub fn reset_mapping(&mut self) {
        self.mapping.clear();
        self.remap_css.clear();
        self.manager.reset_modified_ledger();
        self.timeline.cancel_matching(|task| {
            matches!(task, Task::RepairAssets { .. } | Task::Reinject { .. })
        });
        self.deliver();
    }

    // --- Persistence collaborator ---

    /// Persist the mapping. Write failures are logged and swallowed — never
    /// a blocking error.
    pub fn persist_mapping(&self, store: &mut dyn PreferenceStore) {
        match serde_json::to_string(&self.mapping) {
            Ok(json) => {
                if let Err(err) = store.set(MAPPING_KEY, &json) {
                    tracing::warn!(%err, "preference write failed");
                }
            }
            Err(err) => tracing::warn!(%err, "mapping serialization failed"),
        }
    }

    /// Restore a previously persisted mapping, if present and readable.
    pub fn restore_mapping(&mut self, store: &dyn PreferenceStore) {
        if let Some(json) = store.get(MAPPING_KEY) {
            match serde_json::from_str(&json) {
                Ok(mapping) => self.mapping = mapping,
                Err(err) => tracing::warn!(%err, "stored mapping unreadable, ignoring"),
            }
        }
    }

    /// Persist the device catalog. Same non-blocking contract as the
    /// mapping.
    pub fn persist_devices(&self, store: &mut dyn PreferenceStore) {
        match serde_json::to_string(&self.devices) {
            Ok(json) => {
                if let Err(err) = store.set(DEVICES_KEY, &json) {
                    tracing::warn!(%err, "preference write failed");
                }
            }
            Err(err) => tracing::warn!(%err, "device catalog serialization failed"),
        }
    }

    /// Restore a persisted device catalog, keeping the built-ins when none
    /// is stored.
    pub fn restore_devices(&mut self, store: &dyn PreferenceStore) {
        if let Some(json) = store.get(DEVICES_KEY) {
            match serde_json::from_str(&json) {
                Ok(devices) => self.devices = devices,
                Err(err) => tracing::warn!(%err, "stored device catalog unreadable, ignoring"),
            }
        }
    }

    // --- Host notifications ---

    /// The host saw DOM-ready on a surface: repair and re-inject.
    pub fn notify_dom_ready(&mut self, slot: usize) {
        self.timeline.schedule_frame(Task::RepairAssets { slot });
        self.timeline.schedule_frame(Task::Reinject { slot });
    }

    /// The host saw the load event on a surface.
    pub fn notify_loaded(&mut self, slot: usize) {
        self.timeline.schedule_frame(Task::RepairAssets { slot });
        self.timeline.schedule_frame(Task::Reinject { slot });
        let delays = if self.sync.pairs().len() <= 1 {
            self.config.attach_delays_pair_ms.clone()
        } else {
            self.config.attach_delays_multi_ms.clone()
        };
        self.sync
            .on_surface_loaded(slot, &self.manager, &delays, &mut self.timeline);
    }

    /// Structural change (new nodes, reference attributes) on a surface.
    pub fn notify_mutation(&mut self, slot: usize) {
        self.manager
            .notify_mutation(slot, self.config.mutation_debounce_ms, &mut self.timeline);
    }

    /// Scroll input on a surface.
    pub fn notify_scroll(&mut self, slot: usize) {
        if self.session.active && self.session.sync_enabled {
            self.sync.on_scroll(slot, &mut self.timeline);
        }
    }

    // --- Pumping ---

    /// Animation-frame tick: run everything frame-scheduled.
    pub fn tick_frame(&mut self) {
        for task in self.timeline.take_frame_due() {
            self.dispatch(task);
        }
    }

    /// Clock advance: run every timer now due.
    pub fn advance(&mut self, now_ms: u64) {
        for task in self.timeline.advance(now_ms) {
            self.dispatch(task);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.timeline.is_idle()
    }

    fn dispatch(&mut self, task: Task) {
        match task {
            Task::CommitCamera => self.camera.commit(),
            Task::RepairAssets { slot } => {
                self.manager.clear_pending_mutation(slot);
                self.manager.repair_assets(slot, &self.config.proxy_base);
            }
            Task::Reinject { slot } => self.inject_slot(slot),
            Task::Extract { slot } => {
                if let Err(err) = self.extract_now(slot) {
                    tracing::warn!(%err, "deferred extraction skipped");
                }
            }
            Task::SyncScroll { pair } => self.sync.run_sync(pair, &mut self.manager),
            Task::AttachRetry { pair, .. } => {
                let delays = if self.sync.pairs().len() <= 1 {
                    &self.config.attach_delays_pair_ms
                } else {
                    &self.config.attach_delays_multi_ms
                };
                self.sync
                    .try_attach(pair, &self.manager, delays, &mut self.timeline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::memory::MemorySurface;

    fn engine_with_surface() -> Engine<MemorySurface> {
        let mut engine = Engine::new(EngineConfig::default());
        engine.add_surface(
            MemorySurface::empty(),
            SurfaceRole::Modified,
            DeviceProfile::desktop(),
        );
        engine.load_page("<html>{{PROXY_BASE}}</html>", "https://example.com/");
        engine
    }

    #[test]
    fn camera_commit_coalesces_per_frame() {
        let mut engine = engine_with_surface();
        engine.begin_interaction();
        engine.pan_by(Point::new(5.0, 0.0));
        engine.pan_by(Point::new(5.0, 0.0));
        engine.zoom_at(Point::default(), 1.5);
        assert_eq!(engine.camera(), CameraState::default());

        engine.tick_frame();
        assert_eq!(engine.camera(), engine.camera_live());
    }

    #[test]
    fn end_interaction_commits_and_cancels_the_frame_task() {
        let mut engine = engine_with_surface();
        engine.begin_interaction();
        engine.pan_by(Point::new(9.0, 9.0));
        engine.end_interaction();
        assert_eq!(engine.camera().pan, Point::new(9.0, 9.0));
        assert!(!engine
            .timeline
            .has_pending(|task| *task == Task::CommitCamera));
    }

    #[test]
    fn load_failure_propagates_the_collaborator_message() {
        let mut engine: Engine<MemorySurface> = Engine::new(EngineConfig::default());
        let err = engine
            .load_result(Err("The website may be unreachable or blocked.".into()))
            .expect_err("load error");
        assert!(err.to_string().contains("unreachable or blocked"));
    }

    #[test]
    fn extract_before_content_is_rejected() {
        let mut engine: Engine<MemorySurface> = Engine::new(EngineConfig::default());
        engine.add_surface(
            MemorySurface::empty().with_loaded(false),
            SurfaceRole::Modified,
            DeviceProfile::desktop(),
        );
        assert!(matches!(
            engine.extract_now(0),
            Err(EngineError::NoContent)
        ));
        assert!(matches!(
            engine.extract_now(7),
            Err(EngineError::UnknownSlot(7))
        ));
    }

    #[test]
    fn restricted_surface_narrows_but_does_not_fail_others() {
        let mut engine: Engine<MemorySurface> = Engine::new(EngineConfig::default());
        engine.add_surface(
            MemorySurface::empty().restricted(),
            SurfaceRole::Modified,
            DeviceProfile::desktop(),
        );
        engine.add_surface(
            MemorySurface::empty(),
            SurfaceRole::Modified,
            DeviceProfile::mobile(),
        );
        engine.load_page("<html></html>", "https://example.com/");

        assert!(matches!(
            engine.extract_now(0),
            Err(EngineError::RestrictedSurface(0))
        ));
        assert!(engine.extract_now(1).is_ok());
    }

    struct FailingStore;

    impl PreferenceStore for FailingStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), String> {
            Err("quota exceeded".into())
        }
    }

    #[test]
    fn device_catalog_replaces_by_id() {
        let mut engine: Engine<MemorySurface> = Engine::new(EngineConfig::default());
        assert_eq!(engine.devices().len(), 4);
        let custom = DeviceProfile::custom("kiosk", 1080, 1920).expect("profile");
        engine.add_device(custom.clone());
        engine.add_device(custom);
        assert_eq!(engine.devices().len(), 5);
        assert_eq!(engine.devices().last().map(|d| d.id.as_str()), Some("kiosk"));
    }

    #[test]
    fn persistence_failure_never_surfaces() {
        let engine = engine_with_surface();
        // Must not panic or error.
        engine.persist_mapping(&mut FailingStore);
    }

    #[test]
    fn mapping_roundtrips_through_a_store() {
        struct MapStore(std::collections::HashMap<String, String>);
        impl PreferenceStore for MapStore {
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key).cloned()
            }
            fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
                self.0.insert(key.to_owned(), value.to_owned());
                Ok(())
            }
        }

        let mut engine = engine_with_surface();
        engine.apply_mapping(&[Rgb::new(0, 0, 0)], &[Rgb::new(10, 10, 10)]);
        let mut store = MapStore(std::collections::HashMap::new());
        engine.persist_mapping(&mut store);

        let mut fresh: Engine<MemorySurface> = Engine::new(EngineConfig::default());
        fresh.restore_mapping(&store);
        assert_eq!(fresh.mapping(), engine.mapping());
    }
}
