//! Rendering-surface lifecycle.
//!
//! The manager owns the set of live surfaces and the initialization ledger
//! that guarantees each surface receives its content exactly once per load.
//! Everything else — device switches, comparison toggles, style changes —
//! only ever re-runs style injection, which is what keeps those interactions
//! flicker-free.

use restyle_protocol::{DeviceProfile, SurfaceHandle, SurfaceRole};
use url::Url;

use crate::surface::assets;
use crate::timeline::{Task, TaskHandle, Timeline};

/// Markup plus the canonical source URL it was fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub html: String,
    pub url: String,
}

/// One live surface with its ledger state.
#[derive(Debug)]
pub struct SurfaceSlot<H> {
    pub handle: H,
    pub role: SurfaceRole,
    pub device: DeviceProfile,
    /// Set exactly once per content load; cleared only when the URL changes.
    pub initialized: bool,
    /// Latched when the handle reports cross-origin restriction.
    pub restricted: bool,
    /// Debounce handle for the structural-change repair.
    pending_mutation: Option<TaskHandle>,
}

impl<H> SurfaceSlot<H> {
    fn new(handle: H, role: SurfaceRole, device: DeviceProfile) -> Self {
        Self {
            handle,
            role,
            device,
            initialized: false,
            restricted: false,
            pending_mutation: None,
        }
    }
}

/// Owns the surfaces and delivers content through the ledger.
#[derive(Debug, Default)]
pub struct SurfaceManager<H> {
    slots: Vec<SurfaceSlot<H>>,
    content: Option<PageContent>,
}

impl<H: SurfaceHandle> SurfaceManager<H> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            content: None,
        }
    }

    pub fn add_surface(&mut self, handle: H, role: SurfaceRole, device: DeviceProfile) -> usize {
        self.slots.push(SurfaceSlot::new(handle, role, device));
        self.slots.len() - 1
    }

    pub fn slots(&self) -> &[SurfaceSlot<H>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SurfaceSlot<H>> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut SurfaceSlot<H>> {
        self.slots.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn content(&self) -> Option<&PageContent> {
        self.content.as_ref()
    }

    /// The recovered original base URL for asset resolution.
    pub fn base_url(&self) -> Option<Url> {
        let content = self.content.as_ref()?;
        Url::parse(&content.url).ok()
    }

    /// Store newly fetched content. A changed URL tears the ledger down so
    /// every surface reloads; re-delivery of the same URL keeps it intact.
    pub fn set_content(&mut self, html: impl Into<String>, url: impl Into<String>) {
        let url = url.into();
        let url_changed = self
            .content
            .as_ref()
            .is_none_or(|current| current.url != url);
        self.content = Some(PageContent {
            html: html.into(),
            url,
        });
        if url_changed {
            self.reset_ledger();
        }
    }

    /// Clear the initialization ledger (URL change, explicit reset).
    pub fn reset_ledger(&mut self) {
        for slot in &mut self.slots {
            slot.initialized = false;
        }
    }

    /// Clear the ledger for modified-role surfaces only (mapping reset
    /// re-delivers content to restore pristine visuals).
    pub fn reset_modified_ledger(&mut self) {
        for slot in &mut self.slots {
            if slot.role == SurfaceRole::Modified {
                slot.initialized = false;
            }
        }
    }

    /// Deliver content to every surface not yet initialized.
    ///
    /// Modified surfaces get the markup (placeholder substituted) written
    /// once and asset repair scheduled at the configured staggered delays.
    /// Original-role surfaces never receive a write — they navigate to their
    /// own reference copy of the source URL. Surfaces already initialized
    /// are left alone; callers re-run style injection separately.
    ///
    /// Returns the slots that were initialized by this pass.
    pub fn sync_surfaces(
        &mut self,
        proxy_base: &str,
        repair_delays_ms: &[u64],
        timeline: &mut Timeline,
    ) -> Vec<usize> {
        let Some(content) = self.content.clone() else {
            return Vec::new();
        };
        let mut initialized = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.initialized {
                continue;
            }
            match slot.role {
                SurfaceRole::Original => {
                    slot.handle.navigate(&content.url);
                }
                SurfaceRole::Modified => {
                    let markup = assets::substitute_proxy_base(&content.html, proxy_base);
                    slot.handle.write_content(&markup);
                    for &delay in repair_delays_ms {
                        timeline.schedule_after(delay, Task::RepairAssets { slot: index });
                    }
                }
            }
            slot.initialized = true;
            initialized.push(index);
        }

        if !initialized.is_empty() {
            tracing::info!(surfaces = initialized.len(), url = %content.url, "content delivered");
        }
        initialized
    }

    /// Run one asset-repair pass on a surface, if it can be introspected.
    pub fn repair_assets(&mut self, index: usize, proxy_base: &str) -> usize {
        let Some(base) = self.base_url() else {
            return 0;
        };
        let Some(slot) = self.slots.get_mut(index) else {
            return 0;
        };
        if !slot.initialized || slot.role == SurfaceRole::Original {
            return 0;
        }
        if slot.handle.is_restricted() {
            if !slot.restricted {
                slot.restricted = true;
                tracing::warn!(slot = index, "surface is cross-origin restricted");
            }
            return 0;
        }
        assets::repair_surface(&mut slot.handle, &base, proxy_base)
    }

    /// Structural-change notification from the host: debounce a repair.
    pub fn notify_mutation(&mut self, index: usize, debounce_ms: u64, timeline: &mut Timeline) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if !slot.initialized {
            return;
        }
        if let Some(pending) = slot.pending_mutation.take() {
            timeline.cancel(pending);
        }
        slot.pending_mutation =
            Some(timeline.schedule_after(debounce_ms, Task::RepairAssets { slot: index }));
    }

    /// Drop the debounce handle once its task has fired.
    pub fn clear_pending_mutation(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.pending_mutation = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::memory::{MemorySurface, Snapshot, SnapshotNode};

    fn surface() -> MemorySurface {
        MemorySurface::new(Snapshot {
            url: None,
            root: SnapshotNode::new("html")
                .with_child(SnapshotNode::new("img").with_attribute("src", "logo.png")),
            rules: Vec::new(),
        })
    }

    fn manager_with(roles: &[SurfaceRole]) -> SurfaceManager<MemorySurface> {
        let mut manager = SurfaceManager::new();
        for role in roles {
            manager.add_surface(surface(), *role, DeviceProfile::desktop());
        }
        manager
    }

    #[test]
    fn content_is_written_exactly_once() {
        let mut manager = manager_with(&[SurfaceRole::Modified]);
        let mut timeline = Timeline::new();
        manager.set_content("<html>{{PROXY_BASE}}</html>", "https://example.com/");

        let first = manager.sync_surfaces("https://proxy.test", &[0, 400], &mut timeline);
        assert_eq!(first, vec![0]);
        // Second pass: ledger says initialized, nothing happens.
        let second = manager.sync_surfaces("https://proxy.test", &[0, 400], &mut timeline);
        assert!(second.is_empty());
        assert_eq!(manager.slot(0).map(|s| s.handle.content_writes), Some(1));
    }

    #[test]
    fn repair_passes_are_scheduled_per_delay() {
        let mut manager = manager_with(&[SurfaceRole::Modified]);
        let mut timeline = Timeline::new();
        manager.set_content("<html></html>", "https://example.com/");
        manager.sync_surfaces("", &[0, 400, 1500], &mut timeline);

        assert_eq!(timeline.advance(0).len(), 1);
        assert_eq!(timeline.advance(400).len(), 1);
        assert_eq!(timeline.advance(1500).len(), 1);
        assert!(timeline.is_idle());
    }

    #[test]
    fn original_role_navigates_instead_of_writing() {
        let mut manager = manager_with(&[SurfaceRole::Modified, SurfaceRole::Original]);
        let mut timeline = Timeline::new();
        manager.set_content("<html></html>", "https://example.com/page");
        manager.sync_surfaces("", &[], &mut timeline);

        let original = manager.slot(1).expect("slot");
        assert_eq!(original.handle.content_writes, 0);
        assert_eq!(
            original.handle.navigated_to.as_deref(),
            Some("https://example.com/page")
        );
        assert!(original.initialized);
    }

    #[test]
    fn url_change_resets_the_ledger() {
        let mut manager = manager_with(&[SurfaceRole::Modified]);
        let mut timeline = Timeline::new();
        manager.set_content("<a>", "https://example.com/");
        manager.sync_surfaces("", &[], &mut timeline);
        assert!(manager.slot(0).is_some_and(|s| s.initialized));

        // Same URL re-delivery keeps the ledger.
        manager.set_content("<a>", "https://example.com/");
        assert!(manager.slot(0).is_some_and(|s| s.initialized));

        manager.set_content("<b>", "https://other.example/");
        assert!(manager.slot(0).is_some_and(|s| !s.initialized));
    }

    #[test]
    fn repair_rewrites_relative_references() {
        let mut manager = manager_with(&[SurfaceRole::Modified]);
        let mut timeline = Timeline::new();
        manager.set_content("<html></html>", "https://example.com/dir/page");
        manager.sync_surfaces("https://proxy.test", &[], &mut timeline);

        let fixed = manager.repair_assets(0, "https://proxy.test");
        assert_eq!(fixed, 1);
        let slot = manager.slot(0).expect("slot");
        let img = slot.handle.query_all("img")[0];
        assert_eq!(
            slot.handle.attribute(img, "src").as_deref(),
            Some("https://proxy.test/api/proxy-path/https://example.com/dir/logo.png")
        );
    }

    #[test]
    fn mutation_notifications_debounce() {
        let mut manager = manager_with(&[SurfaceRole::Modified]);
        let mut timeline = Timeline::new();
        manager.set_content("<html></html>", "https://example.com/");
        manager.sync_surfaces("", &[], &mut timeline);

        manager.notify_mutation(0, 150, &mut timeline);
        manager.notify_mutation(0, 150, &mut timeline);
        manager.notify_mutation(0, 150, &mut timeline);
        // Only the last scheduled repair survives.
        assert_eq!(timeline.advance(10_000).len(), 1);
    }

    #[test]
    fn restricted_surface_is_latched_and_skipped() {
        let mut manager = SurfaceManager::new();
        manager.add_surface(
            surface().restricted(),
            SurfaceRole::Modified,
            DeviceProfile::mobile(),
        );
        let mut timeline = Timeline::new();
        manager.set_content("<html></html>", "https://example.com/");
        manager.sync_surfaces("", &[], &mut timeline);

        assert_eq!(manager.repair_assets(0, ""), 0);
        assert!(manager.slot(0).is_some_and(|s| s.restricted));
    }
}
