use restyle_protocol::Point;
use serde::{Deserialize, Serialize};

/// Zoom bounds for the preview canvas.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom deltas closer to 1.0 than this are dropped as no-ops.
const DELTA_EPSILON: f64 = 1e-4;

/// The committed pan/zoom transform of the preview canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub zoom: f64,
    pub pan: Point,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
        }
    }
}

impl CameraState {
    /// The transform after zooming by `delta_factor` about a cursor point
    /// (given as an offset from the canvas center).
    ///
    /// Keeps the content point under the cursor visually fixed: with
    /// `s = new_zoom / old_zoom`, the new pan is
    /// `cursor − (cursor − pan) · s`, so `(cursor − pan) / zoom` — the
    /// content coordinate under the cursor — is unchanged.
    pub fn zoomed_about(self, cursor: Point, delta_factor: f64) -> CameraState {
        if (delta_factor - 1.0).abs() < DELTA_EPSILON {
            return self;
        }
        let zoom = (self.zoom * delta_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let scale_change = zoom / self.zoom;
        let pan = Point::new(
            cursor.x - (cursor.x - self.pan.x) * scale_change,
            cursor.y - (cursor.y - self.pan.y) * scale_change,
        );
        CameraState { zoom, pan }
    }
}

/// Pan/zoom state with an interaction-local write buffer.
///
/// Input handlers write the local buffer on every pointer event for
/// immediate visual feedback; the committed state that the rest of the
/// application reads is refreshed by a frame-coalesced [`commit`] and again
/// when the interaction ends. While a drag or pinch is in flight the
/// committed state intentionally lags.
///
/// [`commit`]: ViewportCamera::commit
#[derive(Debug, Clone, Default)]
pub struct ViewportCamera {
    local: CameraState,
    committed: CameraState,
    interacting: bool,
}

impl ViewportCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live buffer — what the canvas transform should show right now.
    pub fn local(&self) -> CameraState {
        self.local
    }

    /// The last committed state — what shared application state sees.
    pub fn committed(&self) -> CameraState {
        self.committed
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn begin_interaction(&mut self) {
        self.interacting = true;
    }

    /// End the current interaction and commit the buffer immediately.
    pub fn end_interaction(&mut self) {
        self.interacting = false;
        self.commit();
    }

    /// Set absolute zoom, clamped to [[`MIN_ZOOM`], [`MAX_ZOOM`]].
    pub fn set_zoom(&mut self, zoom: f64) {
        self.local.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Cursor-anchored zoom. `cursor` is the pointer offset from the canvas
    /// center; `delta_factor` multiplies the current zoom.
    pub fn zoom_at(&mut self, cursor: Point, delta_factor: f64) {
        self.local = self.local.zoomed_about(cursor, delta_factor);
    }

    /// Translate the pan buffer while dragging.
    pub fn pan_by(&mut self, delta: Point) {
        self.local.pan = self.local.pan + delta;
    }

    /// Push the local buffer into committed state.
    pub fn commit(&mut self) {
        self.committed = self.local;
    }
}
