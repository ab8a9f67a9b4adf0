use crate::text::params::TextOverlayPatch;

/// Container size reported by the host view, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f64,
}

fn default_dpr() -> f64 {
    1.0
}

impl ContainerSize {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// Work accumulated since the last drawn frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingFrame {
    /// All parameter edits merged in arrival order.
    pub patch: Option<TextOverlayPatch>,
    /// Latest container size, if it changed.
    pub container: Option<ContainerSize>,
    /// Monotonic frame number.
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub requests: u64,
    pub frames: u64,
    /// Requests folded into an already pending frame.
    pub coalesced: u64,
}

/// Coalesces parameter edits and container resizes into at most one pending frame.
///
/// Nothing is queued: a request arriving while a frame is pending is merged into it, and the
/// host draws whatever [`FrameScheduler::take_frame`] returns on its next tick.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Option<PendingFrame>,
    generation: u64,
    stats: SchedulerStats,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_params(&mut self, patch: TextOverlayPatch) {
        let frame = self.pending_mut();
        frame.patch = Some(match frame.patch.take() {
            Some(prev) => prev.merge(&patch),
            None => patch,
        });
    }

    pub fn request_resize(&mut self, container: ContainerSize) {
        self.pending_mut().container = Some(container);
    }

    /// Request a redraw with no changes (for example after new depth arrives).
    pub fn request_redraw(&mut self) {
        self.pending_mut();
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand out the pending frame, if any, leaving the scheduler idle.
    pub fn take_frame(&mut self) -> Option<PendingFrame> {
        let frame = self.pending.take()?;
        self.stats.frames += 1;
        Some(frame)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    fn pending_mut(&mut self) -> &mut PendingFrame {
        self.stats.requests += 1;
        if self.pending.is_some() {
            self.stats.coalesced += 1;
        } else {
            self.generation += 1;
        }
        let generation = self.generation;
        self.pending.get_or_insert_with(|| PendingFrame {
            generation,
            ..PendingFrame::default()
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/scheduler.rs"]
mod tests;
