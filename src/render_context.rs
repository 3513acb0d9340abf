//! Explicit render context, replacing the source's mutable global `yafLog`
//! and `session` singletons (§9 design notes). Every public entry point that
//! needs logging, diagnostics, or cancellation takes a `&RenderContext`
//! rather than reaching for ambient global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Per-thread counters for the runtime-recoverable conditions in §7. Each
/// worker accumulates into its own instance; the driver sums them at pass
/// boundaries and emits a single `tracing` event rather than taking a lock
/// per increment.
#[derive(Default, Debug)]
pub struct Diagnostics {
    pub nan_radiance_clamped: AtomicU64,
    pub degenerate_triangles: AtomicU64,
    pub zero_power_lights: AtomicU64,
    pub photons_failed_to_deposit: AtomicU64,
    pub self_intersections_skipped: AtomicU64,
}

impl Diagnostics {
    pub fn merge_from(&self, other: &Diagnostics) {
        self.nan_radiance_clamped.fetch_add(
            other.nan_radiance_clamped.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.degenerate_triangles.fetch_add(
            other.degenerate_triangles.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.zero_power_lights.fetch_add(
            other.zero_power_lights.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.photons_failed_to_deposit.fetch_add(
            other.photons_failed_to_deposit.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
        self.self_intersections_skipped.fetch_add(
            other.self_intersections_skipped.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
    }

    pub fn log_summary(&self) {
        tracing::info!(
            nan_radiance_clamped = self.nan_radiance_clamped.load(Ordering::Relaxed),
            degenerate_triangles = self.degenerate_triangles.load(Ordering::Relaxed),
            zero_power_lights = self.zero_power_lights.load(Ordering::Relaxed),
            photons_failed_to_deposit = self.photons_failed_to_deposit.load(Ordering::Relaxed),
            self_intersections_skipped =
                self.self_intersections_skipped.load(Ordering::Relaxed),
            "render diagnostics"
        );
    }
}

/// Cooperative cancellation flag checked at tile boundaries and at
/// integrator recursion depth 0 (§5). Cloning shares the underlying flag.
#[derive(Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Threaded through every worker; owns a thread-local-ish [`Diagnostics`]
/// instance (one per worker, created fresh per tile/photon batch) and a
/// shared [`AbortFlag`].
pub struct RenderContext {
    pub abort: AbortFlag,
    pub diagnostics: Diagnostics,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            abort: AbortFlag::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn worker_scope(&self) -> WorkerScope<'_> {
        WorkerScope {
            parent: self,
            local: Diagnostics::default(),
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A worker's local diagnostics, merged into the parent [`RenderContext`]
/// when dropped so hot-path increments never take a lock.
pub struct WorkerScope<'a> {
    parent: &'a RenderContext,
    pub local: Diagnostics,
}

impl<'a> Drop for WorkerScope<'a> {
    fn drop(&mut self) {
        self.parent.diagnostics.merge_from(&self.local);
    }
}
