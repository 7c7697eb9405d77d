use std::sync::atomic::{AtomicUsize, Ordering};

static PASSES: AtomicUsize = AtomicUsize::new(0);
static REMOVED: AtomicUsize = AtomicUsize::new(0);
static MERGED: AtomicUsize = AtomicUsize::new(0);

/// What one optimization did, or what all of them did together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Number of bottom-up passes, including the final one that changed
    /// nothing.
    pub passes:  usize,
    /// Nodes eliminated by folding and identity rewrites.
    pub removed: usize,
    /// Nodes replaced by an equal node produced earlier in the same pass.
    pub merged:  usize,
}

impl OptimizeStats {
    /// Adds `self` to the process-wide totals.
    pub(crate) fn publish(self) {
        PASSES.fetch_add(self.passes, Ordering::Relaxed);
        REMOVED.fetch_add(self.removed, Ordering::Relaxed);
        MERGED.fetch_add(self.merged, Ordering::Relaxed);
    }
}

/// Totals over every optimization run in this process.
#[must_use]
pub fn cumulative() -> OptimizeStats {
    OptimizeStats { passes:  PASSES.load(Ordering::Relaxed),
                    removed: REMOVED.load(Ordering::Relaxed),
                    merged:  MERGED.load(Ordering::Relaxed), }
}
