use portable_atomic::{AtomicUsize, Ordering};

/// Tracks how many items are being processed right now and the highest value
/// ever observed.
#[derive(Debug, Default)]
pub(crate) struct ActivityGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ActivityGauge {
    pub(crate) fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        ActiveGuard { gauge: self }
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// Decrements the active count on drop, including during unwinding.
pub(crate) struct ActiveGuard<'a> {
    gauge: &'a ActivityGauge,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::AcqRel);
    }
}
