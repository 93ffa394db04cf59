//! Visibility queries.
//!
//! Mirrors the begin/end/read shape of GPU sample-count queries. Samples are
//! reported by depth-probe draws between `begin` and `end`; reading a slot
//! that was never issued yields `None`.

#[derive(Debug, Clone, Default)]
pub struct SampleQueries {
    counts: Vec<Option<u32>>,
    open: Option<usize>,
}

impl SampleQueries {
    pub fn new(slots: usize) -> Self {
        Self {
            counts: vec![None; slots],
            open: None,
        }
    }

    /// Starts counting into `slot`. An already open query is closed first.
    pub fn begin(&mut self, slot: usize) {
        self.end();
        if let Some(count) = self.counts.get_mut(slot) {
            *count = Some(0);
            self.open = Some(slot);
        }
    }

    /// Adds samples to the open query; ignored when none is open.
    pub fn record(&mut self, samples: u32) {
        if let Some(count) = self.open.and_then(|slot| self.counts.get_mut(slot)) {
            *count = Some(count.unwrap_or(0) + samples);
        }
    }

    pub fn end(&mut self) {
        self.open = None;
    }

    pub fn sample_count(&self, slot: usize) -> Option<u32> {
        self.counts.get(slot).copied().flatten()
    }
}
