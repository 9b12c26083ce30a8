// SPDX-License-Identifier: MIT

//! Claim tracker for block audits.
//!
//! Records which units (blocks) some inode claims, one bit per unit, so the
//! audit can later compare the claims against the on-disk allocation bitmap.

use crate::core::utils::bitmap::BitmapOps;

/// Tracks claimed units in `[base_unit, base_unit + count)`.
///
/// Callers pass raw unit numbers; units outside the window are ignored.
#[derive(Debug, Clone)]
pub struct ReachabilityTracker {
    bitmap: Vec<u8>,
    base_unit: u32,
    count: usize,
}

impl ReachabilityTracker {
    pub fn new(base_unit: u32, count: usize) -> Self {
        Self {
            bitmap: vec![0u8; count.div_ceil(8)],
            base_unit,
            count,
        }
    }

    #[inline]
    fn index(&self, unit: u32) -> Option<usize> {
        let idx = unit.checked_sub(self.base_unit)? as usize;
        (idx < self.count).then_some(idx)
    }

    /// Marks `unit`. Returns `true` if it was not marked before.
    #[inline]
    pub fn mark(&mut self, unit: u32) -> bool {
        let Some(idx) = self.index(unit) else {
            return false;
        };
        let fresh = !self.bitmap.get_bit(idx);
        self.bitmap.set_bit(idx, true);
        fresh
    }

    #[inline]
    pub fn is_marked(&self, unit: u32) -> bool {
        self.index(unit).is_some_and(|idx| self.bitmap.get_bit(idx))
    }

    pub fn marked_count(&self) -> usize {
        self.bitmap.count_ones()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn base_unit(&self) -> u32 {
        self.base_unit
    }

    /// Visits units that `on_disk` reports allocated but nobody marked.
    ///
    /// `f` is called for the first `limit` of them in ascending order; the
    /// return value is the total number found.
    pub fn for_each_orphan<P, F>(&self, on_disk: P, limit: usize, mut f: F) -> usize
    where
        P: Fn(u32) -> bool,
        F: FnMut(u32),
    {
        let mut found = 0usize;
        for idx in 0..self.count {
            let unit = self.base_unit + idx as u32;
            if on_disk(unit) && !self.bitmap.get_bit(idx) {
                if found < limit {
                    f(unit);
                }
                found += 1;
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_window() {
        let mut tracker = ReachabilityTracker::new(30, 10);

        assert!(tracker.mark(31));
        assert!(!tracker.mark(31));
        assert!(tracker.is_marked(31));
        assert!(!tracker.is_marked(32));

        // Outside the window
        assert!(!tracker.mark(29));
        assert!(!tracker.mark(40));
        assert!(!tracker.is_marked(29));
        assert_eq!(tracker.marked_count(), 1);
    }

    #[test]
    fn test_for_each_orphan() {
        let mut tracker = ReachabilityTracker::new(30, 10);
        tracker.mark(30);
        tracker.mark(33);

        let allocated = |b: u32| matches!(b, 30 | 31 | 33 | 35 | 39);
        let mut seen = Vec::new();
        let total = tracker.for_each_orphan(allocated, 2, |b| seen.push(b));

        assert_eq!(total, 3);
        assert_eq!(seen, vec![31, 35]);
    }
}
