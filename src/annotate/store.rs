use crate::annotate::model::{Region, RegionDraft, RegionId, MIN_REGION_EXTENT};

/// Committed regions in insertion order plus the id counter.
///
/// Ids are never reused while the store lives; only [`RegionStore::reset`]
/// rewinds the counter.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStore {
    regions: Vec<Region>,
    next_id: u64,
    min_extent: f64,
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new(MIN_REGION_EXTENT)
    }
}

impl RegionStore {
    pub fn new(min_extent: f64) -> Self {
        Self {
            regions: Vec::new(),
            next_id: 0,
            min_extent,
        }
    }

    pub fn min_extent(&self) -> f64 {
        self.min_extent
    }

    /// Normalizes and commits `draft`. Returns `None` without consuming an id
    /// when either extent is below the minimum.
    pub fn add(&mut self, draft: RegionDraft) -> Option<RegionId> {
        if !draft.bounds.meets_min_extent(self.min_extent) {
            return None;
        }

        let id = RegionId(self.next_id);
        self.next_id += 1;
        self.regions.push(Region {
            id,
            bounds: draft.bounds.normalized(),
            mode: draft.mode,
        });
        Some(id)
    }

    pub fn remove(&mut self, id: RegionId) -> bool {
        let Some(index) = self.regions.iter().position(|region| region.id == id) else {
            return false;
        };
        self.regions.remove(index);
        true
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub fn all(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn reset(&mut self) {
        self.regions.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::model::{Rect, RegionMode};

    fn draft(x: f64, y: f64, w: f64, h: f64) -> RegionDraft {
        RegionDraft::new(Rect::new(x, y, w, h), RegionMode::Reveal)
    }

    #[test]
    fn ids_keep_increasing_after_removal() {
        let mut store = RegionStore::default();
        assert_eq!(store.add(draft(0.0, 0.0, 10.0, 10.0)), Some(RegionId(0)));
        assert_eq!(store.add(draft(0.0, 0.0, 10.0, 10.0)), Some(RegionId(1)));

        assert!(store.remove(RegionId(0)));
        assert_eq!(store.add(draft(0.0, 0.0, 10.0, 10.0)), Some(RegionId(2)));

        let ids: Vec<_> = store.all().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RegionId(1), RegionId(2)]);
    }

    #[test]
    fn sub_threshold_draft_consumes_no_id() {
        let mut store = RegionStore::default();
        assert_eq!(store.add(draft(10.0, 10.0, 2.0, 1.0)), None);
        assert_eq!(store.add(draft(10.0, 10.0, 6.0, 6.0)), Some(RegionId(0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn commit_stores_normalized_bounds() {
        let mut store = RegionStore::default();
        let id = store.add(draft(100.0, 100.0, -50.0, -60.0)).expect("commit");
        assert_eq!(
            store.get(id).map(|r| r.bounds),
            Some(Rect::new(50.0, 40.0, 50.0, 60.0))
        );
    }

    #[test]
    fn removing_unknown_id_reports_false() {
        let mut store = RegionStore::default();
        assert!(!store.remove(RegionId(7)));
    }

    #[test]
    fn reset_rewinds_counter() {
        let mut store = RegionStore::default();
        let _ = store.add(draft(0.0, 0.0, 10.0, 10.0));
        let _ = store.add(draft(0.0, 0.0, 10.0, 10.0));
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.add(draft(0.0, 0.0, 10.0, 10.0)), Some(RegionId(0)));
    }
}
