//! Rendered bitmaps indexed by scale and page.

use std::collections::HashMap;
use std::sync::Arc;

use doc_model::{PageNumber, Scale};

use crate::bitmap::BitmapSize;
use crate::bitmap_cache::{BitmapCache, CacheStats};
use crate::layout::BitmapDimensions;

/// Cache key handed out once per page and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitmapId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    scale_key: String,
    page: PageNumber,
}

pub struct RenderedPages<B> {
    cache: BitmapCache<BitmapId, Arc<B>>,
    by_scale: HashMap<String, HashMap<PageNumber, BitmapId>>,
    locations: HashMap<BitmapId, Location>,
    next_id: u64,
}

impl<B: BitmapSize> RenderedPages<B> {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: BitmapCache::new(capacity),
            by_scale: HashMap::new(),
            locations: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn id_for(&self, page: PageNumber, scale: Scale) -> Option<BitmapId> {
        self.by_scale.get(&scale.key())?.get(&page).copied()
    }

    /// Register a freshly rendered bitmap. Re-rendering a page at the same
    /// scale replaces the bitmap under the same id.
    pub fn insert(&mut self, page: PageNumber, scale: Scale, bitmap: B) -> BitmapId {
        let id = match self.id_for(page, scale) {
            Some(id) => id,
            None => {
                self.next_id += 1;
                let id = BitmapId(self.next_id);
                let scale_key = scale.key();
                self.by_scale.entry(scale_key.clone()).or_default().insert(page, id);
                self.locations.insert(id, Location { scale_key, page });
                id
            }
        };

        if let Some((evicted, _)) = self.cache.put(id, Arc::new(bitmap)) {
            self.forget(evicted);
        }

        id
    }

    pub fn get(&self, page: PageNumber, scale: Scale) -> Option<Arc<B>> {
        let id = self.id_for(page, scale)?;
        self.cache.get(&id).cloned()
    }

    pub fn contains(&self, page: PageNumber, scale: Scale) -> bool {
        self.id_for(page, scale).is_some_and(|id| self.cache.has(&id))
    }

    pub fn remove(&mut self, page: PageNumber, scale: Scale) -> Option<Arc<B>> {
        let id = self.id_for(page, scale)?;
        self.forget(id);
        self.cache.del(&id)
    }

    /// Drop every bitmap rendered at `scale`.
    pub fn invalidate_scale(&mut self, scale: Scale) -> usize {
        let Some(pages) = self.by_scale.remove(&scale.key()) else {
            return 0;
        };

        for id in pages.values() {
            self.locations.remove(id);
            self.cache.del(id);
        }

        log::debug!("invalidated {} bitmaps at scale {scale}", pages.len());
        pages.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.by_scale.clear();
        self.locations.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn forget(&mut self, id: BitmapId) {
        let Some(location) = self.locations.remove(&id) else {
            return;
        };

        if let Some(pages) = self.by_scale.get_mut(&location.scale_key) {
            pages.remove(&location.page);
            if pages.is_empty() {
                self.by_scale.remove(&location.scale_key);
            }
        }
    }
}

impl<B: BitmapSize> BitmapDimensions for RenderedPages<B> {
    fn dimensions(&self, page: PageNumber, scale: Scale) -> Option<(u32, u32)> {
        self.get(page, scale).map(|bitmap| (bitmap.width(), bitmap.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::PageBitmap;

    fn scale(index: usize) -> Scale {
        Scale::from_zoom_index(index)
    }

    #[test]
    fn bitmaps_are_kept_per_scale() {
        let mut pages = RenderedPages::new(8);

        let at_one = pages.insert(1, scale(2), PageBitmap::blank(600, 800));
        let at_two = pages.insert(1, scale(5), PageBitmap::blank(1200, 1600));

        assert_ne!(at_one, at_two);
        assert_eq!(pages.dimensions(1, scale(2)), Some((600, 800)));
        assert_eq!(pages.dimensions(1, scale(5)), Some((1200, 1600)));
        assert_eq!(pages.dimensions(1, scale(0)), None);
    }

    #[test]
    fn re_rendering_reuses_the_id() {
        let mut pages = RenderedPages::new(8);

        let first = pages.insert(3, scale(2), PageBitmap::blank(10, 20));
        let second = pages.insert(3, scale(2), PageBitmap::blank(20, 10));

        assert_eq!(first, second);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages.dimensions(3, scale(2)), Some((20, 10)));
    }

    #[test]
    fn evicted_bitmaps_leave_the_index() {
        let mut pages = RenderedPages::new(2);

        pages.insert(1, scale(2), PageBitmap::blank(1, 1));
        pages.insert(2, scale(2), PageBitmap::blank(1, 1));
        pages.insert(3, scale(2), PageBitmap::blank(1, 1));

        assert!(!pages.contains(1, scale(2)));
        assert_eq!(pages.id_for(1, scale(2)), None);
        assert!(pages.contains(3, scale(2)));
        assert_eq!(pages.stats().evictions, 1);
    }

    #[test]
    fn invalidating_a_scale_keeps_other_scales() {
        let mut pages = RenderedPages::new(8);

        pages.insert(1, scale(2), PageBitmap::blank(1, 1));
        pages.insert(2, scale(2), PageBitmap::blank(1, 1));
        pages.insert(1, scale(3), PageBitmap::blank(1, 1));

        assert_eq!(pages.invalidate_scale(scale(2)), 2);
        assert_eq!(pages.invalidate_scale(scale(2)), 0);
        assert_eq!(pages.len(), 1);
        assert!(pages.contains(1, scale(3)));
    }

    #[test]
    fn removing_and_clearing() {
        let mut pages = RenderedPages::new(8);
        pages.insert(4, scale(2), PageBitmap::blank(5, 5));
        pages.insert(5, scale(2), PageBitmap::blank(5, 5));

        assert!(pages.remove(4, scale(2)).is_some());
        assert!(pages.remove(4, scale(2)).is_none());

        pages.clear();
        assert!(pages.is_empty());
        assert_eq!(pages.get(5, scale(2)), None);
    }
}
