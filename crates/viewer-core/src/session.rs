//! Per-document render coordination
//!
//! A [`PageSession`] is created when a document is opened and dropped when it
//! is closed or replaced. It is not synchronized; hosts that share it across
//! threads wrap it in a `Mutex`.

use std::collections::HashSet;

use doc_model::{PageNumber, ReaderState, Scale};

use crate::bitmap::BitmapSize;
use crate::bitmap_cache::{CacheStats, DEFAULT_CACHE_CAPACITY};
use crate::layout::select_layout;
use crate::preload::{preload_window, PreloadRequest, PreloadWindow};
use crate::queue::{RenderJob, RenderJobKey, RenderPriority, RenderQueue};
use crate::ranges::{PageRange, RangeHistory, DEFAULT_RANGE_RETENTION};
use crate::rendered::{BitmapId, RenderedPages};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub cache_capacity: usize,
    pub range_retention: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            range_retention: DEFAULT_RANGE_RETENTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub window: PreloadWindow,
    /// Window pages that are neither registered nor handed out, ascending.
    /// All of them are queued when the plan returns.
    pub to_render: Vec<PageNumber>,
    /// Ranges that fell out of the history while recording this window.
    pub forgotten: Vec<PageRange>,
    /// Pages to present, in order.
    pub layout: Vec<PageNumber>,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub cache: CacheStats,
    pub ranges: Vec<PageRange>,
    pub pending_jobs: usize,
    pub in_flight_jobs: usize,
}

pub struct PageSession<B> {
    rendered: RenderedPages<B>,
    history: RangeHistory,
    queue: RenderQueue,
    // Jobs handed out by `next_job` and not yet registered or abandoned.
    in_flight: HashSet<RenderJobKey>,
    planned_scale: Option<Scale>,
}

impl<B: BitmapSize> PageSession<B> {
    pub fn new(limits: &SessionLimits) -> Self {
        Self {
            rendered: RenderedPages::new(limits.cache_capacity),
            history: RangeHistory::new(limits.range_retention),
            queue: RenderQueue::new(),
            in_flight: HashSet::new(),
            planned_scale: None,
        }
    }

    /// Work out what to render and what to show for the current reading state.
    ///
    /// Jobs from earlier plans that are still wanted stay queued, re-prioritized
    /// for the current visible pages. Jobs for pages outside the window or at
    /// another scale are dropped.
    pub fn plan(&mut self, state: &ReaderState) -> RenderPlan {
        let window = preload_window(&PreloadRequest {
            current_page: state.current_page,
            view_mode: state.view_mode,
            zoom_index: state.zoom_index,
            pages_count: state.pages_count,
        });
        let scale = window.scale;
        let scale_key = scale.key();

        if self.planned_scale.is_some_and(|previous| previous != scale) {
            log::debug!("scale changed to {scale}, forgetting requested ranges");
            self.history.clear();
            self.in_flight.retain(|key| key.scale_key == scale_key);
        }
        self.planned_scale = Some(scale);

        let to_render: Vec<PageNumber> = window
            .pages
            .iter()
            .copied()
            .filter(|page| !self.rendered.contains(*page, scale))
            .filter(|page| !self.in_flight.contains(&RenderJobKey::new(*page, scale)))
            .collect();

        let lost = to_render
            .iter()
            .filter(|page| self.history.contains(**page))
            .filter(|page| !self.queue.contains(&RenderJobKey::new(**page, scale)))
            .count();
        if lost > 0 {
            log::debug!("requesting {lost} evicted or abandoned pages again");
        }

        let forgotten = self.history.record(PageRange::new(window.first(), window.last()));

        let generation = self.queue.begin_generation();
        let wanted: HashSet<PageNumber> = to_render.iter().copied().collect();
        self.queue.retain(|key| key.scale_key == scale_key && wanted.contains(&key.page));
        for page in &to_render {
            let priority = if state.visible_pages.contains(page) {
                RenderPriority::Visible
            } else {
                RenderPriority::Prefetch
            };
            self.queue.schedule(RenderJobKey::new(*page, scale), priority);
        }

        let layout = self.layout(state);

        RenderPlan { window, to_render, forgotten, layout, generation }
    }

    /// Layout for `state` from the bitmaps registered so far.
    pub fn layout(&self, state: &ReaderState) -> Vec<PageNumber> {
        select_layout(state.view_mode, &state.visible_pages, state.scale(), &self.rendered)
    }

    /// Hand out the next job. It counts as in flight until its bitmap is
    /// registered or the job is abandoned.
    pub fn next_job(&mut self) -> Option<RenderJob> {
        let job = self.queue.pop_next()?;
        self.in_flight.insert(job.key.clone());
        Some(job)
    }

    /// Give back a job that will not be rendered, so the next plan asks for
    /// it again. Returns false for jobs that were not in flight.
    pub fn abandon_job(&mut self, key: &RenderJobKey) -> bool {
        self.in_flight.remove(key)
    }

    pub fn register_bitmap(&mut self, page: PageNumber, scale: Scale, bitmap: B) -> BitmapId {
        let key = RenderJobKey::new(page, scale);
        if !self.in_flight.remove(&key) {
            self.queue.retain(|queued| queued != &key);
        }
        self.rendered.insert(page, scale, bitmap)
    }

    pub fn rendered(&self) -> &RenderedPages<B> {
        &self.rendered
    }

    pub fn ranges(&self) -> &[PageRange] {
        self.history.ranges()
    }

    /// Drop bitmaps at `scale` and the range history that referred to them.
    pub fn invalidate_scale(&mut self, scale: Scale) {
        self.rendered.invalidate_scale(scale);
        if self.planned_scale == Some(scale) {
            self.history.clear();
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            cache: self.rendered.stats(),
            ranges: self.history.ranges().to_vec(),
            pending_jobs: self.queue.len(),
            in_flight_jobs: self.in_flight.len(),
        }
    }
}
