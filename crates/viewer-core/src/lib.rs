//! Viewer core
//!
//! Rendered-page bookkeeping for a paginated document viewer: a bounded
//! bitmap cache, the preload window around the current page, the history of
//! requested page ranges, and the page arrangement for each view mode.
//!
//! # Example
//!
//! ```
//! use doc_model::{ReaderState, ViewMode};
//! use viewer_core::{PageBitmap, PageSession, SessionLimits};
//!
//! let mut session = PageSession::new(&SessionLimits::default());
//! let state = ReaderState {
//!     current_page: 4,
//!     view_mode: ViewMode::Double,
//!     pages_count: 12,
//!     visible_pages: vec![4, 5],
//!     ..ReaderState::default()
//! };
//!
//! let plan = session.plan(&state);
//! assert_eq!(plan.window.pages, vec![2, 3, 4, 5, 6, 7]);
//!
//! while let Some(job) = session.next_job() {
//!     // Render job.key.page at state.scale(), then hand the result back.
//!     session.register_bitmap(job.key.page, state.scale(), PageBitmap::blank(612, 792));
//! }
//!
//! assert_eq!(session.layout(&state), vec![4, 5]);
//! ```

mod bitmap;
mod bitmap_cache;
mod layout;
mod preload;
mod queue;
mod ranges;
mod rendered;
mod session;
mod visible;

pub use bitmap::{BitmapSize, Orientation, PageBitmap};
pub use bitmap_cache::{BitmapCache, CacheStats, DEFAULT_CACHE_CAPACITY};
pub use layout::{select_layout, BitmapDimensions};
pub use preload::{preload_window, PreloadOffsets, PreloadRequest, PreloadWindow};
pub use queue::{RenderJob, RenderJobKey, RenderPriority, RenderQueue};
pub use ranges::{
    merge_range, InvalidPageRange, PageRange, RangeHistory, DEFAULT_RANGE_RETENTION,
};
pub use rendered::{BitmapId, RenderedPages};
pub use session::{PageSession, RenderPlan, SessionLimits, SessionStats};
pub use visible::{
    current_page_from_scroll, paginated_visible_pages, scroll_offset_for_page,
    scrolled_visible_pages, ScrollGeometry,
};
