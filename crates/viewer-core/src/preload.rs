//! Preload window around the current page
//!
//! Each view mode looks a fixed number of pages behind and ahead of the
//! current page. The window is clamped to the document and paired with the
//! render scale for the current zoom index.

use doc_model::{PageNumber, Scale, ViewMode, DEFAULT_ZOOM_INDEX};

/// Pages to include behind and ahead of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadOffsets {
    pub before: u32,
    pub after: u32,
}

impl PreloadOffsets {
    pub fn for_mode(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Single => Self { before: 2, after: 2 },
            ViewMode::Double => Self { before: 2, after: 3 },
            ViewMode::Scroll => Self { before: 3, after: 6 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadRequest {
    pub current_page: PageNumber,
    pub view_mode: ViewMode,
    pub zoom_index: usize,
    pub pages_count: u32,
}

impl Default for PreloadRequest {
    fn default() -> Self {
        Self {
            current_page: 1,
            view_mode: ViewMode::Single,
            zoom_index: DEFAULT_ZOOM_INDEX,
            pages_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreloadWindow {
    /// Ascending, unique, never empty.
    pub pages: Vec<PageNumber>,
    pub scale: Scale,
}

impl PreloadWindow {
    pub fn first(&self) -> PageNumber {
        self.pages.first().copied().unwrap_or(1)
    }

    pub fn last(&self) -> PageNumber {
        self.pages.last().copied().unwrap_or(1)
    }
}

pub fn preload_window(request: &PreloadRequest) -> PreloadWindow {
    let pages_count = request.pages_count.max(1);
    let page = request.current_page.clamp(1, pages_count);
    let offsets = PreloadOffsets::for_mode(request.view_mode);

    let start = page.saturating_sub(offsets.before).max(1);
    let end = page.saturating_add(offsets.after).min(pages_count);

    PreloadWindow {
        pages: (start..=end).collect(),
        scale: Scale::from_zoom_index(request.zoom_index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(current_page: u32, view_mode: ViewMode, pages_count: u32) -> PreloadRequest {
        PreloadRequest { current_page, view_mode, pages_count, ..PreloadRequest::default() }
    }

    #[test]
    fn window_is_clamped_at_the_first_page() {
        let window = preload_window(&request(1, ViewMode::Single, 5));

        assert_eq!(window.pages, vec![1, 2, 3]);
        assert_eq!(window.scale.value(), 1.0);
    }

    #[test]
    fn current_page_beyond_document_is_clamped() {
        let window = preload_window(&request(100, ViewMode::Single, 10));

        assert_eq!(window.pages, vec![8, 9, 10]);
        assert!(window.pages.iter().all(|page| (1..=10).contains(page)));
    }

    #[test]
    fn offsets_follow_view_mode() {
        let pages = |mode| preload_window(&request(10, mode, 50)).pages;

        assert_eq!(pages(ViewMode::Single), (8..=12).collect::<Vec<_>>());
        assert_eq!(pages(ViewMode::Double), (8..=13).collect::<Vec<_>>());
        assert_eq!(pages(ViewMode::Scroll), (7..=16).collect::<Vec<_>>());
    }

    #[test]
    fn degenerate_inputs_still_yield_a_page() {
        let window = preload_window(&request(0, ViewMode::Single, 0));

        assert_eq!(window.pages, vec![1]);
        assert_eq!((window.first(), window.last()), (1, 1));
    }

    #[test]
    fn zoom_index_selects_scale_with_fallback() {
        let zoomed = preload_window(&PreloadRequest { zoom_index: 5, ..PreloadRequest::default() });
        assert_eq!(zoomed.scale.value(), 2.0);

        let out_of_range =
            preload_window(&PreloadRequest { zoom_index: 42, ..PreloadRequest::default() });
        assert_eq!(out_of_range.scale.value(), 1.0);
    }

    #[test]
    fn identical_requests_give_identical_windows() {
        let input = request(7, ViewMode::Double, 9);
        assert_eq!(preload_window(&input), preload_window(&input));
    }
}
