//! Visible pages for hosts that do not track them themselves.

use doc_model::{PageNumber, ViewMode};

/// Geometry of a continuously scrolled document, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollGeometry {
    pub viewport_height_px: f32,
    pub scroll_offset_px: f32,
    /// Height of page `n` at index `n - 1`.
    pub page_heights_px: Vec<f32>,
    pub page_spacing_px: f32,
}

impl Default for ScrollGeometry {
    fn default() -> Self {
        Self {
            viewport_height_px: 800.0,
            scroll_offset_px: 0.0,
            page_heights_px: vec![1000.0],
            page_spacing_px: 16.0,
        }
    }
}

/// Pages shown in paginated modes: the current page, or the spread that
/// starts at it.
pub fn paginated_visible_pages(
    mode: ViewMode,
    current_page: PageNumber,
    pages_count: u32,
) -> Vec<PageNumber> {
    let pages_count = pages_count.max(1);
    let page = current_page.clamp(1, pages_count);

    match mode {
        ViewMode::Double if page < pages_count => vec![page, page + 1],
        _ => vec![page],
    }
}

/// Pages intersecting the viewport, top to bottom.
pub fn scrolled_visible_pages(geometry: &ScrollGeometry) -> Vec<PageNumber> {
    if geometry.page_heights_px.is_empty() {
        return vec![1];
    }

    let top = geometry.scroll_offset_px.max(0.0);
    let bottom = (geometry.scroll_offset_px + geometry.viewport_height_px).max(0.0);

    (page_at_offset(top, geometry)..=page_at_offset(bottom, geometry)).collect()
}

/// Page under the vertical center of the viewport.
pub fn current_page_from_scroll(geometry: &ScrollGeometry) -> PageNumber {
    if geometry.page_heights_px.is_empty() {
        return 1;
    }

    let center = (geometry.scroll_offset_px + geometry.viewport_height_px / 2.0).max(0.0);
    page_at_offset(center, geometry)
}

/// Scroll offset that puts the top of `page` at the top of the viewport.
pub fn scroll_offset_for_page(page: PageNumber, geometry: &ScrollGeometry) -> f32 {
    geometry
        .page_heights_px
        .iter()
        .take(page.saturating_sub(1) as usize)
        .map(|height| height + geometry.page_spacing_px)
        .sum()
}

fn page_at_offset(offset: f32, geometry: &ScrollGeometry) -> PageNumber {
    let mut cursor = 0.0;

    for (index, page_height) in geometry.page_heights_px.iter().enumerate() {
        let page_end = cursor + page_height;
        if offset <= page_end {
            return index as PageNumber + 1;
        }

        cursor = page_end + geometry.page_spacing_px;
    }

    geometry.page_heights_px.len().max(1) as PageNumber
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_pages(scroll_offset_px: f32, viewport_height_px: f32) -> ScrollGeometry {
        ScrollGeometry {
            viewport_height_px,
            scroll_offset_px,
            page_heights_px: vec![1000.0, 1000.0, 1000.0],
            page_spacing_px: 100.0,
        }
    }

    #[test]
    fn double_mode_shows_a_spread_until_the_last_page() {
        assert_eq!(paginated_visible_pages(ViewMode::Double, 3, 10), vec![3, 4]);
        assert_eq!(paginated_visible_pages(ViewMode::Double, 10, 10), vec![10]);
        assert_eq!(paginated_visible_pages(ViewMode::Single, 30, 10), vec![10]);
    }

    #[test]
    fn visible_range_tracks_scroll_window() {
        assert_eq!(scrolled_visible_pages(&three_pages(1100.0, 900.0)), vec![2]);
        assert_eq!(scrolled_visible_pages(&three_pages(1500.0, 900.0)), vec![2, 3]);
        assert_eq!(scrolled_visible_pages(&three_pages(9000.0, 900.0)), vec![3]);
    }

    #[test]
    fn current_page_uses_viewport_center() {
        assert_eq!(current_page_from_scroll(&three_pages(1200.0, 1000.0)), 2);
        assert_eq!(current_page_from_scroll(&ScrollGeometry::default()), 1);
    }

    #[test]
    fn offset_for_page_skips_previous_pages_and_gaps() {
        let geometry = three_pages(0.0, 800.0);

        assert_eq!(scroll_offset_for_page(1, &geometry), 0.0);
        assert_eq!(scroll_offset_for_page(3, &geometry), 2200.0);
    }
}
