//! Page arrangement per view mode
//!
//! Double mode only shows a spread when both bitmaps are rendered and share
//! an orientation. Otherwise it falls back to the first page alone.

use crate::bitmap::Orientation;
use doc_model::{PageNumber, Scale, ViewMode};

/// Rendered dimensions of a page at a scale, if a bitmap exists.
pub trait BitmapDimensions {
    fn dimensions(&self, page: PageNumber, scale: Scale) -> Option<(u32, u32)>;

    fn orientation(&self, page: PageNumber, scale: Scale) -> Option<Orientation> {
        self.dimensions(page, scale)
            .map(|(width, height)| Orientation::from_dimensions(width, height))
    }
}

impl<F> BitmapDimensions for F
where
    F: Fn(PageNumber, Scale) -> Option<(u32, u32)>,
{
    fn dimensions(&self, page: PageNumber, scale: Scale) -> Option<(u32, u32)> {
        self(page, scale)
    }
}

pub fn select_layout(
    mode: ViewMode,
    visible_pages: &[PageNumber],
    scale: Scale,
    bitmaps: &impl BitmapDimensions,
) -> Vec<PageNumber> {
    match mode {
        ViewMode::Single => visible_pages.iter().take(1).copied().collect(),
        ViewMode::Scroll => visible_pages.to_vec(),
        ViewMode::Double => match visible_pages {
            [first, second, ..] => {
                let left = bitmaps.orientation(*first, scale);
                let right = bitmaps.orientation(*second, scale);

                match (left, right) {
                    (Some(left), Some(right)) if left == right => vec![*first, *second],
                    _ => vec![*first],
                }
            }
            pages => pages.to_vec(),
        },
    }
}
