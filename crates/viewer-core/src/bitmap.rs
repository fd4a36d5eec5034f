//! Rendered page bitmaps and their orientation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Square pages count as landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width >= height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Anything the renderer produces for a page that has pixel dimensions.
pub trait BitmapSize {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn orientation(&self) -> Orientation {
        Orientation::from_dimensions(self.width(), self.height())
    }
}

/// A rasterized page in RGBA format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PageBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// A bitmap with dimensions only, for hosts that keep pixels elsewhere.
    pub fn blank(width: u32, height: u32) -> Self {
        Self { width, height, pixels: Vec::new() }
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }
}

impl BitmapSize for PageBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl<B: BitmapSize + ?Sized> BitmapSize for std::sync::Arc<B> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_bitmaps_are_landscape() {
        assert_eq!(PageBitmap::blank(500, 500).orientation(), Orientation::Landscape);
        assert_eq!(PageBitmap::blank(612, 792).orientation(), Orientation::Portrait);
        assert_eq!(PageBitmap::blank(792, 612).orientation(), Orientation::Landscape);
    }

    #[test]
    fn shared_bitmaps_report_inner_size() {
        let shared = std::sync::Arc::new(PageBitmap::new(2, 1, vec![0; 8]));
        assert_eq!(shared.orientation(), Orientation::Landscape);
        assert_eq!(shared.memory_size(), 8);
    }
}
