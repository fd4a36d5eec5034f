use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 1-indexed page number.
pub type PageNumber = u32;

/// Discrete zoom levels offered by the viewer, smallest first.
pub const ZOOM_SCALES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Index into [`ZOOM_SCALES`] used when none is given or the given one is out of range.
pub const DEFAULT_ZOOM_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Single,
    Double,
    Scroll,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Single, ViewMode::Double, ViewMode::Scroll];

    pub fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::Scroll => "scroll",
        }
    }

    /// Lenient lookup used for values coming from persisted or remote state.
    ///
    /// Unknown names fall back to [`ViewMode::Single`].
    pub fn from_name(name: &str) -> Self {
        match name.parse() {
            Ok(mode) => mode,
            Err(UnknownViewMode(name)) => {
                log::warn!("unknown view mode {name:?}, falling back to single");
                Self::Single
            }
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownViewMode(pub String);

impl fmt::Display for UnknownViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown view mode `{}` (expected single, double or scroll)", self.0)
    }
}

impl std::error::Error for UnknownViewMode {}

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownViewMode(value.to_owned()))
    }
}

/// A render scale taken from the zoom table.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale(f64);

impl Scale {
    pub fn from_zoom_index(index: usize) -> Self {
        let value = ZOOM_SCALES.get(index).copied().unwrap_or(ZOOM_SCALES[DEFAULT_ZOOM_INDEX]);
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Textual form used to key per-scale maps, e.g. `"1"` or `"0.75"`.
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::from_zoom_index(DEFAULT_ZOOM_INDEX)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reading state handed to the viewer core on every page, zoom or mode change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderState {
    pub current_page: PageNumber,
    pub view_mode: ViewMode,
    pub zoom_index: usize,
    pub pages_count: u32,
    /// Pages currently in the viewport, in presentation order.
    pub visible_pages: Vec<PageNumber>,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            current_page: 1,
            view_mode: ViewMode::Single,
            zoom_index: DEFAULT_ZOOM_INDEX,
            pages_count: 1,
            visible_pages: vec![1],
        }
    }
}

impl ReaderState {
    pub fn scale(&self) -> Scale {
        Scale::from_zoom_index(self.zoom_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_keys_drop_trailing_zeroes() {
        let keys: Vec<String> =
            (0..ZOOM_SCALES.len()).map(|i| Scale::from_zoom_index(i).key()).collect();
        assert_eq!(keys, vec!["0.5", "0.75", "1", "1.25", "1.5", "2"]);
    }

    #[test]
    fn out_of_range_zoom_index_uses_default_scale() {
        assert_eq!(Scale::from_zoom_index(6).value(), 1.0);
        assert_eq!(Scale::from_zoom_index(usize::MAX), Scale::default());
    }

    #[test]
    fn view_mode_parsing_is_case_insensitive() {
        assert_eq!("Double".parse::<ViewMode>(), Ok(ViewMode::Double));
        assert_eq!(" scroll ".parse::<ViewMode>(), Ok(ViewMode::Scroll));
        assert!("spread".parse::<ViewMode>().is_err());
    }

    #[test]
    fn unknown_view_mode_name_falls_back_to_single() {
        assert_eq!(ViewMode::from_name("book"), ViewMode::Single);
        assert_eq!(ViewMode::from_name("double"), ViewMode::Double);
    }

    #[test]
    fn reader_state_serializes_lowercase_mode() {
        let state = ReaderState { view_mode: ViewMode::Scroll, ..ReaderState::default() };
        let json = serde_json::to_value(&state).expect("state should serialize");

        assert_eq!(json["view_mode"], "scroll");
        assert_eq!(json["visible_pages"], serde_json::json!([1]));
    }
}
