//! Byte-range requests for streaming document bytes
//!
//! Resolves a `Range: bytes=...` header against a file or in-memory source and
//! produces the status, headers and body an HTTP layer should send back.
//! Only single ranges are served; anything else gets the full body.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range header {0:?}")]
    Malformed(String),
    #[error("unsupported range header {0:?}")]
    Unsupported(String),
    #[error("range not satisfiable for {total} bytes")]
    Unsatisfiable { total: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum ByteSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ByteSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for ByteSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl ByteSource {
    pub fn len(&self) -> Result<u64, RangeError> {
        match self {
            Self::Path(path) => Ok(fs::metadata(path)?.len()),
            Self::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    pub fn is_empty(&self) -> Result<bool, RangeError> {
        Ok(self.len()? == 0)
    }

    pub fn read_range(&self, range: ResolvedRange) -> Result<Vec<u8>, RangeError> {
        match self {
            Self::Path(path) => {
                let mut file = File::open(path)?;
                file.seek(SeekFrom::Start(range.start))?;

                let mut body = Vec::with_capacity(range.len() as usize);
                file.take(range.len()).read_to_end(&mut body)?;
                Ok(body)
            }
            Self::Bytes(bytes) => {
                let start = (range.start as usize).min(bytes.len());
                let end = (range.end as usize).saturating_add(1).min(bytes.len());
                Ok(bytes[start..end].to_vec())
            }
        }
    }

    pub fn read_all(&self) -> Result<Vec<u8>, RangeError> {
        match self {
            Self::Path(path) => Ok(fs::read(path)?),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// A single range from a `Range` header, before the size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRangeSpec {
    /// `bytes=start-end`
    Bounded { start: u64, end: u64 },
    /// `bytes=start-`
    From { start: u64 },
    /// `bytes=-length`
    Suffix { length: u64 },
}

impl ByteRangeSpec {
    pub fn parse(header: &str) -> Result<Self, RangeError> {
        let header = header.trim();
        let malformed = || RangeError::Malformed(header.to_owned());

        let (unit, spec) = header.split_once('=').ok_or_else(malformed)?;
        if !unit.trim().eq_ignore_ascii_case("bytes") || spec.contains(',') {
            return Err(RangeError::Unsupported(header.to_owned()));
        }

        let (start, end) = spec.trim().split_once('-').ok_or_else(malformed)?;
        let parse = |text: &str| text.trim().parse::<u64>().map_err(|_| malformed());

        match (start.trim().is_empty(), end.trim().is_empty()) {
            (false, false) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start > end {
                    return Err(malformed());
                }
                Ok(Self::Bounded { start, end })
            }
            (false, true) => Ok(Self::From { start: parse(start)? }),
            (true, false) => Ok(Self::Suffix { length: parse(end)? }),
            (true, true) => Err(malformed()),
        }
    }

    pub fn resolve(self, total: u64) -> Result<ResolvedRange, RangeError> {
        let unsatisfiable = RangeError::Unsatisfiable { total };
        let last = total.checked_sub(1).ok_or(RangeError::Unsatisfiable { total })?;

        match self {
            Self::Bounded { start, end } if start <= last => {
                Ok(ResolvedRange { start, end: end.min(last) })
            }
            Self::From { start } if start <= last => Ok(ResolvedRange { start, end: last }),
            Self::Suffix { length } if length > 0 => {
                Ok(ResolvedRange { start: total.saturating_sub(length), end: last })
            }
            _ => Err(unsatisfiable),
        }
    }
}

/// Inclusive byte span within a source of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
}

impl ResolvedRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl PartialResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answer a request for `source` carrying an optional `Range` header.
///
/// Headers that cannot be parsed or use unsupported forms are ignored and
/// the whole body is returned with `200`.
pub fn respond(
    source: &ByteSource,
    range_header: Option<&str>,
) -> Result<PartialResponse, RangeError> {
    let total = source.len()?;

    let spec = match range_header.map(ByteRangeSpec::parse) {
        None => None,
        Some(Ok(spec)) => Some(spec),
        Some(Err(error)) => {
            log::debug!("ignoring range header: {error}");
            None
        }
    };

    let Some(spec) = spec else {
        let body = source.read_all()?;
        return Ok(PartialResponse {
            status: 200,
            headers: vec![
                ("Accept-Ranges", "bytes".to_owned()),
                ("Content-Length", body.len().to_string()),
            ],
            body,
        });
    };

    match spec.resolve(total) {
        Ok(range) => {
            let body = source.read_range(range)?;
            Ok(PartialResponse {
                status: 206,
                headers: vec![
                    ("Accept-Ranges", "bytes".to_owned()),
                    ("Content-Range", range.content_range(total)),
                    ("Content-Length", body.len().to_string()),
                ],
                body,
            })
        }
        Err(RangeError::Unsatisfiable { total }) => Ok(PartialResponse {
            status: 416,
            headers: vec![
                ("Accept-Ranges", "bytes".to_owned()),
                ("Content-Range", format!("bytes */{total}")),
            ],
            body: Vec::new(),
        }),
        Err(error) => Err(error),
    }
}
