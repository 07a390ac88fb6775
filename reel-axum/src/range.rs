//! Single-range `Range: bytes=...` parsing.
//!
//! Only the one-interval form is understood. Multi-range requests, other
//! units and anything else that does not match `bytes=<digits>-<digits>`
//! are treated as malformed, which the streamer answers with `416`.

use reel_blob::ResolvedRange;

/// A parsed, not yet resolved, byte range request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// `bytes=N-` or `bytes=N-M`
    FromStart { start: u64, end: Option<u64> },
    /// `bytes=-N`: the last N bytes
    Suffix { len: u64 },
}

impl RangeRequest {
    /// Parse a header value; `None` means malformed.
    pub fn parse(header: &str) -> Option<Self> {
        let value = header.trim();
        let (unit, interval) = value.split_once('=')?;
        if !unit.eq_ignore_ascii_case("bytes") {
            return None;
        }
        let (start, end) = interval.split_once('-')?;

        match (parse_offset(start)?, parse_offset(end)?) {
            (Some(start), end) => Some(Self::FromStart { start, end }),
            (None, Some(len)) => Some(Self::Suffix { len }),
            (None, None) => None,
        }
    }

    /// Resolve against the object length; `None` means unsatisfiable.
    pub fn resolve(&self, total: u64) -> Option<ResolvedRange> {
        match *self {
            Self::FromStart { start, end } => {
                ResolvedRange::clamp(start, end.unwrap_or(u64::MAX), total).ok()
            }
            Self::Suffix { len } => {
                if len == 0 || total == 0 {
                    return None;
                }
                ResolvedRange::clamp(total.saturating_sub(len), total - 1, total).ok()
            }
        }
    }
}

/// `Some(None)` for an empty side, `None` for anything that is not digits.
fn parse_offset(raw: &str) -> Option<Option<u64>> {
    if raw.is_empty() {
        return Some(None);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok().map(Some)
}

/// `bytes <start>-<end>/<total>`
pub fn content_range(range: &ResolvedRange) -> String {
    format!("bytes {}-{}/{}", range.start, range.end, range.total_size)
}

/// `bytes */<total>` for unsatisfiable requests
pub fn unsatisfied_content_range(total: u64) -> String {
    format!("bytes */{total}")
}
