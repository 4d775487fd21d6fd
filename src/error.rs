// ── Central error type ────────────────────────────────────────────────────────
//
// The only recoverable failure in this crate is a local time that has no
// representation as an absolute instant. Setup failures (locale pinning,
// page-size query) are documented panics instead: the OS facilities behind
// them cannot fail on a correctly configured host, so there is nothing for
// the caller to recover from.

use crate::LocalTimeSpec;

/// Every recoverable error that `hostenv` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEnvError {
    /// The platform's calendar conversion reported that no absolute time
    /// exists for the requested local time under current timezone rules.
    Range {
        /// The rejected input, exactly as the caller passed it (before any
        /// field normalization), for diagnostics.
        spec: LocalTimeSpec,
    },
}

impl std::fmt::Display for HostEnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range { spec } => write!(
                f,
                "no absolute time exists for local time \
                 {:04}-{:02}-{:02} {:02}:{:02}:{:02} (dst: {:?}) \
                 under current timezone rules",
                // LocalTimeSpec carries struct-tm conventions; render as a
                // human-readable calendar date.
                i64::from(spec.year) + 1900,
                i64::from(spec.month) + 1,
                spec.day,
                spec.hour,
                spec.minute,
                spec.second,
                spec.dst,
            ),
        }
    }
}

impl std::error::Error for HostEnvError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HostEnvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dst;

    #[test]
    fn range_error_message_names_the_input() {
        let err = HostEnvError::Range {
            spec: LocalTimeSpec {
                second: 0,
                minute: 30,
                hour: 25,
                day: 1,
                month: 0,
                year: 70,
                dst: Dst::Unspecified,
            },
        };
        let msg = err.to_string();
        // The message shows the fields as passed, without normalizing them.
        assert!(msg.contains("1970-01-01 25:30:00"), "message was {msg:?}");
        assert!(msg.contains("Unspecified"), "message was {msg:?}");
    }
}
