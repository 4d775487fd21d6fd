// ── Safety policy ─────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except the per-OS backends:
//   • `platform::unix`    – libc FFI (setlocale, tzset, mktime, sysconf)
//   • `platform::windows` – Win32 / CRT FFI
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Host time, locale, and memory-page primitives for processes that embed a
//! managed runtime (a scripting engine, a bytecode VM, …).
//!
//! Everything here is a thin, stateless pass-through to an OS facility. The
//! crate owns no data structures of its own; the only state it touches is
//! the operating system's process-global locale and timezone configuration.
//!
//! # Locale pinning
//!
//! Plenty of C libraries call `setlocale` behind your back, and once the
//! active locale's decimal separator is `","`, every `strtod`-style parse in
//! the process starts misreading `"3.14"`. [`force_unambiguous_locale`] pins
//! the process to the `"C"` locale and overwrites `LANG`/`LC_ALL` so that
//! later locale-from-environment lookups resolve to `"C"` too. Call it once,
//! early, before spawning threads that parse or format numbers.
//!
//! # Sign convention
//!
//! [`timezone_offset_seconds`] uses the traditional **west-positive**
//! convention of the POSIX `timezone` variable: a host at UTC+2 reports
//! `-7200`, not `+7200`. This is the single most common off-by-sign trap in
//! timezone code; see the function docs before negating anything.

mod platform;

pub mod error;

pub use crate::error::{HostEnvError, Result};

// ── Broken-down local time ────────────────────────────────────────────────────

/// How to resolve the daylight-saving ambiguity of a local time.
///
/// Maps directly onto `struct tm`'s `tm_isdst` field: `Unspecified` is `-1`,
/// `Standard` is `0`, `Daylight` is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dst {
    /// Let the platform decide. Near a DST transition the answer is
    /// inherently ambiguous and platform-defined; whatever the platform
    /// picks is exposed unmodified.
    Unspecified,
    /// Force interpretation as standard (winter) time.
    Standard,
    /// Force interpretation as daylight (summer) time.
    Daylight,
}

/// A broken-down local calendar time, in the field conventions of
/// `struct tm`.
///
/// Fields do **not** need to be pre-normalized: `hour = 25` is valid input
/// and rolls over into the next day during [`to_epoch_seconds`], exactly as
/// `mktime(3)` would normalize it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimeSpec {
    /// Seconds after the minute, normally `[0, 61]` (leap seconds allowed).
    pub second: i32,
    /// Minutes after the hour, normally `[0, 59]`.
    pub minute: i32,
    /// Hours since midnight, normally `[0, 23]`.
    pub hour: i32,
    /// Day of the month, normally `[1, 31]`.
    pub day: i32,
    /// Months since January, normally `[0, 11]`. **Zero-based.**
    pub month: i32,
    /// Years since 1900 (`struct tm` convention): 1970 is `70`, 2024 is
    /// `124`.
    pub year: i32,
    /// Daylight-saving resolution for this local time.
    pub dst: Dst,
}

/// The two symbolic timezone names, freshly copied from the OS.
///
/// Either string may be empty on configurations with no name set, and some
/// platforms (glibc among them) mirror the standard name into the daylight
/// slot when the active timezone has no DST rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneNames {
    /// Abbreviation or name of standard (winter) time, e.g. `"EST"`.
    pub standard: String,
    /// Abbreviation or name of daylight (summer) time, e.g. `"EDT"`.
    pub daylight: String,
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Pin the process-wide locale to `"C"` and keep it there.
///
/// Overwrites the `LANG` and `LC_ALL` environment variables with `"C"` and
/// then applies `"C"` to every locale category immediately. The environment
/// overwrite matters as much as the live `setlocale`: any later, uncontrolled
/// `setlocale(LC_ALL, "")` elsewhere in the process re-reads the environment
/// and lands back on `"C"` instead of resurrecting the host's locale.
///
/// Call exactly once, during startup, before any thread performs
/// locale-sensitive parsing or formatting. The underlying facility has no
/// lock to take, so this discipline is the caller's obligation, not an
/// enforced invariant.
///
/// # Panics
///
/// Panics if the platform rejects the `"C"` locale. Every conforming C
/// runtime ships it, so a failure here is an unrecoverable environment
/// misconfiguration, not a condition to recover from.
pub fn force_unambiguous_locale() {
    platform::pin_c_locale();
    log::debug!("process locale pinned to \"C\" (LANG/LC_ALL overwritten)");
}

/// Return the standard (non-DST) offset of local time from UTC, in seconds,
/// **west-positive**.
///
/// This is the sign convention of the traditional POSIX `timezone` variable:
/// zones *behind* UTC report positive values. A host configured as UTC+2
/// returns `-7200`; New York (UTC-5 standard) returns `18000`.
///
/// Refreshes the platform's timezone knowledge from system configuration on
/// every call. Total: if the platform cannot determine a timezone it reports
/// `0` (UTC) rather than failing.
pub fn timezone_offset_seconds() -> i64 {
    platform::standard_offset_seconds()
}

/// Return the standard and daylight timezone names, freshly read from the
/// OS.
///
/// The strings are owned copies; they never alias platform-internal buffers
/// that a later call could overwrite.
pub fn timezone_names() -> TimezoneNames {
    platform::timezone_names()
}

/// Convert a broken-down **local** calendar time into seconds since
/// 1970-01-01T00:00:00 UTC, under the current timezone rules.
///
/// Out-of-range fields roll over into adjacent fields first (`hour = 25,
/// minute = 30` means 01:30 the next day), matching `mktime(3)`. The
/// [`Dst`] flag picks the interpretation of times that fall in a DST
/// overlap; [`Dst::Unspecified`] defers to the platform, whose answer near
/// a transition boundary is ambiguous by nature.
///
/// # Errors
///
/// Returns [`HostEnvError::Range`], carrying the rejected input, when the
/// platform reports that no absolute time exists for the given local time.
/// On POSIX, `mktime` signals this by returning `-1`, a value it shares
/// with the legitimate instant one second before the epoch; this crate
/// follows the platform and reports `Range` for both.
pub fn to_epoch_seconds(spec: LocalTimeSpec) -> Result<f64> {
    let secs = platform::to_epoch_seconds(spec)?;
    log::trace!("local time {spec:?} → epoch {secs}");
    Ok(secs)
}

/// Return the OS memory-management page size in bytes.
///
/// A hardware/OS configuration constant for the lifetime of a boot; callers
/// are free to cache the result.
///
/// # Panics
///
/// Panics if the OS query fails, which does not happen on supported
/// platforms; a failure is an unrecoverable environment misconfiguration.
pub fn page_size_bytes() -> usize {
    platform::page_size_bytes()
}

// ── Test support ──────────────────────────────────────────────────────────────

/// Serializes tests that mutate process-global state (`TZ`, locale).
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_parsing_is_unambiguous_after_pinning() {
        let _env = env_lock();
        force_unambiguous_locale();
        assert_eq!("3.14".parse::<f64>(), Ok(3.14));
        assert_eq!(std::env::var("LC_ALL").as_deref(), Ok("C"));
        assert_eq!(std::env::var("LANG").as_deref(), Ok("C"));
    }

    #[test]
    fn page_size_is_a_positive_power_of_two() {
        let size = page_size_bytes();
        assert!(size > 0);
        // True of every real MMU: 4 KiB on x86-64, 16 KiB on Apple silicon.
        assert!(size.is_power_of_two(), "page size {size} not a power of two");
    }

    #[test]
    fn page_size_is_stable_across_calls() {
        assert_eq!(page_size_bytes(), page_size_bytes());
    }

    // TZ is only honoured through tzset(3); the POSIX rule strings below
    // give the tests full control of the timezone without touching the
    // host's zoneinfo database.
    #[cfg(unix)]
    mod tz {
        use crate::{
            env_lock, timezone_names, timezone_offset_seconds, to_epoch_seconds, Dst,
            HostEnvError, LocalTimeSpec,
        };

        fn spec(year: i32, month: i32, day: i32, hour: i32, minute: i32, dst: Dst) -> LocalTimeSpec {
            LocalTimeSpec {
                second: 0,
                minute,
                hour,
                day,
                month,
                year,
                dst,
            }
        }

        #[test]
        fn offset_is_west_positive() {
            let _env = env_lock();
            // "EET-2" is POSIX for UTC+2: east of UTC, so the offset is
            // negative under the west-positive convention.
            std::env::set_var("TZ", "EET-2");
            assert_eq!(timezone_offset_seconds(), -7200);

            std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0");
            assert_eq!(timezone_offset_seconds(), 18000);
        }

        #[test]
        fn offset_falls_back_to_utc_for_unusable_zone() {
            let _env = env_lock();
            // An unparsable TZ makes libc fall back to UTC rather than fail.
            std::env::set_var("TZ", "Not/A_Real_Zone_9Q");
            assert_eq!(timezone_offset_seconds(), 0);
        }

        #[test]
        fn names_for_dst_zone_are_distinct() {
            let _env = env_lock();
            std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0");
            let names = timezone_names();
            assert_eq!(names.standard, "EST");
            assert_eq!(names.daylight, "EDT");
        }

        #[test]
        fn names_without_dst_rule() {
            let _env = env_lock();
            std::env::set_var("TZ", "UTC0");
            let names = timezone_names();
            assert_eq!(names.standard, "UTC");
            // Platforms either leave the daylight slot empty or mirror the
            // standard name into it (glibc mirrors).
            assert!(
                names.daylight.is_empty() || names.daylight == names.standard,
                "unexpected daylight name {:?}",
                names.daylight
            );
        }

        #[test]
        fn epoch_roundtrip_under_utc() {
            let _env = env_lock();
            std::env::set_var("TZ", "UTC0");
            // 1970-01-01T00:00:00 local == epoch 0 when local time is UTC.
            let s = spec(70, 0, 1, 0, 0, Dst::Standard);
            assert_eq!(to_epoch_seconds(s).unwrap(), 0.0);
        }

        #[test]
        fn known_instant_with_offset_zone() {
            let _env = env_lock();
            std::env::set_var("TZ", "EST5EDT,M3.2.0,M11.1.0");
            // 2020-07-01T12:00:00 EDT (UTC-4) == 2020-07-01T16:00:00Z.
            let expected = 1_593_619_200.0;
            let daylight = spec(120, 6, 1, 12, 0, Dst::Daylight);
            assert_eq!(to_epoch_seconds(daylight).unwrap(), expected);
            // July 1 is unambiguously inside DST, so letting the platform
            // decide must agree with forcing daylight time.
            let unspecified = spec(120, 6, 1, 12, 0, Dst::Unspecified);
            assert_eq!(to_epoch_seconds(unspecified).unwrap(), expected);
        }

        #[test]
        fn out_of_range_fields_roll_over() {
            let _env = env_lock();
            std::env::set_var("TZ", "UTC0");
            // hour=25, minute=30 on Jan 1 normalizes to Jan 2, 01:30.
            let denormal = spec(70, 0, 1, 25, 30, Dst::Standard);
            let normal = spec(70, 0, 2, 1, 30, Dst::Standard);
            assert_eq!(
                to_epoch_seconds(denormal).unwrap(),
                to_epoch_seconds(normal).unwrap()
            );
            assert_eq!(to_epoch_seconds(normal).unwrap(), 86_400.0 + 3_600.0 + 1_800.0);
        }

        #[test]
        fn unrepresentable_local_time_is_range_error() {
            let _env = env_lock();
            std::env::set_var("TZ", "UTC0");
            // 1969-12-31T23:59:59 UTC is the one local time mktime answers
            // with -1, which the platform overloads as its error value; the
            // crate follows the platform and reports it as out of range.
            let bad = LocalTimeSpec {
                second: 59,
                minute: 59,
                hour: 23,
                day: 31,
                month: 11,
                year: 69,
                dst: Dst::Standard,
            };
            match to_epoch_seconds(bad) {
                Err(HostEnvError::Range { spec }) => assert_eq!(spec, bad),
                other => panic!("expected Range error, got {other:?}"),
            }
        }
    }
}
