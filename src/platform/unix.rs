// ── POSIX backend ─────────────────────────────────────────────────────────────
//
// Thin wrappers over the libc facilities that already implement every
// operation we expose: setlocale(3), tzset(3) plus the `timezone`/`tzname`
// globals, mktime(3), and sysconf(3). This is one of exactly two modules in
// the crate where `unsafe` is permitted (the other is `platform::windows`).
// Every `unsafe` block MUST carry a `// SAFETY:` comment stating which
// invariant makes the operation sound.

#![allow(unsafe_code)]

use std::ffi::CStr;

use crate::error::{HostEnvError, Result};
use crate::{Dst, LocalTimeSpec, TimezoneNames};

// ── libc imports ──────────────────────────────────────────────────────────────
//
// The libc crate binds mktime/setlocale/sysconf but not the tzset(3) family,
// so those come in by hand. `timezone` and `tzname` are XSI extensions, not
// plain POSIX: glibc and musl ship them in this shape, the BSDs largely do
// not. This backend assumes glibc-style globals.

// The globals keep their C names.
#[allow(non_upper_case_globals)]
extern "C" {
    fn tzset();
    static timezone: libc::c_long;
    static tzname: [*mut libc::c_char; 2];
}

impl Dst {
    /// The `tm_isdst` encoding of this flag.
    fn as_isdst(self) -> libc::c_int {
        match self {
            Self::Unspecified => -1,
            Self::Standard => 0,
            Self::Daylight => 1,
        }
    }
}

// ── Locale ────────────────────────────────────────────────────────────────────

pub(crate) fn pin_c_locale() {
    // Overwrite the environment first: any later setlocale(LC_ALL, "")
    // elsewhere in the process re-reads these and resolves to "C" again
    // instead of resurrecting the inherited locale.
    std::env::set_var("LANG", "C");
    std::env::set_var("LC_ALL", "C");

    // SAFETY: both arguments are valid; the locale string is a
    // null-terminated literal. The returned pointer refers to libc-owned
    // static storage and is only null-checked, never dereferenced or kept.
    let ret = unsafe { libc::setlocale(libc::LC_ALL, c"C".as_ptr()) };
    assert!(
        !ret.is_null(),
        "setlocale(LC_ALL, \"C\") failed; the \"C\" locale is mandatory on \
         every conforming platform"
    );
}

// ── Timezone ──────────────────────────────────────────────────────────────────

pub(crate) fn standard_offset_seconds() -> i64 {
    // SAFETY: tzset takes no arguments and only (re)fills libc's timezone
    // globals from TZ / system configuration. Reading `timezone` right after
    // races only with concurrent tzset calls, the documented
    // eventually-consistent platform behavior.
    unsafe {
        tzset();
        timezone as i64
    }
}

pub(crate) fn timezone_names() -> TimezoneNames {
    // SAFETY: after tzset, both tzname slots point at valid null-terminated
    // strings in libc-owned storage. libc may rewrite that storage on a
    // later tzset, so the strings are copied before this function returns
    // and callers never observe libc memory.
    unsafe {
        tzset();
        TimezoneNames {
            standard: CStr::from_ptr(tzname[0]).to_string_lossy().into_owned(),
            daylight: CStr::from_ptr(tzname[1]).to_string_lossy().into_owned(),
        }
    }
}

// ── Calendar conversion ───────────────────────────────────────────────────────

pub(crate) fn to_epoch_seconds(spec: LocalTimeSpec) -> Result<f64> {
    // SAFETY: all-zero is a valid bit pattern for every field of libc::tm
    // (the glibc extension fields tm_gmtoff/tm_zone are an integer and a
    // nullable pointer).
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    tm.tm_sec = spec.second;
    tm.tm_min = spec.minute;
    tm.tm_hour = spec.hour;
    tm.tm_mday = spec.day;
    tm.tm_mon = spec.month;
    tm.tm_year = spec.year;
    tm.tm_isdst = spec.dst.as_isdst();

    // SAFETY: `tm` is fully initialised and exclusively borrowed for the
    // call; mktime normalizes it in place and reads (possibly refreshing)
    // the process timezone state.
    let time = unsafe { libc::mktime(&mut tm) };
    if time == -1 {
        // mktime overloads -1 as both "error" and the legitimate instant
        // one second before the epoch; like the platform, we cannot tell
        // them apart and report the error.
        return Err(HostEnvError::Range { spec });
    }
    Ok(time as f64)
}

// ── Page size ─────────────────────────────────────────────────────────────────

pub(crate) fn page_size_bytes() -> usize {
    // SAFETY: sysconf takes only the constant name and touches no
    // caller-owned memory.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    assert!(
        size > 0,
        "sysconf(_SC_PAGESIZE) failed; the page size is a mandatory \
         configuration value on every supported platform"
    );
    size as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────
