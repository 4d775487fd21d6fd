// ── Win32 backend ─────────────────────────────────────────────────────────────
//
// Windows has no tzset(3)/mktime(3) pair behind the `windows` crate, so this
// backend composes the same contract out of the native pieces:
//   • GetTimeZoneInformation — bias (already west-positive, in minutes) and
//     the standard/daylight name pair.
//   • TzSpecificLocalTimeToSystemTime + SystemTimeToFileTime — local→UTC
//     conversion when the caller leaves DST resolution to the platform.
//   • GetSystemInfo — page size.
// Field rollover (hour = 25, …) is done here before calling Win32, because
// SYSTEMTIME rejects denormalized fields that mktime would happily absorb.
//
// This is one of exactly two modules in the crate where `unsafe` is
// permitted (the other is `platform::unix`). Every `unsafe` block MUST carry
// a `// SAFETY:` comment stating which invariant makes the operation sound.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int};

use windows::Win32::{
    Foundation::{FILETIME, SYSTEMTIME},
    System::{
        SystemInformation::{GetSystemInfo, SYSTEM_INFO},
        Time::{
            GetTimeZoneInformation, SystemTimeToFileTime, TzSpecificLocalTimeToSystemTime,
            TIME_ZONE_INFORMATION,
        },
    },
};

use crate::error::{HostEnvError, Result};
use crate::{Dst, LocalTimeSpec, TimezoneNames};

// ── CRT imports ───────────────────────────────────────────────────────────────
//
// setlocale and _putenv_s live in the C runtime, not in any Win32 module the
// `windows` crate binds; the CRT is always linked on msvc targets.

const LC_ALL: c_int = 0;

extern "C" {
    fn setlocale(category: c_int, locale: *const c_char) -> *mut c_char;
    fn _putenv_s(name: *const c_char, value: *const c_char) -> c_int;
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01 (Unix epoch).
const FILETIME_UNIX_DELTA_SECS: i64 = 11_644_473_600;

/// FILETIME ticks are 100 ns.
const TICKS_PER_SEC: i64 = 10_000_000;

// ── Locale ────────────────────────────────────────────────────────────────────

pub(crate) fn pin_c_locale() {
    // Overwrite both environment blocks. std::env::set_var updates the
    // Win32 block (SetEnvironmentVariableW); _putenv_s updates the CRT's
    // private copy, which is what a later setlocale(LC_ALL, "") re-reads.
    std::env::set_var("LANG", "C");
    std::env::set_var("LC_ALL", "C");
    for name in [c"LANG", c"LC_ALL"] {
        // SAFETY: both arguments are valid null-terminated strings; _putenv_s
        // copies them before returning.
        let rc = unsafe { _putenv_s(name.as_ptr(), c"C".as_ptr()) };
        assert!(rc == 0, "_putenv_s failed pinning the CRT environment");
    }

    // SAFETY: both arguments are valid; the locale string is a
    // null-terminated literal. The returned pointer refers to CRT-owned
    // static storage and is only null-checked, never dereferenced or kept.
    let ret = unsafe { setlocale(LC_ALL, c"C".as_ptr()) };
    assert!(
        !ret.is_null(),
        "setlocale(LC_ALL, \"C\") failed; the \"C\" locale is mandatory on \
         every conforming platform"
    );
}

// ── Timezone ──────────────────────────────────────────────────────────────────

/// Fetch the active timezone description, refreshed from the registry on
/// every call.
fn timezone_information() -> TIME_ZONE_INFORMATION {
    let mut tzi = TIME_ZONE_INFORMATION::default();
    // SAFETY: `tzi` is a valid, writable TIME_ZONE_INFORMATION. The return
    // code (TIME_ZONE_ID_*) is deliberately unused: even on
    // TIME_ZONE_ID_INVALID the struct is zeroed, which reads as UTC with
    // empty names — exactly the documented unknown-timezone fallback.
    unsafe {
        let _ = GetTimeZoneInformation(&mut tzi);
    }
    tzi
}

pub(crate) fn standard_offset_seconds() -> i64 {
    let tzi = timezone_information();
    // Bias is already west-positive minutes (UTC = local + bias); the
    // standard offset adds StandardBias, which is almost always zero.
    i64::from(tzi.Bias + tzi.StandardBias) * 60
}

pub(crate) fn timezone_names() -> TimezoneNames {
    let tzi = timezone_information();
    TimezoneNames {
        standard: wide_to_string(&tzi.StandardName),
        daylight: wide_to_string(&tzi.DaylightName),
    }
}

/// Convert a null-terminated UTF-16 buffer to an owned `String`.
fn wide_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

// ── Calendar conversion ───────────────────────────────────────────────────────

pub(crate) fn to_epoch_seconds(spec: LocalTimeSpec) -> Result<f64> {
    let civil = normalize(spec);

    let secs = match spec.dst {
        // The platform decides whether this local time is standard or
        // daylight, with its own (ambiguous near transitions) rules.
        Dst::Unspecified => platform_resolved_epoch(spec, &civil)?,
        // A forced flag bypasses the platform's DST schedule: apply the
        // requested bias to the civil time directly.
        Dst::Standard => biased_epoch(&civil, |tzi| tzi.Bias + tzi.StandardBias),
        Dst::Daylight => biased_epoch(&civil, |tzi| tzi.Bias + tzi.DaylightBias),
    };
    Ok(secs)
}

fn platform_resolved_epoch(spec: LocalTimeSpec, civil: &CivilTime) -> Result<f64> {
    // SYSTEMTIME cannot carry dates outside [1601, 30827]; mktime-style
    // inputs outside that window have no Win32 representation.
    if civil.year < 1601 || civil.year > 30827 {
        return Err(HostEnvError::Range { spec });
    }
    let local = SYSTEMTIME {
        wYear: civil.year as u16,
        wMonth: civil.month as u16,
        // wDayOfWeek is documented as ignored on input.
        wDayOfWeek: 0,
        wDay: civil.day as u16,
        wHour: civil.hour as u16,
        wMinute: civil.minute as u16,
        wSecond: civil.second as u16,
        wMilliseconds: 0,
    };

    let mut utc = SYSTEMTIME::default();
    // SAFETY: `local` is fully initialised and `utc` is writable; passing
    // None selects the process's active timezone.
    if unsafe { TzSpecificLocalTimeToSystemTime(None, &local, &mut utc) }.is_err() {
        return Err(HostEnvError::Range { spec });
    }

    let mut ft = FILETIME::default();
    // SAFETY: `utc` was just produced by TzSpecificLocalTimeToSystemTime and
    // `ft` is writable.
    if unsafe { SystemTimeToFileTime(&utc, &mut ft) }.is_err() {
        return Err(HostEnvError::Range { spec });
    }

    let ticks = (i64::from(ft.dwHighDateTime) << 32) | i64::from(ft.dwLowDateTime);
    Ok((ticks / TICKS_PER_SEC - FILETIME_UNIX_DELTA_SECS) as f64)
}

fn biased_epoch(civil: &CivilTime, bias_minutes: fn(&TIME_ZONE_INFORMATION) -> i32) -> f64 {
    let tzi = timezone_information();
    let days = days_from_civil(civil.year, civil.month, civil.day);
    let local_secs =
        days * 86_400 + civil.hour * 3_600 + civil.minute * 60 + civil.second;
    // West-positive bias: UTC = local + bias.
    (local_secs + i64::from(bias_minutes(&tzi)) * 60) as f64
}

// ── Civil-calendar arithmetic ─────────────────────────────────────────────────
//
// mktime normalizes denormalized fields by rollover; Win32 does not, so the
// rollover happens here in plain proleptic-Gregorian arithmetic.

/// A normalized civil time: month in [1, 12], day valid for the month,
/// time-of-day fields in range.
struct CivilTime {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
}

fn normalize(spec: LocalTimeSpec) -> CivilTime {
    // Roll seconds/minutes/hours into whole days plus a time of day.
    let total = i64::from(spec.second)
        + i64::from(spec.minute) * 60
        + i64::from(spec.hour) * 3_600;
    let extra_days = total.div_euclid(86_400);
    let tod = total.rem_euclid(86_400);

    // Roll months into years.
    let months = i64::from(spec.month);
    let year = 1900 + i64::from(spec.year) + months.div_euclid(12);
    let month = months.rem_euclid(12) + 1;

    // Let day-of-month overflow (day 32, day 0, …) flow through the
    // days-from-civil conversion, which is total over any day count.
    let days = days_from_civil(year, month, 1) + (i64::from(spec.day) - 1) + extra_days;
    let (year, month, day) = civil_from_days(days);

    CivilTime {
        year,
        month,
        day,
        hour: tod / 3_600,
        minute: tod % 3_600 / 60,
        second: tod % 60,
    }
}

/// Days since 1970-01-01 for a proleptic-Gregorian date. `day` may be any
/// value; out-of-range days extend past the month boundary.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`]: (year, month [1,12], day [1,31]).
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    (if month <= 2 { year + 1 } else { year }, month, day)
}

// ── Page size ─────────────────────────────────────────────────────────────────

pub(crate) fn page_size_bytes() -> usize {
    let mut info = SYSTEM_INFO::default();
    // SAFETY: `info` is a valid, writable SYSTEM_INFO; GetSystemInfo cannot
    // fail.
    unsafe { GetSystemInfo(&mut info) };
    assert!(
        info.dwPageSize > 0,
        "GetSystemInfo reported a zero page size; the page size is a \
         mandatory configuration value on every supported platform"
    );
    info.dwPageSize as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────
