// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the interface the public API uses to talk to the OS.
// No `unsafe` lives here; all FFI is confined to the per-OS backend and
// never leaks outward. Each backend exports the same five functions with
// identical signatures, so the rest of the crate is platform-agnostic.

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) use unix::{
    page_size_bytes, pin_c_locale, standard_offset_seconds, timezone_names, to_epoch_seconds,
};

#[cfg(windows)]
pub(crate) use windows::{
    page_size_bytes, pin_c_locale, standard_offset_seconds, timezone_names, to_epoch_seconds,
};

#[cfg(not(any(unix, windows)))]
compile_error!("hostenv only supports Unix-family and Windows targets");
