//! C ABI exports for hosts that do not go through JNI
//!
//! The functions here take and return plain 64-bit integers so they can be
//! declared from C, Swift or Kotlin/Native without generated bindings.

use demoapp_core::{checked_sum_below, native_sum_below, DemoError};
use std::panic::{self, AssertUnwindSafe};

/// Status returned when the call succeeded
pub const DEMOAPP_OK: i32 = 0;
/// Status returned when the sum does not fit in 64 bits
pub const DEMOAPP_OVERFLOW: i32 = 1;
/// Status returned when the output pointer is null
pub const DEMOAPP_NULL_POINTER: i32 = -1;
/// Status returned when the summation panicked
pub const DEMOAPP_PANIC: i32 = -2;
/// Status returned for any other kernel error
pub const DEMOAPP_ERROR: i32 = -3;

/// Keep a panic from unwinding into foreign frames
fn guard<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(fallback)
}

/// Sum `0..ops` in the platform `long`, wrapping on overflow
#[no_mangle]
pub extern "C" fn demoapp_do_ops(ops: i64) -> i64 {
    guard(0, || native_sum_below(ops))
}

/// Sum `0..ops` in 64 bits, writing the result through `out`
///
/// Returns `DEMOAPP_OK` on success. On overflow `out` is left untouched.
///
/// # Safety
///
/// `out` must be null or valid for a write of one `i64`.
#[no_mangle]
pub unsafe extern "C" fn demoapp_checked_do_ops(ops: i64, out: *mut i64) -> i32 {
    if out.is_null() {
        return DEMOAPP_NULL_POINTER;
    }
    match guard(Err(None), || checked_sum_below(ops).map_err(Some)) {
        Ok(sum) => {
            // SAFETY: caller guarantees a non-null `out` is writable
            unsafe { out.write(sum) };
            DEMOAPP_OK
        }
        Err(Some(error)) => status_for(error),
        Err(None) => DEMOAPP_PANIC,
    }
}

fn status_for(error: DemoError) -> i32 {
    match error {
        DemoError::Overflow => DEMOAPP_OVERFLOW,
        _ => DEMOAPP_ERROR,
    }
}
