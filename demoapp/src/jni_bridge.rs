//! JNI entry point for the Android host
//!
//! Bound by symbol name to `com.example.demoapp.HomeScreen.doOps(long): long`.
//! The host loads the library with `System.loadLibrary("demoapp")`.

use demoapp_core::native_sum_below;
use jni::objects::JObject;
use jni::sys::jlong;
use jni::JNIEnv;
use std::panic::{self, AssertUnwindSafe};

/// Body of `doOps`, without the JNI arguments
pub fn do_ops(ops: jlong) -> jlong {
    panic::catch_unwind(AssertUnwindSafe(|| native_sum_below(ops))).unwrap_or(0)
}

#[no_mangle]
pub extern "system" fn Java_com_example_demoapp_HomeScreen_doOps<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ops: jlong,
) -> jlong {
    do_ops(ops)
}
