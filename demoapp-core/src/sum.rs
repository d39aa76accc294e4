//! Summation kernels
//!
//! Every kernel computes `0 + 1 + ... + (ops - 1)`. A non-positive `ops`
//! yields 0 because the loop body never runs.

use crate::error::{DemoError, Result};
use crate::traits::Accumulator;

/// Loop form, generic over the accumulator width
///
/// The counter is 64 bits wide; each value is truncated to the accumulator
/// width before it is added, so the result is the exact sum reduced modulo
/// the accumulator width.
pub fn sum_below_with<A: Accumulator>(ops: i64) -> A {
    let mut sum = A::zero();
    let mut i: i64 = 0;
    while i < ops {
        sum = sum.wrapping_add_counter(i);
        i += 1;
    }
    sum
}

/// Loop form with a 64-bit wrapping accumulator
pub fn sum_below(ops: i64) -> i64 {
    sum_below_with::<i64>(ops)
}

/// Exact sum as an `i128`, zero for non-positive counts
pub const fn exact_sum_below(ops: i64) -> i128 {
    if ops <= 0 {
        return 0;
    }
    let n = ops as i128;
    n * (n - 1) / 2
}

/// Closed form, truncated to 64 bits
///
/// Truncating the exact sum gives the same bits as the wrapping loop.
pub const fn sum_below_closed(ops: i64) -> i64 {
    exact_sum_below(ops) as i64
}

/// Sum kept in the platform's C `long`
///
/// This is 32 bits on ILP32 and LLP64 targets and 64 bits on LP64 targets.
pub fn native_sum_below(ops: i64) -> i64 {
    sum_below_with::<core::ffi::c_long>(ops).to_i64()
}

/// Sum that reports overflow instead of wrapping
pub fn checked_sum_below(ops: i64) -> Result<i64> {
    i64::try_from(exact_sum_below(ops)).map_err(|_| DemoError::Overflow)
}

/// Sum driven by a 32-bit loop counter into the platform `long`
///
/// A 32-bit counter can never reach a count above `i32::MAX`, so such
/// counts are rejected rather than looping forever.
pub fn narrow_sum_below(ops: i64) -> Result<i64> {
    if ops > i32::MAX as i64 {
        return Err(DemoError::CounterOverflow);
    }
    let mut sum = <core::ffi::c_long as Accumulator>::zero();
    let mut i: i32 = 0;
    while (i as i64) < ops {
        sum = sum.wrapping_add_counter(i as i64);
        i += 1;
    }
    Ok(sum.to_i64())
}

/// Selectable summation kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Strategy {
    /// 64-bit loop, wrapping
    Loop,
    /// Closed form, wrapping
    ClosedForm,
    /// Closed form, overflow is an error
    Checked,
    /// 32-bit counter, platform `long` accumulator
    NarrowCounter,
    /// Loop into the platform `long`
    #[default]
    Native,
}

impl Strategy {
    /// All strategies, in declaration order
    pub const ALL: [Strategy; 5] = [
        Strategy::Loop,
        Strategy::ClosedForm,
        Strategy::Checked,
        Strategy::NarrowCounter,
        Strategy::Native,
    ];

    /// Run this kernel
    pub fn apply(&self, ops: i64) -> Result<i64> {
        match self {
            Strategy::Loop => Ok(sum_below(ops)),
            Strategy::ClosedForm => Ok(sum_below_closed(ops)),
            Strategy::Checked => checked_sum_below(ops),
            Strategy::NarrowCounter => narrow_sum_below(ops),
            Strategy::Native => Ok(native_sum_below(ops)),
        }
    }

    /// Name accepted by `FromStr`
    pub const fn name(&self) -> &'static str {
        match self {
            Strategy::Loop => "loop",
            Strategy::ClosedForm => "closed-form",
            Strategy::Checked => "checked",
            Strategy::NarrowCounter => "narrow-counter",
            Strategy::Native => "native",
        }
    }
}

impl core::fmt::Display for Strategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl core::str::FromStr for Strategy {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == s)
            .ok_or(DemoError::InvalidStrategy)
    }
}
