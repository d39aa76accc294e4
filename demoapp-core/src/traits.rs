//! Accumulator type constraints
//!
//! The summation kernel is generic over the integer it accumulates into,
//! so the same loop serves a 32-bit `long` and a 64-bit `long`.

/// Width of an accumulator in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AccumulatorWidth {
    W32 = 32,
    W64 = 64,
}

impl core::fmt::Display for AccumulatorWidth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-bit", *self as u8)
    }
}

/// Trait for integers a running sum can be kept in
///
/// Addition always wraps in two's complement, matching what the native
/// loop does on overflow.
pub trait Accumulator: Copy + PartialEq + Sized {
    /// Additive identity
    fn zero() -> Self;

    /// Width of this accumulator
    fn width() -> AccumulatorWidth;

    /// Add a loop counter value, truncating it to the accumulator width first
    fn wrapping_add_counter(self, counter: i64) -> Self;

    /// Sign-extend into the 64-bit return type
    fn to_i64(self) -> i64;
}

impl Accumulator for i32 {
    fn zero() -> Self {
        0
    }

    fn width() -> AccumulatorWidth {
        AccumulatorWidth::W32
    }

    fn wrapping_add_counter(self, counter: i64) -> Self {
        self.wrapping_add(counter as i32)
    }

    fn to_i64(self) -> i64 {
        self as i64
    }
}

impl Accumulator for i64 {
    fn zero() -> Self {
        0
    }

    fn width() -> AccumulatorWidth {
        AccumulatorWidth::W64
    }

    fn wrapping_add_counter(self, counter: i64) -> Self {
        self.wrapping_add(counter)
    }

    fn to_i64(self) -> i64 {
        self
    }
}
