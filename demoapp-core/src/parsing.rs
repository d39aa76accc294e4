//! Parsing utilities for operation counts
//!
//! Pure parsing functions with no I/O dependencies, used by hosts that
//! receive counts as text.

use crate::error::{DemoError, Result};
use core::ops::Range;

/// Parse a signed operation count
///
/// Accepts an optional `+` or `-` sign and `_` separators between digits,
/// e.g. `"1_000_000"`.
pub fn parse_ops(s: &str) -> Result<i64> {
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
        None => return Err(DemoError::InvalidCount),
    };

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return Err(DemoError::InvalidCount);
    }

    // Accumulate negatively so i64::MIN parses
    let mut result: i64 = 0;
    for byte in digits.bytes() {
        if byte == b'_' {
            continue;
        }
        if !byte.is_ascii_digit() {
            return Err(DemoError::InvalidCount);
        }
        let digit = (byte - b'0') as i64;
        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_sub(digit))
            .ok_or(DemoError::Overflow)?;
    }

    if negative {
        Ok(result)
    } else {
        result.checked_neg().ok_or(DemoError::Overflow)
    }
}

/// Parse a count range in the format "start:end" or "start..end"
pub fn parse_range(range_str: &str) -> Result<Range<i64>> {
    let (start_str, end_str) = if let Some(pos) = range_str.find("..") {
        (&range_str[..pos], &range_str[pos + 2..])
    } else if let Some(pos) = range_str.find(':') {
        (&range_str[..pos], &range_str[pos + 1..])
    } else {
        return Err(DemoError::InvalidRange);
    };

    let start = parse_ops(start_str).map_err(|_| DemoError::InvalidRange)?;
    let end = parse_ops(end_str).map_err(|_| DemoError::InvalidRange)?;

    if start > end {
        return Err(DemoError::InvalidRange);
    }

    Ok(start..end)
}
